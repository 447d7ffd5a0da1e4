//! Dialect factory
//!
//! Bridges a live connection to an instantiated dialect handler: read the
//! product identity, look it up in a registry, construct the handler.

use crate::connection::Connection;
use crate::dialect::{Dialect, DialectError, DialectRegistry};

/// Compose the `"<name> <major>.<minor>"` identity reported by `connection`.
///
/// Version numbers are passed through exactly as the driver reports them.
pub fn product_identity(connection: &dyn Connection) -> Result<String, DialectError> {
    let metadata = connection
        .metadata()
        .map_err(DialectError::Connectivity)?
        .ok_or(DialectError::MetadataUnavailable)?;

    let name = metadata
        .product_name
        .filter(|name| !name.is_empty())
        .ok_or(DialectError::ProductIdentityUndetermined)?;

    Ok(format!(
        "{} {}.{}",
        name, metadata.major_version, metadata.minor_version
    ))
}

/// Creates dialect handlers for connections using one registry.
#[derive(Debug, Clone, Copy)]
pub struct DialectFactory<'r> {
    registry: &'r DialectRegistry,
}

impl<'r> DialectFactory<'r> {
    pub fn new(registry: &'r DialectRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &'r DialectRegistry {
        self.registry
    }

    /// Resolve and construct the handler for `connection`.
    ///
    /// The connection is only borrowed for metadata queries and for the
    /// lifetime of the returned handler.
    pub fn create_dialect<'c>(
        &self,
        connection: &'c dyn Connection,
    ) -> Result<Box<dyn Dialect + 'c>, DialectError> {
        let identity = product_identity(connection)?;
        tracing::debug!(database = %identity, "resolving dialect");

        let descriptor = self.registry.lookup(&identity)?;
        let dialect = descriptor.construct(connection)?;
        tracing::debug!(
            database = %identity,
            handler = dialect.type_name(),
            "created dialect"
        );
        Ok(dialect)
    }
}

impl Default for DialectFactory<'static> {
    /// A factory over the process-wide registry.
    fn default() -> Self {
        Self::new(DialectRegistry::global())
    }
}
