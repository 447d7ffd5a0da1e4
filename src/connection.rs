//! Database connection interface
//!
//! Dialect resolution only needs the product identity of the database, so the
//! connection surface is a single metadata query. Drivers implement
//! [`Connection`] for their own handle types; the crate never opens or closes
//! a connection itself.

use std::error::Error as StdError;

use thiserror::Error;

/// Product information reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DatabaseMetadata {
    /// Product name, e.g. `PostgreSQL`. `None` when the driver cannot tell.
    pub product_name: Option<String>,
    pub major_version: i32,
    pub minor_version: i32,
}

impl DatabaseMetadata {
    pub fn new(product_name: impl Into<String>, major_version: i32, minor_version: i32) -> Self {
        Self {
            product_name: Some(product_name.into()),
            major_version,
            minor_version,
        }
    }
}

/// Transport-level failure while querying a connection.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ConnectionError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl ConnectionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

/// An open database connection, borrowed from the caller.
pub trait Connection {
    /// Query product metadata. `Ok(None)` means the driver returned no
    /// metadata object at all.
    fn metadata(&self) -> Result<Option<DatabaseMetadata>, ConnectionError>;
}

/// A connection stand-in answering metadata queries from a fixed snapshot.
///
/// Used when the product is known up front, e.g. when splitting a script
/// offline for a given database.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetadataSnapshot {
    metadata: Option<DatabaseMetadata>,
}

impl MetadataSnapshot {
    pub fn new(product_name: impl Into<String>, major_version: i32, minor_version: i32) -> Self {
        Self {
            metadata: Some(DatabaseMetadata::new(
                product_name,
                major_version,
                minor_version,
            )),
        }
    }

    /// Build a snapshot from a `"<name> <major>.<minor>"` identity.
    ///
    /// If the trailing version cannot be parsed, the whole string is taken as
    /// the product name with version `0.0`.
    pub fn from_identity(identity: &str) -> Self {
        let parsed = identity.rsplit_once(' ').and_then(|(name, version)| {
            let (major, minor) = version.split_once('.')?;
            Some((name, major.parse().ok()?, minor.parse().ok()?))
        });
        match parsed {
            Some((name, major, minor)) => Self::new(name, major, minor),
            None => Self::new(identity, 0, 0),
        }
    }

    /// A snapshot whose driver returned no metadata object.
    pub fn without_metadata() -> Self {
        Self { metadata: None }
    }

    pub fn with_metadata(metadata: DatabaseMetadata) -> Self {
        Self {
            metadata: Some(metadata),
        }
    }
}

impl Connection for MetadataSnapshot {
    fn metadata(&self) -> Result<Option<DatabaseMetadata>, ConnectionError> {
        Ok(self.metadata.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_identity_splits_version() {
        let snapshot = MetadataSnapshot::from_identity("Microsoft SQL Server 15.0");
        assert_eq!(
            snapshot.metadata().unwrap(),
            Some(DatabaseMetadata::new("Microsoft SQL Server", 15, 0))
        );
    }

    #[test]
    fn test_from_identity_without_version() {
        let snapshot = MetadataSnapshot::from_identity("H2");
        assert_eq!(
            snapshot.metadata().unwrap(),
            Some(DatabaseMetadata::new("H2", 0, 0))
        );

        let snapshot = MetadataSnapshot::from_identity("Oracle x.y");
        assert_eq!(
            snapshot.metadata().unwrap(),
            Some(DatabaseMetadata::new("Oracle x.y", 0, 0))
        );
    }

    #[test]
    fn test_without_metadata() {
        assert_eq!(MetadataSnapshot::without_metadata().metadata().unwrap(), None);
    }

    #[test]
    fn test_connection_error_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "socket closed");
        let err = ConnectionError::with_source("metadata query failed", io);
        assert_eq!(err.to_string(), "metadata query failed");
        assert!(err.source().is_some());
    }
}
