//! Dialect handlers, resolution and construction
//!
//! A dialect bundles the lexical rules and the few behavioral quirks of one
//! database product. The [`DialectRegistry`] maps product identities to
//! dialect descriptors and the [`DialectFactory`] turns a live connection into
//! a bound handler.

pub mod factory;
pub mod registry;
pub mod rules;
mod vendor;

pub use factory::{DialectFactory, product_identity};
pub use registry::{
    CUSTOM_DIALECT_PROPERTY_PREFIX, DescriptorSource, DialectConstructor, DialectDescriptor,
    DialectRegistry, HandlerNotFound,
};
pub use rules::{Delimiter, LexicalRules};
pub use vendor::{BuiltinDialect, Vendor};

use thiserror::Error;

use crate::connection::{Connection, ConnectionError};
use crate::script::{ScriptError, SqlScript};

/// Failure reported by a [`DialectConstructor`].
pub type ConstructError = Box<dyn std::error::Error + Send + Sync>;

/// A dialect handler, optionally bound to a connection.
pub trait Dialect {
    /// Name of the handler type, used in diagnostics.
    fn type_name(&self) -> &str;

    fn lexical_rules(&self) -> &LexicalRules;

    /// The connection this handler was created for, if any.
    fn connection(&self) -> Option<&dyn Connection>;

    /// Whether DDL statements can be rolled back with the surrounding
    /// transaction.
    fn supports_ddl_transactions(&self) -> bool;

    /// Quote an identifier so it can be embedded in generated SQL.
    fn quote_identifier(&self, identifier: &str) -> String {
        quote_with(identifier, '"', '"')
    }

    /// Split a script into statements using this handler's rules.
    fn parse_script(&self, source: &str) -> Result<SqlScript, ScriptError> {
        SqlScript::with_rules(source, self.lexical_rules(), self.type_name())
    }
}

/// Wrap `identifier` in `open`/`close`, doubling any embedded `close`.
pub(crate) fn quote_with(identifier: &str, open: char, close: char) -> String {
    let mut quoted = String::with_capacity(identifier.len() + 2);
    quoted.push(open);
    for c in identifier.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}

#[derive(Debug, Error)]
pub enum DialectError {
    #[error("Unable to read database metadata: the driver returned none")]
    MetadataUnavailable,

    #[error("Unable to determine database: product name is missing")]
    ProductIdentityUndetermined,

    #[error("Error while determining database product name")]
    Connectivity(#[source] ConnectionError),

    #[error("Unsupported Database: {identity}")]
    UnsupportedDatabase { identity: String },

    #[error("Could not find custom dialect handler for database {key}: {identifier}")]
    CustomDialectResolution {
        key: String,
        identifier: String,
        #[source]
        source: HandlerNotFound,
    },

    #[error("Unable to construct dialect handler for {type_name}")]
    DialectConstruction {
        type_name: String,
        #[source]
        source: ConstructError,
    },
}
