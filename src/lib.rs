//! migration-dialect: dialect resolution and SQL script splitting
//!
//! This library lets a migration tool run hand-written SQL scripts against
//! many database products. It resolves the dialect of a live connection from
//! its product identity and splits raw script text into individually
//! executable statements, honoring each product's comment, quoting and
//! delimiter rules.

pub mod config;
pub mod connection;
pub mod dialect;
pub mod script;

// Re-export commonly used types
pub use config::Config;
pub use connection::{Connection, ConnectionError, DatabaseMetadata, MetadataSnapshot};
pub use dialect::{
    BuiltinDialect, Dialect, DialectDescriptor, DialectError, DialectFactory, DialectRegistry,
    Vendor,
};
pub use script::{ScriptError, SqlScript, SqlStatement};
