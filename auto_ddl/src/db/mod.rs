//! Database module for auto_ddl
//!
//! Read-only connections and the metadata readers behind introspection.

pub mod connection;
pub mod metadata;

// Re-export key types
pub use connection::DatabaseConnection;
pub use metadata::{InMemoryCatalog, MetadataSource, RawForeignKeyRow, RawIndexRow};
