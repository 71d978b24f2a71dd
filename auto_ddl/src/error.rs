//! Error types for auto_ddl

use thiserror::Error;

use crate::schema::types::SemanticKind;

/// Result type for auto_ddl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for auto_ddl
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Dialect '{dialect}' has no type mapping for {kinds:?}")]
    UnmappedSemanticKind {
        dialect: String,
        kinds: Vec<SemanticKind>,
    },

    #[error("Introspection error while {context}: {source}")]
    Introspection {
        context: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Introspection timed out after {timeout:?}")]
    IntrospectionTimeout { timeout: std::time::Duration },

    #[error("Introspection error: {0}")]
    IntrospectionFailed(String),

    #[error("Table '{table}' ({dialect}): {source}")]
    Table {
        table: String,
        dialect: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl Error {
    /// Attach table and dialect context to an error
    pub fn in_table(self, table: &str, dialect: &str) -> Self {
        Error::Table {
            table: table.to_string(),
            dialect: dialect.to_string(),
            source: Box::new(self),
        }
    }

    /// Wrap a driver error raised while reading schema metadata
    pub(crate) fn introspection(context: impl Into<String>, source: sqlx::Error) -> Self {
        Error::Introspection {
            context: context.into(),
            source,
        }
    }
}

/// Convert Serde JSON errors to auto_ddl errors
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Error::SerializationError(error.to_string())
    }
}

/// Convert YAML errors to auto_ddl errors
impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

/// Convert TOML deserialization errors to auto_ddl errors
impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        Error::ConfigError(error.to_string())
    }
}

/// Malformed exclusion globs are configuration errors
impl From<glob::PatternError> for Error {
    fn from(error: glob::PatternError) -> Self {
        Error::ConfigError(format!("Invalid glob pattern: {}", error))
    }
}
