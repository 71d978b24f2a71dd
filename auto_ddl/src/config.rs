//! Configuration handling for auto_ddl

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::schema::types::SemanticKind;

/// Environment variables consulted when no database URL is configured, in order
pub const DATABASE_URL_ENV_VARS: [&str; 2] = ["AUTO_DDL_DATABASE_URL", "DATABASE_URL"];

/// Load configuration from a TOML or YAML file
pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    let config_str = fs::read_to_string(path)
        .map_err(|e| Error::ConfigError(format!("Failed to read config file: {}", e)))?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let config: Config = if is_yaml {
        serde_yaml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?
    } else {
        toml::from_str(&config_str)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config file: {}", e)))?
    };

    Ok(config)
}

/// Represents the complete auto_ddl configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub naming: NamingConfig,
    pub logging: Option<LoggingConfig>,
}

/// Database connection configuration
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DatabaseConfig {
    /// One of `postgres`, `mysql`, `sqlite`; guessed from the URL when absent
    pub driver: Option<String>,
    pub url: Option<String>,
    pub schema: Option<String>,
    pub pool_size: Option<u32>,
    /// Deadline for the whole introspection pass
    pub timeout_seconds: Option<u64>,
}

impl DatabaseConfig {
    /// The configured URL, falling back to the environment
    pub fn resolve_url(&self) -> Result<String> {
        if let Some(url) = self.url.as_ref().filter(|u| !u.trim().is_empty()) {
            return Ok(url.clone());
        }

        DATABASE_URL_ENV_VARS
            .iter()
            .find_map(|var| std::env::var(var).ok().filter(|v| !v.trim().is_empty()))
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "No database url configured and none of {:?} is set",
                    DATABASE_URL_ENV_VARS
                ))
            })
    }

    /// The configured driver, or the one implied by the URL scheme
    pub fn resolve_driver(&self, url: &str) -> Result<String> {
        if let Some(driver) = &self.driver {
            return Ok(driver.to_lowercase());
        }

        let scheme = url.split(':').next().unwrap_or_default().to_lowercase();
        match scheme.as_str() {
            "postgres" | "postgresql" => Ok("postgres".to_string()),
            "mysql" | "mariadb" => Ok("mysql".to_string()),
            "sqlite" => Ok("sqlite".to_string()),
            _ => Err(Error::ConfigError(format!(
                "Cannot guess database driver from url scheme '{}'",
                scheme
            ))),
        }
    }

    /// Introspection deadline
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds.unwrap_or(30))
    }
}

/// Safety policy for one synchronization run
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PolicyConfig {
    pub exclude_tables: Vec<String>,
    /// When non-empty, only tables matching one of these globs are considered
    pub include_tables: Vec<String>,
    pub exclude_columns: Vec<String>,
    pub allow_destructive_column_drop: bool,
    pub include_foreign_keys: bool,
    pub include_indexes: bool,
    pub audit_columns: AuditColumnMap,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            exclude_tables: vec![
                "flyway_schema_history".to_string(),
                "databasechangelog*".to_string(),
                "_sqlx_migrations".to_string(),
                "__diesel_schema_migrations".to_string(),
                "schema_migrations".to_string(),
            ],
            include_tables: Vec::new(),
            exclude_columns: Vec::new(),
            allow_destructive_column_drop: false,
            include_foreign_keys: true,
            include_indexes: true,
            audit_columns: AuditColumnMap::default(),
        }
    }
}

/// Logical audit column name to physical column name
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AuditColumnMap {
    pub id: String,
    pub create_by: String,
    pub update_by: String,
    pub create_time: String,
    pub update_time: String,
}

impl Default for AuditColumnMap {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            create_by: "create_by".to_string(),
            update_by: "update_by".to_string(),
            create_time: "create_time".to_string(),
            update_time: "update_time".to_string(),
        }
    }
}

impl AuditColumnMap {
    /// Physical name for a logical audit column, matched in snake_case
    pub fn physical_name(&self, logical_snake: &str) -> Option<&str> {
        match logical_snake {
            "id" => Some(&self.id),
            "create_by" => Some(&self.create_by),
            "update_by" => Some(&self.update_by),
            "create_time" => Some(&self.create_time),
            "update_time" => Some(&self.update_time),
            _ => None,
        }
    }
}

/// Field classification settings
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Field-name fragments that promote a string field to TEXT
    pub text_keywords: Vec<String>,
    pub default_varchar_length: u32,
    /// Source type name to semantic kind, consulted before the built-in rules
    pub type_overrides: HashMap<String, SemanticKind>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            text_keywords: ["url", "base64", "text", "path", "introduction", "content", "description"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            default_varchar_length: 255,
            type_overrides: HashMap::new(),
        }
    }
}

/// Naming patterns for generated constraint names
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct NamingConfig {
    pub index_pattern: String,
    pub foreign_key_pattern: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            index_pattern: "idx_{table}_{columns}".to_string(),
            foreign_key_pattern: "fk_{table}_{column}".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_true")]
    pub stdout: bool,
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}
