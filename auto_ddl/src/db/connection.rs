//! Database connection handling
//!
//! Opens the read-only pool used for schema introspection.

use sqlx::{
    mysql::MySqlPoolOptions, postgres::PgPoolOptions, sqlite::SqlitePoolOptions, MySql, Pool,
    Postgres, Sqlite,
};
use std::time::Duration;

use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

/// Enumeration of supported database types
#[derive(Debug, Clone)]
pub enum DatabaseConnection {
    Postgres(Pool<Postgres>),
    MySql(Pool<MySql>),
    Sqlite(Pool<Sqlite>),
}

impl DatabaseConnection {
    /// Create a new database connection from configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let url = config.resolve_url()?;
        let driver = config.resolve_driver(&url)?;
        let pool_size = config.pool_size.unwrap_or(2);
        let acquire_timeout = config.timeout();

        tracing::debug!(driver = %driver, pool_size, "Connecting for introspection");

        match driver.as_str() {
            "postgres" | "postgresql" => {
                let pool = PgPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(acquire_timeout)
                    .connect(&url)
                    .await
                    .map_err(|e| Error::introspection("connecting to PostgreSQL", e))?;

                Ok(DatabaseConnection::Postgres(pool))
            }
            "mysql" | "mariadb" => {
                let pool = MySqlPoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(acquire_timeout)
                    .connect(&url)
                    .await
                    .map_err(|e| Error::introspection("connecting to MySQL", e))?;

                Ok(DatabaseConnection::MySql(pool))
            }
            "sqlite" => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(pool_size)
                    .acquire_timeout(acquire_timeout)
                    .connect(&url)
                    .await
                    .map_err(|e| Error::introspection("connecting to SQLite", e))?;

                Ok(DatabaseConnection::Sqlite(pool))
            }
            other => Err(Error::ConfigError(format!(
                "Unsupported database driver: {}",
                other
            ))),
        }
    }

    /// An in-memory SQLite database on a single long-lived connection
    pub async fn sqlite_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Duration::from_secs(5))
            .connect("sqlite::memory:")
            .await
            .map_err(|e| Error::introspection("opening in-memory SQLite", e))?;

        Ok(DatabaseConnection::Sqlite(pool))
    }

    /// Driver name of the connection
    pub fn driver(&self) -> &'static str {
        match self {
            DatabaseConnection::Postgres(_) => "postgres",
            DatabaseConnection::MySql(_) => "mysql",
            DatabaseConnection::Sqlite(_) => "sqlite",
        }
    }

    /// Close the pool
    pub async fn close(&self) {
        match self {
            DatabaseConnection::Postgres(pool) => pool.close().await,
            DatabaseConnection::MySql(pool) => pool.close().await,
            DatabaseConnection::Sqlite(pool) => pool.close().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_driver_is_config_error() {
        let config = DatabaseConfig {
            driver: Some("db2".to_string()),
            url: Some("db2://localhost/sample".to_string()),
            ..DatabaseConfig::default()
        };

        assert!(matches!(
            DatabaseConnection::connect(&config).await,
            Err(Error::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_sqlite_memory_connects() {
        let connection = DatabaseConnection::sqlite_memory().await.unwrap();
        assert_eq!(connection.driver(), "sqlite");
        connection.close().await;
    }
}
