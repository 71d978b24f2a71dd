//! auto_ddl: forward-only DDL generation from entity descriptors
//!
//! auto_ddl compares declarative table descriptors with a live database
//! schema and renders the CREATE TABLE / ALTER TABLE statements that bring
//! the database in line, for MySQL, Oracle, PostgreSQL, DM, H2, SQLite,
//! SQL Server and KingbaseES. It never executes DDL; callers decide what to
//! do with the statements.
//!
//! Column drops are off unless the policy enables them, and indexes and
//! foreign keys are only ever added.

pub mod config;
pub mod db;
pub mod dialect;
pub mod emitter;
pub mod error;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::{Config, PolicyConfig};
pub use db::connection::DatabaseConnection;
pub use db::metadata::{InMemoryCatalog, MetadataSource};
pub use dialect::{DialectGenerator, DialectRegistry};
pub use emitter::{DdlEmitter, TablePlan};
pub use error::{Error, Result};
pub use schema::diff::{DdlOperation, DiffPlanner, SyncPolicy};
pub use schema::introspector::SchemaIntrospector;
pub use schema::types::{
    load_descriptors, ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, SemanticKind, TableDescriptor,
};

/// Initialize auto_ddl with the specified configuration file
pub async fn init(config_path: &str) -> Result<AutoDdlClient> {
    let config = config::load_from_file(config_path)?;
    utils::logging::init_logging(&config.logging)?;
    AutoDdlClient::new(config).await
}

/// Configuration, dialect registry and introspection connection for repeated runs
pub struct AutoDdlClient {
    config: Config,
    registry: DialectRegistry,
    connection: DatabaseConnection,
}

impl AutoDdlClient {
    /// Connect using the database section of the configuration
    pub async fn new(config: Config) -> Result<Self> {
        let registry = DialectRegistry::with_builtins()?;
        // Reject malformed patterns before touching the database
        SyncPolicy::compile(&config.policy)?;
        let connection = DatabaseConnection::connect(&config.database).await?;

        Ok(Self {
            config,
            registry,
            connection,
        })
    }

    /// Use an existing connection and registry
    pub fn with_parts(config: Config, registry: DialectRegistry, connection: DatabaseConnection) -> Self {
        Self {
            config,
            registry,
            connection,
        }
    }

    /// The loaded configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The dialect registry
    pub fn registry(&self) -> &DialectRegistry {
        &self.registry
    }

    /// An emitter over this client's connection and settings
    pub fn emitter(&self) -> DdlEmitter<'_> {
        DdlEmitter::new(&self.registry, &self.connection)
            .with_classifier_config(&self.config.classifier)
            .with_naming(self.config.naming.clone())
            .with_schema(self.config.database.schema.as_deref())
            .with_timeout(self.config.database.timeout())
    }

    /// Generate the DDL statements for the given tables
    pub async fn generate(&self, tables: &[TableDescriptor], dialect_id: &str) -> Result<Vec<String>> {
        self.emitter()
            .process(tables, &self.config.policy, dialect_id)
            .await
    }

    /// Generate the DDL statements as one script
    pub async fn generate_script(&self, tables: &[TableDescriptor], dialect_id: &str) -> Result<String> {
        let statements = self.generate(tables, dialect_id).await?;
        Ok(statements.join("\n\n"))
    }

    /// Close the introspection connection
    pub async fn close(&self) {
        self.connection.close().await;
    }
}
