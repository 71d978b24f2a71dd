//! Dialect registry
//!
//! An explicitly constructed map from dialect identifier to generator. It is
//! built once at startup and shared read-only afterwards, so lookups never race
//! with registration.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::dialect::{
    DialectGenerator, DmDialect, H2Dialect, KingbaseDialect, MySqlDialect, OracleDialect,
    PostgresDialect, SqlServerDialect, SqliteDialect, DM, H2, KINGBASE, MYSQL, ORACLE, POSTGRESQL,
    SQLITE, SQLSERVER,
};
use crate::error::{Error, Result};

/// Registry of DDL generators keyed by lower-case dialect id
#[derive(Default, Clone)]
pub struct DialectRegistry {
    dialects: HashMap<String, Arc<dyn DialectGenerator>>,
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("dialects", &self.dialect_ids())
            .finish()
    }
}

impl DialectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with every built-in dialect registered
    ///
    /// `postgres`, `mariadb`, `mssql` and `kingbasees` are registered as aliases.
    pub fn with_builtins() -> Result<Self> {
        let mut registry = Self::new();

        let mysql: Arc<dyn DialectGenerator> = Arc::new(MySqlDialect::new()?);
        let postgres: Arc<dyn DialectGenerator> = Arc::new(PostgresDialect::new()?);
        let sqlserver: Arc<dyn DialectGenerator> = Arc::new(SqlServerDialect::new()?);
        let kingbase: Arc<dyn DialectGenerator> = Arc::new(KingbaseDialect::new()?);

        registry.register(MYSQL, mysql.clone())?;
        registry.register("mariadb", mysql)?;
        registry.register(POSTGRESQL, postgres.clone())?;
        registry.register("postgres", postgres)?;
        registry.register(ORACLE, Arc::new(OracleDialect::new()?))?;
        registry.register(DM, Arc::new(DmDialect::new()?))?;
        registry.register(H2, Arc::new(H2Dialect::new()?))?;
        registry.register(SQLITE, Arc::new(SqliteDialect::new()?))?;
        registry.register(SQLSERVER, sqlserver.clone())?;
        registry.register("mssql", sqlserver)?;
        registry.register(KINGBASE, kingbase.clone())?;
        registry.register("kingbasees", kingbase)?;

        Ok(registry)
    }

    /// Register a generator under an id, replacing any previous one
    ///
    /// Fails when the generator's type mapping does not cover every semantic kind.
    pub fn register(&mut self, id: &str, generator: Arc<dyn DialectGenerator>) -> Result<()> {
        let key = normalize_id(id);
        if key.is_empty() {
            return Err(Error::ConfigError("Dialect id must not be empty".to_string()));
        }

        generator.type_mapping().validate(&key)?;

        if self.dialects.insert(key.clone(), generator).is_some() {
            tracing::debug!(dialect = %key, "Replaced registered dialect");
        }
        Ok(())
    }

    /// Register a generator value
    pub fn register_dialect(&mut self, id: &str, generator: impl DialectGenerator + 'static) -> Result<()> {
        self.register(id, Arc::new(generator))
    }

    /// Look up a generator by id, ignoring case
    pub fn resolve(&self, id: &str) -> Result<Arc<dyn DialectGenerator>> {
        self.dialects
            .get(&normalize_id(id))
            .cloned()
            .ok_or_else(|| Error::UnsupportedDialect(id.to_string()))
    }

    /// Whether an id is registered
    pub fn contains(&self, id: &str) -> bool {
        self.dialects.contains_key(&normalize_id(id))
    }

    /// Registered ids, sorted
    pub fn dialect_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.dialects.keys().cloned().collect();
        ids.sort();
        ids
    }
}

fn normalize_id(id: &str) -> String {
    id.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{CommentStyle, DialectProfile, IdentityPlacement, TypeMapping};
    use crate::schema::types::SemanticKind;

    struct HalfMapped {
        profile: DialectProfile,
        mapping: TypeMapping,
    }

    impl DialectGenerator for HalfMapped {
        fn profile(&self) -> &DialectProfile {
            &self.profile
        }

        fn type_mapping(&self) -> &TypeMapping {
            &self.mapping
        }

        fn default_string_type(&self) -> &str {
            "VARCHAR(255)"
        }
    }

    fn half_mapped() -> HalfMapped {
        HalfMapped {
            profile: DialectProfile {
                id: "half".to_string(),
                quote: '"',
                auto_increment: String::new(),
                identity_placement: IdentityPlacement::BeforeNotNull,
                comments: CommentStyle::Separate,
                max_identifier_length: 30,
                bounded_text: true,
            },
            mapping: TypeMapping::from_entries([(SemanticKind::Integer, "INT")]),
        }
    }

    #[test]
    fn test_builtins_resolve_case_insensitively() {
        let registry = DialectRegistry::with_builtins().unwrap();

        for id in [
            "mysql", "ORACLE", "PostgreSQL", "dm", "h2", "postgres", "SQLite", "sqlserver", "MSSQL",
            "kingbase", "KingbaseES",
        ] {
            assert!(registry.resolve(id).is_ok(), "{} should resolve", id);
        }
        assert_eq!(registry.resolve("Postgres").unwrap().id(), "postgresql");
        assert_eq!(registry.resolve("mssql").unwrap().id(), "sqlserver");
    }

    #[test]
    fn test_unknown_dialect() {
        let registry = DialectRegistry::with_builtins().unwrap();
        assert!(matches!(
            registry.resolve("sybase"),
            Err(Error::UnsupportedDialect(id)) if id == "sybase"
        ));
    }

    #[test]
    fn test_register_rejects_partial_mapping() {
        let mut registry = DialectRegistry::new();
        let result = registry.register_dialect("half", half_mapped());

        assert!(matches!(result, Err(Error::UnmappedSemanticKind { .. })));
        assert!(!registry.contains("half"));
    }

    #[test]
    fn test_every_builtin_maps_every_kind() {
        let registry = DialectRegistry::with_builtins().unwrap();
        for id in registry.dialect_ids() {
            let generator = registry.resolve(&id).unwrap();
            assert!(generator.type_mapping().missing_kinds().is_empty(), "{} is partial", id);
        }
    }
}
