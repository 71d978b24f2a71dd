//! DDL emitter
//!
//! Runs one synchronization pass: resolve the dialect, compile the policy,
//! normalise the descriptors, take one snapshot of the live schema, plan
//! every table and render the plan. Nothing is executed.

use std::time::Duration;

use crate::config::{ClassifierConfig, NamingConfig, PolicyConfig};
use crate::db::metadata::MetadataSource;
use crate::dialect::{DialectGenerator, DialectRegistry};
use crate::error::{Error, Result};
use crate::schema::classifier::FieldSemanticClassifier;
use crate::schema::diff::{DdlOperation, DiffPlanner, SyncPolicy};
use crate::schema::introspector::SchemaIntrospector;
use crate::schema::types::TableDescriptor;
use crate::utils::naming::{get_foreign_key_name, get_index_name};

/// The planned operations for one table
#[derive(Debug, Clone, PartialEq)]
pub struct TablePlan {
    pub table: String,
    pub operations: Vec<DdlOperation>,
}

/// Orchestrates planning and rendering over one metadata source
pub struct DdlEmitter<'a> {
    registry: &'a DialectRegistry,
    source: &'a dyn MetadataSource,
    classifier: FieldSemanticClassifier,
    naming: NamingConfig,
    schema: Option<String>,
    timeout: Duration,
}

impl<'a> DdlEmitter<'a> {
    /// Create an emitter with default classifier and naming settings
    pub fn new(registry: &'a DialectRegistry, source: &'a dyn MetadataSource) -> Self {
        Self {
            registry,
            source,
            classifier: FieldSemanticClassifier::default(),
            naming: NamingConfig::default(),
            schema: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Use a classifier built from configuration
    pub fn with_classifier_config(mut self, config: &ClassifierConfig) -> Self {
        self.classifier = FieldSemanticClassifier::new(config);
        self
    }

    /// Use a custom classifier chain
    pub fn with_classifier(mut self, classifier: FieldSemanticClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Patterns for derived index and foreign key names
    pub fn with_naming(mut self, naming: NamingConfig) -> Self {
        self.naming = naming;
        self
    }

    /// Schema to introspect
    pub fn with_schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.map(str::to_string);
        self
    }

    /// Introspection deadline
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Plan and render every table, in the order given
    pub async fn process(
        &self,
        tables: &[TableDescriptor],
        policy: &PolicyConfig,
        dialect_id: &str,
    ) -> Result<Vec<String>> {
        let generator = self.registry.resolve(dialect_id)?;
        let plans = self.plan_with(generator.as_ref(), tables, policy).await?;

        let mut statements = Vec::new();
        for plan in &plans {
            let sql = generator
                .render_plan(&plan.operations)
                .map_err(|e| e.in_table(&plan.table, generator.id()))?;
            statements.extend(sql);
        }

        tracing::info!(
            dialect = generator.id(),
            tables = tables.len(),
            statements = statements.len(),
            "DDL generation complete"
        );
        Ok(statements)
    }

    /// Plan every table without rendering
    pub async fn plan(
        &self,
        tables: &[TableDescriptor],
        policy: &PolicyConfig,
        dialect_id: &str,
    ) -> Result<Vec<TablePlan>> {
        let generator = self.registry.resolve(dialect_id)?;
        self.plan_with(generator.as_ref(), tables, policy).await
    }

    async fn plan_with(
        &self,
        generator: &dyn DialectGenerator,
        tables: &[TableDescriptor],
        policy: &PolicyConfig,
    ) -> Result<Vec<TablePlan>> {
        let policy = SyncPolicy::compile(policy)?;

        // Excluded tables are never normalised, so a broken one cannot fail the run
        let normalized = tables
            .iter()
            .map(|table| {
                if policy.is_table_excluded(&table.english_name) {
                    tracing::debug!(table = %table.english_name, "Table excluded by policy");
                    return Ok(None);
                }
                self.normalize(table, generator, &policy)
                    .map(Some)
                    .map_err(|e| e.in_table(&table.english_name, generator.id()))
            })
            .collect::<Result<Vec<_>>>()?;

        let wanted: Vec<&str> = normalized
            .iter()
            .flatten()
            .map(|t| t.english_name.as_str())
            .collect();

        let snapshot = if wanted.is_empty() {
            Default::default()
        } else {
            SchemaIntrospector::new(self.source)
                .with_schema(self.schema.as_deref())
                .with_timeout(self.timeout)
                .snapshot(&wanted)
                .await?
        };

        let plans = tables
            .iter()
            .zip(&normalized)
            .map(|(declared, table)| {
                let table = match table {
                    Some(table) => table,
                    None => {
                        return TablePlan {
                            table: declared.english_name.clone(),
                            operations: Vec::new(),
                        }
                    }
                };
                let operations =
                    DiffPlanner::plan_resolved(table, snapshot.table(&table.english_name), &policy);
                tracing::debug!(
                    table = %table.english_name,
                    dialect = generator.id(),
                    operations = operations.len(),
                    "Planned table"
                );
                TablePlan {
                    table: table.english_name.clone(),
                    operations,
                }
            })
            .collect();

        Ok(plans)
    }

    /// Validate, classify and name a descriptor for one dialect
    ///
    /// Audit columns are renamed to their physical names here and the result
    /// is validated again.
    pub fn normalize(
        &self,
        table: &TableDescriptor,
        generator: &dyn DialectGenerator,
        policy: &SyncPolicy,
    ) -> Result<TableDescriptor> {
        table.validate()?;

        for index in &table.indexes {
            if index.columns.is_empty() {
                return Err(Error::ConfigError(format!("Index '{}' has no columns", index.name)));
            }
            if let Some(missing) = index.columns.iter().find(|c| table.find_column(c).is_none()) {
                return Err(Error::ConfigError(format!(
                    "Index '{}' references unknown column '{}'",
                    index.name, missing
                )));
            }
        }

        for fk in &table.foreign_keys {
            if table.find_column(&fk.column_name).is_none() {
                return Err(Error::ConfigError(format!(
                    "Foreign key '{}' references unknown column '{}'",
                    fk.name, fk.column_name
                )));
            }
        }

        let classified = self.classifier.classify_table(table, generator);
        let mut normalized = policy.resolve_audit_columns(&classified);
        // Physical audit names can collide with declared columns
        normalized.validate()?;
        let table_name = normalized.english_name.clone();

        for index in &mut normalized.indexes {
            if index.name.trim().is_empty() {
                index.name = get_index_name(&self.naming.index_pattern, &table_name, &index.columns);
            }
        }

        for fk in &mut normalized.foreign_keys {
            if fk.name.trim().is_empty() {
                fk.name = get_foreign_key_name(&self.naming.foreign_key_pattern, &table_name, &fk.column_name);
            }
        }

        Ok(normalized)
    }
}
