//! Schema difference planner
//!
//! Compares one desired table with its introspected counterpart and produces
//! the ordered DDL operations that bring the live table forward. Planning is
//! pure: no I/O and no dialect knowledge.

use glob::{MatchOptions, Pattern};
use std::collections::HashSet;

use crate::config::{AuditColumnMap, PolicyConfig};
use crate::error::{Error, Result};
use crate::schema::types::{
    ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, IntrospectedTable, TableDescriptor,
};
use crate::utils::naming::to_column_style;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// One DDL change for one table
#[derive(Debug, Clone, PartialEq)]
pub enum DdlOperation {
    CreateTable(TableDescriptor),
    AddColumn {
        table: String,
        column: ColumnDescriptor,
    },
    DropColumn {
        table: String,
        column: String,
    },
    AddIndex {
        table: String,
        index: IndexDescriptor,
    },
    AddForeignKey {
        table: String,
        foreign_key: ForeignKeyDescriptor,
    },
}

impl DdlOperation {
    /// The table the operation changes
    pub fn table(&self) -> &str {
        match self {
            DdlOperation::CreateTable(table) => &table.english_name,
            DdlOperation::AddColumn { table, .. }
            | DdlOperation::DropColumn { table, .. }
            | DdlOperation::AddIndex { table, .. }
            | DdlOperation::AddForeignKey { table, .. } => table,
        }
    }

    /// Whether the operation can lose data
    pub fn is_destructive(&self) -> bool {
        matches!(self, DdlOperation::DropColumn { .. })
    }
}

/// A [`PolicyConfig`] with its glob patterns compiled
#[derive(Debug, Clone)]
pub struct SyncPolicy {
    exclude_tables: Vec<Pattern>,
    include_tables: Vec<Pattern>,
    exclude_columns: Vec<Pattern>,
    pub allow_destructive_column_drop: bool,
    pub include_foreign_keys: bool,
    pub include_indexes: bool,
    pub audit_columns: AuditColumnMap,
}

impl SyncPolicy {
    /// Compile the policy, failing on the first malformed pattern
    pub fn compile(config: &PolicyConfig) -> Result<Self> {
        Ok(Self {
            exclude_tables: compile_patterns(&config.exclude_tables)?,
            include_tables: compile_patterns(&config.include_tables)?,
            exclude_columns: compile_patterns(&config.exclude_columns)?,
            allow_destructive_column_drop: config.allow_destructive_column_drop,
            include_foreign_keys: config.include_foreign_keys,
            include_indexes: config.include_indexes,
            audit_columns: config.audit_columns.clone(),
        })
    }

    /// True when the table matches an exclusion or misses a non-empty allow-list
    pub fn is_table_excluded(&self, table: &str) -> bool {
        if self.exclude_tables.iter().any(|p| p.matches_with(table, MATCH_OPTIONS)) {
            return true;
        }
        !self.include_tables.is_empty()
            && !self.include_tables.iter().any(|p| p.matches_with(table, MATCH_OPTIONS))
    }

    /// Column patterns match either `column` or `table.column`
    pub fn is_column_excluded(&self, table: &str, column: &str) -> bool {
        let qualified = format!("{}.{}", table, column);
        self.exclude_columns.iter().any(|p| {
            p.matches_with(column, MATCH_OPTIONS) || p.matches_with(&qualified, MATCH_OPTIONS)
        })
    }

    /// Physical name of a column, after audit-column mapping
    pub fn physical_column_name(&self, column: &ColumnDescriptor) -> String {
        let logical = to_column_style(&column.column_name);
        match self.audit_columns.physical_name(&logical) {
            Some(physical) if !physical.trim().is_empty() => physical.to_string(),
            _ => column.column_name.clone(),
        }
    }

    /// Rename audit columns of a table to their physical names
    ///
    /// Every rename is looked up by the declared name, so mappings that swap
    /// two names apply once and never chain.
    pub fn resolve_audit_columns(&self, table: &TableDescriptor) -> TableDescriptor {
        let renames: Vec<(String, String)> = table
            .columns
            .iter()
            .map(|column| (column.column_name.clone(), self.physical_column_name(column)))
            .filter(|(logical, physical)| logical != physical)
            .collect();

        if renames.is_empty() {
            return table.clone();
        }

        let rename = |name: &str| -> Option<String> {
            renames
                .iter()
                .find(|(logical, _)| logical.eq_ignore_ascii_case(name))
                .map(|(_, physical)| physical.clone())
        };

        let mut resolved = table.clone();
        for column in &mut resolved.columns {
            if let Some(physical) = rename(&column.column_name) {
                column.column_name = physical;
            }
        }
        for index in &mut resolved.indexes {
            for indexed in &mut index.columns {
                if let Some(physical) = rename(indexed) {
                    *indexed = physical;
                }
            }
        }
        for fk in &mut resolved.foreign_keys {
            if let Some(physical) = rename(&fk.column_name) {
                fk.column_name = physical;
            }
        }
        resolved
    }
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            exclude_tables: Vec::new(),
            include_tables: Vec::new(),
            exclude_columns: Vec::new(),
            allow_destructive_column_drop: false,
            include_foreign_keys: true,
            include_indexes: true,
            audit_columns: AuditColumnMap::default(),
        }
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| Pattern::new(p.trim()).map_err(Error::from))
        .collect()
}

/// Plans the operations for one table
pub struct DiffPlanner;

impl DiffPlanner {
    /// Compare a desired table with the live one under a policy
    ///
    /// Audit columns of `desired` are renamed to their physical names first.
    /// Operations come out as CreateTable, then AddColumn in declaration
    /// order, then DropColumn, then AddIndex, then AddForeignKey. Indexes and
    /// foreign keys are only ever added.
    pub fn plan(
        desired: &TableDescriptor,
        existing: Option<&IntrospectedTable>,
        policy: &SyncPolicy,
    ) -> Vec<DdlOperation> {
        if policy.is_table_excluded(&desired.english_name) {
            tracing::debug!(table = %desired.english_name, "Table excluded by policy");
            return Vec::new();
        }
        Self::plan_resolved(&policy.resolve_audit_columns(desired), existing, policy)
    }

    /// Like [`DiffPlanner::plan`], for a descriptor whose audit columns are already resolved
    pub fn plan_resolved(
        desired: &TableDescriptor,
        existing: Option<&IntrospectedTable>,
        policy: &SyncPolicy,
    ) -> Vec<DdlOperation> {
        let table_name = desired.english_name.as_str();
        if policy.is_table_excluded(table_name) {
            tracing::debug!(table = table_name, "Table excluded by policy");
            return Vec::new();
        }

        let existing = match existing {
            Some(existing) => existing,
            None => return Self::plan_create(desired.clone(), policy),
        };

        let mut operations = Vec::new();

        for column in &desired.columns {
            if existing.has_column(&column.column_name)
                || policy.is_column_excluded(table_name, &column.column_name)
            {
                continue;
            }
            operations.push(DdlOperation::AddColumn {
                table: table_name.to_string(),
                column: column.clone(),
            });
        }

        let drop_candidates: Vec<&str> = existing
            .columns
            .iter()
            .map(|c| c.name.as_str())
            .filter(|name| desired.find_column(name).is_none())
            .filter(|name| !policy.is_column_excluded(table_name, name))
            .collect();

        if policy.allow_destructive_column_drop {
            operations.extend(drop_candidates.iter().map(|name| DdlOperation::DropColumn {
                table: table_name.to_string(),
                column: name.to_string(),
            }));
        } else if !drop_candidates.is_empty() {
            tracing::info!(
                table = table_name,
                columns = ?drop_candidates,
                "Skipping column drops; destructive drops are disabled"
            );
        }

        // Columns the table will have once the additions above are applied
        let mut available: HashSet<String> =
            existing.columns.iter().map(|c| c.name.to_lowercase()).collect();
        available.extend(operations.iter().filter_map(|op| match op {
            DdlOperation::AddColumn { column, .. } => Some(column.column_name.to_lowercase()),
            _ => None,
        }));
        let is_available = |column: &str| available.contains(&column.to_lowercase());

        if policy.include_indexes {
            let (usable, skipped): (Vec<IndexDescriptor>, Vec<IndexDescriptor>) = desired
                .indexes
                .iter()
                .cloned()
                .partition(|index| index.columns.iter().all(|c| is_available(c.as_str())));
            if !skipped.is_empty() {
                let names: Vec<&str> = skipped.iter().map(|i| i.name.as_str()).collect();
                tracing::info!(
                    table = table_name,
                    indexes = ?names,
                    "Skipping indexes over columns the table will not have"
                );
            }

            let present: HashSet<_> = existing.indexes.iter().map(IndexDescriptor::identity).collect();
            operations.extend(
                missing_by_identity(&usable, present, IndexDescriptor::identity)
                    .map(|index| DdlOperation::AddIndex {
                        table: table_name.to_string(),
                        index,
                    })
                    .collect::<Vec<_>>(),
            );
        }

        if policy.include_foreign_keys {
            let (usable, skipped): (Vec<ForeignKeyDescriptor>, Vec<ForeignKeyDescriptor>) = desired
                .foreign_keys
                .iter()
                .cloned()
                .partition(|fk| is_available(fk.column_name.as_str()));
            if !skipped.is_empty() {
                let names: Vec<&str> = skipped.iter().map(|fk| fk.name.as_str()).collect();
                tracing::info!(
                    table = table_name,
                    foreign_keys = ?names,
                    "Skipping foreign keys over columns the table will not have"
                );
            }

            let present: HashSet<_> = existing
                .foreign_keys
                .iter()
                .map(ForeignKeyDescriptor::identity)
                .collect();
            operations.extend(
                missing_by_identity(&usable, present, ForeignKeyDescriptor::identity)
                    .map(|foreign_key| DdlOperation::AddForeignKey {
                        table: table_name.to_string(),
                        foreign_key,
                    })
                    .collect::<Vec<_>>(),
            );
        }

        operations
    }

    /// The created table carries only the indexes and foreign keys that are planned
    fn plan_create(mut desired: TableDescriptor, policy: &SyncPolicy) -> Vec<DdlOperation> {
        let table_name = desired.english_name.clone();

        desired.indexes = if policy.include_indexes {
            missing_by_identity(&desired.indexes, HashSet::new(), IndexDescriptor::identity).collect()
        } else {
            Vec::new()
        };
        desired.foreign_keys = if policy.include_foreign_keys {
            missing_by_identity(&desired.foreign_keys, HashSet::new(), ForeignKeyDescriptor::identity)
                .collect()
        } else {
            Vec::new()
        };

        let indexes: Vec<DdlOperation> = desired
            .indexes
            .iter()
            .cloned()
            .map(|index| DdlOperation::AddIndex {
                table: table_name.clone(),
                index,
            })
            .collect();
        let foreign_keys: Vec<DdlOperation> = desired
            .foreign_keys
            .iter()
            .cloned()
            .map(|foreign_key| DdlOperation::AddForeignKey {
                table: table_name.clone(),
                foreign_key,
            })
            .collect();

        let mut operations = vec![DdlOperation::CreateTable(desired)];
        operations.extend(indexes);
        operations.extend(foreign_keys);
        operations
    }
}

/// Items whose identity is not yet present, first declaration wins
fn missing_by_identity<'a, T, K, F>(
    desired: &'a [T],
    mut present: HashSet<K>,
    identity: F,
) -> impl Iterator<Item = T> + 'a
where
    T: Clone,
    K: std::hash::Hash + Eq + 'a,
    F: Fn(&T) -> K + 'a,
{
    desired
        .iter()
        .filter(move |item| present.insert(identity(item)))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::SemanticKind;
    use pretty_assertions::assert_eq;

    fn order_table() -> TableDescriptor {
        TableDescriptor::new("biz_order")
            .column(ColumnDescriptor::new("id", "Long").primary_key().auto_increment())
            .column(ColumnDescriptor::new("amount", "BigDecimal"))
            .column(ColumnDescriptor::new("status", "String"))
    }

    #[test]
    fn test_missing_table_is_created() {
        let ops = DiffPlanner::plan(&order_table(), None, &SyncPolicy::default());
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], DdlOperation::CreateTable(t) if t.columns.len() == 3));
    }

    #[test]
    fn test_existing_columns_match_ignoring_case() {
        let existing = IntrospectedTable::new("BIZ_ORDER")
            .with_column("ID", "NUMBER", false)
            .with_column("AMOUNT", "NUMBER", true)
            .with_column("STATUS", "VARCHAR2", true);

        let ops = DiffPlanner::plan(&order_table(), Some(&existing), &SyncPolicy::default());
        assert!(ops.is_empty());
    }

    #[test]
    fn test_audit_columns_resolve_before_comparison() {
        let config = PolicyConfig {
            audit_columns: AuditColumnMap {
                create_time: "gmt_create".to_string(),
                ..AuditColumnMap::default()
            },
            ..PolicyConfig::default()
        };
        let policy = SyncPolicy::compile(&config).unwrap();
        let desired = order_table()
            .column(ColumnDescriptor::new("createTime", "LocalDateTime").kind(SemanticKind::Datetime));
        let existing = IntrospectedTable::new("biz_order")
            .with_column("id", "bigint", false)
            .with_column("amount", "decimal", true)
            .with_column("status", "varchar", true)
            .with_column("gmt_create", "datetime", true);

        assert!(DiffPlanner::plan(&desired, Some(&existing), &policy).is_empty());

        let ops = DiffPlanner::plan(&desired, None, &policy);
        match &ops[0] {
            DdlOperation::CreateTable(table) => assert!(table.find_column("gmt_create").is_some()),
            other => panic!("expected CreateTable, got {:?}", other),
        }
    }

    #[test]
    fn test_excluded_columns_are_neither_added_nor_dropped() {
        let config = PolicyConfig {
            exclude_columns: vec!["biz_order.status".to_string(), "tenant_*".to_string()],
            allow_destructive_column_drop: true,
            ..PolicyConfig::default()
        };
        let policy = SyncPolicy::compile(&config).unwrap();
        let existing = IntrospectedTable::new("biz_order")
            .with_column("id", "bigint", false)
            .with_column("amount", "decimal", true)
            .with_column("tenant_id", "bigint", true);

        let ops = DiffPlanner::plan(&order_table(), Some(&existing), &policy);
        assert!(ops.is_empty(), "unexpected {:?}", ops);
    }

    #[test]
    fn test_indexes_and_foreign_keys_over_excluded_columns_are_skipped() {
        let config = PolicyConfig {
            exclude_columns: vec!["tenant_*".to_string()],
            ..PolicyConfig::default()
        };
        let policy = SyncPolicy::compile(&config).unwrap();
        let desired = TableDescriptor::new("biz_order")
            .column(ColumnDescriptor::new("id", "Long").primary_key())
            .column(ColumnDescriptor::new("tenant_id", "Long"))
            .column(ColumnDescriptor::new("status", "String"))
            .index(IndexDescriptor::new("idx_t", &["tenant_id"], false))
            .index(IndexDescriptor::new("idx_t_status", &["status", "tenant_id"], false))
            .index(IndexDescriptor::new("idx_status", &["status"], false))
            .foreign_key(ForeignKeyDescriptor::new("fk_t", "tenant_id", "sys_tenant", "id"));
        let existing = IntrospectedTable::new("biz_order").with_column("id", "bigint", false);

        let ops = DiffPlanner::plan(&desired, Some(&existing), &policy);
        assert_eq!(
            ops,
            vec![
                DdlOperation::AddColumn {
                    table: "biz_order".to_string(),
                    column: ColumnDescriptor::new("status", "String"),
                },
                DdlOperation::AddIndex {
                    table: "biz_order".to_string(),
                    index: IndexDescriptor::new("idx_status", &["status"], false),
                },
            ]
        );

        let live_tenant = existing.with_column("TENANT_ID", "bigint", true);
        let ops = DiffPlanner::plan(&desired, Some(&live_tenant), &policy);
        assert_eq!(ops.len(), 5);
        assert!(ops
            .iter()
            .any(|op| matches!(op, DdlOperation::AddForeignKey { foreign_key, .. } if foreign_key.name == "fk_t")));
    }

    #[test]
    fn test_swapped_audit_names_resolve_once() {
        let config = PolicyConfig {
            audit_columns: AuditColumnMap {
                create_by: "update_by".to_string(),
                update_by: "create_by".to_string(),
                ..AuditColumnMap::default()
            },
            ..PolicyConfig::default()
        };
        let policy = SyncPolicy::compile(&config).unwrap();
        let desired = TableDescriptor::new("biz_order")
            .column(ColumnDescriptor::new("id", "Long").primary_key())
            .column(ColumnDescriptor::new("createBy", "Long"))
            .column(ColumnDescriptor::new("updateBy", "Long"))
            .index(IndexDescriptor::new("idx_creator", &["createBy"], false));

        let resolved = policy.resolve_audit_columns(&desired);
        let names: Vec<&str> = resolved.columns.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["id", "update_by", "create_by"]);
        assert_eq!(resolved.indexes[0].columns, vec!["update_by".to_string()]);

        match &DiffPlanner::plan(&desired, None, &policy)[0] {
            DdlOperation::CreateTable(table) => assert_eq!(table.columns[1].column_name, "update_by"),
            other => panic!("expected CreateTable, got {:?}", other),
        }
    }

    #[test]
    fn test_created_table_carries_only_planned_constraints() {
        let policy = SyncPolicy {
            include_foreign_keys: false,
            ..SyncPolicy::default()
        };
        let desired = order_table()
            .index(IndexDescriptor::new("idx_a", &["status"], false))
            .index(IndexDescriptor::new("idx_b", &["status"], false))
            .foreign_key(ForeignKeyDescriptor::new("fk_x", "amount", "biz_x", "id"));

        let ops = DiffPlanner::plan(&desired, None, &policy);
        assert_eq!(ops.len(), 2);
        match &ops[0] {
            DdlOperation::CreateTable(table) => {
                assert_eq!(table.indexes.len(), 1);
                assert!(table.foreign_keys.is_empty());
            }
            other => panic!("expected CreateTable, got {:?}", other),
        }
    }

    #[test]
    fn test_duplicate_index_identity_planned_once() {
        let desired = order_table()
            .index(IndexDescriptor::new("idx_a", &["status"], false))
            .index(IndexDescriptor::new("idx_b", &["STATUS"], false));
        let existing = IntrospectedTable::new("biz_order")
            .with_column("id", "bigint", false)
            .with_column("amount", "decimal", true)
            .with_column("status", "varchar", true);

        let ops = DiffPlanner::plan(&desired, Some(&existing), &SyncPolicy::default());
        assert_eq!(ops.len(), 1);
        assert!(matches!(&ops[0], DdlOperation::AddIndex { index, .. } if index.name == "idx_a"));
    }

    #[test]
    fn test_include_list_limits_tables() {
        let config = PolicyConfig {
            include_tables: vec!["sys_*".to_string()],
            ..PolicyConfig::default()
        };
        let policy = SyncPolicy::compile(&config).unwrap();

        assert!(policy.is_table_excluded("biz_order"));
        assert!(!policy.is_table_excluded("SYS_USER"));
        assert!(policy.is_table_excluded("flyway_schema_history"));
    }

    #[test]
    fn test_malformed_pattern_is_config_error() {
        let config = PolicyConfig {
            exclude_tables: vec!["biz_[".to_string()],
            ..PolicyConfig::default()
        };
        assert!(matches!(
            SyncPolicy::compile(&config),
            Err(Error::ConfigError(_))
        ));
    }
}
