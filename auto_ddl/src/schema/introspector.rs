//! Live schema introspection
//!
//! Reads the tables a run asks about from a [`MetadataSource`] into one
//! [`SchemaSnapshot`]. The whole read runs under a single deadline.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::time::Duration;

use crate::db::metadata::{MetadataSource, RawForeignKeyRow, RawIndexRow};
use crate::error::{Error, Result};
use crate::schema::types::{ForeignKeyDescriptor, IndexDescriptor, IntrospectedTable, SchemaSnapshot};

/// Snapshot builder over a metadata source
pub struct SchemaIntrospector<'a> {
    source: &'a dyn MetadataSource,
    schema: Option<String>,
    timeout: Duration,
}

impl<'a> SchemaIntrospector<'a> {
    /// Create an introspector with a 30 second deadline
    pub fn new(source: &'a dyn MetadataSource) -> Self {
        Self {
            source,
            schema: None,
            timeout: Duration::from_secs(30),
        }
    }

    /// Read from a specific schema instead of the connection default
    pub fn with_schema(mut self, schema: Option<&str>) -> Self {
        self.schema = schema.map(str::to_string);
        self
    }

    /// Deadline for the whole snapshot
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Read every table in the schema
    pub async fn snapshot_all(&self) -> Result<SchemaSnapshot> {
        self.run(None).await
    }

    /// Read only the named tables, matched ignoring case
    ///
    /// Names that do not exist are simply absent from the snapshot.
    pub async fn snapshot(&self, tables: &[&str]) -> Result<SchemaSnapshot> {
        let wanted: HashSet<String> = tables.iter().map(|t| t.to_lowercase()).collect();
        self.run(Some(&wanted)).await
    }

    async fn run(&self, wanted: Option<&HashSet<String>>) -> Result<SchemaSnapshot> {
        match tokio::time::timeout(self.timeout, self.load(wanted)).await {
            Ok(result) => result,
            Err(_) => Err(Error::IntrospectionTimeout {
                timeout: self.timeout,
            }),
        }
    }

    async fn load(&self, wanted: Option<&HashSet<String>>) -> Result<SchemaSnapshot> {
        let schema = self.schema.as_deref();
        let mut snapshot = SchemaSnapshot::new(self.schema.clone());

        let names = self.source.table_names(schema).await?;
        tracing::debug!(tables = names.len(), schema = ?schema, "Listed live tables");

        for name in names {
            if let Some(wanted) = wanted {
                if !wanted.contains(&name.to_lowercase()) {
                    continue;
                }
            }

            let mut table = IntrospectedTable::new(&name);
            table.columns = self.source.columns(schema, &name).await?;
            table.indexes = group_indexes(self.source.index_rows(schema, &name).await?);
            table.foreign_keys = self
                .source
                .foreign_key_rows(schema, &name)
                .await?
                .into_iter()
                .map(foreign_key_from_row)
                .collect();

            snapshot.add_table(table);
        }

        tracing::info!(tables = snapshot.len(), "Schema snapshot loaded");
        Ok(snapshot)
    }
}

/// Whether an index name denotes a primary key
///
/// SQLite's `sqlite_autoindex_*` also backs UNIQUE constraints, so SQLite rows
/// rely on the catalog's own primary flag instead.
pub fn is_primary_key_index(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower == "primary" || lower.ends_with("_pkey") || lower.starts_with("pk_")
}

/// Group raw rows into indexes, dropping primary keys
///
/// Indexes keep the order of their first row and columns keep row order.
pub fn group_indexes(rows: Vec<RawIndexRow>) -> Vec<IndexDescriptor> {
    let mut grouped: IndexMap<String, IndexDescriptor> = IndexMap::new();

    for row in rows {
        if row.primary || is_primary_key_index(&row.index_name) {
            continue;
        }

        let unique = row.unique;
        grouped
            .entry(row.index_name.clone())
            .or_insert_with(|| IndexDescriptor {
                name: row.index_name.clone(),
                columns: Vec::new(),
                unique,
            })
            .columns
            .push(row.column_name);
    }

    grouped.into_values().collect()
}

fn foreign_key_from_row(row: RawForeignKeyRow) -> ForeignKeyDescriptor {
    ForeignKeyDescriptor {
        name: row.name,
        column_name: row.column_name,
        referenced_table: row.referenced_table,
        referenced_column: row.referenced_column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::metadata::InMemoryCatalog;
    use pretty_assertions::assert_eq;

    fn row(index: &str, column: &str, unique: bool) -> RawIndexRow {
        RawIndexRow {
            index_name: index.to_string(),
            column_name: column.to_string(),
            unique,
            primary: false,
        }
    }

    #[test]
    fn test_group_indexes_drops_primary_keys_and_keeps_order() {
        let rows = vec![
            row("PRIMARY", "id", true),
            row("idx_order_user_date", "user_id", false),
            row("uk_order_no", "order_no", true),
            row("idx_order_user_date", "order_date", false),
            row("biz_order_pkey", "id", true),
            RawIndexRow {
                primary: true,
                ..row("order_id_key", "id", true)
            },
        ];

        let indexes = group_indexes(rows);
        assert_eq!(
            indexes,
            vec![
                IndexDescriptor::new("idx_order_user_date", &["user_id", "order_date"], false),
                IndexDescriptor::new("uk_order_no", &["order_no"], true),
            ]
        );
    }

    #[tokio::test]
    async fn test_snapshot_reads_only_requested_tables() {
        let catalog = InMemoryCatalog::new()
            .with_table(IntrospectedTable::new("biz_order").with_column("id", "bigint", false))
            .with_table(IntrospectedTable::new("sys_user").with_column("id", "bigint", false))
            .with_index_row("biz_order", row("pk_biz_order", "id", true));

        let snapshot = SchemaIntrospector::new(&catalog)
            .snapshot(&["BIZ_ORDER", "missing"])
            .await
            .unwrap();

        assert_eq!(snapshot.len(), 1);
        let table = snapshot.table("biz_order").unwrap();
        assert!(table.indexes.is_empty());
        assert!(snapshot.table("sys_user").is_none());
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let catalog = InMemoryCatalog::new().with_latency(Duration::from_secs(5));

        let result = SchemaIntrospector::new(&catalog)
            .with_timeout(Duration::from_millis(20))
            .snapshot_all()
            .await;

        match result {
            Err(err @ Error::IntrospectionTimeout { .. }) => {
                assert_eq!(err.to_string(), "Introspection timed out after 20ms");
            }
            other => panic!("expected a timeout, got {:?}", other),
        }
    }
}
