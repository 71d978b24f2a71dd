//! Raw schema metadata readers
//!
//! A [`MetadataSource`] answers four questions about the live database: which
//! tables exist, and for one table its columns, index rows and foreign key
//! rows. Rows come back unprocessed. Primary-key filtering and grouping happen
//! in the introspector.

use async_trait::async_trait;
use indexmap::IndexMap;
use sqlx::{FromRow, MySql, Pool, Postgres, Sqlite};
use std::time::Duration;

use crate::db::connection::DatabaseConnection;
use crate::error::{Error, Result};
use crate::schema::types::{IntrospectedColumn, IntrospectedTable};

/// One (index, column) pair as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawIndexRow {
    pub index_name: String,
    pub column_name: String,
    pub unique: bool,
    /// Set when the catalog itself marks the index as the primary key
    pub primary: bool,
}

/// One foreign key column as reported by the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawForeignKeyRow {
    pub name: String,
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

/// Read access to the live schema
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Base tables in the schema
    async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>>;

    /// Columns of one table in ordinal order
    async fn columns(&self, schema: Option<&str>, table: &str) -> Result<Vec<IntrospectedColumn>>;

    /// Index rows of one table, ordered by index then column position
    async fn index_rows(&self, schema: Option<&str>, table: &str) -> Result<Vec<RawIndexRow>>;

    /// Foreign key rows of one table
    async fn foreign_key_rows(&self, schema: Option<&str>, table: &str) -> Result<Vec<RawForeignKeyRow>>;
}

#[derive(FromRow)]
struct TableRow {
    table_name: String,
}

#[derive(FromRow)]
struct ColumnRow {
    column_name: String,
    data_type: String,
    is_nullable: String,
}

#[derive(FromRow)]
struct IndexRow {
    index_name: String,
    column_name: String,
    is_unique: bool,
    is_primary: bool,
}

#[derive(FromRow)]
struct ForeignKeyRow {
    constraint_name: String,
    column_name: String,
    ref_table: String,
    ref_column: String,
}

impl From<ColumnRow> for IntrospectedColumn {
    fn from(row: ColumnRow) -> Self {
        IntrospectedColumn {
            name: row.column_name,
            data_type: row.data_type,
            nullable: row.is_nullable.eq_ignore_ascii_case("YES"),
        }
    }
}

impl From<IndexRow> for RawIndexRow {
    fn from(row: IndexRow) -> Self {
        RawIndexRow {
            index_name: row.index_name,
            column_name: row.column_name,
            unique: row.is_unique,
            primary: row.is_primary,
        }
    }
}

impl From<ForeignKeyRow> for RawForeignKeyRow {
    fn from(row: ForeignKeyRow) -> Self {
        RawForeignKeyRow {
            name: row.constraint_name,
            column_name: row.column_name,
            referenced_table: row.ref_table,
            referenced_column: row.ref_column,
        }
    }
}

struct PostgresMetadata<'a> {
    pool: &'a Pool<Postgres>,
}

impl<'a> PostgresMetadata<'a> {
    async fn table_names(&self, schema: &str) -> Result<Vec<String>> {
        let sql = r#"
            SELECT table_name::text AS table_name
            FROM information_schema.tables
            WHERE table_schema = $1 AND table_type = 'BASE TABLE'
            ORDER BY table_name
        "#;

        let rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(schema)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection("listing PostgreSQL tables", e))?;

        Ok(rows.into_iter().map(|r| r.table_name).collect())
    }

    async fn columns(&self, schema: &str, table: &str) -> Result<Vec<IntrospectedColumn>> {
        let sql = r#"
            SELECT
                column_name::text AS column_name,
                data_type::text AS data_type,
                is_nullable::text AS is_nullable
            FROM information_schema.columns
            WHERE table_schema = $1 AND table_name = $2
            ORDER BY ordinal_position
        "#;

        let rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(schema)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading columns of '{}'", table), e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn index_rows(&self, schema: &str, table: &str) -> Result<Vec<RawIndexRow>> {
        let sql = r#"
            SELECT
                i.relname::text AS index_name,
                a.attname::text AS column_name,
                ix.indisunique AS is_unique,
                ix.indisprimary AS is_primary
            FROM pg_index ix
            JOIN pg_class i ON i.oid = ix.indexrelid
            JOIN pg_class t ON t.oid = ix.indrelid
            JOIN pg_namespace n ON n.oid = t.relnamespace
            JOIN pg_attribute a ON a.attrelid = t.oid AND a.attnum = ANY(ix.indkey)
            WHERE t.relname = $1 AND n.nspname = $2
            ORDER BY i.relname, array_position(ix.indkey::int2[], a.attnum)
        "#;

        let rows = sqlx::query_as::<_, IndexRow>(sql)
            .bind(table)
            .bind(schema)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading indexes of '{}'", table), e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn foreign_key_rows(&self, schema: &str, table: &str) -> Result<Vec<RawForeignKeyRow>> {
        let sql = r#"
            SELECT
                tc.constraint_name::text AS constraint_name,
                kcu.column_name::text AS column_name,
                ccu.table_name::text AS ref_table,
                ccu.column_name::text AS ref_column
            FROM information_schema.table_constraints tc
            JOIN information_schema.key_column_usage kcu
                ON tc.constraint_name = kcu.constraint_name
                AND tc.table_schema = kcu.table_schema
            JOIN information_schema.constraint_column_usage ccu
                ON ccu.constraint_name = tc.constraint_name
                AND ccu.table_schema = tc.table_schema
            WHERE tc.constraint_type = 'FOREIGN KEY'
                AND tc.table_schema = $1
                AND tc.table_name = $2
            ORDER BY tc.constraint_name, kcu.ordinal_position
        "#;

        let rows = sqlx::query_as::<_, ForeignKeyRow>(sql)
            .bind(schema)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading foreign keys of '{}'", table), e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

struct MySqlMetadata<'a> {
    pool: &'a Pool<MySql>,
}

#[derive(FromRow)]
struct MySqlIndexRow {
    index_name: String,
    column_name: String,
    is_unique: i64,
}

impl<'a> MySqlMetadata<'a> {
    async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>> {
        let sql = r#"
            SELECT CAST(TABLE_NAME AS CHAR) AS table_name
            FROM information_schema.TABLES
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_TYPE = 'BASE TABLE'
            ORDER BY TABLE_NAME
        "#;

        let rows = sqlx::query_as::<_, TableRow>(sql)
            .bind(schema)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection("listing MySQL tables", e))?;

        Ok(rows.into_iter().map(|r| r.table_name).collect())
    }

    async fn columns(&self, schema: Option<&str>, table: &str) -> Result<Vec<IntrospectedColumn>> {
        let sql = r#"
            SELECT
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(COLUMN_TYPE AS CHAR) AS data_type,
                CAST(IS_NULLABLE AS CHAR) AS is_nullable
            FROM information_schema.COLUMNS
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
            ORDER BY ORDINAL_POSITION
        "#;

        let rows = sqlx::query_as::<_, ColumnRow>(sql)
            .bind(schema)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading columns of '{}'", table), e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn index_rows(&self, schema: Option<&str>, table: &str) -> Result<Vec<RawIndexRow>> {
        let sql = r#"
            SELECT
                CAST(INDEX_NAME AS CHAR) AS index_name,
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(NON_UNIQUE = 0 AS SIGNED) AS is_unique
            FROM information_schema.STATISTICS
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
                AND COLUMN_NAME IS NOT NULL
            ORDER BY INDEX_NAME, SEQ_IN_INDEX
        "#;

        let rows = sqlx::query_as::<_, MySqlIndexRow>(sql)
            .bind(schema)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading indexes of '{}'", table), e))?;

        Ok(rows
            .into_iter()
            .map(|row| RawIndexRow {
                primary: row.index_name == "PRIMARY",
                index_name: row.index_name,
                column_name: row.column_name,
                unique: row.is_unique != 0,
            })
            .collect())
    }

    async fn foreign_key_rows(&self, schema: Option<&str>, table: &str) -> Result<Vec<RawForeignKeyRow>> {
        let sql = r#"
            SELECT
                CAST(CONSTRAINT_NAME AS CHAR) AS constraint_name,
                CAST(COLUMN_NAME AS CHAR) AS column_name,
                CAST(REFERENCED_TABLE_NAME AS CHAR) AS ref_table,
                CAST(REFERENCED_COLUMN_NAME AS CHAR) AS ref_column
            FROM information_schema.KEY_COLUMN_USAGE
            WHERE TABLE_SCHEMA = COALESCE(?, DATABASE()) AND TABLE_NAME = ?
                AND REFERENCED_TABLE_NAME IS NOT NULL
            ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
        "#;

        let rows = sqlx::query_as::<_, ForeignKeyRow>(sql)
            .bind(schema)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading foreign keys of '{}'", table), e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

struct SqliteMetadata<'a> {
    pool: &'a Pool<Sqlite>,
}

#[derive(FromRow)]
struct SqliteColumnRow {
    name: String,
    #[sqlx(rename = "type")]
    data_type: String,
    notnull: i64,
    pk: i64,
}

#[derive(FromRow)]
struct SqliteIndexRow {
    index_name: String,
    column_name: Option<String>,
    is_unique: i64,
    origin: String,
}

#[derive(FromRow)]
struct SqliteForeignKeyRow {
    id: i64,
    column_name: String,
    ref_table: String,
    ref_column: String,
}

impl<'a> SqliteMetadata<'a> {
    async fn table_names(&self) -> Result<Vec<String>> {
        let sql = r#"
            SELECT name AS table_name
            FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name
        "#;

        let rows = sqlx::query_as::<_, TableRow>(sql)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection("listing SQLite tables", e))?;

        Ok(rows.into_iter().map(|r| r.table_name).collect())
    }

    async fn columns(&self, table: &str) -> Result<Vec<IntrospectedColumn>> {
        let sql = r#"SELECT name, type, "notnull", pk FROM pragma_table_info(?) ORDER BY cid"#;

        let rows = sqlx::query_as::<_, SqliteColumnRow>(sql)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading columns of '{}'", table), e))?;

        Ok(rows
            .into_iter()
            .map(|row| IntrospectedColumn {
                name: row.name,
                data_type: row.data_type,
                nullable: row.notnull == 0 && row.pk == 0,
            })
            .collect())
    }

    async fn index_rows(&self, table: &str) -> Result<Vec<RawIndexRow>> {
        let sql = r#"
            SELECT
                il.name AS index_name,
                ii.name AS column_name,
                il."unique" AS is_unique,
                il.origin AS origin
            FROM pragma_index_list(?) AS il, pragma_index_info(il.name) AS ii
            ORDER BY il.name, ii.seqno
        "#;

        let rows = sqlx::query_as::<_, SqliteIndexRow>(sql)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading indexes of '{}'", table), e))?;

        // Expression index columns have no name
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                row.column_name.map(|column_name| RawIndexRow {
                    primary: row.origin == "pk",
                    index_name: row.index_name,
                    column_name,
                    unique: row.is_unique != 0,
                })
            })
            .collect())
    }

    async fn foreign_key_rows(&self, table: &str) -> Result<Vec<RawForeignKeyRow>> {
        // A foreign key declared without a target column refers to the parent's primary key
        let sql = r#"
            SELECT fk.id, fk."from" AS column_name, fk."table" AS ref_table,
                   COALESCE(
                       fk."to",
                       (SELECT pk.name FROM pragma_table_info(fk."table") AS pk WHERE pk.pk = 1),
                       'rowid'
                   ) AS ref_column
            FROM pragma_foreign_key_list(?) AS fk
            ORDER BY fk.id, fk.seq
        "#;

        let rows = sqlx::query_as::<_, SqliteForeignKeyRow>(sql)
            .bind(table)
            .fetch_all(self.pool)
            .await
            .map_err(|e| Error::introspection(format!("reading foreign keys of '{}'", table), e))?;

        // SQLite foreign keys are unnamed
        Ok(rows
            .into_iter()
            .map(|row| RawForeignKeyRow {
                name: format!("fk_{}_{}", table, row.id),
                column_name: row.column_name,
                referenced_table: row.ref_table,
                referenced_column: row.ref_column,
            })
            .collect())
    }
}

const DEFAULT_PG_SCHEMA: &str = "public";

#[async_trait]
impl MetadataSource for DatabaseConnection {
    async fn table_names(&self, schema: Option<&str>) -> Result<Vec<String>> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                PostgresMetadata { pool }
                    .table_names(schema.unwrap_or(DEFAULT_PG_SCHEMA))
                    .await
            }
            DatabaseConnection::MySql(pool) => MySqlMetadata { pool }.table_names(schema).await,
            DatabaseConnection::Sqlite(pool) => SqliteMetadata { pool }.table_names().await,
        }
    }

    async fn columns(&self, schema: Option<&str>, table: &str) -> Result<Vec<IntrospectedColumn>> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                PostgresMetadata { pool }
                    .columns(schema.unwrap_or(DEFAULT_PG_SCHEMA), table)
                    .await
            }
            DatabaseConnection::MySql(pool) => MySqlMetadata { pool }.columns(schema, table).await,
            DatabaseConnection::Sqlite(pool) => SqliteMetadata { pool }.columns(table).await,
        }
    }

    async fn index_rows(&self, schema: Option<&str>, table: &str) -> Result<Vec<RawIndexRow>> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                PostgresMetadata { pool }
                    .index_rows(schema.unwrap_or(DEFAULT_PG_SCHEMA), table)
                    .await
            }
            DatabaseConnection::MySql(pool) => MySqlMetadata { pool }.index_rows(schema, table).await,
            DatabaseConnection::Sqlite(pool) => SqliteMetadata { pool }.index_rows(table).await,
        }
    }

    async fn foreign_key_rows(&self, schema: Option<&str>, table: &str) -> Result<Vec<RawForeignKeyRow>> {
        match self {
            DatabaseConnection::Postgres(pool) => {
                PostgresMetadata { pool }
                    .foreign_key_rows(schema.unwrap_or(DEFAULT_PG_SCHEMA), table)
                    .await
            }
            DatabaseConnection::MySql(pool) => {
                MySqlMetadata { pool }.foreign_key_rows(schema, table).await
            }
            DatabaseConnection::Sqlite(pool) => SqliteMetadata { pool }.foreign_key_rows(table).await,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct CatalogTable {
    name: String,
    columns: Vec<IntrospectedColumn>,
    index_rows: Vec<RawIndexRow>,
    foreign_key_rows: Vec<RawForeignKeyRow>,
}

/// A metadata source held in memory
///
/// An empty catalog stands for an empty database, so every table plans as a
/// CREATE. The optional latency lets callers exercise the introspection
/// deadline.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    tables: IndexMap<String, CatalogTable>,
    latency: Option<Duration>,
}

impl InMemoryCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a table; its indexes and foreign keys become raw rows
    pub fn with_table(mut self, table: IntrospectedTable) -> Self {
        let index_rows = table
            .indexes
            .iter()
            .flat_map(|index| {
                index.columns.iter().map(move |column| RawIndexRow {
                    index_name: index.name.clone(),
                    column_name: column.clone(),
                    unique: index.unique,
                    primary: false,
                })
            })
            .collect();

        let foreign_key_rows = table
            .foreign_keys
            .iter()
            .map(|fk| RawForeignKeyRow {
                name: fk.name.clone(),
                column_name: fk.column_name.clone(),
                referenced_table: fk.referenced_table.clone(),
                referenced_column: fk.referenced_column.clone(),
            })
            .collect();

        self.tables.insert(
            table.name.to_lowercase(),
            CatalogTable {
                name: table.name,
                columns: table.columns,
                index_rows,
                foreign_key_rows,
            },
        );
        self
    }

    /// Append a raw index row to an existing table
    pub fn with_index_row(mut self, table: &str, row: RawIndexRow) -> Self {
        if let Some(entry) = self.tables.get_mut(&table.to_lowercase()) {
            entry.index_rows.push(row);
        }
        self
    }

    /// Delay every table listing by the given duration
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn table(&self, name: &str) -> Result<&CatalogTable> {
        self.tables
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::IntrospectionFailed(format!("Table '{}' not found in catalog", name)))
    }
}

#[async_trait]
impl MetadataSource for InMemoryCatalog {
    async fn table_names(&self, _schema: Option<&str>) -> Result<Vec<String>> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        Ok(self.tables.values().map(|t| t.name.clone()).collect())
    }

    async fn columns(&self, _schema: Option<&str>, table: &str) -> Result<Vec<IntrospectedColumn>> {
        Ok(self.table(table)?.columns.clone())
    }

    async fn index_rows(&self, _schema: Option<&str>, table: &str) -> Result<Vec<RawIndexRow>> {
        Ok(self.table(table)?.index_rows.clone())
    }

    async fn foreign_key_rows(&self, _schema: Option<&str>, table: &str) -> Result<Vec<RawForeignKeyRow>> {
        Ok(self.table(table)?.foreign_key_rows.clone())
    }
}
