//! SQL dialects
//!
//! Every dialect implements [`DialectGenerator`]. The trait's default methods
//! render DDL from a [`DialectProfile`] (quoting, auto-increment syntax,
//! comment placement, identifier limits) and a [`TypeMapping`] from
//! [`SemanticKind`] to the dialect's SQL type. Dialects override the hooks
//! where their grammar differs.
//!
//! A [`TypeMapping`] must cover every semantic kind. Built-in dialects check
//! this when constructed and [`DialectRegistry::register`] checks it again,
//! so an incomplete mapping never reaches rendering.

pub mod dm;
pub mod h2;
pub mod kingbase;
pub mod mysql;
pub mod oracle;
pub mod postgres;
pub mod registry;
pub mod sqlite;
pub mod sqlserver;

use std::collections::{BTreeMap, HashSet};

use crate::error::{Error, Result};
use crate::schema::diff::DdlOperation;
use crate::schema::types::{ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, SemanticKind, TableDescriptor};
use crate::utils::naming::{escape_literal, truncate_identifier};

pub use dm::DmDialect;
pub use h2::H2Dialect;
pub use kingbase::KingbaseDialect;
pub use mysql::MySqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
pub use registry::DialectRegistry;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

pub const MYSQL: &str = "mysql";
pub const ORACLE: &str = "oracle";
pub const POSTGRESQL: &str = "postgresql";
pub const DM: &str = "dm";
pub const H2: &str = "h2";
pub const SQLITE: &str = "sqlite";
pub const SQLSERVER: &str = "sqlserver";
pub const KINGBASE: &str = "kingbase";

/// Default precision and scale for DECIMAL columns without a declared size
pub const DEFAULT_DECIMAL: (u32, u32) = (19, 2);

/// Where column and table comments go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommentStyle {
    /// `COMMENT '...'` inside the column definition
    Inline,
    /// `COMMENT ON ...` statements after the DDL
    Separate,
    /// Comments are not rendered
    Omitted,
}

/// Whether the auto-increment clause precedes or follows `NOT NULL`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPlacement {
    BeforeNotNull,
    AfterNotNull,
}

/// The grammar facts a dialect's renderer depends on
#[derive(Debug, Clone)]
pub struct DialectProfile {
    pub id: String,
    pub quote: char,
    pub auto_increment: String,
    pub identity_placement: IdentityPlacement,
    pub comments: CommentStyle,
    pub max_identifier_length: usize,
    /// False when VARCHAR(n) has no advantage over TEXT
    pub bounded_text: bool,
}

/// Semantic kind to dialect SQL type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMapping {
    entries: BTreeMap<SemanticKind, String>,
}

impl TypeMapping {
    /// Build a mapping without checking totality
    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (SemanticKind, S)>,
        S: Into<String>,
    {
        Self {
            entries: entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
        }
    }

    /// Build a mapping and fail unless it covers every semantic kind
    pub fn total<I, S>(dialect: &str, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (SemanticKind, S)>,
        S: Into<String>,
    {
        let mapping = Self::from_entries(entries);
        mapping.validate(dialect)?;
        Ok(mapping)
    }

    /// SQL type for a kind
    pub fn get(&self, kind: SemanticKind) -> Option<&str> {
        self.entries.get(&kind).map(String::as_str)
    }

    /// Kinds with no entry
    pub fn missing_kinds(&self) -> Vec<SemanticKind> {
        SemanticKind::ALL
            .iter()
            .copied()
            .filter(|kind| !self.entries.contains_key(kind))
            .collect()
    }

    /// Fail with the list of uncovered kinds
    pub fn validate(&self, dialect: &str) -> Result<()> {
        let kinds = self.missing_kinds();
        if kinds.is_empty() {
            Ok(())
        } else {
            Err(Error::UnmappedSemanticKind {
                dialect: dialect.to_string(),
                kinds,
            })
        }
    }
}

/// Renders semantic column specs into one dialect's DDL
pub trait DialectGenerator: Send + Sync {
    /// Grammar facts for this dialect
    fn profile(&self) -> &DialectProfile;

    /// Semantic kind to SQL type table
    fn type_mapping(&self) -> &TypeMapping;

    /// Type used for a column whose kind could not be determined
    fn default_string_type(&self) -> &str;

    /// Dialect identifier
    fn id(&self) -> &str {
        &self.profile().id
    }

    /// Keyword(s) that open a CREATE TABLE statement
    fn create_table_prefix(&self) -> &str {
        "CREATE TABLE IF NOT EXISTS"
    }

    /// Text after the closing parenthesis of CREATE TABLE
    fn table_suffix(&self, _table: &TableDescriptor) -> String {
        String::new()
    }

    /// The ADD clause of ALTER TABLE for one column definition
    fn add_column_clause(&self, definition: &str) -> String {
        format!("ADD COLUMN {}", definition)
    }

    /// Opening and closing identifier quotes
    fn quote_chars(&self) -> (char, char) {
        let q = self.profile().quote;
        (q, q)
    }

    /// Case applied to identifiers before quoting
    fn fold_case(&self, name: &str) -> String {
        name.to_string()
    }

    /// Quote an identifier, truncating it to the dialect's limit
    fn quote(&self, name: &str) -> String {
        let profile = self.profile();
        let name = if name.len() > profile.max_identifier_length {
            let truncated = truncate_identifier(name, profile.max_identifier_length);
            tracing::warn!(
                dialect = %profile.id,
                original = name,
                truncated = %truncated,
                "Identifier exceeds dialect limit"
            );
            truncated
        } else {
            name.to_string()
        };

        let (open, close) = self.quote_chars();
        let escaped = self.fold_case(&name).replace(close, &format!("{}{}", close, close));
        format!("{}{}{}", open, escaped, close)
    }

    /// The table-level primary key clause, if the key is not declared inline
    fn primary_key_clause(&self, table: &TableDescriptor) -> Option<String> {
        table
            .primary_key()
            .map(|pk| format!("PRIMARY KEY ({})", self.quote(&pk.column_name)))
    }

    /// Extra table constraints declared inside CREATE TABLE
    fn table_constraints(&self, _table: &TableDescriptor) -> Vec<String> {
        Vec::new()
    }

    /// Statement attaching a comment to a table
    fn comment_on_table(&self, table: &str, comment: &str) -> String {
        format!("COMMENT ON TABLE {} IS '{}';", self.quote(table), escape_literal(comment))
    }

    /// Statement attaching a comment to a column
    fn comment_on_column(&self, table: &str, column: &str, comment: &str) -> String {
        format!(
            "COMMENT ON COLUMN {}.{} IS '{}';",
            self.quote(table),
            self.quote(column),
            escape_literal(comment)
        )
    }

    /// The SQL type of a column, sized where the type takes a size
    fn column_type(&self, column: &ColumnDescriptor) -> Result<String> {
        let kind = match column.semantic_kind {
            Some(kind) => kind,
            None => return Ok(self.default_string_type().to_string()),
        };

        let base = self.type_mapping().get(kind).ok_or_else(|| Error::UnmappedSemanticKind {
            dialect: self.id().to_string(),
            kinds: vec![kind],
        })?;

        if base.contains('(') {
            return Ok(base.to_string());
        }

        let sized = match kind {
            SemanticKind::Varchar => format!("{}({})", base, column.length.unwrap_or(255)),
            SemanticKind::Char => format!("{}({})", base, column.length.unwrap_or(1)),
            SemanticKind::Decimal => {
                let precision = column.length.unwrap_or(DEFAULT_DECIMAL.0);
                let scale = column.scale.unwrap_or(DEFAULT_DECIMAL.1);
                format!("{}({}, {})", base, precision, scale)
            }
            _ => base.to_string(),
        };

        Ok(sized)
    }

    /// One column definition as used in CREATE TABLE and ADD COLUMN
    fn column_definition(&self, column: &ColumnDescriptor) -> Result<String> {
        let profile = self.profile();
        let mut sql = format!("{} {}", self.quote(&column.column_name), self.column_type(column)?);

        let identity = column.is_auto_increment && !profile.auto_increment.is_empty();
        if identity && profile.identity_placement == IdentityPlacement::BeforeNotNull {
            sql.push(' ');
            sql.push_str(&profile.auto_increment);
        }

        if !column.nullable || column.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        if identity && profile.identity_placement == IdentityPlacement::AfterNotNull {
            sql.push(' ');
            sql.push_str(&profile.auto_increment);
        }

        if profile.comments == CommentStyle::Inline {
            if let Some(comment) = column.column_comment() {
                sql.push_str(&format!(" COMMENT '{}'", escape_literal(comment)));
            }
        }

        Ok(sql)
    }

    /// `COMMENT ON COLUMN` statement for dialects with separate comments
    fn column_comment_statement(&self, table: &str, column: &ColumnDescriptor) -> Option<String> {
        if self.profile().comments != CommentStyle::Separate {
            return None;
        }

        column
            .column_comment()
            .map(|comment| self.comment_on_column(table, &column.column_name, comment))
    }

    /// Full CREATE TABLE, with the comment statements the dialect needs
    fn generate_create_table_ddl(&self, table: &TableDescriptor) -> Result<String> {
        let table_name = &table.english_name;
        let mut definitions = table
            .columns
            .iter()
            .map(|column| self.column_definition(column).map(|def| format!("  {}", def)))
            .collect::<Result<Vec<_>>>()?;

        definitions.extend(self.primary_key_clause(table).map(|clause| format!("  {}", clause)));
        definitions.extend(
            self.table_constraints(table)
                .into_iter()
                .map(|constraint| format!("  {}", constraint)),
        );

        let mut sql = format!(
            "{} {} (\n{}\n){};",
            self.create_table_prefix(),
            self.quote(table_name),
            definitions.join(",\n"),
            self.table_suffix(table)
        );

        if self.profile().comments == CommentStyle::Separate {
            if let Some(comment) = table.table_comment() {
                sql.push('\n');
                sql.push_str(&self.comment_on_table(table_name, comment));
            }
            for column in &table.columns {
                if let Some(statement) = self.column_comment_statement(table_name, column) {
                    sql.push('\n');
                    sql.push_str(&statement);
                }
            }
        }

        Ok(sql)
    }

    /// ALTER TABLE ... ADD for one column
    fn generate_add_col_ddl(&self, table: &str, column: &ColumnDescriptor) -> Result<String> {
        let definition = self.column_definition(column)?;
        let mut sql = format!(
            "ALTER TABLE {} {};",
            self.quote(table),
            self.add_column_clause(&definition)
        );

        if let Some(statement) = self.column_comment_statement(table, column) {
            sql.push('\n');
            sql.push_str(&statement);
        }

        Ok(sql)
    }

    /// ALTER TABLE ... DROP COLUMN
    fn generate_drop_col_ddl(&self, table: &str, column: &str) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} DROP COLUMN {};",
            self.quote(table),
            self.quote(column)
        ))
    }

    /// CREATE [UNIQUE] INDEX
    fn generate_add_index_ddl(&self, table: &str, index: &IndexDescriptor) -> Result<String> {
        if index.columns.is_empty() {
            return Err(Error::ConfigError(format!(
                "Index '{}' on '{}' has no columns",
                index.name, table
            )));
        }

        let columns: Vec<String> = index.columns.iter().map(|c| self.quote(c)).collect();
        Ok(format!(
            "CREATE {}INDEX {} ON {} ({});",
            if index.unique { "UNIQUE " } else { "" },
            self.quote(&index.name),
            self.quote(table),
            columns.join(", ")
        ))
    }

    /// ALTER TABLE ... ADD CONSTRAINT ... FOREIGN KEY
    fn generate_add_foreign_key_ddl(&self, table: &str, fk: &ForeignKeyDescriptor) -> Result<String> {
        Ok(format!(
            "ALTER TABLE {} ADD CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({});",
            self.quote(table),
            self.quote(&fk.name),
            self.quote(&fk.column_name),
            self.quote(&fk.referenced_table),
            self.quote(&fk.referenced_column)
        ))
    }

    /// Render one planned operation
    fn render(&self, operation: &DdlOperation) -> Result<String> {
        match operation {
            DdlOperation::CreateTable(table) => self.generate_create_table_ddl(table),
            DdlOperation::AddColumn { table, column } => self.generate_add_col_ddl(table, column),
            DdlOperation::DropColumn { table, column } => self.generate_drop_col_ddl(table, column),
            DdlOperation::AddIndex { table, index } => self.generate_add_index_ddl(table, index),
            DdlOperation::AddForeignKey { table, foreign_key } => {
                self.generate_add_foreign_key_ddl(table, foreign_key)
            }
        }
    }

    /// Render one table's planned operations in order
    fn render_plan(&self, operations: &[DdlOperation]) -> Result<Vec<String>> {
        operations.iter().map(|operation| self.render(operation)).collect()
    }
}

/// Render a plan for a dialect that declares foreign keys inside CREATE TABLE
///
/// Foreign keys of a table created in the same plan are already part of its
/// CREATE statement. Foreign keys on existing tables cannot be added and are
/// skipped with a warning.
pub fn render_plan_with_inline_foreign_keys<G>(generator: &G, operations: &[DdlOperation]) -> Result<Vec<String>>
where
    G: DialectGenerator + ?Sized,
{
    let created: HashSet<String> = operations
        .iter()
        .filter_map(|operation| match operation {
            DdlOperation::CreateTable(table) => Some(table.english_name.to_lowercase()),
            _ => None,
        })
        .collect();

    let mut statements = Vec::new();
    for operation in operations {
        if let DdlOperation::AddForeignKey { table, foreign_key } = operation {
            if !created.contains(&table.to_lowercase()) {
                tracing::warn!(
                    dialect = generator.id(),
                    table = %table,
                    foreign_key = %foreign_key.name,
                    "Foreign keys can only be declared when the table is created; skipping"
                );
            }
            continue;
        }
        statements.push(generator.render(operation)?);
    }
    Ok(statements)
}
