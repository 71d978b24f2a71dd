//! SQLite dialect
//!
//! SQLite has five storage classes, so every kind maps onto INTEGER, REAL or
//! TEXT with no size. An auto-increment key must be declared inline as
//! `INTEGER PRIMARY KEY AUTOINCREMENT`. Foreign keys can only be declared in
//! CREATE TABLE, and comments are not supported.

use crate::dialect::{
    render_plan_with_inline_foreign_keys, CommentStyle, DialectGenerator, DialectProfile,
    IdentityPlacement, TypeMapping, SQLITE,
};
use crate::error::{Error, Result};
use crate::schema::diff::DdlOperation;
use crate::schema::types::{ColumnDescriptor, ForeignKeyDescriptor, SemanticKind, TableDescriptor};

/// SQLite DDL generator
#[derive(Debug, Clone)]
pub struct SqliteDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl SqliteDialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            SQLITE,
            [
                (SemanticKind::Integer, "INTEGER"),
                (SemanticKind::Long, "INTEGER"),
                (SemanticKind::Boolean, "INTEGER"),
                (SemanticKind::Char, "TEXT"),
                (SemanticKind::Date, "TEXT"),
                (SemanticKind::Time, "TEXT"),
                (SemanticKind::Datetime, "TEXT"),
                (SemanticKind::Decimal, "TEXT"),
                (SemanticKind::Double, "REAL"),
                (SemanticKind::Varchar, "TEXT"),
                (SemanticKind::Text, "TEXT"),
            ],
        )?;

        Ok(Self {
            profile: DialectProfile {
                id: SQLITE.to_string(),
                quote: '"',
                auto_increment: String::new(),
                identity_placement: IdentityPlacement::BeforeNotNull,
                comments: CommentStyle::Omitted,
                max_identifier_length: usize::MAX,
                bounded_text: false,
            },
            mapping,
        })
    }

    fn has_inline_key(table: &TableDescriptor) -> bool {
        table.primary_key().map_or(false, |pk| pk.is_auto_increment)
    }
}

impl DialectGenerator for SqliteDialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn type_mapping(&self) -> &TypeMapping {
        &self.mapping
    }

    fn default_string_type(&self) -> &str {
        "TEXT"
    }

    fn column_type(&self, column: &ColumnDescriptor) -> Result<String> {
        let kind = match column.semantic_kind {
            Some(kind) => kind,
            None => return Ok(self.default_string_type().to_string()),
        };

        self.mapping
            .get(kind)
            .map(str::to_string)
            .ok_or_else(|| Error::UnmappedSemanticKind {
                dialect: SQLITE.to_string(),
                kinds: vec![kind],
            })
    }

    fn column_definition(&self, column: &ColumnDescriptor) -> Result<String> {
        let mut sql = format!("{} {}", self.quote(&column.column_name), self.column_type(column)?);

        if column.is_primary_key && column.is_auto_increment {
            sql.push_str(" PRIMARY KEY AUTOINCREMENT");
        }
        if !column.nullable || column.is_primary_key {
            sql.push_str(" NOT NULL");
        }

        Ok(sql)
    }

    fn primary_key_clause(&self, table: &TableDescriptor) -> Option<String> {
        if Self::has_inline_key(table) {
            return None;
        }
        table
            .primary_key()
            .map(|pk| format!("PRIMARY KEY ({})", self.quote(&pk.column_name)))
    }

    fn table_constraints(&self, table: &TableDescriptor) -> Vec<String> {
        table
            .foreign_keys
            .iter()
            .map(|fk| {
                format!(
                    "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
                    self.quote(&fk.name),
                    self.quote(&fk.column_name),
                    self.quote(&fk.referenced_table),
                    self.quote(&fk.referenced_column)
                )
            })
            .collect()
    }

    fn generate_add_foreign_key_ddl(&self, table: &str, fk: &ForeignKeyDescriptor) -> Result<String> {
        Err(Error::ConfigError(format!(
            "SQLite cannot add foreign key '{}' to existing table '{}'",
            fk.name, table
        )))
    }

    fn render_plan(&self, operations: &[DdlOperation]) -> Result<Vec<String>> {
        render_plan_with_inline_foreign_keys(self, operations)
    }
}
