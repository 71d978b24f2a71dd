//! Type definitions for entity descriptors and introspected schema objects

use indexmap::IndexMap;
use inflector::Inflector;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{Error, Result};

/// Dialect-independent meaning of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SemanticKind {
    Integer,
    Long,
    Boolean,
    Char,
    Date,
    Time,
    Datetime,
    Decimal,
    Double,
    Varchar,
    Text,
}

impl SemanticKind {
    /// Every kind the classifier can produce
    pub const ALL: [SemanticKind; 11] = [
        SemanticKind::Integer,
        SemanticKind::Long,
        SemanticKind::Boolean,
        SemanticKind::Char,
        SemanticKind::Date,
        SemanticKind::Time,
        SemanticKind::Datetime,
        SemanticKind::Decimal,
        SemanticKind::Double,
        SemanticKind::Varchar,
        SemanticKind::Text,
    ];
}

impl fmt::Display for SemanticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SemanticKind::Integer => "INTEGER",
            SemanticKind::Long => "LONG",
            SemanticKind::Boolean => "BOOLEAN",
            SemanticKind::Char => "CHAR",
            SemanticKind::Date => "DATE",
            SemanticKind::Time => "TIME",
            SemanticKind::Datetime => "DATETIME",
            SemanticKind::Decimal => "DECIMAL",
            SemanticKind::Double => "DOUBLE",
            SemanticKind::Varchar => "VARCHAR",
            SemanticKind::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Load table descriptors from a JSON or YAML file holding a list of tables
pub fn load_descriptors(path: impl AsRef<Path>) -> Result<Vec<TableDescriptor>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;

    let is_yaml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

    let tables: Vec<TableDescriptor> = if is_yaml {
        serde_yaml::from_str(&content)?
    } else {
        serde_json::from_str(&content)?
    };

    Ok(tables)
}

/// A desired table, built from entity metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableDescriptor {
    pub english_name: String,
    /// Human-readable name, rendered as the table comment
    #[serde(default)]
    pub chinese_name: Option<String>,
    #[serde(default)]
    pub database_name: Option<String>,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub indexes: Vec<IndexDescriptor>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDescriptor {
    /// Create an empty table descriptor
    pub fn new(english_name: &str) -> Self {
        Self {
            english_name: english_name.to_string(),
            chinese_name: None,
            database_name: None,
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Set the table comment
    pub fn comment(mut self, comment: &str) -> Self {
        self.chinese_name = Some(comment.to_string());
        self
    }

    /// Append a column
    pub fn column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    /// Append an index
    pub fn index(mut self, index: IndexDescriptor) -> Self {
        self.indexes.push(index);
        self
    }

    /// Append a foreign key
    pub fn foreign_key(mut self, fk: ForeignKeyDescriptor) -> Self {
        self.foreign_keys.push(fk);
        self
    }

    /// The rendered table comment, if any
    pub fn table_comment(&self) -> Option<&str> {
        self.chinese_name.as_deref().filter(|c| !c.trim().is_empty())
    }

    /// Find a column by name, ignoring case
    pub fn find_column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.columns
            .iter()
            .find(|c| c.column_name.eq_ignore_ascii_case(name))
    }

    /// The primary key column, if one is declared
    pub fn primary_key(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.is_primary_key)
    }

    /// Check the structural invariants of the descriptor
    pub fn validate(&self) -> Result<()> {
        if self.english_name.trim().is_empty() {
            return Err(Error::ConfigError(
                "Table descriptor has an empty english name".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.column_name.trim().is_empty() {
                return Err(Error::ConfigError(format!(
                    "Table '{}' has a column with an empty name",
                    self.english_name
                )));
            }
            if !seen.insert(column.column_name.to_lowercase()) {
                return Err(Error::ConfigError(format!(
                    "Table '{}' declares column '{}' more than once",
                    self.english_name, column.column_name
                )));
            }
        }

        let pk_count = self.columns.iter().filter(|c| c.is_primary_key).count();
        if pk_count > 1 {
            return Err(Error::ConfigError(format!(
                "Table '{}' declares {} primary key columns; composite keys are not supported",
                self.english_name, pk_count
            )));
        }

        Ok(())
    }
}

/// A desired column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDescriptor {
    #[serde(default)]
    pub source_field_name: String,
    pub column_name: String,
    #[serde(default)]
    pub source_type_name: String,
    /// Filled by the classifier when the source did not decide it
    #[serde(default)]
    pub semantic_kind: Option<SemanticKind>,
    /// Character length, or precision for decimals
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_auto_increment: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

fn default_nullable() -> bool {
    true
}

impl ColumnDescriptor {
    /// Create a nullable column with the given name and source type
    pub fn new(column_name: &str, source_type_name: &str) -> Self {
        Self {
            source_field_name: column_name.to_camel_case(),
            column_name: column_name.to_string(),
            source_type_name: source_type_name.to_string(),
            semantic_kind: None,
            length: None,
            scale: None,
            comment: None,
            is_primary_key: false,
            is_auto_increment: false,
            nullable: true,
        }
    }

    /// Mark as the primary key (implies NOT NULL)
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.nullable = false;
        self
    }

    /// Mark as auto-increment
    pub fn auto_increment(mut self) -> Self {
        self.is_auto_increment = true;
        self
    }

    /// Set whether the column is nullable
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the declared length
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the decimal scale
    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    /// Set the column comment
    pub fn comment(mut self, comment: &str) -> Self {
        self.comment = Some(comment.to_string());
        self
    }

    /// Force a semantic kind, bypassing classification
    pub fn kind(mut self, kind: SemanticKind) -> Self {
        self.semantic_kind = Some(kind);
        self
    }

    /// The rendered column comment, if any
    pub fn column_comment(&self) -> Option<&str> {
        self.comment.as_deref().filter(|c| !c.trim().is_empty())
    }
}

/// A secondary index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexDescriptor {
    /// Empty means "derive from the naming pattern"
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
    #[serde(default)]
    pub unique: bool,
}

impl IndexDescriptor {
    /// Create an index over the given columns
    pub fn new(name: &str, columns: &[&str], unique: bool) -> Self {
        Self {
            name: name.to_string(),
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique,
        }
    }

    /// Identity used for diffing: ordered column list and uniqueness
    pub fn identity(&self) -> (Vec<String>, bool) {
        (
            self.columns.iter().map(|c| c.to_lowercase()).collect(),
            self.unique,
        )
    }
}

/// A single-column foreign key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyDescriptor {
    /// Empty means "derive from the naming pattern"
    #[serde(default)]
    pub name: String,
    pub column_name: String,
    pub referenced_table: String,
    pub referenced_column: String,
}

impl ForeignKeyDescriptor {
    /// Create a foreign key from `column_name` to `referenced_table.referenced_column`
    pub fn new(name: &str, column_name: &str, referenced_table: &str, referenced_column: &str) -> Self {
        Self {
            name: name.to_string(),
            column_name: column_name.to_string(),
            referenced_table: referenced_table.to_string(),
            referenced_column: referenced_column.to_string(),
        }
    }

    /// Identity used for diffing
    pub fn identity(&self) -> (String, String, String) {
        (
            self.column_name.to_lowercase(),
            self.referenced_table.to_lowercase(),
            self.referenced_column.to_lowercase(),
        )
    }
}

/// A column as it exists in the live database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectedColumn {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
}

/// A table as it exists in the live database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntrospectedTable {
    pub name: String,
    pub columns: Vec<IntrospectedColumn>,
    /// Non-primary-key indexes only
    pub indexes: Vec<IndexDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl IntrospectedTable {
    /// Create a table with no columns
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// Append a column
    pub fn with_column(mut self, name: &str, data_type: &str, nullable: bool) -> Self {
        self.columns.push(IntrospectedColumn {
            name: name.to_string(),
            data_type: data_type.to_string(),
            nullable,
        });
        self
    }

    /// Check for a column, ignoring case
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name.eq_ignore_ascii_case(name))
    }
}

/// One read of the live schema, shared by every table in a run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    pub schema_name: Option<String>,
    /// Keyed by lower-cased table name
    tables: IndexMap<String, IntrospectedTable>,
}

impl SchemaSnapshot {
    /// Create an empty snapshot
    pub fn new(schema_name: Option<String>) -> Self {
        Self {
            schema_name,
            tables: IndexMap::new(),
        }
    }

    /// Add a table to the snapshot
    pub fn add_table(&mut self, table: IntrospectedTable) {
        self.tables.insert(table.name.to_lowercase(), table);
    }

    /// Look up a table, ignoring case
    pub fn table(&self, name: &str) -> Option<&IntrospectedTable> {
        self.tables.get(&name.to_lowercase())
    }

    /// Number of tables loaded
    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Iterate tables in load order
    pub fn tables(&self) -> impl Iterator<Item = &IntrospectedTable> {
        self.tables.values()
    }
}
