//! SQL Server dialect
//!
//! Bracket quoting, `IDENTITY(1,1)`, `BIT` booleans and Unicode string types.
//! Comments are stored as `MS_Description` extended properties.

use crate::dialect::{CommentStyle, DialectGenerator, DialectProfile, IdentityPlacement, TypeMapping, SQLSERVER};
use crate::error::Result;
use crate::schema::types::SemanticKind;
use crate::utils::naming::escape_literal;

/// SQL Server DDL generator
#[derive(Debug, Clone)]
pub struct SqlServerDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl SqlServerDialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            SQLSERVER,
            [
                (SemanticKind::Integer, "INT"),
                (SemanticKind::Long, "BIGINT"),
                (SemanticKind::Boolean, "BIT"),
                (SemanticKind::Char, "NCHAR"),
                (SemanticKind::Date, "DATE"),
                (SemanticKind::Time, "TIME"),
                (SemanticKind::Datetime, "DATETIME2"),
                (SemanticKind::Decimal, "DECIMAL"),
                (SemanticKind::Double, "FLOAT"),
                (SemanticKind::Varchar, "NVARCHAR"),
                (SemanticKind::Text, "NVARCHAR(MAX)"),
            ],
        )?;

        Ok(Self {
            profile: DialectProfile {
                id: SQLSERVER.to_string(),
                quote: '[',
                auto_increment: "IDENTITY(1,1)".to_string(),
                identity_placement: IdentityPlacement::BeforeNotNull,
                comments: CommentStyle::Separate,
                max_identifier_length: 128,
                bounded_text: true,
            },
            mapping,
        })
    }

    fn describe(&self, comment: &str, table: &str, column: Option<&str>) -> String {
        let mut sql = format!(
            "EXEC sp_addextendedproperty @name = N'MS_Description', @value = N'{}', \
             @level0type = N'SCHEMA', @level0name = N'dbo', \
             @level1type = N'TABLE', @level1name = N'{}'",
            escape_literal(comment),
            escape_literal(table)
        );
        if let Some(column) = column {
            sql.push_str(&format!(
                ", @level2type = N'COLUMN', @level2name = N'{}'",
                escape_literal(column)
            ));
        }
        sql.push(';');
        sql
    }
}

impl DialectGenerator for SqlServerDialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn type_mapping(&self) -> &TypeMapping {
        &self.mapping
    }

    fn default_string_type(&self) -> &str {
        "NVARCHAR(255)"
    }

    fn create_table_prefix(&self) -> &str {
        "CREATE TABLE"
    }

    fn add_column_clause(&self, definition: &str) -> String {
        format!("ADD {}", definition)
    }

    fn quote_chars(&self) -> (char, char) {
        ('[', ']')
    }

    fn comment_on_table(&self, table: &str, comment: &str) -> String {
        self.describe(comment, table, None)
    }

    fn comment_on_column(&self, table: &str, column: &str, comment: &str) -> String {
        self.describe(comment, table, Some(column))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ColumnDescriptor, TableDescriptor};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table_with_identity_and_description() {
        let dialect = SqlServerDialect::new().unwrap();
        let table = TableDescriptor::new("biz_order")
            .comment("Orders")
            .column(
                ColumnDescriptor::new("id", "Long")
                    .kind(SemanticKind::Long)
                    .primary_key()
                    .auto_increment(),
            )
            .column(ColumnDescriptor::new("is_paid", "Boolean").kind(SemanticKind::Boolean))
            .column(
                ColumnDescriptor::new("remark", "String")
                    .kind(SemanticKind::Text)
                    .comment("Buyer's note"),
            );

        assert_eq!(
            dialect.generate_create_table_ddl(&table).unwrap(),
            "CREATE TABLE [biz_order] (\n  \
             [id] BIGINT IDENTITY(1,1) NOT NULL,\n  \
             [is_paid] BIT,\n  \
             [remark] NVARCHAR(MAX),\n  \
             PRIMARY KEY ([id])\n\
             );\n\
             EXEC sp_addextendedproperty @name = N'MS_Description', @value = N'Orders', \
             @level0type = N'SCHEMA', @level0name = N'dbo', @level1type = N'TABLE', @level1name = N'biz_order';\n\
             EXEC sp_addextendedproperty @name = N'MS_Description', @value = N'Buyer''s note', \
             @level0type = N'SCHEMA', @level0name = N'dbo', @level1type = N'TABLE', @level1name = N'biz_order', \
             @level2type = N'COLUMN', @level2name = N'remark';"
        );
    }

    #[test]
    fn test_add_column_and_bracket_escaping() {
        let dialect = SqlServerDialect::new().unwrap();
        let column = ColumnDescriptor::new("status", "String")
            .kind(SemanticKind::Varchar)
            .length(32);

        assert_eq!(
            dialect.generate_add_col_ddl("biz_order", &column).unwrap(),
            "ALTER TABLE [biz_order] ADD [status] NVARCHAR(32);"
        );
        assert_eq!(dialect.quote("odd]name"), "[odd]]name]");
    }
}
