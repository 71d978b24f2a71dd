//! PostgreSQL dialect

use crate::dialect::{CommentStyle, DialectGenerator, DialectProfile, IdentityPlacement, TypeMapping, POSTGRESQL};
use crate::error::Result;
use crate::schema::types::SemanticKind;

/// PostgreSQL DDL generator
///
/// PostgreSQL stores `TEXT` and `VARCHAR(n)` the same way, so string fields
/// always classify as TEXT for this dialect.
#[derive(Debug, Clone)]
pub struct PostgresDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl PostgresDialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            POSTGRESQL,
            [
                (SemanticKind::Integer, "INTEGER"),
                (SemanticKind::Long, "BIGINT"),
                (SemanticKind::Boolean, "BOOLEAN"),
                (SemanticKind::Char, "CHARACTER"),
                (SemanticKind::Date, "DATE"),
                (SemanticKind::Time, "TIME"),
                (SemanticKind::Datetime, "TIMESTAMP"),
                (SemanticKind::Decimal, "NUMERIC"),
                (SemanticKind::Double, "DOUBLE PRECISION"),
                (SemanticKind::Varchar, "VARCHAR"),
                (SemanticKind::Text, "TEXT"),
            ],
        )?;

        Ok(Self {
            profile: DialectProfile {
                id: POSTGRESQL.to_string(),
                quote: '"',
                auto_increment: "GENERATED BY DEFAULT AS IDENTITY".to_string(),
                identity_placement: IdentityPlacement::BeforeNotNull,
                comments: CommentStyle::Separate,
                max_identifier_length: 63,
                bounded_text: false,
            },
            mapping,
        })
    }
}

impl DialectGenerator for PostgresDialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn type_mapping(&self) -> &TypeMapping {
        &self.mapping
    }

    fn default_string_type(&self) -> &str {
        "TEXT"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ColumnDescriptor, TableDescriptor};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table_emits_comment_statements() {
        let dialect = PostgresDialect::new().unwrap();
        let table = TableDescriptor::new("biz_order")
            .comment("Orders")
            .column(
                ColumnDescriptor::new("id", "Long")
                    .kind(SemanticKind::Long)
                    .primary_key()
                    .auto_increment(),
            )
            .column(
                ColumnDescriptor::new("remark", "String")
                    .kind(SemanticKind::Text)
                    .comment("Buyer's note"),
            );

        let sql = dialect.generate_create_table_ddl(&table).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS \"biz_order\" (\n  \
             \"id\" BIGINT GENERATED BY DEFAULT AS IDENTITY NOT NULL,\n  \
             \"remark\" TEXT,\n  \
             PRIMARY KEY (\"id\")\n\
             );\n\
             COMMENT ON TABLE \"biz_order\" IS 'Orders';\n\
             COMMENT ON COLUMN \"biz_order\".\"remark\" IS 'Buyer''s note';"
        );
    }

    #[test]
    fn test_long_identifier_is_truncated() {
        let dialect = PostgresDialect::new().unwrap();
        let quoted = dialect.quote(&"x".repeat(80));
        assert_eq!(quoted.len(), 63 + 2);
    }
}
