//! Oracle dialect

use crate::dialect::{CommentStyle, DialectGenerator, DialectProfile, IdentityPlacement, TypeMapping, ORACLE};
use crate::error::Result;
use crate::schema::types::SemanticKind;

/// Oracle DDL generator (12c identity columns)
#[derive(Debug, Clone)]
pub struct OracleDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl OracleDialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            ORACLE,
            [
                (SemanticKind::Integer, "NUMBER(10)"),
                (SemanticKind::Long, "NUMBER(19)"),
                (SemanticKind::Boolean, "NUMBER(1)"),
                (SemanticKind::Char, "CHAR"),
                (SemanticKind::Date, "DATE"),
                (SemanticKind::Time, "TIMESTAMP"),
                (SemanticKind::Datetime, "TIMESTAMP"),
                (SemanticKind::Decimal, "NUMBER"),
                (SemanticKind::Double, "BINARY_DOUBLE"),
                (SemanticKind::Varchar, "VARCHAR2"),
                (SemanticKind::Text, "CLOB"),
            ],
        )?;

        Ok(Self {
            profile: DialectProfile {
                id: ORACLE.to_string(),
                quote: '"',
                auto_increment: "GENERATED BY DEFAULT AS IDENTITY".to_string(),
                identity_placement: IdentityPlacement::BeforeNotNull,
                comments: CommentStyle::Separate,
                max_identifier_length: 30,
                bounded_text: true,
            },
            mapping,
        })
    }
}

impl DialectGenerator for OracleDialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn type_mapping(&self) -> &TypeMapping {
        &self.mapping
    }

    /// Unquoted names are stored upper-case; quoting must match them
    fn fold_case(&self, name: &str) -> String {
        name.to_uppercase()
    }

    fn default_string_type(&self) -> &str {
        "VARCHAR2(255)"
    }

    fn create_table_prefix(&self) -> &str {
        "CREATE TABLE"
    }

    fn add_column_clause(&self, definition: &str) -> String {
        format!("ADD ({})", definition)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::ColumnDescriptor;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_add_column_uses_parenthesised_clause() {
        let dialect = OracleDialect::new().unwrap();
        let column = ColumnDescriptor::new("content", "String")
            .kind(SemanticKind::Text)
            .comment("Body");

        let sql = dialect.generate_add_col_ddl("biz_article", &column).unwrap();
        assert_eq!(
            sql,
            "ALTER TABLE \"BIZ_ARTICLE\" ADD (\"CONTENT\" CLOB);\n\
             COMMENT ON COLUMN \"BIZ_ARTICLE\".\"CONTENT\" IS 'Body';"
        );
    }

    #[test]
    fn test_decimal_defaults_precision_and_scale() {
        let dialect = OracleDialect::new().unwrap();
        let amount = ColumnDescriptor::new("amount", "BigDecimal").kind(SemanticKind::Decimal);
        let rate = ColumnDescriptor::new("rate", "BigDecimal")
            .kind(SemanticKind::Decimal)
            .length(10)
            .scale(4);

        assert_eq!(dialect.column_type(&amount).unwrap(), "NUMBER(19, 2)");
        assert_eq!(dialect.column_type(&rate).unwrap(), "NUMBER(10, 4)");
    }
}
