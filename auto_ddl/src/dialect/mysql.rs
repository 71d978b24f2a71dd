//! MySQL dialect
//!
//! Backtick quoting, inline column comments and table options after the
//! closing parenthesis of CREATE TABLE.

use crate::dialect::{CommentStyle, DialectGenerator, DialectProfile, IdentityPlacement, TypeMapping, MYSQL};
use crate::error::Result;
use crate::schema::types::{SemanticKind, TableDescriptor};
use crate::utils::naming::escape_literal;

/// MySQL / MariaDB DDL generator
#[derive(Debug, Clone)]
pub struct MySqlDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl MySqlDialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            MYSQL,
            [
                (SemanticKind::Integer, "INT"),
                (SemanticKind::Long, "BIGINT"),
                (SemanticKind::Boolean, "TINYINT(1)"),
                (SemanticKind::Char, "CHAR"),
                (SemanticKind::Date, "DATE"),
                (SemanticKind::Time, "TIME"),
                (SemanticKind::Datetime, "DATETIME"),
                (SemanticKind::Decimal, "DECIMAL"),
                (SemanticKind::Double, "DOUBLE"),
                (SemanticKind::Varchar, "VARCHAR"),
                (SemanticKind::Text, "TEXT"),
            ],
        )?;

        Ok(Self {
            profile: DialectProfile {
                id: MYSQL.to_string(),
                quote: '`',
                auto_increment: "AUTO_INCREMENT".to_string(),
                identity_placement: IdentityPlacement::AfterNotNull,
                comments: CommentStyle::Inline,
                max_identifier_length: 64,
                bounded_text: true,
            },
            mapping,
        })
    }
}

impl DialectGenerator for MySqlDialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn type_mapping(&self) -> &TypeMapping {
        &self.mapping
    }

    fn default_string_type(&self) -> &str {
        "VARCHAR(255)"
    }

    fn table_suffix(&self, table: &TableDescriptor) -> String {
        let mut options = vec![
            "ENGINE=InnoDB".to_string(),
            "DEFAULT CHARACTER SET=utf8mb4".to_string(),
            "COLLATE=utf8mb4_unicode_ci".to_string(),
        ];

        if let Some(comment) = table.table_comment() {
            options.push(format!("COMMENT='{}'", escape_literal(comment)));
        }

        format!(" {}", options.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::ColumnDescriptor;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_table_inlines_comments() {
        let dialect = MySqlDialect::new().unwrap();
        let table = TableDescriptor::new("biz_order")
            .comment("Orders")
            .column(
                ColumnDescriptor::new("id", "Long")
                    .kind(SemanticKind::Long)
                    .primary_key()
                    .auto_increment(),
            )
            .column(
                ColumnDescriptor::new("order_no", "String")
                    .kind(SemanticKind::Varchar)
                    .length(64)
                    .comment("Order number"),
            );

        let sql = dialect.generate_create_table_ddl(&table).unwrap();
        assert_eq!(
            sql,
            "CREATE TABLE IF NOT EXISTS `biz_order` (\n  \
             `id` BIGINT NOT NULL AUTO_INCREMENT,\n  \
             `order_no` VARCHAR(64) COMMENT 'Order number',\n  \
             PRIMARY KEY (`id`)\n\
             ) ENGINE=InnoDB DEFAULT CHARACTER SET=utf8mb4 COLLATE=utf8mb4_unicode_ci COMMENT='Orders';"
        );
        assert!(!sql.contains("COMMENT ON"));
    }

    #[test]
    fn test_boolean_is_tinyint() {
        let dialect = MySqlDialect::new().unwrap();
        let column = ColumnDescriptor::new("is_paid", "Boolean").kind(SemanticKind::Boolean);
        assert_eq!(dialect.column_type(&column).unwrap(), "TINYINT(1)");
    }
}
