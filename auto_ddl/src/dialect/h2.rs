//! H2 dialect

use crate::dialect::{CommentStyle, DialectGenerator, DialectProfile, IdentityPlacement, TypeMapping, H2};
use crate::error::Result;
use crate::schema::types::SemanticKind;

/// H2 DDL generator
#[derive(Debug, Clone)]
pub struct H2Dialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl H2Dialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            H2,
            [
                (SemanticKind::Integer, "INT"),
                (SemanticKind::Long, "BIGINT"),
                (SemanticKind::Boolean, "BOOLEAN"),
                (SemanticKind::Char, "CHAR"),
                (SemanticKind::Date, "DATE"),
                (SemanticKind::Time, "TIME"),
                (SemanticKind::Datetime, "TIMESTAMP"),
                (SemanticKind::Decimal, "DECIMAL"),
                (SemanticKind::Double, "DOUBLE"),
                (SemanticKind::Varchar, "VARCHAR"),
                (SemanticKind::Text, "CLOB"),
            ],
        )?;

        Ok(Self {
            profile: DialectProfile {
                id: H2.to_string(),
                quote: '"',
                auto_increment: "AUTO_INCREMENT".to_string(),
                identity_placement: IdentityPlacement::BeforeNotNull,
                comments: CommentStyle::Separate,
                max_identifier_length: 256,
                bounded_text: true,
            },
            mapping,
        })
    }
}

impl DialectGenerator for H2Dialect {
    fn profile(&self) -> &DialectProfile {
        &self.profile
    }

    fn type_mapping(&self) -> &TypeMapping {
        &self.mapping
    }

    fn default_string_type(&self) -> &str {
        "VARCHAR(255)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ForeignKeyDescriptor, IndexDescriptor};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_index_and_foreign_key() {
        let dialect = H2Dialect::new().unwrap();
        let index = IndexDescriptor::new("uk_user_email", &["email"], true);
        let fk = ForeignKeyDescriptor::new("fk_order_user", "user_id", "sys_user", "id");

        assert_eq!(
            dialect.generate_add_index_ddl("sys_user", &index).unwrap(),
            "CREATE UNIQUE INDEX \"uk_user_email\" ON \"sys_user\" (\"email\");"
        );
        assert_eq!(
            dialect.generate_add_foreign_key_ddl("biz_order", &fk).unwrap(),
            "ALTER TABLE \"biz_order\" ADD CONSTRAINT \"fk_order_user\" FOREIGN KEY (\"user_id\") REFERENCES \"sys_user\" (\"id\");"
        );
    }

    #[test]
    fn test_drop_column() {
        let dialect = H2Dialect::new().unwrap();
        assert_eq!(
            dialect.generate_drop_col_ddl("biz_order", "legacy_flag").unwrap(),
            "ALTER TABLE \"biz_order\" DROP COLUMN \"legacy_flag\";"
        );
    }
}
