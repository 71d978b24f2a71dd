//! DM (Dameng) dialect
//!
//! Oracle-style comments and quoting, `IDENTITY(seed, step)` for
//! auto-increment, and no COLUMN keyword in ADD.

use crate::dialect::{CommentStyle, DialectGenerator, DialectProfile, IdentityPlacement, TypeMapping, DM};
use crate::error::Result;
use crate::schema::types::SemanticKind;

/// DM DDL generator
#[derive(Debug, Clone)]
pub struct DmDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl DmDialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            DM,
            [
                (SemanticKind::Integer, "INT"),
                (SemanticKind::Long, "BIGINT"),
                (SemanticKind::Boolean, "BIT"),
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
                id: DM.to_string(),
                quote: '"',
                auto_increment: "IDENTITY(1, 1)".to_string(),
                identity_placement: IdentityPlacement::BeforeNotNull,
                comments: CommentStyle::Separate,
                max_identifier_length: 128,
                bounded_text: true,
            },
            mapping,
        })
    }
}

impl DialectGenerator for DmDialect {
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
        "VARCHAR(255)"
    }

    fn create_table_prefix(&self) -> &str {
        "CREATE TABLE"
    }

    fn add_column_clause(&self, definition: &str) -> String {
        format!("ADD {}", definition)
    }
}
