//! KingbaseES dialect
//!
//! PostgreSQL-compatible grammar, but with bounded VARCHAR columns and the
//! identity clause after `NOT NULL`.

use crate::dialect::{CommentStyle, DialectGenerator, DialectProfile, IdentityPlacement, TypeMapping, KINGBASE};
use crate::error::Result;
use crate::schema::types::SemanticKind;

/// KingbaseES DDL generator
#[derive(Debug, Clone)]
pub struct KingbaseDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl KingbaseDialect {
    pub fn new() -> Result<Self> {
        let mapping = TypeMapping::total(
            KINGBASE,
            [
                (SemanticKind::Integer, "INTEGER"),
                (SemanticKind::Long, "BIGINT"),
                (SemanticKind::Boolean, "BOOLEAN"),
                (SemanticKind::Char, "CHAR"),
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
                id: KINGBASE.to_string(),
                quote: '"',
                auto_increment: "GENERATED BY DEFAULT AS IDENTITY".to_string(),
                identity_placement: IdentityPlacement::AfterNotNull,
                comments: CommentStyle::Separate,
                max_identifier_length: 63,
                bounded_text: true,
            },
            mapping,
        })
    }
}

impl DialectGenerator for KingbaseDialect {
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
