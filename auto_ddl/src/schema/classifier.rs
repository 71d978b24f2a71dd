//! Field classification
//!
//! Maps a field's source type and name to a [`SemanticKind`] through an
//! ordered chain of [`ClassifierRule`]s. The first rule that answers wins.
//! The built-in chain is:
//!
//! 1. configured type overrides
//! 2. exact source type rules (`bool` -> BOOLEAN, `BigDecimal` -> DECIMAL, ...)
//! 3. string rules: TEXT when the dialect has no bounded text type or the
//!    field name contains a text keyword
//!
//! Anything left over is VARCHAR at the configured default length.
//!
//! The keyword rule is a naming heuristic. A field called `context` contains
//! `text` and is classified TEXT.

use std::collections::HashMap;

use crate::config::ClassifierConfig;
use crate::dialect::DialectGenerator;
use crate::schema::types::{ColumnDescriptor, SemanticKind, TableDescriptor};

/// What a rule sees about one field
#[derive(Debug, Clone)]
pub struct FieldContext<'a> {
    /// Source type with `Option<>`, `?`, generic arguments and path stripped
    pub type_name: String,
    pub field_name: &'a str,
    pub column_name: &'a str,
    /// Whether the target dialect distinguishes VARCHAR(n) from TEXT
    pub bounded_text: bool,
}

impl<'a> FieldContext<'a> {
    /// Build the context for a column and target dialect
    pub fn new(column: &'a ColumnDescriptor, bounded_text: bool) -> Self {
        Self {
            type_name: simple_type_name(&column.source_type_name),
            field_name: &column.source_field_name,
            column_name: &column.column_name,
            bounded_text,
        }
    }
}

/// One step of the classification chain
pub trait ClassifierRule: Send + Sync {
    /// Rule name, used in trace output
    fn name(&self) -> &str;

    /// Return a kind to stop the chain, or `None` to pass
    fn classify(&self, field: &FieldContext<'_>) -> Option<SemanticKind>;
}

/// User-configured source type to kind table
pub struct TypeOverrideRule {
    overrides: HashMap<String, SemanticKind>,
}

impl TypeOverrideRule {
    pub fn new(overrides: &HashMap<String, SemanticKind>) -> Self {
        Self {
            overrides: overrides
                .iter()
                .map(|(name, kind)| (simple_type_name(name).to_lowercase(), *kind))
                .collect(),
        }
    }
}

impl ClassifierRule for TypeOverrideRule {
    fn name(&self) -> &str {
        "type-override"
    }

    fn classify(&self, field: &FieldContext<'_>) -> Option<SemanticKind> {
        self.overrides.get(&field.type_name.to_lowercase()).copied()
    }
}

/// Built-in JVM and Rust type names
pub struct ExactTypeRule;

impl ClassifierRule for ExactTypeRule {
    fn name(&self) -> &str {
        "exact-type"
    }

    fn classify(&self, field: &FieldContext<'_>) -> Option<SemanticKind> {
        let kind = match field.type_name.to_lowercase().as_str() {
            "bool" | "boolean" => SemanticKind::Boolean,
            "int" | "integer" | "short" | "byte" | "i8" | "i16" | "i32" | "u8" | "u16" => {
                SemanticKind::Integer
            }
            "long" | "biginteger" | "i64" | "u32" | "u64" | "isize" | "usize" => SemanticKind::Long,
            "bigdecimal" | "decimal" => SemanticKind::Decimal,
            "double" | "float" | "f32" | "f64" => SemanticKind::Double,
            "char" | "character" => SemanticKind::Char,
            "localdate" | "naivedate" => SemanticKind::Date,
            "localtime" | "naivetime" | "time" => SemanticKind::Time,
            "localdatetime" | "naivedatetime" | "datetime" | "offsetdatetime" | "zoneddatetime"
            | "primitivedatetime" | "instant" | "timestamp" | "date" => SemanticKind::Datetime,
            _ => return None,
        };
        Some(kind)
    }
}

/// TEXT for dialects without bounded text, or for keyword-named fields
pub struct TextKeywordRule {
    keywords: Vec<String>,
}

impl TextKeywordRule {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    fn matches(&self, name: &str) -> bool {
        let name = name.to_lowercase();
        self.keywords.iter().any(|k| name.contains(k.as_str()))
    }
}

impl ClassifierRule for TextKeywordRule {
    fn name(&self) -> &str {
        "text-keyword"
    }

    fn classify(&self, field: &FieldContext<'_>) -> Option<SemanticKind> {
        if !field.bounded_text || self.matches(field.field_name) || self.matches(field.column_name) {
            Some(SemanticKind::Text)
        } else {
            None
        }
    }
}

/// Ordered rule chain with a VARCHAR fallback
pub struct FieldSemanticClassifier {
    rules: Vec<Box<dyn ClassifierRule>>,
    default_varchar_length: u32,
}

impl FieldSemanticClassifier {
    /// Build the default chain from configuration
    pub fn new(config: &ClassifierConfig) -> Self {
        Self {
            rules: vec![
                Box::new(TypeOverrideRule::new(&config.type_overrides)),
                Box::new(ExactTypeRule),
                Box::new(TextKeywordRule::new(&config.text_keywords)),
            ],
            default_varchar_length: config.default_varchar_length,
        }
    }

    /// Insert a rule after the configured overrides and before the built-in rules
    pub fn with_rule(mut self, rule: impl ClassifierRule + 'static) -> Self {
        let position = self.rules.len().min(1);
        self.rules.insert(position, Box::new(rule));
        self
    }

    /// Names of the rules in evaluation order
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Classify one field
    pub fn classify(&self, field: &FieldContext<'_>) -> SemanticKind {
        for rule in &self.rules {
            if let Some(kind) = rule.classify(field) {
                tracing::trace!(
                    field = field.field_name,
                    source_type = %field.type_name,
                    rule = rule.name(),
                    kind = %kind,
                    "Classified field"
                );
                return kind;
            }
        }
        SemanticKind::Varchar
    }

    /// Fill kind and default length of a column that has no kind yet
    pub fn classify_column(&self, column: &ColumnDescriptor, bounded_text: bool) -> ColumnDescriptor {
        let mut classified = column.clone();

        if classified.semantic_kind.is_none() {
            classified.semantic_kind = Some(self.classify(&FieldContext::new(column, bounded_text)));
        }

        if classified.semantic_kind == Some(SemanticKind::Varchar) && classified.length.is_none() {
            classified.length = Some(self.default_varchar_length);
        }

        classified
    }

    /// Classify every column of a table for a dialect
    pub fn classify_table(&self, table: &TableDescriptor, dialect: &dyn DialectGenerator) -> TableDescriptor {
        let bounded_text = dialect.profile().bounded_text;
        let mut classified = table.clone();
        classified.columns = table
            .columns
            .iter()
            .map(|column| self.classify_column(column, bounded_text))
            .collect();
        classified
    }
}

impl Default for FieldSemanticClassifier {
    fn default() -> Self {
        Self::new(&ClassifierConfig::default())
    }
}

/// `Option<chrono::NaiveDate>` -> `NaiveDate`, `java.lang.String?` -> `String`
fn simple_type_name(source: &str) -> String {
    let mut name = source.trim();

    loop {
        if let Some(inner) = name.strip_suffix('?') {
            name = inner.trim();
        } else if let Some(inner) = name
            .strip_prefix("Option<")
            .or_else(|| name.strip_prefix("std::option::Option<"))
            .and_then(|rest| rest.strip_suffix('>'))
        {
            name = inner.trim();
        } else {
            break;
        }
    }

    let name = name.split('<').next().unwrap_or(name);
    let name = name.trim_start_matches('&').trim();
    let name = name.rsplit(|c: char| c == '.' || c == ':').next().unwrap_or(name);
    name.to_string()
}
