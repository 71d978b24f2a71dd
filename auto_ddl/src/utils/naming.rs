//! Naming utilities for auto_ddl
//!
//! Constraint name patterns, identifier length limits and SQL literal escaping.

use inflector::Inflector;

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Get index name from table and columns according to pattern
pub fn get_index_name(pattern: &str, table_name: &str, columns: &[String]) -> String {
    let columns_str = columns.join("_");

    format_name(pattern, &[("table", table_name), ("columns", &columns_str)])
}

/// Get foreign key constraint name according to pattern
pub fn get_foreign_key_name(pattern: &str, table_name: &str, column_name: &str) -> String {
    format_name(pattern, &[("table", table_name), ("column", column_name)])
}

/// Truncate an identifier to fit database limits
///
/// Over-long names keep a prefix and gain an 8 character md5 suffix so that
/// distinct long names stay distinct.
pub fn truncate_identifier(name: &str, max_length: usize) -> String {
    if name.len() <= max_length {
        return name.to_string();
    }

    let hash = format!("{:x}", md5::compute(name.as_bytes()));
    if max_length <= 9 {
        return hash[..max_length.min(hash.len())].to_string();
    }

    let mut keep_length = max_length - 9;
    while !name.is_char_boundary(keep_length) {
        keep_length -= 1;
    }

    format!("{}_{}", &name[..keep_length], &hash[0..8])
}

/// Canonical snake_case form of a field or column name
pub fn to_column_style(name: &str) -> String {
    name.to_snake_case()
}

/// Escape a value for use inside a single-quoted SQL literal
pub fn escape_literal(value: &str) -> String {
    value.replace('\'', "''")
}
