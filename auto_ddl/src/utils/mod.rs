//! Utilities for auto_ddl
//!
//! This module provides utility functions used across the library.

pub mod logging;
pub mod naming;

pub use naming::{
    escape_literal, format_name, get_foreign_key_name, get_index_name, to_column_style,
    truncate_identifier,
};
