//! Shared fixtures for integration tests

#![allow(dead_code)]

use auto_ddl::schema::types::IntrospectedTable;
use auto_ddl::{ColumnDescriptor, DialectRegistry, PolicyConfig, TableDescriptor};

pub fn registry() -> DialectRegistry {
    DialectRegistry::with_builtins().unwrap()
}

/// `biz_order` with an auto-increment key, a decimal amount and a URL remark
pub fn biz_order() -> TableDescriptor {
    TableDescriptor::new("biz_order")
        .column(ColumnDescriptor::new("id", "Long").primary_key().auto_increment())
        .column(ColumnDescriptor::new("amount", "BigDecimal"))
        .column(ColumnDescriptor::new("remark_url", "String"))
}

/// `biz_order` with id, amount and status
pub fn biz_order_with_status() -> TableDescriptor {
    TableDescriptor::new("biz_order")
        .column(ColumnDescriptor::new("id", "Long").primary_key().auto_increment())
        .column(ColumnDescriptor::new("amount", "BigDecimal"))
        .column(ColumnDescriptor::new("status", "String"))
}

pub fn live_biz_order(columns: &[&str]) -> IntrospectedTable {
    columns.iter().fold(IntrospectedTable::new("biz_order"), |table, column| {
        table.with_column(column, "varchar", *column != "id")
    })
}

pub fn permissive_policy() -> PolicyConfig {
    PolicyConfig {
        allow_destructive_column_drop: true,
        ..PolicyConfig::default()
    }
}
