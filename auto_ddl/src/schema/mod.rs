//! Schema module for auto_ddl
//!
//! Entity descriptors, field classification, live introspection and diff planning.

pub mod classifier;
pub mod diff;
pub mod introspector;
pub mod types;

// Re-export key types
pub use classifier::{ClassifierRule, FieldContext, FieldSemanticClassifier};
pub use diff::{DdlOperation, DiffPlanner, SyncPolicy};
pub use introspector::SchemaIntrospector;
pub use types::{
    load_descriptors, ColumnDescriptor, ForeignKeyDescriptor, IndexDescriptor, IntrospectedColumn, IntrospectedTable,
    SchemaSnapshot, SemanticKind, TableDescriptor,
};
