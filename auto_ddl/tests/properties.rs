//! Planner and registry properties

mod common;

use auto_ddl::dialect::{CommentStyle, DialectProfile, IdentityPlacement, TypeMapping};
use auto_ddl::schema::types::IntrospectedTable;
use auto_ddl::{
    ColumnDescriptor, DdlOperation, DialectGenerator, DialectRegistry, DiffPlanner, Error,
    ForeignKeyDescriptor, IndexDescriptor, PolicyConfig, SemanticKind, SyncPolicy, TableDescriptor,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

use common::{biz_order, live_biz_order, permissive_policy};

fn order_with_links() -> TableDescriptor {
    TableDescriptor::new("biz_order")
        .column(ColumnDescriptor::new("id", "Long").primary_key())
        .column(ColumnDescriptor::new("amount", "BigDecimal"))
        .column(ColumnDescriptor::new("user_id", "Long"))
        .column(ColumnDescriptor::new("parent_id", "Long"))
        .index(IndexDescriptor::new("idx_biz_order_user_id", &["user_id"], false))
        .foreign_key(ForeignKeyDescriptor::new("fk_biz_order_user_id", "user_id", "sys_user", "id"))
        .foreign_key(ForeignKeyDescriptor::new("fk_biz_order_parent", "parent_id", "biz_order", "id"))
}

/// Apply additive operations to a live table the way a database would
fn apply(existing: &IntrospectedTable, operations: &[DdlOperation]) -> IntrospectedTable {
    let mut applied = existing.clone();
    for operation in operations {
        match operation {
            DdlOperation::AddColumn { column, .. } => {
                applied = applied.with_column(&column.column_name, "applied", column.nullable);
            }
            DdlOperation::AddIndex { index, .. } => applied.indexes.push(index.clone()),
            DdlOperation::AddForeignKey { foreign_key, .. } => {
                applied.foreign_keys.push(foreign_key.clone())
            }
            DdlOperation::DropColumn { column, .. } => {
                applied.columns.retain(|c| !c.name.eq_ignore_ascii_case(column))
            }
            DdlOperation::CreateTable(_) => {}
        }
    }
    applied
}

#[rstest]
#[case(PolicyConfig::default())]
#[case(permissive_policy())]
fn test_planning_is_idempotent(#[case] config: PolicyConfig) {
    let policy = SyncPolicy::compile(&config).unwrap();
    let desired = order_with_links();
    let existing = live_biz_order(&["id", "legacy_flag"]);

    let first = DiffPlanner::plan(&desired, Some(&existing), &policy);
    let second = DiffPlanner::plan(&desired, Some(&existing), &policy);
    assert_eq!(first, second);
    assert!(!first.is_empty());

    let converged = apply(&existing, &first);
    assert_eq!(DiffPlanner::plan(&desired, Some(&converged), &policy), Vec::<DdlOperation>::new());
}

#[rstest]
#[case(&["id"])]
#[case(&["id", "amount", "legacy_flag"])]
#[case(&["ID", "Amount", "remark_url", "legacy_flag", "tenant_id"])]
#[case(&["legacy_a", "legacy_b"])]
fn test_default_policy_never_drops(#[case] live: &[&str]) {
    let policy = SyncPolicy::compile(&PolicyConfig::default()).unwrap();
    let existing = live_biz_order(live);

    for desired in [biz_order(), order_with_links(), TableDescriptor::new("biz_order")] {
        let operations = DiffPlanner::plan(&desired, Some(&existing), &policy);
        assert!(
            operations.iter().all(|op| !op.is_destructive()),
            "drop planned for {:?}",
            live
        );
    }
}

#[test]
fn test_every_builtin_dialect_is_total() {
    let registry = DialectRegistry::with_builtins().unwrap();

    for id in [
        "mysql",
        "oracle",
        "postgresql",
        "dm",
        "h2",
        "sqlite",
        "sqlserver",
        "kingbase",
    ] {
        let generator = registry.resolve(id).unwrap();
        for kind in SemanticKind::ALL {
            assert!(
                generator.type_mapping().get(kind).is_some(),
                "{} has no type for {}",
                id,
                kind
            );
        }
    }
}

struct PartialDialect {
    profile: DialectProfile,
    mapping: TypeMapping,
}

impl DialectGenerator for PartialDialect {
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

#[test]
fn test_partial_mapping_fails_at_registration() {
    let mut registry = DialectRegistry::with_builtins().unwrap();
    let dialect = PartialDialect {
        profile: DialectProfile {
            id: "db2".to_string(),
            quote: '"',
            auto_increment: "GENERATED ALWAYS AS IDENTITY".to_string(),
            identity_placement: IdentityPlacement::BeforeNotNull,
            comments: CommentStyle::Separate,
            max_identifier_length: 128,
            bounded_text: true,
        },
        mapping: TypeMapping::from_entries(
            SemanticKind::ALL
                .iter()
                .filter(|kind| **kind != SemanticKind::Boolean)
                .map(|kind| (*kind, "VARCHAR(255)")),
        ),
    };

    match registry.register_dialect("db2", dialect) {
        Err(Error::UnmappedSemanticKind { dialect, kinds }) => {
            assert_eq!(dialect, "db2");
            assert_eq!(kinds, vec![SemanticKind::Boolean]);
        }
        other => panic!("expected UnmappedSemanticKind, got {:?}", other),
    }
    assert!(matches!(
        registry.resolve("db2"),
        Err(Error::UnsupportedDialect(_))
    ));
}

#[rstest]
#[case("biz_*_log", "biz_login_log")]
#[case("BIZ_*_LOG", "biz_login_log")]
#[case("tmp_?", "tmp_1")]
#[case("flyway_schema_history", "flyway_schema_history")]
fn test_excluded_tables_never_planned(#[case] pattern: &str, #[case] table: &str) {
    let config = PolicyConfig {
        exclude_tables: vec![pattern.to_string()],
        ..permissive_policy()
    };
    let policy = SyncPolicy::compile(&config).unwrap();
    let desired = TableDescriptor::new(table)
        .column(ColumnDescriptor::new("id", "Long").primary_key())
        .index(IndexDescriptor::new("idx_x", &["id"], true));
    let existing = IntrospectedTable::new(table).with_column("obsolete", "int", true);

    assert!(DiffPlanner::plan(&desired, None, &policy).is_empty());
    assert!(DiffPlanner::plan(&desired, Some(&existing), &policy).is_empty());
}

#[rstest]
#[case(None)]
#[case(Some(live_biz_order(&["id"])))]
#[case(Some(live_biz_order(&["id", "amount"])))]
fn test_foreign_keys_follow_the_columns_they_use(#[case] existing: Option<IntrospectedTable>) {
    let policy = SyncPolicy::compile(&PolicyConfig::default()).unwrap();
    let operations = DiffPlanner::plan(&order_with_links(), existing.as_ref(), &policy);

    let position_of_column = |name: &str| {
        operations.iter().position(|op| match op {
            DdlOperation::CreateTable(table) => table.find_column(name).is_some(),
            DdlOperation::AddColumn { column, .. } => column.column_name.eq_ignore_ascii_case(name),
            _ => false,
        })
    };

    let is_live = |name: &str| existing.as_ref().map_or(false, |table| table.has_column(name));
    let assert_available = |name: &str, position: usize, foreign_key: &ForeignKeyDescriptor| {
        match position_of_column(name) {
            Some(added_at) => assert!(added_at < position, "{:?} precedes column {}", foreign_key, name),
            None => assert!(is_live(name), "{:?} uses column {} that never exists", foreign_key, name),
        }
    };

    let mut foreign_keys = 0;
    for (position, operation) in operations.iter().enumerate() {
        if let DdlOperation::AddForeignKey { foreign_key, .. } = operation {
            foreign_keys += 1;
            assert_available(&foreign_key.column_name, position, foreign_key);
            if foreign_key.referenced_table == "biz_order" {
                assert_available(&foreign_key.referenced_column, position, foreign_key);
            }
        }
    }
    assert_eq!(foreign_keys, 2);

    let first_fk = operations
        .iter()
        .position(|op| matches!(op, DdlOperation::AddForeignKey { .. }));
    let last_column = operations
        .iter()
        .rposition(|op| matches!(op, DdlOperation::AddColumn { .. } | DdlOperation::CreateTable(_)));
    assert!(last_column < first_fk);
}
