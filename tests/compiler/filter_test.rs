use trellis::catalog::{Catalog, CatalogBuilder, Entity, FieldType, Relation, ScalarField};
use trellis::compiler::{CompareOp, CompileError, ConditionTree, QueryCompiler};
use trellis::config::CompilerSettings;
use trellis::request::{FieldTree, FilterNode, FilterValue, QueryArgs};

fn library_catalog() -> Catalog {
    CatalogBuilder::new()
        .entity(
            Entity::new("book")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String))
                .field(ScalarField::new("year", FieldType::Int))
                .field(ScalarField::new("notes", FieldType::String).nullable())
                .relation(Relation::to_one("author", "author", "author_id")),
        )
        .entity(
            Entity::new("author")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String))
                .field(ScalarField::new("rating", FieldType::Int))
                .relation(Relation::to_one("country", "country", "country_id")),
        )
        .entity(
            Entity::new("country")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String)),
        )
        .build()
        .unwrap()
}

fn compile_filter(catalog: &Catalog, filters: FilterNode) -> trellis::QueryPlan {
    QueryCompiler::new(catalog)
        .compile(
            "book",
            &FieldTree::new().field("year"),
            &QueryArgs::new().filters(filters),
        )
        .unwrap()
}

#[test]
fn test_local_leaf_binds_to_root_alias() {
    let catalog = library_catalog();
    let plan = compile_filter(&catalog, FilterNode::leaf("year__gte", 2000));

    assert!(plan.joins.is_empty());
    let Some(ConditionTree::Compare(cmp)) = &plan.condition else {
        panic!("expected a single comparison");
    };
    assert_eq!(cmp.alias, plan.root_alias);
    assert_eq!(cmp.column, "year");
    assert_eq!(cmp.op, CompareOp::Gte);
    assert_eq!(cmp.value, FilterValue::Int(2000));
}

#[test]
fn test_relation_crossing_leaf_discovers_join() {
    let catalog = library_catalog();
    let plan = compile_filter(&catalog, FilterNode::leaf("author__rating", 42));

    assert_eq!(plan.joins.len(), 1);
    assert_eq!(plan.joins[0].relation, "author");
    let Some(ConditionTree::Compare(cmp)) = &plan.condition else {
        panic!("expected a single comparison");
    };
    assert_eq!(cmp.alias, plan.joins[0].target);
    assert_eq!(cmp.column, "rating");
}

#[test]
fn test_multi_hop_path() {
    let catalog = library_catalog();
    let plan = compile_filter(&catalog, FilterNode::leaf("author__country__name", "Chile"));

    assert_eq!(plan.joins.len(), 2);
    assert_eq!(plan.joins[0].relation, "author");
    assert_eq!(plan.joins[1].relation, "country");
    assert_eq!(plan.joins[1].source, plan.joins[0].target);
}

#[test]
fn test_two_leaves_share_one_join() {
    let catalog = library_catalog();
    let plan = compile_filter(
        &catalog,
        FilterNode::and(vec![
            FilterNode::leaf("author__rating__gte", 10),
            FilterNode::leaf("author__name__contains", "le"),
        ]),
    );
    assert_eq!(plan.joins.len(), 1);
}

#[test]
fn test_tree_shape_is_preserved() {
    let catalog = library_catalog();
    let plan = compile_filter(
        &catalog,
        FilterNode::and(vec![
            FilterNode::leaf("name", "a"),
            FilterNode::or(vec![
                FilterNode::leaf("year", 2001),
                FilterNode::leaf("year", 2002),
            ]),
        ]),
    );

    let Some(ConditionTree::And(children)) = &plan.condition else {
        panic!("expected And at the top");
    };
    assert_eq!(children.len(), 2);
    assert!(matches!(children[0], ConditionTree::Compare(_)));
    let ConditionTree::Or(inner) = &children[1] else {
        panic!("expected Or as second child");
    };
    assert_eq!(inner.len(), 2);
}

#[test]
fn test_not_is_preserved() {
    let catalog = library_catalog();
    let plan = compile_filter(
        &catalog,
        FilterNode::not(FilterNode::leaf("year__lt", 1990)),
    );
    assert!(matches!(plan.condition, Some(ConditionTree::Not(_))));
}

#[test]
fn test_null_equality_becomes_is_null() {
    let catalog = library_catalog();
    let plan = compile_filter(&catalog, FilterNode::leaf("notes", FilterValue::Null));
    let Some(ConditionTree::Compare(cmp)) = &plan.condition else {
        panic!("expected a single comparison");
    };
    assert_eq!(cmp.op, CompareOp::IsNull);
}

#[test]
fn test_null_inequality_becomes_is_not_null() {
    let catalog = library_catalog();
    let plan = compile_filter(
        &catalog,
        FilterNode::leaf("notes__ne", FilterValue::Null),
    );
    let Some(ConditionTree::Compare(cmp)) = &plan.condition else {
        panic!("expected a single comparison");
    };
    assert_eq!(cmp.op, CompareOp::IsNotNull);
}

#[test]
fn test_to_one_leaf_compares_foreign_key() {
    let catalog = library_catalog();
    let plan = compile_filter(&catalog, FilterNode::leaf("author", 5));

    // No join: the foreign key lives on the book row itself.
    assert!(plan.joins.is_empty());
    let Some(ConditionTree::Compare(cmp)) = &plan.condition else {
        panic!("expected a single comparison");
    };
    assert_eq!(cmp.column, "author_id");
    assert_eq!(cmp.alias, plan.root_alias);
}

#[test]
fn test_in_requires_a_list() {
    let catalog = library_catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().filters(FilterNode::leaf("year__in", 2000)),
        )
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidOperator { .. }));

    let plan = compile_filter(
        &catalog,
        FilterNode::leaf("year__in", vec![1999i64, 2000]),
    );
    let Some(ConditionTree::Compare(cmp)) = &plan.condition else {
        panic!("expected a single comparison");
    };
    assert_eq!(cmp.op, CompareOp::In);
}

#[test]
fn test_contains_on_int_is_invalid() {
    let catalog = library_catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().filters(FilterNode::leaf("year__contains", "20")),
        )
        .unwrap_err();
    assert!(matches!(
        err,
        CompileError::InvalidOperator { ref path, .. } if path == "year"
    ));
}

#[test]
fn test_is_with_non_null_value_is_invalid() {
    let catalog = library_catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().filters(FilterNode::leaf("notes__is", "x")),
        )
        .unwrap_err();
    assert!(matches!(err, CompileError::InvalidOperator { .. }));
}

#[test]
fn test_unknown_relation_in_path() {
    let catalog = library_catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().filters(FilterNode::leaf("publisher__name", "x")),
        )
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownRelation {
            entity: "book".into(),
            relation: "publisher".into()
        }
    );
}

#[test]
fn test_unknown_trailing_field() {
    let catalog = library_catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().filters(FilterNode::leaf("author__age", 50)),
        )
        .unwrap_err();
    assert_eq!(
        err,
        CompileError::UnknownField {
            entity: "author".into(),
            field: "age".into()
        }
    );
}

#[test]
fn test_filter_depth_limit() {
    let catalog = library_catalog();
    let settings = CompilerSettings {
        max_filter_depth: 2,
        ..CompilerSettings::default()
    };
    let mut node = FilterNode::leaf("year", 2000);
    for _ in 0..4 {
        node = FilterNode::not(node);
    }
    let err = QueryCompiler::with_settings(&catalog, settings)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().filters(node),
        )
        .unwrap_err();
    assert_eq!(err, CompileError::DepthExceeded { max_depth: 2 });
}
