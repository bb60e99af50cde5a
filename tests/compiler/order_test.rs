use trellis::catalog::{Catalog, CatalogBuilder, Entity, FieldType, Relation, ScalarField};
use trellis::compiler::{CompileError, QueryCompiler, TotalCount};
use trellis::config::CompilerSettings;
use trellis::request::{FieldTree, OrderKey, QueryArgs, SortDirection};

fn library_catalog() -> Catalog {
    CatalogBuilder::new()
        .entity(
            Entity::new("book")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String))
                .field(ScalarField::new("year", FieldType::Int))
                .relation(Relation::to_one("author", "author", "author_id")),
        )
        .entity(
            Entity::new("author")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String))
                .field(ScalarField::new("rating", FieldType::Int)),
        )
        .build()
        .unwrap()
}

fn compile(catalog: &Catalog, args: QueryArgs) -> trellis::QueryPlan {
    QueryCompiler::new(catalog)
        .compile("book", &FieldTree::new().field("year"), &args)
        .unwrap()
}

#[test]
fn test_descending_order_key() {
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new().order(OrderKey::parse("-year")));

    assert_eq!(plan.order.len(), 1);
    assert_eq!(plan.order[0].alias, plan.root_alias);
    assert_eq!(plan.order[0].column, "year");
    assert_eq!(plan.order[0].direction, SortDirection::Desc);
}

#[test]
fn test_order_path_extends_join_set() {
    let catalog = library_catalog();
    let plan = compile(
        &catalog,
        QueryArgs::new().order(OrderKey::parse("author__rating")),
    );

    assert_eq!(plan.joins.len(), 1);
    assert_eq!(plan.order[0].alias, plan.joins[0].target);
    assert_eq!(plan.order[0].direction, SortDirection::Asc);
}

#[test]
fn test_order_by_to_one_uses_foreign_key() {
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new().order(OrderKey::parse("author")));

    assert!(plan.joins.is_empty());
    assert_eq!(plan.order[0].column, "author_id");
}

#[test]
fn test_unknown_order_path() {
    let catalog = library_catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().order(OrderKey::parse("-pages")),
        )
        .unwrap_err();
    assert!(matches!(err, CompileError::UnknownField { .. }));
}

#[test]
fn test_pagination_math() {
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new().paginate(3, 10));

    let page = plan.page.unwrap();
    assert_eq!(page.offset, 20);
    assert_eq!(page.limit, 10);
}

#[test]
fn test_first_page_has_zero_offset() {
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new().paginate(1, 25));
    assert_eq!(plan.page.unwrap().offset, 0);
}

#[test]
fn test_page_without_size_is_unpaginated() {
    let catalog = library_catalog();
    let args = QueryArgs {
        page: Some(2),
        ..QueryArgs::new()
    };
    let plan = compile(&catalog, args);
    assert!(plan.page.is_none());
    assert!(plan.total.is_none());

    let args = QueryArgs {
        page_size: Some(10),
        ..QueryArgs::new()
    };
    let plan = compile(&catalog, args);
    assert!(plan.page.is_none());
}

#[test]
fn test_page_zero_is_rejected() {
    let catalog = library_catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(
            "book",
            &FieldTree::new(),
            &QueryArgs::new().paginate(0, 10),
        )
        .unwrap_err();
    assert_eq!(err, CompileError::PageOutOfRange { page: 0 });
}

#[test]
fn test_pagination_requests_windowed_total() {
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new().paginate(1, 2));
    assert_eq!(plan.total, Some(TotalCount::WindowedCount));
}

#[test]
fn test_explicit_total_without_pagination() {
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new().with_total());
    assert!(plan.page.is_none());
    assert_eq!(plan.total, Some(TotalCount::WindowedCount));
}

#[test]
fn test_zero_size_page_uses_count_query() {
    // A size-zero page returns no rows, so no row can carry the windowed
    // count; the plan must call for the companion count statement.
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new().paginate(1, 0));
    assert_eq!(plan.page.unwrap().limit, 0);
    assert_eq!(plan.total, Some(TotalCount::CountQuery));
}

#[test]
fn test_no_total_without_pagination_or_request() {
    let catalog = library_catalog();
    let plan = compile(&catalog, QueryArgs::new());
    assert!(plan.total.is_none());
}

#[test]
fn test_page_size_clamps_to_settings_max() {
    let catalog = library_catalog();
    let settings = CompilerSettings {
        max_page_size: Some(100),
        ..CompilerSettings::default()
    };
    let compiler = QueryCompiler::with_settings(&catalog, settings);
    assert_eq!(compiler.settings().max_page_size, Some(100));

    let plan = compiler
        .compile(
            "book",
            &FieldTree::new().field("year"),
            &QueryArgs::new().paginate(2, 1000),
        )
        .unwrap();
    let page = plan.page.unwrap();
    assert_eq!(page.limit, 100);
    assert_eq!(page.offset, 100);
}
