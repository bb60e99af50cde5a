use std::collections::HashSet;

use trellis::catalog::{Catalog, CatalogBuilder, Entity, FieldType, Relation, ScalarField};
use trellis::compiler::QueryCompiler;
use trellis::request::{FieldTree, FilterNode, OrderKey, QueryArgs};

fn library_catalog() -> Catalog {
    CatalogBuilder::new()
        .entity(
            Entity::new("book")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String))
                .field(ScalarField::new("year", FieldType::Int))
                .relation(Relation::to_one("author", "author", "author_id"))
                .relation(Relation::to_one("editor", "author", "editor_id")),
        )
        .entity(
            Entity::new("author")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String))
                .field(ScalarField::new("rating", FieldType::Int))
                .relation(Relation::to_one("country", "country", "country_id"))
                .relation(Relation::to_many("books", "book", "author_id"))
                .relation(Relation::to_many("edited_books", "book", "editor_id")),
        )
        .entity(
            Entity::new("country")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("name", FieldType::String)),
        )
        .build()
        .unwrap()
}

/// The join-idempotence property: a relation needed by both projection and
/// filtering appears exactly once in the join plan.
#[test]
fn test_projection_and_filter_share_a_join() {
    let catalog = library_catalog();
    let tree = FieldTree::new()
        .field("year")
        .child("author", FieldTree::new().field("name"));
    let args = QueryArgs::new().filters(FilterNode::leaf("author__rating", 42));
    let plan = QueryCompiler::new(&catalog)
        .compile("book", &tree, &args)
        .unwrap();

    assert_eq!(plan.joins.len(), 1);
    assert_eq!(plan.joins[0].relation, "author");
}

/// Projection, filtering and ordering all touching the same two-hop path
/// still produce one join per edge.
#[test]
fn test_three_stages_share_a_two_hop_path() {
    let catalog = library_catalog();
    let tree = FieldTree::new().child(
        "author",
        FieldTree::new().child("country", FieldTree::new().field("name")),
    );
    let args = QueryArgs::new()
        .filters(FilterNode::leaf("author__country__name__contains", "an"))
        .order(OrderKey::parse("author__country__name"));
    let plan = QueryCompiler::new(&catalog)
        .compile("book", &tree, &args)
        .unwrap();

    assert_eq!(plan.joins.len(), 2);
}

/// A filter path that shares only a prefix with the projection reuses the
/// prefix join and adds exactly the missing edge.
#[test]
fn test_filter_extends_projected_prefix() {
    let catalog = library_catalog();
    let tree = FieldTree::new().child("author", FieldTree::new().field("name"));
    let args = QueryArgs::new().filters(FilterNode::leaf("author__country__name", "Chile"));
    let plan = QueryCompiler::new(&catalog)
        .compile("book", &tree, &args)
        .unwrap();

    assert_eq!(plan.joins.len(), 2);
    assert_eq!(plan.joins[0].relation, "author");
    assert_eq!(plan.joins[1].relation, "country");
    assert_eq!(plan.joins[1].source, plan.joins[0].target);
}

/// The alias-uniqueness property: no two join requirements share a target.
#[test]
fn test_all_target_aliases_are_distinct() {
    let catalog = library_catalog();
    let tree = FieldTree::new()
        .child(
            "author",
            FieldTree::new()
                .field("name")
                .child("country", FieldTree::new().field("name")),
        )
        .child(
            "editor",
            FieldTree::new()
                .field("name")
                .child("country", FieldTree::new().field("name")),
        );
    let args = QueryArgs::new()
        .filters(FilterNode::and(vec![
            FilterNode::leaf("author__rating__gte", 1),
            FilterNode::leaf("editor__rating__gte", 1),
        ]))
        .order(OrderKey::parse("-editor__country__name"));
    let plan = QueryCompiler::new(&catalog)
        .compile("book", &tree, &args)
        .unwrap();

    assert_eq!(plan.joins.len(), 4);
    let targets: HashSet<_> = plan.joins.iter().map(|j| j.target).collect();
    assert_eq!(targets.len(), plan.joins.len());
    // Root is never a join target.
    assert!(!targets.contains(&plan.root_alias));
}

/// The same relation name under two different sources is two different
/// joins: author.country and editor.country must not collapse.
#[test]
fn test_same_relation_name_under_different_sources() {
    let catalog = library_catalog();
    let tree = FieldTree::new()
        .child("author", FieldTree::new().child("country", FieldTree::new()))
        .child("editor", FieldTree::new().child("country", FieldTree::new()));
    let plan = QueryCompiler::new(&catalog)
        .compile("book", &tree, &QueryArgs::new())
        .unwrap();

    let country_joins: Vec<_> = plan
        .joins
        .iter()
        .filter(|j| j.relation == "country")
        .collect();
    assert_eq!(country_joins.len(), 2);
    assert_ne!(country_joins[0].source, country_joins[1].source);
    assert_ne!(country_joins[0].target, country_joins[1].target);
}

/// A cycle through to-one and back through to-many gives the book entity a
/// second occurrence instead of reusing the root.
#[test]
fn test_cyclic_path_gets_fresh_alias() {
    let catalog = library_catalog();
    let args = QueryArgs::new().filters(FilterNode::leaf("author__books__year__lt", 1900));
    let tree = FieldTree::new().field("name");
    let plan = QueryCompiler::new(&catalog)
        .compile("book", &tree, &args)
        .unwrap();

    assert_eq!(plan.joins.len(), 2);
    assert_eq!(plan.joins[1].target_entity, "book");
    assert_ne!(plan.joins[1].target, plan.root_alias);
}

/// First-seen ordering: selection joins come before filter-discovered
/// joins, which come before order-discovered joins.
#[test]
fn test_merge_preserves_first_seen_order() {
    let catalog = library_catalog();
    let tree = FieldTree::new().child("author", FieldTree::new().field("name"));
    let args = QueryArgs::new()
        .filters(FilterNode::leaf("editor__rating", 7))
        .order(OrderKey::parse("author__country__name"));
    let plan = QueryCompiler::new(&catalog)
        .compile("book", &tree, &args)
        .unwrap();

    let relations: Vec<_> = plan.joins.iter().map(|j| j.relation.as_str()).collect();
    assert_eq!(relations, ["author", "editor", "country"]);
}
