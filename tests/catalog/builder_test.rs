use trellis::catalog::{
    CatalogBuilder, CatalogError, Entity, FieldType, Member, Relation, ScalarField,
};

/// Helper: a small library schema with explicit inverse relations.
fn library_builder() -> CatalogBuilder {
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
}

#[test]
fn test_build_and_lookup() {
    let catalog = library_builder().build().unwrap();
    assert_eq!(catalog.len(), 2);
    assert!(catalog.contains("book"));

    let book = catalog.entity("book").unwrap();
    assert_eq!(book.table, "book");
    assert_eq!(book.key_column, "id");
    assert!(matches!(book.member("year"), Some(Member::Scalar(_))));
    assert!(matches!(book.member("author"), Some(Member::ToOne(_))));
    assert!(book.member("publisher").is_none());
}

#[test]
fn test_inverse_is_synthesized() {
    let catalog = library_builder().build().unwrap();
    let author = catalog.entity("author").unwrap();
    let Some(Member::ToMany(inverse)) = author.member("book_set") else {
        panic!("expected synthesized book_set inverse");
    };
    assert_eq!(inverse.target(), "book");
    assert_eq!(inverse.fk_column(), "author_id");
}

#[test]
fn test_declared_inverse_is_not_duplicated() {
    let catalog = CatalogBuilder::new()
        .entity(
            Entity::new("book")
                .field(ScalarField::new("id", FieldType::Int))
                .relation(Relation::to_one("author", "author", "author_id")),
        )
        .entity(
            Entity::new("author")
                .field(ScalarField::new("id", FieldType::Int))
                .relation(Relation::to_many("books", "book", "author_id")),
        )
        .build()
        .unwrap();

    let author = catalog.entity("author").unwrap();
    assert!(author.member("books").is_some());
    assert!(author.member("book_set").is_none());
}

#[test]
fn test_relation_graph_has_one_edge_per_relation() {
    let catalog = library_builder().build().unwrap();
    // book->author (declared) plus author->book (synthesized inverse).
    assert_eq!(catalog.relation_graph().edge_count(), 2);
}

#[test]
fn test_duplicate_entity_is_rejected() {
    let err = CatalogBuilder::new()
        .entity(Entity::new("book").field(ScalarField::new("id", FieldType::Int)))
        .entity(Entity::new("book").field(ScalarField::new("id", FieldType::Int)))
        .build()
        .unwrap_err();
    assert_eq!(err, CatalogError::DuplicateEntity("book".into()));
}

#[test]
fn test_field_and_relation_name_clash_is_rejected() {
    let err = CatalogBuilder::new()
        .entity(
            Entity::new("book")
                .field(ScalarField::new("id", FieldType::Int))
                .field(ScalarField::new("author", FieldType::Int))
                .relation(Relation::to_one("author", "author", "author_id")),
        )
        .entity(Entity::new("author").field(ScalarField::new("id", FieldType::Int)))
        .build()
        .unwrap_err();
    assert!(matches!(err, CatalogError::DuplicateMember { .. }));
}

#[test]
fn test_undeclared_key_is_rejected() {
    let err = CatalogBuilder::new()
        .entity(Entity::new("book").field(ScalarField::new("name", FieldType::String)))
        .build()
        .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownKey { .. }));
}

#[test]
fn test_unknown_relation_target_is_rejected() {
    let err = CatalogBuilder::new()
        .entity(
            Entity::new("book")
                .field(ScalarField::new("id", FieldType::Int))
                .relation(Relation::to_one("author", "writer", "author_id")),
        )
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        CatalogError::UnknownTarget { ref target, .. } if target == "writer"
    ));
}

#[test]
fn test_to_many_without_backing_fk_is_rejected() {
    let err = CatalogBuilder::new()
        .entity(
            Entity::new("author")
                .field(ScalarField::new("id", FieldType::Int))
                .relation(Relation::to_many("books", "book", "author_id")),
        )
        .entity(Entity::new("book").field(ScalarField::new("id", FieldType::Int)))
        .build()
        .unwrap_err();
    assert!(matches!(err, CatalogError::DanglingInverse { .. }));
}

#[test]
fn test_colliding_synthesized_inverse_is_rejected() {
    // Two foreign keys into author, neither with a declared inverse: the
    // second synthesized `book_set` collides with the first.
    let err = CatalogBuilder::new()
        .entity(
            Entity::new("book")
                .field(ScalarField::new("id", FieldType::Int))
                .relation(Relation::to_one("author", "author", "author_id"))
                .relation(Relation::to_one("editor", "author", "editor_id")),
        )
        .entity(Entity::new("author").field(ScalarField::new("id", FieldType::Int)))
        .build()
        .unwrap_err();
    assert!(matches!(err, CatalogError::InverseCollision { .. }));
}

#[test]
fn test_empty_table_defaults_to_entity_name() {
    // Deserialized definitions may omit the table name entirely.
    let entity: Entity = toml::from_str(
        r#"
        name = "book"
        fields = [{ name = "id", type = "int" }]
        "#,
    )
    .unwrap();
    let catalog = CatalogBuilder::new().entity(entity).build().unwrap();
    assert_eq!(catalog.entity("book").unwrap().table, "book");
}
