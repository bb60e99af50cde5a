//! Schema catalog - the read-only description of entities and relations.
//!
//! The catalog is built once at startup ([`CatalogBuilder`]) and then only
//! read by the compiler. It is backed by a directed graph (entity nodes,
//! relation edges) with a name index, so relation pairing can be validated
//! structurally and tooling can walk the schema.

mod builder;
mod entity;

pub use builder::{CatalogBuilder, CatalogError, CatalogResult};
pub use entity::{Entity, FieldType, Member, Relation, ScalarField};

use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// Edge weight in the catalog graph: one relation from source to target.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationEdge {
    /// Relation name on the source entity.
    pub relation: String,
    /// True for to-many edges.
    pub many: bool,
}

/// The schema catalog.
///
/// Immutable once built; lookups are by entity name. An entity may of
/// course appear many times in a single compiled query - occurrence
/// identity is the compiler's concern (aliases), not the catalog's.
#[derive(Debug, Clone)]
pub struct Catalog {
    graph: DiGraph<Entity, RelationEdge>,
    entity_index: HashMap<String, NodeIndex>,
}

impl Catalog {
    pub(crate) fn from_parts(
        graph: DiGraph<Entity, RelationEdge>,
        entity_index: HashMap<String, NodeIndex>,
    ) -> Self {
        Self {
            graph,
            entity_index,
        }
    }

    /// Look up an entity by name.
    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.entity_index.get(name).map(|idx| &self.graph[*idx])
    }

    /// True if the catalog defines an entity with this name.
    pub fn contains(&self, name: &str) -> bool {
        self.entity_index.contains_key(name)
    }

    /// All entities, in registration order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.graph.node_weights()
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// The underlying relation graph, for tooling and diagnostics.
    pub fn relation_graph(&self) -> &DiGraph<Entity, RelationEdge> {
        &self.graph
    }
}
