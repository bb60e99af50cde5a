//! Catalog construction and startup-time validation.
//!
//! Malformed schemas are a startup concern: the builder rejects them here
//! so the compiler never has to re-check catalog invariants per request.

use petgraph::graph::DiGraph;
use std::collections::HashMap;
use thiserror::Error;

use super::entity::{Entity, Relation};
use super::{Catalog, RelationEdge};

/// Result type for catalog construction.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Errors raised while building a catalog.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatalogError {
    #[error("Duplicate entity: '{0}'")]
    DuplicateEntity(String),

    #[error("Duplicate member '{name}' on entity '{entity}'")]
    DuplicateMember { entity: String, name: String },

    #[error("Key column '{key}' of entity '{entity}' is not a declared field")]
    UnknownKey { entity: String, key: String },

    #[error("Relation '{relation}' on entity '{entity}' targets unknown entity '{target}'")]
    UnknownTarget {
        entity: String,
        relation: String,
        target: String,
    },

    #[error(
        "To-many relation '{relation}' on entity '{entity}' has no backing \
         foreign key '{fk}' on '{target}'"
    )]
    DanglingInverse {
        entity: String,
        relation: String,
        target: String,
        fk: String,
    },

    #[error(
        "To-one relation '{relation}' on entity '{entity}' has more than one \
         inverse on '{target}'"
    )]
    AmbiguousInverse {
        entity: String,
        relation: String,
        target: String,
    },

    #[error(
        "Cannot synthesize inverse '{inverse}' on entity '{target}' for \
         relation '{relation}' on '{entity}': the name is taken"
    )]
    InverseCollision {
        entity: String,
        relation: String,
        target: String,
        inverse: String,
    },
}

/// Builder for [`Catalog`]. Register entities, then `build()` validates and
/// freezes the schema.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    entities: Vec<Entity>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity: Entity) -> Self {
        self.entities.push(entity);
        self
    }

    /// Validate and build the catalog.
    ///
    /// Checks, in order: entity name uniqueness, member name uniqueness and
    /// key declaration per entity, relation target existence, and inverse
    /// pairing. Every to-one relation must end up with exactly one inverse
    /// to-many on its target; a missing inverse is synthesized as
    /// `<source>_set` (the implicit backref convention).
    pub fn build(self) -> CatalogResult<Catalog> {
        let mut entities = self.entities;

        for entity in &mut entities {
            if entity.table.is_empty() {
                entity.table = entity.name.clone();
            }
        }

        check_entity_names(&entities)?;
        for entity in &entities {
            check_members(entity)?;
        }
        check_targets(&entities)?;
        check_declared_inverses(&entities)?;
        synthesize_inverses(&mut entities)?;

        let mut graph = DiGraph::new();
        let mut entity_index = HashMap::new();
        for entity in entities {
            let name = entity.name.clone();
            let idx = graph.add_node(entity);
            entity_index.insert(name, idx);
        }
        // Edges can only be added once every node exists.
        let nodes: Vec<_> = graph.node_indices().collect();
        for idx in nodes {
            let edges: Vec<_> = graph[idx]
                .relations
                .iter()
                .map(|r| {
                    (
                        entity_index[r.target()],
                        RelationEdge {
                            relation: r.name().to_string(),
                            many: r.is_many(),
                        },
                    )
                })
                .collect();
            for (target, edge) in edges {
                graph.add_edge(idx, target, edge);
            }
        }

        Ok(Catalog::from_parts(graph, entity_index))
    }
}

fn check_entity_names(entities: &[Entity]) -> CatalogResult<()> {
    let mut seen = HashMap::new();
    for entity in entities {
        if seen.insert(entity.name.as_str(), ()).is_some() {
            return Err(CatalogError::DuplicateEntity(entity.name.clone()));
        }
    }
    Ok(())
}

fn check_members(entity: &Entity) -> CatalogResult<()> {
    let mut seen = HashMap::new();
    for field in &entity.fields {
        if seen.insert(field.name.as_str(), ()).is_some() {
            return Err(CatalogError::DuplicateMember {
                entity: entity.name.clone(),
                name: field.name.clone(),
            });
        }
    }
    for relation in &entity.relations {
        if seen.insert(relation.name(), ()).is_some() {
            return Err(CatalogError::DuplicateMember {
                entity: entity.name.clone(),
                name: relation.name().to_string(),
            });
        }
    }
    if entity.scalar(&entity.key_column).is_none() {
        return Err(CatalogError::UnknownKey {
            entity: entity.name.clone(),
            key: entity.key_column.clone(),
        });
    }
    Ok(())
}

fn check_targets(entities: &[Entity]) -> CatalogResult<()> {
    for entity in entities {
        for relation in &entity.relations {
            if !entities.iter().any(|e| e.name == relation.target()) {
                return Err(CatalogError::UnknownTarget {
                    entity: entity.name.clone(),
                    relation: relation.name().to_string(),
                    target: relation.target().to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Every declared to-many must be backed by a to-one holding the named
/// foreign key on its target.
fn check_declared_inverses(entities: &[Entity]) -> CatalogResult<()> {
    for entity in entities {
        for relation in &entity.relations {
            let Relation::ToMany {
                name,
                target,
                fk_column,
            } = relation
            else {
                continue;
            };
            let target_entity = entities
                .iter()
                .find(|e| &e.name == target)
                .expect("targets checked before inverses");
            let backed = target_entity.relations.iter().any(|r| {
                matches!(r, Relation::ToOne { target: t, fk_column: fk, .. }
                         if t == &entity.name && fk == fk_column)
            });
            if !backed {
                return Err(CatalogError::DanglingInverse {
                    entity: entity.name.clone(),
                    relation: name.clone(),
                    target: target.clone(),
                    fk: fk_column.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Pair every to-one with exactly one inverse to-many, synthesizing
/// `<source>_set` when none was declared.
fn synthesize_inverses(entities: &mut Vec<Entity>) -> CatalogResult<()> {
    let mut additions: Vec<(String, Relation)> = vec![];

    for entity in entities.iter() {
        for relation in &entity.relations {
            let Relation::ToOne {
                name,
                target,
                fk_column,
                ..
            } = relation
            else {
                continue;
            };
            let target_entity = entities
                .iter()
                .find(|e| &e.name == target)
                .expect("targets checked before inverses");
            let inverses: Vec<_> = target_entity
                .relations
                .iter()
                .filter(|r| {
                    matches!(r, Relation::ToMany { target: t, fk_column: fk, .. }
                             if t == &entity.name && fk == fk_column)
                })
                .collect();
            match inverses.len() {
                1 => {}
                0 => {
                    let inverse = format!("{}_set", entity.name);
                    if target_entity.member(&inverse).is_some()
                        || additions
                            .iter()
                            .any(|(e, r)| e == target && r.name() == inverse)
                    {
                        return Err(CatalogError::InverseCollision {
                            entity: entity.name.clone(),
                            relation: name.clone(),
                            target: target.clone(),
                            inverse,
                        });
                    }
                    additions.push((
                        target.clone(),
                        Relation::to_many(&inverse, &entity.name, fk_column),
                    ));
                }
                _ => {
                    return Err(CatalogError::AmbiguousInverse {
                        entity: entity.name.clone(),
                        relation: name.clone(),
                        target: target.clone(),
                    });
                }
            }
        }
    }

    for (target, relation) in additions {
        let entity = entities
            .iter_mut()
            .find(|e| e.name == target)
            .expect("synthesized inverse targets a known entity");
        entity.relations.push(relation);
    }
    Ok(())
}
