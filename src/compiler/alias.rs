//! Alias allocation - occurrence identity for entities within one query.
//!
//! Every compilation owns its own allocator and alias map; nothing here is
//! shared across calls. The map is keyed by the relation path from the
//! root, so the same entity reached twice over different paths gets two
//! aliases, while the same path always resolves to the same alias.

use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::catalog::{Catalog, Member, Relation};

use super::joins::{JoinKind, JoinRequirement};
use super::{CompileError, CompileResult};

/// An opaque handle for one occurrence of an entity in a compiled query.
///
/// Displays as `t0`, `t1`, ... - the form the SQL renderer uses verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Alias(u32);

impl Alias {
    pub fn index(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for Alias {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "t{}", self.0)
    }
}

impl Serialize for Alias {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

/// Hands out a fresh alias on every call. Local to one compilation.
#[derive(Debug, Default)]
pub struct AliasAllocator {
    next: u32,
}

impl AliasAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self) -> Alias {
        let alias = Alias(self.next);
        self.next += 1;
        alias
    }
}

/// An alias bound to the entity it stands for.
#[derive(Debug, Clone)]
pub(crate) struct Bound {
    pub alias: Alias,
    pub entity: String,
}

/// The per-compilation alias map, shared across selection planning, filter
/// normalization and order resolution so that a relation path is joined at
/// most once no matter which stage touches it first.
#[derive(Debug)]
pub(crate) struct AliasMap {
    allocator: AliasAllocator,
    root: Bound,
    bound: HashMap<Vec<String>, Bound>,
}

impl AliasMap {
    /// Seed the map with a root alias for the target entity.
    pub fn new(root_entity: &str) -> Self {
        let mut allocator = AliasAllocator::new();
        let root = Bound {
            alias: allocator.alloc(),
            entity: root_entity.to_string(),
        };
        Self {
            allocator,
            root,
            bound: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Bound {
        &self.root
    }

    /// Resolve a relation path from the root, reusing already-bound aliases
    /// and extending the join list for segments seen for the first time.
    ///
    /// This is the single traversal primitive every stage goes through, so
    /// a path requested for projection, filtering and ordering still maps
    /// to one join per edge.
    pub fn resolve(
        &mut self,
        catalog: &Catalog,
        joins: &mut Vec<JoinRequirement>,
        relations: &[String],
    ) -> CompileResult<Bound> {
        let mut current = self.root.clone();
        for depth in 0..relations.len() {
            let key = &relations[..=depth];
            if let Some(bound) = self.bound.get(key) {
                current = bound.clone();
                continue;
            }

            let segment = &relations[depth];
            let entity = catalog.entity(&current.entity).ok_or_else(|| {
                CompileError::UnknownRelation {
                    entity: current.entity.clone(),
                    relation: segment.clone(),
                }
            })?;
            let relation = match entity.member(segment) {
                Some(Member::ToOne(rel)) | Some(Member::ToMany(rel)) => rel,
                _ => {
                    return Err(CompileError::UnknownRelation {
                        entity: entity.name.clone(),
                        relation: segment.clone(),
                    })
                }
            };
            let target = catalog.entity(relation.target()).ok_or_else(|| {
                CompileError::UnknownRelation {
                    entity: entity.name.clone(),
                    relation: segment.clone(),
                }
            })?;

            let bound = Bound {
                alias: self.allocator.alloc(),
                entity: target.name.clone(),
            };
            let (kind, source_column, target_column) = match relation {
                Relation::ToOne { fk_column, .. } => (
                    JoinKind::ToOne,
                    fk_column.clone(),
                    target.key_column.clone(),
                ),
                Relation::ToMany { fk_column, .. } => {
                    (JoinKind::ToMany, entity.key_column.clone(), fk_column.clone())
                }
            };
            joins.push(JoinRequirement {
                source: current.alias,
                relation: segment.clone(),
                target: bound.alias,
                target_entity: bound.entity.clone(),
                kind,
                source_column,
                target_column,
            });
            self.bound.insert(key.to_vec(), bound.clone());
            current = bound;
        }
        Ok(current)
    }
}
