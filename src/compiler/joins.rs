//! Join requirements and the deduplicating merge.

use serde::Serialize;

use super::alias::Alias;
use super::{CompileError, CompileResult};

/// Which side of the foreign key the join traverses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JoinKind {
    ToOne,
    /// Multi-valued traversal: the join can fan rows out, and the execution
    /// layer regroups them using the plan's parent mapping.
    ToMany,
}

/// One required join edge: source occurrence, relation, target occurrence,
/// plus the ON columns the renderer needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JoinRequirement {
    pub source: Alias,
    pub relation: String,
    pub target: Alias,
    pub target_entity: String,
    pub kind: JoinKind,
    /// ON column on the source alias.
    pub source_column: String,
    /// ON column on the target alias.
    pub target_column: String,
}

/// Merge the per-stage join lists into one ordered, duplicate-free plan.
///
/// Each stage list is already deduplicated against the shared alias map,
/// so this is an assertion of those contracts rather than new resolution
/// logic: identical triples collapse, and two different requirements must
/// never land on the same target alias.
pub(crate) fn merge_joins(
    stages: Vec<Vec<JoinRequirement>>,
) -> CompileResult<Vec<JoinRequirement>> {
    let mut merged: Vec<JoinRequirement> = vec![];
    for stage in stages {
        for requirement in stage {
            if merged.iter().any(|existing| *existing == requirement) {
                continue;
            }
            if merged
                .iter()
                .any(|existing| existing.target == requirement.target)
            {
                return Err(CompileError::AliasConflict {
                    alias: requirement.target.to_string(),
                });
            }
            merged.push(requirement);
        }
    }
    Ok(merged)
}
