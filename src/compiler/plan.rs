//! The compiled query plan - the sole output of the compiler.
//!
//! A plan is created fresh per request, handed read-only to the execution
//! layer, and discarded after execution. It carries everything needed to
//! emit one relational query: joins, per-alias projections, the condition
//! tree, ordering, pagination and the total-count marker, plus the
//! alias-parent mapping the execution layer uses to regroup fan-out rows
//! back into the requested nested shape.

use serde::Serialize;

use super::alias::Alias;
use super::filter::ConditionTree;
use super::joins::JoinRequirement;
use crate::request::SortDirection;

/// Scalar columns projected for one alias.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub alias: Alias,
    pub entity: String,
    /// May be empty; the renderer substitutes a constant so the query
    /// stays syntactically complete.
    pub columns: Vec<String>,
}

/// One resolved order key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderByItem {
    pub alias: Alias,
    pub column: String,
    pub direction: SortDirection,
}

/// Offset/limit window, computed from 1-based page arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Page {
    pub offset: u64,
    pub limit: u64,
}

/// How the unpaginated total row count is obtained.
///
/// Exactly one mechanism is ever active. The windowed count rides along
/// with the result rows; the companion count query exists only for the
/// zero-limit case, where no rows come back to carry a window value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TotalCount {
    WindowedCount,
    CountQuery,
}

/// The compiled, immutable query plan.
#[derive(Debug, Clone, Serialize)]
pub struct QueryPlan {
    pub root_entity: String,
    pub root_alias: Alias,
    /// Ordered, duplicate-free join plan.
    pub joins: Vec<JoinRequirement>,
    /// Per-alias projected columns, in tree order (root first).
    pub projections: Vec<Projection>,
    pub condition: Option<ConditionTree>,
    pub order: Vec<OrderByItem>,
    pub page: Option<Page>,
    pub total: Option<TotalCount>,
}

impl QueryPlan {
    /// The alias this alias was joined from, or `None` for the root.
    pub fn parent_of(&self, alias: Alias) -> Option<Alias> {
        self.joins
            .iter()
            .find(|j| j.target == alias)
            .map(|j| j.source)
    }

    /// The entity an alias stands for.
    pub fn entity_of(&self, alias: Alias) -> Option<&str> {
        if alias == self.root_alias {
            return Some(&self.root_entity);
        }
        self.joins
            .iter()
            .find(|j| j.target == alias)
            .map(|j| j.target_entity.as_str())
    }

    /// The projection entry for an alias, if it projects anything.
    pub fn projection(&self, alias: Alias) -> Option<&Projection> {
        self.projections.iter().find(|p| p.alias == alias)
    }
}
