//! Request-to-query compiler - converts a field tree plus argument bag
//! into one immutable [`QueryPlan`].
//!
//! Five-stage pipeline, all sharing one per-compilation alias map:
//! 1. Selection planning: field tree → joins + projected columns
//! 2. Filter normalization: filter tree → joins + condition tree
//! 3. Join deduplication: merge stage join lists, assert alias invariants
//! 4. Order/pagination resolution: order paths, offset/limit, total count
//! 5. Plan assembly
//!
//! Compilation is synchronous and pure: every intermediate structure is
//! local to one `compile` call, so plans for concurrent requests compile
//! with zero shared state.

mod alias;
mod filter;
mod joins;
mod order;
mod plan;
mod selection;

pub use alias::{Alias, AliasAllocator};
pub use filter::{CompareOp, Comparison, ConditionTree};
pub use joins::{JoinKind, JoinRequirement};
pub use plan::{OrderByItem, Page, Projection, QueryPlan, TotalCount};

use thiserror::Error;

use crate::catalog::{Catalog, FieldType};
use crate::config::CompilerSettings;
use crate::request::{FieldTree, FilterOp, QueryArgs};

use alias::AliasMap;
use filter::FilterNormalizer;
use joins::merge_joins;
use order::{resolve_pagination, OrderResolver};
use selection::SelectionPlanner;

/// Errors that can occur during compilation.
///
/// All are pre-execution failures: a malformed request or a schema
/// mismatch, never a transient condition. No partial plan is ever
/// returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("Unknown entity: '{0}'")]
    UnknownEntity(String),

    #[error("Unknown relation '{relation}' on entity '{entity}'")]
    UnknownRelation { entity: String, relation: String },

    #[error("Unknown field '{field}' on entity '{entity}'")]
    UnknownField { entity: String, field: String },

    #[error("Operator '{op}' is not applicable to {field_type} field at '{path}'")]
    InvalidOperator {
        path: String,
        field_type: FieldType,
        op: FilterOp,
    },

    /// Internal invariant violation: two join requirements landed on the
    /// same target alias. Should be unreachable while the stage contracts
    /// hold.
    #[error("Alias conflict on '{alias}' in join plan")]
    AliasConflict { alias: String },

    #[error("Page numbers are 1-based, got {page}")]
    PageOutOfRange { page: u64 },

    #[error("Filter tree exceeds maximum depth of {max_depth}")]
    DepthExceeded { max_depth: usize },
}

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// The compiler. Borrows a read-only catalog; owns its settings.
pub struct QueryCompiler<'c> {
    catalog: &'c Catalog,
    settings: CompilerSettings,
}

impl<'c> QueryCompiler<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self {
            catalog,
            settings: CompilerSettings::default(),
        }
    }

    pub fn with_settings(catalog: &'c Catalog, settings: CompilerSettings) -> Self {
        Self { catalog, settings }
    }

    pub fn settings(&self) -> &CompilerSettings {
        &self.settings
    }

    /// Compile one request into a query plan.
    pub fn compile(
        &self,
        root: &str,
        tree: &FieldTree,
        args: &QueryArgs,
    ) -> CompileResult<QueryPlan> {
        let root_entity = self
            .catalog
            .entity(root)
            .ok_or_else(|| CompileError::UnknownEntity(root.to_string()))?;

        let mut aliases = AliasMap::new(&root_entity.name);

        let selection = SelectionPlanner::new(self.catalog).plan(tree, &mut aliases)?;

        let (filter_joins, condition) = match &args.filters {
            Some(node) => {
                let normalized = FilterNormalizer::new(self.catalog, self.settings.max_filter_depth)
                    .normalize(node, &mut aliases)?;
                (normalized.joins, Some(normalized.tree))
            }
            None => (vec![], None),
        };

        let order = OrderResolver::new(self.catalog).resolve(&args.order, &mut aliases)?;

        let joins = merge_joins(vec![selection.joins, filter_joins, order.joins])?;
        let (page, total) = resolve_pagination(args, &self.settings)?;

        Ok(QueryPlan {
            root_entity: root_entity.name.clone(),
            root_alias: aliases.root().alias,
            joins,
            projections: selection.projections,
            condition,
            order: order.order,
            page,
            total,
        })
    }
}
