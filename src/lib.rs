//! # Trellis
//!
//! Compiles nested entity requests into single relational queries.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │            Request (transport layer, external)           │
//! │        (field tree + filters/order/pagination)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [selection planner]
//! ┌─────────────────────────────────────────────────────────┐
//! │            Joins + Projections (alias-bound)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [filter normalizer / order resolver]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Condition Tree + Order + Pagination + Total       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [join dedup + plan assembly]
//! ┌─────────────────────────────────────────────────────────┐
//! │                      QueryPlan                           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [renderer]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    SQL Statement                         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Compilation reads a [`catalog::Catalog`] (built once at startup) and is
//! pure: each call owns all of its intermediate state, so concurrent
//! requests compile independently with no locking.

pub mod catalog;
pub mod compiler;
pub mod config;
pub mod request;
pub mod sql;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{
        Catalog, CatalogBuilder, CatalogError, Entity, FieldType, Member, Relation, ScalarField,
    };
    pub use crate::compiler::{
        Alias, CompileError, CompileResult, ConditionTree, JoinKind, JoinRequirement, QueryCompiler,
        QueryPlan, TotalCount,
    };
    pub use crate::config::CompilerSettings;
    pub use crate::request::{
        FieldPath, FieldTree, FilterNode, FilterOp, FilterValue, OrderKey, QueryArgs, SortDirection,
    };
    pub use crate::sql::{render_plan, Dialect, RenderedQuery, SqlDialect, TOTAL_COLUMN};
}

// Also export the main entry points at the crate root for convenience
pub use catalog::{Catalog, CatalogBuilder};
pub use compiler::{CompileError, QueryCompiler, QueryPlan};
pub use request::{FieldTree, QueryArgs};
pub use sql::{render_plan, Dialect, RenderedQuery};
