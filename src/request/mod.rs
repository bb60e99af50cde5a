//! Request types - the pre-parsed inputs handed over by the transport layer.
//!
//! The compiler consumes a [`FieldTree`] (what nested shape the client
//! asked for) and a [`QueryArgs`] bag (how to filter, order and slice it).
//! Both are immutable values; nothing here touches the catalog.

mod filter;
mod path;

pub use filter::{FilterNode, FilterOp, FilterValue};
pub use path::{FieldPath, FilterKey, OrderKey, SortDirection, DESC_MARKER, PATH_DELIMITER};

use serde::{Deserialize, Serialize};

/// The requested field shape for one entity occurrence: scalar field names
/// plus child trees keyed by relation name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldTree {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub children: Vec<ChildSelection>,
}

/// One requested relation edge and the subtree below it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSelection {
    pub relation: String,
    pub tree: FieldTree,
}

impl FieldTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.push(name.into());
        self
    }

    pub fn child(mut self, relation: &str, tree: FieldTree) -> Self {
        self.children.push(ChildSelection {
            relation: relation.into(),
            tree,
        });
        self
    }

    /// True when nothing at all was selected here.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.children.is_empty()
    }
}

/// The argument bag: filters, ordering and pagination for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryArgs {
    pub filters: Option<FilterNode>,
    pub order: Vec<OrderKey>,
    /// 1-based page number. Pagination applies only when both `page` and
    /// `page_size` are present.
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    /// Ask for the unpaginated total row count even without pagination.
    pub with_total: bool,
}

impl QueryArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filters(mut self, filters: FilterNode) -> Self {
        self.filters = Some(filters);
        self
    }

    pub fn order(mut self, key: OrderKey) -> Self {
        self.order.push(key);
        self
    }

    pub fn paginate(mut self, page: u64, page_size: u64) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    pub fn with_total(mut self) -> Self {
        self.with_total = true;
        self
    }
}
