//! Plan rendering - turns a compiled [`QueryPlan`] into SQL text.
//!
//! Projected columns are emitted as `alias.column AS alias__column`; the
//! output names are stable and the execution layer keys its regrouping on
//! them. An alias that projects nothing contributes a literal `1` so the
//! statement stays syntactically complete. When the plan asks for a
//! windowed total, `COUNT(*) OVER ()` rides along as `__total__`; the
//! zero-limit case gets a companion plain count statement instead.

use crate::catalog::Catalog;
use crate::compiler::{CompareOp, Comparison, ConditionTree, QueryPlan, TotalCount};
use crate::request::{FilterValue, SortDirection};

use super::dialect::Dialect;
use super::expr::{
    count_star, lit_bool, lit_float, lit_int, lit_null, lit_str, paren, table_col, window, Expr,
    ExprExt,
};
use super::query::{Select, SelectExpr, SortDir, TableRef};

/// Output column carrying the windowed total row count.
pub const TOTAL_COLUMN: &str = "__total__";

/// The rendered SQL for one plan.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedQuery {
    /// The main statement.
    pub sql: String,
    /// Companion `COUNT(*)` statement, present only when the plan's
    /// total-count marker requires a separate query.
    pub count_sql: Option<String>,
}

/// Render a plan against a dialect.
pub fn render_plan(plan: &QueryPlan, catalog: &Catalog, dialect: Dialect) -> RenderedQuery {
    let sql = build_select(plan, catalog).to_sql(dialect);
    let count_sql = match plan.total {
        Some(TotalCount::CountQuery) => Some(build_count(plan, catalog).to_sql(dialect)),
        _ => None,
    };
    RenderedQuery { sql, count_sql }
}

fn table_of(catalog: &Catalog, entity: &str) -> String {
    catalog
        .entity(entity)
        .map(|e| e.table.clone())
        .unwrap_or_else(|| entity.to_string())
}

/// FROM and JOIN clauses shared by the main and count statements.
fn base_select(plan: &QueryPlan, catalog: &Catalog) -> Select {
    let mut select = Select::new().from(
        TableRef::new(&table_of(catalog, &plan.root_entity)).with_alias(&plan.root_alias.to_string()),
    );
    for join in &plan.joins {
        select = select.left_join(
            TableRef::new(&table_of(catalog, &join.target_entity))
                .with_alias(&join.target.to_string()),
            table_col(&join.source.to_string(), &join.source_column)
                .eq(table_col(&join.target.to_string(), &join.target_column)),
        );
    }
    if let Some(condition) = &plan.condition {
        select = select.filter(condition_to_expr(condition));
    }
    select
}

fn build_select(plan: &QueryPlan, catalog: &Catalog) -> Select {
    let mut select = base_select(plan, catalog);

    for projection in &plan.projections {
        if projection.columns.is_empty() {
            select = select.column(lit_int(1));
            continue;
        }
        let alias = projection.alias.to_string();
        for column in &projection.columns {
            select = select.column(
                SelectExpr::new(table_col(&alias, column))
                    .with_alias(&format!("{}__{}", alias, column)),
            );
        }
    }

    if plan.total == Some(TotalCount::WindowedCount) {
        select = select.column(SelectExpr::new(window(count_star())).with_alias(TOTAL_COLUMN));
    }

    for item in &plan.order {
        let dir = match item.direction {
            SortDirection::Asc => SortDir::Asc,
            SortDirection::Desc => SortDir::Desc,
        };
        select = select.order_by(table_col(&item.alias.to_string(), &item.column), dir);
    }

    if let Some(page) = &plan.page {
        select = select.limit_offset(Some(page.limit), Some(page.offset));
    }

    select
}

fn build_count(plan: &QueryPlan, catalog: &Catalog) -> Select {
    base_select(plan, catalog).column(SelectExpr::new(count_star()).with_alias(TOTAL_COLUMN))
}

/// Condition tree to expression, preserving the logical nesting with
/// explicit parentheses around composite children.
fn condition_to_expr(tree: &ConditionTree) -> Expr {
    match tree {
        ConditionTree::And(children) => fold_logical(children, true),
        ConditionTree::Or(children) => fold_logical(children, false),
        ConditionTree::Not(child) => Expr::Not(Box::new(paren(condition_to_expr(child)))),
        ConditionTree::Compare(comparison) => comparison_to_expr(comparison),
    }
}

fn fold_logical(children: &[ConditionTree], is_and: bool) -> Expr {
    let mut exprs = children.iter().map(|child| {
        let expr = condition_to_expr(child);
        if matches!(child, ConditionTree::Compare(_)) {
            expr
        } else {
            paren(expr)
        }
    });
    let Some(first) = exprs.next() else {
        // An empty conjunction holds; an empty disjunction does not.
        return lit_bool(is_and);
    };
    exprs.fold(first, |acc, e| if is_and { acc.and(e) } else { acc.or(e) })
}

fn comparison_to_expr(comparison: &Comparison) -> Expr {
    let Comparison {
        alias,
        column,
        op,
        value,
    } = comparison;
    let lhs = table_col(&alias.to_string(), column);
    match op {
        CompareOp::Eq => lhs.eq(value_expr(value)),
        CompareOp::Ne => lhs.ne(value_expr(value)),
        CompareOp::Lt => lhs.lt(value_expr(value)),
        CompareOp::Lte => lhs.lte(value_expr(value)),
        CompareOp::Gt => lhs.gt(value_expr(value)),
        CompareOp::Gte => lhs.gte(value_expr(value)),
        CompareOp::In => {
            let values = match value {
                FilterValue::List(items) => items.iter().map(value_expr).collect(),
                other => vec![value_expr(other)],
            };
            lhs.in_list(values)
        }
        CompareOp::IsNull => lhs.is_null(),
        CompareOp::IsNotNull => lhs.is_not_null(),
        CompareOp::Contains => lhs.like(lit_str(&format!("%{}%", like_fragment(value)))),
    }
}

fn value_expr(value: &FilterValue) -> Expr {
    match value {
        FilterValue::Null => lit_null(),
        FilterValue::Bool(b) => lit_bool(*b),
        FilterValue::Int(i) => lit_int(*i),
        FilterValue::Float(f) => lit_float(*f),
        FilterValue::Str(s) => lit_str(s),
        // Lists outside IN and structured json both compare as their
        // serialized text.
        FilterValue::List(_) | FilterValue::Json(_) => {
            lit_str(&serde_json::to_string(value).unwrap_or_default())
        }
    }
}

fn like_fragment(value: &FilterValue) -> String {
    match value {
        FilterValue::Str(s) => s.clone(),
        FilterValue::Int(i) => i.to_string(),
        FilterValue::Float(f) => {
            let mut buffer = ryu::Buffer::new();
            buffer.format(*f).to_string()
        }
        FilterValue::Bool(b) => b.to_string(),
        FilterValue::Null | FilterValue::List(_) | FilterValue::Json(_) => String::new(),
    }
}
