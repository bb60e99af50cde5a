//! Order and pagination resolution.
//!
//! Order keys use the same path syntax as filters and resolve through the
//! same alias map, so ordering by a not-yet-joined relation extends the
//! join plan rather than duplicating it.

use crate::catalog::{Catalog, Member};
use crate::config::CompilerSettings;
use crate::request::{OrderKey, QueryArgs};

use super::alias::AliasMap;
use super::joins::JoinRequirement;
use super::plan::{OrderByItem, Page, TotalCount};
use super::{CompileError, CompileResult};

pub(crate) struct OrderPlan {
    pub joins: Vec<JoinRequirement>,
    pub order: Vec<OrderByItem>,
}

pub(crate) struct OrderResolver<'c> {
    catalog: &'c Catalog,
}

impl<'c> OrderResolver<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn resolve(&self, keys: &[OrderKey], aliases: &mut AliasMap) -> CompileResult<OrderPlan> {
        let mut plan = OrderPlan {
            joins: vec![],
            order: vec![],
        };
        for key in keys {
            let bound = aliases.resolve(self.catalog, &mut plan.joins, key.path.relations())?;
            let entity = self
                .catalog
                .entity(&bound.entity)
                .ok_or_else(|| CompileError::UnknownEntity(bound.entity.clone()))?;
            let column = match entity.member(key.path.field()) {
                Some(Member::Scalar(field)) => field.name.clone(),
                Some(Member::ToOne(rel)) => rel.fk_column().to_string(),
                _ => {
                    return Err(CompileError::UnknownField {
                        entity: entity.name.clone(),
                        field: key.path.field().to_string(),
                    })
                }
            };
            plan.order.push(OrderByItem {
                alias: bound.alias,
                column,
                direction: key.direction,
            });
        }
        Ok(plan)
    }
}

/// Compute the offset/limit window and the total-count marker.
///
/// Pagination applies only when both page and page size are present; the
/// page number is 1-based. The total is requested by pagination itself or
/// by an explicit `with_total`, and must be independent of the window -
/// a size-zero page returns no rows to carry a windowed value, so that
/// case switches to the companion count query.
pub(crate) fn resolve_pagination(
    args: &QueryArgs,
    settings: &CompilerSettings,
) -> CompileResult<(Option<Page>, Option<TotalCount>)> {
    let page = match (args.page, args.page_size) {
        (Some(page), Some(size)) => {
            if page == 0 {
                return Err(CompileError::PageOutOfRange { page });
            }
            let size = match settings.max_page_size {
                Some(max) => size.min(max),
                None => size,
            };
            Some(Page {
                offset: (page - 1) * size,
                limit: size,
            })
        }
        _ => None,
    };

    let total = if page.is_some() || args.with_total {
        match page {
            Some(p) if p.limit == 0 => Some(TotalCount::CountQuery),
            _ => Some(TotalCount::WindowedCount),
        }
    } else {
        None
    };

    Ok((page, total))
}
