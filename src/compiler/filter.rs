//! Filter normalization - rewrites the request's boolean filter tree into
//! an alias-bound condition tree, discovering joins along the way.
//!
//! This is the hardest stage: every leaf path may cross relations, and a
//! relation touched by both projection and filtering must resolve to the
//! single join the shared alias map already holds. The logical shape of
//! the input tree is preserved exactly.

use serde::Serialize;

use crate::catalog::{Catalog, FieldType, Member};
use crate::request::{FieldPath, FilterNode, FilterOp, FilterValue};

use super::alias::{Alias, AliasMap};
use super::joins::JoinRequirement;
use super::{CompileError, CompileResult};

/// Alias-bound comparison operator. `Is`/null-equality collapse into the
/// explicit null tests here, so the renderer never sees `= NULL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    In,
    IsNull,
    IsNotNull,
    Contains,
}

/// A resolved leaf comparison: column on a specific occurrence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub alias: Alias,
    pub column: String,
    pub op: CompareOp,
    pub value: FilterValue,
}

/// The compiler-internal counterpart of [`FilterNode`]: same logical
/// shape, leaves bound to (alias, column).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionTree {
    And(Vec<ConditionTree>),
    Or(Vec<ConditionTree>),
    Not(Box<ConditionTree>),
    Compare(Comparison),
}

pub(crate) struct FilterPlan {
    pub joins: Vec<JoinRequirement>,
    pub tree: ConditionTree,
}

pub(crate) struct FilterNormalizer<'c> {
    catalog: &'c Catalog,
    max_depth: usize,
}

impl<'c> FilterNormalizer<'c> {
    pub fn new(catalog: &'c Catalog, max_depth: usize) -> Self {
        Self { catalog, max_depth }
    }

    pub fn normalize(
        &self,
        node: &FilterNode,
        aliases: &mut AliasMap,
    ) -> CompileResult<FilterPlan> {
        let mut joins = vec![];
        let tree = self.normalize_node(node, 0, aliases, &mut joins)?;
        Ok(FilterPlan { joins, tree })
    }

    fn normalize_node(
        &self,
        node: &FilterNode,
        depth: usize,
        aliases: &mut AliasMap,
        joins: &mut Vec<JoinRequirement>,
    ) -> CompileResult<ConditionTree> {
        if depth > self.max_depth {
            return Err(CompileError::DepthExceeded {
                max_depth: self.max_depth,
            });
        }
        match node {
            FilterNode::And(children) => Ok(ConditionTree::And(
                children
                    .iter()
                    .map(|c| self.normalize_node(c, depth + 1, aliases, joins))
                    .collect::<CompileResult<_>>()?,
            )),
            FilterNode::Or(children) => Ok(ConditionTree::Or(
                children
                    .iter()
                    .map(|c| self.normalize_node(c, depth + 1, aliases, joins))
                    .collect::<CompileResult<_>>()?,
            )),
            FilterNode::Not(child) => Ok(ConditionTree::Not(Box::new(self.normalize_node(
                child,
                depth + 1,
                aliases,
                joins,
            )?))),
            FilterNode::Leaf { path, op, value } => {
                self.normalize_leaf(path, *op, value, aliases, joins)
            }
        }
    }

    fn normalize_leaf(
        &self,
        path: &FieldPath,
        op: FilterOp,
        value: &FilterValue,
        aliases: &mut AliasMap,
        joins: &mut Vec<JoinRequirement>,
    ) -> CompileResult<ConditionTree> {
        let bound = aliases.resolve(self.catalog, joins, path.relations())?;
        let entity = self
            .catalog
            .entity(&bound.entity)
            .ok_or_else(|| CompileError::UnknownEntity(bound.entity.clone()))?;

        let (column, field_type) = match entity.member(path.field()) {
            Some(Member::Scalar(field)) => (field.name.clone(), field.field_type),
            // Comparing against a to-one relation compares its foreign key.
            Some(Member::ToOne(rel)) => {
                (rel.fk_column().to_string(), self.key_type(rel.target()))
            }
            _ => {
                return Err(CompileError::UnknownField {
                    entity: entity.name.clone(),
                    field: path.field().to_string(),
                })
            }
        };

        let op = resolve_op(path, op, field_type, value)?;
        Ok(ConditionTree::Compare(Comparison {
            alias: bound.alias,
            column,
            op,
            value: value.clone(),
        }))
    }

    fn key_type(&self, entity: &str) -> FieldType {
        self.catalog
            .entity(entity)
            .and_then(|e| e.scalar(&e.key_column))
            .map(|f| f.field_type)
            .unwrap_or(FieldType::Int)
    }
}

/// Map a wire operator onto its alias-bound form, rejecting combinations
/// the field's semantic type cannot support.
fn resolve_op(
    path: &FieldPath,
    op: FilterOp,
    field_type: FieldType,
    value: &FilterValue,
) -> CompileResult<CompareOp> {
    let invalid = || CompileError::InvalidOperator {
        path: path.to_string(),
        field_type,
        op,
    };
    let null = matches!(value, FilterValue::Null);
    match op {
        // `= NULL` never matches under SQL semantics; equality with a null
        // value must become an explicit null test.
        FilterOp::Eq if null => Ok(CompareOp::IsNull),
        FilterOp::Ne if null => Ok(CompareOp::IsNotNull),
        FilterOp::Eq => Ok(CompareOp::Eq),
        FilterOp::Ne => Ok(CompareOp::Ne),
        FilterOp::Lt | FilterOp::Lte | FilterOp::Gt | FilterOp::Gte if !field_type.is_ordered() => {
            Err(invalid())
        }
        FilterOp::Lt => Ok(CompareOp::Lt),
        FilterOp::Lte => Ok(CompareOp::Lte),
        FilterOp::Gt => Ok(CompareOp::Gt),
        FilterOp::Gte => Ok(CompareOp::Gte),
        FilterOp::In => {
            if field_type.is_discrete() && matches!(value, FilterValue::List(_)) {
                Ok(CompareOp::In)
            } else {
                Err(invalid())
            }
        }
        FilterOp::Is => {
            if null {
                Ok(CompareOp::IsNull)
            } else {
                Err(invalid())
            }
        }
        FilterOp::Contains => {
            if field_type.is_textual() {
                Ok(CompareOp::Contains)
            } else {
                Err(invalid())
            }
        }
    }
}
