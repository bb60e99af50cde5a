//! Selection planning - turns the requested field tree into joins and
//! projected columns.
//!
//! The walk allocates one alias per tree node, emits a join requirement
//! per relation edge, and records the scalar columns each alias must
//! project. Nodes that request nothing still get a projection entry so
//! plan assembly can substitute a constant for them.

use crate::catalog::{Catalog, Member};
use crate::request::FieldTree;

use super::alias::{AliasMap, Bound};
use super::joins::JoinRequirement;
use super::plan::Projection;
use super::{CompileError, CompileResult};

pub(crate) struct SelectionPlan {
    pub joins: Vec<JoinRequirement>,
    pub projections: Vec<Projection>,
}

pub(crate) struct SelectionPlanner<'c> {
    catalog: &'c Catalog,
}

impl<'c> SelectionPlanner<'c> {
    pub fn new(catalog: &'c Catalog) -> Self {
        Self { catalog }
    }

    pub fn plan(&self, tree: &FieldTree, aliases: &mut AliasMap) -> CompileResult<SelectionPlan> {
        let mut plan = SelectionPlan {
            joins: vec![],
            projections: vec![],
        };
        let root = aliases.root().clone();
        let mut path = vec![];
        self.visit(&root, &mut path, tree, aliases, &mut plan)?;
        Ok(plan)
    }

    fn visit(
        &self,
        bound: &Bound,
        path: &mut Vec<String>,
        tree: &FieldTree,
        aliases: &mut AliasMap,
        plan: &mut SelectionPlan,
    ) -> CompileResult<()> {
        let entity = self
            .catalog
            .entity(&bound.entity)
            .ok_or_else(|| CompileError::UnknownEntity(bound.entity.clone()))?;

        let slot = record_alias(&mut plan.projections, bound);
        for name in &tree.fields {
            let column = match entity.member(name) {
                Some(Member::Scalar(field)) => field.name.clone(),
                // A to-one relation requested as a plain field projects its
                // foreign key column.
                Some(Member::ToOne(rel)) => rel.fk_column().to_string(),
                _ => {
                    return Err(CompileError::UnknownField {
                        entity: entity.name.clone(),
                        field: name.clone(),
                    })
                }
            };
            let columns = &mut plan.projections[slot].columns;
            if !columns.contains(&column) {
                columns.push(column);
            }
        }

        for child in &tree.children {
            path.push(child.relation.clone());
            let child_bound = aliases.resolve(self.catalog, &mut plan.joins, path)?;
            self.visit(&child_bound, path, &child.tree, aliases, plan)?;
            path.pop();
        }
        Ok(())
    }
}

/// Find or create the projection entry for an alias, returning its index.
fn record_alias(projections: &mut Vec<Projection>, bound: &Bound) -> usize {
    if let Some(pos) = projections.iter().position(|p| p.alias == bound.alias) {
        return pos;
    }
    projections.push(Projection {
        alias: bound.alias,
        entity: bound.entity.clone(),
        columns: vec![],
    });
    projections.len() - 1
}
