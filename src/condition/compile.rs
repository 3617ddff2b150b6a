/*!
 * Condition Resolution
 * Turns stored, id-linked conditions into evaluation trees
 *
 * Resolution is where forward-compatibility and integrity are enforced:
 * unrecognized variants, dangling children, cycles and excessive nesting are
 * all reported here, so evaluation itself can stay total.
 */

use super::types::{ConditionExpr, ConditionKind};
use crate::core::{CompileError, ConditionId, Definition, ObjectKind};
use crate::store::ConditionRepository;

/// Resolves condition ids against a repository
pub struct ConditionResolver<'a> {
    repository: &'a dyn ConditionRepository,
    max_depth: usize,
    pending: Option<(&'a ConditionId, &'a ConditionKind)>,
}

impl<'a> ConditionResolver<'a> {
    pub fn new(repository: &'a dyn ConditionRepository, max_depth: usize) -> Self {
        Self {
            repository,
            max_depth,
            pending: None,
        }
    }

    /// Resolve as if `id` were already stored with `kind`
    ///
    /// Lets a replacement be checked against every condition that embeds it
    /// before anything is written.
    pub fn with_pending(mut self, id: &'a ConditionId, kind: &'a ConditionKind) -> Self {
        self.pending = Some((id, kind));
        self
    }

    /// Resolve a stored condition
    pub fn resolve(&self, id: &ConditionId) -> Result<ConditionExpr, CompileError> {
        let mut path = Vec::new();
        self.resolve_at(id, &mut path)
    }

    /// Resolve a definition that is about to be stored under `id`
    ///
    /// Children are looked up in the repository; a child chain leading back
    /// to `id` is reported as a cycle.
    pub fn resolve_kind(
        &self,
        id: &ConditionId,
        kind: &ConditionKind,
    ) -> Result<ConditionExpr, CompileError> {
        let mut path = vec![id.clone()];
        self.build(kind, &mut path)
    }

    fn resolve_at(
        &self,
        id: &ConditionId,
        path: &mut Vec<ConditionId>,
    ) -> Result<ConditionExpr, CompileError> {
        if path.contains(id) {
            return Err(CompileError::Cycle(id.clone()));
        }
        if path.len() >= self.max_depth {
            return Err(CompileError::TooDeep {
                id: path.first().cloned().unwrap_or_else(|| id.clone()),
                limit: self.max_depth,
            });
        }

        let stored;
        let kind = match self.pending {
            Some((pending_id, kind)) if pending_id == id => kind,
            _ => {
                stored = self
                    .repository
                    .find_by_id(id)?
                    .ok_or_else(|| CompileError::Dangling {
                        kind: ObjectKind::Condition,
                        id: id.to_string(),
                    })?;
                match &stored.definition {
                    Definition::Known(kind) => kind,
                    unknown @ Definition::Unrecognized(_) => {
                        return Err(CompileError::UnknownCondition {
                            id: id.clone(),
                            variant: unknown.unrecognized_tag().unwrap_or_default(),
                        })
                    }
                }
            }
        };

        path.push(id.clone());
        let expr = self.build(kind, path);
        path.pop();
        expr
    }

    fn build(
        &self,
        kind: &ConditionKind,
        path: &mut Vec<ConditionId>,
    ) -> Result<ConditionExpr, CompileError> {
        Ok(match kind {
            ConditionKind::Always { value } => ConditionExpr::Always(*value),
            ConditionKind::Equals { attribute, value } => ConditionExpr::Equals {
                attribute: attribute.clone(),
                value: value.clone(),
            },
            ConditionKind::AttributeCompare {
                attribute,
                op,
                value,
            } => ConditionExpr::Compare {
                attribute: attribute.clone(),
                op: *op,
                value: value.clone(),
            },
            ConditionKind::Exists { attribute } => ConditionExpr::Exists(attribute.clone()),
            ConditionKind::TimeWindow {
                not_before,
                not_after,
            } => ConditionExpr::TimeWindow {
                not_before: *not_before,
                not_after: *not_after,
            },
            ConditionKind::All { conditions } => ConditionExpr::All(
                conditions
                    .iter()
                    .map(|child| self.resolve_at(child, path))
                    .collect::<Result<_, _>>()?,
            ),
            ConditionKind::Any { conditions } => ConditionExpr::Any(
                conditions
                    .iter()
                    .map(|child| self.resolve_at(child, path))
                    .collect::<Result<_, _>>()?,
            ),
            ConditionKind::Not { condition } => {
                ConditionExpr::Not(Box::new(self.resolve_at(condition, path)?))
            }
        })
    }
}
