/*!
 * Condition Management
 *
 * Composite conditions reference children by id. Creation and replacement
 * resolve the full tree, so dangling children, cycles and excessive nesting
 * never reach the store.
 */

use super::{duplicate_name, store_error, PolicyRegistry};
use crate::authz::ensure_can_manage;
use crate::condition::{Condition, ConditionDraft};
use crate::core::{ConditionId, ObjectKind, PolicyError, PolicyResult, SubjectId};
use std::collections::BTreeSet;
use tracing::{info, instrument, warn};

impl PolicyRegistry {
    /// Conditions owned by the subject
    #[instrument(skip(self), fields(subject = %subject))]
    pub fn list_conditions(&self, subject: &SubjectId) -> PolicyResult<Vec<Condition>> {
        self.resolve_subject(subject)?;
        Ok(self.repositories.conditions.find_by_owner(subject)?)
    }

    #[instrument(skip(self), fields(subject = %subject, condition = %id))]
    pub fn get_condition(&self, subject: &SubjectId, id: &ConditionId) -> PolicyResult<Condition> {
        self.resolve_subject(subject)?;
        let condition = self.load_condition(id)?;
        ensure_can_manage(subject, &condition)?;
        Ok(condition)
    }

    #[instrument(skip_all, fields(subject = %owner, name = %draft.name))]
    pub fn create_condition(
        &self,
        owner: &SubjectId,
        draft: ConditionDraft,
    ) -> PolicyResult<Condition> {
        self.resolve_subject(owner)?;
        draft.validate()?;

        let _gate = self.write_gate.lock();
        if self.repositories.conditions.exists_by_name(&draft.name)? {
            return Err(duplicate_name(ObjectKind::Condition, draft.name));
        }

        let id = ConditionId::generate();
        self.condition_resolver().resolve_kind(&id, &draft.definition)?;

        let condition = self
            .repositories
            .conditions
            .save(draft.into_condition(id, owner.clone()))
            .map_err(|err| store_error(ObjectKind::Condition, err))?;
        self.repositories.policies.bump();
        info!(condition = %condition.id, "Condition created");
        Ok(condition)
    }

    /// Replace a condition as a whole
    ///
    /// The new definition is resolved together with every condition that
    /// embeds it before anything is written; if any of them would become
    /// cyclic or too deep the store is left untouched.
    #[instrument(skip_all, fields(subject = %subject, condition = %id))]
    pub fn replace_condition(
        &self,
        subject: &SubjectId,
        id: &ConditionId,
        draft: ConditionDraft,
    ) -> PolicyResult<Condition> {
        self.resolve_subject(subject)?;
        draft.validate()?;

        let _gate = self.write_gate.lock();
        let existing = self.load_condition(id)?;
        ensure_can_manage(subject, &existing)?;

        if existing.name != draft.name && self.repositories.conditions.exists_by_name(&draft.name)? {
            return Err(duplicate_name(ObjectKind::Condition, draft.name));
        }

        {
            let resolver = self.condition_resolver().with_pending(id, &draft.definition);
            resolver.resolve(id)?;
            for dependent in self.condition_dependents(id)? {
                if let Err(err) = resolver.resolve(&dependent) {
                    warn!(dependent = %dependent, error = %err, "Replacement would break a dependent condition");
                    return Err(err.into());
                }
            }
        }

        let condition = self
            .repositories
            .conditions
            .replace(draft.into_condition(id.clone(), existing.owner))
            .map_err(|err| store_error(ObjectKind::Condition, err))?;
        self.repositories.policies.bump();
        info!("Condition replaced");
        Ok(condition)
    }

    /// Delete a condition no policy or composite condition references
    #[instrument(skip(self), fields(subject = %subject, condition = %id))]
    pub fn delete_condition(&self, subject: &SubjectId, id: &ConditionId) -> PolicyResult<Condition> {
        self.resolve_subject(subject)?;

        let _gate = self.write_gate.lock();
        let existing = self.load_condition(id)?;
        ensure_can_manage(subject, &existing)?;

        if let Some(policy) = self
            .repositories
            .policies
            .find_all()?
            .into_iter()
            .find(|policy| policy.references_condition(id))
        {
            return Err(PolicyError::StillReferenced {
                kind: ObjectKind::Condition,
                id: id.to_string(),
                by: policy.name,
            });
        }
        if let Some(parent) = self
            .repositories
            .conditions
            .find_all()?
            .into_iter()
            .find(|condition| condition.children().contains(&id))
        {
            return Err(PolicyError::StillReferenced {
                kind: ObjectKind::Condition,
                id: id.to_string(),
                by: parent.name,
            });
        }

        let removed = self
            .repositories
            .conditions
            .delete(id)?
            .ok_or_else(|| PolicyError::not_found(ObjectKind::Condition, id))?;
        self.repositories.policies.bump();
        info!("Condition deleted");
        Ok(removed)
    }

    fn load_condition(&self, id: &ConditionId) -> PolicyResult<Condition> {
        self.repositories
            .conditions
            .find_by_id(id)?
            .ok_or_else(|| PolicyError::not_found(ObjectKind::Condition, id))
    }

    /// Conditions that embed `id`, directly or transitively
    fn condition_dependents(&self, id: &ConditionId) -> PolicyResult<Vec<ConditionId>> {
        let all = self.repositories.conditions.find_all()?;
        let mut found = BTreeSet::new();
        let mut frontier = vec![id.clone()];

        while let Some(current) = frontier.pop() {
            for condition in &all {
                if condition.children().contains(&&current) && found.insert(condition.id.clone()) {
                    frontier.push(condition.id.clone());
                }
            }
        }

        Ok(found.into_iter().collect())
    }
}
