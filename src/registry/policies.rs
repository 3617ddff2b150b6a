/*!
 * Policy Management
 */

use super::{duplicate_name, store_error, PolicyRegistry};
use crate::authz::ensure_can_manage;
use crate::core::{ObjectKind, PolicyError, PolicyId, PolicyResult, SubjectId};
use crate::policy::{Policy, PolicyDraft};
use tracing::{info, instrument};

impl PolicyRegistry {
    /// Policies owned by the subject, in evaluation order
    #[instrument(skip(self), fields(subject = %subject))]
    pub fn list_policies(&self, subject: &SubjectId) -> PolicyResult<Vec<Policy>> {
        self.resolve_subject(subject)?;
        Ok(self.repositories.policies.find_by_owner(subject)?)
    }

    #[instrument(skip(self), fields(subject = %subject, policy = %id))]
    pub fn get_policy(&self, subject: &SubjectId, id: &PolicyId) -> PolicyResult<Policy> {
        self.resolve_subject(subject)?;
        let policy = self.load_policy(id)?;
        ensure_can_manage(subject, &policy)?;
        Ok(policy)
    }

    /// Create a policy owned by `owner`
    ///
    /// Nothing is written unless the name is free and the condition and every
    /// effect resolve.
    #[instrument(skip_all, fields(subject = %owner, name = %draft.name))]
    pub fn create_policy(&self, owner: &SubjectId, draft: PolicyDraft) -> PolicyResult<Policy> {
        self.resolve_subject(owner)?;
        draft.validate()?;

        let _gate = self.write_gate.lock();
        if self.repositories.policies.exists_by_name(&draft.name)? {
            return Err(PolicyError::DuplicatePolicyName(draft.name));
        }

        let policy = Policy::from_draft(PolicyId::generate(), owner.clone(), draft);
        self.compiler().compile(&policy)?;

        let policy = self
            .repositories
            .policies
            .save(policy)
            .map_err(|err| store_error(ObjectKind::Policy, err))?;
        info!(policy = %policy.id, priority = policy.priority, "Policy created");
        Ok(policy)
    }

    /// Replace a policy as a whole; the owner never changes
    #[instrument(skip_all, fields(subject = %subject, policy = %id))]
    pub fn replace_policy(
        &self,
        subject: &SubjectId,
        id: &PolicyId,
        draft: PolicyDraft,
    ) -> PolicyResult<Policy> {
        self.resolve_subject(subject)?;
        draft.validate()?;

        let _gate = self.write_gate.lock();
        let existing = self.load_policy(id)?;
        ensure_can_manage(subject, &existing)?;

        if existing.name != draft.name && self.repositories.policies.exists_by_name(&draft.name)? {
            return Err(duplicate_name(ObjectKind::Policy, draft.name));
        }

        let policy = Policy::from_draft(id.clone(), existing.owner, draft);
        self.compiler().compile(&policy)?;

        let policy = self
            .repositories
            .policies
            .replace(policy)
            .map_err(|err| store_error(ObjectKind::Policy, err))?;
        info!("Policy replaced");
        Ok(policy)
    }

    #[instrument(skip(self), fields(subject = %subject, policy = %id))]
    pub fn delete_policy(&self, subject: &SubjectId, id: &PolicyId) -> PolicyResult<Policy> {
        self.resolve_subject(subject)?;

        let _gate = self.write_gate.lock();
        let existing = self.load_policy(id)?;
        ensure_can_manage(subject, &existing)?;

        let removed = self
            .repositories
            .policies
            .delete(id)?
            .ok_or_else(|| PolicyError::not_found(ObjectKind::Policy, id))?;
        info!("Policy deleted");
        Ok(removed)
    }

    fn load_policy(&self, id: &PolicyId) -> PolicyResult<Policy> {
        self.repositories
            .policies
            .find_by_id(id)?
            .ok_or_else(|| PolicyError::not_found(ObjectKind::Policy, id))
    }
}
