/*!
 * Policy Store
 * Indexing wrapper over the external policy repository
 *
 * Carries a revision counter that every mutation through the store bumps;
 * the decision cache keys on it so stale decisions are never served.
 */

use super::traits::PolicyRepository;
use crate::config::CandidateScope;
use crate::core::{AccessType, PolicyId, Resource, StoreResult, SubjectId};
use crate::policy::Policy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Clone)]
pub struct PolicyStore {
    repository: Arc<dyn PolicyRepository>,
    revision: Arc<AtomicU64>,
}

impl PolicyStore {
    pub fn new(repository: Arc<dyn PolicyRepository>) -> Self {
        Self {
            repository,
            revision: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn find_by_id(&self, id: &PolicyId) -> StoreResult<Option<Policy>> {
        self.repository.find_by_id(id)
    }

    /// Owned policies in evaluation order
    pub fn find_by_owner(&self, owner: &SubjectId) -> StoreResult<Vec<Policy>> {
        let mut policies = self.repository.find_by_owner(owner)?;
        sort_for_evaluation(&mut policies);
        Ok(policies)
    }

    /// Policies governing an access type, in evaluation order
    pub fn find_by_access_type(&self, access_type: AccessType) -> StoreResult<Vec<Policy>> {
        let mut policies = self.repository.find_by_access_type(access_type)?;
        sort_for_evaluation(&mut policies);
        Ok(policies)
    }

    pub fn find_all(&self) -> StoreResult<Vec<Policy>> {
        self.repository.find_all()
    }

    pub fn exists_by_name(&self, name: &str) -> StoreResult<bool> {
        self.repository.exists_by_name(name)
    }

    /// Candidate policies for a request under the given scope
    ///
    /// With `ResourceOwner` scope an unowned resource has no candidates.
    pub fn candidates(
        &self,
        scope: CandidateScope,
        access_type: AccessType,
        resource: Option<&Resource>,
    ) -> StoreResult<Vec<Policy>> {
        let mut policies = self.find_by_access_type(access_type)?;
        if scope == CandidateScope::ResourceOwner {
            let owner = resource.and_then(|r| r.owner.as_ref());
            policies.retain(|policy| Some(&policy.owner) == owner);
        }
        Ok(policies)
    }

    pub fn save(&self, policy: Policy) -> StoreResult<Policy> {
        let saved = self.repository.save(policy)?;
        self.bump();
        Ok(saved)
    }

    pub fn replace(&self, policy: Policy) -> StoreResult<Policy> {
        let replaced = self.repository.replace(policy)?;
        self.bump();
        Ok(replaced)
    }

    pub fn delete(&self, id: &PolicyId) -> StoreResult<Option<Policy>> {
        let removed = self.repository.delete(id)?;
        if removed.is_some() {
            self.bump();
        }
        Ok(removed)
    }

    /// Current revision of everything reachable from the store
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Acquire)
    }

    /// Mark a change made outside the store (conditions, effects)
    pub fn bump(&self) -> u64 {
        self.revision.fetch_add(1, Ordering::AcqRel) + 1
    }
}

fn sort_for_evaluation(policies: &mut [Policy]) {
    policies.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
}
