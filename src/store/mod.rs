/*!
 * Store Module
 * Repository interfaces, the policy index and in-memory backends
 */

mod memory;
mod policy_store;
mod traits;

pub use memory::{
    MemoryConditionRepository, MemoryEffectRepository, MemoryPolicyRepository,
    MemorySubjectDirectory, Record, SessionSubject,
};
pub use policy_store::PolicyStore;
pub use traits::{
    ConditionRepository, CurrentSubjectProvider, EffectRepository, PolicyRepository,
    SubjectDirectory,
};

#[cfg(test)]
pub use traits::{MockCurrentSubjectProvider, MockSubjectDirectory};

use std::sync::Arc;

/// Every collaborator the authorizer and registry read from
#[derive(Clone)]
pub struct Repositories {
    pub policies: PolicyStore,
    pub conditions: Arc<dyn ConditionRepository>,
    pub effects: Arc<dyn EffectRepository>,
    pub subjects: Arc<dyn SubjectDirectory>,
}

impl Repositories {
    pub fn new(
        policies: Arc<dyn PolicyRepository>,
        conditions: Arc<dyn ConditionRepository>,
        effects: Arc<dyn EffectRepository>,
        subjects: Arc<dyn SubjectDirectory>,
    ) -> Self {
        Self {
            policies: PolicyStore::new(policies),
            conditions,
            effects,
            subjects,
        }
    }

    /// Fresh in-memory repositories over the given subject directory
    pub fn in_memory(subjects: Arc<dyn SubjectDirectory>) -> Self {
        Self::new(
            Arc::new(MemoryPolicyRepository::new()),
            Arc::new(MemoryConditionRepository::new()),
            Arc::new(MemoryEffectRepository::new()),
            subjects,
        )
    }
}
