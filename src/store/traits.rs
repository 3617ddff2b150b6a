/*!
 * Store Traits
 * Narrow interfaces to the external persistence and identity collaborators
 */

use crate::condition::Condition;
use crate::core::{AccessType, ConditionId, EffectId, PolicyId, StoreResult, SubjectId};
use crate::effect::Effect;
use crate::policy::Policy;

/// Policy persistence
///
/// `save` must be atomic with respect to the name: two concurrent saves of
/// the same name may not both succeed.
pub trait PolicyRepository: Send + Sync {
    fn find_by_id(&self, id: &PolicyId) -> StoreResult<Option<Policy>>;

    fn find_by_owner(&self, owner: &SubjectId) -> StoreResult<Vec<Policy>>;

    fn find_all(&self) -> StoreResult<Vec<Policy>>;

    /// Policies governing an access type; backends with an index should override
    fn find_by_access_type(&self, access_type: AccessType) -> StoreResult<Vec<Policy>> {
        Ok(self
            .find_all()?
            .into_iter()
            .filter(|policy| policy.governs(access_type))
            .collect())
    }

    fn exists_by_name(&self, name: &str) -> StoreResult<bool>;

    /// Insert a new policy, failing with `DuplicateName` if the name is taken
    fn save(&self, policy: Policy) -> StoreResult<Policy>;

    /// Replace an existing policy as a whole
    fn replace(&self, policy: Policy) -> StoreResult<Policy>;

    fn delete(&self, id: &PolicyId) -> StoreResult<Option<Policy>>;
}

/// Condition persistence
pub trait ConditionRepository: Send + Sync {
    fn find_by_id(&self, id: &ConditionId) -> StoreResult<Option<Condition>>;

    fn find_by_owner(&self, owner: &SubjectId) -> StoreResult<Vec<Condition>>;

    fn find_all(&self) -> StoreResult<Vec<Condition>>;

    fn exists_by_name(&self, name: &str) -> StoreResult<bool>;

    fn save(&self, condition: Condition) -> StoreResult<Condition>;

    fn replace(&self, condition: Condition) -> StoreResult<Condition>;

    fn delete(&self, id: &ConditionId) -> StoreResult<Option<Condition>>;
}

/// Effect persistence
pub trait EffectRepository: Send + Sync {
    fn find_by_id(&self, id: &EffectId) -> StoreResult<Option<Effect>>;

    fn find_by_owner(&self, owner: &SubjectId) -> StoreResult<Vec<Effect>>;

    fn find_all(&self) -> StoreResult<Vec<Effect>>;

    fn exists_by_name(&self, name: &str) -> StoreResult<bool>;

    fn save(&self, effect: Effect) -> StoreResult<Effect>;

    fn replace(&self, effect: Effect) -> StoreResult<Effect>;

    fn delete(&self, id: &EffectId) -> StoreResult<Option<Effect>>;
}

/// Known subjects (users)
#[cfg_attr(test, mockall::automock)]
pub trait SubjectDirectory: Send + Sync {
    fn exists(&self, subject: &SubjectId) -> StoreResult<bool>;
}

/// Identity of the caller, supplied by the authentication layer
#[cfg_attr(test, mockall::automock)]
pub trait CurrentSubjectProvider: Send + Sync {
    fn current_subject(&self) -> Option<SubjectId>;
}
