/*!
 * Policy Types
 * Persisted policies and the drafts used to create or replace them
 */

use crate::condition::validate_name;
use crate::core::{
    AccessType, ConditionId, EffectId, PolicyError, PolicyId, PolicyResult, SubjectId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A persisted access-control policy
///
/// Replaced as a whole, never patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Policy {
    pub id: PolicyId,
    /// Unique across all policies
    pub name: String,
    /// Lower values are evaluated first
    pub priority: i32,
    /// Access types this policy governs, never empty
    pub access_types: BTreeSet<AccessType>,
    pub condition: ConditionId,
    /// Applied in this order when the condition holds
    #[serde(default)]
    pub effects: Vec<EffectId>,
    pub owner: SubjectId,
}

impl Policy {
    /// Build a policy from a validated draft
    pub fn from_draft(id: PolicyId, owner: SubjectId, draft: PolicyDraft) -> Self {
        Self {
            id,
            name: draft.name,
            priority: draft.priority,
            access_types: draft.access_types,
            condition: draft.condition,
            effects: draft.effects,
            owner,
        }
    }

    pub fn governs(&self, access_type: AccessType) -> bool {
        self.access_types.contains(&access_type)
    }

    pub fn references_condition(&self, id: &ConditionId) -> bool {
        &self.condition == id
    }

    pub fn references_effect(&self, id: &EffectId) -> bool {
        self.effects.contains(id)
    }

    /// Evaluation order key: priority, then id
    pub fn order_key(&self) -> (i32, &PolicyId) {
        (self.priority, &self.id)
    }
}

/// Everything needed to create or replace a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyDraft {
    pub name: String,
    pub priority: i32,
    pub access_types: BTreeSet<AccessType>,
    pub condition: ConditionId,
    #[serde(default)]
    pub effects: Vec<EffectId>,
}

impl PolicyDraft {
    pub fn new(name: impl Into<String>, priority: i32, condition: impl Into<ConditionId>) -> Self {
        Self {
            name: name.into(),
            priority,
            access_types: BTreeSet::new(),
            condition: condition.into(),
            effects: Vec::new(),
        }
    }

    pub fn with_access_type(mut self, access_type: AccessType) -> Self {
        self.access_types.insert(access_type);
        self
    }

    pub fn with_access_types(mut self, access_types: impl IntoIterator<Item = AccessType>) -> Self {
        self.access_types.extend(access_types);
        self
    }

    pub fn with_effect(mut self, effect: impl Into<EffectId>) -> Self {
        self.effects.push(effect.into());
        self
    }

    /// Checks that do not need the store
    pub fn validate(&self) -> PolicyResult<()> {
        validate_name(&self.name)?;
        if self.access_types.is_empty() {
            return Err(PolicyError::InvalidDefinition(format!(
                "policy '{}' must govern at least one access type",
                self.name
            )));
        }
        Ok(())
    }
}
