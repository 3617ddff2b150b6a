/*!
 * Shared setup for authorization tests
 */

#![allow(dead_code)]

use abac_kernel::{
    AccessType, Authorizer, ConditionDraft, ConditionId, ConditionKind, EffectDraft, EffectId,
    EffectKind, EngineConfig, MemorySubjectDirectory, PolicyDraft, PolicyId, PolicyRegistry,
    Repositories, SubjectId,
};
use serde_json::{json, Value};
use std::sync::Arc;

pub struct World {
    pub registry: PolicyRegistry,
    pub repositories: Repositories,
    pub alice: SubjectId,
    pub bob: SubjectId,
}

impl World {
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    pub fn with_config(config: &EngineConfig) -> Self {
        let alice = SubjectId::new("alice");
        let bob = SubjectId::new("bob");
        let subjects = Arc::new(MemorySubjectDirectory::with_subjects([
            alice.clone(),
            bob.clone(),
        ]));
        let repositories = Repositories::in_memory(subjects);
        let registry = PolicyRegistry::with_config(repositories.clone(), config);
        Self {
            registry,
            repositories,
            alice,
            bob,
        }
    }

    pub fn condition(&self, name: &str, kind: ConditionKind) -> ConditionId {
        self.registry
            .create_condition(&self.alice, ConditionDraft::new(name, kind))
            .unwrap()
            .id
    }

    pub fn effect(&self, name: &str, kind: EffectKind) -> EffectId {
        self.registry
            .create_effect(&self.alice, EffectDraft::new(name, kind))
            .unwrap()
            .id
    }

    pub fn policy(
        &self,
        name: &str,
        priority: i32,
        condition: &ConditionId,
        effects: &[&EffectId],
    ) -> PolicyId {
        let mut draft =
            PolicyDraft::new(name, priority, condition.clone()).with_access_type(AccessType::Read);
        for effect in effects {
            draft = draft.with_effect((*effect).clone());
        }
        self.registry.create_policy(&self.alice, draft).unwrap().id
    }

    /// Authorizer without cache, so every call evaluates
    pub fn authorizer(&self) -> Authorizer {
        self.authorizer_with(EngineConfig::default().without_cache())
    }

    pub fn authorizer_with(&self, config: EngineConfig) -> Authorizer {
        Authorizer::with_config(self.repositories.clone(), config)
    }
}

pub fn always(value: bool) -> ConditionKind {
    ConditionKind::Always { value }
}

pub fn equals(attribute: &str, value: Value) -> ConditionKind {
    ConditionKind::Equals {
        attribute: attribute.into(),
        value,
    }
}

pub fn role_is(role: &str) -> ConditionKind {
    equals("role", json!(role))
}
