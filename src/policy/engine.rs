/*!
 * Decision Engine
 * Evaluates a request against an ordered set of compiled policies
 *
 * Policies are visited by ascending priority (ties by policy id). Each policy
 * whose condition holds folds its effects, in declared order, into the
 * running decision and payload.
 *
 * The first policy that reaches a decision settles it: lower-priority policies
 * still fire and may transform the payload, but their decision changes are
 * discarded. Within one policy a `Deny` overrides an earlier `Permit`, and a
 * denial can never be lifted. If nothing permits, the request is denied.
 */

use crate::condition::{ConditionExpr, ConditionResolver};
use crate::core::{
    AccessType, CompileError, Decision, Definition, EffectId, ObjectKind, PolicyDecision,
    PolicyId, Resource,
};
use crate::effect::{EffectKind, EffectScope};
use crate::policy::{Policy, RequestContext};
use crate::store::{ConditionRepository, EffectRepository};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// A policy with its condition and effects resolved
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledPolicy {
    pub id: PolicyId,
    pub name: String,
    pub priority: i32,
    pub access_types: BTreeSet<AccessType>,
    pub condition: ConditionExpr,
    pub effects: Vec<EffectKind>,
}

impl CompiledPolicy {
    fn order_key(&self) -> (i32, &PolicyId) {
        (self.priority, &self.id)
    }
}

/// Resolves stored policies against condition and effect repositories
pub struct PolicyCompiler<'a> {
    conditions: ConditionResolver<'a>,
    effects: &'a dyn EffectRepository,
}

impl<'a> PolicyCompiler<'a> {
    pub fn new(
        conditions: &'a dyn ConditionRepository,
        effects: &'a dyn EffectRepository,
        max_condition_depth: usize,
    ) -> Self {
        Self {
            conditions: ConditionResolver::new(conditions, max_condition_depth),
            effects,
        }
    }

    pub fn compile(&self, policy: &Policy) -> Result<CompiledPolicy, CompileError> {
        let condition = self.conditions.resolve(&policy.condition)?;
        let effects = policy
            .effects
            .iter()
            .map(|id| self.effect(id))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CompiledPolicy {
            id: policy.id.clone(),
            name: policy.name.clone(),
            priority: policy.priority,
            access_types: policy.access_types.clone(),
            condition,
            effects,
        })
    }

    /// Resolve a single effect
    pub fn effect(&self, id: &EffectId) -> Result<EffectKind, CompileError> {
        let effect = self
            .effects
            .find_by_id(id)?
            .ok_or_else(|| CompileError::Dangling {
                kind: ObjectKind::Effect,
                id: id.to_string(),
            })?;

        match effect.definition {
            Definition::Known(kind) => Ok(kind),
            unknown @ Definition::Unrecognized(_) => Err(CompileError::UnknownEffect {
                id: id.clone(),
                variant: unknown.unrecognized_tag().unwrap_or_default(),
            }),
        }
    }
}

/// Result of running the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Evaluation {
    pub decision: Decision,
    /// Payload after all fired effects, whatever the decision
    pub resource: Option<Resource>,
    /// Policies whose condition held, in evaluation order
    pub fired: Vec<PolicyId>,
    pub reason: String,
}

/// Ordered, immutable set of compiled policies
#[derive(Debug, Clone, Default)]
pub struct DecisionEngine {
    policies: Vec<CompiledPolicy>,
}

impl DecisionEngine {
    pub fn new(mut policies: Vec<CompiledPolicy>) -> Self {
        policies.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
        Self { policies }
    }

    /// Compile stored policies; any unresolvable policy fails the whole set
    pub fn compile(policies: &[Policy], compiler: &PolicyCompiler<'_>) -> Result<Self, CompileError> {
        let compiled = policies
            .iter()
            .map(|policy| compiler.compile(policy))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(compiled))
    }

    /// Policies in evaluation order
    pub fn policies(&self) -> &[CompiledPolicy] {
        &self.policies
    }

    pub fn decide(
        &self,
        access_type: AccessType,
        resource: Option<Resource>,
        context: &RequestContext,
    ) -> Evaluation {
        let mut decision = PolicyDecision::Undetermined;
        let mut payload = resource;
        let mut fired = Vec::new();
        let mut decided_by: Option<&str> = None;

        for policy in self.policies.iter().filter(|p| p.access_types.contains(&access_type)) {
            if !policy.condition.evaluate(context) {
                debug!(policy = %policy.name, "Condition false, policy skipped");
                continue;
            }

            debug!(policy = %policy.name, effects = policy.effects.len(), "Policy fired");
            fired.push(policy.id.clone());

            let scope = EffectScope {
                policy: &policy.id,
                access_type,
                context,
            };
            let settled = decision != PolicyDecision::Undetermined;
            for effect in &policy.effects {
                let (next, transformed) = effect.apply(&scope, decision, payload);
                payload = transformed;
                if !settled && next != decision {
                    decision = next;
                    decided_by = Some(&policy.name);
                }
            }
        }

        let reason = match (decision, decided_by) {
            (PolicyDecision::Permit, Some(name)) => format!("Permitted by policy '{name}'"),
            (PolicyDecision::Deny, Some(name)) => format!("Denied by policy '{name}'"),
            _ if fired.is_empty() => "No applicable policy; denied by default".to_string(),
            _ => "No policy reached a decision; denied by default".to_string(),
        };

        Evaluation {
            decision: decision.resolve(),
            resource: payload,
            fired,
            reason,
        }
    }
}
