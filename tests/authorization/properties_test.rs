/*!
 * Property tests over the decision engine
 */

use abac_kernel::condition::ConditionExpr;
use abac_kernel::policy::CompiledPolicy;
use abac_kernel::{
    AccessType, Decision, DecisionEngine, EffectKind, PolicyId, RequestContext, Resource,
};
use proptest::prelude::*;
use serde_json::json;
use std::collections::BTreeSet;
use std::time::{Duration, UNIX_EPOCH};

fn effect_strategy() -> impl Strategy<Value = EffectKind> {
    prop_oneof![
        Just(EffectKind::Permit),
        Just(EffectKind::Deny),
        Just(EffectKind::FieldFilter {
            fields: vec!["secret".into()]
        }),
        Just(EffectKind::Accuracy {
            fields: vec!["temp".into()],
            step: 0.5
        }),
        (0u64..20).prop_map(|limit| EffectKind::RateLimit {
            attribute: "count".into(),
            limit
        }),
    ]
}

fn condition_strategy() -> impl Strategy<Value = ConditionExpr> {
    prop_oneof![
        any::<bool>().prop_map(ConditionExpr::Always),
        (0i64..5).prop_map(|level| ConditionExpr::Equals {
            attribute: "level".into(),
            value: json!(level)
        }),
        Just(ConditionExpr::Exists("role".into())),
    ]
}

prop_compose! {
    fn policy_strategy(index: usize)(
        priority in -3i32..3,
        condition in condition_strategy(),
        effects in prop::collection::vec(effect_strategy(), 0..4),
    ) -> CompiledPolicy {
        CompiledPolicy {
            id: PolicyId::new(format!("p{index:03}")),
            name: format!("policy-{index}"),
            priority,
            access_types: BTreeSet::from([AccessType::Read]),
            condition,
            effects,
        }
    }
}

fn policies_strategy() -> impl Strategy<Value = Vec<CompiledPolicy>> {
    (0usize..8).prop_flat_map(|n| (0..n).map(policy_strategy).collect::<Vec<_>>())
}

fn context_strategy() -> impl Strategy<Value = RequestContext> {
    (0i64..5, 0u64..25, any::<bool>()).prop_map(|(level, count, with_role)| {
        let context = RequestContext::at(UNIX_EPOCH + Duration::from_secs(1_000))
            .with_attribute("level", level)
            .with_attribute("count", count);
        if with_role {
            context.with_attribute("role", "user")
        } else {
            context
        }
    })
}

fn payload() -> Resource {
    Resource::new("dev")
        .with_attribute("secret", "s")
        .with_attribute("temp", 20.3)
}

proptest! {
    #[test]
    fn prop_decide_is_deterministic(policies in policies_strategy(), context in context_strategy()) {
        let engine = DecisionEngine::new(policies);
        let first = engine.decide(AccessType::Read, Some(payload()), &context);
        let second = engine.decide(AccessType::Read, Some(payload()), &context);
        prop_assert_eq!(first, second);
    }

    #[test]
    fn prop_insertion_order_irrelevant(
        (policies, shuffled) in policies_strategy()
            .prop_flat_map(|p| (Just(p.clone()), Just(p).prop_shuffle())),
        context in context_strategy(),
    ) {
        let a = DecisionEngine::new(policies).decide(AccessType::Read, Some(payload()), &context);
        let b = DecisionEngine::new(shuffled).decide(AccessType::Read, Some(payload()), &context);
        prop_assert_eq!(a, b);
    }

    #[test]
    fn prop_no_permit_effect_means_denied(
        policies in policies_strategy(),
        context in context_strategy(),
    ) {
        let policies: Vec<_> = policies
            .into_iter()
            .map(|mut p| {
                p.effects.retain(|e| !matches!(e, EffectKind::Permit));
                p
            })
            .collect();
        let evaluation = DecisionEngine::new(policies).decide(AccessType::Read, None, &context);
        prop_assert_eq!(evaluation.decision, Decision::Denied);
    }

    #[test]
    fn prop_first_fired_deny_wins(
        policies in policies_strategy(),
        context in context_strategy(),
    ) {
        let mut policies = policies;
        policies.push(CompiledPolicy {
            id: PolicyId::new("000-gate"),
            name: "gate".into(),
            priority: i32::MIN,
            access_types: BTreeSet::from([AccessType::Read]),
            condition: ConditionExpr::Always(true),
            effects: vec![EffectKind::Deny],
        });
        let evaluation = DecisionEngine::new(policies).decide(AccessType::Read, Some(payload()), &context);
        prop_assert_eq!(evaluation.decision, Decision::Denied);
        prop_assert_eq!(evaluation.fired.first(), Some(&PolicyId::new("000-gate")));
    }

    #[test]
    fn prop_field_filter_idempotent(
        fields in prop::collection::vec("[a-c](\\.[a-c]){0,2}", 0..4),
        literal in "[a-c]\\.[a-c]",
    ) {
        let filter = EffectKind::FieldFilter { fields };
        let gate = |effects: Vec<EffectKind>| {
            DecisionEngine::new(vec![CompiledPolicy {
                id: PolicyId::new("p"),
                name: "p".into(),
                priority: 0,
                access_types: BTreeSet::from([AccessType::Read]),
                condition: ConditionExpr::Always(true),
                effects,
            }])
        };
        // A literal dotted key next to the nested object it shadows
        let resource = Resource::new("r")
            .with_attribute("a", json!({"b": 2, "c": {"a": 3}}))
            .with_attribute("b", json!({"c": 2}))
            .with_attribute("ab", "x")
            .with_attribute(literal, 1);
        let context = RequestContext::new();

        let once = gate(vec![EffectKind::Permit, filter.clone()])
            .decide(AccessType::Read, Some(resource.clone()), &context);
        let twice = gate(vec![EffectKind::Permit, filter.clone(), filter])
            .decide(AccessType::Read, Some(resource), &context);
        prop_assert_eq!(once.resource, twice.resource);
    }
}
