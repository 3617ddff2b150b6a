/*!
 * Decision engine behavior through the authorizer
 */

use crate::fixtures::{always, equals, role_is, World};
use abac_kernel::{
    AccessType, CompareOp, ConditionKind, Decision, EffectKind, LogLevel, RequestContext, Resource,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::{Duration, UNIX_EPOCH};

fn read(world: &World, resource: Option<Resource>, context: &RequestContext) -> (Decision, Option<Resource>) {
    world
        .authorizer()
        .authorize(&world.alice, resource, AccessType::Read, context)
        .unwrap()
        .into_parts()
}

#[test]
fn test_default_deny_with_no_policies() {
    let world = World::new();
    let (decision, resource) = read(&world, Some(Resource::new("dev")), &RequestContext::new());
    assert_eq!(decision, Decision::Denied);
    assert!(resource.is_none());
}

#[test]
fn test_default_deny_when_no_condition_holds() {
    let world = World::new();
    let never = world.condition("never", always(false));
    let permit = world.effect("permit", EffectKind::Permit);
    world.policy("p", 1, &never, &[&permit]);

    assert_eq!(read(&world, None, &RequestContext::new()).0, Decision::Denied);
}

#[test]
fn test_deny_overrides_later_permit() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let deny = world.effect("deny", EffectKind::Deny);
    let permit = world.effect("permit", EffectKind::Permit);
    world.policy("p1", 1, &yes, &[&deny]);
    world.policy("p2", 2, &yes, &[&permit]);

    assert_eq!(read(&world, None, &RequestContext::new()).0, Decision::Denied);
}

#[test]
fn test_priority_not_insertion_order() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let deny = world.effect("deny", EffectKind::Deny);
    let permit = world.effect("permit", EffectKind::Permit);
    // Permit stored first but evaluated second
    world.policy("p-permit", 5, &yes, &[&permit]);
    world.policy("p-deny", 1, &yes, &[&deny]);

    assert_eq!(read(&world, None, &RequestContext::new()).0, Decision::Denied);
}

#[test]
fn test_admin_scenario() {
    let world = World::new();
    let is_admin = world.condition(
        "is-admin",
        ConditionKind::AttributeCompare {
            attribute: "role".into(),
            op: CompareOp::Eq,
            value: json!("admin"),
        },
    );
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    let deny = world.effect("deny", EffectKind::Deny);
    let admins = world.policy("admins", 1, &is_admin, &[&permit]);
    let everyone = world.policy("everyone", 2, &yes, &[&deny]);

    let authorizer = world.authorizer();
    let admin = authorizer
        .authorize(
            &world.alice,
            None,
            AccessType::Read,
            &RequestContext::new().with_attribute("role", "admin"),
        )
        .unwrap();
    assert_eq!(admin.decision, Decision::Permitted);
    assert_eq!(admin.fired, vec![admins.clone(), everyone.clone()]);
    assert_eq!(admin.reason, "Permitted by policy 'admins'");

    let user = authorizer
        .authorize(
            &world.alice,
            None,
            AccessType::Read,
            &RequestContext::new().with_attribute("role", "user"),
        )
        .unwrap();
    assert_eq!(user.decision, Decision::Denied);
    assert_eq!(user.fired, vec![everyone]);
}

#[test]
fn test_field_filter_and_accuracy_shape_payload() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    let hide = world.effect(
        "hide-secret",
        EffectKind::FieldFilter {
            fields: vec!["secret".into(), "location.exact".into()],
        },
    );
    let coarse = world.effect(
        "coarse-temp",
        EffectKind::Accuracy {
            fields: vec!["temp".into()],
            step: 0.5,
        },
    );
    world.policy("shape", 1, &yes, &[&permit, &hide, &coarse]);

    let payload = Resource::new("thermo")
        .with_attribute("secret", "s3cr3t")
        .with_attribute("temp", 21.37)
        .with_attribute("location", json!({"exact": "lab 3", "site": "north"}));
    let (decision, resource) = read(&world, Some(payload), &RequestContext::new());

    assert_eq!(decision, Decision::Permitted);
    let resource = resource.unwrap();
    assert_eq!(resource.attribute("secret"), None);
    assert_eq!(resource.attribute("location.exact"), None);
    assert_eq!(resource.attribute("location.site"), Some(&json!("north")));
    assert_eq!(resource.attribute("temp"), Some(&json!(21.5)));
}

#[test]
fn test_field_filter_removes_literal_and_nested_paths() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    let hide = world.effect(
        "hide-ab",
        EffectKind::FieldFilter {
            fields: vec!["a.b".into()],
        },
    );
    world.policy("once", 1, &yes, &[&permit, &hide]);
    world.policy("again", 2, &yes, &[&hide]);

    let payload = Resource::new("r")
        .with_attribute("a.b", 1)
        .with_attribute("a", json!({"b": 2, "c": 3}));
    let (decision, resource) = read(&world, Some(payload), &RequestContext::new());

    assert_eq!(decision, Decision::Permitted);
    let resource = resource.unwrap();
    assert_eq!(resource.attribute("a.b"), None);
    assert_eq!(resource.attribute("a"), Some(&json!({"c": 3})));
}

#[test]
fn test_observe_only_policy_denies() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let log = world.effect(
        "log",
        EffectKind::Log {
            level: LogLevel::Warn,
            message: "observed".into(),
        },
    );
    world.policy("observe", 1, &yes, &[&log]);

    let outcome = world
        .authorizer()
        .authorize(&world.alice, None, AccessType::Read, &RequestContext::new())
        .unwrap();
    assert_eq!(outcome.decision, Decision::Denied);
    assert_eq!(outcome.fired.len(), 1);
}

#[test]
fn test_rate_limit_denies_over_limit() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    let limit = world.effect(
        "limit",
        EffectKind::RateLimit {
            attribute: "requests.minute".into(),
            limit: 10,
        },
    );
    world.policy("limited", 1, &yes, &[&permit, &limit]);

    let calm = RequestContext::new().with_attribute("requests", json!({"minute": 3}));
    let busy = RequestContext::new().with_attribute("requests", json!({"minute": 11}));
    assert_eq!(read(&world, None, &calm).0, Decision::Permitted);
    assert_eq!(read(&world, None, &busy).0, Decision::Denied);
    assert_eq!(read(&world, None, &RequestContext::new()).0, Decision::Permitted);
}

#[test]
fn test_time_window_uses_request_timestamp() {
    let world = World::new();
    let office = world.condition(
        "window",
        ConditionKind::TimeWindow {
            not_before: Some(1_000),
            not_after: Some(2_000),
        },
    );
    let permit = world.effect("permit", EffectKind::Permit);
    world.policy("windowed", 1, &office, &[&permit]);

    let inside = RequestContext::at(UNIX_EPOCH + Duration::from_secs(1_500));
    let after = RequestContext::at(UNIX_EPOCH + Duration::from_secs(2_001));
    assert_eq!(read(&world, None, &inside).0, Decision::Permitted);
    assert_eq!(read(&world, None, &after).0, Decision::Denied);
}

#[test]
fn test_composite_conditions() {
    let world = World::new();
    let admin = world.condition("admin", role_is("admin"));
    let onsite = world.condition("onsite", equals("site.name", json!("north")));
    let both = world.condition(
        "admin-onsite",
        ConditionKind::All {
            conditions: vec![admin.clone(), onsite.clone()],
        },
    );
    let not_both = world.condition("not-admin-onsite", ConditionKind::Not { condition: both.clone() });
    let permit = world.effect("permit", EffectKind::Permit);
    let deny = world.effect("deny", EffectKind::Deny);
    world.policy("onsite-admins", 1, &both, &[&permit]);
    world.policy("others", 2, &not_both, &[&deny]);

    let ok = RequestContext::new()
        .with_attribute("role", "admin")
        .with_attribute("site", json!({"name": "north"}));
    let remote = RequestContext::new().with_attribute("role", "admin");
    assert_eq!(read(&world, None, &ok).0, Decision::Permitted);
    assert_eq!(read(&world, None, &remote).0, Decision::Denied);
}

#[test]
fn test_other_access_types_not_candidates() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    world.policy("reads", 1, &yes, &[&permit]);

    let outcome = world
        .authorizer()
        .authorize(&world.alice, None, AccessType::Delete, &RequestContext::new())
        .unwrap();
    assert_eq!(outcome.decision, Decision::Denied);
    assert!(outcome.fired.is_empty());
}

mod unrecognized_variants {
    use crate::fixtures::{always, World};
    use abac_kernel::store::{ConditionRepository, EffectRepository};
    use abac_kernel::{
        AccessType, AuthzError, Condition, ConditionId, Effect, EffectId, EffectKind, Policy,
        PolicyDraft, PolicyError, PolicyId, RequestContext,
    };
    use serde_json::json;

    fn stored_geo_fence(world: &World) -> ConditionId {
        let condition: Condition = serde_json::from_value(json!({
            "id": "geo",
            "name": "geo-fence",
            "owner": "alice",
            "definition": {"type": "geo_fence", "radius_m": 250}
        }))
        .unwrap();
        world.repositories.conditions.save(condition).unwrap().id
    }

    #[test]
    fn test_authorize_aborts_on_unknown_condition() {
        let world = World::new();
        let geo = stored_geo_fence(&world);
        let policy = Policy::from_draft(
            PolicyId::new("legacy"),
            world.alice.clone(),
            PolicyDraft::new("legacy", 1, geo).with_access_type(AccessType::Read),
        );
        world.repositories.policies.save(policy).unwrap();

        let err = world
            .authorizer()
            .authorize(&world.alice, None, AccessType::Read, &RequestContext::new())
            .unwrap_err();
        assert_eq!(
            err,
            AuthzError::UnknownConditionVariant {
                id: ConditionId::new("geo"),
                variant: "geo_fence".into()
            }
        );

        // Other access types never compile the policy
        assert!(world
            .authorizer()
            .authorize(&world.alice, None, AccessType::Write, &RequestContext::new())
            .is_ok());
    }

    #[test]
    fn test_create_policy_rejects_unknown_condition() {
        let world = World::new();
        let geo = stored_geo_fence(&world);

        let err = world
            .registry
            .create_policy(
                &world.alice,
                PolicyDraft::new("p", 1, geo).with_access_type(AccessType::Read),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            PolicyError::UnknownConditionVariant { ref variant, .. } if variant == "geo_fence"
        ));
        assert!(world.registry.list_policies(&world.alice).unwrap().is_empty());
    }

    fn stored_watermark(world: &World) -> EffectId {
        let effect: Effect = serde_json::from_value(json!({
            "id": "wm",
            "name": "watermark",
            "owner": "alice",
            "definition": {"type": "watermark", "text": "internal"}
        }))
        .unwrap();
        world.repositories.effects.save(effect).unwrap().id
    }

    #[test]
    fn test_authorize_aborts_on_unknown_effect() {
        let world = World::new();
        let yes = world.condition("yes", always(true));
        let permit = world.effect("permit", EffectKind::Permit);
        world.policy("healthy", 1, &yes, &[&permit]);

        let watermark = stored_watermark(&world);
        let policy = Policy::from_draft(
            PolicyId::new("legacy"),
            world.alice.clone(),
            PolicyDraft::new("legacy", 2, yes)
                .with_access_type(AccessType::Read)
                .with_effect(watermark),
        );
        world.repositories.policies.save(policy).unwrap();

        // The healthy policy alone would permit; the whole set is rejected
        let err = world
            .authorizer()
            .authorize(&world.alice, None, AccessType::Read, &RequestContext::new())
            .unwrap_err();
        assert_eq!(
            err,
            AuthzError::UnknownEffectVariant {
                id: EffectId::new("wm"),
                variant: "watermark".into()
            }
        );
    }

    #[test]
    fn test_create_policy_rejects_unknown_effect() {
        let world = World::new();
        let yes = world.condition("yes", always(true));
        let watermark = stored_watermark(&world);

        let err = world
            .registry
            .create_policy(
                &world.alice,
                PolicyDraft::new("p", 1, yes)
                    .with_access_type(AccessType::Read)
                    .with_effect(watermark),
            )
            .unwrap_err();
        assert_eq!(
            err,
            PolicyError::UnknownEffectVariant {
                id: EffectId::new("wm"),
                variant: "watermark".into()
            }
        );
        assert!(world.registry.list_policies(&world.alice).unwrap().is_empty());
    }

    #[test]
    fn test_authorize_reports_stored_cycle() {
        let world = World::new();
        for (id, child) in [("ping", "pong"), ("pong", "ping")] {
            let condition: Condition = serde_json::from_value(json!({
                "id": id,
                "name": id,
                "owner": "alice",
                "definition": {"type": "not", "condition": child}
            }))
            .unwrap();
            world.repositories.conditions.save(condition).unwrap();
        }
        let policy = Policy::from_draft(
            PolicyId::new("looping"),
            world.alice.clone(),
            PolicyDraft::new("looping", 1, "ping").with_access_type(AccessType::Read),
        );
        world.repositories.policies.save(policy).unwrap();

        let err = world
            .authorizer()
            .authorize(&world.alice, None, AccessType::Read, &RequestContext::new())
            .unwrap_err();
        assert_eq!(err, AuthzError::ConditionCycle(ConditionId::new("ping")));
    }
}
