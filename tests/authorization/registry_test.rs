/*!
 * Registry integrity across policies, conditions and effects
 */

use crate::fixtures::{always, role_is, World};
use abac_kernel::{
    can_manage, AccessType, ConditionDraft, ConditionId, ConditionKind, EffectDraft, EffectId,
    EffectKind, ObjectKind, PolicyDraft, PolicyError, SubjectId,
};
use pretty_assertions::assert_eq;

#[test]
fn test_failed_create_leaves_store_untouched() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    let revision = world.repositories.policies.revision();

    let err = world
        .registry
        .create_policy(
            &world.alice,
            PolicyDraft::new("broken", 1, yes)
                .with_access_type(AccessType::Read)
                .with_effect(permit)
                .with_effect(EffectId::new("missing")),
        )
        .unwrap_err();

    assert_eq!(
        err,
        PolicyError::DanglingReference {
            kind: ObjectKind::Effect,
            id: "missing".into()
        }
    );
    assert_eq!(world.repositories.policies.revision(), revision);
    assert!(world.repositories.policies.find_all().unwrap().is_empty());
}

#[test]
fn test_failed_replace_keeps_previous_policy() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    let id = world.policy("p", 1, &yes, &[&permit]);
    let before = world.registry.get_policy(&world.alice, &id).unwrap();

    let err = world
        .registry
        .replace_policy(
            &world.alice,
            &id,
            PolicyDraft::new("p", 1, ConditionId::new("gone")).with_access_type(AccessType::Read),
        )
        .unwrap_err();
    assert!(matches!(err, PolicyError::DanglingReference { kind: ObjectKind::Condition, .. }));
    assert_eq!(world.registry.get_policy(&world.alice, &id).unwrap(), before);
}

#[test]
fn test_rename_onto_taken_name() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    world.policy("first", 1, &yes, &[]);
    let second = world.policy("second", 2, &yes, &[]);

    let err = world
        .registry
        .replace_policy(
            &world.alice,
            &second,
            PolicyDraft::new("first", 2, yes).with_access_type(AccessType::Read),
        )
        .unwrap_err();
    assert_eq!(err, PolicyError::DuplicatePolicyName("first".into()));
}

#[test]
fn test_referenced_objects_survive_delete_attempts() {
    let world = World::new();
    let admin = world.condition("admin", role_is("admin"));
    let permit = world.effect("permit", EffectKind::Permit);
    let policy = world.policy("admins", 1, &admin, &[&permit]);

    assert!(matches!(
        world.registry.delete_condition(&world.alice, &admin),
        Err(PolicyError::StillReferenced { kind: ObjectKind::Condition, .. })
    ));
    assert!(matches!(
        world.registry.delete_effect(&world.alice, &permit),
        Err(PolicyError::StillReferenced { kind: ObjectKind::Effect, .. })
    ));

    world.registry.delete_policy(&world.alice, &policy).unwrap();
    world.registry.delete_condition(&world.alice, &admin).unwrap();
    world.registry.delete_effect(&world.alice, &permit).unwrap();
    assert!(world.registry.list_conditions(&world.alice).unwrap().is_empty());
    assert!(world.registry.list_effects(&world.alice).unwrap().is_empty());
}

#[test]
fn test_ownership_enforced_everywhere() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);
    let policy = world.policy("p", 1, &yes, &[&permit]);

    let unauthorized = |result: Result<_, PolicyError>| {
        matches!(result, Err(PolicyError::UnauthorizedAccess { .. }))
    };
    assert!(unauthorized(world.registry.get_policy(&world.bob, &policy).map(drop)));
    assert!(unauthorized(world.registry.delete_policy(&world.bob, &policy).map(drop)));
    assert!(unauthorized(world.registry.get_condition(&world.bob, &yes).map(drop)));
    assert!(unauthorized(
        world
            .registry
            .replace_condition(&world.bob, &yes, ConditionDraft::new("yes", always(false)))
            .map(drop)
    ));
    assert!(unauthorized(world.registry.get_effect(&world.bob, &permit).map(drop)));
    assert!(unauthorized(
        world
            .registry
            .replace_effect(&world.bob, &permit, EffectDraft::new("permit", EffectKind::Deny))
            .map(drop)
    ));

    let stored = world.registry.get_policy(&world.alice, &policy).unwrap();
    assert!(can_manage(&world.alice, &stored));
    assert!(!can_manage(&world.bob, &stored));
}

#[test]
fn test_bob_may_reference_alice_objects() {
    let world = World::new();
    let yes = world.condition("yes", always(true));
    let permit = world.effect("permit", EffectKind::Permit);

    let policy = world
        .registry
        .create_policy(
            &world.bob,
            PolicyDraft::new("bobs", 1, yes)
                .with_access_type(AccessType::Read)
                .with_effect(permit),
        )
        .unwrap();
    assert_eq!(policy.owner, world.bob);
    assert_eq!(world.registry.list_policies(&world.bob).unwrap(), vec![policy]);
    assert!(world.registry.list_policies(&world.alice).unwrap().is_empty());
}

#[test]
fn test_invalid_drafts() {
    let world = World::new();
    let yes = world.condition("yes", always(true));

    let no_access = world
        .registry
        .create_policy(&world.alice, PolicyDraft::new("p", 1, yes.clone()))
        .unwrap_err();
    assert!(matches!(no_access, PolicyError::InvalidDefinition(_)));

    let blank = world
        .registry
        .create_condition(&world.alice, ConditionDraft::new("  ", always(true)))
        .unwrap_err();
    assert!(matches!(blank, PolicyError::InvalidDefinition(_)));

    let empty_all = world
        .registry
        .create_condition(
            &world.alice,
            ConditionDraft::new("all-of-nothing", ConditionKind::All { conditions: vec![] }),
        )
        .unwrap_err();
    assert!(matches!(empty_all, PolicyError::InvalidDefinition(_)));
}

#[test]
fn test_unknown_subject_cannot_manage() {
    let world = World::new();
    let err = world
        .registry
        .list_policies(&SubjectId::new("mallory"))
        .unwrap_err();
    assert_eq!(err, PolicyError::SubjectNotFound("mallory".into()));
}
