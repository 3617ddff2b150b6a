/*!
 * Effect Management
 */

use super::{duplicate_name, store_error, PolicyRegistry};
use crate::authz::ensure_can_manage;
use crate::core::{EffectId, ObjectKind, PolicyError, PolicyResult, SubjectId};
use crate::effect::{Effect, EffectDraft};
use tracing::{info, instrument};

impl PolicyRegistry {
    #[instrument(skip(self), fields(subject = %subject))]
    pub fn list_effects(&self, subject: &SubjectId) -> PolicyResult<Vec<Effect>> {
        self.resolve_subject(subject)?;
        Ok(self.repositories.effects.find_by_owner(subject)?)
    }

    #[instrument(skip(self), fields(subject = %subject, effect = %id))]
    pub fn get_effect(&self, subject: &SubjectId, id: &EffectId) -> PolicyResult<Effect> {
        self.resolve_subject(subject)?;
        let effect = self.load_effect(id)?;
        ensure_can_manage(subject, &effect)?;
        Ok(effect)
    }

    #[instrument(skip_all, fields(subject = %owner, name = %draft.name))]
    pub fn create_effect(&self, owner: &SubjectId, draft: EffectDraft) -> PolicyResult<Effect> {
        self.resolve_subject(owner)?;
        draft.validate()?;

        let _gate = self.write_gate.lock();
        if self.repositories.effects.exists_by_name(&draft.name)? {
            return Err(duplicate_name(ObjectKind::Effect, draft.name));
        }

        let effect = self
            .repositories
            .effects
            .save(draft.into_effect(EffectId::generate(), owner.clone()))
            .map_err(|err| store_error(ObjectKind::Effect, err))?;
        self.repositories.policies.bump();
        info!(effect = %effect.id, kind = %effect_kind(&effect), "Effect created");
        Ok(effect)
    }

    #[instrument(skip_all, fields(subject = %subject, effect = %id))]
    pub fn replace_effect(
        &self,
        subject: &SubjectId,
        id: &EffectId,
        draft: EffectDraft,
    ) -> PolicyResult<Effect> {
        self.resolve_subject(subject)?;
        draft.validate()?;

        let _gate = self.write_gate.lock();
        let existing = self.load_effect(id)?;
        ensure_can_manage(subject, &existing)?;

        if existing.name != draft.name && self.repositories.effects.exists_by_name(&draft.name)? {
            return Err(duplicate_name(ObjectKind::Effect, draft.name));
        }

        let effect = self
            .repositories
            .effects
            .replace(draft.into_effect(id.clone(), existing.owner))
            .map_err(|err| store_error(ObjectKind::Effect, err))?;
        self.repositories.policies.bump();
        info!("Effect replaced");
        Ok(effect)
    }

    /// Delete an effect no policy references
    #[instrument(skip(self), fields(subject = %subject, effect = %id))]
    pub fn delete_effect(&self, subject: &SubjectId, id: &EffectId) -> PolicyResult<Effect> {
        self.resolve_subject(subject)?;

        let _gate = self.write_gate.lock();
        let existing = self.load_effect(id)?;
        ensure_can_manage(subject, &existing)?;

        if let Some(policy) = self
            .repositories
            .policies
            .find_all()?
            .into_iter()
            .find(|policy| policy.references_effect(id))
        {
            return Err(PolicyError::StillReferenced {
                kind: ObjectKind::Effect,
                id: id.to_string(),
                by: policy.name,
            });
        }

        let removed = self
            .repositories
            .effects
            .delete(id)?
            .ok_or_else(|| PolicyError::not_found(ObjectKind::Effect, id))?;
        self.repositories.policies.bump();
        info!("Effect deleted");
        Ok(removed)
    }

    fn load_effect(&self, id: &EffectId) -> PolicyResult<Effect> {
        self.repositories
            .effects
            .find_by_id(id)?
            .ok_or_else(|| PolicyError::not_found(ObjectKind::Effect, id))
    }
}

fn effect_kind(effect: &Effect) -> &'static str {
    effect
        .definition
        .known()
        .map(|kind| kind.variant_name())
        .unwrap_or("unrecognized")
}
