/*!
 * Management Capability
 * Who may read, replace or delete a stored object
 */

use crate::condition::Condition;
use crate::core::{ObjectKind, PolicyError, PolicyResult, SubjectId};
use crate::effect::Effect;
use crate::policy::Policy;

/// An object with a single owning subject
pub trait Owned {
    const KIND: ObjectKind;

    fn owner(&self) -> &SubjectId;

    /// Identifier used in error messages
    fn key(&self) -> String;
}

impl Owned for Policy {
    const KIND: ObjectKind = ObjectKind::Policy;

    fn owner(&self) -> &SubjectId {
        &self.owner
    }

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Owned for Condition {
    const KIND: ObjectKind = ObjectKind::Condition;

    fn owner(&self) -> &SubjectId {
        &self.owner
    }

    fn key(&self) -> String {
        self.id.to_string()
    }
}

impl Owned for Effect {
    const KIND: ObjectKind = ObjectKind::Effect;

    fn owner(&self) -> &SubjectId {
        &self.owner
    }

    fn key(&self) -> String {
        self.id.to_string()
    }
}

/// Only the owner may manage an object
pub fn can_manage<T: Owned>(subject: &SubjectId, item: &T) -> bool {
    item.owner() == subject
}

pub fn ensure_can_manage<T: Owned>(subject: &SubjectId, item: &T) -> PolicyResult<()> {
    if can_manage(subject, item) {
        Ok(())
    } else {
        Err(PolicyError::UnauthorizedAccess {
            subject: subject.clone(),
            kind: T::KIND,
            id: item.key(),
        })
    }
}
