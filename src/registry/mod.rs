/*!
 * Policy Registry
 * Create, replace, delete and read policies, conditions and effects
 *
 * Every call first resolves the requesting subject. Mutations pass through a
 * single write gate, so uniqueness and referential-integrity checks cannot be
 * raced past by another registry call; the repositories' own atomic name
 * check covers writers that bypass the registry.
 */

mod conditions;
mod effects;
mod policies;

use crate::condition::ConditionResolver;
use crate::config::EngineConfig;
use crate::core::{ObjectKind, PolicyError, PolicyResult, StoreError, SubjectId};
use crate::policy::PolicyCompiler;
use crate::store::Repositories;
use parking_lot::Mutex;
use tracing::warn;

pub struct PolicyRegistry {
    repositories: Repositories,
    max_condition_depth: usize,
    write_gate: Mutex<()>,
}

impl std::fmt::Debug for PolicyRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyRegistry")
            .field("max_condition_depth", &self.max_condition_depth)
            .finish_non_exhaustive()
    }
}

impl PolicyRegistry {
    pub fn new(repositories: Repositories) -> Self {
        Self::with_config(repositories, &EngineConfig::default())
    }

    pub fn with_config(repositories: Repositories, config: &EngineConfig) -> Self {
        Self {
            repositories,
            max_condition_depth: config.max_condition_depth,
            write_gate: Mutex::new(()),
        }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repositories
    }

    fn resolve_subject(&self, subject: &SubjectId) -> PolicyResult<()> {
        if self.repositories.subjects.exists(subject)? {
            Ok(())
        } else {
            warn!(subject = %subject, "Unknown subject");
            Err(PolicyError::SubjectNotFound(subject.to_string()))
        }
    }

    fn condition_resolver(&self) -> ConditionResolver<'_> {
        ConditionResolver::new(self.repositories.conditions.as_ref(), self.max_condition_depth)
    }

    fn compiler(&self) -> PolicyCompiler<'_> {
        PolicyCompiler::new(
            self.repositories.conditions.as_ref(),
            self.repositories.effects.as_ref(),
            self.max_condition_depth,
        )
    }
}

/// Translate a repository failure for an object of `kind`
fn store_error(kind: ObjectKind, err: StoreError) -> PolicyError {
    match err {
        StoreError::DuplicateName(name) => duplicate_name(kind, name),
        StoreError::NotFound(id) => PolicyError::not_found(kind, id),
        other => PolicyError::Store(other),
    }
}

fn duplicate_name(kind: ObjectKind, name: String) -> PolicyError {
    match kind {
        ObjectKind::Policy => PolicyError::DuplicatePolicyName(name),
        kind => PolicyError::DuplicateName { kind, name },
    }
}
