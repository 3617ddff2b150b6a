/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use super::types::{ConditionId, EffectId, ParseAccessTypeError, PolicyId, SubjectId};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result of a repository call
#[must_use = "store operations can fail and must be handled"]
pub type StoreResult<T> = Result<T, StoreError>;

/// Result of an authorization call
#[must_use = "authorization can fail and must be handled"]
pub type AuthzResult<T> = Result<T, AuthzError>;

/// Result of a policy management call
#[must_use = "policy management operations can fail and must be handled"]
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Errors surfaced by repository implementations
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum StoreError {
    #[error("Name '{0}' is already taken")]
    #[diagnostic(code(store::duplicate_name))]
    DuplicateName(String),

    #[error("Record '{0}' not found")]
    #[diagnostic(code(store::not_found))]
    NotFound(String),

    #[error("Storage backend failure: {0}")]
    #[diagnostic(
        code(store::backend),
        help("The persistence collaborator reported an error. Check its logs.")
    )]
    Backend(String),
}

/// Which kind of object a reference or lookup points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Policy,
    Condition,
    Effect,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Policy => f.write_str("policy"),
            ObjectKind::Condition => f.write_str("condition"),
            ObjectKind::Effect => f.write_str("effect"),
        }
    }
}

/// Failures while resolving stored policies into evaluable form
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum CompileError {
    #[error("Referenced {kind} '{id}' does not exist")]
    #[diagnostic(code(compile::dangling_reference))]
    Dangling { kind: ObjectKind, id: String },

    #[error("Condition '{id}' uses unrecognized variant '{variant}'")]
    #[diagnostic(code(compile::unknown_condition_variant))]
    UnknownCondition { id: ConditionId, variant: String },

    #[error("Effect '{id}' uses unrecognized variant '{variant}'")]
    #[diagnostic(code(compile::unknown_effect_variant))]
    UnknownEffect { id: EffectId, variant: String },

    #[error("Condition '{0}' references itself through its children")]
    #[diagnostic(code(compile::cycle))]
    Cycle(ConditionId),

    #[error("Condition '{id}' nests deeper than {limit} levels")]
    #[diagnostic(code(compile::too_deep))]
    TooDeep { id: ConditionId, limit: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

/// Errors returned by the authorization facade
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum AuthzError {
    #[error("Subject '{0}' could not be resolved")]
    #[diagnostic(
        code(authz::subject_not_found),
        help("The requesting subject is unknown to the subject directory.")
    )]
    SubjectNotFound(String),

    #[error("Access type '{0}' is not recognized")]
    #[diagnostic(
        code(authz::unrecognized_access_type),
        help("Use one of: read, write, execute, delete.")
    )]
    UnrecognizedAccessType(String),

    #[error("Condition '{id}' uses unrecognized variant '{variant}'")]
    #[diagnostic(
        code(authz::unknown_condition_variant),
        help("A stored condition was written by a newer engine. Evaluation aborted.")
    )]
    UnknownConditionVariant { id: ConditionId, variant: String },

    #[error("Effect '{id}' uses unrecognized variant '{variant}'")]
    #[diagnostic(
        code(authz::unknown_effect_variant),
        help("A stored effect was written by a newer engine. Evaluation aborted.")
    )]
    UnknownEffectVariant { id: EffectId, variant: String },

    #[error("Candidate policy references missing {kind} '{id}'")]
    #[diagnostic(
        code(authz::dangling_reference),
        help("A stored policy outlived one of its conditions or effects. Evaluation aborted.")
    )]
    DanglingReference { kind: ObjectKind, id: String },

    #[error("Condition '{0}' references itself through its children")]
    #[diagnostic(code(authz::condition_cycle))]
    ConditionCycle(ConditionId),

    #[error("Condition '{id}' nests deeper than {limit} levels")]
    #[diagnostic(
        code(authz::condition_too_deep),
        help("Raise max_condition_depth or flatten the condition tree.")
    )]
    ConditionTooDeep { id: ConditionId, limit: usize },

    #[error("Access denied: {0}")]
    #[diagnostic(code(authz::access_denied))]
    AccessDenied(String),

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl From<ParseAccessTypeError> for AuthzError {
    fn from(err: ParseAccessTypeError) -> Self {
        AuthzError::UnrecognizedAccessType(err.0)
    }
}

impl From<CompileError> for AuthzError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::UnknownCondition { id, variant } => {
                AuthzError::UnknownConditionVariant { id, variant }
            }
            CompileError::UnknownEffect { id, variant } => {
                AuthzError::UnknownEffectVariant { id, variant }
            }
            CompileError::Dangling { kind, id } => AuthzError::DanglingReference { kind, id },
            CompileError::Cycle(id) => AuthzError::ConditionCycle(id),
            CompileError::TooDeep { id, limit } => AuthzError::ConditionTooDeep { id, limit },
            CompileError::Store(err) => AuthzError::Store(err),
        }
    }
}

/// Errors returned by policy, condition and effect management
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PolicyError {
    #[error("Subject '{0}' could not be resolved")]
    #[diagnostic(code(policy::subject_not_found))]
    SubjectNotFound(String),

    #[error("A policy named '{0}' already exists")]
    #[diagnostic(
        code(policy::duplicate_name),
        help("Policy names are unique across all owners.")
    )]
    DuplicatePolicyName(String),

    #[error("A {kind} named '{name}' already exists")]
    #[diagnostic(code(policy::duplicate_object_name))]
    DuplicateName { kind: ObjectKind, name: String },

    #[error("Referenced {kind} '{id}' does not exist")]
    #[diagnostic(
        code(policy::dangling_reference),
        help("Create conditions and effects before the policies that use them.")
    )]
    DanglingReference { kind: ObjectKind, id: String },

    #[error("Subject '{subject}' may not manage {kind} '{id}'")]
    #[diagnostic(code(policy::unauthorized_access))]
    UnauthorizedAccess {
        subject: SubjectId,
        kind: ObjectKind,
        id: String,
    },

    #[error("Condition '{id}' uses unrecognized variant '{variant}'")]
    #[diagnostic(code(policy::unknown_condition_variant))]
    UnknownConditionVariant { id: ConditionId, variant: String },

    #[error("Effect '{id}' uses unrecognized variant '{variant}'")]
    #[diagnostic(code(policy::unknown_effect_variant))]
    UnknownEffectVariant { id: EffectId, variant: String },

    #[error("{kind} '{id}' not found")]
    #[diagnostic(code(policy::not_found))]
    NotFound { kind: ObjectKind, id: String },

    #[error("{kind} '{id}' is still referenced by '{by}'")]
    #[diagnostic(
        code(policy::still_referenced),
        help("Remove or replace the referencing objects first.")
    )]
    StillReferenced {
        kind: ObjectKind,
        id: String,
        by: String,
    },

    #[error("Invalid definition: {0}")]
    #[diagnostic(code(policy::invalid_definition))]
    InvalidDefinition(String),

    #[error("Condition '{0}' would reference itself")]
    #[diagnostic(code(policy::condition_cycle))]
    ConditionCycle(ConditionId),

    #[error("Condition '{id}' nests deeper than {limit} levels")]
    #[diagnostic(code(policy::condition_too_deep))]
    ConditionTooDeep { id: ConditionId, limit: usize },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),
}

impl From<CompileError> for PolicyError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Dangling { kind, id } => PolicyError::DanglingReference { kind, id },
            CompileError::UnknownCondition { id, variant } => {
                PolicyError::UnknownConditionVariant { id, variant }
            }
            CompileError::UnknownEffect { id, variant } => {
                PolicyError::UnknownEffectVariant { id, variant }
            }
            CompileError::Cycle(id) => PolicyError::ConditionCycle(id),
            CompileError::TooDeep { id, limit } => PolicyError::ConditionTooDeep { id, limit },
            CompileError::Store(err) => PolicyError::Store(err),
        }
    }
}

impl PolicyError {
    pub fn not_found(kind: ObjectKind, id: impl ToString) -> Self {
        PolicyError::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}
