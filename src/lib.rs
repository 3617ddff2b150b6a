/*!
 * ABAC Kernel Library
 * Attribute-based access-control decision engine
 *
 * Policies bind a condition over the request context to an ordered list of
 * effects. The authorizer selects the policies governing a request, evaluates
 * them by priority and folds their effects into a single decision and a
 * possibly transformed resource. The registry manages the stored objects.
 */

pub mod authz;
pub mod condition;
pub mod config;
pub mod core;
pub mod effect;
pub mod monitoring;
pub mod policy;
pub mod registry;
pub mod scenario;
pub mod store;

// Re-exports
pub use authz::{can_manage, AuthorizationOutcome, Authorizer};
pub use condition::{CompareOp, Condition, ConditionDraft, ConditionKind};
pub use config::{CandidateScope, ConfigError, EngineConfig};
pub use crate::core::{
    AccessType, AuthzError, AuthzResult, ConditionId, Decision, EffectId, ObjectKind, PolicyError,
    PolicyId, PolicyResult, Resource, ResourceId, StoreError, StoreResult, SubjectId,
};
pub use effect::{Effect, EffectDraft, EffectKind, LogLevel};
pub use monitoring::{init_tracing, init_tracing_from_env};
pub use policy::{DecisionEngine, Evaluation, Policy, PolicyDraft, RequestContext};
pub use registry::PolicyRegistry;
pub use scenario::{RequestReport, Scenario, ScenarioError};
pub use store::{MemorySubjectDirectory, Repositories};
