/*!
 * Policy Module
 * Policy records, request context and the decision engine
 */

mod context;
mod engine;
mod types;

pub use context::RequestContext;
pub use engine::{CompiledPolicy, DecisionEngine, Evaluation, PolicyCompiler};
pub use types::{Policy, PolicyDraft};
