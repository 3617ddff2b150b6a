/*!
 * Condition Module
 * Boolean predicates over the request context
 *
 * Conditions are stored as `ConditionKind` records that may reference other
 * conditions by id. Before evaluation they are resolved into a
 * `ConditionExpr` tree; only resolved trees are ever evaluated.
 */

mod compile;
mod evaluate;
mod types;

pub use compile::ConditionResolver;
pub use types::{CompareOp, Condition, ConditionDraft, ConditionExpr, ConditionKind};
pub(crate) use types::validate_name;
