/*!
 * Effect Module
 * Decision changes and payload transforms attached to policies
 */

mod apply;
mod types;

pub use apply::EffectScope;
pub use types::{Effect, EffectDraft, EffectKind, LogLevel};
