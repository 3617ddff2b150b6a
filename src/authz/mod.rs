/*!
 * Authorization Module
 * Facade, management capability checks, decision cache and audit trail
 */

mod audit;
mod cache;
mod capability;
mod facade;
mod types;

pub use audit::{AuditEvent, AuditLogger, AuditSeverity, AuditStats};
pub use cache::{CacheKey, CacheStats, DecisionCache};
pub use capability::{can_manage, ensure_can_manage, Owned};
pub use facade::Authorizer;
pub use types::AuthorizationOutcome;
