/*!
 * Effect Application
 * Folds a single effect into the running decision and payload
 */

use super::types::{EffectKind, LogLevel};
use crate::core::{AccessType, PolicyDecision, PolicyId, Resource};
use crate::policy::RequestContext;
use serde_json::{Number, Value};
use tracing::{debug, error, info, trace, warn};

/// What an effect may look at besides the decision and payload
#[derive(Debug, Clone, Copy)]
pub struct EffectScope<'a> {
    /// Policy whose effect list is being applied
    pub policy: &'a PolicyId,
    pub access_type: AccessType,
    pub context: &'a RequestContext,
}

impl EffectKind {
    /// Apply the effect
    ///
    /// Total: combinations that make no sense (filtering a denied payload,
    /// missing fields, missing counters) leave their inputs unchanged.
    pub fn apply(
        &self,
        scope: &EffectScope<'_>,
        decision: PolicyDecision,
        payload: Option<Resource>,
    ) -> (PolicyDecision, Option<Resource>) {
        match self {
            EffectKind::Deny => (PolicyDecision::Deny, payload),
            EffectKind::Permit => {
                if decision.is_deny() {
                    (decision, payload)
                } else {
                    (PolicyDecision::Permit, payload)
                }
            }
            EffectKind::FieldFilter { fields } => {
                if decision.is_deny() {
                    return (decision, payload);
                }
                let payload = payload.map(|mut resource| {
                    for field in fields {
                        resource.redact(field);
                    }
                    resource
                });
                (decision, payload)
            }
            EffectKind::Accuracy { fields, step } => {
                if decision.is_deny() || !(step.is_finite() && *step > 0.0) {
                    return (decision, payload);
                }
                let payload = payload.map(|mut resource| {
                    for field in fields {
                        if let Some(value) = resource.attribute_mut(field) {
                            round_to_step(value, *step);
                        }
                    }
                    resource
                });
                (decision, payload)
            }
            EffectKind::Log { level, message } => {
                emit(*level, scope, decision, message);
                (decision, payload)
            }
            EffectKind::RateLimit { attribute, limit } => {
                let exceeded = scope
                    .context
                    .attribute(attribute)
                    .and_then(counter)
                    .is_some_and(|count| count > *limit);
                if exceeded {
                    debug!(
                        policy = %scope.policy,
                        attribute = %attribute,
                        limit = *limit,
                        "Rate limit exceeded"
                    );
                    (PolicyDecision::Deny, payload)
                } else {
                    (decision, payload)
                }
            }
        }
    }
}

fn counter(value: &Value) -> Option<u64> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v.ceil() as u64))
}

/// Round to the nearest multiple of `step`; stable under repetition
fn round_to_step(value: &mut Value, step: f64) {
    let Some(raw) = value.as_f64() else {
        return;
    };
    if let Some(rounded) = Number::from_f64((raw / step).round() * step) {
        *value = Value::Number(rounded);
    }
}

fn emit(level: LogLevel, scope: &EffectScope<'_>, decision: PolicyDecision, message: &str) {
    let policy = scope.policy.as_str();
    let access = scope.access_type.as_str();
    match level {
        LogLevel::Trace => trace!(policy, access, ?decision, "{message}"),
        LogLevel::Debug => debug!(policy, access, ?decision, "{message}"),
        LogLevel::Info => info!(policy, access, ?decision, "{message}"),
        LogLevel::Warn => warn!(policy, access, ?decision, "{message}"),
        LogLevel::Error => error!(policy, access, ?decision, "{message}"),
    }
}
