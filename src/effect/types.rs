/*!
 * Effect Types
 * Stored effect records
 */

use crate::condition::validate_name;
use crate::core::{Definition, EffectId, PolicyError, PolicyResult, SubjectId};
use serde::{Deserialize, Serialize};

/// Level used by the `Log` effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Effect variants as stored and exchanged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum EffectKind {
    /// Grant access unless an earlier policy already denied it
    Permit,
    /// Deny access unconditionally
    Deny,
    /// Remove the named attributes (dotted paths) from the payload
    FieldFilter { fields: Vec<String> },
    /// Round the named numeric attributes to a multiple of `step`
    Accuracy { fields: Vec<String>, step: f64 },
    /// Emit a log event, leaving decision and payload untouched
    Log {
        #[serde(default)]
        level: LogLevel,
        message: String,
    },
    /// Deny once the counter at `attribute` in the context exceeds `limit`
    RateLimit { attribute: String, limit: u64 },
}

impl EffectKind {
    /// Short variant tag, matching the serialized `type`
    pub fn variant_name(&self) -> &'static str {
        match self {
            EffectKind::Permit => "permit",
            EffectKind::Deny => "deny",
            EffectKind::FieldFilter { .. } => "field_filter",
            EffectKind::Accuracy { .. } => "accuracy",
            EffectKind::Log { .. } => "log",
            EffectKind::RateLimit { .. } => "rate_limit",
        }
    }

    /// Structural checks that do not need the store
    pub fn validate(&self) -> PolicyResult<()> {
        match self {
            EffectKind::FieldFilter { fields } | EffectKind::Accuracy { fields, .. }
                if fields.is_empty() || fields.iter().any(|f| f.trim().is_empty()) =>
            {
                Err(PolicyError::InvalidDefinition(format!(
                    "{} effect needs non-empty field names",
                    self.variant_name()
                )))
            }
            EffectKind::Accuracy { step, .. } if !(step.is_finite() && *step > 0.0) => Err(
                PolicyError::InvalidDefinition(format!("accuracy step must be positive, got {step}")),
            ),
            EffectKind::RateLimit { attribute, .. } if attribute.trim().is_empty() => Err(
                PolicyError::InvalidDefinition("rate_limit effect needs an attribute".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// A persisted, named effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Effect {
    pub id: EffectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: SubjectId,
    pub definition: Definition<EffectKind>,
}

impl Effect {
    pub fn new(name: impl Into<String>, owner: SubjectId, kind: EffectKind) -> Self {
        Self {
            id: EffectId::generate(),
            name: name.into(),
            description: None,
            owner,
            definition: Definition::Known(kind),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Everything needed to create or replace an effect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EffectDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub definition: EffectKind,
}

impl EffectDraft {
    pub fn new(name: impl Into<String>, definition: EffectKind) -> Self {
        Self {
            name: name.into(),
            description: None,
            definition,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn validate(&self) -> PolicyResult<()> {
        validate_name(&self.name)?;
        self.definition.validate()
    }

    pub fn into_effect(self, id: EffectId, owner: SubjectId) -> Effect {
        Effect {
            id,
            name: self.name,
            description: self.description,
            owner,
            definition: Definition::Known(self.definition),
        }
    }
}
