/*!
 * Condition Types
 * Stored condition records and their resolved evaluation trees
 */

use crate::core::limits::{MAX_COMPOSITE_CHILDREN, MAX_NAME_LEN};
use crate::core::{ConditionId, Definition, PolicyError, PolicyResult, SubjectId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Comparison operator for attribute conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Ge,
    /// Context value is one of the listed values
    #[serde(rename = "in")]
    In,
    /// Context array contains the value, or context string contains the substring
    #[serde(rename = "contains")]
    Contains,
    #[serde(rename = "starts_with")]
    StartsWith,
}

/// Condition variants as stored and exchanged
///
/// Composite variants reference their children by id so that conditions can
/// be shared between policies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum ConditionKind {
    /// Constant outcome
    Always { value: bool },
    /// Attribute equals a value
    Equals { attribute: String, value: Value },
    /// Attribute compared against a value
    AttributeCompare {
        attribute: String,
        op: CompareOp,
        value: Value,
    },
    /// Attribute is present (any value, including null)
    Exists { attribute: String },
    /// Request timestamp lies within the window (unix seconds, inclusive)
    TimeWindow {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_before: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        not_after: Option<u64>,
    },
    /// Every child holds
    All { conditions: Vec<ConditionId> },
    /// At least one child holds
    Any { conditions: Vec<ConditionId> },
    /// Child does not hold
    Not { condition: ConditionId },
}

impl ConditionKind {
    /// Short variant tag, matching the serialized `type`
    pub fn variant_name(&self) -> &'static str {
        match self {
            ConditionKind::Always { .. } => "always",
            ConditionKind::Equals { .. } => "equals",
            ConditionKind::AttributeCompare { .. } => "attribute_compare",
            ConditionKind::Exists { .. } => "exists",
            ConditionKind::TimeWindow { .. } => "time_window",
            ConditionKind::All { .. } => "all",
            ConditionKind::Any { .. } => "any",
            ConditionKind::Not { .. } => "not",
        }
    }

    /// Ids of referenced child conditions
    pub fn children(&self) -> Vec<&ConditionId> {
        match self {
            ConditionKind::All { conditions } | ConditionKind::Any { conditions } => {
                conditions.iter().collect()
            }
            ConditionKind::Not { condition } => vec![condition],
            ConditionKind::Always { .. }
            | ConditionKind::Equals { .. }
            | ConditionKind::AttributeCompare { .. }
            | ConditionKind::Exists { .. }
            | ConditionKind::TimeWindow { .. } => Vec::new(),
        }
    }

    /// Rewrite child references, e.g. when importing by name
    pub fn map_children<E>(
        self,
        mut f: impl FnMut(ConditionId) -> Result<ConditionId, E>,
    ) -> Result<Self, E> {
        Ok(match self {
            ConditionKind::All { conditions } => ConditionKind::All {
                conditions: conditions.into_iter().map(&mut f).collect::<Result<_, _>>()?,
            },
            ConditionKind::Any { conditions } => ConditionKind::Any {
                conditions: conditions.into_iter().map(&mut f).collect::<Result<_, _>>()?,
            },
            ConditionKind::Not { condition } => ConditionKind::Not {
                condition: f(condition)?,
            },
            leaf => leaf,
        })
    }

    /// Structural checks that do not need the store
    pub fn validate(&self) -> PolicyResult<()> {
        match self {
            ConditionKind::Equals { attribute, .. }
            | ConditionKind::AttributeCompare { attribute, .. }
            | ConditionKind::Exists { attribute } => {
                if attribute.trim().is_empty() {
                    return Err(PolicyError::InvalidDefinition(format!(
                        "{} condition needs an attribute",
                        self.variant_name()
                    )));
                }
            }
            ConditionKind::TimeWindow {
                not_before: Some(start),
                not_after: Some(end),
            } if start > end => {
                return Err(PolicyError::InvalidDefinition(format!(
                    "time window starts ({start}) after it ends ({end})"
                )));
            }
            ConditionKind::All { conditions } | ConditionKind::Any { conditions } => {
                if conditions.is_empty() {
                    return Err(PolicyError::InvalidDefinition(format!(
                        "{} condition needs at least one child",
                        self.variant_name()
                    )));
                }
                if conditions.len() > MAX_COMPOSITE_CHILDREN {
                    return Err(PolicyError::InvalidDefinition(format!(
                        "{} condition has more than {MAX_COMPOSITE_CHILDREN} children",
                        self.variant_name()
                    )));
                }
            }
            _ => {}
        }
        Ok(())
    }
}

/// A persisted, named condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Condition {
    pub id: ConditionId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub owner: SubjectId,
    pub definition: Definition<ConditionKind>,
}

impl Condition {
    pub fn new(name: impl Into<String>, owner: SubjectId, kind: ConditionKind) -> Self {
        Self {
            id: ConditionId::generate(),
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

    /// Child ids, empty for unrecognized definitions
    pub fn children(&self) -> Vec<&ConditionId> {
        self.definition
            .known()
            .map(ConditionKind::children)
            .unwrap_or_default()
    }
}

/// Everything needed to create or replace a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConditionDraft {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub definition: ConditionKind,
}

impl ConditionDraft {
    pub fn new(name: impl Into<String>, definition: ConditionKind) -> Self {
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

    /// Materialize under an id and owner
    pub fn into_condition(self, id: ConditionId, owner: SubjectId) -> Condition {
        Condition {
            id,
            name: self.name,
            description: self.description,
            owner,
            definition: Definition::Known(self.definition),
        }
    }
}

/// Validate an object name shared by conditions, effects and policies
pub(crate) fn validate_name(name: &str) -> PolicyResult<()> {
    if name.trim().is_empty() {
        return Err(PolicyError::InvalidDefinition("name must not be empty".into()));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(PolicyError::InvalidDefinition(format!(
            "name exceeds {MAX_NAME_LEN} bytes"
        )));
    }
    Ok(())
}

/// Resolved condition tree, the only form the evaluator sees
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionExpr {
    Always(bool),
    Equals {
        attribute: String,
        value: Value,
    },
    Compare {
        attribute: String,
        op: CompareOp,
        value: Value,
    },
    Exists(String),
    TimeWindow {
        not_before: Option<u64>,
        not_after: Option<u64>,
    },
    All(Vec<ConditionExpr>),
    Any(Vec<ConditionExpr>),
    Not(Box<ConditionExpr>),
}

impl ConditionExpr {
    /// Nesting depth, leaves count as one
    pub fn depth(&self) -> usize {
        match self {
            ConditionExpr::All(children) | ConditionExpr::Any(children) => {
                1 + children.iter().map(ConditionExpr::depth).max().unwrap_or(0)
            }
            ConditionExpr::Not(child) => 1 + child.depth(),
            _ => 1,
        }
    }
}
