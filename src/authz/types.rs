/*!
 * Authorization Types
 * Outcome of a facade call
 */

use crate::core::{AccessType, Decision, PolicyId, Resource, SubjectId};
use serde::{Deserialize, Serialize};

/// Final decision with its explanation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthorizationOutcome {
    pub subject: SubjectId,
    pub access_type: AccessType,
    pub decision: Decision,
    /// Transformed payload; always `None` when denied
    pub resource: Option<Resource>,
    /// Policies that fired, in evaluation order
    pub fired: Vec<PolicyId>,
    pub reason: String,
    #[serde(default)]
    pub cached: bool,
}

impl AuthorizationOutcome {
    pub fn is_permitted(&self) -> bool {
        self.decision.is_permitted()
    }

    pub fn with_cached(mut self, cached: bool) -> Self {
        self.cached = cached;
        self
    }

    /// The `(decision, payload)` pair
    pub fn into_parts(self) -> (Decision, Option<Resource>) {
        (self.decision, self.resource)
    }
}
