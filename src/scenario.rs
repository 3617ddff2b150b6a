/*!
 * Scenario Files
 * Declarative setup and requests for the `abac` binary
 *
 * A scenario lists subjects, then conditions, effects and policies that refer
 * to each other by name, then the requests to evaluate. Objects are created
 * through the registry in file order, so a composite condition must follow
 * its children.
 *
 * ```json
 * {
 *   "subjects": ["alice"],
 *   "conditions": [{"owner": "alice", "name": "is-admin",
 *                   "definition": {"type": "attribute_compare", "attribute": "role", "op": "==", "value": "admin"}}],
 *   "effects": [{"owner": "alice", "name": "permit", "definition": {"type": "permit"}}],
 *   "policies": [{"owner": "alice", "name": "admins", "priority": 1, "access_types": ["read"],
 *                 "condition": "is-admin", "effects": ["permit"]}],
 *   "requests": [{"subject": "alice", "access_type": "read", "context": {"attributes": {"role": "admin"}}}]
 * }
 * ```
 */

use crate::authz::{AuthorizationOutcome, Authorizer};
use crate::condition::{ConditionDraft, ConditionKind};
use crate::config::EngineConfig;
use crate::core::{
    AccessType, AuthzError, ConditionId, EffectId, ObjectKind, PolicyError, Resource, SubjectId,
};
use crate::effect::{EffectDraft, EffectKind};
use crate::policy::{PolicyDraft, RequestContext};
use crate::registry::PolicyRegistry;
use crate::store::{MemorySubjectDirectory, Repositories};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug, Diagnostic)]
pub enum ScenarioError {
    #[error("Malformed scenario: {0}")]
    #[diagnostic(code(scenario::parse))]
    Parse(#[from] serde_json::Error),

    #[error("Scenario refers to unknown {kind} '{name}'")]
    #[diagnostic(
        code(scenario::unknown_name),
        help("Declare objects before the objects that refer to them.")
    )]
    UnknownName { kind: ObjectKind, name: String },

    #[error("Could not create {kind} '{name}'")]
    #[diagnostic(code(scenario::setup))]
    Setup {
        kind: ObjectKind,
        name: String,
        #[source]
        source: PolicyError,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioCondition {
    pub owner: SubjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Composite children are given by condition name
    pub definition: ConditionKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioEffect {
    pub owner: SubjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub definition: EffectKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioPolicy {
    pub owner: SubjectId,
    pub name: String,
    pub priority: i32,
    pub access_types: BTreeSet<AccessType>,
    /// Condition name
    pub condition: String,
    /// Effect names, in application order
    #[serde(default)]
    pub effects: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScenarioRequest {
    pub subject: SubjectId,
    /// Kept as text so unknown access types surface as request errors
    pub access_type: String,
    #[serde(default)]
    pub resource: Option<Resource>,
    #[serde(default)]
    pub context: RequestContext,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub subjects: Vec<SubjectId>,
    #[serde(default)]
    pub conditions: Vec<ScenarioCondition>,
    #[serde(default)]
    pub effects: Vec<ScenarioEffect>,
    #[serde(default)]
    pub policies: Vec<ScenarioPolicy>,
    #[serde(default)]
    pub requests: Vec<ScenarioRequest>,
}

/// Result of one scenario request
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RequestReport {
    Decided(AuthorizationOutcome),
    Failed { subject: SubjectId, error: AuthzError },
}

impl Scenario {
    pub fn from_json(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Create every subject and object through a fresh registry
    pub fn install(&self, config: &EngineConfig) -> Result<PolicyRegistry, ScenarioError> {
        let subjects = Arc::new(MemorySubjectDirectory::with_subjects(
            self.subjects.iter().cloned(),
        ));
        let registry = PolicyRegistry::with_config(Repositories::in_memory(subjects), config);

        let mut conditions: HashMap<&str, ConditionId> = HashMap::new();
        for entry in &self.conditions {
            let definition = entry
                .definition
                .clone()
                .map_children(|child| lookup(&conditions, ObjectKind::Condition, child.as_str()))?;
            let mut draft = ConditionDraft::new(entry.name.clone(), definition);
            draft.description = entry.description.clone();

            let created = registry
                .create_condition(&entry.owner, draft)
                .map_err(|source| setup(ObjectKind::Condition, &entry.name, source))?;
            debug!(name = %entry.name, id = %created.id, "Scenario condition created");
            conditions.insert(entry.name.as_str(), created.id);
        }

        let mut effects: HashMap<&str, EffectId> = HashMap::new();
        for entry in &self.effects {
            let mut draft = EffectDraft::new(entry.name.clone(), entry.definition.clone());
            draft.description = entry.description.clone();

            let created = registry
                .create_effect(&entry.owner, draft)
                .map_err(|source| setup(ObjectKind::Effect, &entry.name, source))?;
            effects.insert(entry.name.as_str(), created.id);
        }

        for entry in &self.policies {
            let condition = lookup(&conditions, ObjectKind::Condition, &entry.condition)?;
            let mut draft = PolicyDraft::new(entry.name.clone(), entry.priority, condition)
                .with_access_types(entry.access_types.iter().copied());
            for name in &entry.effects {
                draft = draft.with_effect(lookup(&effects, ObjectKind::Effect, name)?);
            }

            registry
                .create_policy(&entry.owner, draft)
                .map_err(|source| setup(ObjectKind::Policy, &entry.name, source))?;
        }

        info!(
            subjects = self.subjects.len(),
            conditions = self.conditions.len(),
            effects = self.effects.len(),
            policies = self.policies.len(),
            "Scenario installed"
        );
        Ok(registry)
    }

    /// Install the scenario and evaluate its requests in order
    pub fn run(&self, config: &EngineConfig) -> Result<Vec<RequestReport>, ScenarioError> {
        let registry = self.install(config)?;
        let authorizer = Authorizer::with_config(registry.repositories().clone(), config.clone());

        Ok(self
            .requests
            .iter()
            .map(|request| {
                match authorizer.authorize_named(
                    &request.subject,
                    request.resource.clone(),
                    &request.access_type,
                    &request.context,
                ) {
                    Ok(outcome) => RequestReport::Decided(outcome),
                    Err(error) => RequestReport::Failed {
                        subject: request.subject.clone(),
                        error,
                    },
                }
            })
            .collect())
    }
}

fn lookup<Id: Clone>(
    ids: &HashMap<&str, Id>,
    kind: ObjectKind,
    name: &str,
) -> Result<Id, ScenarioError> {
    ids.get(name).cloned().ok_or_else(|| ScenarioError::UnknownName {
        kind,
        name: name.to_string(),
    })
}

fn setup(kind: ObjectKind, name: &str, source: PolicyError) -> ScenarioError {
    ScenarioError::Setup {
        kind,
        name: name.to_string(),
        source,
    }
}
