/*!
 * Resource Payload
 * Representation of the protected object returned to callers
 */

use super::path;
use super::types::{ResourceId, SubjectId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A protected resource and the attributes a caller may see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Resource {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<SubjectId>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl Resource {
    pub fn new(id: impl Into<ResourceId>) -> Self {
        Self {
            id: id.into(),
            owner: None,
            attributes: Map::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<SubjectId>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute by dotted path
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        path::lookup(&self.attributes, path)
    }

    pub fn attribute_mut(&mut self, path: &str) -> Option<&mut Value> {
        path::lookup_mut(&mut self.attributes, path)
    }

    /// Remove an attribute by dotted path
    pub fn redact(&mut self, path: &str) -> bool {
        path::remove(&mut self.attributes, path).is_some()
    }
}
