/*!
 * Request Context
 * Attributes describing the circumstances of an authorization request
 */

use crate::core::path;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{serde_as, TimestampSeconds};
use std::time::{SystemTime, UNIX_EPOCH};

/// Request context for condition evaluation
///
/// Attributes are kept in a sorted map so that identical contexts hash and
/// serialize identically.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RequestContext {
    /// When the request was made
    #[serde_as(as = "TimestampSeconds<i64>")]
    #[serde(default = "SystemTime::now")]
    pub timestamp: SystemTime,
    /// Request attributes (role, location, counters, ...)
    #[serde(default)]
    pub attributes: Map<String, Value>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self {
            timestamp: SystemTime::now(),
            attributes: Map::new(),
        }
    }

    /// Context pinned to a fixed instant
    pub fn at(timestamp: SystemTime) -> Self {
        Self {
            timestamp,
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute by dotted path
    pub fn attribute(&self, path: &str) -> Option<&Value> {
        path::lookup(&self.attributes, path)
    }

    /// Seconds since the unix epoch; instants before the epoch clamp to zero
    pub fn unix_seconds(&self) -> u64 {
        self.timestamp
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Map<String, Value>> for RequestContext {
    fn from(attributes: Map<String, Value>) -> Self {
        Self {
            timestamp: SystemTime::now(),
            attributes,
        }
    }
}
