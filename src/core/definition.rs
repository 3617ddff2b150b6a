/*!
 * Stored Definitions
 * Forward-compatible wrapper around condition and effect variants
 */

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A stored variant that is either understood by this engine or not
///
/// Records written by a newer engine deserialize as `Unrecognized` instead of
/// failing the whole load; compilation then rejects them explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Definition<T> {
    Known(T),
    Unrecognized(Value),
}

impl<T> Definition<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Definition::Known(inner) => Some(inner),
            Definition::Unrecognized(_) => None,
        }
    }

    /// Variant tag of an unrecognized record, for diagnostics
    pub fn unrecognized_tag(&self) -> Option<String> {
        match self {
            Definition::Known(_) => None,
            Definition::Unrecognized(raw) => Some(
                raw.get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("<untagged>")
                    .to_string(),
            ),
        }
    }
}

impl<T> From<T> for Definition<T> {
    fn from(inner: T) -> Self {
        Definition::Known(inner)
    }
}
