/*!
 * Core Types
 * Identifiers, access types and decisions shared across the engine
 */

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a fresh random identifier
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

string_id!(
    /// Opaque identity of a user, supplied by the authentication layer
    SubjectId
);
string_id!(
    /// Policy identifier, also the priority tie-breaker
    PolicyId
);
string_id!(
    /// Condition identifier
    ConditionId
);
string_id!(
    /// Effect identifier
    EffectId
);
string_id!(
    /// Identifier of a protected resource (device, sensor, ...)
    ResourceId
);

/// Kind of operation requested on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessType {
    Read,
    Write,
    Execute,
    Delete,
}

impl AccessType {
    pub const ALL: [AccessType; 4] = [
        AccessType::Read,
        AccessType::Write,
        AccessType::Execute,
        AccessType::Delete,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessType::Read => "read",
            AccessType::Write => "write",
            AccessType::Execute => "execute",
            AccessType::Delete => "delete",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an access type tag is not one of the known kinds
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unrecognized access type '{0}'")]
pub struct ParseAccessTypeError(pub String);

impl FromStr for AccessType {
    type Err = ParseAccessTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccessType::ALL
            .into_iter()
            .find(|access| access.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseAccessTypeError(s.to_string()))
    }
}

/// Final authorization outcome, always concrete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Permitted,
    Denied,
}

impl Decision {
    pub fn is_permitted(&self) -> bool {
        matches!(self, Decision::Permitted)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Permitted => f.write_str("permitted"),
            Decision::Denied => f.write_str("denied"),
        }
    }
}

/// Decision state threaded through effect application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyDecision {
    Undetermined,
    Permit,
    Deny,
}

impl PolicyDecision {
    /// Collapse to a concrete decision; anything short of an explicit permit is a denial
    pub fn resolve(self) -> Decision {
        match self {
            PolicyDecision::Permit => Decision::Permitted,
            PolicyDecision::Deny | PolicyDecision::Undetermined => Decision::Denied,
        }
    }

    pub fn is_deny(&self) -> bool {
        matches!(self, PolicyDecision::Deny)
    }
}

impl Default for PolicyDecision {
    fn default() -> Self {
        PolicyDecision::Undetermined
    }
}
