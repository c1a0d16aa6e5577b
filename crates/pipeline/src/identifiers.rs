//! Newtype domain identifiers.
//!
//! Agent names, step names, and run identifiers are all strings or UUIDs under
//! the hood. Wrapping each in its own type keeps a [`StepName`] from being
//! passed where an [`AgentName`] is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::RelayError;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, from_static(), as_str(), Display,
// Borrow<str>, and a TryFrom<String> that deserialization goes through so an
// empty string never becomes an identifier.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Creates an identifier from a string literal known to be non-empty.
            pub fn from_static(value: &'static str) -> Self {
                debug_assert!(!value.is_empty(), "identifier literal must not be empty");
                Self(value.to_owned())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = RelayError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| RelayError::InvalidIdentifier {
                    kind: stringify!($name).to_owned(),
                })
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single orchestration run (one pipeline, parallel, batch, or
/// coordinator invocation).
///
/// Generated fresh for every run and recorded on the run's tracing span so all
/// log lines from that run can be correlated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    /// Generates a new random run identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed
// ---------------------------------------------------------------------------

string_id! {
    /// The stable identity of an agent.
    ///
    /// Used as the registry key, the `agent` tag on results and trace entries,
    /// and the key into every per-agent metrics map. Unique within a registry.
    AgentName
}

string_id! {
    /// Names a position in a pipeline.
    ///
    /// Reported back as `failed_at` when the step is the first to fail.
    StepName
}

impl From<AgentName> for StepName {
    fn from(name: AgentName) -> Self {
        Self(name.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_names_are_rejected() {
        assert!(AgentName::new("").is_none());
        assert!(StepName::new(String::new()).is_none());
    }

    #[test]
    fn names_display_their_value() {
        let name = AgentName::new("content").unwrap();
        assert_eq!(name.to_string(), "content");
        assert_eq!(name.as_str(), "content");
    }

    #[test]
    fn names_serialize_as_plain_strings() {
        let name = StepName::new("draft").unwrap();
        assert_eq!(serde_json::to_string(&name).unwrap(), "\"draft\"");
    }

    #[test]
    fn empty_names_fail_to_deserialize() {
        assert!(serde_json::from_str::<AgentName>("\"\"").is_err());
        assert!(serde_json::from_str::<StepName>("\"\"").is_err());
        let name: AgentName = serde_json::from_str("\"echo\"").unwrap();
        assert_eq!(name.as_str(), "echo");
    }

    #[test]
    fn empty_conversion_reports_the_identifier_kind() {
        let err = AgentName::try_from(String::new()).unwrap_err();
        assert!(matches!(
            err,
            RelayError::InvalidIdentifier { ref kind } if kind == "AgentName"
        ));
    }

    #[test]
    fn run_ids_are_unique() {
        assert_ne!(RunId::new_random(), RunId::new_random());
    }
}
