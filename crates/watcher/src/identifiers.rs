//! Newtype domain identifiers.
//!
//! Every value that names something on the remote platform is a distinct
//! newtype wrapping a primitive. This prevents accidentally interchanging, for
//! example, a [`RepositoryName`] with a [`WorkflowId`] even though both are
//! strings under the hood.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty
            /// or only whitespace.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.trim().is_empty() { None } else { Some(Self(v)) }
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
    };
}

// ---------------------------------------------------------------------------
// Identifiers, platform-integer-backed
// ---------------------------------------------------------------------------

/// Identifies one execution instance of a workflow.
///
/// Assigned by the platform when the run is created; never known at dispatch
/// time, which is why correlation exists at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(u64);

impl RunId {
    /// Creates a new identifier from a raw integer.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the underlying integer value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers, UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single `runwatch` invocation.
///
/// Generated fresh for every CLI invocation and attached to the root span so
/// all activity from one dispatch-and-watch attempt can be correlated in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generates a new random invocation identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Identifiers, String-backed (configuration / Git names)
// ---------------------------------------------------------------------------

string_id! {
    /// The account or organisation that owns a repository (e.g. `"octo-org"`).
    Owner
}

string_id! {
    /// A repository name without its owner (e.g. `"deploy-scripts"`).
    RepositoryName
}

string_id! {
    /// Identifies a workflow: either its numeric id or its file name
    /// (e.g. `"release.yml"`).
    WorkflowId
}

string_id! {
    /// A Git ref to run the workflow on: a branch, a tag, or a fully qualified
    /// `refs/...` name.
    GitRef
}

impl GitRef {
    /// Returns the branch name used to filter the run listing.
    ///
    /// Fully qualified branch refs (`refs/heads/main`) are reduced to the short
    /// name the listing endpoint expects; any other value is returned as-is.
    pub fn branch_filter(&self) -> &str {
        self.0.strip_prefix("refs/heads/").unwrap_or(&self.0)
    }
}
