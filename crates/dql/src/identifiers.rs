//! Newtype domain identifiers.
//!
//! Container-management names are represented as distinct newtypes so a
//! [`ContainerName`] cannot be passed where an [`ImageName`] is expected even
//! though both are strings on the command line.

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
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
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

        impl TryFrom<String> for $name {
            type Error = String;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value).ok_or_else(|| concat!(stringify!($name), " must not be empty").to_string())
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Identifiers: String-backed (container tooling names)
// ---------------------------------------------------------------------------

string_id! {
    /// Name of the Edge server container (e.g. `"ditto-edge"`).
    ///
    /// Status checks match it exactly against `docker ps` names, and for the
    /// compose runner it must equal the service's `container_name`.
    ContainerName
}

string_id! {
    /// Image reference for the Edge server (e.g. `"dittoedge/server:latest"`).
    ImageName
}

string_id! {
    /// Compose service that runs the Edge server.
    ComposeService
}

impl ComposeService {
    /// Service name used when none is configured.
    pub const DEFAULT: &'static str = "ditto-edge-server";

    /// Returns the default compose service name.
    pub fn default_service() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

// ---------------------------------------------------------------------------
// Identifiers: UUID-backed (internally generated)
// ---------------------------------------------------------------------------

/// Identifies a single execute request.
///
/// Generated fresh for every POST to the execute endpoint and recorded on the
/// request's tracing span so the statement, response status, and any error
/// for one call can be correlated in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Generates a new random request identifier.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying [`Uuid`].
    pub fn as_uuid(self) -> Uuid {
        self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_names_are_rejected() {
        assert!(ContainerName::new("").is_none());
        assert_eq!(ContainerName::new("ditto-edge").unwrap().as_str(), "ditto-edge");
    }

    #[test]
    fn names_deserialize_from_plain_strings() {
        let name: ImageName = serde_json::from_str("\"dittoedge/server:latest\"").unwrap();
        assert_eq!(name.to_string(), "dittoedge/server:latest");
        assert!(serde_json::from_str::<ImageName>("\"\"").is_err());
    }

    #[test]
    fn default_compose_service() {
        assert_eq!(ComposeService::default_service().as_str(), "ditto-edge-server");
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(RequestId::new_random(), RequestId::new_random());
    }
}
