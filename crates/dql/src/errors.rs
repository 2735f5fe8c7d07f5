//! Error types for the Ditto Edge client domain.
//!
//! Three layers:
//!
//! - [`QueryError`]: statement validation failures. Raised before any network
//!   call is attempted.
//! - [`ContainerError`]: failures invoking the container-management CLI.
//! - [`EdgeError`]: the top-level error every [`crate::DocumentService`]
//!   operation returns. Wraps the two above plus HTTP transport, HTTP status,
//!   and response decoding failures.
//!
//! Nothing here is retryable: every operation is all-or-nothing and a failure
//! surfaces to the caller immediately.

use thiserror::Error;

/// Boxed error used to carry infrastructure errors (e.g. `reqwest::Error`)
/// through the domain layer without depending on the infrastructure crate.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// A DQL statement could not be built from the supplied arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The target collection name was empty.
    #[error("collection required")]
    CollectionRequired,

    /// Either the collection name or the record identifier was empty.
    #[error("collection and id required")]
    CollectionAndIdRequired,

    /// An update was requested with no fields to set.
    #[error("patch is empty")]
    EmptyPatch,
}

// ---------------------------------------------------------------------------
// Container management
// ---------------------------------------------------------------------------

/// Errors produced while driving the container-management CLI.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// An external command could not be spawned or exited unsuccessfully.
    ///
    /// `output` holds the combined stdout/stderr text captured from the
    /// process (empty when the process could not be spawned).
    #[error("{program} {}: {reason}: {output}", .args.join(" "))]
    CommandFailed {
        /// Program that was invoked (e.g. `docker`).
        program: String,
        /// Arguments passed to the program.
        args: Vec<String>,
        /// Spawn error or exit status description.
        reason: String,
        /// Combined stdout and stderr.
        output: String,
    },

    /// The image is not present locally and no tarball was configured to
    /// load it from.
    #[error("image {image} is not present locally and no tarball path is configured")]
    ImageUnavailable {
        /// Image reference that was inspected.
        image: String,
    },

    /// A lifecycle step failed; `step` names the step (e.g. `docker load`).
    #[error("{step}: {source}")]
    Step {
        /// Short label for the failing step.
        step: &'static str,
        /// Underlying failure.
        #[source]
        source: Box<ContainerError>,
    },
}

impl ContainerError {
    /// Wraps `self` with a step label, mirroring `<step>: <cause>` chains.
    pub fn in_step(self, step: &'static str) -> Self {
        Self::Step {
            step,
            source: Box::new(self),
        }
    }
}

// ---------------------------------------------------------------------------
// Client-level errors
// ---------------------------------------------------------------------------

/// Errors returned by [`crate::DocumentService`] operations.
#[derive(Debug, Error)]
pub enum EdgeError {
    /// The statement could not be built; no request was sent.
    #[error(transparent)]
    Validation(#[from] QueryError),

    /// The HTTP request could not be completed (connect failure, timeout, ...).
    #[error("ditto transport: {source}")]
    Transport {
        /// The transport error as produced by the HTTP client.
        #[source]
        source: BoxError,
    },

    /// The server answered with a non-2xx status.
    ///
    /// `body` and `query` are already trimmed and truncated for display.
    #[error("ditto http {status}: {body} | query: {query}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body excerpt.
        body: String,
        /// Statement excerpt.
        query: String,
    },

    /// A 2xx response body was not valid JSON.
    #[error("ditto response decode: {source}")]
    Decode {
        /// Underlying decode error.
        #[source]
        source: BoxError,
    },

    /// A container lifecycle step failed during initialisation.
    #[error("{context}: {source}")]
    Container {
        /// Which part of initialisation failed (e.g. `"ensure image"`).
        context: &'static str,
        /// Underlying container failure.
        #[source]
        source: ContainerError,
    },

    /// The client configuration is invalid.
    ///
    /// Produced at construction time; a client never exists with an invalid config.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },
}

impl EdgeError {
    /// Returns the HTTP status code when the server rejected the request.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for failures detected before any I/O was attempted.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
