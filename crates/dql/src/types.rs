//! Shared value types for the Ditto Edge client domain.
//!
//! Unlike the newtype identifiers in [`crate::identifiers`], these types carry
//! the payloads exchanged with the server ([`Query`], [`Record`]) and with the
//! container tooling ([`ContainerOptions`], [`ContainerState`]).

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ComposeService, ContainerName, ImageName};

// ---------------------------------------------------------------------------
// Payload aliases
// ---------------------------------------------------------------------------

/// A JSON document as stored in a collection.
pub type Document = Map<String, Value>;

/// Field → new value mapping applied by an update.
pub type Patch = Map<String, Value>;

/// Any JSON value returned by the server. The client does not model its schema.
pub type Record = Value;

/// Bound parameter name → value.
pub type QueryArgs = Map<String, Value>;

/// Exact-match filters, field → string value. Ordered so generated WHERE
/// clauses are deterministic.
pub type Filters = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// A DQL statement plus its bound parameters.
///
/// Serialises as the execute endpoint's request body:
/// `{"query": "...", "query_args": {...}}`, omitting `query_args` when there
/// are no bound parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    /// The DQL statement text.
    #[serde(rename = "query")]
    pub statement: String,

    /// Parameters referenced as `:name` in the statement.
    #[serde(rename = "query_args", default, skip_serializing_if = "Option::is_none")]
    pub args: Option<QueryArgs>,
}

impl Query {
    /// Creates a statement with no bound parameters.
    pub fn new(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            args: None,
        }
    }

    /// Creates a statement with bound parameters.
    pub fn with_args(statement: impl Into<String>, args: QueryArgs) -> Self {
        Self {
            statement: statement.into(),
            args: Some(args),
        }
    }

    /// Returns the bound value for `name`, if any.
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.as_ref().and_then(|a| a.get(name))
    }
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.statement)
    }
}

// ---------------------------------------------------------------------------
// Pagination and ordering
// ---------------------------------------------------------------------------

/// Sort direction for `ORDER BY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Parses `"asc"`/`"desc"` case-insensitively. Anything else yields `None`,
    /// which leaves the direction to the server default.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    /// Returns the DQL keyword.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An `ORDER BY` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    /// Field to sort by. An empty field disables ordering.
    pub field: String,
    /// Direction; `None` emits no keyword.
    pub order: Option<SortOrder>,
}

impl SortSpec {
    /// Creates a sort on `field` in the given direction.
    pub fn new(field: impl Into<String>, order: Option<SortOrder>) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    /// Shorthand for a descending sort.
    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, Some(SortOrder::Desc))
    }

    /// Shorthand for an ascending sort.
    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, Some(SortOrder::Asc))
    }
}

/// Limit and ordering applied to SELECT statements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOptions {
    /// Maximum number of records; `None` or `Some(0)` means no limit.
    pub limit: Option<u32>,
    /// Optional ordering.
    pub sort: Option<SortSpec>,
}

impl ListOptions {
    /// No limit, no ordering.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the limit.
    #[must_use]
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the ordering.
    #[must_use]
    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }
}

// ---------------------------------------------------------------------------
// Container lifecycle
// ---------------------------------------------------------------------------

/// Coarse container status derived from `docker ps` output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerState {
    /// The container is up.
    Running,
    /// The container exists but has stopped.
    Exited,
    /// No container with that name exists.
    NotFound,
    /// Any other status (e.g. `created`, `restarting`), lower-cased.
    Other(String),
}

impl ContainerState {
    /// Classifies one `{{.Status}}` line from `docker ps -a`.
    ///
    /// The text is trimmed and lower-cased; empty output means the container
    /// does not exist, `up ...` means running, `exited ...` means stopped.
    pub fn from_ps_output(output: &str) -> Self {
        let s = output.trim().to_lowercase();
        if s.is_empty() {
            Self::NotFound
        } else if s.starts_with("up ") {
            Self::Running
        } else if s.starts_with("exited ") {
            Self::Exited
        } else {
            Self::Other(s)
        }
    }

    /// Returns the status label (`running`, `exited`, `not-found`, or the raw text).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Running => "running",
            Self::Exited => "exited",
            Self::NotFound => "not-found",
            Self::Other(raw) => raw,
        }
    }
}

impl std::fmt::Display for ContainerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for ContainerState {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => Self::Running,
            "exited" => Self::Exited,
            "not-found" => Self::NotFound,
            _ => Self::Other(value),
        }
    }
}

impl From<ContainerState> for String {
    fn from(value: ContainerState) -> Self {
        value.as_str().to_string()
    }
}

fn default_port_binding() -> String {
    ContainerOptions::DEFAULT_PORT_BINDING.to_string()
}

/// Parameters for starting the Edge server container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOptions {
    /// Container name used for status checks, start, and stop.
    pub container_name: ContainerName,

    /// Image to run.
    pub image_name: ImageName,

    /// Tarball to `docker load` when the image is missing locally.
    #[serde(default)]
    pub image_tarball: Option<PathBuf>,

    /// Host path mounted at `/config.yaml`.
    pub config_path: PathBuf,

    /// Host path mounted at `/data`.
    pub data_path: PathBuf,

    /// `-p` argument exposing the HTTP API.
    #[serde(default = "default_port_binding")]
    pub port_binding: String,

    /// Compose file; `None` uses compose's default discovery. Read by the
    /// compose runner when it is built, not per call.
    #[serde(default)]
    pub compose_file: Option<PathBuf>,

    /// Compose service; `None` uses [`ComposeService::DEFAULT`].
    #[serde(default)]
    pub compose_service: Option<ComposeService>,
}

impl ContainerOptions {
    /// Exposes the Edge HTTP API on localhost only.
    pub const DEFAULT_PORT_BINDING: &'static str = "127.0.0.1:8090:8090";

    /// Creates options with the required settings and defaults for the rest.
    pub fn new(
        container_name: ContainerName,
        image_name: ImageName,
        config_path: impl Into<PathBuf>,
        data_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            container_name,
            image_name,
            image_tarball: None,
            config_path: config_path.into(),
            data_path: data_path.into(),
            port_binding: default_port_binding(),
            compose_file: None,
            compose_service: None,
        }
    }

    /// Sets the tarball to load the image from.
    #[must_use]
    pub fn with_image_tarball(mut self, path: impl Into<PathBuf>) -> Self {
        self.image_tarball = Some(path.into());
        self
    }

    /// Sets the `-p` binding.
    #[must_use]
    pub fn with_port_binding(mut self, binding: impl Into<String>) -> Self {
        self.port_binding = binding.into();
        self
    }

    /// Sets the compose file.
    #[must_use]
    pub fn with_compose_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.compose_file = Some(path.into());
        self
    }

    /// Sets the compose service.
    #[must_use]
    pub fn with_compose_service(mut self, service: ComposeService) -> Self {
        self.compose_service = Some(service);
        self
    }

    /// Returns the configured compose service or the default one.
    pub fn compose_service_or_default(&self) -> ComposeService {
        self.compose_service
            .clone()
            .unwrap_or_else(ComposeService::default_service)
    }
}

// ---------------------------------------------------------------------------
// Status reporting
// ---------------------------------------------------------------------------

/// Container section of a [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ContainerReport {
    /// No container runner is attached.
    Disabled,
    /// Status as reported by the runner.
    State(ContainerState),
    /// The runner failed to report a status.
    Error(String),
}

/// HTTP section of a [`StatusReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HttpProbe {
    /// The server answered; `status` is the status line (e.g. `"200 OK"`),
    /// whatever the code.
    Reachable {
        /// Status line.
        status: String,
    },
    /// The request did not complete.
    Unreachable {
        /// Transport error text.
        error: String,
    },
}

impl HttpProbe {
    /// Returns `true` when the server answered at all.
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable { .. })
    }
}

/// Diagnostic snapshot produced by `DocumentService::status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Configured base URL.
    pub base_url: String,
    /// Configured application (database) identifier.
    pub app_id: String,
    /// Container status, `disabled`, or the status error.
    pub container: ContainerReport,
    /// Outcome of the probe query.
    pub http: HttpProbe,
    /// When the report was taken.
    pub checked_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// UTC time a [`StatusReport`] was taken; serialises as RFC 3339.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ps_output_classification() {
        assert_eq!(ContainerState::from_ps_output("Up 3 hours"), ContainerState::Running);
        assert_eq!(
            ContainerState::from_ps_output("Exited (0) 2 minutes ago"),
            ContainerState::Exited
        );
        assert_eq!(ContainerState::from_ps_output(""), ContainerState::NotFound);
        assert_eq!(ContainerState::from_ps_output("  \n"), ContainerState::NotFound);
        assert_eq!(
            ContainerState::from_ps_output("Created"),
            ContainerState::Other("created".into())
        );
    }

    #[test]
    fn container_state_labels() {
        assert_eq!(ContainerState::NotFound.to_string(), "not-found");
        assert_eq!(json!(ContainerState::Running), json!("running"));
        assert_eq!(
            ContainerState::from("restarting (1) 3 seconds ago".to_string()),
            ContainerState::Other("restarting (1) 3 seconds ago".into())
        );
    }

    #[test]
    fn query_body_omits_absent_args() {
        let q = Query::new("SELECT * FROM users");
        assert_eq!(serde_json::to_value(&q).unwrap(), json!({"query": "SELECT * FROM users"}));

        let mut args = QueryArgs::new();
        args.insert("id".into(), json!("u1"));
        let q = Query::with_args("SELECT * FROM users WHERE _id == :id", args);
        assert_eq!(
            serde_json::to_value(&q).unwrap(),
            json!({"query": "SELECT * FROM users WHERE _id == :id", "query_args": {"id": "u1"}})
        );
        assert_eq!(q.arg("id"), Some(&json!("u1")));
    }

    #[test]
    fn sort_order_parsing_is_case_insensitive() {
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("Asc"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("sideways"), None);
        assert_eq!(SortOrder::parse(""), None);
    }

    #[test]
    fn container_options_defaults() {
        let opts: ContainerOptions = serde_json::from_value(json!({
            "container_name": "ditto-edge",
            "image_name": "dittoedge/server:latest",
            "config_path": "/etc/ditto/config.yaml",
            "data_path": "/var/lib/ditto",
        }))
        .unwrap();
        assert_eq!(opts.port_binding, "127.0.0.1:8090:8090");
        assert!(opts.image_tarball.is_none());
        assert_eq!(opts.compose_service_or_default().as_str(), "ditto-edge-server");
    }

    #[test]
    fn status_report_serialises_sections() {
        let report = StatusReport {
            base_url: "http://localhost:8090".into(),
            app_id: "app".into(),
            container: ContainerReport::Disabled,
            http: HttpProbe::Unreachable {
                error: "connection refused".into(),
            },
            checked_at: Timestamp::now(),
        };
        let v = serde_json::to_value(&report).unwrap();
        assert_eq!(v["container"], json!({"kind": "disabled"}));
        assert_eq!(v["http"]["kind"], json!("unreachable"));
        let checked_at = v["checked_at"].as_str().unwrap();
        assert!(DateTime::<chrono::FixedOffset>::parse_from_rfc3339(checked_at).is_ok(), "{checked_at}");
    }
}
