//! Command-line arguments.
//!
//! Connection and container flags fall back to the same `DITTO_*` environment
//! variables `edge_client::ClientConfig::from_env` reads.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use dql::{
    ComposeService, ContainerName, ContainerOptions, Document, Filters, ImageName, ListOptions,
    SortOrder, SortSpec,
};
use edge_client::{ClientConfig, ENV_APP_ID, ENV_BASE_URL, ENV_PROBE_COLLECTION, ENV_TIMEOUT_SECS};
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "ditto-edge")]
#[command(about = "Ditto Edge HTTP client and container manager", version)]
pub struct Cli {
    /// Base URL of the Edge server HTTP API
    #[arg(long, env = ENV_BASE_URL, default_value = ClientConfig::DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Application (database) identifier
    #[arg(long, env = ENV_APP_ID)]
    pub app_id: String,

    /// HTTP timeout in seconds
    #[arg(long, env = ENV_TIMEOUT_SECS, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Collection queried by `status`
    #[arg(long, env = ENV_PROBE_COLLECTION, default_value = ClientConfig::DEFAULT_PROBE_COLLECTION)]
    pub probe_collection: String,

    /// Emit logs as JSON lines
    #[arg(long, env = "DITTO_LOG_JSON")]
    pub log_json: bool,

    #[command(flatten)]
    pub container: ContainerArgs,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Connection config built from the flags.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url, &self.app_id)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_probe_collection(&self.probe_collection)
    }
}

/// Which container runner to attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ContainerMode {
    /// Plain `docker` commands
    Plain,
    /// `docker compose`
    Compose,
}

#[derive(Debug, Args)]
pub struct ContainerArgs {
    /// Manage the Edge server container with this runner
    #[arg(long, env = "DITTO_CONTAINER_MODE", value_enum)]
    pub manage_container: Option<ContainerMode>,

    /// Docker-compatible CLI to invoke
    #[arg(long, env = "DITTO_DOCKER_PROGRAM", default_value = containers::DEFAULT_PROGRAM)]
    pub docker_program: String,

    /// Container name
    #[arg(long, env = "DITTO_CONTAINER_NAME", default_value = "ditto-edge")]
    pub container_name: String,

    /// Image to run
    #[arg(long, env = "DITTO_IMAGE", default_value = "dittoedge/server:latest")]
    pub image: String,

    /// Tarball to load the image from when it is missing
    #[arg(long, env = "DITTO_IMAGE_TARBALL")]
    pub image_tarball: Option<PathBuf>,

    /// Host path mounted at /config.yaml
    #[arg(long, env = "DITTO_CONFIG_PATH", default_value = "config.yaml")]
    pub config_path: PathBuf,

    /// Host path mounted at /data
    #[arg(long, env = "DITTO_DATA_PATH", default_value = "data")]
    pub data_path: PathBuf,

    /// Port binding for the HTTP API
    #[arg(long, env = "DITTO_PORT_BINDING", default_value = ContainerOptions::DEFAULT_PORT_BINDING)]
    pub port_binding: String,

    /// Compose file (compose mode)
    #[arg(long, env = "DITTO_COMPOSE_FILE")]
    pub compose_file: Option<PathBuf>,

    /// Compose service (compose mode)
    #[arg(long, env = "DITTO_COMPOSE_SERVICE")]
    pub compose_service: Option<String>,
}

impl ContainerArgs {
    /// Container options built from the flags.
    pub fn options(&self) -> anyhow::Result<ContainerOptions> {
        let name = ContainerName::new(&self.container_name).context("container name must not be empty")?;
        let image = ImageName::new(&self.image).context("image must not be empty")?;

        let mut opts = ContainerOptions::new(name, image, &self.config_path, &self.data_path)
            .with_port_binding(&self.port_binding);
        if let Some(tarball) = &self.image_tarball {
            opts = opts.with_image_tarball(tarball);
        }
        if let Some(file) = &self.compose_file {
            opts = opts.with_compose_file(file);
        }
        if let Some(service) = self.compose_service.as_deref().and_then(ComposeService::new) {
            opts = opts.with_compose_service(service);
        }
        Ok(opts)
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    /// Maximum number of records
    #[arg(long)]
    pub limit: Option<u32>,

    /// Field to sort by
    #[arg(long)]
    pub sort_by: Option<String>,

    /// Sort direction (asc or desc)
    #[arg(long)]
    pub order: Option<String>,
}

impl ListArgs {
    pub fn options(&self) -> ListOptions {
        ListOptions {
            limit: self.limit,
            sort: self.sort_by.as_ref().map(|field| {
                SortSpec::new(field.clone(), self.order.as_deref().and_then(SortOrder::parse))
            }),
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Make sure the Edge server container is running
    Init,

    /// Stop the Edge server container (never fails)
    Close,

    /// Show connection, container, and HTTP probe status
    Status,

    /// Insert a JSON document
    Insert {
        collection: String,
        /// Document as a JSON object
        document: String,
    },

    /// Fetch a record by _id
    Get { collection: String, id: String },

    /// List records
    List {
        collection: String,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Set fields on a record
    Update {
        collection: String,
        id: String,
        /// Fields to set as a JSON object
        patch: String,
    },

    /// Delete a record by _id
    Delete { collection: String, id: String },

    /// Delete every record in a collection
    DeleteAll { collection: String },

    /// Most recent record by a field
    Latest { collection: String, sort_by: String },

    /// Exact-match search
    Search {
        collection: String,
        /// FIELD=VALUE, repeatable
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,
        #[command(flatten)]
        list: ListArgs,
    },

    /// Run a raw DQL statement
    Exec {
        statement: String,
        /// Bound parameters as a JSON object
        #[arg(long)]
        args: Option<String>,
    },
}

/// Collects `--filter` pairs; a repeated field keeps the last value.
pub fn filters(pairs: &[(String, String)]) -> Filters {
    pairs.iter().cloned().collect()
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((field, value)) if !field.is_empty() => Ok((field.to_string(), value.to_string())),
        _ => Err(format!("expected FIELD=VALUE, got '{raw}'")),
    }
}

/// Parses a JSON object argument.
pub fn parse_object(raw: &str) -> anyhow::Result<Document> {
    match serde_json::from_str::<Value>(raw).context("argument is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => bail!("expected a JSON object, got {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["ditto-edge", "--app-id", "exampledb"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn defaults_match_client_config() {
        let cli = parse(&["status"]);
        let config = cli.client_config();
        assert_eq!(config.base_url, "http://localhost:8090");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.probe_collection, "chat");
        assert!(cli.container.manage_container.is_none());
    }

    #[test]
    fn list_options_from_flags() {
        let cli = parse(&["list", "greetings", "--limit", "10", "--sort-by", "_id", "--order", "desc"]);
        match cli.command {
            Command::List { collection, list } => {
                assert_eq!(collection, "greetings");
                assert_eq!(
                    list.options(),
                    ListOptions::new().limit(10).sort(SortSpec::desc("_id"))
                );
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn search_filters_are_parsed() {
        let cli = parse(&["search", "users", "--filter", "name=Alice", "--filter", "city=a=b"]);
        match cli.command {
            Command::Search { filters: pairs, .. } => {
                let f = filters(&pairs);
                assert_eq!(f.get("name").map(String::as_str), Some("Alice"));
                assert_eq!(f.get("city").map(String::as_str), Some("a=b"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn malformed_filter_is_rejected() {
        assert!(Cli::try_parse_from(["ditto-edge", "--app-id", "a", "search", "users", "--filter", "oops"]).is_err());
    }

    #[test]
    fn container_options_from_flags() {
        let cli = parse(&[
            "--manage-container",
            "compose",
            "--compose-service",
            "edge",
            "--image-tarball",
            "/tmp/ditto.tar",
            "init",
        ]);
        assert_eq!(cli.container.manage_container, Some(ContainerMode::Compose));
        let opts = cli.container.options().unwrap();
        assert_eq!(opts.container_name.as_str(), "ditto-edge");
        assert_eq!(opts.compose_service_or_default().as_str(), "edge");
        assert_eq!(opts.image_tarball, Some(PathBuf::from("/tmp/ditto.tar")));
        assert_eq!(opts.port_binding, "127.0.0.1:8090:8090");
    }

    #[test]
    fn json_arguments_must_be_objects() {
        assert_eq!(parse_object(r#"{"age": 31}"#).unwrap().get("age"), Some(&Value::from(31)));
        assert!(parse_object("[1, 2]").is_err());
        assert!(parse_object("{").is_err());
    }
}
