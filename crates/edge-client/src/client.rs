//! [`EdgeClient`]: the HTTP implementation of [`DocumentService`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dql::{
    build_delete_all, build_delete_by_id, build_get_by_id, build_insert, build_select,
    build_update, ContainerOptions, ContainerReport, ContainerRunner, ContainerState, Document,
    DocumentService, EdgeError, Filters, HttpProbe, ListOptions, Patch, Query, Record, RequestId,
    SortSpec, StatusReport, Timestamp,
};
use tracing::{debug, info, instrument, warn, Span};

use crate::ClientConfig;

/// Maximum number of characters of a rejected response body kept in errors.
pub const BODY_EXCERPT_CHARS: usize = 256;

/// Maximum number of characters of the statement echoed in errors.
pub const QUERY_EXCERPT_CHARS: usize = 200;

struct AttachedContainer {
    runner: Arc<dyn ContainerRunner>,
    options: ContainerOptions,
}

/// Client for a Ditto Edge server's HTTP API, optionally managing the
/// server's container.
///
/// Cheap to share behind an `Arc`; the underlying `reqwest::Client` pools
/// connections and is safe for concurrent use.
pub struct EdgeClient {
    config: ClientConfig,
    http: reqwest::Client,
    container: Option<AttachedContainer>,
    started_container: AtomicBool,
}

impl std::fmt::Debug for EdgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EdgeClient")
            .field("config", &self.config)
            .field(
                "container",
                &self.container.as_ref().map(|c| c.options.container_name.as_str()),
            )
            .field("started_container", &self.started_container())
            .finish()
    }
}

impl EdgeClient {
    /// Builds a client from a validated config.
    pub fn new(config: ClientConfig) -> Result<Self, EdgeError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EdgeError::Configuration {
                message: format!("HTTP client could not be built: {e}"),
            })?;
        Ok(Self {
            config,
            http,
            container: None,
            started_container: AtomicBool::new(false),
        })
    }

    /// Attaches a container runner so [`DocumentService::init_db`] and
    /// [`DocumentService::close`] manage the server's container.
    #[must_use]
    pub fn with_container(
        mut self,
        runner: Arc<dyn ContainerRunner>,
        options: ContainerOptions,
    ) -> Self {
        self.container = Some(AttachedContainer { runner, options });
        self
    }

    /// Returns the connection config.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns `true` if `init_db` created the container in this process.
    /// Informational only; `close` stops the container either way.
    pub fn started_container(&self) -> bool {
        self.started_container.load(Ordering::Relaxed)
    }

    /// Posts `query` to the execute endpoint and decodes the JSON response.
    ///
    /// Non-2xx responses become [`EdgeError::Http`] with excerpts of the
    /// response body and of the statement.
    #[instrument(
        name = "ditto.execute",
        skip(self, query),
        fields(request_id = %RequestId::new_random(), status = tracing::field::Empty)
    )]
    pub async fn execute(&self, query: &Query) -> Result<Record, EdgeError> {
        debug!(statement = %query.statement, "posting DQL");

        let response = self
            .http
            .post(self.config.execute_url())
            .json(query)
            .send()
            .await
            .map_err(|e| EdgeError::Transport { source: Box::new(e) })?;

        let status = response.status();
        Span::current().record("status", status.as_u16());

        if !status.is_success() {
            // The body is only used for the error excerpt.
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "execute rejected by server");
            return Err(EdgeError::Http {
                status: status.as_u16(),
                body: excerpt(body.trim(), BODY_EXCERPT_CHARS),
                query: excerpt(&query.statement, QUERY_EXCERPT_CHARS),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| EdgeError::Transport { source: Box::new(e) })?;
        serde_json::from_slice(&bytes).map_err(|e| EdgeError::Decode { source: Box::new(e) })
    }

    async fn probe(&self) -> HttpProbe {
        let statement = build_select(
            &self.config.probe_collection,
            &Filters::new(),
            &ListOptions::new().limit(1),
        );
        let result = self
            .http
            .post(self.config.execute_url())
            .json(&Query::new(statement))
            .send()
            .await;
        match result {
            Ok(response) => HttpProbe::Reachable {
                status: response.status().to_string(),
            },
            Err(e) => HttpProbe::Unreachable {
                error: e.to_string(),
            },
        }
    }
}

#[async_trait]
impl DocumentService for EdgeClient {
    #[instrument(skip(self))]
    async fn init_db(&self) -> Result<(), EdgeError> {
        let Some(container) = &self.container else {
            debug!("no container runner attached; skipping container setup");
            return Ok(());
        };
        let opts = &container.options;

        container
            .runner
            .ensure_image_loaded(&opts.image_name, opts.image_tarball.as_deref())
            .await
            .map_err(|source| EdgeError::Container {
                context: "ensure image",
                source,
            })?;

        let state = container
            .runner
            .container_status(&opts.container_name)
            .await
            .map_err(|source| EdgeError::Container {
                context: "container status",
                source,
            })?;
        info!(container = %opts.container_name, %state, "container status");

        match state {
            ContainerState::Running => Ok(()),
            ContainerState::Exited => {
                // Recreate instead of `start` so mount and config changes apply.
                container
                    .runner
                    .run_container(opts)
                    .await
                    .map_err(|source| EdgeError::Container {
                        context: "start container",
                        source,
                    })
            }
            ContainerState::NotFound | ContainerState::Other(_) => {
                container
                    .runner
                    .run_container(opts)
                    .await
                    .map_err(|source| EdgeError::Container {
                        context: "run container",
                        source,
                    })?;
                self.started_container.store(true, Ordering::Relaxed);
                info!(container = %opts.container_name, "container started");
                Ok(())
            }
        }
    }

    #[instrument(skip(self))]
    async fn close(&self) -> Result<(), EdgeError> {
        if let Some(container) = &self.container {
            let name = &container.options.container_name;
            if let Err(e) = container.runner.stop_container(name).await {
                warn!(container = %name, error = %e, "stopping container failed; ignoring");
            }
            self.started_container.store(false, Ordering::Relaxed);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn status(&self) -> Result<StatusReport, EdgeError> {
        let container = match &self.container {
            None => ContainerReport::Disabled,
            Some(c) => match c.runner.container_status(&c.options.container_name).await {
                Ok(state) => ContainerReport::State(state),
                Err(e) => ContainerReport::Error(e.to_string()),
            },
        };
        let http = self.probe().await;

        Ok(StatusReport {
            base_url: self.config.base_url.clone(),
            app_id: self.config.app_id.clone(),
            container,
            http,
            checked_at: Timestamp::now(),
        })
    }

    #[instrument(skip(self, doc))]
    async fn create_document(&self, collection: &str, doc: Document) -> Result<Record, EdgeError> {
        let query = build_insert(collection, doc)?;
        self.execute(&query).await
    }

    #[instrument(skip(self))]
    async fn get_record(&self, collection: &str, id: &str) -> Result<Record, EdgeError> {
        let query = build_get_by_id(collection, id)?;
        self.execute(&query).await
    }

    #[instrument(skip(self))]
    async fn get_records(
        &self,
        collection: &str,
        options: &ListOptions,
    ) -> Result<Record, EdgeError> {
        let query = Query::new(build_select(collection, &Filters::new(), options));
        self.execute(&query).await
    }

    #[instrument(skip(self, patch))]
    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        patch: Patch,
    ) -> Result<Record, EdgeError> {
        let query = build_update(collection, id, patch)?;
        self.execute(&query).await
    }

    #[instrument(skip(self))]
    async fn delete_record(&self, collection: &str, id: &str) -> Result<Record, EdgeError> {
        let query = build_delete_by_id(collection, id)?;
        self.execute(&query).await
    }

    #[instrument(skip(self))]
    async fn delete_all_records(&self, collection: &str) -> Result<Record, EdgeError> {
        let query = build_delete_all(collection)?;
        self.execute(&query).await
    }

    #[instrument(skip(self))]
    async fn latest_record(&self, collection: &str, sort_by: &str) -> Result<Record, EdgeError> {
        let options = ListOptions::new().limit(1).sort(SortSpec::desc(sort_by));
        self.get_records(collection, &options).await
    }

    #[instrument(skip(self, filters), fields(filter_count = filters.len()))]
    async fn search(
        &self,
        collection: &str,
        filters: &Filters,
        options: &ListOptions,
    ) -> Result<Record, EdgeError> {
        let query = Query::new(build_select(collection, filters, options));
        self.execute(&query).await
    }
}

/// Truncates `text` to `max` characters, appending `...` when anything was cut.
fn excerpt(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
