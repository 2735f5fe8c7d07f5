//! Port traits implemented by the infrastructure crates.
//!
//! - [`ContainerRunner`]: container lifecycle strategy (plain `docker` or
//!   `docker compose`), implemented in the `containers` crate.
//! - [`DocumentService`]: the CRUD-style operations callers use, implemented
//!   over HTTP in the `edge-client` crate.
//!
//! Both traits are dyn-compatible via `async-trait` so a service can hold an
//! `Arc<dyn ContainerRunner>` chosen at runtime.

use std::path::Path;

use async_trait::async_trait;

use crate::{
    ContainerError, ContainerName, ContainerOptions, ContainerState, Document, EdgeError, Filters,
    ImageName, ListOptions, Patch, Record, StatusReport,
};

/// Container lifecycle operations for the Edge server.
#[async_trait]
pub trait ContainerRunner: Send + Sync {
    /// Makes sure `image` is available locally, loading it from `tarball`
    /// when it is missing. Whether a missing tarball is an error depends on
    /// the implementation.
    async fn ensure_image_loaded(
        &self,
        image: &ImageName,
        tarball: Option<&Path>,
    ) -> Result<(), ContainerError>;

    /// Reports the coarse status of the named container.
    async fn container_status(&self, name: &ContainerName) -> Result<ContainerState, ContainerError>;

    /// Creates (or recreates) and starts the container from `options`.
    async fn run_container(&self, options: &ContainerOptions) -> Result<(), ContainerError>;

    /// Starts a previously created container.
    async fn start_container(&self, name: &ContainerName) -> Result<(), ContainerError>;

    /// Stops the container.
    async fn stop_container(&self, name: &ContainerName) -> Result<(), ContainerError>;
}

/// Operations exposed to callers of the Ditto Edge client.
///
/// Every operation is a single request; there are no retries. Cancellation is
/// by dropping the returned future.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// Ensures the backing server container is running. A no-op when no
    /// container runner is attached.
    async fn init_db(&self) -> Result<(), EdgeError>;

    /// Best-effort stop of the container. Never fails; safe to call repeatedly.
    async fn close(&self) -> Result<(), EdgeError>;

    /// Connection info, container status, and the result of a probe query.
    /// Probe and container failures are recorded in the report, not returned.
    async fn status(&self) -> Result<StatusReport, EdgeError>;

    /// Inserts `doc` into `collection`.
    async fn create_document(&self, collection: &str, doc: Document) -> Result<Record, EdgeError>;

    /// Fetches the record whose `_id` equals `id`.
    async fn get_record(&self, collection: &str, id: &str) -> Result<Record, EdgeError>;

    /// Lists records with optional limit and ordering.
    async fn get_records(&self, collection: &str, options: &ListOptions)
        -> Result<Record, EdgeError>;

    /// Sets the fields in `patch` on the record whose `_id` equals `id`.
    async fn update_record(
        &self,
        collection: &str,
        id: &str,
        patch: Patch,
    ) -> Result<Record, EdgeError>;

    /// Deletes the record whose `_id` equals `id`.
    async fn delete_record(&self, collection: &str, id: &str) -> Result<Record, EdgeError>;

    /// Deletes every record in `collection`.
    async fn delete_all_records(&self, collection: &str) -> Result<Record, EdgeError>;

    /// Returns the single record with the greatest `sort_by` value.
    async fn latest_record(&self, collection: &str, sort_by: &str) -> Result<Record, EdgeError>;

    /// Exact-match search over string fields.
    async fn search(
        &self,
        collection: &str,
        filters: &Filters,
        options: &ListOptions,
    ) -> Result<Record, EdgeError>;
}
