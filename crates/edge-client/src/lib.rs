//! Ditto Edge HTTP client adapter.
//!
//! Implements the [`dql::DocumentService`] trait over the Edge server's single
//! execute endpoint: every operation builds a DQL statement with the [`dql`]
//! builders and POSTs `{"query": ..., "query_args": ...}` to
//! `<base_url>/<app_id>/execute`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** HTTP transport, request encoding, and response decoding
//! live here. Container lifecycle is delegated to whatever
//! [`dql::ContainerRunner`] is attached with [`EdgeClient::with_container`].
//!
//! ## Example
//!
//! ```no_run
//! use dql::DocumentService;
//! use edge_client::{ClientConfig, EdgeClient};
//!
//! # async fn example() -> Result<(), dql::EdgeError> {
//! let client = EdgeClient::new(ClientConfig::new("http://localhost:8090", "exampledb"))?;
//! let mut doc = dql::Document::new();
//! doc.insert("hello".into(), "world".into());
//! client.create_document("greetings", doc).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;

pub use client::{EdgeClient, BODY_EXCERPT_CHARS, QUERY_EXCERPT_CHARS};
pub use config::{
    ClientConfig, ENV_APP_ID, ENV_BASE_URL, ENV_PROBE_COLLECTION, ENV_TIMEOUT_SECS,
};
