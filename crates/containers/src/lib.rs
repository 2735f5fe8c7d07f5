//! Ditto Edge container lifecycle adapter.
//!
//! Implements the [`dql::ContainerRunner`] trait with two backends:
//!
//! - [`DockerCliRunner`]: plain `docker` commands (`image inspect`, `load`,
//!   `ps`, `run`, `start`, `stop`). The image must already be present or be
//!   loadable from a tarball.
//! - [`ComposeCliRunner`]: `docker compose up/start/stop` for a compose
//!   project whose service runs the Edge server. A missing image is left for
//!   compose to pull or build.
//!
//! Both runners shell out through a [`CommandExecutor`]; [`SystemCommand`] is
//! the real one. Every invocation captures combined stdout/stderr, and a
//! failure carries the command line and that output.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** The `edge-client` crate only sees
//! [`dql::ContainerRunner`].

mod compose;
mod docker;
mod executor;

pub use compose::ComposeCliRunner;
pub use docker::DockerCliRunner;
pub use executor::{CommandExecutor, SystemCommand};

/// CLI invoked when no other program is configured.
pub const DEFAULT_PROGRAM: &str = "docker";
