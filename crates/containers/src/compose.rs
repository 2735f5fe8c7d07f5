//! `docker compose` runner.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use dql::{ContainerError, ContainerName, ContainerOptions, ContainerRunner, ContainerState, ImageName};
use tracing::{debug, info, instrument, warn};

use crate::docker::{image_present, load_image, ps_status};
use crate::{CommandExecutor, SystemCommand, DEFAULT_PROGRAM};

/// [`ContainerRunner`] driving the container through a compose project.
///
/// Status is still read with `docker ps` by container name, so the service's
/// `container_name` in the compose file must match
/// [`ContainerOptions::container_name`]. A missing image with no tarball is
/// left for compose to pull or build.
///
/// The compose file is runner configuration: `up`, `start`, and `compose stop`
/// all pass the runner's file with `-f`. Use
/// [`ComposeCliRunner::with_compose_file_from`] to take it from
/// [`ContainerOptions::compose_file`].
#[derive(Debug, Clone)]
pub struct ComposeCliRunner<E = SystemCommand> {
    program: String,
    compose_file: Option<PathBuf>,
    executor: E,
}

impl ComposeCliRunner<SystemCommand> {
    /// Runner invoking `docker compose` on the `PATH`.
    pub fn new() -> Self {
        Self::with_executor(SystemCommand)
    }
}

impl Default for ComposeCliRunner<SystemCommand> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> ComposeCliRunner<E> {
    /// Runner using a custom executor.
    pub fn with_executor(executor: E) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            compose_file: None,
            executor,
        }
    }

    /// Uses a docker-compatible CLI other than `docker`.
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Compose file passed with `-f` to every compose command.
    #[must_use]
    pub fn with_compose_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.compose_file = Some(path.into());
        self
    }

    /// Takes the compose file from `options`, if it names one.
    #[must_use]
    pub fn with_compose_file_from(self, options: &ContainerOptions) -> Self {
        match &options.compose_file {
            Some(path) => self.with_compose_file(path),
            None => self,
        }
    }

    /// Returns the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }

    fn compose_args(&self, tail: &[&str]) -> Vec<String> {
        let mut args = vec!["compose".to_string()];
        if let Some(file) = &self.compose_file {
            args.push("-f".to_string());
            args.push(file.display().to_string());
        }
        args.extend(tail.iter().map(|s| s.to_string()));
        args
    }
}

#[async_trait]
impl<E: CommandExecutor> ContainerRunner for ComposeCliRunner<E> {
    #[instrument(skip(self, tarball))]
    async fn ensure_image_loaded(
        &self,
        image: &ImageName,
        tarball: Option<&Path>,
    ) -> Result<(), ContainerError> {
        if image_present(&self.executor, &self.program, image).await {
            return Ok(());
        }
        match tarball {
            Some(tarball) => load_image(&self.executor, &self.program, tarball).await,
            None => {
                debug!(%image, "image missing and no tarball; deferring to compose");
                Ok(())
            }
        }
    }

    async fn container_status(&self, name: &ContainerName) -> Result<ContainerState, ContainerError> {
        ps_status(&self.executor, &self.program, name).await
    }

    #[instrument(skip(self, options), fields(container = %options.container_name))]
    async fn run_container(&self, options: &ContainerOptions) -> Result<(), ContainerError> {
        if options.compose_file.is_some() && options.compose_file != self.compose_file {
            warn!(
                requested = ?options.compose_file,
                using = ?self.compose_file,
                "options name a different compose file than the runner; using the runner's"
            );
        }
        let service = options.compose_service_or_default();
        let args = self.compose_args(&["up", "-d", service.as_str()]);
        self.executor
            .run(&self.program, &args)
            .await
            .map_err(|e| e.in_step("docker compose up"))?;
        info!(%service, "compose service up");
        Ok(())
    }

    async fn start_container(&self, name: &ContainerName) -> Result<(), ContainerError> {
        let args = self.compose_args(&["start", name.as_str()]);
        self.executor.run(&self.program, &args).await.map(drop)
    }

    /// Compose stop, then direct stop, then forced removal. Every step is
    /// attempted and every failure ignored.
    async fn stop_container(&self, name: &ContainerName) -> Result<(), ContainerError> {
        let steps = [
            self.compose_args(&["stop", name.as_str()]),
            vec!["stop".to_string(), name.to_string()],
            vec!["rm".to_string(), "-f".to_string(), name.to_string()],
        ];
        for args in steps {
            if let Err(e) = self.executor.run(&self.program, &args).await {
                debug!(container = %name, error = %e, "cleanup step failed; continuing");
            }
        }
        Ok(())
    }
}
