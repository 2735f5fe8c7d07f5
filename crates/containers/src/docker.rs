//! Plain `docker` CLI runner.

use std::path::Path;

use async_trait::async_trait;
use dql::{ContainerError, ContainerName, ContainerOptions, ContainerRunner, ContainerState, ImageName};
use tracing::{debug, info, instrument};

use crate::{CommandExecutor, SystemCommand, DEFAULT_PROGRAM};

/// [`ContainerRunner`] driving the container with direct `docker` commands.
///
/// A missing image must be loadable from the configured tarball; there is no
/// pull fallback.
#[derive(Debug, Clone)]
pub struct DockerCliRunner<E = SystemCommand> {
    program: String,
    executor: E,
}

impl DockerCliRunner<SystemCommand> {
    /// Runner invoking `docker` on the `PATH`.
    pub fn new() -> Self {
        Self::with_executor(SystemCommand)
    }
}

impl Default for DockerCliRunner<SystemCommand> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: CommandExecutor> DockerCliRunner<E> {
    /// Runner using a custom executor.
    pub fn with_executor(executor: E) -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            executor,
        }
    }

    /// Uses a docker-compatible CLI other than `docker` (e.g. `podman`).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Returns the executor.
    pub fn executor(&self) -> &E {
        &self.executor
    }
}

#[async_trait]
impl<E: CommandExecutor> ContainerRunner for DockerCliRunner<E> {
    #[instrument(skip(self, tarball), fields(image = %image))]
    async fn ensure_image_loaded(
        &self,
        image: &ImageName,
        tarball: Option<&Path>,
    ) -> Result<(), ContainerError> {
        if image_present(&self.executor, &self.program, image).await {
            return Ok(());
        }
        let Some(tarball) = tarball else {
            return Err(ContainerError::ImageUnavailable {
                image: image.to_string(),
            }
            .in_step("docker load"));
        };
        load_image(&self.executor, &self.program, tarball).await
    }

    async fn container_status(&self, name: &ContainerName) -> Result<ContainerState, ContainerError> {
        ps_status(&self.executor, &self.program, name).await
    }

    #[instrument(skip(self, options), fields(container = %options.container_name))]
    async fn run_container(&self, options: &ContainerOptions) -> Result<(), ContainerError> {
        self.executor
            .run(&self.program, &run_args(options))
            .await
            .map_err(|e| e.in_step("docker run"))?;
        info!(image = %options.image_name, "container created");
        Ok(())
    }

    async fn start_container(&self, name: &ContainerName) -> Result<(), ContainerError> {
        self.executor
            .run(&self.program, &["start".to_string(), name.to_string()])
            .await
            .map(drop)
    }

    async fn stop_container(&self, name: &ContainerName) -> Result<(), ContainerError> {
        self.executor
            .run(&self.program, &["stop".to_string(), name.to_string()])
            .await
            .map(drop)
    }
}

/// `docker run` arguments: detached, named, API port published, config and
/// data mounted, server started with the mounted config.
fn run_args(options: &ContainerOptions) -> Vec<String> {
    vec![
        "run".into(),
        "-d".into(),
        "--name".into(),
        options.container_name.to_string(),
        "-p".into(),
        options.port_binding.clone(),
        "-v".into(),
        format!("{}:/config.yaml", options.config_path.display()),
        "-v".into(),
        format!("{}:/data", options.data_path.display()),
        options.image_name.to_string(),
        "run".into(),
        "-c".into(),
        "/config.yaml".into(),
    ]
}

/// Returns `true` if `image inspect` succeeds. Any failure counts as absent.
pub(crate) async fn image_present<E: CommandExecutor>(
    executor: &E,
    program: &str,
    image: &ImageName,
) -> bool {
    let args = ["image".to_string(), "inspect".to_string(), image.to_string()];
    match executor.run(program, &args).await {
        Ok(_) => true,
        Err(e) => {
            debug!(%image, error = %e, "image not present locally");
            false
        }
    }
}

/// `docker load -i <tarball>`.
pub(crate) async fn load_image<E: CommandExecutor>(
    executor: &E,
    program: &str,
    tarball: &Path,
) -> Result<(), ContainerError> {
    let args = ["load".to_string(), "-i".to_string(), tarball.display().to_string()];
    executor
        .run(program, &args)
        .await
        .map_err(|e| e.in_step("docker load"))?;
    info!(tarball = %tarball.display(), "image loaded from tarball");
    Ok(())
}

/// Looks the container up by exact name in `docker ps -a`.
pub(crate) async fn ps_status<E: CommandExecutor>(
    executor: &E,
    program: &str,
    name: &ContainerName,
) -> Result<ContainerState, ContainerError> {
    let args = [
        "ps".to_string(),
        "-a".to_string(),
        "--filter".to_string(),
        format!("name=^/{name}$"),
        "--format".to_string(),
        "{{.Status}}".to_string(),
    ];
    let output = executor
        .run(program, &args)
        .await
        .map_err(|e| e.in_step("docker ps"))?;
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or_default();
    Ok(ContainerState::from_ps_output(line))
}
