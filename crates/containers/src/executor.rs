//! External process execution.
//!
//! Every CLI invocation the runners make goes through [`CommandExecutor`], so
//! the runners can be exercised without a container engine installed.

use std::process::Stdio;

use async_trait::async_trait;
use dql::ContainerError;
use tokio::process::Command;
use tracing::debug;

/// Runs an external program to completion.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Runs `program` with `args` and returns its combined stdout and stderr.
    ///
    /// A spawn failure or a non-zero exit status yields
    /// [`ContainerError::CommandFailed`] carrying the same combined output.
    async fn run(&self, program: &str, args: &[String]) -> Result<String, ContainerError>;
}

/// [`CommandExecutor`] backed by `tokio::process`.
///
/// The child is killed if the returned future is dropped, so cancelling an
/// operation does not leave a CLI process behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommand;

#[async_trait]
impl CommandExecutor for SystemCommand {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, ContainerError> {
        debug!(program, args = %args.join(" "), "running command");

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| ContainerError::CommandFailed {
                program: program.to_string(),
                args: args.to_vec(),
                reason: e.to_string(),
                output: String::new(),
            })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(ContainerError::CommandFailed {
                program: program.to_string(),
                args: args.to_vec(),
                reason: output.status.to_string(),
                output: combined,
            });
        }
        Ok(combined)
    }
}
