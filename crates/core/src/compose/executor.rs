//! Command grammar, result types and the [`CommandExecutor`] trait.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

/// Default number of log lines returned by [`ComposeCommand::Logs`].
pub const DEFAULT_LOG_TAIL: u32 = 100;

/// A project-scoped `docker compose` sub-command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposeCommand {
    /// Fetch images referenced by the project.
    Pull,
    /// Recreate and start all services, always re-pulling images.
    Up,
    /// Remove containers, networks, named volumes and orphans.
    Down,
    /// Restart existing containers in place.
    Restart,
    /// Container status as line-delimited JSON.
    Ps,
    /// Last `tail` lines of uncolored logs for all services.
    Logs { tail: u32 },
    /// Image metadata as JSON.
    Images,
}

impl ComposeCommand {
    /// Short name used in logs and error prefixes.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pull => "pull",
            Self::Up => "up",
            Self::Down => "down",
            Self::Restart => "restart",
            Self::Ps => "ps",
            Self::Logs { .. } => "logs",
            Self::Images => "images",
        }
    }

    /// Arguments following `compose -p <project>`.
    pub fn args(&self) -> Vec<String> {
        let args: &[&str] = match self {
            Self::Pull => &["pull"],
            Self::Up => &["up", "-d", "--pull", "always", "--force-recreate"],
            Self::Down => &["down", "-v", "--remove-orphans"],
            Self::Restart => &["restart"],
            Self::Ps => &["ps", "--format", "json"],
            Self::Logs { tail } => {
                return vec![
                    "logs".to_string(),
                    "--tail".to_string(),
                    tail.to_string(),
                    "--no-color".to_string(),
                ];
            }
            Self::Images => &["images", "--format", "json"],
        };
        args.iter().map(|a| a.to_string()).collect()
    }
}

/// Full argument vector for a project-scoped compose invocation.
pub fn compose_args(project: &str, command: &ComposeCommand) -> Vec<String> {
    let mut args = vec!["compose".to_string(), "-p".to_string(), project.to_string()];
    args.extend(command.args());
    args
}

/// Where a compose command runs: the engine namespace and the directory
/// holding `docker-compose.yml` and `.env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectScope {
    pub project: String,
    pub working_dir: PathBuf,
}

/// Captured result of an external command that ran to completion.
#[derive(Debug, Clone, Serialize)]
pub struct CommandOutput {
    /// Stdout followed by stderr, lossily decoded as UTF-8.
    pub output: String,
    /// Process exit code (`-1` if killed by signal).
    pub exit_code: i32,
    pub success: bool,
    pub duration_ms: u64,
}

impl CommandOutput {
    /// Treat a non-zero exit as an error carrying the captured output.
    pub fn into_result(self) -> Result<String, ExecError> {
        if self.success {
            Ok(self.output)
        } else {
            Err(ExecError::NonZeroExit {
                code: self.exit_code,
                output: self.output.trim_end().to_string(),
            })
        }
    }
}

/// Errors produced while running an external command.
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    /// The program could not be started at all.
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("I/O error while waiting for command: {0}")]
    Io(#[from] std::io::Error),

    /// The command ran and exited unsuccessfully.
    #[error("{output}: exit status {code}")]
    NonZeroExit { code: i32, output: String },

    /// The command exceeded its deadline and was killed.
    #[error("command timed out after {}s", .timeout.as_secs())]
    Timeout { timeout: Duration },

    /// The agent is shutting down; the command was killed.
    #[error("command cancelled")]
    Cancelled,
}

/// Runs container-engine commands on behalf of the orchestrator.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a compose sub-command scoped to `scope`.
    async fn compose(
        &self,
        scope: &ProjectScope,
        command: ComposeCommand,
    ) -> Result<CommandOutput, ExecError>;

    /// Run `script` in a one-shot database-engine container on the host
    /// network, connecting to `target` (`host:port`).
    async fn admin_script(&self, target: &str, script: &str) -> Result<CommandOutput, ExecError>;

    /// Whether the engine and its compose sub-command are reachable.
    async fn is_available(&self) -> bool;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
