//! `docker compose` backed [`CommandExecutor`].

use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::executor::{compose_args, CommandExecutor, CommandOutput, ComposeCommand, ExecError, ProjectScope};
use super::subprocess;

/// Default deadline for a single compose invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(600);

/// Deadline for the startup availability probe.
const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(15);

/// Image used for one-shot administrative database scripts.
pub const DEFAULT_ADMIN_IMAGE: &str = "mongo:latest";

/// Shells out to the `docker` CLI.
///
/// Every invocation is bounded by `timeout` and killed when `cancel` fires.
#[derive(Debug, Clone)]
pub struct DockerCompose {
    program: String,
    timeout: Duration,
    admin_image: String,
    cancel: CancellationToken,
}

impl DockerCompose {
    /// Create an executor for the given `docker` binary (name or path).
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
            admin_image: DEFAULT_ADMIN_IMAGE.to_string(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_admin_image(mut self, image: impl Into<String>) -> Self {
        self.admin_image = image.into();
        self
    }

    /// Kill in-flight commands when `cancel` fires (agent shutdown).
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    fn admin_script_args(&self, target: &str, script: &str) -> Vec<String> {
        [
            "run",
            "--rm",
            "--network",
            "host",
            self.admin_image.as_str(),
            "mongosh",
            target,
            "--eval",
            script,
        ]
        .iter()
        .map(|a| a.to_string())
        .collect()
    }
}

#[async_trait]
impl CommandExecutor for DockerCompose {
    async fn compose(
        &self,
        scope: &ProjectScope,
        command: ComposeCommand,
    ) -> Result<CommandOutput, ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(compose_args(&scope.project, &command))
            .current_dir(&scope.working_dir);

        tracing::debug!(
            project = %scope.project,
            command = command.name(),
            dir = %scope.working_dir.display(),
            "Running docker compose",
        );

        let out = subprocess::run_command(&mut cmd, self.timeout, &self.cancel).await?;

        if !out.success {
            tracing::debug!(
                project = %scope.project,
                command = command.name(),
                exit_code = out.exit_code,
                elapsed_ms = out.duration_ms,
                "docker compose exited unsuccessfully",
            );
        }
        Ok(out)
    }

    async fn admin_script(&self, target: &str, script: &str) -> Result<CommandOutput, ExecError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.admin_script_args(target, script));

        tracing::debug!(image = %self.admin_image, host = target, "Running administrative script");

        subprocess::run_command(&mut cmd, self.timeout, &self.cancel).await
    }

    async fn is_available(&self) -> bool {
        let mut cmd = Command::new(&self.program);
        cmd.args(["compose", "version"]);

        match subprocess::run_command(&mut cmd, AVAILABILITY_TIMEOUT, &self.cancel).await {
            Ok(out) => out.success,
            Err(e) => {
                tracing::debug!(program = %self.program, error = %e, "docker compose probe failed");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
