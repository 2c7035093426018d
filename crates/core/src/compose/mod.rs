//! Container-engine command execution.
//!
//! [`executor::CommandExecutor`] is the seam the orchestrator talks to;
//! [`docker::DockerCompose`] is the production implementation that shells
//! out to `docker compose`. Process spawning, output capture, timeouts and
//! cancellation live in [`subprocess`].

pub mod docker;
pub mod executor;
pub mod subprocess;

pub use docker::DockerCompose;
pub use executor::{CommandExecutor, CommandOutput, ComposeCommand, ExecError, ProjectScope};
