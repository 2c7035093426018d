use std::path::PathBuf;
use std::time::Duration;

use q8_core::tenant::DEFAULT_PROJECT_PREFIX;

/// Placeholder admin token; a warning is logged when it is still in use.
pub const DEFAULT_ADMIN_TOKEN: &str = "change-me";

/// Invalid value for a configuration variable.
#[derive(Debug, thiserror::Error)]
#[error("{var} must be {expected}, got '{value}'")]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub expected: &'static str,
}

/// Administrative connection used by the database-user script.
#[derive(Clone)]
pub struct MongoAdminConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Image the one-shot `mongosh` container runs.
    pub image: String,
}

impl MongoAdminConfig {
    /// `host:port` passed to `mongosh`.
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Agent configuration loaded once at startup from environment variables.
///
/// Immutable after construction; shared as `Arc<AgentConfig>`.
#[derive(Clone)]
pub struct AgentConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `8080`).
    pub port: u16,
    /// Bearer token required on every `/v1` route.
    pub admin_token: String,
    /// Directory holding one sub-directory per tenant.
    pub tenants_root: PathBuf,
    /// Prefix joined with the subdomain to form the compose project name.
    pub project_prefix: String,
    /// `docker` binary name or path.
    pub docker_bin: String,
    /// Deadline for each external command in seconds (default: `600`).
    pub command_timeout_secs: u64,
    /// Whole-request deadline in seconds (default: `1800`).
    pub request_timeout_secs: u64,
    /// How long in-flight commands may run after a shutdown signal before
    /// they are killed (default: `30`).
    pub shutdown_grace_secs: u64,
    pub mongo: MongoAdminConfig,
}

impl AgentConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                   | Default         |
    /// |---------------------------|-----------------|
    /// | `Q8_AGENT_HOST`           | `0.0.0.0`       |
    /// | `Q8_AGENT_PORT`           | `8080`          |
    /// | `Q8_AGENT_ADMIN_TOKEN`    | `change-me`     |
    /// | `Q8_TENANTS_ROOT`         | `/opt/tenants`  |
    /// | `Q8_PROJECT_PREFIX`       | `q8-`           |
    /// | `Q8_DOCKER_BIN`           | `docker`        |
    /// | `Q8_COMMAND_TIMEOUT_SECS` | `600`           |
    /// | `Q8_REQUEST_TIMEOUT_SECS` | `1800`          |
    /// | `Q8_SHUTDOWN_GRACE_SECS`  | `30`            |
    /// | `Q8_MONGO_HOST`           | `127.0.0.1`     |
    /// | `Q8_MONGO_PORT`           | `27017`         |
    /// | `Q8_MONGO_USER`           | `admin`         |
    /// | `Q8_MONGO_PASSWORD`       | (empty)         |
    /// | `Q8_MONGO_IMAGE`          | `mongo:latest`  |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Self {
            host: var("Q8_AGENT_HOST", "0.0.0.0"),
            port: parse(&lookup, "Q8_AGENT_PORT", 8080, "a valid port number")?,
            admin_token: var("Q8_AGENT_ADMIN_TOKEN", DEFAULT_ADMIN_TOKEN),
            tenants_root: PathBuf::from(var("Q8_TENANTS_ROOT", "/opt/tenants")),
            project_prefix: var("Q8_PROJECT_PREFIX", DEFAULT_PROJECT_PREFIX),
            docker_bin: var("Q8_DOCKER_BIN", "docker"),
            command_timeout_secs: parse(
                &lookup,
                "Q8_COMMAND_TIMEOUT_SECS",
                600,
                "a number of seconds",
            )?,
            request_timeout_secs: parse(
                &lookup,
                "Q8_REQUEST_TIMEOUT_SECS",
                1800,
                "a number of seconds",
            )?,
            shutdown_grace_secs: parse(
                &lookup,
                "Q8_SHUTDOWN_GRACE_SECS",
                30,
                "a number of seconds",
            )?,
            mongo: MongoAdminConfig {
                host: var("Q8_MONGO_HOST", "127.0.0.1"),
                port: parse(&lookup, "Q8_MONGO_PORT", 27017, "a valid port number")?,
                user: var("Q8_MONGO_USER", "admin"),
                password: var("Q8_MONGO_PASSWORD", ""),
                image: var("Q8_MONGO_IMAGE", q8_core::compose::docker::DEFAULT_ADMIN_IMAGE),
            },
        })
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn parse<F, T>(lookup: &F, var: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(var) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError {
            var,
            value,
            expected,
        }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
