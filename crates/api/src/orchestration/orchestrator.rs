use std::sync::Arc;

use q8_core::compose::{CommandExecutor, ComposeCommand, ExecError, ProjectScope};
use q8_core::database::{build_user_script, AdminCredentials, DatabaseUserRequest};
use q8_core::error::CoreError;
use q8_core::tenant::{project_name, validate_subdomain, ProvisionPayload, TenantIdentity};
use q8_core::tenant_fs::{TenantDirs, TenantFsError};

use super::locks::TenantLocks;
use crate::config::AgentConfig;

/// Failure of a lifecycle operation, prefixed with the stage that failed.
#[derive(Debug, thiserror::Error)]
pub enum OrchestrationError {
    /// Rejected before any side effect.
    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("fs error: {0}")]
    Prepare(#[source] TenantFsError),

    #[error("config error: {0}")]
    WriteConfig(#[source] TenantFsError),

    #[error("fs archive error: {0}")]
    Archive(#[source] TenantFsError),

    #[error("docker {} error: {source}", .command.name())]
    Compose {
        command: ComposeCommand,
        #[source]
        source: ExecError,
    },

    #[error("mongo execution failed: {0}")]
    AdminScript(#[source] ExecError),
}

impl OrchestrationError {
    /// The underlying command failure, if this error came from one.
    pub fn exec_error(&self) -> Option<&ExecError> {
        match self {
            Self::Compose { source, .. } => Some(source),
            Self::AdminScript(source) => Some(source),
            _ => None,
        }
    }
}

pub type OrchestrationResult<T> = Result<T, OrchestrationError>;

/// Coordinates tenant operations over the directory manager and the
/// command executor.
///
/// Operations are stateless sequences. Provision, teardown and restart hold
/// the subdomain's lock for their whole duration; the read-only inspections
/// do not.
pub struct TenantOrchestrator {
    dirs: TenantDirs,
    executor: Arc<dyn CommandExecutor>,
    locks: TenantLocks,
    project_prefix: String,
    db_target: String,
    db_admin: AdminCredentials,
}

impl TenantOrchestrator {
    pub fn new(config: &AgentConfig, executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            dirs: TenantDirs::new(&config.tenants_root),
            executor,
            locks: TenantLocks::new(),
            project_prefix: config.project_prefix.clone(),
            db_target: config.mongo.target(),
            db_admin: AdminCredentials {
                user: config.mongo.user.clone(),
                password: config.mongo.password.clone(),
            },
        }
    }

    /// Compose project name for `subdomain`.
    pub fn project(&self, subdomain: &str) -> String {
        project_name(&self.project_prefix, subdomain)
    }

    /// Provision (or re-provision) a tenant.
    ///
    /// Prepare -> write config -> pull -> up, stopping at the first failure.
    /// Pull runs separately even though `up` re-pulls so that image failures
    /// surface with their own diagnostic.
    pub async fn provision(
        &self,
        identity: &TenantIdentity,
        payload: &ProvisionPayload,
    ) -> OrchestrationResult<()> {
        validate_subdomain(&identity.subdomain)?;
        let _guard = self.locks.acquire(&identity.subdomain).await;

        tracing::info!(
            tenant_id = %identity.id,
            subdomain = %identity.subdomain,
            "Provisioning tenant",
        );

        let dir = self
            .dirs
            .prepare(&identity.subdomain)
            .await
            .map_err(OrchestrationError::Prepare)?;

        self.dirs
            .write_config(
                &identity.subdomain,
                &payload.compose_content,
                &payload.env_content,
            )
            .await
            .map_err(OrchestrationError::WriteConfig)?;

        let scope = ProjectScope {
            project: self.project(&identity.subdomain),
            working_dir: dir,
        };

        tracing::info!(project = %scope.project, "Pulling images");
        self.run(&scope, ComposeCommand::Pull).await?;

        tracing::info!(project = %scope.project, "Starting containers");
        self.run(&scope, ComposeCommand::Up).await?;

        tracing::info!(tenant_id = %identity.id, "Tenant provisioned");
        Ok(())
    }

    /// Stop the tenant's containers and archive its directory.
    ///
    /// A failed `down` is logged and ignored since the containers may
    /// already be gone; archiving still runs. Returns the archive directory
    /// name, or `None` when there was no directory.
    pub async fn teardown(&self, subdomain: &str) -> OrchestrationResult<Option<String>> {
        validate_subdomain(subdomain)?;
        let _guard = self.locks.acquire(subdomain).await;

        tracing::info!(subdomain, "Tearing down tenant");

        let scope = self.scope(subdomain);
        if let Err(e) = self.run(&scope, ComposeCommand::Down).await {
            tracing::warn!(
                subdomain,
                project = %scope.project,
                error = %e,
                "docker down failed (might already be gone)",
            );
        }

        let archived = self
            .dirs
            .archive(subdomain)
            .await
            .map_err(OrchestrationError::Archive)?;

        match &archived {
            Some(name) => tracing::info!(subdomain, archived_as = %name, "Tenant archived"),
            None => tracing::info!(subdomain, "Tenant directory not found, nothing to archive"),
        }
        Ok(archived)
    }

    /// Restart the tenant's containers in place.
    pub async fn restart(&self, subdomain: &str) -> OrchestrationResult<()> {
        validate_subdomain(subdomain)?;
        let _guard = self.locks.acquire(subdomain).await;

        tracing::info!(subdomain, "Restarting tenant");
        self.run(&self.scope(subdomain), ComposeCommand::Restart)
            .await
            .map(|_| ())
    }

    /// Raw `ps --format json` output.
    pub async fn status(&self, subdomain: &str) -> OrchestrationResult<String> {
        validate_subdomain(subdomain)?;
        self.run(&self.scope(subdomain), ComposeCommand::Ps).await
    }

    /// Last `tail` lines of combined service logs.
    pub async fn logs(&self, subdomain: &str, tail: u32) -> OrchestrationResult<String> {
        validate_subdomain(subdomain)?;
        self.run(&self.scope(subdomain), ComposeCommand::Logs { tail })
            .await
    }

    /// Raw `images --format json` output.
    pub async fn images(&self, subdomain: &str) -> OrchestrationResult<String> {
        validate_subdomain(subdomain)?;
        self.run(&self.scope(subdomain), ComposeCommand::Images)
            .await
    }

    /// Create a tenant database user, or reset its password if it exists.
    ///
    /// Administrative credentials come from configuration only.
    pub async fn create_database_user(
        &self,
        request: &DatabaseUserRequest,
    ) -> OrchestrationResult<String> {
        request.validate()?;

        tracing::info!(
            user = %request.new_user,
            database = %request.database_name,
            host = %self.db_target,
            "Creating database user",
        );

        let script = build_user_script(&self.db_admin, request);
        let output = self
            .executor
            .admin_script(&self.db_target, &script)
            .await
            .and_then(|out| out.into_result())
            .map_err(OrchestrationError::AdminScript)?;

        tracing::info!(output = %output.trim(), "Database user script finished");
        Ok(output)
    }

    fn scope(&self, subdomain: &str) -> ProjectScope {
        ProjectScope {
            project: self.project(subdomain),
            working_dir: self.dirs.path(subdomain),
        }
    }

    async fn run(&self, scope: &ProjectScope, command: ComposeCommand) -> OrchestrationResult<String> {
        self.executor
            .compose(scope, command)
            .await
            .and_then(|out| out.into_result())
            .map_err(|source| OrchestrationError::Compose { command, source })
    }
}
