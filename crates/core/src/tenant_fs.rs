//! On-disk tenant directories.
//!
//! Every tenant has exactly one active directory, `root/<subdomain>`,
//! holding `docker-compose.yml` and `.env`. Teardown archives the directory
//! by renaming it to `root/<subdomain>-<uuid>` so the subdomain can be
//! provisioned again immediately.

use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Composition file written into each tenant directory.
pub const COMPOSE_FILE_NAME: &str = "docker-compose.yml";

/// Environment file written into each tenant directory.
pub const ENV_FILE_NAME: &str = ".env";

/// Filesystem failures, each carrying the affected path.
#[derive(Debug, thiserror::Error)]
pub enum TenantFsError {
    #[error("failed to create tenant directory {}: {source}", .path.display())]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    WriteFile { path: PathBuf, source: io::Error },

    #[error("failed to inspect {}: {source}", .path.display())]
    Inspect { path: PathBuf, source: io::Error },

    #[error("failed to archive directory {} to {}: {source}", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("failed to remove {}: {source}", .path.display())]
    Remove { path: PathBuf, source: io::Error },
}

/// Owns the tenants root and every path beneath it.
#[derive(Debug, Clone)]
pub struct TenantDirs {
    root: PathBuf,
}

impl TenantDirs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of the active directory for `subdomain`. Pure computation.
    pub fn path(&self, subdomain: &str) -> PathBuf {
        self.root.join(subdomain)
    }

    /// Ensure the tenant directory exists, creating parents as needed.
    pub async fn prepare(&self, subdomain: &str) -> Result<PathBuf, TenantFsError> {
        let path = self.path(subdomain);
        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| TenantFsError::CreateDir {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }

    /// Overwrite both configuration files. The directory must already exist.
    pub async fn write_config(
        &self,
        subdomain: &str,
        compose: &str,
        env: &str,
    ) -> Result<(), TenantFsError> {
        let dir = self.path(subdomain);
        write_file(&dir.join(COMPOSE_FILE_NAME), compose).await?;
        write_file(&dir.join(ENV_FILE_NAME), env).await?;
        Ok(())
    }

    /// Rename the tenant directory to `<subdomain>-<uuid>`.
    ///
    /// Returns `Ok(None)` when there is nothing to archive. On rename
    /// failure the original directory is left in place.
    pub async fn archive(&self, subdomain: &str) -> Result<Option<String>, TenantFsError> {
        let from = self.path(subdomain);

        let exists = tokio::fs::try_exists(&from)
            .await
            .map_err(|source| TenantFsError::Inspect {
                path: from.clone(),
                source,
            })?;
        if !exists {
            return Ok(None);
        }

        let archived_name = format!("{subdomain}-{}", Uuid::new_v4());
        let to = self.root.join(&archived_name);

        tokio::fs::rename(&from, &to)
            .await
            .map_err(|source| TenantFsError::Rename {
                from: from.clone(),
                to: to.clone(),
                source,
            })?;

        Ok(Some(archived_name))
    }

    /// Recursively delete the tenant directory. Absent is not an error.
    pub async fn remove(&self, subdomain: &str) -> Result<(), TenantFsError> {
        let path = self.path(subdomain);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(TenantFsError::Remove { path, source }),
        }
    }
}

async fn write_file(path: &Path, contents: &str) -> Result<(), TenantFsError> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|source| TenantFsError::WriteFile {
            path: path.to_path_buf(),
            source,
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
