//! Builder for creating and configuring Pipeline instances.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use log::debug;
use tokio::task;

use super::Pipeline;

/// Upper bound on tool runs one flow makes while holding a project lock,
/// with headroom. Leases older than this many timeouts count as abandoned.
const LOCK_LEASE_RUNS: u32 = 8;
use crate::{
    backend::BackendResolver,
    credentials::CredentialSource,
    db::Database,
    error::{Result, StratusError},
    locks::ProjectLocks,
    runner::{RunnerConfig, Sandbox, ToolRunner},
    workspace::WorkspaceManager,
};

/// Builder for creating and configuring Pipeline instances.
#[derive(Clone, Default)]
pub struct PipelineBuilder {
    database_path: Option<PathBuf>,
    workspace_root: Option<PathBuf>,
    runner: RunnerConfig,
    credentials: Option<CredentialSource>,
    backend: Option<Arc<dyn BackendResolver>>,
}

impl PipelineBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom database file path.
    ///
    /// If not specified, uses XDG Base Directory specification:
    /// `$XDG_DATA_HOME/stratus/stratus.db` or `~/.local/share/stratus/stratus.db`
    pub fn with_database_path<P: AsRef<Path>>(mut self, path: Option<P>) -> Self {
        if let Some(path) = path {
            self.database_path = Some(path.as_ref().to_path_buf());
        }
        self
    }

    /// Sets the directory workspaces are allocated in. Defaults to the system
    /// temporary directory.
    pub fn with_workspace_root<P: AsRef<Path>>(mut self, root: Option<P>) -> Self {
        if let Some(root) = root {
            self.workspace_root = Some(root.as_ref().to_path_buf());
        }
        self
    }

    /// Selects how the provisioning tool is launched.
    pub fn with_sandbox(mut self, sandbox: Sandbox) -> Self {
        self.runner.sandbox = sandbox;
        self
    }

    /// Bounds every single tool run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.runner.timeout = timeout;
        self
    }

    /// Uses an explicit credential source instead of the process environment.
    pub fn with_credentials(mut self, credentials: CredentialSource) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Replaces the URL-scheme backend resolver.
    pub fn with_backend_resolver(mut self, backend: Arc<dyn BackendResolver>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Builds the configured pipeline, creating the database if needed.
    ///
    /// # Errors
    ///
    /// Returns `StratusError::FileSystem` if the database path is invalid
    /// Returns `StratusError::Database` if database initialization fails
    /// Returns `StratusError::Configuration` if the timeout is zero
    pub async fn build(self) -> Result<Pipeline> {
        if self.runner.timeout.is_zero() {
            return Err(StratusError::Configuration {
                message: "Tool timeout must be greater than zero".to_string(),
            });
        }

        let db_path = if let Some(path) = self.database_path {
            path
        } else {
            Self::default_database_path()?
        };

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StratusError::FileSystem {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let db_path_clone = db_path.clone();
        task::spawn_blocking(move || {
            let _db = Database::new(&db_path_clone)?;
            Ok::<(), StratusError>(())
        })
        .await
        .map_err(StratusError::join)??;

        let mut workspaces = WorkspaceManager::new(self.workspace_root);
        if let Some(backend) = self.backend {
            workspaces = workspaces.with_backend_resolver(backend);
        }

        let credentials = self
            .credentials
            .unwrap_or_else(CredentialSource::from_process_env);
        debug!(
            "Pipeline using {:?}, timeout {}s, credentials {:?}",
            self.runner.sandbox,
            self.runner.timeout.as_secs(),
            credentials
        );

        let locks = ProjectLocks::new(
            db_path.clone(),
            self.runner.timeout.saturating_mul(LOCK_LEASE_RUNS),
        );

        Ok(Pipeline::new(
            db_path,
            workspaces,
            ToolRunner::new(self.runner, credentials),
            locks,
        ))
    }

    /// Returns the default database path following XDG Base Directory
    /// specification.
    fn default_database_path() -> Result<PathBuf> {
        xdg::BaseDirectories::with_prefix("stratus")
            .place_data_file("stratus.db")
            .map_err(|e| StratusError::XdgDirectory(e.to_string()))
    }
}
