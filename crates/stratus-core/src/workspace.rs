//! Ephemeral staging directories for pipeline invocations.
//!
//! A [`Workspace`] owns a uniquely named temporary directory holding the
//! configuration of exactly one plan/apply/destroy/validate call. The
//! directory is removed when the workspace is dropped, so every exit path of
//! a pipeline flow (success, error, `?` early return, panic unwind) releases
//! it. Cleanup failures are logged and swallowed.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use log::{debug, warn};
use tempfile::TempDir;

use crate::{
    backend::{hcl_string, BackendResolver, UrlSchemeBackendResolver},
    error::{Result, StratusError},
    models::Project,
};

/// File holding the generated configuration, verbatim.
pub const MAIN_CONFIG_FILE: &str = "main.tf";
/// File holding the derived backend stanza.
pub const BACKEND_CONFIG_FILE: &str = "backend.tf";
/// File holding the derived variable declarations.
pub const VARIABLES_FILE: &str = "variables.tf";
/// Default value of the `environment` variable.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

/// A staged configuration directory. Removed on drop.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Directory holding the staged files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component; unique per workspace.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("workspace")
    }

    /// Removes the directory now, logging instead of failing.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!("Removed workspace {}", self.path.display()),
                Err(e) => warn!("Failed to remove workspace {}: {e}", self.path.display()),
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release();
    }
}

/// Allocates and stages workspaces.
#[derive(Clone)]
pub struct WorkspaceManager {
    root: Option<PathBuf>,
    backend: Arc<dyn BackendResolver>,
}

impl WorkspaceManager {
    /// Creates a manager that allocates under `root`, or under the system
    /// temporary directory when `root` is `None`.
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            backend: Arc::new(UrlSchemeBackendResolver),
        }
    }

    /// Replaces the backend resolver.
    pub fn with_backend_resolver(mut self, backend: Arc<dyn BackendResolver>) -> Self {
        self.backend = backend;
        self
    }

    /// Allocates a fresh directory and writes the primary configuration, the
    /// derived backend stanza (when the project has one) and the derived
    /// variables file.
    ///
    /// The configuration text is written as-is; validating it is the
    /// provisioning tool's job.
    pub fn create(&self, project: &Project, config_text: &str) -> Result<Workspace> {
        let prefix = format!("stratus-{}-", sanitize_name(&project.name));
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix);

        let dir = match &self.root {
            Some(root) => {
                fs::create_dir_all(root).map_err(|e| StratusError::FileSystem {
                    path: root.clone(),
                    source: e,
                })?;
                builder.tempdir_in(root)
            }
            None => builder.tempdir(),
        }
        .map_err(|e| StratusError::FileSystem {
            path: self.root.clone().unwrap_or_else(std::env::temp_dir),
            source: e,
        })?;

        let workspace = Workspace {
            path: dir.path().to_path_buf(),
            dir: Some(dir),
        };

        // From here on a failed write drops `workspace`, which removes it
        write_file(workspace.path(), MAIN_CONFIG_FILE, config_text)?;
        if let Some(backend) = self.backend.resolve(project) {
            write_file(workspace.path(), BACKEND_CONFIG_FILE, &backend)?;
        }
        write_file(workspace.path(), VARIABLES_FILE, &variables_config(project))?;

        debug!(
            "Staged workspace {} for project {}",
            workspace.path().display(),
            project.name
        );
        Ok(workspace)
    }

    /// Tears a workspace down. Never fails.
    pub fn destroy(&self, workspace: Workspace) {
        workspace.close();
    }
}

impl Default for WorkspaceManager {
    fn default() -> Self {
        Self::new(None)
    }
}

fn write_file(dir: &Path, name: &str, contents: &str) -> Result<()> {
    let path = dir.join(name);
    fs::write(&path, contents).map_err(|e| StratusError::FileSystem { path, source: e })
}

/// Variable declarations exposing project identity as overridable defaults.
fn variables_config(project: &Project) -> String {
    let variable = |name: &str, description: &str, default: &str| {
        format!(
            "variable \"{name}\" {{\n  description = {}\n  type        = string\n  default     = {}\n}}\n",
            hcl_string(description),
            hcl_string(default)
        )
    };

    [
        variable("project_name", "Project name", &project.name),
        variable("environment", "Deployment environment", DEFAULT_ENVIRONMENT),
        variable("cloud_provider", "Cloud provider", &project.cloud_provider),
    ]
    .join("\n")
}

/// Keeps directory prefixes to a safe character set.
fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .take(32)
        .collect();
    if cleaned.is_empty() {
        "project".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use tempfile::TempDir;

    use super::*;

    fn project(name: &str, url: Option<&str>) -> Project {
        Project {
            id: 3,
            name: name.to_string(),
            description: None,
            cloud_provider: "gcp".to_string(),
            state_bucket_url: url.map(String::from),
            state_bucket_credentials: None,
            llm_provider: None,
            applied_config: None,
            created_at: Timestamp::now(),
            updated_at: Timestamp::now(),
        }
    }

    fn staged_files(path: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(path)
            .expect("readable workspace")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_workspace_without_state_url_has_no_backend_file() {
        let root = TempDir::new().expect("Failed to create temp dir");
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));

        let workspace = manager
            .create(&project("web", None), "resource \"null_resource\" \"a\" {}")
            .expect("Failed to create workspace");

        assert_eq!(staged_files(workspace.path()), vec!["main.tf", "variables.tf"]);
        let main = fs::read_to_string(workspace.path().join(MAIN_CONFIG_FILE)).unwrap();
        assert_eq!(main, "resource \"null_resource\" \"a\" {}");
    }

    #[test]
    fn test_workspace_with_state_url_has_backend_file() {
        let root = TempDir::new().expect("Failed to create temp dir");
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));

        let workspace = manager
            .create(&project("web", Some("gs://state")), "")
            .expect("Failed to create workspace");

        assert_eq!(
            staged_files(workspace.path()),
            vec!["backend.tf", "main.tf", "variables.tf"]
        );
        let backend = fs::read_to_string(workspace.path().join(BACKEND_CONFIG_FILE)).unwrap();
        assert!(backend.contains("backend \"gcs\""));
    }

    #[test]
    fn test_variables_expose_project_identity() {
        let root = TempDir::new().expect("Failed to create temp dir");
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));

        let workspace = manager
            .create(&project("billing", None), "")
            .expect("Failed to create workspace");

        let vars = fs::read_to_string(workspace.path().join(VARIABLES_FILE)).unwrap();
        assert!(vars.contains("variable \"project_name\""));
        assert!(vars.contains("default     = \"billing\""));
        assert!(vars.contains("default     = \"dev\""));
        assert!(vars.contains("default     = \"gcp\""));
    }

    #[test]
    fn test_workspaces_are_unique_and_removed_on_drop() {
        let root = TempDir::new().expect("Failed to create temp dir");
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));
        let p = project("same/name", None);

        let first = manager.create(&p, "").expect("first workspace");
        let second = manager.create(&p, "").expect("second workspace");
        assert_ne!(first.path(), second.path());
        assert!(first.name().starts_with("stratus-same_name-"));

        let first_path = first.path().to_path_buf();
        let second_path = second.path().to_path_buf();
        drop(first);
        manager.destroy(second);

        assert!(!first_path.exists());
        assert!(!second_path.exists());
        assert_eq!(fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_close_tolerates_already_removed_directory() {
        let root = TempDir::new().expect("Failed to create temp dir");
        let manager = WorkspaceManager::new(Some(root.path().to_path_buf()));
        let workspace = manager.create(&project("gone", None), "").expect("workspace");

        fs::remove_dir_all(workspace.path()).expect("manual removal");
        workspace.close();
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("prod-eu_1"), "prod-eu_1");
        assert_eq!(sanitize_name("../etc"), "___etc");
        assert_eq!(sanitize_name(""), "project");
    }
}
