//! Validation and state inspection. Neither touches the ledger.

use log::debug;

use super::{Pipeline, Validation, INIT_ARGS, INIT_WITHOUT_BACKEND_ARGS, SHOW_STATE_ARGS, VALIDATE_ARGS};
use crate::{
    error::{PreconditionViolation, Result, StratusError},
    params::ProjectConfig,
    runner::ToolStep,
    state::StateSnapshot,
};

impl Pipeline {
    /// Checks configuration syntax and internal consistency.
    ///
    /// Initializes without the remote backend, so no state is touched. An
    /// `init` or `validate` rejection is reported as `valid == false`;
    /// only a tool that cannot run at all is an error.
    pub async fn validate(&self, params: &ProjectConfig) -> Result<Validation> {
        let project = self.require_project(params.project_id).await?;
        let workspace = self.stage(&project, &params.config_text).await?;

        let init = self
            .runner
            .run(&workspace, INIT_WITHOUT_BACKEND_ARGS, &project)
            .await
            .invoked(ToolStep::Init)?;
        if !init.succeeded {
            debug!("Validation of project {} stopped at init", project.name);
            return Ok(Validation {
                valid: false,
                diagnostics: diagnostics("init", &init.stderr, init.exit_code),
                output: init.stdout,
            });
        }

        let output = self
            .runner
            .run(&workspace, VALIDATE_ARGS, &project)
            .await
            .invoked(ToolStep::Validate)?;
        self.workspaces.destroy(workspace);

        let diagnostics = if output.succeeded {
            Vec::new()
        } else {
            diagnostics("validate", &output.stderr, output.exit_code)
        };
        Ok(Validation {
            valid: output.succeeded,
            diagnostics,
            output: output.stdout,
        })
    }

    /// Reads the structured state of the backend `params.config_text`
    /// points at.
    pub async fn get_state(&self, params: &ProjectConfig) -> Result<StateSnapshot> {
        let project = self.require_project(params.project_id).await?;
        let workspace = self.stage(&project, &params.config_text).await?;

        self.init(&workspace, &project, INIT_ARGS).await?;
        let output = self
            .runner
            .run(&workspace, SHOW_STATE_ARGS, &project)
            .await
            .check(ToolStep::Show)?;
        self.workspaces.destroy(workspace);

        StateSnapshot::from_json(&output.stdout)
    }

    /// Reads the state behind the configuration last applied to the project.
    pub async fn state_applied(&self, project_id: u64) -> Result<StateSnapshot> {
        let project = self.require_project(project_id).await?;
        let config_text = project
            .applied_config
            .ok_or(StratusError::from(PreconditionViolation::NothingApplied { project_id }))?;

        self.get_state(&ProjectConfig {
            project_id,
            config_text,
        })
        .await
    }
}

/// Splits tool stderr into diagnostics, falling back to the exit code.
fn diagnostics(step: &str, stderr: &str, exit_code: i32) -> Vec<String> {
    let lines: Vec<String> = stderr
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect();
    if lines.is_empty() {
        vec![format!("{step} failed with exit code {exit_code}")]
    } else {
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::diagnostics;

    #[test]
    fn test_diagnostics_from_stderr() {
        assert_eq!(
            diagnostics("validate", "\nError: Missing required argument\n\n  on main.tf line 3\n", 1),
            vec!["Error: Missing required argument", "on main.tf line 3"]
        );
        assert_eq!(
            diagnostics("init", "  ", 1),
            vec!["init failed with exit code 1"]
        );
    }
}
