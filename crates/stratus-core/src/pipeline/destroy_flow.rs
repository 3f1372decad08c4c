//! Destroy flow.

use log::info;

use super::{DestroyReport, Pipeline, DESTROY_ARGS, INIT_ARGS};
use crate::{
    error::{PreconditionViolation, Result},
    params::ProjectConfig,
    runner::ToolStep,
};

impl Pipeline {
    /// Destroys everything `params.config_text` manages for the project.
    ///
    /// On success the project's inventory is cleared, its applied
    /// configuration forgotten and its applied prompts marked destroyed.
    /// Plans keep their statuses.
    pub async fn destroy(&self, params: &ProjectConfig) -> Result<DestroyReport> {
        let project = self.require_project(params.project_id).await?;
        let _guard = self.locks.acquire(project.id).await?;

        let workspace = self.stage(&project, &params.config_text).await?;
        self.init(&workspace, &project, INIT_ARGS).await?;
        let output = self
            .runner
            .run(&workspace, DESTROY_ARGS, &project)
            .await
            .check(ToolStep::Destroy)?;
        self.workspaces.destroy(workspace);

        let project_id = project.id;
        let removed_resources = self.with_db(move |db| db.record_destroy(project_id)).await?;
        info!(
            "Destroyed project {} infrastructure, removed {removed_resources} inventory entries",
            project.name
        );

        Ok(DestroyReport {
            project_id,
            output: output.stdout,
            removed_resources,
        })
    }

    /// Destroys the configuration last applied to the project.
    ///
    /// # Errors
    ///
    /// Returns `StratusError::Precondition` if nothing is applied
    pub async fn destroy_applied(&self, project_id: u64) -> Result<DestroyReport> {
        let project = self.require_project(project_id).await?;
        let config_text = project
            .applied_config
            .ok_or(PreconditionViolation::NothingApplied { project_id })?;

        self.destroy(&ProjectConfig {
            project_id,
            config_text,
        })
        .await
    }
}
