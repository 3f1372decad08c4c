//! Ledger operations for the Pipeline: records that never run the tool.

use log::info;

use super::Pipeline;
use crate::{
    error::Result,
    models::{Plan, PlanStatus, Project, Prompt, Resource},
    params::{CreateProject, Id, UpdateProject},
};

impl Pipeline {
    /// Registers a new project. Names are unique.
    pub async fn create_project(&self, params: &CreateProject) -> Result<Project> {
        let params = params.clone();
        let project = self.with_db(move |db| db.create_project(&params)).await?;
        info!("Created project {} ({})", project.id, project.name);
        Ok(project)
    }

    /// Retrieves a project by its ID.
    pub async fn get_project(&self, params: &Id) -> Result<Option<Project>> {
        let id = params.id;
        self.with_db(move |db| db.get_project(id)).await
    }

    /// Lists all projects ordered by name.
    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.with_db(|db| db.list_projects()).await
    }

    /// Changes a project's settings.
    ///
    /// Waits for any running plan/apply/destroy on the project, so a run
    /// never sees its backend or provider change underneath it.
    pub async fn update_project(&self, params: &UpdateProject) -> Result<Project> {
        let _guard = self.locks.acquire(params.id).await?;

        let params = params.clone();
        let project = self.with_db(move |db| db.update_project(&params)).await?;
        info!("Updated project {} ({})", project.id, project.name);
        Ok(project)
    }

    /// Deletes a project together with its prompts, plans and inventory.
    ///
    /// Waits for any running plan/apply/destroy on the project. Returns the
    /// deleted project, or `None` when it did not exist. Infrastructure the
    /// project provisioned is left alone.
    pub async fn delete_project(&self, params: &Id) -> Result<Option<Project>> {
        let id = params.id;
        let _guard = self.locks.acquire(id).await?;

        let deleted = self
            .with_db(move |db| match db.get_project(id)? {
                Some(project) => {
                    db.delete_project(id)?;
                    Ok(Some(project))
                }
                None => Ok(None),
            })
            .await?;

        self.locks.forget(id);
        if let Some(project) = &deleted {
            info!("Deleted project {} ({})", project.id, project.name);
        }
        Ok(deleted)
    }

    /// Lists a project's prompts, newest first.
    pub async fn list_prompts(&self, project_id: u64) -> Result<Vec<Prompt>> {
        self.with_db(move |db| {
            db.require_project(project_id)?;
            db.list_prompts(project_id)
        })
        .await
    }

    /// Retrieves a plan by its ID.
    pub async fn get_plan(&self, params: &Id) -> Result<Option<Plan>> {
        let id = params.id;
        self.with_db(move |db| db.get_plan(id)).await
    }

    /// Lists a project's plans, newest first.
    pub async fn list_plans(&self, project_id: u64) -> Result<Vec<Plan>> {
        self.with_db(move |db| {
            db.require_project(project_id)?;
            db.list_plans(project_id)
        })
        .await
    }

    /// Approves a pending plan.
    ///
    /// # Errors
    ///
    /// Returns `StratusError::PlanNotFound` if the plan does not exist
    /// Returns `StratusError::Precondition` if the plan is not pending,
    /// including when it was already approved
    pub async fn approve_plan(&self, params: &Id) -> Result<Plan> {
        let id = params.id;
        let plan = self
            .with_db(move |db| db.transition_plan(id, PlanStatus::Pending, PlanStatus::Approved))
            .await?;
        info!("Approved plan {} of project {}", plan.id, plan.project_id);
        Ok(plan)
    }

    /// Lists a project's resource inventory ordered by address.
    pub async fn list_resources(&self, project_id: u64) -> Result<Vec<Resource>> {
        self.with_db(move |db| {
            db.require_project(project_id)?;
            db.list_resources(project_id)
        })
        .await
    }
}
