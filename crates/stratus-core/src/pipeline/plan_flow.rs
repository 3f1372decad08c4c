//! Plan flow and generate-then-plan.

use log::{debug, info, warn};

use super::{GenerationReport, Pipeline, PlanReport, INIT_ARGS, SHOW_PLAN_ARGS};
use crate::{
    error::{Result, StratusError},
    generator::{CodeGenerator, GenerationRequest},
    models::Project,
    params::{CreatePlan, GeneratePlan, NewPlan, NewPrompt},
    runner::ToolStep,
    workspace::Workspace,
};

impl Pipeline {
    /// Computes a plan for `params.config_text` and records it as pending.
    ///
    /// Runs `init`, `plan` and a best-effort `show -json` in a fresh
    /// workspace while holding the project's lock. Exit code 2 from the plan
    /// step means changes are present.
    ///
    /// # Errors
    ///
    /// Returns `StratusError::ProjectNotFound` if the project does not exist
    /// Returns `StratusError::Tool` if `init` fails or `plan` exits with
    /// anything but 0 or 2
    /// Returns `StratusError::LocalInvocation` if the tool cannot be run
    pub async fn plan(&self, params: &CreatePlan) -> Result<PlanReport> {
        let project_id = params.project_id;
        let prompt_id = params.prompt_id;
        let project = self
            .with_db(move |db| {
                let project = db.require_project(project_id)?;
                if let Some(prompt_id) = prompt_id {
                    match db.get_prompt(prompt_id)? {
                        Some(prompt) if prompt.project_id == project_id => {}
                        _ => {
                            return Err(StratusError::invalid_input("prompt_id").with_reason(
                                format!("prompt {prompt_id} does not belong to project {project_id}"),
                            ))
                        }
                    }
                }
                Ok(project)
            })
            .await?;

        let _guard = self.locks.acquire(project.id).await?;
        let workspace = self.stage(&project, &params.config_text).await?;

        self.init(&workspace, &project, INIT_ARGS).await?;
        let run = self.compute_plan(&workspace, &project, ToolStep::Plan).await?;

        let mut warnings = Vec::new();
        let structured = self.structured_plan(&workspace, &project, &mut warnings).await;
        self.workspaces.destroy(workspace);

        let new_plan = NewPlan {
            project_id: project.id,
            prompt_id: params.prompt_id,
            config_text: params.config_text.clone(),
            plan_output: run.output,
            plan_structured: structured,
            has_changes: run.has_changes,
            commit_message: params.commit_message.clone(),
        };
        let plan = self.with_db(move |db| db.insert_plan(&new_plan)).await?;

        info!(
            "Recorded plan {} for project {} ({})",
            plan.id,
            project.name,
            if run.has_changes { "changes" } else { "no changes" }
        );

        Ok(PlanReport {
            plan,
            has_changes: run.has_changes,
            warnings,
        })
    }

    /// Asks `generator` for configuration, records the prompt, and plans the
    /// result.
    ///
    /// The generator sees the project's applied configuration, if any, as the
    /// code to revise. The prompt is recorded before planning, so it survives
    /// a failed plan.
    pub async fn generate_plan<G: CodeGenerator>(
        &self,
        params: &GeneratePlan,
        generator: &G,
    ) -> Result<GenerationReport> {
        if params.user_prompt.trim().is_empty() {
            return Err(StratusError::invalid_input("user_prompt").with_reason("must not be empty"));
        }

        let project = self.require_project(params.project_id).await?;
        let request = GenerationRequest {
            existing_code: project.applied_config.clone(),
            project: project.clone(),
            user_prompt: params.user_prompt.clone(),
        };

        let generated = generator.generate(request).await?;
        if generated.code.trim().is_empty() {
            return Err(StratusError::Generation(
                "generator returned no configuration".to_string(),
            ));
        }

        let new_prompt = NewPrompt {
            user_prompt: params.user_prompt.clone(),
            analysis: generated.analysis.clone(),
            code: Some(generated.code.clone()),
            commit_message: generated.commit_message.clone(),
        };
        let project_id = project.id;
        let prompt = self
            .with_db(move |db| db.create_prompt(project_id, &new_prompt))
            .await?;
        debug!("Recorded prompt {} for project {}", prompt.id, project.name);

        let plan = self
            .plan(&CreatePlan {
                project_id,
                config_text: generated.code,
                prompt_id: Some(prompt.id),
                commit_message: generated.commit_message,
            })
            .await?;

        Ok(GenerationReport { prompt, plan })
    }

    /// Reads the saved plan as JSON. Failures only add a warning.
    async fn structured_plan(
        &self,
        workspace: &Workspace,
        project: &Project,
        warnings: &mut Vec<String>,
    ) -> Option<serde_json::Value> {
        let output = self.runner.run(workspace, SHOW_PLAN_ARGS, project).await;
        let output = match output.check(ToolStep::Show) {
            Ok(output) => output,
            Err(e) => {
                warn!("Structured plan unavailable: {e}");
                warnings.push(format!("Structured plan unavailable: {e}"));
                return None;
            }
        };

        match serde_json::from_str(&output.stdout) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Structured plan is not valid JSON: {e}");
                warnings.push(format!("Structured plan is not valid JSON: {e}"));
                None
            }
        }
    }
}
