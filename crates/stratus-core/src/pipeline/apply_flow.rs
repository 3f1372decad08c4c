//! Apply flow and the inventory refresh that follows it.

use log::{error, info, warn};

use super::{ApplyReport, Pipeline, APPLY_ARGS, INIT_ARGS, SHOW_PLAN_ARGS, SHOW_STATE_ARGS};
use crate::{
    error::{PreconditionViolation, Result, StratusError},
    models::{Plan, PlanStatus, Project},
    params::Id,
    runner::ToolStep,
    state::{planned_changes, PlannedChange, StateSnapshot},
    workspace::Workspace,
};

impl Pipeline {
    /// Applies an approved plan.
    ///
    /// The approval gate is checked before anything is staged, and again
    /// once the project's lock is held. The plan is recomputed from its
    /// stored configuration right before apply and must match what was
    /// approved: the same changes flag and, when the approved plan carries
    /// its structured form, the same resource changes. A failed or drifted
    /// re-plan leaves the plan approved. A failed apply marks it `failed`.
    ///
    /// # Errors
    ///
    /// Returns `StratusError::PlanNotFound` if the plan does not exist
    /// Returns `StratusError::Precondition` if the plan is not approved; no
    /// tool is invoked in that case
    /// Returns `StratusError::PlanDrift` if the re-plan differs from the
    /// approved plan; `apply` is not run
    /// Returns `StratusError::Tool` if `init`, the re-plan or `apply` fails
    pub async fn apply(&self, params: &Id) -> Result<ApplyReport> {
        let plan_id = params.id;
        let (plan, _) = self.load_approved(plan_id).await?;

        let _guard = self.locks.acquire(plan.project_id).await?;
        // Another invocation may have applied or failed it while we waited
        let (plan, project) = self.load_approved(plan_id).await?;

        let workspace = self.stage(&project, &plan.config_text).await?;
        self.init(&workspace, &project, INIT_ARGS).await?;
        let replan = self
            .compute_plan(&workspace, &project, ToolStep::Replan)
            .await?;
        if let Err(e) = self
            .check_drift(&workspace, &project, &plan, replan.has_changes)
            .await
        {
            warn!("Not applying plan {plan_id}: {e}");
            return Err(e);
        }

        let applied = self.runner.run(&workspace, APPLY_ARGS, &project).await;
        let output = match applied.check(ToolStep::Apply) {
            Ok(output) => output,
            Err(e) => {
                error!("Apply of plan {plan_id} failed: {e}");
                self.mark_failed(plan_id).await?;
                return Err(e);
            }
        };

        let plan = self
            .with_db(move |db| db.record_apply_success(plan_id))
            .await?;
        info!("Applied plan {} to project {}", plan.id, project.name);

        let mut warnings = Vec::new();
        let inventory = match self.refresh_inventory(&workspace, &project).await {
            Ok(count) => Some(count),
            Err(e) => {
                warn!("Inventory of project {} not refreshed: {e}", project.name);
                warnings.push(format!("Resource inventory not refreshed: {e}"));
                None
            }
        };
        self.workspaces.destroy(workspace);

        Ok(ApplyReport {
            plan,
            output: output.stdout,
            inventory,
            warnings,
        })
    }

    /// Loads a plan and its project, requiring the plan to be approved.
    async fn load_approved(&self, plan_id: u64) -> Result<(Plan, Project)> {
        self.with_db(move |db| {
            let plan = db.require_plan(plan_id)?;
            if plan.status != PlanStatus::Approved {
                return Err(PreconditionViolation::NotApproved {
                    plan_id,
                    status: plan.status,
                }
                .into());
            }
            let project = db.require_project(plan.project_id)?;
            Ok((plan, project))
        })
        .await
    }

    /// Compares the re-plan saved in `workspace` with the approved `plan`.
    async fn check_drift(
        &self,
        workspace: &Workspace,
        project: &Project,
        plan: &Plan,
        has_changes: bool,
    ) -> Result<()> {
        if has_changes != plan.has_changes {
            let reason = if plan.has_changes {
                "the approved plan had changes, the re-plan has none"
            } else {
                "the approved plan had no changes, the re-plan has some"
            };
            return Err(StratusError::PlanDrift {
                plan_id: plan.id,
                reason: reason.to_string(),
            });
        }

        let Some(structured) = &plan.plan_structured else {
            return Ok(());
        };
        let approved = planned_changes(structured)?;

        let output = self
            .runner
            .run(workspace, SHOW_PLAN_ARGS, project)
            .await
            .check(ToolStep::Show)?;
        let document: serde_json::Value = serde_json::from_str(&output.stdout)?;
        let current = planned_changes(&document)?;

        if approved != current {
            return Err(StratusError::PlanDrift {
                plan_id: plan.id,
                reason: format!(
                    "approved [{}], re-plan [{}]",
                    summarize(&approved),
                    summarize(&current)
                ),
            });
        }
        Ok(())
    }

    async fn mark_failed(&self, plan_id: u64) -> Result<()> {
        self.with_db(move |db| db.transition_plan(plan_id, PlanStatus::Approved, PlanStatus::Failed))
            .await?;
        info!("Marked plan {plan_id} failed");
        Ok(())
    }

    /// Replaces the project's inventory with the state in `workspace`.
    async fn refresh_inventory(&self, workspace: &Workspace, project: &Project) -> Result<usize> {
        let output = self
            .runner
            .run(workspace, SHOW_STATE_ARGS, project)
            .await
            .check(ToolStep::Show)?;
        let snapshot = StateSnapshot::from_json(&output.stdout)?;

        let project_id = project.id;
        let count = self
            .with_db(move |db| db.replace_resources(project_id, &snapshot.resources))
            .await?;
        info!("Inventory of project {} now holds {count} resources", project.name);
        Ok(count)
    }
}

fn summarize(changes: &[PlannedChange]) -> String {
    changes
        .iter()
        .map(|change| format!("{} {}", change.address, change.actions.join("/")))
        .collect::<Vec<_>>()
        .join(", ")
}
