//! Provisioning pipeline: the state machine driving the provisioning tool.
//!
//! The [`Pipeline`] is the single entry point for every operation that runs
//! the external tool or mutates the ledger. Each flow stages its own
//! [`Workspace`](crate::workspace::Workspace), runs its steps strictly in
//! order, and drops the workspace on every exit path.
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Workspace   │   │  Tool Runner │   │   Pipeline   │   │    Ledger    │
//! │  (staging)   │──▶│  (init/plan/ │──▶│ (exit codes, │──▶│  (SQLite via │
//! │              │   │  apply/...)  │   │ transitions) │   │     db/)     │
//! └──────────────┘   └──────────────┘   └──────────────┘   └──────────────┘
//! ```
//!
//! ## Flows
//!
//! | Flow       | Steps                                       | Ledger effect                     |
//! |------------|---------------------------------------------|-----------------------------------|
//! | plan       | init → plan → show (best effort)            | new `pending` plan                |
//! | apply      | init → re-plan → apply → show state         | plan `applied`/`failed`, inventory replaced |
//! | destroy    | init → destroy                              | inventory cleared                 |
//! | validate   | init (no backend) → validate                | none                              |
//! | state      | init → show                                 | none                              |
//!
//! `init` failure aborts any flow before a plan record exists. Plan, apply
//! and destroy hold the project's lock for their whole duration.
//!
//! ## Submodules
//!
//! - [`builder`]: configuration and construction
//! - [`ledger_ops`]: project/prompt/plan/resource records and plan approval
//! - [`plan_flow`]: plan and generate-then-plan
//! - [`apply_flow`]: apply and inventory refresh
//! - [`destroy_flow`]: destroy
//! - [`inspect_flow`]: validate and state inspection
//! - [`reports`]: values returned by the flows

use std::path::PathBuf;

use tokio::task;

use crate::{
    db::Database,
    error::{Result, StratusError},
    locks::ProjectLocks,
    models::Project,
    runner::{ToolRunner, ToolStep},
    workspace::{Workspace, WorkspaceManager},
};

pub mod apply_flow;
pub mod builder;
pub mod destroy_flow;
pub mod inspect_flow;
pub mod ledger_ops;
pub mod plan_flow;
pub mod reports;

pub use builder::PipelineBuilder;
pub use reports::{ApplyReport, DestroyReport, GenerationReport, PlanReport, Validation};

/// Name of the saved plan file inside a workspace.
pub const PLAN_FILE: &str = "plan.out";

const INIT_ARGS: &[&str] = &["init", "-input=false", "-no-color"];
const INIT_WITHOUT_BACKEND_ARGS: &[&str] = &["init", "-input=false", "-no-color", "-backend=false"];
const PLAN_ARGS: &[&str] = &[
    "plan",
    "-input=false",
    "-no-color",
    "-detailed-exitcode",
    "-out=plan.out",
];
const SHOW_PLAN_ARGS: &[&str] = &["show", "-json", "-no-color", PLAN_FILE];
const SHOW_STATE_ARGS: &[&str] = &["show", "-json", "-no-color"];
const APPLY_ARGS: &[&str] = &["apply", "-input=false", "-no-color", PLAN_FILE];
const DESTROY_ARGS: &[&str] = &["destroy", "-auto-approve", "-input=false", "-no-color"];
const VALIDATE_ARGS: &[&str] = &["validate", "-no-color"];

/// Plan step exit code: succeeded, no changes.
const PLAN_EXIT_NO_CHANGES: i32 = 0;
/// Plan step exit code: succeeded, changes present.
const PLAN_EXIT_CHANGES: i32 = 2;

/// Main interface for planning, approving, applying and destroying
/// infrastructure.
#[derive(Clone)]
pub struct Pipeline {
    pub(crate) db_path: PathBuf,
    pub(crate) workspaces: WorkspaceManager,
    pub(crate) runner: ToolRunner,
    pub(crate) locks: ProjectLocks,
}

/// Human-readable plan output and whether it reported changes.
pub(crate) struct PlanRun {
    pub output: String,
    pub has_changes: bool,
}

impl Pipeline {
    pub(crate) fn new(
        db_path: PathBuf,
        workspaces: WorkspaceManager,
        runner: ToolRunner,
        locks: ProjectLocks,
    ) -> Self {
        Self {
            db_path,
            workspaces,
            runner,
            locks,
        }
    }

    /// Path of the ledger database.
    pub fn database_path(&self) -> &std::path::Path {
        &self.db_path
    }

    /// Runs `f` against a fresh connection on the blocking pool.
    pub(crate) async fn with_db<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Database) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db_path = self.db_path.clone();
        task::spawn_blocking(move || {
            let mut db = Database::new(&db_path)?;
            f(&mut db)
        })
        .await
        .map_err(StratusError::join)?
    }

    /// Loads a project or fails with `ProjectNotFound`.
    pub(crate) async fn require_project(&self, id: u64) -> Result<Project> {
        self.with_db(move |db| db.require_project(id)).await
    }

    /// Stages `config_text` for `project` on the blocking pool.
    pub(crate) async fn stage(&self, project: &Project, config_text: &str) -> Result<Workspace> {
        let workspaces = self.workspaces.clone();
        let project = project.clone();
        let config_text = config_text.to_string();
        task::spawn_blocking(move || workspaces.create(&project, &config_text))
            .await
            .map_err(StratusError::join)?
    }

    /// Runs `init`; any failure aborts the calling flow.
    pub(crate) async fn init(
        &self,
        workspace: &Workspace,
        project: &Project,
        args: &[&str],
    ) -> Result<()> {
        self.runner
            .run(workspace, args, project)
            .await
            .check(ToolStep::Init)?;
        Ok(())
    }

    /// Runs the plan step and interprets its detailed exit code.
    pub(crate) async fn compute_plan(
        &self,
        workspace: &Workspace,
        project: &Project,
        step: ToolStep,
    ) -> Result<PlanRun> {
        let output = self
            .runner
            .run(workspace, PLAN_ARGS, project)
            .await
            .invoked(step)?;

        let has_changes = match output.exit_code {
            PLAN_EXIT_NO_CHANGES => false,
            PLAN_EXIT_CHANGES => true,
            exit_code => {
                return Err(StratusError::Tool {
                    step,
                    exit_code,
                    stderr: output.stderr,
                })
            }
        };

        Ok(PlanRun {
            output: output.stdout,
            has_changes,
        })
    }
}
