//! Plan records and their status transitions.
//!
//! Status changes are compare-and-set updates (`... WHERE id = ? AND status =
//! ?`), so two writers racing on the same plan cannot both succeed.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension, Row, Transaction};

use super::utils::{optional_json_column, optional_timestamp_column, status_column, timestamp_column};
use crate::{
    error::{DatabaseResultExt, PreconditionViolation, Result, StratusError},
    models::{Plan, PlanStatus, PromptStatus},
    params::NewPlan,
};

const INSERT_PLAN_SQL: &str = "INSERT INTO plans (project_id, prompt_id, config_text, plan_output, plan_structured, has_changes, status, commit_message, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)";
const PLAN_COLUMNS: &str = "id, project_id, prompt_id, config_text, plan_output, plan_structured, has_changes, status, commit_message, created_at, applied_at";
const UPDATE_PLAN_STATUS_SQL: &str =
    "UPDATE plans SET status = ?1, applied_at = ?2 WHERE id = ?3 AND status = ?4";
const UPDATE_APPLIED_CONFIG_SQL: &str =
    "UPDATE projects SET applied_config = ?1, updated_at = ?2 WHERE id = ?3";
const UPDATE_PROMPT_STATUS_SQL: &str = "UPDATE prompts SET status = ?1 WHERE id = ?2";

impl super::Database {
    /// Inserts a freshly computed plan. New plans are always pending.
    pub fn insert_plan(&mut self, plan: &NewPlan) -> Result<Plan> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now = Timestamp::now();
        let structured = plan
            .plan_structured
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        tx.execute(
            INSERT_PLAN_SQL,
            params![
                plan.project_id as i64,
                plan.prompt_id.map(|id| id as i64),
                plan.config_text,
                plan.plan_output,
                structured,
                plan.has_changes,
                PlanStatus::Pending.as_str(),
                plan.commit_message,
                now.to_string()
            ],
        )
        .db_context("Failed to insert plan")?;

        let id = tx.last_insert_rowid() as u64;
        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Plan {
            id,
            project_id: plan.project_id,
            prompt_id: plan.prompt_id,
            config_text: plan.config_text.clone(),
            plan_output: plan.plan_output.clone(),
            plan_structured: plan.plan_structured.clone(),
            has_changes: plan.has_changes,
            status: PlanStatus::Pending,
            commit_message: plan.commit_message.clone(),
            created_at: now,
            applied_at: None,
        })
    }

    /// Retrieves a plan by its ID.
    pub fn get_plan(&self, id: u64) -> Result<Option<Plan>> {
        self.connection
            .query_row(
                &format!("SELECT {PLAN_COLUMNS} FROM plans WHERE id = ?1"),
                params![id as i64],
                plan_from_row,
            )
            .optional()
            .db_context("Failed to query plan")
    }

    /// Retrieves a plan, failing with `PlanNotFound` when absent.
    pub fn require_plan(&self, id: u64) -> Result<Plan> {
        self.get_plan(id)?.ok_or(StratusError::PlanNotFound { id })
    }

    /// Lists a project's plans, newest first.
    pub fn list_plans(&self, project_id: u64) -> Result<Vec<Plan>> {
        let mut stmt = self
            .connection
            .prepare(&format!(
                "SELECT {PLAN_COLUMNS} FROM plans WHERE project_id = ?1 ORDER BY id DESC"
            ))
            .db_context("Failed to prepare query")?;

        let plans = stmt
            .query_map(params![project_id as i64], plan_from_row)
            .db_context("Failed to query plans")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read plan row")?;

        Ok(plans)
    }

    /// Moves a plan from `from` to `to`.
    ///
    /// Fails with `PlanNotFound` if the plan does not exist and with a
    /// precondition error if its current status is not `from`.
    pub fn transition_plan(&mut self, id: u64, from: PlanStatus, to: PlanStatus) -> Result<Plan> {
        if !from.can_transition_to(to) {
            return Err(StratusError::Configuration {
                message: format!("Illegal plan transition {} -> {}", from.as_str(), to.as_str()),
            });
        }

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        compare_and_set_status(&tx, id, from, to, None)?;

        tx.commit().db_context("Failed to commit transaction")?;
        self.require_plan(id)
    }

    /// Records a successful apply in one transaction: the plan becomes
    /// applied, its configuration becomes the project's applied
    /// configuration, and its prompt (if any) is marked applied.
    pub fn record_apply_success(&mut self, id: u64) -> Result<Plan> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now = Timestamp::now();
        compare_and_set_status(&tx, id, PlanStatus::Approved, PlanStatus::Applied, Some(now))?;

        let (project_id, prompt_id, config_text): (i64, Option<i64>, String) = tx
            .query_row(
                "SELECT project_id, prompt_id, config_text FROM plans WHERE id = ?1",
                params![id as i64],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .db_context("Failed to read applied plan")?;

        tx.execute(
            UPDATE_APPLIED_CONFIG_SQL,
            params![config_text, now.to_string(), project_id],
        )
        .db_context("Failed to record applied configuration")?;

        if let Some(prompt_id) = prompt_id {
            tx.execute(
                UPDATE_PROMPT_STATUS_SQL,
                params![PromptStatus::Applied.as_str(), prompt_id],
            )
            .db_context("Failed to update prompt status")?;
        }

        tx.commit().db_context("Failed to commit transaction")?;
        self.require_plan(id)
    }
}

/// Conditional status update shared by the transition methods.
fn compare_and_set_status(
    tx: &Transaction<'_>,
    id: u64,
    from: PlanStatus,
    to: PlanStatus,
    applied_at: Option<Timestamp>,
) -> Result<()> {
    let updated = tx
        .execute(
            UPDATE_PLAN_STATUS_SQL,
            params![
                to.as_str(),
                applied_at.map(|t| t.to_string()),
                id as i64,
                from.as_str()
            ],
        )
        .db_context("Failed to update plan status")?;

    if updated == 1 {
        return Ok(());
    }

    let current: Option<PlanStatus> = tx
        .query_row(
            "SELECT status FROM plans WHERE id = ?1",
            params![id as i64],
            |row| status_column(row, 0),
        )
        .optional()
        .db_context("Failed to query plan status")?;

    match current {
        None => Err(StratusError::PlanNotFound { id }),
        Some(status) if from == PlanStatus::Pending => {
            Err(PreconditionViolation::NotPending { plan_id: id, status }.into())
        }
        Some(status) => Err(PreconditionViolation::NotApproved { plan_id: id, status }.into()),
    }
}

fn plan_from_row(row: &Row<'_>) -> rusqlite::Result<Plan> {
    Ok(Plan {
        id: row.get::<_, i64>(0)? as u64,
        project_id: row.get::<_, i64>(1)? as u64,
        prompt_id: row.get::<_, Option<i64>>(2)?.map(|id| id as u64),
        config_text: row.get(3)?,
        plan_output: row.get(4)?,
        plan_structured: optional_json_column(row, 5)?,
        has_changes: row.get(6)?,
        status: status_column(row, 7)?,
        commit_message: row.get(8)?,
        created_at: timestamp_column(row, 9)?,
        applied_at: optional_timestamp_column(row, 10)?,
    })
}
