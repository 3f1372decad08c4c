//! Prompt records: the change requests configuration was generated from.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension, Row};

use super::utils::{status_column, timestamp_column};
use crate::{
    error::{DatabaseResultExt, Result, StratusError},
    models::{Prompt, PromptStatus},
    params::NewPrompt,
};

const INSERT_PROMPT_SQL: &str = "INSERT INTO prompts (project_id, user_prompt, analysis, code, commit_message, status, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)";
const PROMPT_COLUMNS: &str =
    "id, project_id, user_prompt, analysis, code, commit_message, status, created_at";

impl super::Database {
    /// Records a prompt for a project.
    pub fn create_prompt(&mut self, project_id: u64, prompt: &NewPrompt) -> Result<Prompt> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let exists: bool = tx
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM projects WHERE id = ?1)",
                params![project_id as i64],
                |row| row.get(0),
            )
            .db_context("Failed to check project existence")?;
        if !exists {
            return Err(StratusError::ProjectNotFound { id: project_id });
        }

        let now = Timestamp::now();
        tx.execute(
            INSERT_PROMPT_SQL,
            params![
                project_id as i64,
                prompt.user_prompt,
                prompt.analysis,
                prompt.code,
                prompt.commit_message,
                PromptStatus::Pending.as_str(),
                now.to_string()
            ],
        )
        .db_context("Failed to insert prompt")?;

        let id = tx.last_insert_rowid() as u64;
        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Prompt {
            id,
            project_id,
            user_prompt: prompt.user_prompt.clone(),
            analysis: prompt.analysis.clone(),
            code: prompt.code.clone(),
            commit_message: prompt.commit_message.clone(),
            status: PromptStatus::Pending,
            created_at: now,
        })
    }

    /// Retrieves a prompt by its ID.
    pub fn get_prompt(&self, id: u64) -> Result<Option<Prompt>> {
        self.connection
            .query_row(
                &format!("SELECT {PROMPT_COLUMNS} FROM prompts WHERE id = ?1"),
                params![id as i64],
                prompt_from_row,
            )
            .optional()
            .db_context("Failed to query prompt")
    }

    /// Lists a project's prompts, newest first.
    pub fn list_prompts(&self, project_id: u64) -> Result<Vec<Prompt>> {
        let mut stmt = self
            .connection
            .prepare(&format!(
                "SELECT {PROMPT_COLUMNS} FROM prompts WHERE project_id = ?1 ORDER BY id DESC"
            ))
            .db_context("Failed to prepare query")?;

        let prompts = stmt
            .query_map(params![project_id as i64], prompt_from_row)
            .db_context("Failed to query prompts")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read prompt row")?;

        Ok(prompts)
    }
}

fn prompt_from_row(row: &Row<'_>) -> rusqlite::Result<Prompt> {
    Ok(Prompt {
        id: row.get::<_, i64>(0)? as u64,
        project_id: row.get::<_, i64>(1)? as u64,
        user_prompt: row.get(2)?,
        analysis: row.get(3)?,
        code: row.get(4)?,
        commit_message: row.get(5)?,
        status: status_column(row, 6)?,
        created_at: timestamp_column(row, 7)?,
    })
}
