//! Project CRUD operations and queries.

use jiff::Timestamp;
use rusqlite::{params, OptionalExtension, Row};

use super::utils::{is_constraint_violation, timestamp_column};
use crate::{
    error::{DatabaseResultExt, Result, StratusError},
    models::Project,
    params::{CreateProject, UpdateProject},
};

const INSERT_PROJECT_SQL: &str = "INSERT INTO projects (name, description, cloud_provider, state_bucket_url, state_bucket_credentials, llm_provider, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)";
const PROJECT_COLUMNS: &str = "id, name, description, cloud_provider, state_bucket_url, state_bucket_credentials, llm_provider, applied_config, created_at, updated_at";
const UPDATE_PROJECT_SQL: &str = "UPDATE projects SET name = ?1, description = ?2, cloud_provider = ?3, state_bucket_url = ?4, state_bucket_credentials = ?5, llm_provider = ?6, updated_at = ?7 WHERE id = ?8";
const DELETE_PROJECT_SQL: &str = "DELETE FROM projects WHERE id = ?1";

impl super::Database {
    /// Registers a new project. Names are unique.
    pub fn create_project(&mut self, params: &CreateProject) -> Result<Project> {
        params.validate()?;

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let now = Timestamp::now();
        let now_str = now.to_string();
        let name = params.name.trim();
        let cloud_provider = params.cloud_provider.trim().to_lowercase();

        tx.execute(
            INSERT_PROJECT_SQL,
            params![
                name,
                params.description,
                cloud_provider,
                params.state_bucket_url,
                params.state_bucket_credentials,
                params.llm_provider,
                &now_str,
                &now_str
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StratusError::invalid_input("name")
                    .with_reason(format!("a project named '{name}' already exists"))
            } else {
                StratusError::database("Failed to insert project").with_source(e)
            }
        })?;

        let id = tx.last_insert_rowid() as u64;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Project {
            id,
            name: name.to_string(),
            description: params.description.clone(),
            cloud_provider,
            state_bucket_url: params.state_bucket_url.clone(),
            state_bucket_credentials: params.state_bucket_credentials.clone(),
            llm_provider: params.llm_provider.clone(),
            applied_config: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Retrieves a project by its ID.
    pub fn get_project(&self, id: u64) -> Result<Option<Project>> {
        self.connection
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![id as i64],
                project_from_row,
            )
            .optional()
            .db_context("Failed to query project")
    }

    /// Retrieves a project, failing with `ProjectNotFound` when absent.
    pub fn require_project(&self, id: u64) -> Result<Project> {
        self.get_project(id)?
            .ok_or(StratusError::ProjectNotFound { id })
    }

    /// Lists all projects ordered by name.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .connection
            .prepare(&format!("SELECT {PROJECT_COLUMNS} FROM projects ORDER BY name"))
            .db_context("Failed to prepare query")?;

        let projects = stmt
            .query_map([], project_from_row)
            .db_context("Failed to query projects")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read project row")?;

        Ok(projects)
    }

    /// Changes a project's settings, keeping fields the update leaves unset.
    /// Returns the project as stored afterwards.
    pub fn update_project(&mut self, params: &UpdateProject) -> Result<Project> {
        params.validate()?;

        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let current = tx
            .query_row(
                &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
                params![params.id as i64],
                project_from_row,
            )
            .map_err(|e| {
                if matches!(e, rusqlite::Error::QueryReturnedNoRows) {
                    StratusError::ProjectNotFound { id: params.id }
                } else {
                    StratusError::database("Failed to get current project").with_source(e)
                }
            })?;

        if params.is_empty() {
            return Ok(current);
        }

        let name = params
            .name
            .as_deref()
            .map(|name| name.trim().to_string())
            .unwrap_or(current.name);
        let cloud_provider = params
            .cloud_provider
            .as_deref()
            .map(|provider| provider.trim().to_lowercase())
            .unwrap_or(current.cloud_provider);
        let description = merge_optional(&params.description, current.description);
        let state_bucket_url = merge_optional(&params.state_bucket_url, current.state_bucket_url);
        let state_bucket_credentials = merge_optional(
            &params.state_bucket_credentials,
            current.state_bucket_credentials,
        );
        let llm_provider = merge_optional(&params.llm_provider, current.llm_provider);
        let now = Timestamp::now();

        tx.execute(
            UPDATE_PROJECT_SQL,
            params![
                name,
                description,
                cloud_provider,
                state_bucket_url,
                state_bucket_credentials,
                llm_provider,
                now.to_string(),
                params.id as i64
            ],
        )
        .map_err(|e| {
            if is_constraint_violation(&e) {
                StratusError::invalid_input("name")
                    .with_reason(format!("a project named '{name}' already exists"))
            } else {
                StratusError::database("Failed to update project").with_source(e)
            }
        })?;

        tx.commit().db_context("Failed to commit transaction")?;

        Ok(Project {
            name,
            description,
            cloud_provider,
            state_bucket_url,
            state_bucket_credentials,
            llm_provider,
            updated_at: now,
            ..current
        })
    }

    /// Deletes a project together with its prompts, plans and inventory.
    /// Returns whether a row was removed.
    pub fn delete_project(&mut self, id: u64) -> Result<bool> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let removed = tx
            .execute(DELETE_PROJECT_SQL, params![id as i64])
            .db_context("Failed to delete project")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(removed > 0)
    }
}

/// Applies an optional-field update: unset keeps `current`, empty clears.
fn merge_optional(update: &Option<String>, current: Option<String>) -> Option<String> {
    match update.as_deref() {
        None => current,
        Some("") => None,
        Some(value) => Some(value.to_string()),
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get::<_, i64>(0)? as u64,
        name: row.get(1)?,
        description: row.get(2)?,
        cloud_provider: row.get(3)?,
        state_bucket_url: row.get(4)?,
        state_bucket_credentials: row.get(5)?,
        llm_provider: row.get(6)?,
        applied_config: row.get(7)?,
        created_at: timestamp_column(row, 8)?,
        updated_at: timestamp_column(row, 9)?,
    })
}
