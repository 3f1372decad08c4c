//! Resource inventory snapshot operations.

use jiff::Timestamp;
use rusqlite::{params, Row, Transaction};

use super::utils::json_column;
use crate::{
    error::{DatabaseResultExt, Result},
    models::{PromptStatus, Resource, ResourceRecord},
};

const INSERT_RESOURCE_SQL: &str = "INSERT INTO resources (project_id, resource_type, resource_name, address, attributes, dependencies) VALUES (?1, ?2, ?3, ?4, ?5, ?6)";
const DELETE_PROJECT_RESOURCES_SQL: &str = "DELETE FROM resources WHERE project_id = ?1";
const SELECT_RESOURCES_SQL: &str = "SELECT id, project_id, resource_type, resource_name, address, attributes, dependencies FROM resources WHERE project_id = ?1 ORDER BY address";

impl super::Database {
    /// Replaces a project's inventory with `records` in one transaction.
    /// Returns the number of rows written.
    pub fn replace_resources(&mut self, project_id: u64, records: &[ResourceRecord]) -> Result<usize> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        tx.execute(DELETE_PROJECT_RESOURCES_SQL, params![project_id as i64])
            .db_context("Failed to clear resources")?;

        {
            let mut stmt = tx
                .prepare(INSERT_RESOURCE_SQL)
                .db_context("Failed to prepare resource insert")?;
            for record in records {
                stmt.execute(params![
                    project_id as i64,
                    record.resource_type,
                    record.name,
                    record.address,
                    serde_json::to_string(&record.attributes)?,
                    serde_json::to_string(&record.dependencies)?
                ])
                .db_context("Failed to insert resource")?;
            }
        }

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(records.len())
    }

    /// Records a successful destroy in one transaction: the inventory is
    /// cleared, the applied configuration forgotten, and applied prompts
    /// marked destroyed.
    pub fn record_destroy(&mut self, project_id: u64) -> Result<usize> {
        let tx = self
            .connection
            .transaction()
            .db_context("Failed to begin transaction")?;

        let removed = clear_in(&tx, project_id)?;

        tx.execute(
            "UPDATE projects SET applied_config = NULL, updated_at = ?1 WHERE id = ?2",
            params![Timestamp::now().to_string(), project_id as i64],
        )
        .db_context("Failed to clear applied configuration")?;

        tx.execute(
            "UPDATE prompts SET status = ?1 WHERE project_id = ?2 AND status = ?3",
            params![
                PromptStatus::Destroyed.as_str(),
                project_id as i64,
                PromptStatus::Applied.as_str()
            ],
        )
        .db_context("Failed to update prompt statuses")?;

        tx.commit().db_context("Failed to commit transaction")?;
        Ok(removed)
    }

    /// Lists a project's inventory ordered by address.
    pub fn list_resources(&self, project_id: u64) -> Result<Vec<Resource>> {
        let mut stmt = self
            .connection
            .prepare(SELECT_RESOURCES_SQL)
            .db_context("Failed to prepare query")?;

        let resources = stmt
            .query_map(params![project_id as i64], resource_from_row)
            .db_context("Failed to query resources")?
            .collect::<rusqlite::Result<Vec<_>>>()
            .db_context("Failed to read resource row")?;

        Ok(resources)
    }
}

fn clear_in(tx: &Transaction<'_>, project_id: u64) -> Result<usize> {
    tx.execute(DELETE_PROJECT_RESOURCES_SQL, params![project_id as i64])
        .db_context("Failed to clear resources")
}

fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row.get::<_, i64>(0)? as u64,
        project_id: row.get::<_, i64>(1)? as u64,
        record: ResourceRecord {
            resource_type: row.get(2)?,
            name: row.get(3)?,
            address: row.get(4)?,
            attributes: json_column(row, 5)?,
            dependencies: json_column(row, 6)?,
        },
    })
}
