//! Database operations and SQLite management for the provisioning ledger.
//!
//! This module provides low-level database operations for projects, prompts,
//! plans and the resource inventory. Every mutating method runs in its own
//! transaction, so each logical mutation (plan creation, approval, apply
//! outcome, destroy outcome) commits exactly once.

use std::path::Path;

use rusqlite::Connection;

use crate::error::{DatabaseResultExt, Result};

pub mod lock_queries;
pub mod plan_queries;
pub mod project_queries;
pub mod prompt_queries;
pub mod resource_queries;
pub mod schema;
pub mod utils;

/// Database connection and operations handler.
pub struct Database {
    connection: Connection,
}

impl Database {
    /// Creates a new database connection and initializes the schema.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let connection = Connection::open(path).db_context("Failed to open database connection")?;

        let db = Self { connection };
        db.initialize_schema()?;
        Ok(db)
    }
}
