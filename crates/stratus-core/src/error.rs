//! Error types for the provisioning library.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::{models::PlanStatus, runner::ToolStep};

/// Comprehensive error type for all provisioning operations.
#[derive(Error, Debug)]
pub enum StratusError {
    /// Database connection or query errors
    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: rusqlite::Error,
    },
    /// Project not found for the given ID
    #[error("Project with ID {id} not found")]
    ProjectNotFound { id: u64 },
    /// Plan not found for the given ID
    #[error("Plan with ID {id} not found")]
    PlanNotFound { id: u64 },
    /// The provisioning tool could not be launched or ran out of time
    #[error("Could not run {step}: {reason}")]
    LocalInvocation { step: ToolStep, reason: String },
    /// The provisioning tool ran and reported failure
    #[error("{step} failed with exit code {exit_code}: {stderr}")]
    Tool {
        step: ToolStep,
        exit_code: i32,
        stderr: String,
    },
    /// The plan recomputed before apply no longer matches the approved one
    #[error("Re-plan of plan {plan_id} differs from the approved plan: {reason}")]
    PlanDrift { plan_id: u64, reason: String },
    /// A lifecycle rule was violated; nothing was executed
    #[error("Precondition failed: {0}")]
    Precondition(PreconditionViolation),
    /// The code generator collaborator failed
    #[error("Code generation failed: {0}")]
    Generation(String),
    /// File system operation errors
    #[error("File system error at path '{path}': {source}")]
    FileSystem {
        path: PathBuf,
        source: std::io::Error,
    },
    /// XDG directory specification errors
    #[error("XDG directory error: {0}")]
    XdgDirectory(String),
    /// Invalid input validation errors
    #[error("Invalid input for field '{field}': {reason}")]
    InvalidInput { field: String, reason: String },
    /// Serialization/deserialization errors
    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

/// Lifecycle rules a request can break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreconditionViolation {
    /// Approval requires a pending plan
    NotPending { plan_id: u64, status: PlanStatus },
    /// Apply requires an approved plan
    NotApproved { plan_id: u64, status: PlanStatus },
    /// Destroy and state inspection require an applied configuration
    NothingApplied { project_id: u64 },
}

impl fmt::Display for PreconditionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotPending { plan_id, status } => {
                write!(f, "plan {plan_id} is {status}, only pending plans can be approved")
            }
            Self::NotApproved { plan_id, status } => {
                write!(f, "plan {plan_id} is {status}, only approved plans can be applied")
            }
            Self::NothingApplied { project_id } => {
                write!(f, "project {project_id} has no applied configuration")
            }
        }
    }
}

/// Builder for creating database errors with optional context.
pub struct DatabaseErrorBuilder {
    message: String,
}

impl DatabaseErrorBuilder {
    /// Create a new database error builder with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Build the error with the given source.
    pub fn with_source(self, source: rusqlite::Error) -> StratusError {
        StratusError::Database {
            message: self.message,
            source,
        }
    }
}

/// Builder for creating input validation errors.
pub struct InvalidInputBuilder {
    field: String,
}

impl InvalidInputBuilder {
    /// Create a new invalid input error builder for a field.
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
        }
    }

    /// Build the error with the given reason.
    pub fn with_reason(self, reason: impl Into<String>) -> StratusError {
        StratusError::InvalidInput {
            field: self.field,
            reason: reason.into(),
        }
    }
}

impl StratusError {
    /// Creates a builder for database errors.
    pub fn database(message: impl Into<String>) -> DatabaseErrorBuilder {
        DatabaseErrorBuilder::new(message)
    }

    /// Creates a builder for input validation errors.
    pub fn invalid_input(field: impl Into<String>) -> InvalidInputBuilder {
        InvalidInputBuilder::new(field)
    }

    /// Wraps a task join failure from the blocking pool.
    pub(crate) fn join(error: tokio::task::JoinError) -> Self {
        Self::Configuration {
            message: format!("Task join error: {error}"),
        }
    }

    /// Whether the error was raised before any external tool ran.
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

impl From<PreconditionViolation> for StratusError {
    fn from(violation: PreconditionViolation) -> Self {
        Self::Precondition(violation)
    }
}

/// Specialized extension trait for database-related Results.
pub trait DatabaseResultExt<T> {
    /// Map database errors with a message.
    fn db_context(self, message: &str) -> Result<T>;
}

impl<T> DatabaseResultExt<T> for std::result::Result<T, rusqlite::Error> {
    fn db_context(self, message: &str) -> Result<T> {
        self.map_err(|e| StratusError::database(message).with_source(e))
    }
}

/// Result type alias for provisioning operations
pub type Result<T> = std::result::Result<T, StratusError>;
