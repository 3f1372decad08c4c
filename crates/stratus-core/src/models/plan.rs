//! Plan model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::PlanStatus;

/// A computed, not-yet-applied description of infrastructure changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Plan {
    /// Unique identifier for the plan
    pub id: u64,

    /// Owning project
    pub project_id: u64,

    /// Prompt the configuration was generated from, for traceability only
    pub prompt_id: Option<u64>,

    /// Configuration text the plan was computed from
    pub config_text: String,

    /// Human-readable output of the plan step
    pub plan_output: String,

    /// Machine-readable plan (`show -json`), when the tool produced one
    pub plan_structured: Option<serde_json::Value>,

    /// Whether the plan step reported pending changes (exit code 2)
    pub has_changes: bool,

    #[serde(default)]
    pub status: PlanStatus,

    pub commit_message: Option<String>,

    /// Timestamp when the plan was computed (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the plan was applied (UTC)
    pub applied_at: Option<Timestamp>,
}
