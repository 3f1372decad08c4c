//! Values returned by pipeline flows.

use serde::Serialize;

use crate::models::{Plan, Prompt};

/// Result of the plan flow.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// The newly recorded pending plan
    pub plan: Plan,
    pub has_changes: bool,
    /// Degraded steps, such as a missing structured plan
    pub warnings: Vec<String>,
}

/// Result of the apply flow.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyReport {
    /// The plan, now `applied`
    pub plan: Plan,
    /// Output of the apply step
    pub output: String,
    /// Inventory size after the refresh, `None` when the refresh failed
    pub inventory: Option<usize>,
    pub warnings: Vec<String>,
}

/// Result of the destroy flow.
#[derive(Debug, Clone, Serialize)]
pub struct DestroyReport {
    pub project_id: u64,
    /// Output of the destroy step
    pub output: String,
    /// Inventory rows removed from the ledger
    pub removed_resources: usize,
}

/// Result of the validate flow. Invalid configuration is a result, not an
/// error.
#[derive(Debug, Clone, Serialize)]
pub struct Validation {
    pub valid: bool,
    pub diagnostics: Vec<String>,
    pub output: String,
}

/// Result of generate-then-plan.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub prompt: Prompt,
    pub plan: PlanReport,
}
