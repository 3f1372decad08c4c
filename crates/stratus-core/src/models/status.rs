//! Status enumerations for plans and prompts.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Type-safe enumeration of plan statuses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Plan was computed and awaits approval
    #[default]
    Pending,

    /// Plan was approved and may be applied
    Approved,

    /// Plan was applied successfully
    Applied,

    /// Plan was rejected by the provisioning tool during apply
    Failed,
}

impl FromStr for PlanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PlanStatus::Pending),
            "approved" => Ok(PlanStatus::Approved),
            "applied" => Ok(PlanStatus::Applied),
            "failed" => Ok(PlanStatus::Failed),
            _ => Err(format!("Invalid plan status: {s}")),
        }
    }
}

impl PlanStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "pending",
            PlanStatus::Approved => "approved",
            PlanStatus::Applied => "applied",
            PlanStatus::Failed => "failed",
        }
    }

    /// Whether no further transition is possible from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PlanStatus::Applied | PlanStatus::Failed)
    }

    /// Whether the plan lifecycle allows moving from `self` to `next`.
    ///
    /// ```rust
    /// use stratus_core::models::PlanStatus;
    ///
    /// assert!(PlanStatus::Pending.can_transition_to(PlanStatus::Approved));
    /// assert!(PlanStatus::Approved.can_transition_to(PlanStatus::Applied));
    /// assert!(!PlanStatus::Pending.can_transition_to(PlanStatus::Applied));
    /// assert!(!PlanStatus::Failed.can_transition_to(PlanStatus::Approved));
    /// ```
    pub fn can_transition_to(&self, next: PlanStatus) -> bool {
        matches!(
            (self, next),
            (PlanStatus::Pending, PlanStatus::Approved)
                | (PlanStatus::Pending, PlanStatus::Failed)
                | (PlanStatus::Approved, PlanStatus::Applied)
                | (PlanStatus::Approved, PlanStatus::Failed)
        )
    }

    /// Get status with a marker for list display.
    pub fn with_icon(&self) -> &'static str {
        match self {
            PlanStatus::Pending => "○ Pending",
            PlanStatus::Approved => "➤ Approved",
            PlanStatus::Applied => "✓ Applied",
            PlanStatus::Failed => "✗ Failed",
        }
    }
}

/// Lifecycle of a recorded change request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PromptStatus {
    /// Code was generated but not applied yet
    #[default]
    Pending,

    /// A plan computed from this prompt was applied
    Applied,

    /// The infrastructure this prompt produced was destroyed
    Destroyed,
}

impl FromStr for PromptStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(PromptStatus::Pending),
            "applied" => Ok(PromptStatus::Applied),
            "destroyed" => Ok(PromptStatus::Destroyed),
            _ => Err(format!("Invalid prompt status: {s}")),
        }
    }
}

impl PromptStatus {
    /// Convert to database string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PromptStatus::Pending => "pending",
            PromptStatus::Applied => "applied",
            PromptStatus::Destroyed => "destroyed",
        }
    }
}
