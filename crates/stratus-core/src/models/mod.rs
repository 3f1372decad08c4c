//! Data models for projects, prompts, plans and the resource inventory.
//!
//! Display implementations live in [`crate::display::models`] so the records
//! here stay plain data that can be serialized and persisted as-is.
//!
//! # Plan lifecycle
//!
//! ```text
//!   pending ──approve──▶ approved ──apply ok──▶ applied
//!      │                    │
//!      └──────fail──────────┴──────apply err──▶ failed
//! ```
//!
//! Only the pipeline creates plans, and it always creates them as
//! [`PlanStatus::Pending`]. `applied` and `failed` are terminal.

pub mod plan;
pub mod project;
pub mod prompt;
pub mod resource;
pub mod status;

#[cfg(test)]
mod tests;

pub use plan::Plan;
pub use project::Project;
pub use prompt::Prompt;
pub use resource::{Resource, ResourceRecord};
pub use status::{PlanStatus, PromptStatus};
