//! Prompt model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use super::PromptStatus;

/// A natural-language change request and the configuration generated for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    pub id: u64,
    pub project_id: u64,
    pub user_prompt: String,
    /// Model's explanation of the generated change
    pub analysis: Option<String>,
    /// Generated configuration text
    pub code: Option<String>,
    pub commit_message: Option<String>,
    #[serde(default)]
    pub status: PromptStatus,
    pub created_at: Timestamp,
}
