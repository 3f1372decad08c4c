//! Parameter structures for Stratus operations
//!
//! Shared parameter structures passed between the CLI and the core. They carry
//! no framework-specific derives: the CLI defines its own clap wrappers and
//! converts them with `From` impls, so the core stays free of clap.
//!
//! ```text
//! ┌─────────────────┐    ┌─────────────────┐
//! │   CLI Args      │    │  Core Params    │
//! │  (clap derives) │───▶│ (minimal deps)  │
//! └─────────────────┘    └─────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{Result, StratusError};

/// Identifies a single record by ID.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Id {
    pub id: u64,
}

/// Parameters for registering a project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateProject {
    pub name: String,
    pub description: Option<String>,
    /// Cloud provider tag (`aws`, `gcp`, `azure`, ...)
    pub cloud_provider: String,
    /// Remote state location (`s3://...` or `gs://...`)
    pub state_bucket_url: Option<String>,
    /// JSON object with backend settings such as `region` or `dynamodb_table`
    pub state_bucket_credentials: Option<String>,
    pub llm_provider: Option<String>,
}

impl CreateProject {
    /// Checks required fields and the credentials blob before anything is
    /// written.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(StratusError::invalid_input("name").with_reason("must not be empty"));
        }
        if self.cloud_provider.trim().is_empty() {
            return Err(
                StratusError::invalid_input("cloud_provider").with_reason("must not be empty")
            );
        }
        if let Some(blob) = &self.state_bucket_credentials {
            validate_credentials(blob)?;
        }
        Ok(())
    }
}

/// Parameters for changing a project's settings.
///
/// `None` keeps the current value. For optional fields an empty string
/// clears the value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub id: u64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub cloud_provider: Option<String>,
    pub state_bucket_url: Option<String>,
    pub state_bucket_credentials: Option<String>,
    pub llm_provider: Option<String>,
}

impl UpdateProject {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.cloud_provider.is_none()
            && self.state_bucket_url.is_none()
            && self.state_bucket_credentials.is_none()
            && self.llm_provider.is_none()
    }

    pub fn validate(&self) -> Result<()> {
        if matches!(&self.name, Some(name) if name.trim().is_empty()) {
            return Err(StratusError::invalid_input("name").with_reason("must not be empty"));
        }
        if matches!(&self.cloud_provider, Some(provider) if provider.trim().is_empty()) {
            return Err(
                StratusError::invalid_input("cloud_provider").with_reason("must not be empty")
            );
        }
        match self.state_bucket_credentials.as_deref() {
            Some("") | None => Ok(()),
            Some(blob) => validate_credentials(blob),
        }
    }
}

fn validate_credentials(blob: &str) -> Result<()> {
    match serde_json::from_str::<serde_json::Value>(blob) {
        Ok(serde_json::Value::Object(_)) => Ok(()),
        Ok(_) => Err(StratusError::invalid_input("state_bucket_credentials")
            .with_reason("must be a JSON object")),
        Err(e) => Err(StratusError::invalid_input("state_bucket_credentials")
            .with_reason(format!("invalid JSON: {e}"))),
    }
}

/// Parameters for computing a plan from configuration text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlan {
    pub project_id: u64,
    pub config_text: String,
    /// Prompt the configuration came from, if any
    pub prompt_id: Option<u64>,
    pub commit_message: Option<String>,
}

/// A project together with the configuration to operate on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub project_id: u64,
    pub config_text: String,
}

/// Parameters for generating configuration from a change request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratePlan {
    pub project_id: u64,
    pub user_prompt: String,
}

/// Row data for a new prompt record.
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub user_prompt: String,
    pub analysis: Option<String>,
    pub code: Option<String>,
    pub commit_message: Option<String>,
}

/// Row data for a new plan record. Plans are always inserted as pending.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub project_id: u64,
    pub prompt_id: Option<u64>,
    pub config_text: String,
    pub plan_output: String,
    pub plan_structured: Option<serde_json::Value>,
    pub has_changes: bool,
    pub commit_message: Option<String>,
}
