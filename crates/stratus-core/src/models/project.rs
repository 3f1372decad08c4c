//! Project model definition.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

/// An infrastructure project: the unit that owns plans, prompts and the
/// resource inventory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    /// Unique identifier for the project
    pub id: u64,

    /// Unique project name, also used for state keys and variable defaults
    pub name: String,

    pub description: Option<String>,

    /// Cloud provider tag (`aws`, `gcp`, `azure`, ...)
    pub cloud_provider: String,

    /// Remote state location, e.g. `s3://bucket/path` or `gs://bucket`
    pub state_bucket_url: Option<String>,

    /// Opaque JSON blob with backend settings and credentials
    #[serde(skip_serializing)]
    pub state_bucket_credentials: Option<String>,

    /// Language model provider used to generate configuration
    pub llm_provider: Option<String>,

    /// Configuration most recently applied successfully, if any
    pub applied_config: Option<String>,

    /// Timestamp when the project was created (UTC)
    pub created_at: Timestamp,

    /// Timestamp when the project was last modified (UTC)
    pub updated_at: Timestamp,
}

impl Project {
    /// Decodes the state credentials blob, returning an empty object when the
    /// project carries none.
    pub fn state_credentials(&self) -> serde_json::Result<serde_json::Value> {
        match self.state_bucket_credentials.as_deref() {
            Some(blob) if !blob.trim().is_empty() => serde_json::from_str(blob),
            _ => Ok(serde_json::Value::Object(Default::default())),
        }
    }
}
