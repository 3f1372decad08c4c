//! Seam for the component that turns a change request into configuration.
//!
//! Stratus does not talk to language models itself. A [`CodeGenerator`] is
//! handed to [`Pipeline::generate_plan`](crate::pipeline::Pipeline::generate_plan),
//! which records its answer as a prompt and plans it.

use std::future::Future;

use crate::{error::Result, models::Project};

/// What the generator is asked to do.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub project: Project,
    pub user_prompt: String,
    /// Configuration currently applied to the project, to be revised
    pub existing_code: Option<String>,
}

/// What the generator answers with.
#[derive(Debug, Clone, Default)]
pub struct GeneratedCode {
    /// Complete configuration text; replaces the existing configuration
    pub code: String,
    pub analysis: Option<String>,
    pub commit_message: Option<String>,
}

/// Produces configuration for a change request.
///
/// Failures should be reported as `StratusError::Generation`.
pub trait CodeGenerator: Send + Sync {
    fn generate(
        &self,
        request: GenerationRequest,
    ) -> impl Future<Output = Result<GeneratedCode>> + Send;
}
