//! Core library for Stratus, a provisioning pipeline for generated
//! infrastructure configuration.
//!
//! Configuration text (typically produced by a language model) is staged in
//! an ephemeral workspace, planned with Terraform, held as a pending plan
//! until someone approves it, and only then applied. Every plan, approval,
//! apply and destroy is recorded in a SQLite ledger together with the
//! resulting resource inventory.
//!
//! # Architecture
//!
//! - [`pipeline`]: the state machine and the only entry point that runs the
//!   tool or mutates the ledger
//! - [`workspace`], [`backend`]: staging directories and derived backend and
//!   variable files
//! - [`runner`], [`credentials`]: sandboxed tool invocation with
//!   provider-scoped credentials
//! - [`state`]: parsing of `show -json` output into inventory records
//! - [`db`], [`models`]: the ledger
//! - [`display`], [`outcome`]: markdown output and the tri-state result
//!   reported to callers
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stratus_core::{
//!     params::{CreatePlan, CreateProject, Id},
//!     PipelineBuilder,
//! };
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = PipelineBuilder::new()
//!     .with_database_path(Some("stratus.db"))
//!     .build()
//!     .await?;
//!
//! let project = pipeline
//!     .create_project(&CreateProject {
//!         name: "network".to_string(),
//!         cloud_provider: "aws".to_string(),
//!         state_bucket_url: Some("s3://tf-state/network".to_string()),
//!         ..Default::default()
//!     })
//!     .await?;
//!
//! let report = pipeline
//!     .plan(&CreatePlan {
//!         project_id: project.id,
//!         config_text: std::fs::read_to_string("main.tf")?,
//!         prompt_id: None,
//!         commit_message: Some("Add VPC".to_string()),
//!     })
//!     .await?;
//! println!("{report}");
//!
//! // Nothing is applied until the plan is approved
//! let id = Id { id: report.plan.id };
//! pipeline.approve_plan(&id).await?;
//! let applied = pipeline.apply(&id).await?;
//! println!("{applied}");
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod credentials;
pub mod db;
pub mod display;
pub mod error;
pub mod generator;
pub mod locks;
pub mod models;
pub mod outcome;
pub mod params;
pub mod pipeline;
pub mod runner;
pub mod state;
pub mod workspace;

// Re-export commonly used types
pub use credentials::CredentialSource;
pub use db::Database;
pub use display::{CreateResult, DeleteResult, Plans, Projects, Prompts, Resources, UpdateResult};
pub use error::{PreconditionViolation, Result, StratusError};
pub use generator::{CodeGenerator, GeneratedCode, GenerationRequest};
pub use models::{Plan, PlanStatus, Project, Prompt, PromptStatus, Resource, ResourceRecord};
pub use outcome::Outcome;
pub use params::{CreatePlan, CreateProject, GeneratePlan, Id, ProjectConfig, UpdateProject};
pub use pipeline::{
    ApplyReport, DestroyReport, GenerationReport, Pipeline, PipelineBuilder, PlanReport, Validation,
};
pub use runner::{RunnerConfig, Sandbox, ToolOutput, ToolStep};
pub use state::{PlannedChange, StateSnapshot};
pub use workspace::{Workspace, WorkspaceManager};
