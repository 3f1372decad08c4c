//! Command-line argument wrappers.
//!
//! Each clap struct here mirrors a core parameter type and converts into it
//! with a `From` impl, so the core crate stays free of clap:
//!
//! ```text
//! User Input → CLI Args (clap) → Core Params → Pipeline
//! ```
//!
//! Commands that take a configuration file carry its path; the handler
//! reads it and builds the core parameters with the file's contents.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use stratus_core::params::{CreatePlan, CreateProject, Id, ProjectConfig, UpdateProject};

/// Register a project
#[derive(Args)]
pub struct CreateProjectArgs {
    /// Unique project name
    pub name: String,
    /// Cloud provider tag, e.g. aws, gcp or azure
    #[arg(short, long)]
    pub provider: String,
    /// Free-form description
    #[arg(short, long)]
    pub description: Option<String>,
    /// Remote state location, e.g. s3://bucket/path or gs://bucket
    #[arg(long)]
    pub state_url: Option<String>,
    /// JSON object with backend settings such as region or dynamodb_table
    #[arg(long)]
    pub state_credentials: Option<String>,
    /// Language model provider used to generate configuration
    #[arg(long)]
    pub llm_provider: Option<String>,
}

impl From<CreateProjectArgs> for CreateProject {
    fn from(val: CreateProjectArgs) -> Self {
        CreateProject {
            name: val.name,
            description: val.description,
            cloud_provider: val.provider,
            state_bucket_url: val.state_url,
            state_bucket_credentials: val.state_credentials,
            llm_provider: val.llm_provider,
        }
    }
}

/// Change a project's settings
#[derive(Args)]
pub struct UpdateProjectArgs {
    /// ID of the project
    pub id: u64,
    /// New unique project name
    #[arg(short, long)]
    pub name: Option<String>,
    /// New cloud provider tag
    #[arg(short, long)]
    pub provider: Option<String>,
    /// New description, empty to clear
    #[arg(short, long)]
    pub description: Option<String>,
    /// New remote state location, empty to clear
    #[arg(long)]
    pub state_url: Option<String>,
    /// New backend settings JSON object, empty to clear
    #[arg(long)]
    pub state_credentials: Option<String>,
    /// New language model provider, empty to clear
    #[arg(long)]
    pub llm_provider: Option<String>,
}

impl From<UpdateProjectArgs> for UpdateProject {
    fn from(val: UpdateProjectArgs) -> Self {
        UpdateProject {
            id: val.id,
            name: val.name,
            description: val.description,
            cloud_provider: val.provider,
            state_bucket_url: val.state_url,
            state_bucket_credentials: val.state_credentials,
            llm_provider: val.llm_provider,
        }
    }
}

/// Refer to a record by ID
#[derive(Args)]
pub struct IdArgs {
    /// Unique identifier
    pub id: u64,
}

impl From<IdArgs> for Id {
    fn from(val: IdArgs) -> Self {
        Id { id: val.id }
    }
}

/// Refer to a project by ID
#[derive(Args)]
pub struct ProjectIdArgs {
    /// ID of the project
    pub project_id: u64,
}

/// Compute a plan from a configuration file
#[derive(Args)]
pub struct CreatePlanArgs {
    /// ID of the project to plan for
    pub project_id: u64,
    /// Terraform configuration file
    pub file: PathBuf,
    /// Prompt the configuration was generated from
    #[arg(long)]
    pub prompt_id: Option<u64>,
    /// Commit message recorded with the plan
    #[arg(short, long)]
    pub message: Option<String>,
}

impl CreatePlanArgs {
    pub fn into_params(self, config_text: String) -> CreatePlan {
        CreatePlan {
            project_id: self.project_id,
            config_text,
            prompt_id: self.prompt_id,
            commit_message: self.message,
        }
    }
}

/// A project together with a configuration file
#[derive(Args)]
pub struct ConfigArgs {
    /// ID of the project
    pub project_id: u64,
    /// Terraform configuration file
    pub file: PathBuf,
}

impl ConfigArgs {
    pub fn into_params(self, config_text: String) -> ProjectConfig {
        ProjectConfig {
            project_id: self.project_id,
            config_text,
        }
    }
}

/// Destroy everything a project's configuration manages
///
/// Uses the configuration last applied to the project unless a file is
/// given.
#[derive(Args)]
pub struct DestroyArgs {
    /// ID of the project
    pub project_id: u64,
    /// Destroy what this configuration file manages instead
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Required; destroying infrastructure cannot be undone
    #[arg(long)]
    pub confirm: bool,
}

/// Read the Terraform state behind a project
///
/// Uses the configuration last applied to the project unless a file is
/// given.
#[derive(Args)]
pub struct ProjectStateArgs {
    /// ID of the project
    pub project_id: u64,
    /// Read the state this configuration file points at instead
    #[arg(long)]
    pub file: Option<PathBuf>,
    /// Print the raw JSON document
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum ProjectCommands {
    /// Register a new project
    #[command(alias = "c")]
    Create(CreateProjectArgs),
    /// List all projects
    #[command(aliases = ["l", "ls"])]
    List,
    /// Show details of a project
    #[command(alias = "s")]
    Show(IdArgs),
    /// Change a project's settings
    #[command(alias = "u")]
    Update(UpdateProjectArgs),
    /// Delete a project and its ledger records
    #[command(aliases = ["d", "rm"])]
    Delete(IdArgs),
}

#[derive(Subcommand)]
pub enum PlanCommands {
    /// Compute a plan and record it as pending
    #[command(alias = "c")]
    Create(CreatePlanArgs),
    /// List a project's plans, newest first
    #[command(aliases = ["l", "ls"])]
    List(ProjectIdArgs),
    /// Show details of a plan
    #[command(alias = "s")]
    Show(IdArgs),
    /// Approve a pending plan
    Approve(IdArgs),
    /// Apply an approved plan
    Apply(IdArgs),
}
