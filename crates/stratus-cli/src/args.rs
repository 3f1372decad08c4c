use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand, ValueEnum};
use stratus_core::runner::{Sandbox, DEFAULT_IMAGE};

use crate::cli::{
    ConfigArgs, PlanCommands, ProjectCommands, ProjectIdArgs, ProjectStateArgs, DestroyArgs,
};

/// Plan, approve and apply generated infrastructure configuration
///
/// Stratus stages Terraform configuration in throwaway workspaces, records
/// every plan in a local ledger, and refuses to apply anything that has not
/// been approved first.
#[derive(Parser)]
#[command(version, about, name = "stratus")]
pub struct Args {
    /// Path to the SQLite database file. Defaults to
    /// $XDG_DATA_HOME/stratus/stratus.db
    #[arg(long, global = true, env = "STRATUS_DATABASE_FILE")]
    pub database_file: Option<PathBuf>,

    /// Disable colored output and use plain text
    #[arg(long, global = true, env = "STRATUS_NO_COLOR")]
    pub no_color: bool,

    /// Directory workspaces are created in. Defaults to the system
    /// temporary directory
    #[arg(long, global = true, env = "STRATUS_WORKSPACE_ROOT")]
    pub workspace_root: Option<PathBuf>,

    /// How Terraform is launched
    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = SandboxKind::Docker,
        env = "STRATUS_SANDBOX"
    )]
    pub sandbox: SandboxKind,

    /// Terraform binary used in direct mode
    #[arg(long, global = true, default_value = "terraform", env = "STRATUS_TERRAFORM_BIN")]
    pub terraform_bin: PathBuf,

    /// Image used in docker mode
    #[arg(long, global = true, default_value = DEFAULT_IMAGE, env = "STRATUS_DOCKER_IMAGE")]
    pub docker_image: String,

    /// Upper bound for a single Terraform run, in seconds
    #[arg(long, global = true, default_value_t = 300, env = "STRATUS_TIMEOUT_SECS")]
    pub timeout_secs: u64,

    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Runner sandbox selected by the flags.
    pub fn sandbox(&self) -> Sandbox {
        match self.sandbox {
            SandboxKind::Docker => Sandbox::Docker {
                docker: PathBuf::from("docker"),
                image: self.docker_image.clone(),
            },
            SandboxKind::Direct => Sandbox::Direct {
                binary: self.terraform_bin.clone(),
            },
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where Terraform runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SandboxKind {
    /// In a locked-down container with only the workspace mounted
    Docker,
    /// On the host, inside the workspace directory
    Direct,
}

/// Available commands for the Stratus CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Manage projects
    #[command(alias = "pr")]
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Compute, inspect, approve and apply plans
    #[command(alias = "p")]
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Check a configuration file without touching remote state
    Validate(ConfigArgs),
    /// Destroy a project's infrastructure
    Destroy(DestroyArgs),
    /// Show the Terraform state of a project
    State(ProjectStateArgs),
    /// List a project's recorded resource inventory
    Resources(ProjectIdArgs),
    /// List a project's recorded prompts
    Prompts(ProjectIdArgs),
}
