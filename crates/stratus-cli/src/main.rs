//! Stratus CLI Application
//!
//! Command-line interface for planning, approving and applying
//! infrastructure configuration.

mod args;
mod cli;
mod handler;
mod renderer;

use anyhow::{Context, Result};
use args::{Args, Commands::*};
use clap::Parser;
use handler::Cli;
use log::info;
use renderer::TerminalRenderer;
use stratus_core::PipelineBuilder;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    let pipeline = PipelineBuilder::new()
        .with_database_path(args.database_file.as_ref())
        .with_workspace_root(args.workspace_root.as_ref())
        .with_sandbox(args.sandbox())
        .with_timeout(args.timeout())
        .build()
        .await
        .context("Failed to initialize pipeline")?;

    let cli = Cli::new(pipeline, TerminalRenderer::new(!args.no_color));

    info!("Stratus started");

    match args.command {
        Project { command } => cli.handle_project_command(command).await,
        Plan { command } => cli.handle_plan_command(command).await,
        Validate(config) => cli.validate(config).await,
        Destroy(destroy) => cli.destroy(destroy).await,
        State(state) => cli.state(state).await,
        Resources(project) => cli.list_resources(project).await,
        Prompts(project) => cli.list_prompts(project).await,
    }
}
