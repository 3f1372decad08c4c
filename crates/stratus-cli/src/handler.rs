//! Command handlers: run pipeline operations and render their outcomes.

use std::{fmt::Display, fs, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use log::debug;
use stratus_core::{
    params::Id, CreateResult, DeleteResult, Outcome, Pipeline, Plans, Projects, Prompts,
    Resources, UpdateResult,
};

use crate::{
    cli::{ConfigArgs, DestroyArgs, PlanCommands, ProjectCommands, ProjectIdArgs, ProjectStateArgs},
    renderer::TerminalRenderer,
};

pub struct Cli {
    pipeline: Pipeline,
    renderer: TerminalRenderer,
}

impl Cli {
    pub fn new(pipeline: Pipeline, renderer: TerminalRenderer) -> Self {
        Self { pipeline, renderer }
    }

    pub async fn handle_project_command(&self, command: ProjectCommands) -> Result<()> {
        match command {
            ProjectCommands::Create(args) => {
                let result = self.pipeline.create_project(&args.into()).await;
                self.emit(Outcome::from(result).map(CreateResult::new))
            }
            ProjectCommands::List => {
                let result = self.pipeline.list_projects().await;
                self.emit(Outcome::from(result).map(Projects::from))
            }
            ProjectCommands::Show(args) => {
                let id: Id = args.into();
                match self.pipeline.get_project(&id).await? {
                    Some(project) => self.render(&project),
                    None => bail!("Project with ID {} not found", id.id),
                }
            }
            ProjectCommands::Update(args) => {
                let result = self.pipeline.update_project(&args.into()).await;
                self.emit(Outcome::from(result).map(|project| UpdateResult::new(project, "Updated")))
            }
            ProjectCommands::Delete(args) => {
                let id: Id = args.into();
                match self.pipeline.delete_project(&id).await? {
                    Some(project) => self.render(&DeleteResult::new(project)),
                    None => bail!("Project with ID {} not found", id.id),
                }
            }
        }
    }

    pub async fn handle_plan_command(&self, command: PlanCommands) -> Result<()> {
        match command {
            PlanCommands::Create(args) => {
                let config_text = read_config(&args.file)?;
                let result = self.pipeline.plan(&args.into_params(config_text)).await;
                self.emit(Outcome::from_result(result, |report| report.warnings.clone()))
            }
            PlanCommands::List(ProjectIdArgs { project_id }) => {
                let result = self.pipeline.list_plans(project_id).await;
                self.emit(Outcome::from(result).map(Plans::from))
            }
            PlanCommands::Show(args) => {
                let id: Id = args.into();
                match self.pipeline.get_plan(&id).await? {
                    Some(plan) => self.render(&plan),
                    None => bail!("Plan with ID {} not found", id.id),
                }
            }
            PlanCommands::Approve(args) => {
                let result = self.pipeline.approve_plan(&args.into()).await;
                self.emit(Outcome::from(result).map(|plan| UpdateResult::new(plan, "Approved")))
            }
            PlanCommands::Apply(args) => {
                let result = self.pipeline.apply(&args.into()).await;
                self.emit(Outcome::from_result(result, |report| report.warnings.clone()))
            }
        }
    }

    pub async fn validate(&self, args: ConfigArgs) -> Result<()> {
        let config_text = read_config(&args.file)?;
        let validation = self.pipeline.validate(&args.into_params(config_text)).await?;
        self.render(&validation)?;
        if !validation.valid {
            bail!("Validation failed");
        }
        Ok(())
    }

    pub async fn destroy(&self, args: DestroyArgs) -> Result<()> {
        if !args.confirm {
            bail!(
                "Refusing to destroy project {} without --confirm",
                args.project_id
            );
        }

        let result = match args.file {
            Some(file) => {
                let config = ConfigArgs {
                    project_id: args.project_id,
                    file,
                };
                let config_text = read_config(&config.file)?;
                self.pipeline.destroy(&config.into_params(config_text)).await
            }
            None => self.pipeline.destroy_applied(args.project_id).await,
        };
        self.emit(Outcome::from(result))
    }

    pub async fn state(&self, args: ProjectStateArgs) -> Result<()> {
        let result = match args.file {
            Some(file) => {
                let config = ConfigArgs {
                    project_id: args.project_id,
                    file,
                };
                let config_text = read_config(&config.file)?;
                self.pipeline.get_state(&config.into_params(config_text)).await
            }
            None => self.pipeline.state_applied(args.project_id).await,
        };

        if args.json {
            let snapshot = result?;
            println!("{:#}", snapshot.raw);
            return Ok(());
        }
        self.emit(Outcome::from(result))
    }

    pub async fn list_resources(&self, args: ProjectIdArgs) -> Result<()> {
        let result = self.pipeline.list_resources(args.project_id).await;
        self.emit(Outcome::from(result).map(Resources::from))
    }

    pub async fn list_prompts(&self, args: ProjectIdArgs) -> Result<()> {
        let result = self.pipeline.list_prompts(args.project_id).await;
        self.emit(Outcome::from(result).map(Prompts::from))
    }

    fn render<T: Display>(&self, value: &T) -> Result<()> {
        self.renderer.render(&value.to_string())
    }

    /// Renders a successful outcome, warnings included; a failure becomes
    /// the command's error.
    fn emit<T: Display>(&self, outcome: Outcome<T>) -> Result<()> {
        match outcome {
            Outcome::Failure { message } => Err(anyhow!(message)),
            outcome => self.renderer.render(&outcome.to_string()),
        }
    }
}

fn read_config(path: &Path) -> Result<String> {
    debug!("Reading configuration from {}", path.display());
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file {}", path.display()))
}
