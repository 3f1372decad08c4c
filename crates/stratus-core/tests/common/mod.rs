#![allow(dead_code)]

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
    time::Duration,
};

use stratus_core::{CreateProject, CredentialSource, Pipeline, PipelineBuilder, Sandbox};
use tempfile::TempDir;

pub const PLAN_JSON: &str = r#"{"format_version":"1.2","resource_changes":[{"address":"aws_vpc.main","change":{"actions":["create"]}}]}"#;

pub const STATE_JSON: &str = r#"{"format_version":"1.0","values":{"root_module":{"resources":[{"address":"aws_vpc.main","mode":"managed","type":"aws_vpc","name":"main","values":{"cidr_block":"10.0.0.0/16"}},{"address":"aws_subnet.a","mode":"managed","type":"aws_subnet","name":"a","values":{"cidr_block":"10.0.1.0/24"},"depends_on":["aws_vpc.main"]}]}}}"#;

/// Shell script standing in for the provisioning binary.
///
/// Direct mode clears the child environment, so behavior is baked into the
/// script. Every invocation appends its arguments to a log file; `init` also
/// logs the staged file names.
#[derive(Debug, Clone)]
pub struct FakeTerraform {
    pub init_exit: i32,
    pub plan_exit: i32,
    pub show_exit: i32,
    pub apply_exit: i32,
    pub destroy_exit: i32,
    pub validate_exit: i32,
    pub plan_json: String,
    pub state_json: String,
    /// Seconds the plan step sleeps before answering
    pub plan_delay: Option<&'static str>,
}

impl Default for FakeTerraform {
    fn default() -> Self {
        Self {
            init_exit: 0,
            plan_exit: 2,
            show_exit: 0,
            apply_exit: 0,
            destroy_exit: 0,
            validate_exit: 0,
            plan_json: PLAN_JSON.to_string(),
            state_json: STATE_JSON.to_string(),
            plan_delay: None,
        }
    }
}

impl FakeTerraform {
    /// Writes the script into `dir` and returns its path.
    pub fn install(&self, dir: &Path, log: &Path) -> PathBuf {
        let delay = self
            .plan_delay
            .map(|secs| format!("sleep {secs}"))
            .unwrap_or_default();

        let script = format!(
            r#"#!/bin/sh
printf '%s\n' "$*" >> '{log}'
last=""
for arg in "$@"; do last="$arg"; done
case "$1" in
  init)
    printf 'files: %s\n' "$(ls | sort | tr '\n' ' ')" >> '{log}'
    if [ {init} -ne 0 ]; then echo "Error: Failed to query available provider packages" >&2; exit {init}; fi
    echo "Terraform has been successfully initialized!"
    ;;
  plan)
    {delay}
    if [ {plan} -ne 0 ] && [ {plan} -ne 2 ]; then echo "Error: Invalid resource type" >&2; exit {plan}; fi
    echo "Plan: 1 to add, 0 to change, 0 to destroy."
    exit {plan}
    ;;
  show)
    if [ {show} -ne 0 ]; then echo "Error: show failed" >&2; exit {show}; fi
    if [ "$last" = "plan.out" ]; then
      cat <<'JSON'
{plan_json}
JSON
    else
      cat <<'JSON'
{state_json}
JSON
    fi
    ;;
  apply)
    if [ {apply} -ne 0 ]; then echo "Error: creating VPC: UnauthorizedOperation" >&2; exit {apply}; fi
    echo "Apply complete! Resources: 2 added, 0 changed, 0 destroyed."
    ;;
  destroy)
    if [ {destroy} -ne 0 ]; then echo "Error: deleting VPC: DependencyViolation" >&2; exit {destroy}; fi
    echo "Destroy complete! Resources: 2 destroyed."
    ;;
  validate)
    if [ {validate} -ne 0 ]; then echo "Error: Unsupported block type" >&2; exit {validate}; fi
    echo "Success! The configuration is valid."
    ;;
esac
exit 0
"#,
            log = log.display(),
            init = self.init_exit,
            plan = self.plan_exit,
            show = self.show_exit,
            apply = self.apply_exit,
            destroy = self.destroy_exit,
            validate = self.validate_exit,
            plan_json = self.plan_json,
            state_json = self.state_json,
        );

        let path = dir.join("terraform");
        fs::write(&path, script).expect("Failed to write fake terraform");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .expect("Failed to make fake terraform executable");
        path
    }
}

/// A pipeline wired to a fake binary, with its database, workspaces and log
/// under one temporary directory.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub pipeline: Pipeline,
}

impl TestEnv {
    pub async fn new(fake: FakeTerraform) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = build_pipeline(&temp_dir, "bin", &fake, Duration::from_secs(30)).await;
        Self { temp_dir, pipeline }
    }

    pub async fn with_timeout(fake: FakeTerraform, timeout: Duration) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let pipeline = build_pipeline(&temp_dir, "bin", &fake, timeout).await;
        Self { temp_dir, pipeline }
    }

    /// A second pipeline over the same database, workspace root and log
    /// with different tool behavior.
    pub async fn sibling(&self, fake: FakeTerraform) -> Pipeline {
        build_pipeline(&self.temp_dir, "sibling-bin", &fake, Duration::from_secs(30)).await
    }

    pub fn log_path(&self) -> PathBuf {
        self.temp_dir.path().join("terraform.log")
    }

    /// Every logged invocation, in order.
    pub fn invocations(&self) -> Vec<String> {
        self.log_lines()
            .into_iter()
            .filter(|line| !line.starts_with("files:"))
            .collect()
    }

    /// File names staged in each workspace, one entry per `init`.
    pub fn staged_files(&self) -> Vec<Vec<String>> {
        self.log_lines()
            .into_iter()
            .filter_map(|line| {
                line.strip_prefix("files:")
                    .map(|files| files.split_whitespace().map(String::from).collect())
            })
            .collect()
    }

    /// Number of workspaces still present under the workspace root.
    pub fn leftover_workspaces(&self) -> usize {
        match fs::read_dir(self.temp_dir.path().join("workspaces")) {
            Ok(entries) => entries.count(),
            Err(_) => 0,
        }
    }

    pub async fn create_project(&self, name: &str) -> u64 {
        self.pipeline
            .create_project(&CreateProject {
                name: name.to_string(),
                cloud_provider: "aws".to_string(),
                ..Default::default()
            })
            .await
            .expect("Failed to create project")
            .id
    }

    fn log_lines(&self) -> Vec<String> {
        fs::read_to_string(self.log_path())
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }
}

async fn build_pipeline(
    temp_dir: &TempDir,
    bin: &str,
    fake: &FakeTerraform,
    timeout: Duration,
) -> Pipeline {
    let bin_dir = temp_dir.path().join(bin);
    fs::create_dir_all(&bin_dir).expect("Failed to create bin dir");
    let binary = fake.install(&bin_dir, &temp_dir.path().join("terraform.log"));

    PipelineBuilder::new()
        .with_database_path(Some(temp_dir.path().join("test.db")))
        .with_workspace_root(Some(temp_dir.path().join("workspaces")))
        .with_sandbox(Sandbox::Direct { binary })
        .with_timeout(timeout)
        .with_credentials(CredentialSource::from_pairs([("AWS_ACCESS_KEY_ID", "AKIATEST")]))
        .build()
        .await
        .expect("Failed to create pipeline")
}
