//! Execution of the external provisioning tool.
//!
//! [`ToolRunner::run`] never fails: a command that cannot be started or that
//! exceeds the configured timeout yields a synthetic [`ToolOutput`] with
//! `exit_code == -1` and the reason in
//! [`invocation_failure`](ToolOutput::invocation_failure). Timed-out
//! children are killed (and, in docker mode, their container too).
//!
//! Generated configuration is untrusted, so the default [`Sandbox::Docker`]
//! mode confines a run to the workspace bind mount under the invoking user's
//! identity. [`Sandbox::Direct`] runs the binary on the host with a cleared
//! environment and the workspace as working directory.

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use log::{debug, info, warn};
use tokio::{process::Command, time::timeout};

use crate::{
    credentials::{CredentialOverlay, CredentialSource},
    error::{Result, StratusError},
    models::Project,
    workspace::Workspace,
};

/// Default bound on a single tool run.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
/// Default image for docker mode.
pub const DEFAULT_IMAGE: &str = "hashicorp/terraform:1.9";
/// Mount point of the workspace inside the container.
pub const CONTAINER_WORKDIR: &str = "/workspace";
/// Directory inside the container where key files are mounted read-only.
pub const CONTAINER_CREDENTIALS_DIR: &str = "/credentials";

const DOCKER_KILL_TIMEOUT: Duration = Duration::from_secs(10);

/// The pipeline step a tool run belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolStep {
    Init,
    Plan,
    /// Plan recomputed right before apply
    Replan,
    Show,
    Apply,
    Destroy,
    Validate,
}

impl ToolStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStep::Init => "init",
            ToolStep::Plan => "plan",
            ToolStep::Replan => "re-plan",
            ToolStep::Show => "show",
            ToolStep::Apply => "apply",
            ToolStep::Destroy => "destroy",
            ToolStep::Validate => "validate",
        }
    }
}

impl fmt::Display for ToolStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the provisioning binary is launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sandbox {
    /// `docker run` with the workspace as the only writable mount
    Docker { docker: PathBuf, image: String },
    /// Run the binary on the host inside the workspace directory
    Direct { binary: PathBuf },
}

impl Default for Sandbox {
    fn default() -> Self {
        Sandbox::Docker {
            docker: PathBuf::from("docker"),
            image: DEFAULT_IMAGE.to_string(),
        }
    }
}

/// Runner configuration.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub sandbox: Sandbox,
    pub timeout: Duration,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            sandbox: Sandbox::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Why a run produced no real exit status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvocationFailure {
    /// The process could not be started
    Spawn(String),
    /// The process was killed after exceeding the timeout
    Timeout(Duration),
    /// Waiting on the process failed
    Wait(String),
}

impl fmt::Display for InvocationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(reason) => write!(f, "failed to start: {reason}"),
            Self::Timeout(limit) => write!(f, "timed out after {}s", limit.as_secs()),
            Self::Wait(reason) => write!(f, "failed while waiting: {reason}"),
        }
    }
}

/// Captured result of one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    /// Tool arguments, for diagnostics
    pub command: String,
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    /// Process exit code, `-1` when there is none
    pub exit_code: i32,
    pub invocation_failure: Option<InvocationFailure>,
}

impl ToolOutput {
    fn synthetic(command: String, failure: InvocationFailure) -> Self {
        Self {
            command,
            succeeded: false,
            stdout: String::new(),
            stderr: failure.to_string(),
            exit_code: -1,
            invocation_failure: Some(failure),
        }
    }

    /// Converts a failed invocation into a `LocalInvocation` error and leaves
    /// every real exit status to the caller.
    pub fn invoked(self, step: ToolStep) -> Result<Self> {
        match self.invocation_failure {
            Some(failure) => Err(StratusError::LocalInvocation {
                step,
                reason: failure.to_string(),
            }),
            None => Ok(self),
        }
    }

    /// Requires exit code 0.
    pub fn check(self, step: ToolStep) -> Result<Self> {
        let output = self.invoked(step)?;
        if output.succeeded {
            Ok(output)
        } else {
            Err(StratusError::Tool {
                step,
                exit_code: output.exit_code,
                stderr: output.stderr,
            })
        }
    }
}

/// Launches the provisioning tool inside workspaces.
#[derive(Debug, Clone)]
pub struct ToolRunner {
    config: RunnerConfig,
    credentials: CredentialSource,
}

impl ToolRunner {
    pub fn new(config: RunnerConfig, credentials: CredentialSource) -> Self {
        Self {
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Runs the tool with `args` inside `workspace`, injecting the
    /// credentials of the project's cloud provider.
    pub async fn run(&self, workspace: &Workspace, args: &[&str], project: &Project) -> ToolOutput {
        let command_line = args.join(" ");
        let overlay = self.credentials.overlay_for(&project.cloud_provider);

        let mut cmd = match &self.config.sandbox {
            Sandbox::Direct { binary } => direct_command(binary, workspace.path(), args, &overlay),
            Sandbox::Docker { docker, image } => {
                let mut cmd = Command::new(docker);
                cmd.args(docker_args(workspace, image, args, &overlay));
                // `-e NAME` makes docker read the value from its own environment
                cmd.envs(overlay.value_pairs());
                cmd
            }
        };
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(
            "Running `{command_line}` in {} with credentials {:?}",
            workspace.path().display(),
            overlay
        );

        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start `{command_line}`: {e}");
                return ToolOutput::synthetic(command_line, InvocationFailure::Spawn(e.to_string()));
            }
        };

        // Dropping the wait future on timeout drops the child, which kills it
        match timeout(self.config.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let exit_code = output.status.code().unwrap_or(-1);
                debug!("`{command_line}` exited with {exit_code}");
                ToolOutput {
                    command: command_line,
                    succeeded: output.status.success(),
                    stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                    exit_code,
                    invocation_failure: None,
                }
            }
            Ok(Err(e)) => ToolOutput::synthetic(command_line, InvocationFailure::Wait(e.to_string())),
            Err(_) => {
                warn!(
                    "`{command_line}` exceeded {}s, terminating",
                    self.config.timeout.as_secs()
                );
                if let Sandbox::Docker { docker, .. } = &self.config.sandbox {
                    kill_container(docker, workspace.name()).await;
                }
                ToolOutput::synthetic(command_line, InvocationFailure::Timeout(self.config.timeout))
            }
        }
    }
}

fn direct_command(binary: &Path, dir: &Path, args: &[&str], overlay: &CredentialOverlay) -> Command {
    let mut cmd = Command::new(binary);
    cmd.args(args)
        .current_dir(dir)
        .env_clear()
        .env("PATH", std::env::var_os("PATH").unwrap_or_default())
        .env("HOME", dir)
        .env("TMPDIR", dir)
        .env("TF_IN_AUTOMATION", "1")
        .envs(overlay.pairs());
    cmd
}

/// Arguments for `docker run`. Credential values never appear here.
fn docker_args(
    workspace: &Workspace,
    image: &str,
    args: &[&str],
    overlay: &CredentialOverlay,
) -> Vec<OsString> {
    let mut mount = OsString::from(workspace.path().as_os_str());
    mount.push(format!(":{CONTAINER_WORKDIR}"));

    let mut out: Vec<OsString> = [
        "run",
        "--rm",
        "--name",
        workspace.name(),
        "--workdir",
        CONTAINER_WORKDIR,
        "--read-only",
        "--tmpfs",
        "/tmp",
        "--cap-drop",
        "ALL",
        "--security-opt",
        "no-new-privileges",
        "--env",
        "TF_IN_AUTOMATION=1",
        "--env",
    ]
    .iter()
    .map(OsString::from)
    .collect();
    out.push(OsString::from(format!("HOME={CONTAINER_WORKDIR}")));
    out.push(OsString::from("--volume"));
    out.push(mount);

    if let Some(user) = owner_of(workspace.path()) {
        out.push(OsString::from("--user"));
        out.push(OsString::from(user));
    }

    for (name, _) in overlay.value_pairs() {
        out.push(OsString::from("--env"));
        out.push(OsString::from(name));
    }

    // Key files live on the host, so the path is remapped into the container
    for (name, host_path) in overlay.file_pairs() {
        let container_path = container_key_path(name);
        let mut volume = OsString::from(host_path);
        volume.push(format!(":{container_path}:ro"));
        out.push(OsString::from("--volume"));
        out.push(volume);
        out.push(OsString::from("--env"));
        out.push(OsString::from(format!("{name}={container_path}")));
    }

    out.push(OsString::from(image));
    out.extend(args.iter().map(OsString::from));
    out
}

fn container_key_path(name: &str) -> String {
    format!("{CONTAINER_CREDENTIALS_DIR}/{}.json", name.to_lowercase())
}

/// `uid:gid` owning the workspace, which is the invoking process.
#[cfg(unix)]
fn owner_of(path: &Path) -> Option<String> {
    use std::os::unix::fs::MetadataExt;

    std::fs::metadata(path)
        .ok()
        .map(|meta| format!("{}:{}", meta.uid(), meta.gid()))
}

#[cfg(not(unix))]
fn owner_of(_path: &Path) -> Option<String> {
    None
}

async fn kill_container(docker: &Path, name: &str) {
    let mut cmd = Command::new(docker);
    cmd.args(["kill", name])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .kill_on_drop(true);

    match timeout(DOCKER_KILL_TIMEOUT, cmd.status()).await {
        Ok(Ok(status)) if status.success() => info!("Killed container {name}"),
        Ok(Ok(status)) => debug!("docker kill {name} exited with {status}"),
        Ok(Err(e)) => warn!("Failed to run docker kill for {name}: {e}"),
        Err(_) => warn!("docker kill for {name} timed out"),
    }
}
