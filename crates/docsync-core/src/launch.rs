use crate::deployment::{DeploymentMode, RuntimeLayout};
use std::env;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

pub const WORKER_ENTRY_SCRIPT: &str = "main.py";
pub const BUNDLED_WORKER_DIR: &str = "docsync";
pub const FORCE_ARG: &str = "--force";
pub const CLEAN_ARG: &str = "--clean";
pub const PROBE_ARG: &str = "--help";
pub const PYTHON_ENV: &str = "DOCSYNC_PYTHON";
pub const WORKER_CMD_ENV: &str = "DOCSYNC_WORKER_CMD";

#[cfg(target_os = "windows")]
pub(crate) const CREATE_NO_WINDOW: u32 = 0x0800_0000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerCommand {
    pub command: String,
    pub args: Vec<String>,
}

/// Host-level knobs that change which executable runs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LaunchOverrides {
    pub python: Option<String>,
    pub worker_cmd: Option<String>,
}

impl LaunchOverrides {
    pub fn from_env() -> Self {
        Self {
            python: non_empty_env(PYTHON_ENV),
            worker_cmd: non_empty_env(WORKER_CMD_ENV),
        }
    }
}

/// Everything needed to start the worker, minus the per-invocation arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LaunchPlan {
    pub worker: WorkerCommand,
    pub cwd: PathBuf,
    pub env: Vec<(String, String)>,
    pub packaged_mode: bool,
}

impl LaunchPlan {
    pub fn resolve(layout: &RuntimeLayout, overrides: &LaunchOverrides) -> anyhow::Result<Self> {
        let worker = match overrides.worker_cmd.as_deref() {
            Some(raw) => parse_custom_command(raw)?,
            None => resolve_command(layout, overrides.python.as_deref()),
        };
        Ok(Self {
            worker,
            cwd: layout.worker_cwd().to_path_buf(),
            env: worker_env(),
            packaged_mode: layout.mode == DeploymentMode::Packaged,
        })
    }

    /// Builds a piped, windowless command for one invocation. On unix the
/// worker leads a new process group.
    pub fn command(&self, extra_args: &[String]) -> Command {
        let mut command = Command::new(&self.worker.command);
        command
            .args(&self.worker.args)
            .args(extra_args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for (key, value) in &self.env {
            command.env(key, value);
        }
        // Own process group, so a timeout can take down the worker's children.
        #[cfg(unix)]
        command.process_group(0);
        #[cfg(target_os = "windows")]
        command.creation_flags(CREATE_NO_WINDOW);
        command
    }

    pub fn debug_command(&self, extra_args: &[String]) -> Vec<String> {
        let mut parts = vec![self.worker.command.clone()];
        parts.extend(self.worker.args.iter().cloned());
        parts.extend(extra_args.iter().cloned());
        parts
    }
}

/// Pure mapping from deployment mode to the worker executable.
pub fn resolve_command(layout: &RuntimeLayout, python: Option<&str>) -> WorkerCommand {
    match layout.mode {
        DeploymentMode::Development => WorkerCommand {
            command: python.unwrap_or(default_python()).to_string(),
            args: vec![
                layout
                    .project_root
                    .join(WORKER_ENTRY_SCRIPT)
                    .to_string_lossy()
                    .to_string(),
            ],
        },
        DeploymentMode::Packaged => WorkerCommand {
            command: layout
                .resource_root
                .join(BUNDLED_WORKER_DIR)
                .join(bundled_worker_name())
                .to_string_lossy()
                .to_string(),
            args: Vec::new(),
        },
    }
}

pub fn parse_custom_command(raw: &str) -> anyhow::Result<WorkerCommand> {
    let mut pieces =
        shlex::split(raw).ok_or_else(|| anyhow::anyhow!("invalid {WORKER_CMD_ENV}: {raw}"))?;
    if pieces.is_empty() {
        anyhow::bail!("{WORKER_CMD_ENV} is empty");
    }
    let command = pieces.remove(0);
    Ok(WorkerCommand {
        command,
        args: pieces,
    })
}

pub fn default_python() -> &'static str {
    if cfg!(target_os = "windows") {
        "python"
    } else {
        "python3"
    }
}

pub fn bundled_worker_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "docsync.exe"
    } else {
        "docsync"
    }
}

fn worker_env() -> Vec<(String, String)> {
    vec![
        ("PYTHONUNBUFFERED".to_string(), "1".to_string()),
        (
            "PYTHONIOENCODING".to_string(),
            env::var("PYTHONIOENCODING").unwrap_or_else(|_| "utf-8".to_string()),
        ),
        (
            "PYTHONUTF8".to_string(),
            env::var("PYTHONUTF8").unwrap_or_else(|_| "1".to_string()),
        ),
    ]
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
