use anyhow::Context;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "sync_config.json";
pub const MODE_ENV: &str = "DOCSYNC_MODE";
pub const PROJECT_ROOT_ENV: &str = "DOCSYNC_PROJECT_ROOT";
pub const RESOURCE_ROOT_ENV: &str = "DOCSYNC_RESOURCE_ROOT";

/// How the worker is shipped. Supplied by the host, never inferred here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeploymentMode {
    Development,
    Packaged,
}

impl DeploymentMode {
    pub fn as_str(self) -> &'static str {
        match self {
            DeploymentMode::Development => "development",
            DeploymentMode::Packaged => "packaged",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" => Some(DeploymentMode::Development),
            "packaged" | "release" | "production" => Some(DeploymentMode::Packaged),
            _ => None,
        }
    }

    pub fn from_env() -> Option<Self> {
        env::var(MODE_ENV).ok().and_then(|value| Self::parse(&value))
    }
}

impl fmt::Display for DeploymentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filesystem anchors for one deployment mode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeLayout {
    pub mode: DeploymentMode,
    pub project_root: PathBuf,
    pub resource_root: PathBuf,
}

impl RuntimeLayout {
    pub fn new(mode: DeploymentMode, project_root: PathBuf, resource_root: PathBuf) -> Self {
        Self {
            mode,
            project_root,
            resource_root,
        }
    }

    /// Explicit paths win, then environment variables, then defaults
    /// (current directory for the project, `<exe dir>/resources` when packaged).
    pub fn resolve(
        mode: DeploymentMode,
        project_root: Option<PathBuf>,
        resource_root: Option<PathBuf>,
    ) -> anyhow::Result<Self> {
        let project_root = match project_root.or_else(|| path_from_env(PROJECT_ROOT_ENV)) {
            Some(path) => path,
            None => env::current_dir().context("resolve current directory")?,
        };
        let resource_root = match resource_root.or_else(|| path_from_env(RESOURCE_ROOT_ENV)) {
            Some(path) => path,
            None => default_resource_root()?,
        };
        Ok(Self::new(mode, project_root, resource_root))
    }

    /// Working directory for every worker invocation. The worker finds its
    /// config and credentials relative to it.
    pub fn worker_cwd(&self) -> &Path {
        match self.mode {
            DeploymentMode::Development => &self.project_root,
            DeploymentMode::Packaged => &self.resource_root,
        }
    }

    pub fn config_path(&self) -> PathBuf {
        self.worker_cwd().join(CONFIG_FILE_NAME)
    }

    /// Per-user lock guarding syncs of this layout's working copy. Layouts
    /// with different worker directories never contend.
    pub fn sync_lock_path(&self) -> anyhow::Result<PathBuf> {
        Ok(lock_dir()?.join(sync_lock_name(self.worker_cwd())))
    }
}

fn sync_lock_name(worker_cwd: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(worker_cwd.to_string_lossy().as_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("sync-{}.lock", &digest[..16])
}

fn path_from_env(name: &str) -> Option<PathBuf> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

fn default_resource_root() -> anyhow::Result<PathBuf> {
    let exe = env::current_exe().context("resolve current executable")?;
    let dir = exe
        .parent()
        .context("current executable has no parent directory")?;
    Ok(dir.join("resources"))
}

pub fn project_dirs() -> anyhow::Result<ProjectDirs> {
    ProjectDirs::from("com", "docsync", "docsync").context("resolve project dirs")
}

fn lock_dir() -> anyhow::Result<PathBuf> {
    let project = project_dirs()?;
    Ok(project
        .runtime_dir()
        .unwrap_or(project.cache_dir())
        .to_path_buf())
}

pub fn default_ui_state_path() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("ui_state.json"))
}

pub fn default_log_dir() -> anyhow::Result<PathBuf> {
    Ok(project_dirs()?.data_local_dir().join("logs"))
}
