use crate::deployment::RuntimeLayout;
use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// The worker's configuration document: Feishu credentials plus the task list.
///
/// Keys the control surface does not model (user tokens the worker writes back,
/// for instance) are kept in `extra` so a load/save cycle never drops them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(rename = "feishu_app_id", default, deserialize_with = "nullable_string")]
    pub app_id: String,
    #[serde(
        rename = "feishu_app_secret",
        default,
        deserialize_with = "nullable_string"
    )]
    pub app_secret: String,
    #[serde(default)]
    pub tasks: Vec<Task>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    /// Task entries on disk that could not be decoded and were left out of
    /// `tasks`. Writing the task list back would drop them.
    #[serde(skip)]
    pub unreadable_tasks: usize,
}

impl ConfigDocument {
    pub fn has_credentials(&self) -> bool {
        !self.app_id.trim().is_empty() && !self.app_secret.trim().is_empty()
    }

    pub fn actionable_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter().filter(|task| task.is_actionable())
    }

    /// Decodes each known key on its own, so one bad value only costs that
    /// value (or that one task) instead of the whole document.
    fn from_object(mut object: Map<String, Value>) -> Self {
        let app_id = take_field(&mut object, "feishu_app_id");
        let app_secret = take_field(&mut object, "feishu_app_secret");
        let mut unreadable_tasks = 0;
        let tasks = match object.remove("tasks") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .enumerate()
                .filter_map(|(index, item)| match serde_json::from_value::<Task>(item) {
                    Ok(task) => Some(task),
                    Err(err) => {
                        warn!(index, error = %err, "skipping unreadable task");
                        unreadable_tasks += 1;
                        None
                    }
                })
                .collect(),
            Some(other) => {
                warn!(kind = json_kind(&other), "config tasks is not a list, ignoring");
                unreadable_tasks += 1;
                Vec::new()
            }
        };
        Self {
            app_id,
            app_secret,
            tasks,
            extra: object,
            unreadable_tasks,
        }
    }
}

fn take_field<T: DeserializeOwned + Default>(object: &mut Map<String, Value>, key: &str) -> T {
    match object.remove(key) {
        None | Some(Value::Null) => T::default(),
        Some(value) => serde_json::from_value(value).unwrap_or_else(|err| {
            warn!(key, error = %err, "ignoring config value of unexpected type");
            T::default()
        }),
    }
}

/// One local-path to cloud-token mapping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, deserialize_with = "nullable_string")]
    pub note: String,
    #[serde(rename = "local", default, deserialize_with = "nullable_string")]
    pub local_path: String,
    #[serde(rename = "cloud", default, deserialize_with = "nullable_string")]
    pub cloud_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_root: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub force: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            note: String::new(),
            local_path: String::new(),
            cloud_token: String::new(),
            vault_root: None,
            enabled: true,
            force: false,
            extra: Map::new(),
        }
    }
}

impl Task {
    pub fn new(
        note: impl Into<String>,
        local_path: impl Into<String>,
        cloud_token: impl Into<String>,
    ) -> Self {
        Self {
            note: note.into(),
            local_path: local_path.into(),
            cloud_token: cloud_token.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), TaskValidationError> {
        if self.note.trim().is_empty() {
            return Err(TaskValidationError::MissingNote);
        }
        if self.local_path.trim().is_empty() {
            return Err(TaskValidationError::MissingLocalPath);
        }
        if self.cloud_token.trim().is_empty() {
            return Err(TaskValidationError::MissingCloudToken);
        }
        Ok(())
    }

    pub fn is_actionable(&self) -> bool {
        self.enabled && self.validate().is_ok()
    }
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum TaskValidationError {
    #[error("note is required")]
    MissingNote,
    #[error("local path is required")]
    MissingLocalPath,
    #[error("cloud token is required")]
    MissingCloudToken,
}

/// A partial document. Only the keys that are set are written on save.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPatch {
    #[serde(
        rename = "feishu_app_id",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub app_id: Option<String>,
    #[serde(
        rename = "feishu_app_secret",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub app_secret: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ConfigPatch {
    pub fn tasks(tasks: Vec<Task>) -> Self {
        Self {
            tasks: Some(tasks),
            ..Self::default()
        }
    }

    pub fn credentials(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: Some(app_id.into()),
            app_secret: Some(app_secret.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.app_id.is_none()
            && self.app_secret.is_none()
            && self.tasks.is_none()
            && self.extra.is_empty()
    }

    fn apply_to(&self, object: &mut Map<String, Value>) -> anyhow::Result<()> {
        let Value::Object(fields) = serde_json::to_value(self).context("serialize config patch")?
        else {
            anyhow::bail!("config patch did not serialize to an object");
        };
        for (key, value) in fields {
            object.insert(key, value);
        }
        Ok(())
    }
}

/// Reads and read-merge-writes `sync_config.json`.
///
/// Saves are not serialized against each other; two overlapping saves each
/// merge into whatever is on disk when they read it.
#[derive(Clone, Debug)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_layout(layout: &RuntimeLayout) -> Self {
        Self::new(layout.config_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Never fails: a missing or unreadable file yields the default document,
    /// and values of the wrong type fall back individually.
    pub fn load(&self) -> ConfigDocument {
        let document = ConfigDocument::from_object(self.load_object());
        if document.unreadable_tasks > 0 {
            error!(
                path = %self.path.display(),
                unreadable = document.unreadable_tasks,
                "config has tasks that could not be read"
            );
        }
        document
    }

    pub fn save(&self, patch: &ConfigPatch) -> anyhow::Result<()> {
        let mut object = self.load_object();
        patch.apply_to(&mut object)?;
        write_document(&self.path, &Value::Object(object))?;
        info!(
            path = %self.path.display(),
            tasks = patch.tasks.as_ref().map(Vec::len),
            credentials = patch.app_id.is_some() || patch.app_secret.is_some(),
            "saved config"
        );
        Ok(())
    }

    fn load_object(&self) -> Map<String, Value> {
        match read_document_object(&self.path) {
            Ok(Some(object)) => object,
            Ok(None) => {
                debug!(path = %self.path.display(), "config file missing, using defaults");
                Map::new()
            }
            Err(err) => {
                error!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "failed to read config, using defaults"
                );
                Map::new()
            }
        }
    }
}

fn read_document_object(path: &Path) -> anyhow::Result<Option<Map<String, Value>>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path).context("read config")?;
    let json: Value = serde_json::from_str(&data).context("parse config")?;
    normalize_document(json).map(Some)
}

/// Accepts the record form and the legacy bare task list.
fn normalize_document(json: Value) -> anyhow::Result<Map<String, Value>> {
    match json {
        Value::Object(object) => Ok(object),
        Value::Array(tasks) => {
            debug!(tasks = tasks.len(), "normalizing legacy task-list config");
            let mut object = Map::new();
            object.insert("tasks".to_string(), Value::Array(tasks));
            Ok(object)
        }
        other => anyhow::bail!("unsupported config root: {}", json_kind(&other)),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn write_document(path: &Path, value: &Value) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config directory")?;
    }
    let data = serde_json::to_string_pretty(value).context("serialize config")?;
    let staging = staging_path(path);
    fs::write(&staging, data)
        .with_context(|| format!("write config staging file {}", staging.display()))?;
    fs::rename(&staging, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn default_enabled() -> bool {
    true
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
