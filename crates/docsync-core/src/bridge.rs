use crate::config::{ConfigDocument, ConfigPatch, ConfigStore};
use crate::deployment::RuntimeLayout;
use crate::events::{BridgeEvent, EventSink, EventStream, Finished, Origin, OutputStream, event_channel};
use crate::launch::{LaunchOverrides, LaunchPlan};
use crate::picker::{PathPicker, PickRequest};
use crate::supervisor::{Supervisor, SupervisorError, probe_timeout_from_env};
use directories::BaseDirs;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Payload of `run-sync`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunSyncRequest {
    pub session_id: Uuid,
    pub force: bool,
}

impl RunSyncRequest {
    pub fn new(force: bool) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            force,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct SaveResult {
    pub success: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheckResult {
    pub success: bool,
    pub output: String,
}

/// The UI-facing command surface. Responses come back from the async
/// methods; everything streamed goes through the `EventStream` handed out
/// by the constructor.
pub struct Bridge {
    store: ConfigStore,
    supervisor: Arc<Supervisor>,
    picker: Arc<dyn PathPicker>,
    sink: EventSink,
    runtime: Handle,
    probe_timeout: Duration,
}

impl Bridge {
    pub fn new(
        store: ConfigStore,
        supervisor: Supervisor,
        picker: Arc<dyn PathPicker>,
        runtime: Handle,
    ) -> (Self, EventStream) {
        let (sink, stream) = event_channel();
        let bridge = Self {
            store,
            supervisor: Arc::new(supervisor),
            picker,
            sink,
            runtime,
            probe_timeout: crate::supervisor::DEFAULT_PROBE_TIMEOUT,
        };
        (bridge, stream)
    }

    /// Wires the store, launch plan, sync lock and probe deadline for `layout`.
    pub fn for_layout(
        layout: &RuntimeLayout,
        overrides: &LaunchOverrides,
        picker: Arc<dyn PathPicker>,
        runtime: Handle,
    ) -> anyhow::Result<(Self, EventStream)> {
        let plan = LaunchPlan::resolve(layout, overrides)?;
        info!(
            mode = %layout.mode,
            cwd = %plan.cwd.display(),
            command = %plan.debug_command(&[]).join(" "),
            "resolved worker launch plan"
        );
        let supervisor = Supervisor::new(plan).with_sync_lock(layout.sync_lock_path()?);
        let (bridge, stream) = Self::new(ConfigStore::for_layout(layout), supervisor, picker, runtime);
        Ok((bridge.with_probe_timeout(probe_timeout_from_env()), stream))
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn probe_timeout(&self) -> Duration {
        self.probe_timeout
    }

    /// `select-folder`
    pub async fn select_folder(&self) -> Option<PathBuf> {
        self.pick(PickRequest::folder(home_dir())).await
    }

    /// `select-file`
    pub async fn select_file(&self) -> Option<PathBuf> {
        self.pick(PickRequest::markdown_file(home_dir())).await
    }

    async fn pick(&self, request: PickRequest) -> Option<PathBuf> {
        let picker = Arc::clone(&self.picker);
        let picked = tokio::task::spawn_blocking(move || {
            let path = picker.pick(&request)?;
            if request.accepts(&path) {
                Some(path)
            } else {
                warn!(path = %path.display(), "picker returned an unusable path");
                None
            }
        })
        .await;
        match picked {
            Ok(path) => path,
            Err(err) => {
                error!(error = %err, "picker task failed");
                None
            }
        }
    }

    /// `get-config`
    pub async fn get_config(&self) -> ConfigDocument {
        let store = self.store.clone();
        match tokio::task::spawn_blocking(move || store.load()).await {
            Ok(document) => document,
            Err(err) => {
                error!(error = %err, "config load task failed");
                ConfigDocument::default()
            }
        }
    }

    /// `save-config`
    pub async fn save_config(&self, patch: ConfigPatch) -> SaveResult {
        let store = self.store.clone();
        let saved = tokio::task::spawn_blocking(move || store.save(&patch))
            .await
            .map_err(anyhow::Error::from)
            .and_then(|result| result);
        match saved {
            Ok(()) => SaveResult { success: true },
            Err(err) => {
                error!(path = %self.store.path().display(), error = %format!("{err:#}"), "save config failed");
                SaveResult { success: false }
            }
        }
    }

    /// `run-sync`. Fire-and-forget; progress arrives on the event stream.
    ///
    /// A request while a sync is live is ignored. Any other start failure is
    /// reported as a system log line followed by a failed `sync-finished`.
    pub fn run_sync(&self, request: RunSyncRequest) {
        let _runtime = self.runtime.enter();
        match self
            .supervisor
            .spawn_sync(request.session_id, request.force, self.sink.clone())
        {
            Ok(_) => {}
            Err(SupervisorError::SyncAlreadyRunning(active)) => {
                warn!(
                    requested = %request.session_id,
                    active = %active,
                    "sync already running, request ignored"
                );
            }
            Err(err) => {
                let text = format!("{:#}", anyhow::Error::new(err));
                error!(session = %request.session_id, error = %text, "sync failed to start");
                self.sink.log(Origin::Sync, OutputStream::System, text);
                self.sink
                    .emit(BridgeEvent::SyncFinished(Finished::failed()));
            }
        }
    }

    /// `health-check`
    pub async fn health_check(&self) -> HealthCheckResult {
        let probe = self.supervisor.spawn_probe(self.probe_timeout).await;
        info!(success = probe.ok, "health check finished");
        HealthCheckResult {
            success: probe.ok,
            output: probe.output,
        }
    }

    /// `run-clean`. Fire-and-forget; ends with exactly one `clean-finished`.
    pub fn run_clean(&self) {
        let supervisor = Arc::clone(&self.supervisor);
        let sink = self.sink.clone();
        self.runtime.spawn(async move {
            let finished = match supervisor.run_clean(&sink).await {
                Ok(finished) => finished,
                Err(err) => {
                    let text = format!("{:#}", anyhow::Error::new(err));
                    warn!(error = %text, "cleanup did not run");
                    sink.log(Origin::Clean, OutputStream::System, text);
                    Finished::failed()
                }
            };
            sink.emit(BridgeEvent::CleanFinished(finished));
        });
    }
}

fn home_dir() -> Option<PathBuf> {
    BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Task;
    use crate::deployment::DeploymentMode;
    use crate::picker::PickKind;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedPicker {
        answer: Option<PathBuf>,
        seen: Mutex<Vec<PickKind>>,
    }

    impl PathPicker for FixedPicker {
        fn pick(&self, request: &PickRequest) -> Option<PathBuf> {
            self.seen.lock().unwrap().push(request.kind);
            self.answer.clone()
        }
    }

    fn bridge(tmp: &TempDir, answer: Option<PathBuf>) -> (Bridge, EventStream, Arc<FixedPicker>) {
        let layout = RuntimeLayout::new(
            DeploymentMode::Development,
            tmp.path().to_path_buf(),
            tmp.path().join("resources"),
        );
        let plan = LaunchPlan::resolve(&layout, &LaunchOverrides::default()).unwrap();
        let picker = Arc::new(FixedPicker {
            answer,
            seen: Mutex::new(Vec::new()),
        });
        let (bridge, stream) = Bridge::new(
            ConfigStore::for_layout(&layout),
            Supervisor::new(plan),
            picker.clone(),
            Handle::current(),
        );
        (bridge, stream, picker)
    }

    #[tokio::test]
    async fn save_then_get_round_trips_through_store() {
        let tmp = TempDir::new().unwrap();
        let (bridge, _stream, _) = bridge(&tmp, None);
        let result = bridge
            .save_config(ConfigPatch::credentials("cli_x", "secret"))
            .await;
        assert!(result.success);
        let result = bridge
            .save_config(ConfigPatch::tasks(vec![Task::new("docs", "/notes", "tok")]))
            .await;
        assert!(result.success);

        let document = bridge.get_config().await;
        assert_eq!(document.app_id, "cli_x");
        assert_eq!(document.tasks.len(), 1);
    }

    #[tokio::test]
    async fn save_failure_reports_unsuccessful() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();
        let (bridge, _stream) = Bridge::new(
            ConfigStore::new(blocker.join("sync_config.json")),
            Supervisor::new(
                LaunchPlan::resolve(
                    &RuntimeLayout::new(
                        DeploymentMode::Development,
                        tmp.path().to_path_buf(),
                        tmp.path().to_path_buf(),
                    ),
                    &LaunchOverrides::default(),
                )
                .unwrap(),
            ),
            Arc::new(crate::picker::NoPicker),
            Handle::current(),
        );
        let result = bridge.save_config(ConfigPatch::tasks(Vec::new())).await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn select_folder_returns_existing_directory() {
        let tmp = TempDir::new().unwrap();
        let (bridge, _stream, picker) = bridge(&tmp, Some(tmp.path().to_path_buf()));
        assert_eq!(bridge.select_folder().await, Some(tmp.path().to_path_buf()));
        assert_eq!(picker.seen.lock().unwrap().as_slice(), &[PickKind::Folder]);
    }

    #[tokio::test]
    async fn select_file_rejects_non_markdown() {
        let tmp = TempDir::new().unwrap();
        let text = tmp.path().join("notes.txt");
        fs::write(&text, "plain").unwrap();
        let (bridge, _stream, _) = bridge(&tmp, Some(text));
        assert_eq!(bridge.select_file().await, None);
    }

    #[tokio::test]
    async fn cancelled_pick_is_none() {
        let tmp = TempDir::new().unwrap();
        let (bridge, _stream, _) = bridge(&tmp, None);
        assert_eq!(bridge.select_folder().await, None);
    }
}
