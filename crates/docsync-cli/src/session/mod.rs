//! UI-side state machine shared by the terminal UI and the task commands.

use anyhow::Context;
use docsync_core::bridge::{HealthCheckResult, RunSyncRequest};
use docsync_core::config::{ConfigDocument, ConfigPatch, ConfigStore, Task};
use docsync_core::events::{BridgeEvent, Finished, Origin};
use docsync_core::session::SyncSession;
use tracing::{info, warn};

mod log_view;

pub use log_view::{LineKind, LogView, LogViewEntry};

/// Persistence seam for task and credential edits.
pub trait ConfigWriter {
    fn write(&self, patch: &ConfigPatch) -> anyhow::Result<()>;
}

impl ConfigWriter for ConfigStore {
    fn write(&self, patch: &ConfigPatch) -> anyhow::Result<()> {
        self.save(patch)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ProbeState {
    #[default]
    Idle,
    Running,
    Done(HealthCheckResult),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CleanState {
    #[default]
    Idle,
    Running,
    Done(Finished),
}

/// A terminal event the host may want to react to (persisting the last
/// sync time, showing a message).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Completion {
    Sync(Finished),
    Clean(Finished),
}

#[derive(Debug)]
pub struct SessionController {
    sync: SyncSession,
    probe: ProbeState,
    clean: CleanState,
    config: ConfigDocument,
    log: LogView,
    pending_delete: Option<usize>,
    last_synced: Option<String>,
}

impl SessionController {
    pub fn new(config: ConfigDocument, last_synced: Option<String>) -> Self {
        Self {
            sync: SyncSession::default(),
            probe: ProbeState::Idle,
            clean: CleanState::Idle,
            config,
            log: LogView::default(),
            pending_delete: None,
            last_synced,
        }
    }

    pub fn config(&self) -> &ConfigDocument {
        &self.config
    }

    pub fn tasks(&self) -> &[Task] {
        &self.config.tasks
    }

    /// Replaces the working copy, e.g. after the worker rewrote the file.
    pub fn reload(&mut self, config: ConfigDocument) {
        self.config = config;
        self.pending_delete = None;
    }

    pub fn sync(&self) -> &SyncSession {
        &self.sync
    }

    pub fn is_syncing(&self) -> bool {
        self.sync.is_running()
    }

    pub fn probe(&self) -> &ProbeState {
        &self.probe
    }

    pub fn clean(&self) -> CleanState {
        self.clean
    }

    pub fn log(&self) -> &LogView {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut LogView {
        &mut self.log
    }

    pub fn last_synced(&self) -> Option<&str> {
        self.last_synced.as_deref()
    }

    /// `idle → syncing`. Returns the request to send, or `None` while a sync
    /// or a cleanup is already running.
    pub fn request_sync(&mut self, force: bool) -> Option<RunSyncRequest> {
        if self.is_syncing() {
            warn!(session = %self.sync.id, "Sync already running");
            return None;
        }
        if self.clean == CleanState::Running {
            warn!("Sync requested during cleanup");
            self.log.push(
                LineKind::System,
                "Sync is unavailable while cleanup is running",
            );
            return None;
        }
        let request = RunSyncRequest::new(force);
        self.sync = SyncSession::start(&request);
        let label = if force { "Starting forced sync" } else { "Starting sync" };
        self.log.push(LineKind::System, label);
        info!(session = %request.session_id, force, "Sync requested");
        Some(request)
    }

    /// Resets a finished session back to idle.
    pub fn acknowledge(&mut self) {
        if !self.is_syncing() {
            self.sync = SyncSession::default();
        }
    }

    pub fn on_event(&mut self, event: BridgeEvent) -> Option<Completion> {
        match event {
            BridgeEvent::SyncLog(line) => {
                self.log.push_line(&line);
                if line.origin == Origin::Sync {
                    self.sync.record_line(line);
                }
                None
            }
            BridgeEvent::SyncFinished(finished) => {
                if !self.sync.finish(&finished) {
                    warn!("Ignoring sync-finished without a running session");
                    return None;
                }
                if finished.success {
                    self.last_synced = Some(crate::ui_state::now_rfc3339());
                    self.log.push(LineKind::System, "Sync finished");
                } else {
                    self.log.push(
                        LineKind::System,
                        format!("Sync failed{}", exit_code_suffix(finished.exit_code)),
                    );
                }
                info!(
                    session = %self.sync.id,
                    success = finished.success,
                    exit_code = ?finished.exit_code,
                    "Sync session closed"
                );
                Some(Completion::Sync(finished))
            }
            BridgeEvent::CleanFinished(finished) => {
                self.clean = CleanState::Done(finished);
                let text = if finished.success {
                    "Cleanup finished".to_string()
                } else {
                    format!("Cleanup failed{}", exit_code_suffix(finished.exit_code))
                };
                self.log.push(LineKind::System, text);
                Some(Completion::Clean(finished))
            }
        }
    }

    pub fn begin_probe(&mut self) -> bool {
        if self.probe == ProbeState::Running {
            return false;
        }
        self.probe = ProbeState::Running;
        true
    }

    pub fn finish_probe(&mut self, result: HealthCheckResult) {
        self.probe = ProbeState::Done(result);
    }

    /// Cleanup is refused while a sync is live.
    pub fn begin_clean(&mut self) -> bool {
        if self.clean == CleanState::Running {
            return false;
        }
        if self.is_syncing() {
            self.log.push(
                LineKind::System,
                "Cleanup is unavailable while a sync is running",
            );
            return false;
        }
        self.clean = CleanState::Running;
        self.log.push(LineKind::System, "Starting cleanup");
        true
    }

    pub fn add_task(&mut self, task: Task, writer: &dyn ConfigWriter) -> anyhow::Result<usize> {
        task.validate()?;
        let note = task.note.clone();
        self.config.tasks.push(task);
        if let Err(err) = self.persist_tasks(writer) {
            self.config.tasks.pop();
            return Err(err);
        }
        let index = self.config.tasks.len() - 1;
        info!(index, task = %note, "Task added");
        Ok(index)
    }

    pub fn edit_task(
        &mut self,
        index: usize,
        task: Task,
        writer: &dyn ConfigWriter,
    ) -> anyhow::Result<()> {
        task.validate()?;
        let slot = self
            .config
            .tasks
            .get_mut(index)
            .with_context(|| format!("no task at index {index}"))?;
        let previous = std::mem::replace(slot, task);
        if let Err(err) = self.persist_tasks(writer) {
            self.config.tasks[index] = previous;
            return Err(err);
        }
        info!(index, task = %self.config.tasks[index].note, "Task updated");
        Ok(())
    }

    pub fn toggle_task(&mut self, index: usize, writer: &dyn ConfigWriter) -> anyhow::Result<bool> {
        let task = self
            .config
            .tasks
            .get_mut(index)
            .with_context(|| format!("no task at index {index}"))?;
        task.enabled = !task.enabled;
        let enabled = task.enabled;
        if let Err(err) = self.persist_tasks(writer) {
            self.config.tasks[index].enabled = !enabled;
            return Err(err);
        }
        info!(index, enabled, "Task toggled");
        Ok(enabled)
    }

    /// First step of a delete; nothing changes until `confirm_delete`.
    pub fn request_delete(&mut self, index: usize) -> anyhow::Result<&Task> {
        let task = self
            .config
            .tasks
            .get(index)
            .with_context(|| format!("no task at index {index}"))?;
        self.pending_delete = Some(index);
        Ok(task)
    }

    pub fn pending_delete(&self) -> Option<usize> {
        self.pending_delete
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    pub fn confirm_delete(&mut self, writer: &dyn ConfigWriter) -> anyhow::Result<Task> {
        let index = self
            .pending_delete
            .take()
            .context("no delete awaiting confirmation")?;
        if index >= self.config.tasks.len() {
            anyhow::bail!("no task at index {index}");
        }
        let removed = self.config.tasks.remove(index);
        if let Err(err) = self.persist_tasks(writer) {
            self.config.tasks.insert(index, removed);
            return Err(err);
        }
        info!(index, task = %removed.note, "Task deleted");
        Ok(removed)
    }

    /// Saves only the two credential keys.
    pub fn save_credentials(
        &mut self,
        app_id: &str,
        app_secret: &str,
        writer: &dyn ConfigWriter,
    ) -> anyhow::Result<()> {
        let app_id = app_id.trim();
        let app_secret = app_secret.trim();
        writer.write(&ConfigPatch::credentials(app_id, app_secret))?;
        self.config.app_id = app_id.to_string();
        self.config.app_secret = app_secret.to_string();
        info!("Credentials saved");
        Ok(())
    }

    /// Refused while the loaded list is missing entries that failed to
    /// decode, since the write would replace them on disk.
    fn persist_tasks(&self, writer: &dyn ConfigWriter) -> anyhow::Result<()> {
        if self.config.unreadable_tasks > 0 {
            anyhow::bail!(
                "{} task(s) in the config could not be read; fix the file before editing tasks",
                self.config.unreadable_tasks
            );
        }
        writer
            .write(&ConfigPatch::tasks(self.config.tasks.clone()))
            .context("save tasks")
    }
}

fn exit_code_suffix(exit_code: Option<i32>) -> String {
    exit_code
        .map(|code| format!(" (exit code {code})"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsync_core::config::TaskValidationError;
    use docsync_core::events::{LogLine, OutputStream};
    use docsync_core::session::SessionStatus;
    use serde_json::{Value, json};
    use std::cell::RefCell;
    use std::fs;
    use tempfile::TempDir;

    #[derive(Default)]
    struct RecordingWriter {
        patches: RefCell<Vec<ConfigPatch>>,
        fail: bool,
    }

    impl ConfigWriter for RecordingWriter {
        fn write(&self, patch: &ConfigPatch) -> anyhow::Result<()> {
            if self.fail {
                anyhow::bail!("disk full");
            }
            self.patches.borrow_mut().push(patch.clone());
            Ok(())
        }
    }

    fn task(note: &str) -> Task {
        Task::new(note, format!("/notes/{note}"), format!("tok-{note}"))
    }

    fn log(line: &str) -> BridgeEvent {
        BridgeEvent::SyncLog(LogLine {
            origin: Origin::Sync,
            stream: OutputStream::Stdout,
            line: line.to_string(),
        })
    }

    #[test]
    fn second_sync_request_is_ignored_while_running() {
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        let first = controller.request_sync(true).unwrap();
        assert!(first.force);
        assert!(controller.request_sync(false).is_none());
        assert_eq!(controller.sync().id, first.session_id);
    }

    #[test]
    fn finished_event_closes_session_and_records_last_synced() {
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        controller.request_sync(true).unwrap();
        assert!(controller.on_event(log("done")).is_none());
        let completion = controller.on_event(BridgeEvent::SyncFinished(Finished::from_exit_code(Some(0))));

        assert_eq!(
            completion,
            Some(Completion::Sync(Finished::from_exit_code(Some(0))))
        );
        assert_eq!(controller.sync().status, SessionStatus::Succeeded);
        assert_eq!(controller.sync().log_buffer.len(), 1);
        assert!(controller.last_synced().is_some());
        assert!(controller.request_sync(false).is_some());
    }

    #[test]
    fn duplicate_finish_is_ignored() {
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        controller.request_sync(false).unwrap();
        let failed = BridgeEvent::SyncFinished(Finished::from_exit_code(Some(2)));
        assert!(controller.on_event(failed.clone()).is_some());
        assert!(controller.on_event(failed).is_none());
        assert_eq!(controller.sync().status, SessionStatus::Failed);
        assert!(controller.last_synced().is_none());
    }

    #[test]
    fn acknowledge_resets_finished_session_only() {
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        controller.request_sync(false).unwrap();
        controller.acknowledge();
        assert!(controller.is_syncing());
        controller.on_event(BridgeEvent::SyncFinished(Finished::failed()));
        controller.acknowledge();
        assert_eq!(controller.sync().status, SessionStatus::Idle);
    }

    #[test]
    fn clean_is_refused_during_sync() {
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        controller.request_sync(false).unwrap();
        assert!(!controller.begin_clean());
        assert_eq!(controller.clean(), CleanState::Idle);
        controller.on_event(BridgeEvent::SyncFinished(Finished::from_exit_code(Some(0))));
        assert!(controller.begin_clean());
        assert!(!controller.begin_clean());
        controller.on_event(BridgeEvent::CleanFinished(Finished::from_exit_code(Some(0))));
        assert_eq!(
            controller.clean(),
            CleanState::Done(Finished::from_exit_code(Some(0)))
        );
    }

    #[test]
    fn sync_is_refused_during_cleanup() {
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        assert!(controller.begin_clean());
        assert!(controller.request_sync(false).is_none());
        assert!(!controller.is_syncing());
        assert_eq!(
            controller.log().entries().back().map(|entry| entry.text.as_str()),
            Some("Sync is unavailable while cleanup is running")
        );

        controller.on_event(BridgeEvent::CleanFinished(Finished::failed()));
        assert!(controller.request_sync(false).is_some());
    }

    #[test]
    fn probe_runs_one_at_a_time() {
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        assert!(controller.begin_probe());
        assert!(!controller.begin_probe());
        controller.finish_probe(HealthCheckResult {
            success: false,
            output: "Timeout".to_string(),
        });
        assert!(matches!(controller.probe(), ProbeState::Done(result) if result.output == "Timeout"));
        assert!(controller.begin_probe());
    }

    #[test]
    fn invalid_task_is_rejected_before_persistence() {
        let writer = RecordingWriter::default();
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        let err = controller
            .add_task(Task::new("", "/notes", "tok"), &writer)
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<TaskValidationError>(),
            Some(&TaskValidationError::MissingNote)
        );
        assert!(controller.tasks().is_empty());
        assert!(writer.patches.borrow().is_empty());
    }

    #[test]
    fn failed_write_rolls_back_working_copy() {
        let writer = RecordingWriter {
            fail: true,
            ..RecordingWriter::default()
        };
        let mut controller = SessionController::new(
            ConfigDocument {
                tasks: vec![task("a")],
                ..ConfigDocument::default()
            },
            None,
        );
        assert!(controller.add_task(task("b"), &writer).is_err());
        assert!(controller.toggle_task(0, &writer).is_err());
        controller.request_delete(0).unwrap();
        assert!(controller.confirm_delete(&writer).is_err());
        assert_eq!(controller.tasks(), &[task("a")]);
    }

    #[test]
    fn task_edits_write_only_the_task_list() {
        let writer = RecordingWriter::default();
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        controller.add_task(task("a"), &writer).unwrap();
        controller.edit_task(0, task("renamed"), &writer).unwrap();
        assert!(!controller.toggle_task(0, &writer).unwrap());

        let patches = writer.patches.borrow();
        assert_eq!(patches.len(), 3);
        assert!(patches.iter().all(|patch| patch.app_id.is_none() && patch.app_secret.is_none()));
        assert_eq!(patches[2].tasks.as_ref().unwrap()[0].note, "renamed");
        assert!(!patches[2].tasks.as_ref().unwrap()[0].enabled);
    }

    #[test]
    fn task_writes_are_refused_when_some_tasks_were_unreadable() {
        let writer = RecordingWriter::default();
        let mut controller = SessionController::new(
            ConfigDocument {
                app_id: "cli_x".to_string(),
                tasks: vec![task("a")],
                unreadable_tasks: 2,
                ..ConfigDocument::default()
            },
            None,
        );
        let err = controller.add_task(task("b"), &writer).unwrap_err();
        assert!(err.to_string().contains("2 task(s)"), "{err:#}");
        assert!(controller.toggle_task(0, &writer).is_err());
        assert_eq!(controller.tasks(), &[task("a")]);
        assert!(writer.patches.borrow().is_empty());

        controller.save_credentials("cli_y", "s", &writer).unwrap();
        assert_eq!(writer.patches.borrow().len(), 1);
    }

    #[test]
    fn delete_requires_confirmation() {
        let writer = RecordingWriter::default();
        let mut controller = SessionController::new(
            ConfigDocument {
                tasks: vec![task("a")],
                ..ConfigDocument::default()
            },
            None,
        );
        controller.request_delete(0).unwrap();
        controller.cancel_delete();
        assert!(controller.confirm_delete(&writer).is_err());
        assert_eq!(controller.tasks().len(), 1);
        assert!(controller.request_delete(5).is_err());
    }

    #[test]
    fn confirmed_delete_persists_empty_list_and_keeps_credentials() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sync_config.json");
        fs::write(
            &path,
            json!({
                "feishu_app_id": "cli_x",
                "feishu_app_secret": "s",
                "tasks": [{"note": "a", "local": "/notes", "cloud": "tok"}]
            })
            .to_string(),
        )
        .unwrap();
        let store = ConfigStore::new(&path);
        let mut controller = SessionController::new(store.load(), None);

        controller.request_delete(0).unwrap();
        let removed = controller.confirm_delete(&store).unwrap();
        assert_eq!(removed.note, "a");

        let saved: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["tasks"], json!([]));
        assert_eq!(saved["feishu_app_id"], "cli_x");
    }

    #[test]
    fn credentials_save_leaves_tasks_alone() {
        let writer = RecordingWriter::default();
        let mut controller = SessionController::new(ConfigDocument::default(), None);
        controller
            .save_credentials(" cli_x ", "secret", &writer)
            .unwrap();
        let patches = writer.patches.borrow();
        assert_eq!(patches[0].tasks, None);
        assert_eq!(patches[0].app_id.as_deref(), Some("cli_x"));
        assert_eq!(controller.config().app_id, "cli_x");
    }
}
