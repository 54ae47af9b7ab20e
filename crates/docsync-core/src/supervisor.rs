use crate::events::{BridgeEvent, EventSink, Finished, Origin, OutputStream};
use crate::launch::{CLEAN_ARG, FORCE_ARG, LaunchPlan, PROBE_ARG};
use crate::lockfile::LockFile;
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use time::OffsetDateTime;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Child;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(5000);
pub const PROBE_TIMEOUT_ENV: &str = "DOCSYNC_PROBE_TIMEOUT_MS";
pub const PROBE_TIMEOUT_MARKER: &str = "Timeout";

/// How long pipe readers may keep draining after the worker exits.
const READER_DRAIN: Duration = Duration::from_millis(1000);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("sync {0} is already running")]
    SyncAlreadyRunning(Uuid),
    #[error("sync lock {} is held by another process{}", .path.display(), holder_suffix(.holder))]
    SyncLockHeld { path: PathBuf, holder: Option<u32> },
    #[error("acquire sync lock")]
    Lock(#[source] anyhow::Error),
    #[error("failed to start `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("cleanup refused while sync {0} is running")]
    CleanDuringSync(Uuid),
    #[error("sync refused while cleanup is running")]
    SyncDuringClean,
    #[error("cleanup is already running")]
    CleanAlreadyRunning,
}

fn holder_suffix(holder: &Option<u32>) -> String {
    holder.map(|pid| format!(" (pid {pid})")).unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveSync {
    pub session_id: Uuid,
    pub pid: Option<u32>,
    pub started_at: OffsetDateTime,
    pub force: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProbeResult {
    pub ok: bool,
    pub output: String,
}

pub fn probe_timeout_from_env() -> Duration {
    env::var(PROBE_TIMEOUT_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|millis| *millis > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_PROBE_TIMEOUT)
}

/// What currently owns the working copy. Sync and cleanup exclude each other.
#[derive(Debug, Default)]
struct WorkerSlot {
    sync: Option<ActiveSync>,
    cleaning: bool,
}

/// Owns the worker launch plan and the single sync slot.
///
/// All spawning methods must run inside a tokio runtime.
#[derive(Debug)]
pub struct Supervisor {
    plan: LaunchPlan,
    sync_lock_path: Option<PathBuf>,
    slot: Arc<Mutex<WorkerSlot>>,
}

impl Supervisor {
    pub fn new(plan: LaunchPlan) -> Self {
        Self {
            plan,
            sync_lock_path: None,
            slot: Arc::new(Mutex::new(WorkerSlot::default())),
        }
    }

    /// Also guard syncs with a cross-process lock file.
    pub fn with_sync_lock(mut self, path: PathBuf) -> Self {
        self.sync_lock_path = Some(path);
        self
    }

    pub fn plan(&self) -> &LaunchPlan {
        &self.plan
    }

    pub fn active_sync(&self) -> Option<ActiveSync> {
        lock_slot(&self.slot).sync.clone()
    }

    pub fn is_sync_running(&self) -> bool {
        lock_slot(&self.slot).sync.is_some()
    }

    pub fn is_clean_running(&self) -> bool {
        lock_slot(&self.slot).cleaning
    }

    /// Starts the sync-mode worker and returns immediately.
    ///
    /// Log lines stream to `sink` as they are read. Exactly one
    /// `SyncFinished` follows them, after the slot has been released.
    pub fn spawn_sync(
        &self,
        session_id: Uuid,
        force: bool,
        sink: EventSink,
    ) -> Result<Uuid, SupervisorError> {
        let mut slot = lock_slot(&self.slot);
        if let Some(active) = slot.sync.as_ref() {
            return Err(SupervisorError::SyncAlreadyRunning(active.session_id));
        }
        if slot.cleaning {
            return Err(SupervisorError::SyncDuringClean);
        }
        let lock = self.acquire_sync_lock()?;

        let args = if force {
            vec![FORCE_ARG.to_string()]
        } else {
            Vec::new()
        };
        let mut child = self.spawn_worker(&args)?;
        let pid = child.id();
        slot.sync = Some(ActiveSync {
            session_id,
            pid,
            started_at: OffsetDateTime::now_utc(),
            force,
        });
        drop(slot);

        info!(session = %session_id, pid = ?pid, force, "started sync worker");
        let readers = attach_log_readers(&mut child, Origin::Sync, &sink);
        let worker_slot = Arc::clone(&self.slot);
        tokio::spawn(async move {
            let status = child.wait().await;
            drain_readers(readers).await;
            drop(lock);
            {
                let mut slot = lock_slot(&worker_slot);
                if slot.sync.as_ref().map(|active| active.session_id) == Some(session_id) {
                    slot.sync = None;
                }
            }
            let finished = match status {
                Ok(status) => Finished::from_exit_code(status.code()),
                Err(err) => {
                    sink.log(
                        Origin::Sync,
                        OutputStream::System,
                        format!("failed to wait for worker: {err}"),
                    );
                    Finished::failed()
                }
            };
            info!(
                session = %session_id,
                success = finished.success,
                exit_code = ?finished.exit_code,
                "sync worker finished"
            );
            sink.emit(BridgeEvent::SyncFinished(finished));
        });
        Ok(session_id)
    }

    /// Runs the worker's diagnostic mode, bounded by `deadline`.
    pub async fn spawn_probe(&self, deadline: Duration) -> ProbeResult {
        let args = vec![PROBE_ARG.to_string()];
        let mut child = match self.spawn_worker(&args) {
            Ok(child) => child,
            Err(err) => {
                return ProbeResult {
                    ok: false,
                    output: format!("{:#}", anyhow::Error::new(err)),
                };
            }
        };

        let output = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut readers = Vec::new();
        for pipe in [pipe_reader(child.stdout.take()), pipe_reader(child.stderr.take())] {
            let output = Arc::clone(&output);
            readers.push(spawn_line_reader(pipe, move |line| {
                output
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(line);
            }));
        }

        let started = Instant::now();
        match tokio::time::timeout_at(started + deadline, child.wait()).await {
            Ok(Ok(status)) => {
                drain_readers(readers).await;
                let lines = output.lock().unwrap_or_else(PoisonError::into_inner);
                debug!(
                    exit_code = ?status.code(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "probe finished"
                );
                ProbeResult {
                    ok: status.success(),
                    output: lines.join("\n"),
                }
            }
            Ok(Err(err)) => {
                for reader in &readers {
                    reader.abort();
                }
                ProbeResult {
                    ok: false,
                    output: format!("failed to wait for worker: {err}"),
                }
            }
            Err(_) => {
                warn!(timeout_ms = deadline.as_millis() as u64, "probe timed out, killing worker");
                kill_tree(&mut child).await;
                for reader in &readers {
                    reader.abort();
                }
                ProbeResult {
                    ok: false,
                    output: PROBE_TIMEOUT_MARKER.to_string(),
                }
            }
        }
    }

    /// Runs the worker's cleanup mode to completion, streaming its output.
    ///
    /// Holds the sync lock for the whole run, so a sync in another process
    /// refuses cleanup just like one in this process.
    pub async fn run_clean(&self, sink: &EventSink) -> Result<Finished, SupervisorError> {
        let (mut child, _lock, _cleaning) = {
            let mut slot = lock_slot(&self.slot);
            if let Some(active) = slot.sync.as_ref() {
                return Err(SupervisorError::CleanDuringSync(active.session_id));
            }
            if slot.cleaning {
                return Err(SupervisorError::CleanAlreadyRunning);
            }
            let lock = self.acquire_sync_lock()?;
            let child = self.spawn_worker(&[CLEAN_ARG.to_string()])?;
            slot.cleaning = true;
            (child, lock, CleaningGuard(Arc::clone(&self.slot)))
        };
        info!(pid = ?child.id(), "started cleanup worker");
        let readers = attach_log_readers(&mut child, Origin::Clean, sink);
        let status = child.wait().await;
        drain_readers(readers).await;
        let finished = match status {
            Ok(status) => Finished::from_exit_code(status.code()),
            Err(err) => {
                sink.log(
                    Origin::Clean,
                    OutputStream::System,
                    format!("failed to wait for worker: {err}"),
                );
                Finished::failed()
            }
        };
        info!(success = finished.success, exit_code = ?finished.exit_code, "cleanup finished");
        Ok(finished)
    }

    fn acquire_sync_lock(&self) -> Result<Option<LockFile>, SupervisorError> {
        let Some(path) = &self.sync_lock_path else {
            return Ok(None);
        };
        match LockFile::try_acquire(path).map_err(SupervisorError::Lock)? {
            Some(lock) => Ok(Some(lock)),
            None => Err(SupervisorError::SyncLockHeld {
                path: path.clone(),
                holder: LockFile::holder(path),
            }),
        }
    }

    fn spawn_worker(&self, args: &[String]) -> Result<Child, SupervisorError> {
        self.plan
            .command(args)
            .spawn()
            .map_err(|source| SupervisorError::Spawn {
                command: self.plan.debug_command(args).join(" "),
                source,
            })
    }
}

fn lock_slot(slot: &Mutex<WorkerSlot>) -> MutexGuard<'_, WorkerSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the cleanup flag even if the `run_clean` future is dropped.
struct CleaningGuard(Arc<Mutex<WorkerSlot>>);

impl Drop for CleaningGuard {
    fn drop(&mut self) {
        lock_slot(&self.0).cleaning = false;
    }
}

type Pipe = Box<dyn AsyncRead + Unpin + Send>;

fn pipe_reader<R: AsyncRead + Unpin + Send + 'static>(pipe: Option<R>) -> Option<Pipe> {
    pipe.map(|pipe| Box::new(pipe) as Pipe)
}

fn attach_log_readers(child: &mut Child, origin: Origin, sink: &EventSink) -> Vec<JoinHandle<()>> {
    let streams = [
        (pipe_reader(child.stdout.take()), OutputStream::Stdout),
        (pipe_reader(child.stderr.take()), OutputStream::Stderr),
    ];
    streams
        .into_iter()
        .map(|(pipe, stream)| {
            let sink = sink.clone();
            spawn_line_reader(pipe, move |line| sink.log(origin, stream, line))
        })
        .collect()
}

/// Forwards each `\n`-terminated line (and a trailing partial line) as soon
/// as it is read.
fn spawn_line_reader<F>(pipe: Option<Pipe>, mut on_line: F) -> JoinHandle<()>
where
    F: FnMut(String) + Send + 'static,
{
    tokio::spawn(async move {
        let Some(pipe) = pipe else {
            return;
        };
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => on_line(decode_line(&buf)),
                Err(err) => {
                    warn!(error = %err, "worker pipe read failed");
                    break;
                }
            }
        }
    })
}

fn decode_line(raw: &[u8]) -> String {
    let line = raw.strip_suffix(b"\n").unwrap_or(raw);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Waits for the pipe readers, but not past `READER_DRAIN`. A background
/// process the worker left behind may keep the pipes open indefinitely;
/// its later output is dropped.
async fn drain_readers(readers: Vec<JoinHandle<()>>) {
    let until = Instant::now() + READER_DRAIN;
    for mut reader in readers {
        match tokio::time::timeout_at(until, &mut reader).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => warn!(error = %err, "log reader task failed"),
            Err(_) => {
                debug!("output pipe still open after worker exit, abandoning reader");
                reader.abort();
            }
        }
    }
}

/// Kills the worker and everything it started. On unix the worker leads its
/// own process group, so the group is signalled before the direct child.
async fn kill_tree(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            let group = format!("-{pid}");
            let result = tokio::process::Command::new("kill")
                .args(["-KILL", "--", &group])
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .status()
                .await;
            match result {
                Ok(status) if !status.success() => {
                    debug!(pid, "process group already gone");
                }
                Ok(_) => {}
                Err(err) => warn!(pid, error = %err, "kill of worker process group failed"),
            }
        }
    }
    #[cfg(target_os = "windows")]
    {
        if let Some(pid) = child.id() {
            let result = tokio::process::Command::new("taskkill")
                .args(["/pid", &pid.to_string(), "/t", "/f"])
                .creation_flags(crate::launch::CREATE_NO_WINDOW)
                .status()
                .await;
            if let Err(err) = result {
                warn!(pid, error = %err, "taskkill failed");
            }
        }
    }
    if let Err(err) = child.kill().await {
        debug!(error = %err, "kill after timeout failed");
    }
}
