#![cfg(unix)]

use docsync_core::bridge::{Bridge, RunSyncRequest};
use docsync_core::config::ConfigStore;
use docsync_core::events::{
    BridgeEvent, EventStream, Finished, LogLine, Origin, OutputStream, event_channel,
};
use docsync_core::launch::{LaunchPlan, WorkerCommand};
use docsync_core::picker::NoPicker;
use docsync_core::supervisor::{PROBE_TIMEOUT_MARKER, Supervisor, SupervisorError};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tokio::runtime::Handle;
use uuid::Uuid;

const EVENT_WAIT: Duration = Duration::from_secs(10);

/// A worker that runs `script` under `sh -c`. The per-invocation argument
/// (`--force`, `--help`, `--clean`) lands in `$0`.
fn shell_plan(cwd: &Path, script: &str) -> LaunchPlan {
    LaunchPlan {
        worker: WorkerCommand {
            command: "sh".to_string(),
            args: vec!["-c".to_string(), script.to_string()],
        },
        cwd: cwd.to_path_buf(),
        env: vec![("PYTHONUNBUFFERED".to_string(), "1".to_string())],
        packaged_mode: false,
    }
}

async fn next_event(stream: &mut EventStream) -> BridgeEvent {
    tokio::time::timeout(EVENT_WAIT, stream.next())
        .await
        .expect("event before timeout")
        .expect("stream open")
}

/// Collects log lines until the first terminal event.
async fn collect_until_finished(stream: &mut EventStream) -> (Vec<LogLine>, BridgeEvent) {
    let mut lines = Vec::new();
    loop {
        match next_event(stream).await {
            BridgeEvent::SyncLog(line) => lines.push(line),
            terminal => return (lines, terminal),
        }
    }
}

fn texts(lines: &[LogLine], stream: OutputStream) -> Vec<String> {
    lines
        .iter()
        .filter(|line| line.stream == stream)
        .map(|line| line.line.clone())
        .collect()
}

#[tokio::test]
async fn forced_sync_logs_done_then_finishes_once() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), r#"test "$0" = --force && echo done"#));
    let (sink, mut stream) = event_channel();

    supervisor.spawn_sync(Uuid::new_v4(), true, sink).unwrap();
    let (lines, terminal) = collect_until_finished(&mut stream).await;

    assert_eq!(texts(&lines, OutputStream::Stdout), vec!["done"]);
    assert_eq!(
        terminal,
        BridgeEvent::SyncFinished(Finished {
            success: true,
            exit_code: Some(0),
        })
    );
    assert!(!supervisor.is_sync_running());
}

#[tokio::test]
async fn second_sync_is_rejected_without_extra_terminal_event() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), "sleep 0.5; echo first"));
    let (sink, mut stream) = event_channel();

    let first = Uuid::new_v4();
    supervisor.spawn_sync(first, false, sink.clone()).unwrap();
    assert_eq!(supervisor.active_sync().unwrap().session_id, first);

    let second = supervisor.spawn_sync(Uuid::new_v4(), false, sink.clone());
    assert!(matches!(second, Err(SupervisorError::SyncAlreadyRunning(id)) if id == first));

    let (lines, terminal) = collect_until_finished(&mut stream).await;
    assert_eq!(texts(&lines, OutputStream::Stdout), vec!["first"]);
    assert!(matches!(terminal, BridgeEvent::SyncFinished(Finished { success: true, .. })));
    assert!(
        tokio::time::timeout(Duration::from_millis(300), stream.next())
            .await
            .is_err()
    );

    // The slot is free again once the terminal event is out.
    supervisor.spawn_sync(Uuid::new_v4(), false, sink).unwrap();
    let (_, terminal) = collect_until_finished(&mut stream).await;
    assert!(matches!(terminal, BridgeEvent::SyncFinished(_)));
}

#[tokio::test]
async fn sync_lock_blocks_a_second_supervisor() {
    let tmp = TempDir::new().unwrap();
    let lock_path = tmp.path().join("run").join("sync.lock");
    let first = Supervisor::new(shell_plan(tmp.path(), "sleep 0.5"))
        .with_sync_lock(lock_path.clone());
    let second =
        Supervisor::new(shell_plan(tmp.path(), "echo never")).with_sync_lock(lock_path.clone());
    let (sink, mut stream) = event_channel();

    first.spawn_sync(Uuid::new_v4(), false, sink.clone()).unwrap();
    let blocked = second.spawn_sync(Uuid::new_v4(), false, sink.clone());
    match blocked {
        Err(SupervisorError::SyncLockHeld { path, holder }) => {
            assert_eq!(path, lock_path);
            assert_eq!(holder, Some(std::process::id()));
        }
        other => panic!("expected lock conflict, got {other:?}"),
    }

    collect_until_finished(&mut stream).await;
    second.spawn_sync(Uuid::new_v4(), false, sink).unwrap();
    let (lines, _) = collect_until_finished(&mut stream).await;
    assert_eq!(texts(&lines, OutputStream::Stdout), vec!["never"]);
}

#[tokio::test]
async fn per_stream_output_is_reproduced_in_order() {
    let tmp = TempDir::new().unwrap();
    let script = r#"i=0; while [ $i -lt 50 ]; do echo "out $i"; echo "err $i" >&2; i=$((i+1)); done; printf 'tail'"#;
    let supervisor = Supervisor::new(shell_plan(tmp.path(), script));
    let (sink, mut stream) = event_channel();

    supervisor.spawn_sync(Uuid::new_v4(), false, sink).unwrap();
    let (lines, _) = collect_until_finished(&mut stream).await;

    let mut expected_out: Vec<String> = (0..50).map(|i| format!("out {i}")).collect();
    expected_out.push("tail".to_string());
    let expected_err: Vec<String> = (0..50).map(|i| format!("err {i}")).collect();
    assert_eq!(texts(&lines, OutputStream::Stdout), expected_out);
    assert_eq!(texts(&lines, OutputStream::Stderr), expected_err);
    assert!(lines.iter().all(|line| line.origin == Origin::Sync));
}

#[tokio::test]
async fn non_zero_exit_fails_with_code() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), "echo broken >&2; exit 3"));
    let (sink, mut stream) = event_channel();

    supervisor.spawn_sync(Uuid::new_v4(), false, sink).unwrap();
    let (lines, terminal) = collect_until_finished(&mut stream).await;

    assert_eq!(texts(&lines, OutputStream::Stderr), vec!["broken"]);
    assert_eq!(
        terminal,
        BridgeEvent::SyncFinished(Finished {
            success: false,
            exit_code: Some(3),
        })
    );
}

#[tokio::test]
async fn probe_times_out_and_kills_worker() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), "sleep 1; touch marker"));

    let started = Instant::now();
    let result = supervisor.spawn_probe(Duration::from_millis(200)).await;
    let elapsed = started.elapsed();

    assert!(!result.ok);
    assert_eq!(result.output, PROBE_TIMEOUT_MARKER);
    assert!(elapsed >= Duration::from_millis(200));
    assert!(elapsed < Duration::from_millis(900), "took {elapsed:?}");

    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!tmp.path().join("marker").exists());
}

/// Whether `pid` is still a live process. Zombies count as gone.
#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => stat
            .rsplit_once(')')
            .and_then(|(_, rest)| rest.split_whitespace().next())
            .is_some_and(|state| state != "Z"),
        Err(_) => false,
    }
}

async fn wait_until(mut condition: impl FnMut() -> bool, what: &str) {
    let deadline = Instant::now() + EVENT_WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn probe_timeout_kills_the_workers_children() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(
        tmp.path(),
        "sleep 30 & echo $! > child.pid; wait",
    ));

    let result = supervisor.spawn_probe(Duration::from_millis(300)).await;
    assert_eq!(result.output, PROBE_TIMEOUT_MARKER);

    let pid: u32 = std::fs::read_to_string(tmp.path().join("child.pid"))
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    wait_until(|| !process_alive(pid), "the background child to die").await;
}

#[tokio::test]
async fn probe_collects_output_on_success() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), r#"echo "usage: $0""#));

    let result = supervisor.spawn_probe(Duration::from_secs(5)).await;
    assert!(result.ok);
    assert_eq!(result.output, "usage: --help");
}

#[tokio::test]
async fn probe_fails_on_non_zero_exit() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), "echo missing module >&2; exit 1"));

    let result = supervisor.spawn_probe(Duration::from_secs(5)).await;
    assert!(!result.ok);
    assert_eq!(result.output, "missing module");
}

#[tokio::test]
async fn clean_runs_with_clean_flag() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(
        tmp.path(),
        r#"test "$0" = --clean && echo cleaned"#,
    ));
    let (sink, mut stream) = event_channel();

    let finished = supervisor.run_clean(&sink).await.unwrap();
    assert!(finished.success);
    match next_event(&mut stream).await {
        BridgeEvent::SyncLog(line) => {
            assert_eq!(line.origin, Origin::Clean);
            assert_eq!(line.line, "cleaned");
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[tokio::test]
async fn clean_is_refused_during_sync() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), "sleep 0.3"));
    let (sink, mut stream) = event_channel();

    let session = Uuid::new_v4();
    supervisor.spawn_sync(session, false, sink.clone()).unwrap();
    let refused = supervisor.run_clean(&sink).await;
    assert!(matches!(refused, Err(SupervisorError::CleanDuringSync(id)) if id == session));
    collect_until_finished(&mut stream).await;
}

#[tokio::test]
async fn sync_is_refused_while_clean_runs() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Arc::new(Supervisor::new(shell_plan(tmp.path(), "sleep 0.5")));
    let (sink, mut stream) = event_channel();

    let cleaning = {
        let supervisor = Arc::clone(&supervisor);
        let sink = sink.clone();
        tokio::spawn(async move { supervisor.run_clean(&sink).await })
    };
    wait_until(|| supervisor.is_clean_running(), "cleanup to start").await;

    let refused = supervisor.spawn_sync(Uuid::new_v4(), false, sink.clone());
    assert!(matches!(refused, Err(SupervisorError::SyncDuringClean)));
    assert!(!supervisor.is_sync_running());
    let second_clean = supervisor.run_clean(&sink).await;
    assert!(matches!(second_clean, Err(SupervisorError::CleanAlreadyRunning)));

    assert!(cleaning.await.unwrap().unwrap().success);
    assert!(!supervisor.is_clean_running());
    supervisor.spawn_sync(Uuid::new_v4(), false, sink).unwrap();
    let (_, terminal) = collect_until_finished(&mut stream).await;
    assert!(matches!(terminal, BridgeEvent::SyncFinished(Finished { success: true, .. })));
}

#[tokio::test]
async fn clean_is_refused_while_another_process_syncs() {
    let tmp = TempDir::new().unwrap();
    let lock_path = tmp.path().join("run").join("sync.lock");
    let syncing =
        Supervisor::new(shell_plan(tmp.path(), "sleep 0.5")).with_sync_lock(lock_path.clone());
    let cleaning =
        Supervisor::new(shell_plan(tmp.path(), "echo cleaned")).with_sync_lock(lock_path.clone());
    let (sink, mut stream) = event_channel();

    syncing.spawn_sync(Uuid::new_v4(), false, sink.clone()).unwrap();
    match cleaning.run_clean(&sink).await {
        Err(SupervisorError::SyncLockHeld { path, .. }) => assert_eq!(path, lock_path),
        other => panic!("expected lock conflict, got {other:?}"),
    }

    collect_until_finished(&mut stream).await;
    assert!(cleaning.run_clean(&sink).await.unwrap().success);
}

#[tokio::test]
async fn sync_is_refused_while_another_process_cleans() {
    let tmp = TempDir::new().unwrap();
    let lock_path = tmp.path().join("sync.lock");
    let cleaning = Arc::new(
        Supervisor::new(shell_plan(tmp.path(), "sleep 0.5")).with_sync_lock(lock_path.clone()),
    );
    let syncing =
        Supervisor::new(shell_plan(tmp.path(), "echo never")).with_sync_lock(lock_path.clone());
    let (sink, _stream) = event_channel();

    let running = {
        let cleaning = Arc::clone(&cleaning);
        let sink = sink.clone();
        tokio::spawn(async move { cleaning.run_clean(&sink).await })
    };
    wait_until(|| cleaning.is_clean_running(), "cleanup to start").await;

    let refused = syncing.spawn_sync(Uuid::new_v4(), false, sink);
    assert!(matches!(refused, Err(SupervisorError::SyncLockHeld { .. })));
    assert!(running.await.unwrap().unwrap().success);
}

#[tokio::test]
async fn sync_finishes_while_a_background_child_holds_the_pipe() {
    let tmp = TempDir::new().unwrap();
    let supervisor = Supervisor::new(shell_plan(tmp.path(), "sleep 5 & echo started"));
    let (sink, mut stream) = event_channel();

    let started = Instant::now();
    supervisor.spawn_sync(Uuid::new_v4(), false, sink).unwrap();
    let (lines, terminal) = collect_until_finished(&mut stream).await;

    assert_eq!(texts(&lines, OutputStream::Stdout), vec!["started"]);
    assert!(matches!(terminal, BridgeEvent::SyncFinished(Finished { success: true, .. })));
    assert!(started.elapsed() < Duration::from_secs(4), "took {:?}", started.elapsed());
    assert!(!supervisor.is_sync_running());
}

#[tokio::test]
async fn bridge_reports_spawn_failure_as_failed_finish() {
    let tmp = TempDir::new().unwrap();
    let plan = LaunchPlan {
        worker: WorkerCommand {
            command: tmp.path().join("no-such-worker").to_string_lossy().to_string(),
            args: Vec::new(),
        },
        cwd: tmp.path().to_path_buf(),
        env: Vec::new(),
        packaged_mode: true,
    };
    let (bridge, mut stream) = Bridge::new(
        ConfigStore::new(tmp.path().join("sync_config.json")),
        Supervisor::new(plan),
        Arc::new(NoPicker),
        Handle::current(),
    );

    bridge.run_sync(RunSyncRequest::new(false));
    let (lines, terminal) = collect_until_finished(&mut stream).await;

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].stream, OutputStream::System);
    assert!(lines[0].line.contains("failed to start"));
    assert_eq!(terminal, BridgeEvent::SyncFinished(Finished::failed()));
}

#[tokio::test]
async fn bridge_clean_emits_clean_finished() {
    let tmp = TempDir::new().unwrap();
    let (bridge, mut stream) = Bridge::new(
        ConfigStore::new(tmp.path().join("sync_config.json")),
        Supervisor::new(shell_plan(tmp.path(), "exit 4")),
        Arc::new(NoPicker),
        Handle::current(),
    );

    bridge.run_clean();
    let (_, terminal) = collect_until_finished(&mut stream).await;
    assert_eq!(
        terminal,
        BridgeEvent::CleanFinished(Finished {
            success: false,
            exit_code: Some(4),
        })
    );
}

#[tokio::test]
async fn bridge_health_check_honors_probe_timeout() {
    let tmp = TempDir::new().unwrap();
    let (bridge, _stream) = Bridge::new(
        ConfigStore::new(tmp.path().join("sync_config.json")),
        Supervisor::new(shell_plan(tmp.path(), "sleep 5")),
        Arc::new(NoPicker),
        Handle::current(),
    );
    let bridge = bridge.with_probe_timeout(Duration::from_millis(150));

    let result = bridge.health_check().await;
    assert!(!result.success);
    assert_eq!(result.output, "Timeout");
}
