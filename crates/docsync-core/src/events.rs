use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Every named channel between the UI and the core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    SelectFolder,
    SelectFile,
    GetConfig,
    SaveConfig,
    RunSync,
    SyncLog,
    SyncFinished,
    HealthCheck,
    RunClean,
    CleanFinished,
}

impl Channel {
    pub fn name(self) -> &'static str {
        match self {
            Channel::SelectFolder => "select-folder",
            Channel::SelectFile => "select-file",
            Channel::GetConfig => "get-config",
            Channel::SaveConfig => "save-config",
            Channel::RunSync => "run-sync",
            Channel::SyncLog => "sync-log",
            Channel::SyncFinished => "sync-finished",
            Channel::HealthCheck => "health-check",
            Channel::RunClean => "run-clean",
            Channel::CleanFinished => "clean-finished",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which worker invocation produced a log line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    Sync,
    Clean,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputStream {
    Stdout,
    Stderr,
    /// Lines produced by the control surface itself (spawn errors, refusals).
    System,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LogLine {
    pub origin: Origin,
    pub stream: OutputStream,
    pub line: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Finished {
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl Finished {
    pub fn from_exit_code(exit_code: Option<i32>) -> Self {
        Self {
            success: exit_code == Some(0),
            exit_code,
        }
    }

    pub fn failed() -> Self {
        Self {
            success: false,
            exit_code: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "channel", content = "payload", rename_all = "kebab-case")]
pub enum BridgeEvent {
    SyncLog(LogLine),
    SyncFinished(Finished),
    CleanFinished(Finished),
}

impl BridgeEvent {
    pub fn channel(&self) -> Channel {
        match self {
            BridgeEvent::SyncLog(_) => Channel::SyncLog,
            BridgeEvent::SyncFinished(_) => Channel::SyncFinished,
            BridgeEvent::CleanFinished(_) => Channel::CleanFinished,
        }
    }
}

/// Sending half of the core→UI subscription. Cheap to clone; one FIFO queue
/// behind all clones, so events from a single sender keep their order.
#[derive(Clone, Debug)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<BridgeEvent>,
}

impl EventSink {
    pub fn emit(&self, event: BridgeEvent) {
        let channel = event.channel();
        if self.tx.send(event).is_err() {
            debug!(channel = %channel, "event dropped, no subscriber");
        }
    }

    pub fn log(&self, origin: Origin, stream: OutputStream, line: impl Into<String>) {
        self.emit(BridgeEvent::SyncLog(LogLine {
            origin,
            stream,
            line: line.into(),
        }));
    }
}

/// Receiving half of the core→UI subscription.
#[derive(Debug)]
pub struct EventStream {
    rx: mpsc::UnboundedReceiver<BridgeEvent>,
}

impl EventStream {
    pub async fn next(&mut self) -> Option<BridgeEvent> {
        self.rx.recv().await
    }

    /// Non-blocking poll for tick-driven UIs.
    pub fn try_next(&mut self) -> Option<BridgeEvent> {
        self.rx.try_recv().ok()
    }
}

pub fn event_channel() -> (EventSink, EventStream) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSink { tx }, EventStream { rx })
}
