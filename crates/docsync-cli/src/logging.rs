use std::collections::VecDeque;
use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context as _;
use time::OffsetDateTime;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::prelude::*;

pub const LOG_FILE_NAME: &str = "docsync.log";

#[derive(Clone, Debug)]
pub struct LogEntry {
    pub timestamp: String,
    pub level: Level,
    pub target: String,
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    pub fn format_compact(&self) -> String {
        let message = self
            .fields
            .iter()
            .find(|(name, _)| name == "message")
            .map(|(_, value)| value.as_str())
            .unwrap_or("");
        let mut extras: Vec<String> = self
            .fields
            .iter()
            .filter(|(name, _)| name != "message")
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        extras.sort();
        let target = self
            .target
            .strip_prefix("docsync_")
            .unwrap_or(&self.target);
        if extras.is_empty() {
            format!("{} {:<5} {} {}", self.timestamp, self.level, target, message)
        } else {
            format!(
                "{} {:<5} {} {} | {}",
                self.timestamp,
                self.level,
                target,
                message,
                extras.join(" ")
            )
        }
    }
}

/// Bounded ring of recent tracing events, shown in the TUI diagnostics panel.
#[derive(Clone)]
pub struct LogBuffer {
    entries: Arc<Mutex<VecDeque<LogEntry>>>,
    max_entries: usize,
}

impl LogBuffer {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Arc::new(Mutex::new(VecDeque::new())),
            max_entries,
        }
    }

    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries
            .lock()
            .map(|entries| entries.iter().cloned().collect())
            .unwrap_or_default()
    }

    fn push(&self, entry: LogEntry) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push_back(entry);
            while entries.len() > self.max_entries {
                entries.pop_front();
            }
        }
    }
}

#[derive(Clone)]
pub struct LogLayer {
    buffer: LogBuffer,
}

impl LogLayer {
    pub fn new(buffer: LogBuffer) -> Self {
        Self { buffer }
    }
}

impl<S> Layer<S> for LogLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = LogVisitor::default();
        event.record(&mut visitor);
        let metadata = event.metadata();
        let entry = LogEntry {
            timestamp: format_timestamp(OffsetDateTime::now_utc()),
            level: *metadata.level(),
            target: metadata.target().to_string(),
            fields: visitor.fields,
        };
        self.buffer.push(entry);
    }
}

#[derive(Default)]
struct LogVisitor {
    fields: Vec<(String, String)>,
}

impl LogVisitor {
    fn push(&mut self, field: &tracing::field::Field, value: String) {
        self.fields.push((field.name().to_string(), value));
    }
}

impl tracing::field::Visit for LogVisitor {
    fn record_bool(&mut self, field: &tracing::field::Field, value: bool) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &tracing::field::Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &tracing::field::Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn Debug) {
        self.push(field, format!("{value:?}"));
    }
}

fn format_timestamp(timestamp: OffsetDateTime) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        timestamp.hour(),
        timestamp.minute(),
        timestamp.second()
    )
}

/// Where the human-readable log stream goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogOutput {
    Stderr,
    /// Used while the TUI owns the terminal.
    File(PathBuf),
}

/// Installs the global subscriber: env filter (default `info`), a fmt layer
/// for `output`, and the in-memory layer feeding `buffer`.
pub fn init(buffer: LogBuffer, output: &LogOutput) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(LogLayer::new(buffer));
    let installed = match output {
        LogOutput::Stderr => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogOutput::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).context("create log directory")?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
        }
    };
    installed.context("install tracing subscriber")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_compact_includes_fields() {
        let entry = LogEntry {
            timestamp: "12:34:56".to_string(),
            level: Level::INFO,
            target: "docsync_cli::tui".to_string(),
            fields: vec![
                ("message".to_string(), "Starting sync".to_string()),
                ("force".to_string(), "true".to_string()),
            ],
        };

        let formatted = entry.format_compact();
        assert!(formatted.contains("12:34:56"));
        assert!(formatted.contains("INFO"));
        assert!(formatted.contains("cli::tui"));
        assert!(formatted.contains("Starting sync"));
        assert!(formatted.contains("force=true"));
    }

    #[test]
    fn buffer_keeps_most_recent_entries() {
        let buffer = LogBuffer::new(2);
        for index in 0..3 {
            buffer.push(LogEntry {
                timestamp: "00:00:00".to_string(),
                level: Level::DEBUG,
                target: "docsync_core::supervisor".to_string(),
                fields: vec![("message".to_string(), format!("event {index}"))],
            });
        }
        let entries = buffer.entries();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].format_compact().ends_with("event 1"));
    }

    #[test]
    fn timestamp_is_zero_padded() {
        let timestamp = OffsetDateTime::UNIX_EPOCH + time::Duration::seconds(3_725);
        assert_eq!(format_timestamp(timestamp), "01:02:05");
    }
}
