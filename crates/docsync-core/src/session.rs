use crate::bridge::RunSyncRequest;
use crate::events::{Finished, LogLine};
use std::collections::VecDeque;
use time::OffsetDateTime;
use uuid::Uuid;

/// Lines kept per session; older ones are dropped first.
pub const MAX_SESSION_LINES: usize = 5000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl SessionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SessionStatus::Idle => "idle",
            SessionStatus::Running => "running",
            SessionStatus::Succeeded => "succeeded",
            SessionStatus::Failed => "failed",
        }
    }
}

/// One sync invocation as seen by the UI.
#[derive(Clone, Debug, PartialEq)]
pub struct SyncSession {
    pub id: Uuid,
    pub status: SessionStatus,
    pub log_buffer: VecDeque<LogLine>,
    pub started_at: Option<OffsetDateTime>,
    pub finished_at: Option<OffsetDateTime>,
    pub exit_code: Option<i32>,
    pub force: bool,
}

impl Default for SyncSession {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            status: SessionStatus::Idle,
            log_buffer: VecDeque::new(),
            started_at: None,
            finished_at: None,
            exit_code: None,
            force: false,
        }
    }
}

impl SyncSession {
    pub fn start(request: &RunSyncRequest) -> Self {
        Self {
            id: request.session_id,
            status: SessionStatus::Running,
            started_at: Some(OffsetDateTime::now_utc()),
            force: request.force,
            ..Self::default()
        }
    }

    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Lines arriving after the terminal event are dropped.
    pub fn record_line(&mut self, line: LogLine) -> bool {
        if !self.is_running() {
            return false;
        }
        self.log_buffer.push_back(line);
        while self.log_buffer.len() > MAX_SESSION_LINES {
            self.log_buffer.pop_front();
        }
        true
    }

    /// Applies the terminal event. Returns false (and changes nothing) when
    /// the session is not running, so a duplicate finish is ignored.
    pub fn finish(&mut self, finished: &Finished) -> bool {
        if !self.is_running() {
            return false;
        }
        self.status = if finished.success {
            SessionStatus::Succeeded
        } else {
            SessionStatus::Failed
        };
        self.exit_code = finished.exit_code;
        self.finished_at = Some(OffsetDateTime::now_utc());
        true
    }

    pub fn duration(&self) -> Option<time::Duration> {
        Some(self.finished_at? - self.started_at?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Origin, OutputStream};

    fn line(text: &str) -> LogLine {
        LogLine {
            origin: Origin::Sync,
            stream: OutputStream::Stdout,
            line: text.to_string(),
        }
    }

    #[test]
    fn running_session_records_then_finishes_once() {
        let request = RunSyncRequest::new(true);
        let mut session = SyncSession::start(&request);
        assert!(session.is_running());
        assert!(session.force);
        assert!(session.record_line(line("done")));

        assert!(session.finish(&Finished::from_exit_code(Some(0))));
        assert_eq!(session.status, SessionStatus::Succeeded);
        assert!(!session.finish(&Finished::from_exit_code(Some(1))));
        assert_eq!(session.status, SessionStatus::Succeeded);
        assert!(!session.record_line(line("late")));
        assert_eq!(session.log_buffer.len(), 1);
        assert!(session.duration().is_some());
    }

    #[test]
    fn non_zero_exit_fails_with_code() {
        let mut session = SyncSession::start(&RunSyncRequest::new(false));
        session.finish(&Finished::from_exit_code(Some(3)));
        assert_eq!(session.status, SessionStatus::Failed);
        assert_eq!(session.exit_code, Some(3));
    }

    #[test]
    fn log_buffer_keeps_newest_lines() {
        let mut session = SyncSession::start(&RunSyncRequest::new(false));
        for index in 0..MAX_SESSION_LINES + 10 {
            session.record_line(line(&format!("line {index}")));
        }
        assert_eq!(session.log_buffer.len(), MAX_SESSION_LINES);
        assert_eq!(session.log_buffer.front().map(|l| l.line.as_str()), Some("line 10"));
    }

    #[test]
    fn idle_session_ignores_events() {
        let mut session = SyncSession::default();
        assert!(!session.finish(&Finished::failed()));
        assert_eq!(session.status, SessionStatus::Idle);
        assert_eq!(session.status.as_str(), "idle");
    }
}
