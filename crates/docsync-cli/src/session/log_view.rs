use docsync_core::events::{LogLine, Origin, OutputStream};
use std::collections::VecDeque;

pub const PLACEHOLDER: &str = "No worker output yet.";
pub const MAX_LOG_LINES: usize = 2000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Stdout,
    Stderr,
    System,
    Placeholder,
}

impl From<OutputStream> for LineKind {
    fn from(stream: OutputStream) -> Self {
        match stream {
            OutputStream::Stdout => LineKind::Stdout,
            OutputStream::Stderr => LineKind::Stderr,
            OutputStream::System => LineKind::System,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogViewEntry {
    pub kind: LineKind,
    pub text: String,
}

/// Bounded worker log with a scroll position that sticks to the bottom
/// only while the reader is already there.
#[derive(Clone, Debug)]
pub struct LogView {
    entries: VecDeque<LogViewEntry>,
    scroll: usize,
    viewport: usize,
}

impl Default for LogView {
    fn default() -> Self {
        Self {
            entries: VecDeque::from([placeholder()]),
            scroll: 0,
            viewport: 1,
        }
    }
}

impl LogView {
    pub fn push(&mut self, kind: LineKind, text: impl Into<String>) {
        let follow = self.is_at_bottom();
        if self.is_placeholder() {
            self.entries.clear();
        }
        self.entries.push_back(LogViewEntry {
            kind,
            text: text.into(),
        });
        while self.entries.len() > MAX_LOG_LINES {
            self.entries.pop_front();
            // Keep the same lines on screen while scrolled up.
            self.scroll = self.scroll.saturating_sub(1);
        }
        if follow {
            self.scroll = self.max_scroll();
        }
    }

    pub fn push_line(&mut self, line: &LogLine) {
        let text = match line.origin {
            Origin::Sync => line.line.clone(),
            Origin::Clean => format!("[clean] {}", line.line),
        };
        self.push(line.stream.into(), text);
    }

    pub fn clear(&mut self) {
        self.entries = VecDeque::from([placeholder()]);
        self.scroll = 0;
    }

    pub fn entries(&self) -> &VecDeque<LogViewEntry> {
        &self.entries
    }

    pub fn is_placeholder(&self) -> bool {
        self.entries.len() == 1
            && self
                .entries
                .front()
                .is_some_and(|entry| entry.kind == LineKind::Placeholder)
    }

    pub fn scroll(&self) -> usize {
        self.scroll
    }

    /// Called by the renderer with the number of visible rows.
    pub fn set_viewport(&mut self, height: usize) {
        let follow = self.is_at_bottom();
        self.viewport = height.max(1);
        self.scroll = if follow {
            self.max_scroll()
        } else {
            self.scroll.min(self.max_scroll())
        };
    }

    pub fn max_scroll(&self) -> usize {
        self.entries.len().saturating_sub(self.viewport)
    }

    pub fn is_at_bottom(&self) -> bool {
        self.scroll >= self.max_scroll()
    }

    pub fn scroll_by(&mut self, delta: isize) {
        let next = if delta.is_negative() {
            self.scroll.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll.saturating_add(delta as usize)
        };
        self.scroll = next.min(self.max_scroll());
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = self.max_scroll();
    }

    pub fn visible(&self) -> impl Iterator<Item = &LogViewEntry> {
        let start = self.scroll.min(self.entries.len());
        let end = (start + self.viewport).min(self.entries.len());
        self.entries.range(start..end)
    }
}

fn placeholder() -> LogViewEntry {
    LogViewEntry {
        kind: LineKind::Placeholder,
        text: PLACEHOLDER.to_string(),
    }
}
