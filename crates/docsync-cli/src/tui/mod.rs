use crate::logging::LogBuffer;
use crate::session::{CleanState, Completion, LineKind, ProbeState, SessionController};
use crate::ui_state::UiStateStore;
use anyhow::Context;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use docsync_core::bridge::{Bridge, HealthCheckResult};
use docsync_core::config::Task;
use docsync_core::deployment::RuntimeLayout;
use docsync_core::events::EventStream;
use docsync_core::launch::LaunchOverrides;
use docsync_core::picker::{BrowserEntry, FileFilter, PickKind, PickRequest, list_entries};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};
use std::collections::HashMap;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, error, info, warn};

const LOG_PANEL_HEIGHT: u16 = 7;
const LOG_PANEL_BORDER_HEIGHT: u16 = 2;
const LOG_HEADER_LINES: usize = 1;

pub fn run_tui(
    layout: &RuntimeLayout,
    runtime: &Runtime,
    ui_state: UiStateStore,
    log_buffer: LogBuffer,
) -> anyhow::Result<()> {
    let (picker, pick_prompts) = TuiPicker::channel();
    let (bridge, events) = Bridge::for_layout(
        layout,
        &LaunchOverrides::from_env(),
        Arc::new(picker),
        runtime.handle().clone(),
    )?;

    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    info!(config = %bridge.store().path().display(), "Starting TUI");
    let app = TuiApp::new(
        bridge,
        events,
        runtime.handle().clone(),
        ui_state,
        log_buffer,
        pick_prompts,
    );
    let result = run_app(&mut terminal, app);

    disable_raw_mode().ok();
    execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
    terminal.show_cursor().ok();

    if let Err(err) = &result {
        error!(error = %err, "TUI exited with error");
    }
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    mut app: TuiApp,
) -> anyhow::Result<()> {
    let mut last_tick = Instant::now();
    let tick_rate = Duration::from_millis(200);
    debug!(
        tick_rate_ms = tick_rate.as_millis(),
        "TUI event loop started"
    );

    loop {
        terminal.draw(|frame| app.draw(frame))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && app.handle_key(key)?
        {
            info!("Leaving TUI");
            return Ok(());
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        app.poll_bridge_events()?;
        app.poll_health_events()?;
        app.poll_pick_prompts()?;
        app.poll_pick_results()?;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
enum View {
    Main,
    Tasks,
    TaskForm,
    ConfirmDelete,
    Credentials,
    Browse,
    Message,
}

#[derive(Clone, Debug)]
struct InputField {
    label: &'static str,
    value: String,
    mask: bool,
}

impl InputField {
    fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            mask: false,
        }
    }

    fn with_mask(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            mask: true,
        }
    }

    fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn display_value(&self) -> String {
        if self.mask {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }

    fn push(&mut self, ch: char) {
        self.value.push(ch);
    }

    fn pop(&mut self) {
        self.value.pop();
    }
}

mod app_core;
mod draw;
mod handle;
mod helpers;
mod jobs;
mod picker;

use helpers::*;
use picker::{PickPrompt, TuiPicker};

struct TuiApp {
    bridge: Arc<Bridge>,
    events: EventStream,
    runtime: Handle,
    session: SessionController,
    ui_state: UiStateStore,
    log_buffer: LogBuffer,
    view: View,
    view_stack: Vec<View>,
    scroll_offsets: HashMap<View, usize>,
    message: String,
    validation_message: Option<String>,
    input_fields: Vec<InputField>,
    input_index: usize,
    task_index: usize,
    editing_task: Option<usize>,
    health_rx: Option<mpsc::Receiver<HealthCheckResult>>,
    pick_prompts: mpsc::Receiver<PickPrompt>,
    pick_rx: Option<mpsc::Receiver<Option<PathBuf>>>,
    pick_field: Option<usize>,
    browser: Option<BrowserState>,
}
