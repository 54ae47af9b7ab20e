use super::*;

impl TuiApp {
    pub(super) fn new(
        bridge: Bridge,
        events: EventStream,
        runtime: Handle,
        ui_state: UiStateStore,
        log_buffer: LogBuffer,
        pick_prompts: mpsc::Receiver<PickPrompt>,
    ) -> Self {
        let config = bridge.store().load();
        let last_synced = ui_state.load().last_synced;
        info!(
            tasks = config.tasks.len(),
            last_synced = last_synced.as_deref().unwrap_or("never"),
            "Loaded TUI state"
        );
        Self {
            bridge: Arc::new(bridge),
            events,
            runtime,
            session: SessionController::new(config, last_synced),
            ui_state,
            log_buffer,
            view: View::Main,
            view_stack: Vec::new(),
            scroll_offsets: HashMap::new(),
            message: String::new(),
            validation_message: None,
            input_fields: Vec::new(),
            input_index: 0,
            task_index: 0,
            editing_task: None,
            health_rx: None,
            pick_prompts,
            pick_rx: None,
            pick_field: None,
            browser: None,
        }
    }

    pub(in crate::tui) fn navigate_to(&mut self, view: View) {
        if self.view != view {
            self.view_stack.push(self.view);
            self.view = view;
        }
    }

    pub(in crate::tui) fn go_back(&mut self) {
        self.view = self.view_stack.pop().unwrap_or(View::Main);
    }

    pub(in crate::tui) fn show_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.set_scroll_offset(View::Message, 0);
        self.navigate_to(View::Message);
    }

    pub(in crate::tui) fn scroll_offset(&self, view: View) -> usize {
        self.scroll_offsets.get(&view).copied().unwrap_or(0)
    }

    pub(in crate::tui) fn set_scroll_offset(&mut self, view: View, offset: usize) {
        self.scroll_offsets.insert(view, offset);
    }

    pub(in crate::tui) fn scroll_by(&mut self, view: View, delta: isize) {
        let current = self.scroll_offset(view);
        let next = if delta.is_negative() {
            current.saturating_sub(delta.unsigned_abs())
        } else {
            current.saturating_add(delta as usize)
        };
        self.set_scroll_offset(view, next);
    }

    pub(in crate::tui) fn reload_config(&mut self) {
        let config = self.bridge.store().load();
        info!(tasks = config.tasks.len(), "Reloaded config");
        self.session.reload(config);
        self.task_index = clamp_index(self.task_index, self.session.tasks().len());
    }
}
