use super::*;

impl TuiApp {
    pub(in crate::tui) fn start_sync(&mut self, force: bool) {
        if self.session.tasks().iter().all(|task| !task.is_actionable()) {
            warn!("Sync requested without enabled tasks");
            self.session
                .log_mut()
                .push(LineKind::System, "No enabled tasks; the worker may have nothing to do");
        }
        let already_syncing = self.session.is_syncing();
        let Some(request) = self.session.request_sync(force) else {
            if already_syncing {
                self.session
                    .log_mut()
                    .push(LineKind::System, "A sync is already running");
            }
            return;
        };
        info!(session = %request.session_id, force, "Starting sync");
        self.bridge.run_sync(request);
    }

    pub(in crate::tui) fn start_health_check(&mut self) {
        if !self.session.begin_probe() {
            debug!("Health check already running");
            return;
        }
        info!(
            timeout_ms = self.bridge.probe_timeout().as_millis() as u64,
            "Starting health check"
        );
        let (tx, rx) = mpsc::channel::<HealthCheckResult>();
        self.health_rx = Some(rx);
        let bridge = Arc::clone(&self.bridge);
        self.runtime.spawn(async move {
            let result = bridge.health_check().await;
            let _ = tx.send(result);
        });
    }

    pub(in crate::tui) fn start_clean(&mut self) {
        if !self.session.begin_clean() {
            warn!("Cleanup not started");
            return;
        }
        info!("Starting cleanup");
        self.bridge.run_clean();
    }

    /// Asks the bridge for a path; the answer is routed into `field` of the
    /// task form once the chooser closes.
    pub(in crate::tui) fn start_pick(&mut self, kind: PickKind, field: usize) {
        if self.pick_rx.is_some() {
            debug!("Picker already open");
            return;
        }
        info!(kind = ?kind, field, "Opening picker");
        let (tx, rx) = mpsc::channel::<Option<PathBuf>>();
        self.pick_rx = Some(rx);
        self.pick_field = Some(field);
        let bridge = Arc::clone(&self.bridge);
        self.runtime.spawn(async move {
            let picked = match kind {
                PickKind::Folder => bridge.select_folder().await,
                PickKind::File(_) => bridge.select_file().await,
            };
            let _ = tx.send(picked);
        });
    }
}
