use super::*;

impl TuiApp {
    pub(in crate::tui) fn poll_bridge_events(&mut self) -> anyhow::Result<()> {
        while let Some(event) = self.events.try_next() {
            if let Some(completion) = self.session.on_event(event) {
                self.on_completion(completion);
            }
        }
        Ok(())
    }

    fn on_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Sync(finished) => {
                info!(
                    success = finished.success,
                    exit_code = ?finished.exit_code,
                    "Sync completed"
                );
                if finished.success
                    && let Some(timestamp) = self.session.last_synced()
                    && let Err(err) = self.ui_state.record_sync(timestamp)
                {
                    warn!(error = %format!("{err:#}"), "Failed to record last sync time");
                }
            }
            Completion::Clean(finished) => {
                info!(
                    success = finished.success,
                    exit_code = ?finished.exit_code,
                    "Cleanup completed"
                );
            }
        }
    }

    pub(in crate::tui) fn poll_health_events(&mut self) -> anyhow::Result<()> {
        let Some(rx) = self.health_rx.take() else {
            return Ok(());
        };
        match rx.try_recv() {
            Ok(result) => {
                if result.success {
                    info!("Health check passed");
                } else {
                    warn!(output = %result.output, "Health check failed");
                }
                self.session.finish_probe(result);
            }
            Err(mpsc::TryRecvError::Empty) => self.health_rx = Some(rx),
            Err(mpsc::TryRecvError::Disconnected) => {
                error!("Health check task ended without a result");
                self.session.finish_probe(HealthCheckResult {
                    success: false,
                    output: "health check task ended unexpectedly".to_string(),
                });
            }
        }
        Ok(())
    }

    pub(in crate::tui) fn poll_pick_prompts(&mut self) -> anyhow::Result<()> {
        if self.browser.is_some() {
            return Ok(());
        }
        if let Ok(prompt) = self.pick_prompts.try_recv() {
            debug!(title = prompt.request.title(), "Opening browser");
            self.browser = Some(BrowserState::open(prompt));
            self.set_scroll_offset(View::Browse, 0);
            self.navigate_to(View::Browse);
        }
        Ok(())
    }

    pub(in crate::tui) fn poll_pick_results(&mut self) -> anyhow::Result<()> {
        let Some(rx) = self.pick_rx.take() else {
            return Ok(());
        };
        let picked = match rx.try_recv() {
            Ok(picked) => picked,
            Err(mpsc::TryRecvError::Empty) => {
                self.pick_rx = Some(rx);
                return Ok(());
            }
            Err(mpsc::TryRecvError::Disconnected) => None,
        };
        let field = self.pick_field.take();
        match (picked, field) {
            (Some(path), Some(field)) => {
                info!(path = %path.display(), field, "Picked path");
                if let Some(input) = self.input_fields.get_mut(field) {
                    input.value = path.display().to_string();
                    self.input_index = field;
                }
            }
            _ => debug!("Picker cancelled"),
        }
        Ok(())
    }
}
