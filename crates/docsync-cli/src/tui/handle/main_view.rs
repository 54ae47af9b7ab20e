use super::*;

const PAGE: isize = 10;

impl TuiApp {
    pub(in crate::tui) fn handle_main(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Ok(true);
        }
        match key.code {
            KeyCode::Char('q') => return Ok(true),
            KeyCode::Char('s') => self.start_sync(false),
            KeyCode::Char('f') => self.start_sync(true),
            KeyCode::Char('h') => self.start_health_check(),
            KeyCode::Char('c') => self.start_clean(),
            KeyCode::Char('x') => self.session.log_mut().clear(),
            KeyCode::Char('a') => self.session.acknowledge(),
            KeyCode::Char('r') => self.reload_config(),
            KeyCode::Char('t') => {
                self.task_index = clamp_index(self.task_index, self.session.tasks().len());
                self.navigate_to(View::Tasks);
            }
            KeyCode::Char('k') => {
                self.validation_message = None;
                self.input_fields = credentials_fields(&self.session.config().app_id);
                self.input_index = 0;
                self.navigate_to(View::Credentials);
            }
            KeyCode::Up => self.session.log_mut().scroll_by(-1),
            KeyCode::Down => self.session.log_mut().scroll_by(1),
            KeyCode::PageUp => self.session.log_mut().scroll_by(-PAGE),
            KeyCode::PageDown => self.session.log_mut().scroll_by(PAGE),
            KeyCode::Home => self.session.log_mut().scroll_to_top(),
            KeyCode::End => self.session.log_mut().scroll_to_bottom(),
            _ => {}
        }
        Ok(false)
    }
}
