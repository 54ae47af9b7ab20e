use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if key.kind != KeyEventKind::Press {
            return Ok(false);
        }
        match self.view {
            View::Main => self.handle_main(key),
            View::Tasks => self.handle_tasks(key),
            View::TaskForm => self.handle_task_form(key),
            View::ConfirmDelete => self.handle_confirm_delete(key),
            View::Credentials => self.handle_credentials(key),
            View::Browse => self.handle_browse(key),
            View::Message => self.handle_message(key),
        }
    }

    pub(in crate::tui) fn handle_message(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.go_back(),
            KeyCode::Up => self.scroll_by(View::Message, -1),
            KeyCode::Down => self.scroll_by(View::Message, 1),
            KeyCode::Home => self.set_scroll_offset(View::Message, 0),
            _ => {}
        }
        Ok(false)
    }
}
