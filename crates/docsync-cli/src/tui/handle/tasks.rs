use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_tasks(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let len = self.session.tasks().len();
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Up => self.task_index = step_index(self.task_index, -1, len),
            KeyCode::Down => self.task_index = step_index(self.task_index, 1, len),
            KeyCode::Char('a') => self.open_task_form(None),
            KeyCode::Char('e') | KeyCode::Enter if len > 0 => {
                self.open_task_form(Some(self.task_index));
            }
            KeyCode::Char(' ') if len > 0 => {
                match self.session.toggle_task(self.task_index, self.bridge.store()) {
                    Ok(enabled) => {
                        let state = if enabled { "enabled" } else { "disabled" };
                        self.session
                            .log_mut()
                            .push(LineKind::System, format!("Task {} {state}", self.task_index));
                    }
                    Err(err) => {
                        error!(error = %format!("{err:#}"), "Toggle task failed");
                        self.show_message(format!("Could not save task: {err:#}"));
                    }
                }
            }
            KeyCode::Char('d') if len > 0 => {
                if let Err(err) = self.session.request_delete(self.task_index) {
                    warn!(error = %format!("{err:#}"), "Delete request rejected");
                    return Ok(false);
                }
                self.navigate_to(View::ConfirmDelete);
            }
            _ => {}
        }
        Ok(false)
    }

    pub(in crate::tui) fn handle_confirm_delete(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => {
                match self.session.confirm_delete(self.bridge.store()) {
                    Ok(removed) => {
                        self.task_index =
                            clamp_index(self.task_index, self.session.tasks().len());
                        self.session
                            .log_mut()
                            .push(LineKind::System, format!("Deleted task '{}'", removed.note));
                        self.go_back();
                    }
                    Err(err) => {
                        error!(error = %format!("{err:#}"), "Delete task failed");
                        self.go_back();
                        self.show_message(format!("Could not delete task: {err:#}"));
                    }
                }
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.session.cancel_delete();
                self.go_back();
            }
            _ => {}
        }
        Ok(false)
    }

    pub(in crate::tui) fn open_task_form(&mut self, index: Option<usize>) {
        let task = index.and_then(|index| self.session.tasks().get(index));
        self.input_fields = task_form_fields(task);
        self.input_index = 0;
        self.editing_task = index;
        self.validation_message = None;
        self.navigate_to(View::TaskForm);
    }
}
