use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_task_form(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('o') => {
                    let field = pick_target_field(self.input_index, PickKind::Folder);
                    self.start_pick(PickKind::Folder, field);
                }
                KeyCode::Char('f') => {
                    self.start_pick(PickKind::File(FileFilter::MARKDOWN), LOCAL_FIELD);
                }
                _ => {}
            }
            return Ok(false);
        }
        if self.handle_field_input(key) {
            return Ok(false);
        }
        match key.code {
            KeyCode::Esc => {
                self.editing_task = None;
                self.go_back();
            }
            KeyCode::Enter => self.submit_task_form(),
            _ => {}
        }
        Ok(false)
    }

    fn submit_task_form(&mut self) {
        let base = self
            .editing_task
            .and_then(|index| self.session.tasks().get(index).cloned())
            .unwrap_or_default();
        let task = match task_from_fields(&self.input_fields, base) {
            Ok(task) => task,
            Err(message) => {
                self.validation_message = Some(message);
                return;
            }
        };
        let saved = match self.editing_task {
            Some(index) => self
                .session
                .edit_task(index, task, self.bridge.store())
                .map(|()| index),
            None => self.session.add_task(task, self.bridge.store()),
        };
        match saved {
            Ok(index) => {
                self.task_index = index;
                self.editing_task = None;
                self.validation_message = None;
                self.go_back();
            }
            Err(err) => {
                error!(error = %format!("{err:#}"), "Saving task failed");
                self.validation_message = Some(format!("{err:#}"));
            }
        }
    }

    pub(in crate::tui) fn handle_credentials(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if self.handle_field_input(key) {
            return Ok(false);
        }
        match key.code {
            KeyCode::Esc => self.go_back(),
            KeyCode::Enter => {
                let app_id = self.input_fields.first().map(|field| field.value.clone());
                let app_secret = self.input_fields.get(1).map(|field| field.value.clone());
                let (Some(app_id), Some(app_secret)) = (app_id, app_secret) else {
                    return Ok(false);
                };
                if app_id.trim().is_empty() || app_secret.trim().is_empty() {
                    self.validation_message =
                        Some("App id and app secret are both required".to_string());
                    return Ok(false);
                }
                match self
                    .session
                    .save_credentials(&app_id, &app_secret, self.bridge.store())
                {
                    Ok(()) => {
                        self.validation_message = None;
                        self.go_back();
                        self.show_message("Credentials saved.");
                    }
                    Err(err) => {
                        error!(error = %format!("{err:#}"), "Saving credentials failed");
                        self.validation_message = Some(format!("{err:#}"));
                    }
                }
            }
            _ => {}
        }
        Ok(false)
    }

    /// Shared text editing for form views. Returns true when the key was
    /// consumed.
    fn handle_field_input(&mut self, key: KeyEvent) -> bool {
        let len = self.input_fields.len();
        if len == 0 {
            return false;
        }
        match key.code {
            KeyCode::Tab | KeyCode::Down => self.input_index = (self.input_index + 1) % len,
            KeyCode::BackTab | KeyCode::Up => {
                self.input_index = (self.input_index + len - 1) % len;
            }
            KeyCode::Backspace => {
                if let Some(field) = self.input_fields.get_mut(self.input_index) {
                    field.pop();
                }
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                if let Some(field) = self.input_fields.get_mut(self.input_index) {
                    field.push(ch);
                }
            }
            _ => return false,
        }
        true
    }
}
