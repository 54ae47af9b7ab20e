use super::*;

impl TuiApp {
    pub(in crate::tui) fn handle_browse(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        let Some(browser) = self.browser.as_mut() else {
            self.go_back();
            return Ok(false);
        };
        let mut answer = None;
        match key.code {
            KeyCode::Esc => answer = Some(None),
            KeyCode::Up => browser.move_selection(-1),
            KeyCode::Down => browser.move_selection(1),
            KeyCode::PageUp => browser.move_selection(-10),
            KeyCode::PageDown => browser.move_selection(10),
            KeyCode::Backspace | KeyCode::Left => browser.parent(),
            KeyCode::Enter | KeyCode::Right => {
                if let Some(entry) = browser.current().cloned() {
                    if entry.is_dir {
                        browser.enter(entry.path);
                    } else {
                        answer = Some(Some(entry.path));
                    }
                }
            }
            KeyCode::Char('s') | KeyCode::Char(' ') if browser.is_folder_pick() => {
                answer = Some(Some(browser.dir.clone()));
            }
            _ => {}
        }
        if let Some(path) = answer
            && let Some(mut browser) = self.browser.take()
        {
            browser.finish(path);
            self.go_back();
        }
        Ok(false)
    }
}
