use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw(&mut self, frame: &mut ratatui::Frame) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(0),
                Constraint::Length(LOG_PANEL_HEIGHT),
                Constraint::Length(3),
            ])
            .split(frame.size());

        let header = Paragraph::new(self.header_text())
            .block(Block::default().borders(Borders::ALL).title("DocSync"));
        frame.render_widget(header, layout[0]);

        match self.view {
            View::Main => self.draw_main(frame, layout[1]),
            View::Tasks => self.draw_tasks(frame, layout[1]),
            View::TaskForm => {
                let title = if self.editing_task.is_some() {
                    "Edit Task"
                } else {
                    "Add Task"
                };
                self.draw_form(frame, layout[1], title);
            }
            View::ConfirmDelete => self.draw_confirm_delete(frame, layout[1]),
            View::Credentials => self.draw_form(frame, layout[1], "Feishu Credentials"),
            View::Browse => self.draw_browse(frame, layout[1]),
            View::Message => self.draw_message(frame, layout[1]),
        }

        self.draw_log_panel(frame, layout[2]);

        let footer = Paragraph::new(self.footer_text())
            .block(Block::default().borders(Borders::ALL).title("Help"));
        frame.render_widget(footer, layout[3]);
    }

    fn header_text(&self) -> String {
        let sync = self.session.sync();
        let mut text = format!("Sync: {}", sync.status.as_str());
        if sync.is_running() && sync.force {
            text.push_str(" (force)");
        }
        let last = self.session.last_synced().unwrap_or("never");
        text.push_str(&format!(" | Last synced: {last}"));
        text
    }

    pub(in crate::tui) fn footer_text(&self) -> String {
        match self.view {
            View::Main => {
                "s: sync | f: force sync | h: health | c: clean | t: tasks | k: credentials | x: clear | a: ack | r: reload | q: quit"
                    .to_string()
            }
            View::Tasks => {
                "Up/Down: select | a: add | e/Enter: edit | Space: toggle | d: delete | Esc: back"
                    .to_string()
            }
            View::TaskForm => {
                "Tab: next field | Ctrl+O: pick folder | Ctrl+F: pick .md file | Enter: save | Esc: back"
                    .to_string()
            }
            View::ConfirmDelete => "y: delete | n/Esc: keep".to_string(),
            View::Credentials => "Tab: next field | Enter: save | Esc: back".to_string(),
            View::Browse => {
                let select = if self
                    .browser
                    .as_ref()
                    .is_some_and(|browser| browser.is_folder_pick())
                {
                    "s/Space: choose this folder | "
                } else {
                    ""
                };
                format!("Up/Down: move | Enter: open | Backspace: parent | {select}Esc: cancel")
            }
            View::Message => "Enter/Esc: back | Up/Down: scroll".to_string(),
        }
    }

    pub(in crate::tui) fn draw_message(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let lines = self.message.lines().count().max(1);
        let max_scroll = max_scroll_for_lines(lines, area.height);
        let scroll = self.scroll_offset(View::Message).min(max_scroll);
        self.set_scroll_offset(View::Message, scroll);
        let widget = Paragraph::new(self.message.clone())
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0))
            .block(Block::default().borders(Borders::ALL).title("Message"));
        frame.render_widget(widget, area);
    }

    pub(in crate::tui) fn draw_log_panel(
        &self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let max_lines = area.height.saturating_sub(LOG_PANEL_BORDER_HEIGHT) as usize;
        if max_lines == 0 {
            return;
        }
        let header = Line::from(Span::styled(
            "time     level target message",
            Style::default().add_modifier(Modifier::BOLD),
        ));
        let mut lines = vec![header];
        let entries = self.log_buffer.entries();
        if entries.is_empty() {
            lines.push(Line::from(Span::raw("No log messages yet.")));
        } else if max_lines > LOG_HEADER_LINES {
            let max_entries = max_lines.saturating_sub(LOG_HEADER_LINES);
            let start = entries.len().saturating_sub(max_entries);
            for entry in entries[start..].iter() {
                lines.push(Line::from(Span::raw(entry.format_compact())));
            }
        }
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Diagnostics"));
        frame.render_widget(widget, area);
    }
}
