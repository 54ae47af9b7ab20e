use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw_tasks(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let tasks = self.session.tasks();
        let mut lines = Vec::new();
        if tasks.is_empty() {
            lines.push(Line::from("No tasks configured. Press a to add one."));
        }
        for (index, task) in tasks.iter().enumerate() {
            let marker = if task.enabled { "[x]" } else { "[ ]" };
            let force = if task.force { " force" } else { "" };
            let text = format!(
                "{marker} {}: {} | {} -> {}{force}",
                index, task.note, task.local_path, task.cloud_token
            );
            let style = if index == self.task_index {
                selected_style()
            } else if task.enabled {
                Style::default()
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            lines.push(Line::from(Span::styled(text, style)));
        }
        let height = area.height.saturating_sub(2) as usize;
        let scroll = adjust_scroll(
            self.task_index,
            self.scroll_offset(View::Tasks),
            height,
            lines.len(),
        );
        self.set_scroll_offset(View::Tasks, scroll);
        let widget = Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .block(Block::default().borders(Borders::ALL).title("Tasks"));
        frame.render_widget(widget, area);
    }

    pub(in crate::tui) fn draw_confirm_delete(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let target = self
            .session
            .pending_delete()
            .and_then(|index| self.session.tasks().get(index).map(|task| (index, task)));
        let text = match target {
            Some((index, task)) => format!(
                "Delete task {index} '{}'?\n\n{} -> {}\n\nThis cannot be undone.",
                task.note, task.local_path, task.cloud_token
            ),
            None => "Nothing selected.".to_string(),
        };
        let widget = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("Confirm Delete"));
        frame.render_widget(widget, area);
    }
}
