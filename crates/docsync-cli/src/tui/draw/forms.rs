use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw_form(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
        title: &str,
    ) {
        let mut lines = Vec::new();
        if self.view == View::TaskForm {
            lines.push(Line::from(Span::raw(
                "Tip: Ctrl+O fills Local path (or Vault root when selected) from a folder browser",
            )));
            lines.push(Line::from(Span::raw("")));
        }
        if self.pick_rx.is_some() {
            lines.push(Line::from(Span::raw("Waiting for the picker...")));
            lines.push(Line::from(Span::raw("")));
        }
        if let Some(message) = self.validation_message.as_deref() {
            lines.push(Line::from(Span::styled(
                format!("Validation: {message}"),
                Style::default().fg(Color::Red),
            )));
            lines.push(Line::from(Span::raw("")));
        }
        for (idx, field) in self.input_fields.iter().enumerate() {
            let label = if idx == self.input_index {
                format!("> {}: {}", field.label, field.display_value())
            } else {
                format!("  {}: {}", field.label, field.display_value())
            };
            lines.push(Line::from(Span::raw(label)));
        }
        let max_scroll = max_scroll_for_lines(lines.len(), area.height);
        let scroll = self.scroll_offset(self.view).min(max_scroll);
        self.set_scroll_offset(self.view, scroll);
        let widget = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((scroll as u16, 0))
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(widget, area);
    }
}
