use super::*;

impl TuiApp {
    pub(in crate::tui) fn draw_browse(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let Some(browser) = self.browser.as_ref() else {
            return;
        };
        let title = format!("{}: {}", browser.request.title(), browser.dir.display());
        let mut lines = Vec::new();
        if let Some(error) = browser.error.as_deref() {
            lines.push(Line::from(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            )));
        } else if browser.entries.is_empty() {
            lines.push(Line::from("(empty)"));
        }
        for (index, entry) in browser.entries.iter().enumerate() {
            let name = if entry.is_dir {
                format!("{}/", entry.name)
            } else {
                entry.name.clone()
            };
            let style = if index == browser.selected {
                selected_style()
            } else {
                Style::default()
            };
            lines.push(Line::from(Span::styled(name, style)));
        }
        let height = area.height.saturating_sub(2) as usize;
        let selected = browser.selected;
        let len = lines.len();
        let scroll = adjust_scroll(selected, self.scroll_offset(View::Browse), height, len);
        self.set_scroll_offset(View::Browse, scroll);
        let widget = Paragraph::new(lines)
            .scroll((scroll as u16, 0))
            .block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(widget, area);
    }
}
