use super::*;

const STATUS_HEIGHT: u16 = 7;

impl TuiApp {
    pub(in crate::tui) fn draw_main(
        &mut self,
        frame: &mut ratatui::Frame,
        area: ratatui::layout::Rect,
    ) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(STATUS_HEIGHT), Constraint::Min(0)])
            .split(area);

        let status = Paragraph::new(self.status_lines())
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Status"));
        frame.render_widget(status, layout[0]);

        let output_area = layout[1];
        let rows = output_area.height.saturating_sub(2) as usize;
        let log = self.session.log_mut();
        log.set_viewport(rows);
        let title = if log.is_at_bottom() {
            "Worker Output".to_string()
        } else {
            format!("Worker Output (scrolled {}/{})", log.scroll(), log.max_scroll())
        };
        let lines: Vec<Line> = log
            .visible()
            .map(|entry| Line::from(Span::styled(entry.text.clone(), line_style(entry.kind))))
            .collect();
        let widget =
            Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
        frame.render_widget(widget, output_area);
    }

    fn status_lines(&self) -> Vec<Line<'static>> {
        let sync = self.session.sync();
        let config = self.session.config();
        let mut lines = Vec::new();

        let mut session = format!("Session: {}", sync.status.as_str());
        if !sync.id.is_nil() {
            session.push_str(&format!(" ({})", sync.id));
        }
        if let Some(code) = sync.exit_code {
            session.push_str(&format!(" exit={code}"));
        }
        if let Some(duration) = sync.duration() {
            session.push_str(&format!(" in {}s", duration.whole_seconds()));
        }
        lines.push(Line::from(session));

        let enabled = config.actionable_tasks().count();
        lines.push(Line::from(format!(
            "Tasks: {} configured, {enabled} ready",
            config.tasks.len()
        )));

        let credentials = if config.has_credentials() {
            Span::raw("Credentials: set")
        } else {
            Span::styled(
                "Credentials: missing (press k)",
                Style::default().fg(Color::Yellow),
            )
        };
        lines.push(Line::from(credentials));

        let health = match self.session.probe() {
            ProbeState::Idle => Span::raw("Health: not checked"),
            ProbeState::Running => Span::raw("Health: checking..."),
            ProbeState::Done(result) if result.success => {
                Span::styled("Health: ok", Style::default().fg(Color::Green))
            }
            ProbeState::Done(result) => Span::styled(
                format!(
                    "Health: failed ({})",
                    result.output.lines().next().unwrap_or("no output")
                ),
                Style::default().fg(Color::Red),
            ),
        };
        lines.push(Line::from(health));

        let clean = match self.session.clean() {
            CleanState::Idle => "Cleanup: idle".to_string(),
            CleanState::Running => "Cleanup: running".to_string(),
            CleanState::Done(finished) if finished.success => "Cleanup: finished".to_string(),
            CleanState::Done(finished) => match finished.exit_code {
                Some(code) => format!("Cleanup: failed (exit {code})"),
                None => "Cleanup: failed".to_string(),
            },
        };
        lines.push(Line::from(clean));
        lines
    }
}
