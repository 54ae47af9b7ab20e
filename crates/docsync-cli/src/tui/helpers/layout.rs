use super::*;

pub(in crate::tui) fn max_scroll_for_lines(content_len: usize, area_height: u16) -> usize {
    let body_height = area_height.saturating_sub(2) as usize;
    content_len.saturating_sub(body_height)
}

pub(in crate::tui) fn clamp_index(index: usize, len: usize) -> usize {
    if len == 0 { 0 } else { index.min(len - 1) }
}

/// Moves `index` by `delta`, staying inside `0..len`.
pub(in crate::tui) fn step_index(index: usize, delta: isize, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let next = if delta.is_negative() {
        index.saturating_sub(delta.unsigned_abs())
    } else {
        index.saturating_add(delta as usize)
    };
    next.min(len - 1)
}

/// Scroll offset that keeps `selected` inside a window of `height` rows.
pub(in crate::tui) fn adjust_scroll(
    selected: usize,
    scroll: usize,
    height: usize,
    len: usize,
) -> usize {
    if len == 0 || height == 0 {
        return 0;
    }
    if selected < scroll {
        return selected;
    }
    let last_visible = scroll.saturating_add(height).saturating_sub(1);
    if selected > last_visible {
        let new_scroll = selected.saturating_sub(height - 1);
        return new_scroll.min(len.saturating_sub(1));
    }
    scroll
}

pub(in crate::tui) fn line_style(kind: LineKind) -> Style {
    match kind {
        LineKind::Stdout => Style::default(),
        LineKind::Stderr => Style::default().fg(Color::Red),
        LineKind::System => Style::default().fg(Color::Yellow),
        LineKind::Placeholder => Style::default().add_modifier(Modifier::DIM),
    }
}

pub(in crate::tui) fn selected_style() -> Style {
    Style::default().add_modifier(Modifier::REVERSED)
}
