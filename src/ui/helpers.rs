use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders};

use crate::theme::Theme;
use crate::util::{TAB_WIDTH, char_width};

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

/// Rect of `percent_x` width and a fixed `height`, centred in `area`.
pub(crate) fn centered_fixed(percent_x: u16, height: u16, area: Rect) -> Rect {
    let height = height.min(area.height);
    let width = (area.width as u32 * percent_x as u32 / 100) as u16;
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

pub(crate) fn help_keybind_line<'a>(
    entries: &[(&str, &str)],
    key_style: Style,
    desc_style: Style,
    sep_style: Style,
) -> Line<'a> {
    let mut spans = Vec::new();
    for (i, (key, desc)) in entries.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  |  ", sep_style));
        }
        spans.push(Span::styled(key.to_string(), key_style));
        spans.push(Span::styled(format!(" {desc}"), desc_style));
    }
    Line::from(spans)
}

pub(crate) fn list_item_style(selected: bool, theme: &Theme) -> Style {
    if selected {
        Style::default()
            .fg(theme.bg)
            .bg(theme.accent)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg)
    }
}

pub(crate) fn themed_block(theme: &Theme) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .style(Style::default().bg(theme.bg_alt))
        .border_style(Style::default().fg(theme.accent))
}

/// Char columns of `row` covered by `selection`; the end is open past the
/// last char when the selection continues onto later rows.
pub(crate) fn selected_columns(
    selection: Option<((usize, usize), (usize, usize))>,
    row: usize,
) -> Option<(usize, usize)> {
    let ((start_row, start_col), (end_row, end_col)) = selection?;
    if row < start_row || row > end_row {
        return None;
    }
    let from = if row == start_row { start_col } else { 0 };
    let to = if row == end_row { end_col } else { usize::MAX };
    Some((from, to))
}

/// Lay out one editor line as spans: tabs expanded, clipped to
/// `[scroll_col, scroll_col + width)` display columns, and chars whose
/// index falls in `selected_cols` styled with `sel_style`.
pub(crate) fn line_spans(
    line: &str,
    selected_cols: Option<(usize, usize)>,
    scroll_col: usize,
    width: usize,
    base: Style,
    sel_style: Style,
) -> Vec<Span<'static>> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut current_selected = false;
    let mut x = 0usize;
    let end_col = scroll_col + width;

    for (i, ch) in line.chars().enumerate() {
        if x >= end_col {
            break;
        }
        let w = char_width(ch);
        let selected = selected_cols.is_some_and(|(s, e)| (s..e).contains(&i));
        // Columns of this char that land inside the viewport.
        let visible = (x + w).min(end_col).saturating_sub(x.max(scroll_col));
        x += w;
        if visible == 0 {
            continue;
        }
        if selected != current_selected && !current.is_empty() {
            let style = if current_selected { sel_style } else { base };
            spans.push(Span::styled(std::mem::take(&mut current), style));
        }
        current_selected = selected;
        if ch == '\t' || visible < w {
            current.push_str(&" ".repeat(visible.min(TAB_WIDTH)));
        } else {
            current.push(ch);
        }
    }
    if !current.is_empty() {
        let style = if current_selected { sel_style } else { base };
        spans.push(Span::styled(current, style));
    }
    spans
}
