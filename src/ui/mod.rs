mod helpers;
mod overlays;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::app::App;
use crate::keybinds::KeyAction;
use crate::settings::LayoutMode;
use crate::theme::Theme;
use crate::types::{Focus, MenuId, PendingAction};
use crate::editor_input::selection;
use crate::util::{display_width, pending_hint, prefix_width, to_u16_saturating};
use helpers::{line_spans, selected_columns};
use overlays::*;

pub(crate) fn draw(app: &mut App, frame: &mut Frame<'_>) {
    let theme = app.active_theme().clone();
    let size = frame.area();
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(4),
            Constraint::Length(1),
        ])
        .split(size);
    app.menu_bar_rect = vertical[0];
    app.tab_bar_rect = vertical[1];

    let (editor_area, terminal_area) = if app.settings.terminal_hidden {
        (vertical[2], None)
    } else {
        let (direction, constraints) = match app.settings.layout {
            LayoutMode::Stacked => (
                Direction::Vertical,
                [Constraint::Percentage(65), Constraint::Percentage(35)],
            ),
            LayoutMode::SideBySide => (
                Direction::Horizontal,
                [Constraint::Percentage(60), Constraint::Percentage(40)],
            ),
        };
        let split = Layout::default()
            .direction(direction)
            .constraints(constraints)
            .split(vertical[2]);
        (split[0], Some(split[1]))
    };
    app.editor_rect = editor_area;
    app.terminal.rect = terminal_area.unwrap_or_default();

    render_menu_bar(app, frame, &theme, vertical[0]);
    render_tab_bar(app, frame, &theme, vertical[1]);
    render_editor(app, frame, &theme, editor_area);
    if let Some(area) = terminal_area {
        render_terminal(app, frame, &theme, area);
    }
    render_status(app, frame, &theme, vertical[3]);

    if app.menu.open.is_some() {
        render_menu_dropdown(app, frame);
    }
    if app.settings_view.open {
        render_settings(app, frame);
    }
    if app.help_open {
        render_help(app, frame);
    }
    if app.prompt.is_some() {
        render_prompt(app, frame);
    }
}

fn render_menu_bar(app: &mut App, frame: &mut Frame<'_>, theme: &Theme, area: Rect) {
    app.menu.title_rects.clear();
    let mut spans = vec![Span::raw(" ")];
    let mut x = area.x + 1;
    for menu in MenuId::all() {
        let label = format!(" {} ", menu.title());
        let width = to_u16_saturating(display_width(&label));
        app.menu.title_rects.push((*menu, Rect::new(x, area.y, width, 1)));
        x = x.saturating_add(width);
        let style = if app.menu.open == Some(*menu) {
            Style::default().fg(theme.bg).bg(theme.accent)
        } else {
            Style::default().fg(theme.fg)
        };
        spans.push(Span::styled(label, style));
    }
    let hint = format!("{} menu", app.keybinds.display_for(KeyAction::Menu));
    let used = display_width(&hint) + x.saturating_sub(area.x) as usize + 1;
    spans.push(Span::raw(" ".repeat((area.width as usize).saturating_sub(used))));
    spans.push(Span::styled(hint, Style::default().fg(theme.fg_muted)));
    let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg_alt));
    frame.render_widget(bar, area);
}

fn render_tab_bar(app: &mut App, frame: &mut Frame<'_>, theme: &Theme, area: Rect) {
    app.tab_rects.clear();
    if app.tabs.is_empty() {
        let empty = Paragraph::new(Line::from(Span::styled(
            " No tabs open",
            Style::default().fg(theme.fg_muted),
        )))
        .style(Style::default().bg(theme.bg_alt));
        frame.render_widget(empty, area);
        return;
    }
    let active = app.tabs.active_id();
    let mut spans = Vec::new();
    let mut x = area.x;
    for tab in app.tabs.tabs() {
        if !spans.is_empty() {
            spans.push(Span::styled("│", Style::default().fg(theme.border)));
            x = x.saturating_add(1);
        }
        let dirty = if tab.dirty { "*" } else { "" };
        let name = format!(" {dirty}{} ", tab.label);
        let name_w = to_u16_saturating(display_width(&name));
        let close = "[x] ";
        let name_rect = Rect::new(x, area.y, name_w, 1);
        let close_rect = Rect::new(x.saturating_add(name_w), area.y, 3, 1);
        app.tab_rects.push((tab.id, name_rect, close_rect));
        x = x.saturating_add(name_w + 4);

        let style = if Some(tab.id) == active {
            Style::default()
                .fg(theme.fg)
                .bg(theme.bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.fg_muted)
        };
        spans.push(Span::styled(name, style));
        spans.push(Span::styled(close, style.fg(theme.fg_muted)));
    }
    let bar = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg_alt));
    frame.render_widget(bar, area);
}

fn border_style(focused: bool, theme: &Theme) -> Style {
    if focused {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.border)
    }
}

fn render_editor(app: &mut App, frame: &mut Frame<'_>, theme: &Theme, area: Rect) {
    let title = match app.tabs.active() {
        Some(tab) => match &tab.file_path {
            Some(path) => format!(" {} ", path.display()),
            None => format!(" {} ", tab.label),
        },
        None => " Editor ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(app.focus == Focus::Editor, theme))
        .style(Style::default().bg(theme.bg).fg(theme.fg));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);

    if app.tabs.is_empty() {
        let kb = &app.keybinds;
        let hint = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                format!(
                    "  {} new tab   {} open file   {} help",
                    kb.display_for(KeyAction::NewTab),
                    kb.display_for(KeyAction::Open),
                    kb.display_for(KeyAction::Help),
                ),
                Style::default().fg(theme.fg_muted),
            )),
        ]);
        frame.render_widget(hint, inner);
        return;
    }

    app.ensure_cursor_visible();
    let gutter = App::EDITOR_GUTTER_WIDTH as usize;
    let text_w = (inner.width as usize).saturating_sub(gutter);
    let editor = app.tabs.editor();
    let (cursor_line, cursor_col) = editor.cursor();
    let sel = selection(editor);
    let base = Style::default().fg(theme.fg);
    let sel_style = Style::default().bg(theme.selection).fg(theme.fg);

    let mut out: Vec<Line> = Vec::with_capacity(inner.height as usize);
    for (row, line) in editor
        .lines()
        .iter()
        .enumerate()
        .skip(app.editor_scroll_row)
        .take(inner.height as usize)
    {
        let num_style = if row == cursor_line {
            Style::default().fg(theme.accent)
        } else {
            Style::default().fg(theme.fg_muted)
        };
        let mut spans = vec![Span::styled(format!("{:>5} ", row + 1), num_style)];
        spans.extend(line_spans(
            line,
            selected_columns(sel, row),
            app.editor_scroll_col,
            text_w,
            base,
            sel_style,
        ));
        out.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(out), inner);

    if app.focus == Focus::Editor && app.prompt.is_none() {
        let line_x = editor
            .lines()
            .get(cursor_line)
            .map_or(0, |l| prefix_width(l, cursor_col));
        let x = line_x.saturating_sub(app.editor_scroll_col);
        let y = cursor_line.saturating_sub(app.editor_scroll_row);
        if x < text_w && y < inner.height as usize {
            frame.set_cursor_position((
                inner.x + App::EDITOR_GUTTER_WIDTH + to_u16_saturating(x),
                inner.y + to_u16_saturating(y),
            ));
        }
    }
}

fn render_terminal(app: &mut App, frame: &mut Frame<'_>, theme: &Theme, area: Rect) {
    let title = match app.terminal.status {
        Some(status) => format!(" Terminal [{}] ", status.label()),
        None => " Terminal ".to_string(),
    };
    let focused = app.focus == Focus::Terminal;
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style(focused, theme))
        .style(Style::default().bg(theme.bg_alt).fg(theme.fg));
    let inner = block.inner(area);
    frame.render_widget(Clear, area);
    frame.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let rows = inner.height.saturating_sub(1) as usize;
    let total = app.terminal.lines.len();
    let end = total.saturating_sub(app.terminal.scroll_back);
    let start = end.saturating_sub(rows);
    let mut lines: Vec<Line> = app.terminal.lines[start..end]
        .iter()
        .map(|l| Line::from(l.replace('\t', "    ")))
        .collect();
    while lines.len() < rows {
        lines.push(Line::from(""));
    }
    let input = app.runner.pending_input().replace('\t', "    ");
    let prompt_style = if app.runner.is_running() {
        Style::default().fg(theme.accent)
    } else {
        Style::default().fg(theme.fg_muted)
    };
    lines.push(Line::from(vec![
        Span::styled("> ", prompt_style),
        Span::raw(input.clone()),
    ]));
    frame.render_widget(Paragraph::new(lines), inner);

    if focused && app.prompt.is_none() {
        let x = inner.x + 2 + to_u16_saturating(display_width(&input));
        if x < inner.right() {
            frame.set_cursor_position((x, inner.y + inner.height - 1));
        }
    }
}

fn render_status(app: &App, frame: &mut Frame<'_>, theme: &Theme, area: Rect) {
    let (msg, msg_style) = if app.pending == PendingAction::None {
        (app.status.clone(), Style::default().fg(theme.fg))
    } else {
        (
            pending_hint(app.pending),
            Style::default().fg(theme.error).add_modifier(Modifier::BOLD),
        )
    };
    let right = match app.tabs.active() {
        Some(_) => {
            let (line, col) = app.tabs.editor().cursor();
            format!("Ln {}, Col {}  {} ", line + 1, col + 1, app.settings.layout.label())
        }
        None => format!("{} ", app.settings.layout.label()),
    };
    let gap = (area.width as usize).saturating_sub(display_width(&msg) + display_width(&right) + 1);
    let line = Line::from(vec![
        Span::styled(format!(" {msg}"), msg_style),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, Style::default().fg(theme.fg_muted)),
    ]);
    frame.render_widget(
        Paragraph::new(line).style(Style::default().bg(theme.bg_alt)),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::new_app;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use tempfile::tempdir;

    fn screen(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        let mut out = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    #[test]
    fn draws_tabs_and_records_click_targets() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.new_tab();
        app.tabs
            .editor_mut()
            .expect("editable")
            .insert_str("int main() {\n\treturn 0;\n}");
        app.tabs.sync_editor_to_active();
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).expect("terminal");
        terminal.draw(|f| draw(&mut app, f)).expect("draw");

        let text = screen(&terminal);
        assert!(text.contains("*Untitled"));
        assert!(text.contains("    return 0;"));
        assert!(text.contains("Terminal"));
        assert_eq!(app.tab_rects.len(), 1);
        assert_eq!(app.menu.title_rects.len(), MenuId::all().len());
        assert_eq!(app.menu_bar_rect.y, 0);
        assert_eq!(app.tab_bar_rect.y, 1);
    }

    #[test]
    fn hidden_terminal_gives_editor_the_space() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.settings.terminal_hidden = true;
        let mut terminal = Terminal::new(TestBackend::new(60, 20)).expect("terminal");
        terminal.draw(|f| draw(&mut app, f)).expect("draw");
        assert_eq!(app.terminal.rect, Rect::default());
        assert_eq!(app.editor_rect.height, 17);
    }

    #[test]
    fn side_by_side_splits_horizontally() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.settings.layout = LayoutMode::SideBySide;
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).expect("terminal");
        terminal.draw(|f| draw(&mut app, f)).expect("draw");
        assert_eq!(app.editor_rect.y, app.terminal.rect.y);
        assert!(app.terminal.rect.x > app.editor_rect.x);
    }

    #[test]
    fn overlays_record_their_areas() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.toggle_menu(MenuId::Run);
        app.open_settings();
        app.open_open_prompt();
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).expect("terminal");
        terminal.draw(|f| draw(&mut app, f)).expect("draw");
        assert!(app.menu.dropdown_rect.height > 0);
        assert!(app.settings_view.rect.height > 0);
        assert_eq!(app.prompt_rect.height, 3);
        assert!(screen(&terminal).contains("Open file"));
    }

    #[test]
    fn pending_quit_shows_hint() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.pending = PendingAction::Quit;
        let mut terminal = Terminal::new(TestBackend::new(100, 10)).expect("terminal");
        terminal.draw(|f| draw(&mut app, f)).expect("draw");
        assert!(screen(&terminal).contains("Unsaved changes"));
    }
}
