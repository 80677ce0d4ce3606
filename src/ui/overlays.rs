use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Clear, List, ListItem, Paragraph, Wrap};

use crate::app::App;
use crate::keybinds::KeyAction;
use crate::settings::SettingField;
use crate::util::{display_width, to_u16_saturating};

use super::helpers::{centered_fixed, centered_rect, help_keybind_line, list_item_style, themed_block};

/// Dropdown under the open menu's title.
pub(crate) fn render_menu_dropdown(app: &mut App, frame: &mut Frame<'_>) {
    let Some(menu) = app.menu.open else {
        return;
    };
    let theme = app.active_theme().clone();
    let anchor_x = app
        .menu
        .title_rects
        .iter()
        .find(|(id, _)| *id == menu)
        .map_or(0, |(_, r)| r.x);
    let rows: Vec<(String, String)> = menu
        .items()
        .iter()
        .map(|a| (a.label().to_string(), app.keybinds.display_for(*a)))
        .collect();
    let label_w = rows.iter().map(|(l, _)| display_width(l)).max().unwrap_or(0);
    let key_w = rows.iter().map(|(_, k)| display_width(k)).max().unwrap_or(0);
    let area = frame.area();
    let width = to_u16_saturating(label_w + key_w + 5).min(area.width);
    let height = to_u16_saturating(rows.len() + 2).min(area.height.saturating_sub(1));
    let x = anchor_x.min(area.width.saturating_sub(width));
    let rect = Rect::new(x, app.menu_bar_rect.y + 1, width, height);
    app.menu.dropdown_rect = rect;

    let running = app.runner.is_running();
    let items: Vec<ListItem> = menu
        .items()
        .iter()
        .zip(&rows)
        .enumerate()
        .map(|(i, (action, (label, key)))| {
            let mut style = list_item_style(i == app.menu.index, &theme);
            if *action == KeyAction::Stop && !running && i != app.menu.index {
                style = style.fg(theme.fg_muted);
            }
            let pad = label_w - display_width(label) + 2;
            ListItem::new(Line::from(Span::styled(
                format!(" {label}{}{key:>key_w$}", " ".repeat(pad)),
                style,
            )))
        })
        .collect();
    frame.render_widget(Clear, rect);
    frame.render_widget(List::new(items).block(themed_block(&theme)), rect);
}

pub(crate) fn render_prompt(app: &mut App, frame: &mut Frame<'_>) {
    let Some(prompt) = app.prompt.as_ref() else {
        return;
    };
    let theme = app.active_theme().clone();
    let area = centered_fixed(60, 3, frame.area());
    let inner_w = area.width.saturating_sub(2) as usize;
    // Keep the cursor in view for long values.
    let skip = (prompt.cursor + 1).saturating_sub(inner_w);
    let visible: String = prompt.value.chars().skip(skip).collect();
    let before: String = prompt
        .value
        .chars()
        .skip(skip)
        .take(prompt.cursor - skip)
        .collect();
    let cursor_x = area.x + 1 + to_u16_saturating(display_width(&before));
    let title = format!(" {} ", prompt.title);

    frame.render_widget(Clear, area);
    let input = Paragraph::new(visible).block(
        themed_block(&theme)
            .title(title)
            .style(Style::default().bg(theme.bg_alt).fg(theme.fg)),
    );
    frame.render_widget(input, area);
    if cursor_x < area.right() {
        frame.set_cursor_position((cursor_x, area.y + 1));
    }
    app.prompt_rect = area;
}

pub(crate) fn render_settings(app: &mut App, frame: &mut Frame<'_>) {
    let theme = app.active_theme().clone();
    let fields = SettingField::all();
    let area = centered_fixed(64, to_u16_saturating(fields.len() + 3), frame.area());
    app.settings_view.rect = area;
    let label_w = fields
        .iter()
        .map(|f| display_width(f.label()))
        .max()
        .unwrap_or(0);
    let mut items: Vec<ListItem> = fields
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let label = field.label();
            let pad = " ".repeat(label_w - display_width(label) + 2);
            ListItem::new(Line::from(Span::styled(
                format!(" {label}{pad}{}", field.display(&app.settings)),
                list_item_style(i == app.settings_view.index, &theme),
            )))
        })
        .collect();
    items.push(ListItem::new(Line::from(Span::styled(
        " Enter: change   Esc: close",
        Style::default().fg(theme.fg_muted),
    ))));
    frame.render_widget(Clear, area);
    frame.render_widget(
        List::new(items).block(themed_block(&theme).title(" Settings ")),
        area,
    );
}

pub(crate) fn render_help(app: &App, frame: &mut Frame<'_>) {
    let theme = app.active_theme();
    let area = centered_rect(78, 80, frame.area());
    frame.render_widget(Clear, area);

    let kb = &app.keybinds;
    let heading = Style::default()
        .fg(theme.accent)
        .add_modifier(Modifier::BOLD);
    let key_s = Style::default().fg(theme.accent_secondary);
    let desc_s = Style::default().fg(theme.fg);
    let sep_s = Style::default().fg(theme.fg_muted);
    let muted = Style::default().fg(theme.fg_muted);

    let mut lines: Vec<Line> = vec![Line::from(Span::styled("Keyboard", heading)), Line::from("")];
    let bound: Vec<(String, &str)> = KeyAction::all()
        .iter()
        .map(|a| (kb.display_for(*a), a.label()))
        .collect();
    for chunk in bound.chunks(3) {
        let entries: Vec<(&str, &str)> = chunk.iter().map(|(k, d)| (k.as_str(), *d)).collect();
        lines.push(help_keybind_line(&entries, key_s, desc_s, sep_s));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Editor", heading)));
    lines.push(Line::from(""));
    lines.push(help_keybind_line(
        &[
            ("Tab", "insert tab"),
            ("Shift+Tab", "outdent selection"),
            ("Enter", "newline keeping indent"),
        ],
        key_s,
        desc_s,
        sep_s,
    ));
    lines.push(help_keybind_line(
        &[("Ctrl+A", "select all"), ("Shift+arrows", "select")],
        key_s,
        desc_s,
        sep_s,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Terminal", heading)));
    lines.push(Line::from(""));
    lines.push(help_keybind_line(
        &[
            ("Enter", "send line to program"),
            ("Esc", "back to editor"),
            ("PgUp/PgDn", "scroll"),
        ],
        key_s,
        desc_s,
        sep_s,
    ));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Keys can be remapped in keybinds.json in the config directory.",
        muted,
    )));
    lines.push(Line::from(Span::styled("Press any key to close.", muted)));

    let body = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .style(Style::default().bg(theme.bg_alt))
        .block(themed_block(theme).title(" Help "));
    frame.render_widget(body, area);
}
