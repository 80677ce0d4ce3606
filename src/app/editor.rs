use super::App;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui_textarea::CursorMove;

use crate::editor_input::{KeyOutcome, Pos, handle_editor_key, jump, move_cursor};
use crate::error::Result;
use crate::types::Focus;
use crate::util::{char_at_column, prefix_width};

impl App {
    /// Line number column, including the separating space.
    pub(crate) const EDITOR_GUTTER_WIDTH: u16 = 6;

    pub(crate) fn handle_editor_key(&mut self, key: KeyEvent) -> Result<()> {
        let extend = key.modifiers.contains(KeyModifiers::SHIFT);
        match key.code {
            KeyCode::PageUp | KeyCode::PageDown if !self.tabs.is_empty() => {
                let rows = self.editor_viewport().0.max(1);
                let down = key.code == KeyCode::PageDown;
                if let Some(editor) = self.tabs.editor_mut() {
                    for _ in 0..rows {
                        let step = if down { CursorMove::Down } else { CursorMove::Up };
                        move_cursor(editor, step, extend);
                    }
                }
            }
            _ => match handle_editor_key(&mut self.tabs, key) {
                KeyOutcome::Run(_) => self.build_and_run()?,
                KeyOutcome::Ignored if self.tabs.is_empty() => {
                    self.set_status("No tab open: New Tab or Open File to start editing");
                }
                _ => {}
            },
        }
        self.ensure_cursor_visible();
        Ok(())
    }

    /// Bracketed paste: insert as-is, without auto-indent.
    pub(crate) fn handle_paste(&mut self, text: String) {
        if self.focus == Focus::Terminal {
            for ch in text.chars().filter(|c| *c != '\r') {
                if ch == '\n' {
                    if let Err(err) = self.flush_terminal_input() {
                        self.set_status(format!("Input failed: {err}"));
                    }
                } else {
                    self.runner.push_char(ch);
                }
            }
            return;
        }
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        if self.tabs.editor_mut().is_some_and(|editor| editor.insert_str(&text)) {
            self.tabs.sync_editor_to_active();
            self.ensure_cursor_visible();
        }
    }

    /// Text rows and columns visible in the editor body.
    pub(crate) fn editor_viewport(&self) -> (usize, usize) {
        let rows = self.editor_rect.height.saturating_sub(2) as usize;
        let cols = self
            .editor_rect
            .width
            .saturating_sub(2 + Self::EDITOR_GUTTER_WIDTH) as usize;
        (rows, cols)
    }

    pub(crate) fn ensure_cursor_visible(&mut self) {
        let (rows, cols) = self.editor_viewport();
        if rows == 0 || cols == 0 {
            return;
        }
        let editor = self.tabs.editor();
        let (line, col) = editor.cursor();
        let x = editor.lines().get(line).map_or(0, |l| prefix_width(l, col));

        if line < self.editor_scroll_row {
            self.editor_scroll_row = line;
        } else if line >= self.editor_scroll_row + rows {
            self.editor_scroll_row = line + 1 - rows;
        }
        if x < self.editor_scroll_col {
            self.editor_scroll_col = x;
        } else if x >= self.editor_scroll_col + cols {
            self.editor_scroll_col = x + 1 - cols;
        }
    }

    /// Row and char column under screen cell `(x, y)`, if it lies in the editor body.
    pub(crate) fn editor_pos_from_mouse(&self, x: u16, y: u16) -> Option<Pos> {
        let r = self.editor_rect;
        let body_x = r.x + 1 + Self::EDITOR_GUTTER_WIDTH;
        if y <= r.y || y + 1 >= r.y + r.height || x + 1 >= r.x + r.width || x < r.x + 1 {
            return None;
        }
        let lines = self.tabs.editor().lines();
        let row = (y - r.y - 1) as usize + self.editor_scroll_row;
        let Some(line) = lines.get(row) else {
            let last = lines.len().saturating_sub(1);
            return Some((last, lines.get(last).map_or(0, |l| l.chars().count())));
        };
        let col = if x < body_x {
            0
        } else {
            char_at_column(line, (x - body_x) as usize + self.editor_scroll_col)
        };
        Some((row, col))
    }

    pub(crate) fn handle_editor_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.focus = Focus::Editor;
                if let Some(pos) = self.editor_pos_from_mouse(mouse.column, mouse.row)
                    && let Some(editor) = self.tabs.editor_mut()
                {
                    editor.cancel_selection();
                    jump(editor, pos);
                    self.editor_dragging = true;
                }
            }
            MouseEventKind::Drag(MouseButton::Left) if self.editor_dragging => {
                if let Some(pos) = self.editor_pos_from_mouse(mouse.column, mouse.row)
                    && let Some(editor) = self.tabs.editor_mut()
                {
                    if !editor.is_selecting() {
                        editor.start_selection();
                    }
                    jump(editor, pos);
                    self.ensure_cursor_visible();
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.editor_dragging = false;
            }
            MouseEventKind::ScrollDown => {
                let max = self.tabs.editor().lines().len().saturating_sub(1);
                self.editor_scroll_row = (self.editor_scroll_row + Self::SCROLL_LINES).min(max);
            }
            MouseEventKind::ScrollUp => {
                self.editor_scroll_row = self.editor_scroll_row.saturating_sub(Self::SCROLL_LINES);
            }
            _ => {}
        }
    }
}
