//! Key handling for the editor: indent, outdent, auto-indent and the run
//! shortcut, falling through to the text area's own editing for everything else.

use std::path::PathBuf;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui_textarea::{CursorMove, Input, TextArea};

use crate::tab::TabManager;
use crate::util::to_u16_saturating;

/// What the handler did with a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Custom editing applied; default insertion suppressed.
    Handled,
    /// Default editing behaviour applied (insertion, deletion, movement).
    Native,
    /// Run requested for the active tab's file path.
    Run(Option<PathBuf>),
    /// Nothing to do for this key.
    Ignored,
}

/// Row and char column in the editor.
pub(crate) type Pos = (usize, usize);

pub fn handle_editor_key(tabs: &mut TabManager, key: KeyEvent) -> KeyOutcome {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);

    if ctrl && key.code == KeyCode::Enter {
        return match tabs.active() {
            Some(tab) => KeyOutcome::Run(tab.file_path.clone()),
            None => KeyOutcome::Ignored,
        };
    }
    let Some(editor) = tabs.editor_mut() else {
        return KeyOutcome::Ignored;
    };

    let (outcome, changed) = match key.code {
        KeyCode::BackTab => (KeyOutcome::Handled, outdent(editor)),
        KeyCode::Tab if shift => (KeyOutcome::Handled, outdent(editor)),
        KeyCode::Tab if !ctrl => (KeyOutcome::Handled, editor.insert_str("\t")),
        KeyCode::Enter => match leading_indent(editor) {
            Some(indent) => (KeyOutcome::Handled, editor.insert_str(format!("\n{indent}"))),
            None => native(editor, key),
        },
        _ => native(editor, key),
    };
    if changed {
        tabs.sync_editor_to_active();
    }
    outcome
}

/// Non-empty selection, ordered start to end.
pub(crate) fn selection(editor: &TextArea<'_>) -> Option<(Pos, Pos)> {
    editor.selection_range().filter(|(start, end)| start != end)
}

pub(crate) fn jump(editor: &mut TextArea<'_>, (row, col): Pos) {
    editor.move_cursor(CursorMove::Jump(to_u16_saturating(row), to_u16_saturating(col)));
}

/// Move the cursor, growing the selection when `extend` is set and dropping it otherwise.
pub(crate) fn move_cursor(editor: &mut TextArea<'_>, to: CursorMove, extend: bool) {
    if !extend {
        editor.cancel_selection();
    } else if !editor.is_selecting() {
        editor.start_selection();
    }
    editor.move_cursor(to);
}

/// Remove at most one leading tab from every line the selection touches.
/// Returns whether the text changed.
fn outdent(editor: &mut TextArea<'_>) -> bool {
    let Some((start, end)) = selection(editor) else {
        return false;
    };
    let anchor_first = editor.cursor() == end;
    // A selection ending at column 0 does not touch that line.
    let last_row = if end.1 == 0 && end.0 > start.0 {
        end.0 - 1
    } else {
        end.0
    };
    let rows: Vec<usize> = (start.0..=last_row)
        .filter(|row| editor.lines().get(*row).is_some_and(|l| l.starts_with('\t')))
        .collect();
    if rows.is_empty() {
        return false;
    }

    editor.cancel_selection();
    for &row in &rows {
        jump(editor, (row, 0));
        editor.delete_next_char();
    }
    let shifted = |(row, col): Pos| {
        if col > 0 && rows.contains(&row) {
            (row, col - 1)
        } else {
            (row, col)
        }
    };
    let (start, end) = (shifted(start), shifted(end));
    let (anchor, cursor) = if anchor_first { (start, end) } else { (end, start) };
    jump(editor, anchor);
    editor.start_selection();
    jump(editor, cursor);
    true
}

/// Leading whitespace of the line holding the cursor (or the selection
/// start), up to that column.
fn leading_indent(editor: &TextArea<'_>) -> Option<String> {
    let (row, col) = selection(editor).map_or_else(|| editor.cursor(), |(start, _)| start);
    let indent: String = editor
        .lines()
        .get(row)?
        .chars()
        .take(col)
        .take_while(|c| *c == ' ' || *c == '\t')
        .collect();
    (!indent.is_empty()).then_some(indent)
}

/// Default text-area behaviour for keys without special handling.
fn native(editor: &mut TextArea<'_>, key: KeyEvent) -> (KeyOutcome, bool) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Char('a') if ctrl => {
            editor.select_all();
            (KeyOutcome::Native, false)
        }
        KeyCode::Home if ctrl => {
            move_cursor(editor, CursorMove::Jump(0, 0), shift);
            (KeyOutcome::Native, false)
        }
        KeyCode::End if ctrl => {
            move_cursor(editor, CursorMove::Bottom, shift);
            move_cursor(editor, CursorMove::End, shift);
            (KeyOutcome::Native, false)
        }
        KeyCode::Tab => (KeyOutcome::Ignored, false),
        _ => (KeyOutcome::Native, editor.input(Input::from(key))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tab::TabManager;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn backtab() -> KeyEvent {
        KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT)
    }

    fn manager_with(text: &str) -> TabManager {
        let mut tm = TabManager::new();
        tm.create_tab("Untitled", None, text);
        tm
    }

    fn place(tm: &mut TabManager, pos: Pos) {
        jump(tm.editor_mut().expect("editable"), pos);
    }

    fn select(tm: &mut TabManager, anchor: Pos, cursor: Pos) {
        let editor = tm.editor_mut().expect("editable");
        jump(editor, anchor);
        editor.start_selection();
        jump(editor, cursor);
    }

    fn content(tm: &TabManager) -> Option<&str> {
        tm.active().map(|t| t.content.as_str())
    }

    #[test]
    fn tab_on_empty_editor_inserts_tab() {
        let mut tm = manager_with("");
        let out = handle_editor_key(&mut tm, key(KeyCode::Tab));
        assert_eq!(out, KeyOutcome::Handled);
        assert_eq!(tm.editor_text(), "\t");
        assert_eq!(tm.editor().cursor(), (0, 1));
        assert_eq!(content(&tm), Some("\t"));
    }

    #[test]
    fn tab_replaces_selection() {
        let mut tm = manager_with("abcdef");
        select(&mut tm, (0, 1), (0, 4));
        handle_editor_key(&mut tm, key(KeyCode::Tab));
        assert_eq!(tm.editor_text(), "a\tef");
        assert_eq!(tm.editor().cursor(), (0, 2));
    }

    #[test]
    fn tab_advances_cursor_by_one_mid_text() {
        let mut tm = manager_with("foo bar");
        place(&mut tm, (0, 3));
        handle_editor_key(&mut tm, key(KeyCode::Tab));
        assert_eq!(tm.editor_text(), "foo\t bar");
        assert_eq!(tm.editor().cursor(), (0, 4));
    }

    #[test]
    fn enter_carries_indent() {
        let mut tm = manager_with("\tfoo");
        place(&mut tm, (0, 4));
        let out = handle_editor_key(&mut tm, key(KeyCode::Enter));
        assert_eq!(out, KeyOutcome::Handled);
        assert_eq!(tm.editor_text(), "\tfoo\n\t");
        assert_eq!(tm.editor().cursor(), (1, 1));
        assert_eq!(content(&tm), Some("\tfoo\n\t"));
    }

    #[test]
    fn enter_after_double_tab_line() {
        let mut tm = manager_with("x\n\t\tbar\ny");
        place(&mut tm, (1, 5));
        handle_editor_key(&mut tm, key(KeyCode::Enter));
        assert_eq!(tm.editor_text(), "x\n\t\tbar\n\t\t\ny");
        assert_eq!(tm.editor().cursor(), (2, 2));
    }

    #[test]
    fn enter_keeps_mixed_whitespace_run() {
        let mut tm = manager_with("  \t x");
        place(&mut tm, (0, 5));
        handle_editor_key(&mut tm, key(KeyCode::Enter));
        assert_eq!(tm.editor_text(), "  \t x\n  \t ");
    }

    #[test]
    fn enter_inside_indent_copies_only_what_precedes_cursor() {
        let mut tm = manager_with("\t\tx");
        place(&mut tm, (0, 1));
        handle_editor_key(&mut tm, key(KeyCode::Enter));
        assert_eq!(tm.editor_text(), "\t\n\t\tx");
    }

    #[test]
    fn enter_without_indent_is_plain_newline() {
        let mut tm = manager_with("foo");
        place(&mut tm, (0, 3));
        let out = handle_editor_key(&mut tm, key(KeyCode::Enter));
        assert_eq!(out, KeyOutcome::Native);
        assert_eq!(tm.editor_text(), "foo\n");
        assert_eq!(tm.editor().cursor(), (1, 0));
    }

    #[test]
    fn shift_tab_outdents_each_selected_line_once() {
        let mut tm = manager_with("\t\ta\nb\n\tc\nd");
        select(&mut tm, (0, 0), (3, 0));
        let out = handle_editor_key(&mut tm, backtab());
        assert_eq!(out, KeyOutcome::Handled);
        assert_eq!(tm.editor_text(), "\ta\nb\nc\nd");
        assert_eq!(selection(tm.editor()), Some(((0, 0), (3, 0))));
        assert_eq!(content(&tm), Some("\ta\nb\nc\nd"));
    }

    #[test]
    fn shift_tab_leaves_space_indented_lines() {
        let mut tm = manager_with("    a\n\tb");
        select(&mut tm, (0, 0), (1, 2));
        handle_editor_key(&mut tm, KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT));
        assert_eq!(tm.editor_text(), "    a\nb");
    }

    #[test]
    fn shift_tab_ignores_line_after_selection_end_at_column_zero() {
        let mut tm = manager_with("\ta\n\tb");
        select(&mut tm, (0, 0), (1, 0));
        handle_editor_key(&mut tm, backtab());
        assert_eq!(tm.editor_text(), "a\n\tb");
    }

    #[test]
    fn shift_tab_removes_no_more_than_line_count() {
        let text = "\t\t\t1\n\t\t2\n\t3\n4";
        let mut tm = manager_with(text);
        tm.editor_mut().expect("editable").select_all();
        handle_editor_key(&mut tm, backtab());
        let removed = text.chars().count() - tm.editor_text().chars().count();
        assert_eq!(removed, 3);
        assert!(removed <= text.lines().count());
    }

    #[test]
    fn shift_tab_without_selection_does_nothing() {
        let mut tm = manager_with("\tfoo");
        place(&mut tm, (0, 2));
        let out = handle_editor_key(&mut tm, backtab());
        assert_eq!(out, KeyOutcome::Handled);
        assert_eq!(tm.editor_text(), "\tfoo");
        assert!(!tm.active().is_some_and(|t| t.dirty));
    }

    #[test]
    fn shift_tab_keeps_reversed_selection_direction() {
        let mut tm = manager_with("\tab\n\tcd");
        select(&mut tm, (1, 3), (0, 2));
        handle_editor_key(&mut tm, backtab());
        assert_eq!(tm.editor_text(), "ab\ncd");
        assert_eq!(tm.editor().cursor(), (0, 1));
        assert_eq!(selection(tm.editor()), Some(((0, 1), (1, 2))));
    }

    #[test]
    fn ctrl_enter_requests_run_without_editing() {
        let mut tm = TabManager::new();
        let id = tm.create_tab("a.cpp", Some(PathBuf::from("a.cpp")), "int main(){}");
        let out = handle_editor_key(&mut tm, KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL));
        assert_eq!(out, KeyOutcome::Run(Some(PathBuf::from("a.cpp"))));
        assert_eq!(tm.editor_text(), "int main(){}");
        assert!(!tm.get(id).is_some_and(|t| t.dirty));
    }

    #[test]
    fn typed_text_is_persisted_to_active_tab() {
        let mut tm = manager_with("");
        for c in "hi".chars() {
            handle_editor_key(&mut tm, key(KeyCode::Char(c)));
        }
        handle_editor_key(&mut tm, key(KeyCode::Backspace));
        assert_eq!(content(&tm), Some("h"));
    }

    #[test]
    fn movement_leaves_tab_content_alone() {
        let mut tm = manager_with("ab\ncd");
        tm.set_active_content("stale");
        let out = handle_editor_key(&mut tm, key(KeyCode::Down));
        assert_eq!(out, KeyOutcome::Native);
        assert_eq!(tm.editor().cursor(), (1, 0));
        assert_eq!(content(&tm), Some("stale"));
        handle_editor_key(&mut tm, key(KeyCode::Char('x')));
        assert_eq!(content(&tm), Some("ab\nxcd"));
    }

    #[test]
    fn shift_arrows_select() {
        let mut tm = manager_with("abc");
        handle_editor_key(&mut tm, KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT));
        handle_editor_key(&mut tm, KeyEvent::new(KeyCode::Right, KeyModifiers::SHIFT));
        assert_eq!(selection(tm.editor()), Some(((0, 0), (0, 2))));
        handle_editor_key(&mut tm, key(KeyCode::Char('z')));
        assert_eq!(tm.editor_text(), "zc");
    }

    #[test]
    fn keys_are_ignored_without_tabs() {
        let mut tm = TabManager::new();
        assert_eq!(handle_editor_key(&mut tm, key(KeyCode::Tab)), KeyOutcome::Ignored);
        assert_eq!(
            handle_editor_key(&mut tm, KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL)),
            KeyOutcome::Ignored
        );
        assert_eq!(tm.editor_text(), "");
    }
}
