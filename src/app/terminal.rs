use super::App;
use std::fs;
use std::path::PathBuf;

use arboard::Clipboard;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use tracing::{info, warn};

use crate::error::Result;
use crate::runner::BuildConfig;
use crate::types::Focus;

impl App {
    /// Save the active tab (or a scratch copy of it) and compile and run it.
    pub(crate) fn build_and_run(&mut self) -> Result<()> {
        let Some(tab) = self.tabs.active() else {
            self.set_status("No tab to run");
            return Ok(());
        };
        if self.runner.is_running() {
            self.set_status("A program is already running");
            return Ok(());
        }
        let path = tab.file_path.clone();
        let config = BuildConfig::from_settings(&self.settings)?;
        let source = match path {
            Some(path) => {
                self.save_active_as(path.clone())?;
                path
            }
            None => self.write_scratch()?,
        };

        self.clear_terminal();
        if self.settings.terminal_hidden {
            self.settings.terminal_hidden = false;
            self.persist_settings();
        }
        self.focus = Focus::Terminal;
        if self.runner.start(source, config) {
            self.set_status("Building...");
        }
        Ok(())
    }

    /// Untitled tabs run from a temp `.cpp` file kept for the whole session.
    fn write_scratch(&mut self) -> Result<PathBuf> {
        self.tabs.sync_editor_to_active();
        let content = self
            .tabs
            .active()
            .map(|t| t.content.clone())
            .unwrap_or_default();
        let file = match self.scratch.take() {
            Some(file) => file,
            None => tempfile::Builder::new()
                .prefix("cedit-")
                .suffix(".cpp")
                .tempfile()?,
        };
        fs::write(file.path(), content)?;
        let path = file.path().to_path_buf();
        self.scratch = Some(file);
        Ok(path)
    }

    pub(crate) fn stop_program(&mut self) -> Result<()> {
        if self.runner.stop()? {
            info!("program stopped by user");
            self.push_terminal_line("^C".to_string());
            self.set_status("Stopped");
        }
        Ok(())
    }

    pub(crate) fn handle_terminal_key(&mut self, key: KeyEvent) -> Result<()> {
        let ctrl_or_alt = key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
        match key.code {
            KeyCode::Esc => self.focus = Focus::Editor,
            KeyCode::Enter => self.flush_terminal_input()?,
            KeyCode::Backspace => self.runner.pop_char(),
            KeyCode::Tab => self.runner.push_char('\t'),
            KeyCode::Char(c) if !ctrl_or_alt => self.runner.push_char(c),
            KeyCode::PageUp => self.scroll_terminal(true, self.terminal_rows().max(1)),
            KeyCode::PageDown => self.scroll_terminal(false, self.terminal_rows().max(1)),
            _ => {}
        }
        Ok(())
    }

    /// Send the typed line to the program and echo it in the panel.
    pub(crate) fn flush_terminal_input(&mut self) -> Result<()> {
        if !self.runner.is_running() {
            self.runner.flush_line()?;
            self.set_status("No program is running");
            return Ok(());
        }
        let line = self.runner.flush_line()?;
        self.push_terminal_line(line.trim_end_matches('\n').to_string());
        Ok(())
    }

    pub(crate) fn push_terminal_line(&mut self, line: String) {
        self.terminal.lines.push(line);
        let len = self.terminal.lines.len();
        if len > Self::TERMINAL_MAX_LINES {
            self.terminal.lines.drain(..len - Self::TERMINAL_MAX_LINES);
        }
        self.terminal.scroll_back = 0;
    }

    pub(crate) fn clear_terminal(&mut self) {
        self.terminal.lines.clear();
        self.terminal.status = None;
        self.terminal.scroll_back = 0;
    }

    fn terminal_rows(&self) -> usize {
        // Border plus the input line.
        self.terminal.rect.height.saturating_sub(3) as usize
    }

    fn scroll_terminal(&mut self, up: bool, lines: usize) {
        let max = self.terminal.lines.len().saturating_sub(self.terminal_rows());
        self.terminal.scroll_back = if up {
            (self.terminal.scroll_back + lines).min(max)
        } else {
            self.terminal.scroll_back.saturating_sub(lines)
        };
    }

    pub(crate) fn toggle_terminal(&mut self) {
        self.settings.terminal_hidden = !self.settings.terminal_hidden;
        self.focus = if self.settings.terminal_hidden {
            Focus::Editor
        } else {
            Focus::Terminal
        };
        self.persist_settings();
        self.set_status(if self.settings.terminal_hidden {
            "Terminal hidden"
        } else {
            "Terminal shown"
        });
    }

    pub(crate) fn toggle_layout(&mut self) {
        self.settings.layout = self.settings.layout.toggled();
        self.persist_settings();
        self.set_status(format!("Layout: {}", self.settings.layout.label()));
    }

    pub(crate) fn copy_terminal_output(&mut self) {
        if self.terminal.lines.is_empty() {
            self.set_status("Nothing to copy");
            return;
        }
        let text = self.terminal.lines.join("\n");
        if self.clipboard.is_none() {
            self.clipboard = Clipboard::new().ok();
        }
        let Some(clipboard) = self.clipboard.as_mut() else {
            self.set_status("Clipboard unavailable");
            return;
        };
        match clipboard.set_text(text) {
            Ok(()) => self.set_status(format!("Copied {} lines", self.terminal.lines.len())),
            Err(err) => {
                warn!(%err, "clipboard write failed");
                self.set_status("Clipboard unavailable");
            }
        }
    }

    pub(crate) fn handle_terminal_mouse(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.focus = Focus::Terminal,
            MouseEventKind::ScrollUp => self.scroll_terminal(true, Self::SCROLL_LINES),
            MouseEventKind::ScrollDown => self.scroll_terminal(false, Self::SCROLL_LINES),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::new_app;
    use tempfile::tempdir;

    #[test]
    fn run_without_tab_is_ignored() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.build_and_run().expect("run");
        assert_eq!(app.status, "No tab to run");
        assert!(!app.runner.is_running());
    }

    #[test]
    fn run_saves_file_and_focuses_terminal() {
        let tmp = tempdir().expect("tempdir");
        let file = tmp.path().join("main.cpp");
        fs::write(&file, "old").expect("write");
        let mut app = new_app(tmp.path());
        // A compiler that cannot exist keeps the test independent of the toolchain.
        app.settings.lookup_compiler = false;
        app.settings.compiler_path = tmp.path().join("nowhere").display().to_string();
        app.settings.terminal_hidden = true;
        app.open_file(file.clone()).expect("open");
        app.tabs.editor_mut().expect("editable").select_all();
        app.tabs.editor_mut().expect("editable").insert_str("new");
        app.tabs.sync_editor_to_active();
        app.push_terminal_line("stale".to_string());

        app.build_and_run().expect("run");
        assert_eq!(fs::read_to_string(&file).expect("read"), "new");
        assert!(!app.tabs.any_dirty());
        assert!(!app.settings.terminal_hidden);
        assert_eq!(app.focus, Focus::Terminal);
        assert!(!app.terminal.lines.contains(&"stale".to_string()));
    }

    #[test]
    fn untitled_tab_runs_from_scratch_file() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.settings.lookup_compiler = false;
        app.settings.compiler_path = tmp.path().join("nowhere").display().to_string();
        app.new_tab();
        app.tabs.editor_mut().expect("editable").insert_str("int main() {}");
        app.tabs.sync_editor_to_active();
        app.build_and_run().expect("run");
        let scratch = app.scratch.as_ref().expect("scratch file");
        assert_eq!(scratch.path().extension().and_then(|e| e.to_str()), Some("cpp"));
        assert_eq!(fs::read_to_string(scratch.path()).expect("read"), "int main() {}");
        assert!(app.tabs.active().is_some_and(|t| t.file_path.is_none()));
    }

    #[test]
    fn bad_flags_fail_the_action() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.settings.flags = "'unterminated".to_string();
        app.new_tab();
        assert!(app.build_and_run().is_err());
    }

    #[test]
    fn terminal_keys_edit_the_input_line() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.focus = Focus::Terminal;
        for code in [KeyCode::Char('4'), KeyCode::Char('2'), KeyCode::Backspace, KeyCode::Tab] {
            app.handle_terminal_key(KeyEvent::new(code, KeyModifiers::NONE))
                .expect("key");
        }
        assert_eq!(app.runner.pending_input(), "4\t");
        app.handle_terminal_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE))
            .expect("enter");
        assert_eq!(app.runner.pending_input(), "");
        assert_eq!(app.status, "No program is running");
        app.handle_terminal_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE))
            .expect("esc");
        assert_eq!(app.focus, Focus::Editor);
    }

    #[test]
    fn output_is_bounded() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        for i in 0..App::TERMINAL_MAX_LINES + 10 {
            app.push_terminal_line(i.to_string());
        }
        assert_eq!(app.terminal.lines.len(), App::TERMINAL_MAX_LINES);
        assert_eq!(app.terminal.lines[0], "10");
    }

    #[test]
    fn toggles_persist() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.toggle_terminal();
        assert!(app.settings.terminal_hidden);
        assert_eq!(app.focus, Focus::Editor);
        app.toggle_layout();
        let reloaded = new_app(tmp.path());
        assert!(reloaded.settings.terminal_hidden);
        assert_eq!(reloaded.settings.layout, app.settings.layout);
        app.toggle_terminal();
        assert_eq!(app.focus, Focus::Terminal);
    }
}
