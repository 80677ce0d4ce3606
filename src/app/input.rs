use super::App;

use ratatui::crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use tracing::debug;

use crate::error::Result;
use crate::keybinds::KeyAction;
use crate::types::{Focus, MenuId, PendingAction, PromptMode};
use crate::util::{inside, pending_hint, resolve_input_path};

impl App {
    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        if self.prompt.is_some() {
            return self.handle_prompt_key(key);
        }
        if self.settings_view.open {
            return self.handle_settings_key(key);
        }
        if self.menu.open.is_some() {
            return self.handle_menu_key(key);
        }
        if self.help_open {
            self.help_open = false;
            return Ok(());
        }

        if self.handle_pending_key(key)? {
            return Ok(());
        }

        // Stop only claims its key while something is running.
        if let Some(action) = self.keybinds.lookup(&key)
            && (action != KeyAction::Stop || self.runner.is_running())
        {
            return self.run_key_action(action);
        }

        match self.focus {
            Focus::Terminal if !self.settings.terminal_hidden => self.handle_terminal_key(key),
            _ => self.handle_editor_key(key),
        }
    }

    /// Quit confirmation. Returns true when the key was consumed.
    fn handle_pending_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.pending == PendingAction::None {
            return Ok(false);
        }
        match key.code {
            KeyCode::Char('y' | 'Y') if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.pending = PendingAction::None;
                self.quit = true;
                Ok(true)
            }
            KeyCode::Esc => {
                self.pending = PendingAction::None;
                self.set_status("Quit cancelled");
                Ok(true)
            }
            _ if self.keybinds.lookup(&key) == Some(KeyAction::Quit) => {
                self.run_key_action(KeyAction::Quit)?;
                Ok(true)
            }
            _ => {
                self.pending = PendingAction::None;
                Ok(false)
            }
        }
    }

    pub(crate) fn run_key_action(&mut self, action: KeyAction) -> Result<()> {
        debug!(?action, "key action");
        match action {
            KeyAction::Save => self.save_active()?,
            KeyAction::SaveAs => self.open_save_as_prompt(),
            KeyAction::Open => self.open_open_prompt(),
            KeyAction::NewTab => self.new_tab(),
            KeyAction::Run => self.build_and_run()?,
            KeyAction::Stop => self.stop_program()?,
            KeyAction::CloseTab => self.close_active_tab(),
            KeyAction::NextTab => self.next_tab(),
            KeyAction::PrevTab => self.prev_tab(),
            KeyAction::ToggleTerminal => self.toggle_terminal(),
            KeyAction::ToggleLayout => self.toggle_layout(),
            KeyAction::CopyTerminal => self.copy_terminal_output(),
            KeyAction::Settings => self.open_settings(),
            KeyAction::Menu => self.toggle_menu(MenuId::File),
            KeyAction::Help => self.help_open = !self.help_open,
            KeyAction::Quit => {
                if self.tabs.any_dirty() && self.pending != PendingAction::Quit {
                    self.pending = PendingAction::Quit;
                    self.set_status(pending_hint(self.pending));
                } else {
                    self.pending = PendingAction::None;
                    self.quit = true;
                }
            }
        }
        Ok(())
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(prompt) = self.prompt.as_mut() else {
            return Ok(());
        };
        match key.code {
            KeyCode::Esc => {
                self.prompt = None;
                self.set_status("Cancelled");
            }
            KeyCode::Enter => {
                let mode = prompt.mode;
                let value = prompt.value.clone();
                if value.trim().is_empty() && !matches!(mode, PromptMode::Setting(_)) {
                    self.set_status("Path cannot be empty");
                    return Ok(());
                }
                self.prompt = None;
                self.apply_prompt(mode, value)?;
            }
            KeyCode::Backspace => prompt.backspace(),
            KeyCode::Delete => prompt.delete(),
            KeyCode::Left => prompt.move_cursor(-1),
            KeyCode::Right => prompt.move_cursor(1),
            KeyCode::Home => prompt.home(),
            KeyCode::End => prompt.end(),
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                prompt.insert(c);
            }
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn apply_prompt(&mut self, mode: PromptMode, value: String) -> Result<()> {
        match mode {
            PromptMode::Open => {
                let path = resolve_input_path(&value, &self.cwd);
                if path.is_dir() {
                    self.set_status(format!("{} is a directory", path.display()));
                } else if path.exists() {
                    self.open_file(path)?;
                } else {
                    self.open_new_file_tab(path);
                }
            }
            PromptMode::SaveAs => {
                let path = resolve_input_path(&value, &self.cwd);
                if path.is_dir() {
                    self.set_status(format!("{} is a directory", path.display()));
                } else {
                    self.save_active_as(path)?;
                }
            }
            PromptMode::Setting(field) => {
                if field.set_text(&mut self.settings, value) {
                    self.persist_settings();
                    self.set_status(format!("{} updated", field.label()));
                }
            }
        }
        Ok(())
    }

    pub(crate) fn handle_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let (x, y) = (mouse.column, mouse.row);
        let left_down = matches!(mouse.kind, MouseEventKind::Down(MouseButton::Left));

        if self.help_open {
            if left_down {
                self.help_open = false;
            }
            return Ok(());
        }
        if self.prompt.is_some() {
            if left_down {
                if inside(x, y, self.prompt_rect) {
                    let inner_x = x.saturating_sub(self.prompt_rect.x + 1) as isize;
                    if let Some(prompt) = self.prompt.as_mut() {
                        prompt.home();
                        prompt.move_cursor(inner_x);
                    }
                } else {
                    self.prompt = None;
                    self.set_status("Cancelled");
                }
            }
            return Ok(());
        }
        if self.settings_view.open {
            return self.handle_settings_mouse(mouse);
        }
        if inside(x, y, self.menu_bar_rect) || self.menu.open.is_some() {
            return self.handle_menu_mouse(mouse);
        }

        if inside(x, y, self.tab_bar_rect) {
            if left_down {
                let hit = self.tab_rects.iter().find_map(|(id, name, close)| {
                    if inside(x, y, *close) {
                        Some((*id, true))
                    } else if inside(x, y, *name) {
                        Some((*id, false))
                    } else {
                        None
                    }
                });
                match hit {
                    Some((id, true)) => self.close_tab(id),
                    Some((id, false)) => self.switch_to_tab(id),
                    None => {}
                }
            }
            return Ok(());
        }

        if inside(x, y, self.editor_rect) || self.editor_dragging {
            self.handle_editor_mouse(mouse);
            return Ok(());
        }
        if !self.settings.terminal_hidden && inside(x, y, self.terminal.rect) {
            self.handle_terminal_mouse(mouse);
        }
        Ok(())
    }
}
