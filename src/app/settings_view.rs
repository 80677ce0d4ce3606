use super::App;

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::error::Result;
use crate::settings::{FieldKind, SettingField};
use crate::types::{PromptMode, PromptState};
use crate::util::inside;

impl App {
    pub(crate) fn open_settings(&mut self) {
        self.settings_view.open = true;
        self.settings_view.index = 0;
    }

    pub(crate) fn close_settings(&mut self) {
        self.settings_view.open = false;
    }

    pub(crate) fn selected_setting(&self) -> SettingField {
        let all = SettingField::all();
        all[self.settings_view.index.min(all.len() - 1)]
    }

    pub(crate) fn handle_settings_key(&mut self, key: KeyEvent) -> Result<()> {
        let len = SettingField::all().len();
        match key.code {
            KeyCode::Esc => self.close_settings(),
            KeyCode::Up => {
                self.settings_view.index = (self.settings_view.index + len - 1) % len;
            }
            KeyCode::Down => self.settings_view.index = (self.settings_view.index + 1) % len,
            KeyCode::Enter | KeyCode::Char(' ') => self.activate_setting(self.selected_setting()),
            _ => {}
        }
        Ok(())
    }

    fn activate_setting(&mut self, field: SettingField) {
        match field.kind() {
            FieldKind::Toggle if field == SettingField::TerminalHidden => self.toggle_terminal(),
            FieldKind::Toggle => {
                field.toggle(&mut self.settings);
                self.persist_settings();
                self.set_status(format!("{}: {}", field.label(), field.display(&self.settings)));
            }
            FieldKind::Text => {
                let value = field.text(&self.settings).unwrap_or_default().to_string();
                self.prompt = Some(PromptState::new(
                    field.label(),
                    value,
                    PromptMode::Setting(field),
                ));
            }
            FieldKind::Choice if field == SettingField::Theme => self.cycle_theme(),
            FieldKind::Choice => self.toggle_layout(),
        }
    }

    pub(crate) fn handle_settings_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let rect = self.settings_view.rect;
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if !inside(mouse.column, mouse.row, rect) {
                    self.close_settings();
                    return Ok(());
                }
                let Some(row) = mouse.row.checked_sub(rect.y + 1) else {
                    return Ok(());
                };
                let row = row as usize;
                if row < SettingField::all().len() {
                    self.settings_view.index = row;
                    self.activate_setting(self.selected_setting());
                }
            }
            MouseEventKind::ScrollUp => {
                self.settings_view.index = self.settings_view.index.saturating_sub(1);
            }
            MouseEventKind::ScrollDown => {
                self.settings_view.index =
                    (self.settings_view.index + 1).min(SettingField::all().len() - 1);
            }
            _ => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::test_support::new_app;
    use crate::settings::LayoutMode;
    use ratatui::crossterm::event::KeyModifiers;
    use tempfile::tempdir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn select(app: &mut App, field: SettingField) {
        app.settings_view.index = SettingField::all()
            .iter()
            .position(|f| *f == field)
            .expect("field listed");
    }

    #[test]
    fn enter_toggles_bool_and_persists() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.open_settings();
        select(&mut app, SettingField::SaveTabs);
        app.handle_key(key(KeyCode::Enter)).expect("enter");
        assert!(app.settings.save_tabs);
        assert!(new_app(tmp.path()).settings.save_tabs);
    }

    #[test]
    fn text_field_opens_prefilled_prompt() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.open_settings();
        select(&mut app, SettingField::Compiler);
        app.handle_key(key(KeyCode::Enter)).expect("enter");
        let prompt = app.prompt.as_ref().expect("prompt");
        assert_eq!(prompt.value, "g++");
        assert_eq!(prompt.mode, PromptMode::Setting(SettingField::Compiler));

        for _ in 0..3 {
            app.handle_key(key(KeyCode::Backspace)).expect("backspace");
        }
        for c in "clang++".chars() {
            app.handle_key(key(KeyCode::Char(c))).expect("char");
        }
        app.handle_key(key(KeyCode::Enter)).expect("enter");
        assert_eq!(app.settings.compiler, "clang++");
        // Settings overlay stays open behind the prompt.
        assert!(app.settings_view.open);
    }

    #[test]
    fn layout_choice_cycles() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.open_settings();
        select(&mut app, SettingField::Layout);
        app.handle_key(key(KeyCode::Enter)).expect("enter");
        assert_eq!(app.settings.layout, LayoutMode::SideBySide);
    }

    #[test]
    fn navigation_wraps_and_escape_closes() {
        let tmp = tempdir().expect("tempdir");
        let mut app = new_app(tmp.path());
        app.open_settings();
        app.handle_key(key(KeyCode::Up)).expect("up");
        assert_eq!(app.selected_setting(), *SettingField::all().last().expect("fields"));
        app.handle_key(key(KeyCode::Down)).expect("down");
        assert_eq!(app.settings_view.index, 0);
        app.handle_key(key(KeyCode::Esc)).expect("esc");
        assert!(!app.settings_view.open);
    }
}
