use super::App;

use ratatui::crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::error::Result;
use crate::types::MenuId;
use crate::util::inside;

impl App {
    /// Open `menu`, or close it when it is already open.
    pub(crate) fn toggle_menu(&mut self, menu: MenuId) {
        if self.menu.open == Some(menu) {
            self.close_menu();
        } else {
            self.menu.open = Some(menu);
            self.menu.index = 0;
        }
    }

    pub(crate) fn close_menu(&mut self) {
        self.menu.open = None;
        self.menu.index = 0;
    }

    /// Close the menu and run its selected item.
    fn activate_menu_item(&mut self) -> Result<()> {
        let Some(menu) = self.menu.open else {
            return Ok(());
        };
        let action = menu.items().get(self.menu.index).copied();
        self.close_menu();
        match action {
            Some(action) => self.run_key_action(action),
            None => Ok(()),
        }
    }

    pub(crate) fn handle_menu_key(&mut self, key: KeyEvent) -> Result<()> {
        let Some(menu) = self.menu.open else {
            return Ok(());
        };
        let len = menu.items().len();
        match key.code {
            KeyCode::Esc | KeyCode::F(10) => self.close_menu(),
            KeyCode::Up => self.menu.index = (self.menu.index + len - 1) % len,
            KeyCode::Down => self.menu.index = (self.menu.index + 1) % len,
            KeyCode::Left | KeyCode::Right => {
                self.menu.open = Some(menu.step(key.code == KeyCode::Right));
                self.menu.index = 0;
            }
            KeyCode::Enter => self.activate_menu_item()?,
            _ => {}
        }
        Ok(())
    }

    pub(crate) fn handle_menu_mouse(&mut self, mouse: MouseEvent) -> Result<()> {
        let (x, y) = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                let title = self
                    .menu
                    .title_rects
                    .iter()
                    .find(|(_, rect)| inside(x, y, *rect))
                    .map(|(id, _)| *id);
                if let Some(id) = title {
                    self.toggle_menu(id);
                    return Ok(());
                }
                if self.menu.open.is_some() && inside(x, y, self.menu.dropdown_rect) {
                    // First item sits below the dropdown's top border.
                    let row = y.saturating_sub(self.menu.dropdown_rect.y + 1) as usize;
                    let len = self.menu.open.map_or(0, |m| m.items().len());
                    if y > self.menu.dropdown_rect.y && row < len {
                        self.menu.index = row;
                        return self.activate_menu_item();
                    }
                    return Ok(());
                }
                self.close_menu();
            }
            MouseEventKind::Moved if self.menu.open.is_some() => {
                if inside(x, y, self.menu.dropdown_rect) && y > self.menu.dropdown_rect.y {
                    let row = (y - self.menu.dropdown_rect.y - 1) as usize;
                    let len = self.menu.open.map_or(0, |m| m.items().len());
                    if row < len {
                        self.menu.index = row;
                    }
                } else if let Some((id, _)) = self
                    .menu
                    .title_rects
                    .iter()
                    .find(|(_, rect)| inside(x, y, *rect))
                    .copied()
                {
                    if self.menu.open != Some(id) {
                        self.menu.open = Some(id);
                        self.menu.index = 0;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }
}
