use crate::keybinds::KeyAction;
use crate::settings::SettingField;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Focus {
    Editor,
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PendingAction {
    None,
    /// Quit requested while tabs have unsaved changes.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PromptMode {
    Open,
    SaveAs,
    Setting(SettingField),
}

/// Single-line text input shown over the editor. `cursor` counts chars.
#[derive(Debug, Clone)]
pub(crate) struct PromptState {
    pub(crate) title: String,
    pub(crate) value: String,
    pub(crate) cursor: usize,
    pub(crate) mode: PromptMode,
}

impl PromptState {
    pub(crate) fn new(title: impl Into<String>, value: impl Into<String>, mode: PromptMode) -> Self {
        let value = value.into();
        Self {
            title: title.into(),
            cursor: value.chars().count(),
            value,
            mode,
        }
    }

    fn byte_at(&self, char_idx: usize) -> usize {
        self.value
            .char_indices()
            .nth(char_idx)
            .map_or(self.value.len(), |(b, _)| b)
    }

    pub(crate) fn insert(&mut self, ch: char) {
        let at = self.byte_at(self.cursor);
        self.value.insert(at, ch);
        self.cursor += 1;
    }

    pub(crate) fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        let at = self.byte_at(self.cursor);
        self.value.remove(at);
    }

    pub(crate) fn delete(&mut self) {
        if self.cursor < self.value.chars().count() {
            let at = self.byte_at(self.cursor);
            self.value.remove(at);
        }
    }

    pub(crate) fn move_cursor(&mut self, delta: isize) {
        let len = self.value.chars().count();
        self.cursor = self.cursor.saturating_add_signed(delta).min(len);
    }

    pub(crate) fn home(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn end(&mut self) {
        self.cursor = self.value.chars().count();
    }
}

/// Top-level menus in menu bar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MenuId {
    File,
    Run,
    View,
    Settings,
}

impl MenuId {
    pub(crate) fn all() -> &'static [MenuId] {
        &[MenuId::File, MenuId::Run, MenuId::View, MenuId::Settings]
    }

    pub(crate) fn title(self) -> &'static str {
        match self {
            MenuId::File => "File",
            MenuId::Run => "Run",
            MenuId::View => "View",
            MenuId::Settings => "Settings",
        }
    }

    pub(crate) fn items(self) -> &'static [KeyAction] {
        match self {
            MenuId::File => &[
                KeyAction::NewTab,
                KeyAction::Open,
                KeyAction::Save,
                KeyAction::SaveAs,
                KeyAction::CloseTab,
                KeyAction::Quit,
            ],
            MenuId::Run => &[KeyAction::Run, KeyAction::Stop, KeyAction::CopyTerminal],
            MenuId::View => &[
                KeyAction::ToggleTerminal,
                KeyAction::ToggleLayout,
                KeyAction::NextTab,
                KeyAction::PrevTab,
            ],
            MenuId::Settings => &[KeyAction::Settings, KeyAction::Help],
        }
    }

    /// Neighbouring menu, wrapping at both ends.
    pub(crate) fn step(self, forward: bool) -> MenuId {
        let all = Self::all();
        let idx = all.iter().position(|m| *m == self).unwrap_or(0);
        let len = all.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        all[next]
    }
}
