use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::persistence::KEYBINDS_FILE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum KeyAction {
    Save,
    SaveAs,
    Open,
    NewTab,
    Run,
    Stop,
    CloseTab,
    NextTab,
    PrevTab,
    ToggleTerminal,
    ToggleLayout,
    CopyTerminal,
    Settings,
    Menu,
    Help,
    Quit,
}

impl KeyAction {
    pub(crate) fn label(self) -> &'static str {
        match self {
            KeyAction::Save => "Save",
            KeyAction::SaveAs => "Save As",
            KeyAction::Open => "Open File",
            KeyAction::NewTab => "New Tab",
            KeyAction::Run => "Build & Run",
            KeyAction::Stop => "Stop Program",
            KeyAction::CloseTab => "Close Tab",
            KeyAction::NextTab => "Next Tab",
            KeyAction::PrevTab => "Previous Tab",
            KeyAction::ToggleTerminal => "Toggle Terminal",
            KeyAction::ToggleLayout => "Toggle Layout",
            KeyAction::CopyTerminal => "Copy Output",
            KeyAction::Settings => "Settings",
            KeyAction::Menu => "Menu",
            KeyAction::Help => "Help",
            KeyAction::Quit => "Quit",
        }
    }

    pub(crate) fn all() -> &'static [KeyAction] {
        &[
            KeyAction::Save,
            KeyAction::SaveAs,
            KeyAction::Open,
            KeyAction::NewTab,
            KeyAction::Run,
            KeyAction::Stop,
            KeyAction::CloseTab,
            KeyAction::NextTab,
            KeyAction::PrevTab,
            KeyAction::ToggleTerminal,
            KeyAction::ToggleLayout,
            KeyAction::CopyTerminal,
            KeyAction::Settings,
            KeyAction::Menu,
            KeyAction::Help,
            KeyAction::Quit,
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyBind {
    pub(crate) modifiers: KeyModifiers,
    pub(crate) code: KeyCode,
}

impl KeyBind {
    pub(crate) fn normalize_char_with_modifiers(code: KeyCode, modifiers: KeyModifiers) -> KeyCode {
        match code {
            KeyCode::Char(c) if modifiers.contains(KeyModifiers::CONTROL) => {
                let u = c as u32;
                if (1..=26).contains(&u) {
                    let letter = (b'a' + (u as u8) - 1) as char;
                    KeyCode::Char(letter)
                } else {
                    KeyCode::Char(c)
                }
            }
            other => other,
        }
    }

    pub(crate) fn parse(s: &str) -> Option<KeyBind> {
        let parts: Vec<&str> = s.split('+').collect();
        if parts.is_empty() {
            return None;
        }
        let mut modifiers = KeyModifiers::NONE;
        for &part in &parts[..parts.len() - 1] {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" => modifiers |= KeyModifiers::CONTROL,
                "shift" => modifiers |= KeyModifiers::SHIFT,
                "alt" => modifiers |= KeyModifiers::ALT,
                _ => return None,
            }
        }
        let key_str = parts.last()?;
        let lower = key_str.to_ascii_lowercase();
        let code = match lower.as_str() {
            " " | "space" => KeyCode::Char(' '),
            "esc" | "escape" => KeyCode::Esc,
            "enter" | "return" => KeyCode::Enter,
            "tab" => KeyCode::Tab,
            "backtab" => KeyCode::BackTab,
            "backspace" => KeyCode::Backspace,
            "delete" | "del" => KeyCode::Delete,
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "home" => KeyCode::Home,
            "end" => KeyCode::End,
            "pageup" => KeyCode::PageUp,
            "pagedown" => KeyCode::PageDown,
            f if f.len() > 1 && f.starts_with('f') => {
                let n = f[1..].parse::<u8>().ok().filter(|n| (1..=12).contains(n))?;
                KeyCode::F(n)
            }
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return None,
                }
            }
        };
        Some(KeyBind { modifiers, code })
    }

    fn key_name(&self) -> String {
        match self.code {
            KeyCode::Char(' ') => "Space".to_string(),
            KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
            KeyCode::F(n) => format!("F{n}"),
            KeyCode::Esc => "Esc".to_string(),
            KeyCode::Enter => "Enter".to_string(),
            KeyCode::Tab => "Tab".to_string(),
            KeyCode::BackTab => "BackTab".to_string(),
            KeyCode::Backspace => "Backspace".to_string(),
            KeyCode::Delete => "Delete".to_string(),
            KeyCode::Up => "Up".to_string(),
            KeyCode::Down => "Down".to_string(),
            KeyCode::Left => "Left".to_string(),
            KeyCode::Right => "Right".to_string(),
            KeyCode::Home => "Home".to_string(),
            KeyCode::End => "End".to_string(),
            KeyCode::PageUp => "PageUp".to_string(),
            KeyCode::PageDown => "PageDown".to_string(),
            _ => "?".to_string(),
        }
    }

    pub(crate) fn display(&self) -> String {
        let mut parts = Vec::new();
        if self.modifiers.contains(KeyModifiers::CONTROL) {
            parts.push("Ctrl".to_string());
        }
        if self.modifiers.contains(KeyModifiers::SHIFT) {
            parts.push("Shift".to_string());
        }
        if self.modifiers.contains(KeyModifiers::ALT) {
            parts.push("Alt".to_string());
        }
        parts.push(self.key_name());
        parts.join("+")
    }

    pub(crate) fn matches(&self, key: &KeyEvent) -> bool {
        let bind_code = KeyBind::normalize_char_with_modifiers(self.code, self.modifiers);
        let ev_code = KeyBind::normalize_char_with_modifiers(key.code, key.modifiers);
        // BackTab already implies Shift.
        if bind_code == KeyCode::BackTab && ev_code == KeyCode::BackTab {
            return key.modifiers - KeyModifiers::SHIFT == self.modifiers - KeyModifiers::SHIFT;
        }
        // Terminals may report uppercase letters without SHIFT, so chars compare caselessly.
        let lower = |code: KeyCode| match code {
            KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
            other => other,
        };
        let mut ev_mods = key.modifiers;
        // Symbols such as `,` may need Shift on some layouts. Shift on a letter is
        // part of the binding: ctrl+shift+s is not ctrl+s.
        if let KeyCode::Char(c) = bind_code
            && !c.is_alphabetic()
            && !self.modifiers.contains(KeyModifiers::SHIFT)
        {
            ev_mods -= KeyModifiers::SHIFT;
        }
        lower(ev_code) == lower(bind_code) && ev_mods == self.modifiers
    }

    pub(crate) fn conflicts_with(&self, other: &KeyBind) -> bool {
        self.matches(&KeyEvent::new(other.code, other.modifiers))
            || other.matches(&KeyEvent::new(self.code, self.modifiers))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct KeyBindings {
    pub(crate) map: HashMap<KeyAction, Vec<KeyBind>>,
}

impl KeyBindings {
    pub(crate) fn defaults() -> Self {
        let mut map: HashMap<KeyAction, Vec<KeyBind>> = HashMap::new();
        let mut bind = |action: KeyAction, s: &str| {
            map.entry(action)
                .or_default()
                .push(KeyBind::parse(s).expect("invalid default keybind"));
        };

        bind(KeyAction::Save, "ctrl+s");
        bind(KeyAction::SaveAs, "ctrl+shift+s");
        bind(KeyAction::Open, "ctrl+o");
        bind(KeyAction::NewTab, "ctrl+n");
        bind(KeyAction::Run, "ctrl+enter");
        bind(KeyAction::Run, "f5");
        bind(KeyAction::Stop, "ctrl+c");
        bind(KeyAction::CloseTab, "ctrl+f4");
        bind(KeyAction::CloseTab, "ctrl+w");
        bind(KeyAction::NextTab, "ctrl+tab");
        bind(KeyAction::NextTab, "f2");
        bind(KeyAction::PrevTab, "ctrl+backtab");
        bind(KeyAction::PrevTab, "f1");
        bind(KeyAction::ToggleTerminal, "ctrl+`");
        bind(KeyAction::ToggleTerminal, "f12");
        bind(KeyAction::ToggleLayout, "alt+l");
        bind(KeyAction::CopyTerminal, "ctrl+shift+c");
        bind(KeyAction::Settings, "ctrl+,");
        bind(KeyAction::Menu, "f10");
        bind(KeyAction::Help, "f3");
        bind(KeyAction::Quit, "ctrl+q");

        KeyBindings { map }
    }

    /// First action (in [`KeyAction::all`] order) bound to `key`.
    pub(crate) fn lookup(&self, key: &KeyEvent) -> Option<KeyAction> {
        KeyAction::all().iter().copied().find(|action| {
            self.map
                .get(action)
                .is_some_and(|binds| binds.iter().any(|b| b.matches(key)))
        })
    }

    pub(crate) fn display_for(&self, action: KeyAction) -> String {
        self.map
            .get(&action)
            .and_then(|v| v.first())
            .map(|b| b.display())
            .unwrap_or_else(|| "unbound".to_string())
    }

    #[cfg(test)]
    pub(crate) fn conflicts(&self) -> Vec<(KeyBind, KeyAction, KeyAction)> {
        let mut result = Vec::new();
        let actions = KeyAction::all();
        for (i, a1) in actions.iter().enumerate() {
            for a2 in &actions[i + 1..] {
                if let (Some(binds1), Some(binds2)) = (self.map.get(a1), self.map.get(a2)) {
                    for b1 in binds1 {
                        for b2 in binds2 {
                            if b1.conflicts_with(b2) {
                                result.push((b1.clone(), *a1, *a2));
                            }
                        }
                    }
                }
            }
        }
        result
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum SingleOrVec {
    Single(String),
    Multiple(Vec<String>),
}

pub(crate) fn parse_key_action_name(name: &str) -> Option<KeyAction> {
    serde_json::from_value::<KeyAction>(serde_json::Value::String(name.to_string())).ok()
}

pub(crate) fn apply_keybinding_overrides(
    kb: &mut KeyBindings,
    overrides: HashMap<String, SingleOrVec>,
    source: &str,
) {
    for (action_name, val) in overrides {
        let Some(action) = parse_key_action_name(&action_name) else {
            warn!(action = %action_name, source, "unknown key action");
            continue;
        };
        let strings = match val {
            SingleOrVec::Single(s) => vec![s],
            SingleOrVec::Multiple(v) => v,
        };
        if strings.is_empty() {
            kb.map.insert(action, Vec::new());
            continue;
        }
        let mut binds = Vec::new();
        let mut invalid = Vec::new();
        for s in strings {
            match KeyBind::parse(&s) {
                Some(parsed) => binds.push(parsed),
                None => invalid.push(s),
            }
        }
        if !invalid.is_empty() {
            warn!(
                action = %action_name,
                source,
                "invalid keybind(s): {}",
                invalid.join(", ")
            );
        }
        if !binds.is_empty() {
            kb.map.insert(action, binds);
        }
    }
}

pub(crate) fn parse_override_entry(
    action_name: &str,
    raw: serde_json::Value,
    source: &str,
) -> Option<(String, SingleOrVec)> {
    match raw {
        serde_json::Value::String(s) => Some((action_name.to_string(), SingleOrVec::Single(s))),
        serde_json::Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                if let serde_json::Value::String(s) = item {
                    out.push(s);
                } else {
                    warn!(action = action_name, source, "keybind list items must be strings");
                    return None;
                }
            }
            Some((action_name.to_string(), SingleOrVec::Multiple(out)))
        }
        _ => {
            warn!(
                action = action_name,
                source, "keybind must be a string or an array of strings"
            );
            None
        }
    }
}

/// Defaults plus the overrides in `<dir>/keybinds.json`.
pub(crate) fn load_keybindings(dir: Option<&Path>) -> KeyBindings {
    match dir {
        Some(dir) => load_keybindings_from(&dir.join(KEYBINDS_FILE)),
        None => KeyBindings::defaults(),
    }
}

pub(crate) fn load_keybindings_from(path: &Path) -> KeyBindings {
    let mut kb = KeyBindings::defaults();
    let Ok(raw) = fs::read_to_string(path) else {
        return kb;
    };
    let source = path.display().to_string();
    let Ok(root) = serde_json::from_str::<serde_json::Value>(&raw) else {
        warn!(source, "invalid keybinds json");
        return kb;
    };
    let Some(obj) = root.as_object() else {
        warn!(source, "keybinds json must be an object");
        return kb;
    };
    let mut overrides: HashMap<String, SingleOrVec> = HashMap::new();
    for (action_name, raw_val) in obj {
        if let Some((k, v)) = parse_override_entry(action_name, raw_val.clone(), &source) {
            overrides.insert(k, v);
        }
    }
    apply_keybinding_overrides(&mut kb, overrides, &source);
    kb
}
