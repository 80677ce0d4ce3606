use serde::{Deserialize, Serialize};

/// How the editor and the terminal panel share the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutMode {
    /// Terminal below the editor.
    #[default]
    Stacked,
    /// Terminal to the right of the editor.
    SideBySide,
}

impl LayoutMode {
    pub fn toggled(self) -> Self {
        match self {
            LayoutMode::Stacked => LayoutMode::SideBySide,
            LayoutMode::SideBySide => LayoutMode::Stacked,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LayoutMode::Stacked => "stacked",
            LayoutMode::SideBySide => "side by side",
        }
    }
}

/// User preferences, stored as `settings.json` in the config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Find `compiler` on `PATH` instead of using `compiler_path`.
    pub lookup_compiler: bool,
    /// Reopen the tabs of the previous session at startup.
    pub save_tabs: bool,
    pub compiler_path: String,
    pub compiler: String,
    /// Extra compiler flags, split like a shell would.
    pub flags: String,
    pub include_path: String,
    pub lib_path: String,
    pub terminal_hidden: bool,
    pub layout: LayoutMode,
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lookup_compiler: true,
            save_tabs: false,
            compiler_path: String::new(),
            compiler: "g++".to_string(),
            flags: String::new(),
            include_path: String::new(),
            lib_path: String::new(),
            terminal_hidden: false,
            layout: LayoutMode::Stacked,
            theme: String::new(),
        }
    }
}

/// One row of the settings overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingField {
    LookupCompiler,
    Compiler,
    CompilerPath,
    Flags,
    IncludePath,
    LibPath,
    SaveTabs,
    TerminalHidden,
    Layout,
    Theme,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Toggle,
    Text,
    /// Cycles through a fixed set of values.
    Choice,
}

impl SettingField {
    pub fn all() -> &'static [SettingField] {
        &[
            SettingField::LookupCompiler,
            SettingField::Compiler,
            SettingField::CompilerPath,
            SettingField::Flags,
            SettingField::IncludePath,
            SettingField::LibPath,
            SettingField::SaveTabs,
            SettingField::TerminalHidden,
            SettingField::Layout,
            SettingField::Theme,
        ]
    }

    pub fn label(self) -> &'static str {
        match self {
            SettingField::LookupCompiler => "Look up compiler on PATH",
            SettingField::Compiler => "Compiler",
            SettingField::CompilerPath => "Compiler path",
            SettingField::Flags => "Compiler flags",
            SettingField::IncludePath => "Include path",
            SettingField::LibPath => "Library path",
            SettingField::SaveTabs => "Restore tabs on startup",
            SettingField::TerminalHidden => "Hide terminal",
            SettingField::Layout => "Layout",
            SettingField::Theme => "Theme",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            SettingField::LookupCompiler | SettingField::SaveTabs | SettingField::TerminalHidden => {
                FieldKind::Toggle
            }
            SettingField::Layout | SettingField::Theme => FieldKind::Choice,
            _ => FieldKind::Text,
        }
    }

    /// Current value as shown in the overlay.
    pub fn display(self, settings: &Settings) -> String {
        let flag = |b: bool| if b { "on" } else { "off" }.to_string();
        match self {
            SettingField::LookupCompiler => flag(settings.lookup_compiler),
            SettingField::SaveTabs => flag(settings.save_tabs),
            SettingField::TerminalHidden => flag(settings.terminal_hidden),
            SettingField::Layout => settings.layout.label().to_string(),
            SettingField::Theme if settings.theme.is_empty() => "(default)".to_string(),
            _ => self.text(settings).unwrap_or_default().to_string(),
        }
    }

    /// The raw string behind a text field.
    pub fn text(self, settings: &Settings) -> Option<&str> {
        let s = match self {
            SettingField::Compiler => &settings.compiler,
            SettingField::CompilerPath => &settings.compiler_path,
            SettingField::Flags => &settings.flags,
            SettingField::IncludePath => &settings.include_path,
            SettingField::LibPath => &settings.lib_path,
            SettingField::Theme => &settings.theme,
            _ => return None,
        };
        Some(s)
    }

    /// Store `value` into a text field. Returns false for non-text fields.
    pub fn set_text(self, settings: &mut Settings, value: String) -> bool {
        let slot = match self {
            SettingField::Compiler => &mut settings.compiler,
            SettingField::CompilerPath => &mut settings.compiler_path,
            SettingField::Flags => &mut settings.flags,
            SettingField::IncludePath => &mut settings.include_path,
            SettingField::LibPath => &mut settings.lib_path,
            SettingField::Theme => &mut settings.theme,
            _ => return false,
        };
        *slot = value.trim().to_string();
        true
    }

    /// Flip a toggle field or advance the layout. Returns false otherwise.
    pub fn toggle(self, settings: &mut Settings) -> bool {
        match self {
            SettingField::LookupCompiler => settings.lookup_compiler = !settings.lookup_compiler,
            SettingField::SaveTabs => settings.save_tabs = !settings.save_tabs,
            SettingField::TerminalHidden => settings.terminal_hidden = !settings.terminal_hidden,
            SettingField::Layout => settings.layout = settings.layout.toggled(),
            _ => return false,
        }
        true
    }
}
