use super::{App, MenuState, SettingsView, TerminalPanel};
use std::env;
use std::path::PathBuf;

use ratatui::layout::Rect;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::keybinds::load_keybindings;
use crate::persistence::{Session, config_dir, load_session, load_settings, save_session, save_settings};
use crate::runner::{ProcessRunner, RunEvent};
use crate::tab::TabManager;
use crate::theme::{Theme, fallback_theme, load_themes, theme_index};
use crate::types::{Focus, PendingAction};

impl App {
    pub(crate) const SCROLL_LINES: usize = 3;
    pub(crate) const TERMINAL_MAX_LINES: usize = 5000;

    pub(crate) fn new() -> Result<Self> {
        let cwd = env::current_dir()?;
        Ok(Self::with_config(config_dir(), cwd))
    }

    /// Build an app reading and writing its configuration under `config_dir`.
    pub(crate) fn with_config(config_dir: Option<PathBuf>, cwd: PathBuf) -> Self {
        let settings = config_dir
            .as_deref()
            .map(load_settings)
            .unwrap_or_default();
        let keybinds = load_keybindings(config_dir.as_deref());
        let mut themes = load_themes(config_dir.as_deref());
        if themes.is_empty() {
            themes.push(fallback_theme());
        }
        let active_theme_index = theme_index(&themes, &settings.theme);
        info!(config = ?config_dir, themes = themes.len(), "app initialized");
        Self {
            tabs: TabManager::new(),
            focus: Focus::Editor,
            status: String::new(),
            pending: PendingAction::None,
            quit: false,
            prompt: None,
            prompt_rect: Rect::default(),
            menu: MenuState {
                open: None,
                index: 0,
                title_rects: Vec::new(),
                dropdown_rect: Rect::default(),
            },
            help_open: false,
            settings_view: SettingsView {
                open: false,
                index: 0,
                rect: Rect::default(),
            },
            settings,
            config_dir,
            cwd,
            keybinds,
            themes,
            active_theme_index,
            runner: ProcessRunner::new(),
            terminal: TerminalPanel {
                lines: Vec::new(),
                status: None,
                scroll_back: 0,
                rect: Rect::default(),
            },
            scratch: None,
            clipboard: None,
            menu_bar_rect: Rect::default(),
            tab_bar_rect: Rect::default(),
            tab_rects: Vec::new(),
            editor_rect: Rect::default(),
            editor_scroll_row: 0,
            editor_scroll_col: 0,
            editor_dragging: false,
        }
    }

    pub(crate) fn active_theme(&self) -> &Theme {
        let idx = self.active_theme_index.min(self.themes.len().saturating_sub(1));
        &self.themes[idx]
    }

    pub(crate) fn set_status(&mut self, msg: impl Into<String>) {
        self.status = msg.into();
        debug!(status = %self.status);
    }

    /// Write settings to disk, reporting failures on the status line.
    pub(crate) fn persist_settings(&mut self) {
        let Some(dir) = self.config_dir.clone() else {
            return;
        };
        if let Err(err) = save_settings(&dir, &self.settings) {
            warn!(%err, "failed to save settings");
            self.set_status(format!("Could not save settings: {err}"));
        }
    }

    /// Advance to the next theme and remember it.
    pub(crate) fn cycle_theme(&mut self) {
        self.active_theme_index = (self.active_theme_index + 1) % self.themes.len().max(1);
        self.settings.theme = self.active_theme().name.clone();
        self.persist_settings();
        self.set_status(format!("Theme: {}", self.settings.theme));
    }

    /// Open files named on the command line. Missing paths become empty tabs bound to them.
    pub(crate) fn open_startup_files(&mut self, files: Vec<PathBuf>) {
        for file in files {
            let path = if file.is_absolute() {
                file
            } else {
                self.cwd.join(file)
            };
            let result = if path.exists() {
                self.open_file(path.clone())
            } else {
                self.open_new_file_tab(path.clone());
                Ok(())
            };
            if let Err(err) = result {
                warn!(path = %path.display(), %err, "could not open file");
                self.set_status(format!("Could not open {}: {err}", path.display()));
            }
        }
    }

    pub(crate) fn restore_session(&mut self) {
        if !self.settings.save_tabs {
            return;
        }
        let Some(session) = self.config_dir.as_deref().and_then(load_session) else {
            return;
        };
        let mut opened = 0;
        for path in &session.files {
            match self.open_file(path.clone()) {
                Ok(()) => opened += 1,
                Err(err) => warn!(path = %path.display(), %err, "skipping session file"),
            }
        }
        let active = session
            .active
            .and_then(|i| session.files.get(i))
            .and_then(|p| self.tabs.find_by_path(p));
        if let Some(id) = active {
            self.tabs.activate_tab(id);
        }
        info!(restored = opened, "session restored");
    }

    pub(crate) fn store_session(&mut self) {
        if !self.settings.save_tabs {
            return;
        }
        let Some(dir) = self.config_dir.clone() else {
            return;
        };
        let active = self.tabs.active_id();
        let mut session = Session::default();
        for tab in self.tabs.tabs() {
            let Some(path) = tab.file_path.clone() else {
                continue;
            };
            if Some(tab.id) == active {
                session.active = Some(session.files.len());
            }
            session.files.push(path);
        }
        if let Err(err) = save_session(&dir, &session) {
            warn!(%err, "failed to save session");
        }
    }

    /// Drain runner events into the terminal panel.
    pub(crate) fn poll_runner(&mut self) {
        for event in self.runner.poll() {
            match event {
                RunEvent::Output(line) => self.push_terminal_line(line),
                RunEvent::Status(status) => {
                    self.terminal.status = Some(status);
                    self.set_status(status.label());
                }
                RunEvent::Finished => {
                    if self.focus == Focus::Terminal && self.settings.terminal_hidden {
                        self.focus = Focus::Editor;
                    }
                }
            }
        }
    }

    /// Persist state and stop any running program before exiting.
    pub(crate) fn shutdown(&mut self) {
        self.store_session();
        self.persist_settings();
        if let Err(err) = self.runner.stop() {
            warn!(%err, "failed to stop running program");
        }
        info!("shutdown");
    }
}
