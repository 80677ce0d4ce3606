use std::path::PathBuf;

use arboard::Clipboard;
use ratatui::layout::Rect;
use tempfile::NamedTempFile;

use crate::keybinds::KeyBindings;
use crate::runner::{ProcessRunner, RunStatus};
use crate::settings::Settings;
use crate::tab::{TabId, TabManager};
use crate::theme::Theme;
use crate::types::{Focus, MenuId, PendingAction, PromptState};

mod core;
mod editor;
mod files;
mod input;
mod menu;
mod settings_view;
mod terminal;

pub(crate) struct MenuState {
    pub(crate) open: Option<MenuId>,
    pub(crate) index: usize,
    pub(crate) title_rects: Vec<(MenuId, Rect)>,
    pub(crate) dropdown_rect: Rect,
}

pub(crate) struct TerminalPanel {
    pub(crate) lines: Vec<String>,
    pub(crate) status: Option<RunStatus>,
    /// Lines scrolled up from the bottom; 0 follows new output.
    pub(crate) scroll_back: usize,
    pub(crate) rect: Rect,
}

pub(crate) struct SettingsView {
    pub(crate) open: bool,
    pub(crate) index: usize,
    pub(crate) rect: Rect,
}

pub(crate) struct App {
    pub(crate) tabs: TabManager,
    pub(crate) focus: Focus,
    pub(crate) status: String,
    pub(crate) pending: PendingAction,
    pub(crate) quit: bool,
    pub(crate) prompt: Option<PromptState>,
    pub(crate) prompt_rect: Rect,
    pub(crate) menu: MenuState,
    pub(crate) help_open: bool,
    pub(crate) settings_view: SettingsView,
    pub(crate) settings: Settings,
    /// Where settings, session and keybinds live; `None` disables writing them.
    pub(crate) config_dir: Option<PathBuf>,
    pub(crate) cwd: PathBuf,
    pub(crate) keybinds: KeyBindings,
    pub(crate) themes: Vec<Theme>,
    pub(crate) active_theme_index: usize,
    pub(crate) runner: ProcessRunner,
    pub(crate) terminal: TerminalPanel,
    /// Source file for running tabs that have no path yet.
    pub(crate) scratch: Option<NamedTempFile>,
    pub(crate) clipboard: Option<Clipboard>,
    pub(crate) menu_bar_rect: Rect,
    pub(crate) tab_bar_rect: Rect,
    pub(crate) tab_rects: Vec<(TabId, Rect, Rect)>,
    pub(crate) editor_rect: Rect,
    pub(crate) editor_scroll_row: usize,
    pub(crate) editor_scroll_col: usize,
    pub(crate) editor_dragging: bool,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::App;
    use std::path::Path;

    /// App with its config dir and working dir inside `dir`.
    pub(crate) fn new_app(dir: &Path) -> App {
        App::with_config(Some(dir.join("config")), dir.to_path_buf())
    }
}
