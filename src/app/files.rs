use super::App;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::tab::{TabId, label_for_path};
use crate::types::{Focus, PromptMode, PromptState};
use crate::util::looks_binary;

impl App {
    pub(crate) fn new_tab(&mut self) {
        self.tabs.create_tab("Untitled", None, "");
        self.after_tab_change();
        self.set_status("New tab");
    }

    /// Empty tab bound to a file that does not exist yet.
    pub(crate) fn open_new_file_tab(&mut self, path: PathBuf) -> TabId {
        let id = self
            .tabs
            .create_tab(label_for_path(&path), Some(path.clone()), "");
        self.after_tab_change();
        self.set_status(format!("New file {}", path.display()));
        id
    }

    pub(crate) fn open_file(&mut self, path: PathBuf) -> Result<()> {
        if self.switch_to_path(&path) {
            self.set_status(format!("Switched to {}", label_for_path(&path)));
            return Ok(());
        }
        let bytes = fs::read(&path)?;
        if looks_binary(&bytes) {
            self.set_status(format!("Cannot open binary file: {}", path.display()));
            return Ok(());
        }
        let text = String::from_utf8_lossy(&bytes).into_owned();
        info!(path = %path.display(), bytes = bytes.len(), "open file");
        self.tabs
            .create_tab(label_for_path(&path), Some(path.clone()), text);
        self.after_tab_change();
        self.set_status(format!("Opened {}", path.display()));
        Ok(())
    }

    /// Activate the tab showing `path`, if any.
    pub(crate) fn switch_to_path(&mut self, path: &Path) -> bool {
        match self.tabs.find_by_path(path) {
            Some(id) => {
                self.switch_to_tab(id);
                true
            }
            None => false,
        }
    }

    pub(crate) fn switch_to_tab(&mut self, id: TabId) {
        if self.tabs.active_id() == Some(id) {
            return;
        }
        self.tabs.activate_tab(id);
        self.after_tab_change();
    }

    pub(crate) fn next_tab(&mut self) {
        self.tabs.next_tab();
        self.after_tab_change();
    }

    pub(crate) fn prev_tab(&mut self) {
        self.tabs.prev_tab();
        self.after_tab_change();
    }

    fn after_tab_change(&mut self) {
        self.editor_scroll_row = 0;
        self.editor_scroll_col = 0;
        self.editor_dragging = false;
        if !self.tabs.is_empty() {
            self.focus = Focus::Editor;
        }
    }

    pub(crate) fn open_open_prompt(&mut self) {
        let start = format!("{}/", self.cwd.display());
        self.prompt = Some(PromptState::new("Open file", start, PromptMode::Open));
    }

    pub(crate) fn open_save_as_prompt(&mut self) {
        let Some(tab) = self.tabs.active() else {
            self.set_status("No tab to save");
            return;
        };
        let start = match &tab.file_path {
            Some(p) => p.display().to_string(),
            None => format!("{}/", self.cwd.display()),
        };
        self.prompt = Some(PromptState::new("Save as", start, PromptMode::SaveAs));
    }

    /// Save the active tab, asking for a path when it has none.
    pub(crate) fn save_active(&mut self) -> Result<()> {
        let Some(tab) = self.tabs.active() else {
            self.set_status("No tab to save");
            return Ok(());
        };
        match tab.file_path.clone() {
            Some(path) => self.save_active_as(path),
            None => {
                self.open_save_as_prompt();
                Ok(())
            }
        }
    }

    /// Write the active tab to `path` and bind the tab to it.
    pub(crate) fn save_active_as(&mut self, path: PathBuf) -> Result<()> {
        self.tabs.sync_editor_to_active();
        let Some(tab) = self.tabs.active() else {
            return Ok(());
        };
        let id = tab.id;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &tab.content)?;
        info!(path = %path.display(), "saved");
        self.tabs.mark_saved(id, path.clone());
        self.set_status(format!("Saved {}", path.display()));
        Ok(())
    }

    pub(crate) fn close_active_tab(&mut self) {
        if let Some(id) = self.tabs.active_id() {
            self.close_tab(id);
        }
    }

    pub(crate) fn close_tab(&mut self, id: TabId) {
        let Some(tab) = self.tabs.get(id) else {
            return;
        };
        let msg = if tab.dirty {
            format!("Closed {} (unsaved changes discarded)", tab.label)
        } else {
            format!("Closed {}", tab.label)
        };
        let was_active = self.tabs.active_id() == Some(id);
        self.tabs.close_tab(id);
        if was_active {
            self.after_tab_change();
        }
        self.set_status(msg);
    }
}
