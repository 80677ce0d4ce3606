use std::fmt;
use std::path::{Path, PathBuf};

use ratatui_textarea::TextArea;
use tracing::debug;

/// Sequential tab identifier; never reused within a [`TabManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// One open document.
#[derive(Debug, Clone)]
pub struct Tab {
    pub id: TabId,
    pub label: String,
    pub file_path: Option<PathBuf>,
    pub content: String,
    /// Content as last loaded from or written to disk.
    saved_content: String,
    pub dirty: bool,
}

/// Display label for a file path: its final component.
pub fn label_for_path(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// Editor holding `text`, split on `\n` only so saving writes it back unchanged.
pub(crate) fn editor_for_text(text: &str) -> TextArea<'static> {
    TextArea::from(text.split('\n').map(str::to_string).collect::<Vec<_>>())
}

/// Owns the open tabs, the active-tab pointer and the shared editor.
///
/// Invariant: `active` is `Some` exactly when `tabs` is non-empty, and the
/// editor can only be borrowed mutably while a tab is active.
#[derive(Debug)]
pub struct TabManager {
    tabs: Vec<Tab>,
    active: Option<TabId>,
    next_id: u64,
    editor: TextArea<'static>,
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            tabs: Vec::new(),
            active: None,
            next_id: 1,
            editor: TextArea::default(),
        }
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn editor(&self) -> &TextArea<'static> {
        &self.editor
    }

    /// `None` while no tab is active; the editor is read-only then.
    pub fn editor_mut(&mut self) -> Option<&mut TextArea<'static>> {
        self.active?;
        Some(&mut self.editor)
    }

    pub fn is_read_only(&self) -> bool {
        self.active.is_none()
    }

    pub fn editor_text(&self) -> String {
        self.editor.lines().join("\n")
    }

    pub fn active_id(&self) -> Option<TabId> {
        self.active
    }

    pub fn active_index(&self) -> Option<usize> {
        let id = self.active?;
        self.index_of(id)
    }

    pub fn active(&self) -> Option<&Tab> {
        let idx = self.active_index()?;
        self.tabs.get(idx)
    }

    pub fn active_mut(&mut self) -> Option<&mut Tab> {
        let idx = self.active_index()?;
        self.tabs.get_mut(idx)
    }

    pub fn get(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == id)
    }

    pub fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == id)
    }

    pub fn find_by_path(&self, path: &Path) -> Option<TabId> {
        self.tabs
            .iter()
            .find(|t| t.file_path.as_deref() == Some(path))
            .map(|t| t.id)
    }

    pub fn any_dirty(&self) -> bool {
        self.tabs.iter().any(|t| t.dirty)
    }

    /// Append a tab, make it active and show `initial_content` in the editor.
    pub fn create_tab(
        &mut self,
        label: impl Into<String>,
        file_path: Option<PathBuf>,
        initial_content: impl Into<String>,
    ) -> TabId {
        let id = TabId(self.next_id);
        self.next_id += 1;
        let content = initial_content.into();
        let tab = Tab {
            id,
            label: label.into(),
            file_path,
            saved_content: content.clone(),
            content,
            dirty: false,
        };
        debug!(%id, label = %tab.label, "create tab");
        self.editor = editor_for_text(&tab.content);
        self.tabs.push(tab);
        self.active = Some(id);
        id
    }

    /// Make `id` the active tab and load its content into the editor.
    pub fn activate_tab(&mut self, id: TabId) {
        if self.active == Some(id) {
            return;
        }
        let Some(idx) = self.index_of(id) else {
            return;
        };
        debug!(%id, "activate tab");
        self.active = Some(id);
        self.editor = editor_for_text(&self.tabs[idx].content);
    }

    /// Remove `id`; if it was active the previous tab (else the next) takes over.
    pub fn close_tab(&mut self, id: TabId) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        debug!(%id, "close tab");
        self.tabs.remove(idx);
        if self.active != Some(id) {
            return;
        }
        self.active = None;
        let replacement = if idx > 0 {
            self.tabs.get(idx - 1)
        } else {
            self.tabs.first()
        };
        match replacement.map(|t| t.id) {
            Some(next) => self.activate_tab(next),
            None => self.editor = TextArea::default(),
        }
    }

    /// Overwrite the active tab's content. No-op without an active tab.
    pub fn set_active_content(&mut self, text: impl Into<String>) {
        let Some(tab) = self.active_mut() else {
            return;
        };
        tab.content = text.into();
        tab.dirty = tab.content != tab.saved_content;
    }

    /// Copy the editor text into the active tab.
    pub fn sync_editor_to_active(&mut self) {
        if self.active.is_none() {
            return;
        }
        let text = self.editor_text();
        self.set_active_content(text);
    }

    /// Record that `id` was written to `path` with its current content.
    pub fn mark_saved(&mut self, id: TabId, path: PathBuf) {
        let Some(idx) = self.index_of(id) else {
            return;
        };
        let tab = &mut self.tabs[idx];
        tab.label = label_for_path(&path);
        tab.file_path = Some(path);
        tab.saved_content = tab.content.clone();
        tab.dirty = false;
    }

    /// Following tab in insertion order, wrapping to the first.
    pub fn next_tab(&mut self) {
        self.cycle(true);
    }

    pub fn prev_tab(&mut self) {
        self.cycle(false);
    }

    fn cycle(&mut self, forward: bool) {
        let Some(idx) = self.active_index() else {
            return;
        };
        let len = self.tabs.len();
        let target = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        let id = self.tabs[target].id;
        self.activate_tab(id);
    }
}
