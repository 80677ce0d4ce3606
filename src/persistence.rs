use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Result;
use crate::settings::Settings;

const APP_DIR: &str = "cedit";

/// Tabs to reopen at startup.
#[derive(Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub(crate) struct Session {
    #[serde(default)]
    pub(crate) files: Vec<PathBuf>,
    /// Index into `files` of the tab that was active.
    #[serde(default)]
    pub(crate) active: Option<usize>,
}

/// `$XDG_CONFIG_HOME/cedit` when set, else the platform config dir.
pub(crate) fn config_dir() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Some(PathBuf::from(xdg).join(APP_DIR));
    }
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

pub(crate) const SETTINGS_FILE: &str = "settings.json";
pub(crate) const SESSION_FILE: &str = "session.json";
pub(crate) const KEYBINDS_FILE: &str = "keybinds.json";

/// Read a JSON file. Missing files are silent; malformed ones are logged.
pub(crate) fn load_json<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let raw = fs::read_to_string(path).ok()?;
    match serde_json::from_str::<T>(&raw) {
        Ok(v) => Some(v),
        Err(err) => {
            warn!(path = %path.display(), %err, "ignoring malformed file");
            None
        }
    }
}

pub(crate) fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(value)?;
    fs::write(path, raw)?;
    Ok(())
}

pub(crate) fn load_settings(dir: &Path) -> Settings {
    load_json(&dir.join(SETTINGS_FILE)).unwrap_or_default()
}

pub(crate) fn save_settings(dir: &Path, settings: &Settings) -> Result<()> {
    save_json(&dir.join(SETTINGS_FILE), settings)
}

pub(crate) fn load_session(dir: &Path) -> Option<Session> {
    load_json(&dir.join(SESSION_FILE))
}

pub(crate) fn save_session(dir: &Path, session: &Session) -> Result<()> {
    save_json(&dir.join(SESSION_FILE), session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::LayoutMode;

    #[test]
    fn settings_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            flags: "-std=c++17".to_string(),
            layout: LayoutMode::SideBySide,
            ..Settings::default()
        };
        save_json(&path, &settings).unwrap();
        let loaded: Settings = load_json(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn missing_and_malformed_files_load_as_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_json::<Settings>(&dir.path().join("absent.json")).is_none());
        let bad = dir.path().join("bad.json");
        fs::write(&bad, "{ nope").unwrap();
        assert!(load_json::<Session>(&bad).is_none());
    }

    #[test]
    fn session_tolerates_missing_fields() {
        let s: Session = serde_json::from_str(r#"{"files": ["a.cpp"]}"#).unwrap();
        assert_eq!(s.files, vec![PathBuf::from("a.cpp")]);
        assert_eq!(s.active, None);
    }

    #[test]
    fn settings_default_when_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_settings(dir.path()), Settings::default());
        let mut s = Settings::default();
        s.save_tabs = true;
        save_settings(dir.path(), &s).unwrap();
        assert!(load_settings(dir.path()).save_tabs);
    }

    #[test]
    fn session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_session(dir.path()).is_none());
        let session = Session {
            files: vec![PathBuf::from("/src/a.cpp"), PathBuf::from("/src/b.cpp")],
            active: Some(1),
        };
        save_session(dir.path(), &session).unwrap();
        assert_eq!(load_session(dir.path()), Some(session));
    }

    #[test]
    fn config_dir_ends_with_app_name() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with(APP_DIR));
        }
    }
}
