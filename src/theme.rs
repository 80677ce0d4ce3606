use std::fs;
use std::path::{Path, PathBuf};

use include_dir::{Dir, include_dir};
use ratatui::style::Color;
use serde::Deserialize;
use tracing::warn;

static EMBEDDED_THEMES: Dir = include_dir!("$CARGO_MANIFEST_DIR/themes");

#[derive(Debug, Clone)]
pub(crate) struct Theme {
    pub(crate) name: String,
    pub(crate) theme_type: String,
    pub(crate) bg: Color,
    pub(crate) bg_alt: Color,
    pub(crate) fg: Color,
    pub(crate) fg_muted: Color,
    pub(crate) border: Color,
    pub(crate) accent: Color,
    pub(crate) accent_secondary: Color,
    pub(crate) selection: Color,
    pub(crate) error: Color,
    pub(crate) success: Color,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThemeFile {
    pub(crate) name: String,
    #[serde(rename = "type")]
    pub(crate) theme_type: String,
    pub(crate) colors: ThemeColors,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ThemeColors {
    pub(crate) background: String,
    #[serde(rename = "backgroundAlt")]
    pub(crate) background_alt: String,
    pub(crate) foreground: String,
    #[serde(rename = "foregroundMuted")]
    pub(crate) foreground_muted: String,
    pub(crate) border: String,
    pub(crate) accent: String,
    #[serde(default, rename = "accentSecondary")]
    pub(crate) accent_secondary: Option<String>,
    pub(crate) selection: String,
    #[serde(default)]
    pub(crate) red: Option<String>,
    #[serde(default)]
    pub(crate) green: Option<String>,
}

pub(crate) fn color_from_hex(input: &str, fallback: Color) -> Color {
    let s = input.trim();
    if let Some(stripped) = s.strip_prefix('#')
        && stripped.len() == 6
    {
        let r = u8::from_str_radix(&stripped[0..2], 16).ok();
        let g = u8::from_str_radix(&stripped[2..4], 16).ok();
        let b = u8::from_str_radix(&stripped[4..6], 16).ok();
        if let (Some(r), Some(g), Some(b)) = (r, g, b) {
            return Color::Rgb(r, g, b);
        }
    }
    fallback
}

fn optional_color(value: Option<&String>, fallback: Color) -> Color {
    value.map_or(fallback, |c| color_from_hex(c, fallback))
}

pub(crate) fn theme_from_file(tf: ThemeFile) -> Theme {
    let c = &tf.colors;
    Theme {
        bg: color_from_hex(&c.background, Color::Rgb(20, 22, 31)),
        bg_alt: color_from_hex(&c.background_alt, Color::Rgb(25, 28, 39)),
        fg: color_from_hex(&c.foreground, Color::Rgb(215, 213, 189)),
        fg_muted: color_from_hex(&c.foreground_muted, Color::Rgb(100, 100, 120)),
        border: color_from_hex(&c.border, Color::Rgb(127, 122, 88)),
        accent: color_from_hex(&c.accent, Color::Rgb(206, 198, 130)),
        accent_secondary: optional_color(c.accent_secondary.as_ref(), Color::Rgb(86, 156, 214)),
        selection: color_from_hex(&c.selection, Color::Rgb(51, 70, 124)),
        error: optional_color(c.red.as_ref(), Color::Rgb(224, 108, 117)),
        success: optional_color(c.green.as_ref(), Color::Rgb(152, 195, 121)),
        name: tf.name,
        theme_type: tf.theme_type,
    }
}

fn parse_theme(raw: &str, source: &str) -> Option<Theme> {
    match serde_json::from_str::<ThemeFile>(raw) {
        Ok(tf) => Some(theme_from_file(tf)),
        Err(err) => {
            warn!(source, %err, "skipping invalid theme");
            None
        }
    }
}

/// Themes from `<config>/themes` when that directory has any, else the embedded set.
/// Dark themes sort first.
pub(crate) fn load_themes(config_dir: Option<&Path>) -> Vec<Theme> {
    let mut themes = Vec::new();

    if let Some(dir) = config_dir.map(|d| d.join("themes"))
        && dir.is_dir()
    {
        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
            .ok()
            .into_iter()
            .flat_map(|rd| rd.filter_map(Result::ok))
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|e| e == "json"))
            .collect();
        paths.sort();
        for path in paths {
            let Ok(raw) = fs::read_to_string(&path) else {
                continue;
            };
            themes.extend(parse_theme(&raw, &path.display().to_string()));
        }
    }
    if themes.is_empty() {
        let mut files: Vec<_> = EMBEDDED_THEMES
            .files()
            .filter(|f| f.path().extension().is_some_and(|e| e == "json"))
            .collect();
        files.sort_by_key(|f| f.path());
        for file in files {
            let Some(raw) = file.contents_utf8() else {
                continue;
            };
            themes.extend(parse_theme(raw, &file.path().display().to_string()));
        }
    }
    themes.sort_by_key(|t| (t.theme_type != "dark", t.name.to_ascii_lowercase()));
    themes
}

/// Index of the theme called `name` (case-insensitive), else 0.
pub(crate) fn theme_index(themes: &[Theme], name: &str) -> usize {
    themes
        .iter()
        .position(|t| t.name.eq_ignore_ascii_case(name))
        .unwrap_or(0)
}

/// Used when no theme could be loaded at all.
pub(crate) fn fallback_theme() -> Theme {
    Theme {
        name: "Fallback".to_string(),
        theme_type: "dark".to_string(),
        bg: Color::Reset,
        bg_alt: Color::Reset,
        fg: Color::Reset,
        fg_muted: Color::DarkGray,
        border: Color::Gray,
        accent: Color::Yellow,
        accent_secondary: Color::Cyan,
        selection: Color::Blue,
        error: Color::Red,
        success: Color::Green,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r##"{"name":"Test Theme","type":"dark","colors":{"background":"#1a1b26","backgroundAlt":"#16161e","foreground":"#a9b1d6","foregroundMuted":"#565f89","border":"#414868","accent":"#7aa2f7","selection":"#364a82"}}"##;

    #[test]
    fn deserialize_and_convert() {
        let tf: ThemeFile = serde_json::from_str(MINIMAL).unwrap();
        let theme = theme_from_file(tf);
        assert_eq!(theme.name, "Test Theme");
        assert_eq!(theme.bg, Color::Rgb(26, 27, 38));
        assert_eq!(theme.accent, Color::Rgb(122, 162, 247));
        // Optional colors fall back.
        assert_eq!(theme.error, Color::Rgb(224, 108, 117));
        assert_eq!(theme.accent_secondary, Color::Rgb(86, 156, 214));
    }

    #[test]
    fn missing_required_color_fails() {
        let json = r##"{"name":"X","type":"dark","colors":{"background":"#000000"}}"##;
        assert!(serde_json::from_str::<ThemeFile>(json).is_err());
    }

    #[test]
    fn invalid_hex_uses_fallback() {
        assert_eq!(color_from_hex("#FF0000", Color::White), Color::Rgb(255, 0, 0));
        assert_eq!(color_from_hex("  #aabbcc ", Color::White), Color::Rgb(170, 187, 204));
        assert_eq!(color_from_hex("#FFF", Color::White), Color::White);
        assert_eq!(color_from_hex("#GGGGGG", Color::White), Color::White);
        assert_eq!(color_from_hex("red", Color::White), Color::White);
    }

    #[test]
    fn embedded_themes_load_dark_first() {
        let themes = load_themes(None);
        assert!(themes.len() >= 2);
        assert_eq!(themes[0].theme_type, "dark");
        assert_eq!(themes.last().map(|t| t.theme_type.as_str()), Some("light"));
    }

    #[test]
    fn config_dir_themes_override_embedded() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("themes")).unwrap();
        fs::write(dir.path().join("themes").join("mine.json"), MINIMAL).unwrap();
        fs::write(dir.path().join("themes").join("broken.json"), "{").unwrap();
        let themes = load_themes(Some(dir.path()));
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Test Theme");
    }

    #[test]
    fn lookup_by_name() {
        let themes = load_themes(None);
        let idx = theme_index(&themes, "paper");
        assert_eq!(themes[idx].name, "Paper");
        assert_eq!(theme_index(&themes, "no such theme"), 0);
    }
}
