use std::path::{Path, PathBuf};

use ratatui::layout::Rect;
use unicode_width::UnicodeWidthChar;

use crate::types::PendingAction;

/// Columns a tab character occupies on screen.
pub(crate) const TAB_WIDTH: usize = 4;

/// Bytes inspected when deciding whether a file is binary.
const BINARY_SNIFF_LEN: usize = 8192;

pub(crate) fn pending_hint(pending: PendingAction) -> String {
    match pending {
        PendingAction::None => String::new(),
        PendingAction::Quit => {
            "Unsaved changes: quit again or Y to discard, Esc to cancel".to_string()
        }
    }
}

pub(crate) fn char_width(c: char) -> usize {
    if c == '\t' {
        TAB_WIDTH
    } else {
        c.width().unwrap_or(0)
    }
}

/// Screen width of `s` with tabs expanded.
pub(crate) fn display_width(s: &str) -> usize {
    s.chars().map(char_width).sum()
}

/// Screen width of the first `chars` chars of `line`.
pub(crate) fn prefix_width(line: &str, chars: usize) -> usize {
    line.chars().take(chars).map(char_width).sum()
}

/// Char index in `line` whose cell covers display column `col`
/// (the line length when `col` is past the end).
pub(crate) fn char_at_column(line: &str, col: usize) -> usize {
    let mut x = 0;
    for (i, c) in line.chars().enumerate() {
        let w = char_width(c);
        if col < x + w.max(1) {
            return i;
        }
        x += w;
    }
    line.chars().count()
}

pub(crate) fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}

/// Resolve user-typed `input` against `cwd`, expanding a leading `~`.
pub(crate) fn resolve_input_path(input: &str, cwd: &Path) -> PathBuf {
    let input = input.trim();
    if let Some(rest) = input.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest);
    }
    let path = PathBuf::from(input);
    if path.is_absolute() {
        path
    } else {
        cwd.join(path)
    }
}

pub(crate) fn inside(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

pub(crate) fn to_u16_saturating(v: usize) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tabs_count_as_four_columns() {
        assert_eq!(display_width("\tab"), 6);
        assert_eq!(display_width("日本"), 4);
        assert_eq!(display_width(""), 0);
        assert_eq!(prefix_width("\tab", 2), 5);
        assert_eq!(prefix_width("ab", 9), 2);
    }

    #[test]
    fn column_to_char_index() {
        let line = "\tab";
        assert_eq!(char_at_column(line, 0), 0);
        assert_eq!(char_at_column(line, 3), 0);
        assert_eq!(char_at_column(line, 4), 1);
        assert_eq!(char_at_column(line, 5), 2);
        assert_eq!(char_at_column(line, 40), 3);
        assert_eq!(char_at_column("日本", 1), 0);
        assert_eq!(char_at_column("日本", 2), 1);
    }

    #[test]
    fn binary_detection() {
        assert!(looks_binary(b"ab\0cd"));
        assert!(!looks_binary(b"int main() {}\n"));
        let mut late = vec![b'a'; BINARY_SNIFF_LEN];
        late.push(0);
        assert!(!looks_binary(&late));
    }

    #[test]
    fn input_paths_resolve_against_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(resolve_input_path("a.cpp", cwd), PathBuf::from("/work/a.cpp"));
        assert_eq!(resolve_input_path(" /tmp/b.cpp ", cwd), PathBuf::from("/tmp/b.cpp"));
    }

    #[test]
    fn inside_rect_bounds() {
        let r = Rect::new(2, 3, 4, 2);
        assert!(inside(2, 3, r));
        assert!(inside(5, 4, r));
        assert!(!inside(6, 4, r));
        assert!(!inside(2, 5, r));
        assert_eq!(to_u16_saturating(70_000), u16::MAX);
    }
}
