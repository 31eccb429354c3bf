//! Formatting utilities used for CLI outputs.

use regex::Regex;
use std::sync::LazyLock;

static ANSI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1B\[[0-9;]*[mK]").expect("ANSI regex is valid"));

pub fn bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

pub fn strip_ansi(s: &str) -> String {
    ANSI_RE.replace_all(s, "").into_owned()
}

/// Visible width (ANSI sequences excluded).
pub fn visible_len(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

pub fn pad_right(s: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_len(s));
    format!("{}{}", s, " ".repeat(padding))
}

/// Cut plain text to `max` characters, ending with "..." when cut.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

pub fn check_mark(done: bool) -> &'static str {
    if done { "✔" } else { "·" }
}
