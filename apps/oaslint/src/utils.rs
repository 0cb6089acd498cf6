//! Supporting helpers: message prefixes, color detection, wording.

use owo_colors::OwoColorize;
use std::time::Duration;

/// Colors are on unless `NO_COLOR` is set or the output is machine-readable.
pub fn use_colors(format: Option<&str>) -> bool {
    format != Some("json") && std::env::var_os("NO_COLOR").is_none()
}

pub fn error_prefix(color: bool) -> String {
    if color {
        "error:".red().bold().to_string()
    } else {
        "error:".to_string()
    }
}

/// Elapsed time rounded up to whole milliseconds, e.g. `12ms`.
pub fn format_elapsed(d: Duration) -> String {
    let micros = d.as_micros();
    format!("{}ms", (micros + 999) / 1000)
}

/// `pluralize("error", 2)` -> `errors`
pub fn pluralize(word: &str, n: usize) -> String {
    if n == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
