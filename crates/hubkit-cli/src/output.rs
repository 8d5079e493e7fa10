//! Terminal output formatting utilities.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use colored::Colorize;

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

/// Set quiet mode globally. Call once at startup.
pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::Relaxed)
}

/// Print an error message (always prints to stderr).
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a warning message (always prints to stderr).
pub fn warn(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

/// Print an info message (suppressed in quiet mode).
pub fn info(msg: &str) {
    if !is_quiet() {
        println!("{} {}", "→".blue(), msg);
    }
}

/// Print a detail line without prefix (suppressed in quiet mode).
///
/// Use for indented detail lines that accompany info or warn messages.
pub fn detail(msg: &str) {
    if !is_quiet() {
        println!("{msg}");
    }
}

/// Print essential machine-readable output (always prints).
///
/// Use for results that should be available for piping, like URLs.
pub fn essential(msg: &str) {
    println!("{msg}");
}

/// Print a `label: value` line, skipping absent values (suppressed in quiet mode).
pub fn field(label: &str, value: Option<impl std::fmt::Display>) {
    if let Some(value) = value {
        detail(&format!("  {:<12} {value}", format!("{label}:").dimmed()));
    }
}

/// Format an issue state.
#[must_use]
pub fn issue_state(state: &str) -> String {
    match state {
        "open" => state.green().to_string(),
        "closed" => state.red().to_string(),
        _ => state.dimmed().to_string(),
    }
}

/// Format a timestamp as a calendar date.
#[must_use]
pub fn date(at: Option<DateTime<Utc>>) -> Option<String> {
    at.map(|at| at.format("%Y-%m-%d").to_string())
}

/// Format the remaining quota, colored by how much is left.
#[must_use]
pub fn quota(remaining: Option<u32>, total: Option<u32>) -> String {
    let Some(remaining) = remaining else {
        return "unknown".dimmed().to_string();
    };

    let text = total.map_or_else(|| remaining.to_string(), |t| format!("{remaining}/{t}"));
    match remaining {
        0..=1 => text.red().to_string(),
        r if total.is_some_and(|t| r.saturating_mul(10) < t) => text.yellow().to_string(),
        _ => text.green().to_string(),
    }
}

/// Print a horizontal line (suppressed in quiet mode).
pub fn hr() {
    if !is_quiet() {
        println!("{}", "─".repeat(50).dimmed());
    }
}
