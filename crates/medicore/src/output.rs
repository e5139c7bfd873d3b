//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use medicore_core::{AppointmentStatus, CacheSnapshot, CacheState, Notice, NoticeLevel};

use crate::cli::{ColorMode, OutputFormat};

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

pub fn paint_status(status: AppointmentStatus, color: bool) -> String {
    let text = status.to_string();
    if !color {
        return text;
    }
    match status {
        AppointmentStatus::Pending => text.yellow().to_string(),
        AppointmentStatus::Accepted => text.green().to_string(),
        AppointmentStatus::Rejected => text.red().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
    R: Tabled,
{
    match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    }
}

/// Render a single serde-serializable item in the chosen format.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> String
where
    T: serde::Serialize,
{
    match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => render_json(data, false),
        OutputFormat::JsonCompact => render_json(data, true),
        OutputFormat::Plain => id_fn(data),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

/// Tell the operator when a listing is not fresh from the server.
pub fn note_staleness<K>(snapshot: &CacheSnapshot<K>, quiet: bool) {
    if quiet {
        return;
    }
    match snapshot.state {
        CacheState::Populated { .. } => {}
        CacheState::Stale { fetched_at } => eprintln!(
            "note: showing data fetched at {}; refresh failed",
            fetched_at.with_timezone(&chrono::Local).format("%H:%M:%S")
        ),
        CacheState::Seeded => eprintln!("note: showing locally cached data; refresh failed"),
        CacheState::Unpopulated => {}
    }
}

/// Print a notice to stderr.
pub fn print_notice(notice: &Notice, color: bool) {
    let (tag, text) = (label(notice.level), &notice.message);
    if color {
        let tag = match notice.level {
            NoticeLevel::Info => tag.blue().to_string(),
            NoticeLevel::Success => tag.green().to_string(),
            NoticeLevel::Warning => tag.yellow().to_string(),
            NoticeLevel::Error => tag.red().bold().to_string(),
        };
        eprintln!("{tag} {text}");
    } else {
        eprintln!("{tag} {text}");
    }
}

fn label(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info:",
        NoticeLevel::Success => "ok:",
        NoticeLevel::Warning => "warning:",
        NoticeLevel::Error => "error:",
    }
}

// ── Format-specific renderers ────────────────────────────────────────

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_json<T: serde::Serialize + ?Sized>(data: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(data).expect("serialization should not fail")
    } else {
        serde_json::to_string_pretty(data).expect("serialization should not fail")
    }
}
