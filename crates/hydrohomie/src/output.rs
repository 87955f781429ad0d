//! Rendering for every `--output` mode.
//!
//! Device tables go through `tabled`; json and yaml serialize the view
//! structs directly; plain prints addresses (or another key) one per line
//! so results can be piped into another invocation.

use std::io::{self, IsTerminal, Write as _};
use std::time::Duration;

use owo_colors::OwoColorize;
use serde::Serialize;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// `auto` colors only an interactive stdout, and never when `NO_COLOR` is set.
pub fn should_color(mode: ColorMode) -> bool {
    if mode == ColorMode::Auto {
        return io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    }
    mode == ColorMode::Always
}

/// Semantic tone of a cell.
#[derive(Debug, Clone, Copy)]
pub enum Tone {
    Good,
    Active,
    Warn,
    Bad,
    Muted,
}

pub fn paint(text: &str, tone: Tone, color: bool) -> String {
    if !color {
        return text.to_owned();
    }
    match tone {
        Tone::Good => text.green().to_string(),
        Tone::Active => text.cyan().bold().to_string(),
        Tone::Warn => text.yellow().to_string(),
        Tone::Bad => text.red().to_string(),
        Tone::Muted => text.dimmed().to_string(),
    }
}

// ── Value formatting ─────────────────────────────────────────────────

/// Human-readable duration truncated to whole seconds ("1h 2m 3s").
pub fn format_duration(d: Duration) -> String {
    if d.is_zero() {
        return "0s".into();
    }
    humantime::format_duration(Duration::from_secs(d.as_secs())).to_string()
}

pub fn format_seconds(secs: Option<u64>) -> String {
    secs.map_or_else(|| "-".into(), |s| format_duration(Duration::from_secs(s)))
}

pub fn dash_or<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".into(), |v| v.to_string())
}

// ── Rendering ────────────────────────────────────────────────────────

/// Serialized forms shared by list and single renders. `None` for the
/// human-oriented modes, which each caller lays out itself.
fn structured<T: Serialize + ?Sized>(
    format: OutputFormat,
    data: &T,
) -> Option<Result<String, CliError>> {
    let (kind, rendered) = match format {
        OutputFormat::Json => ("JSON", serde_json::to_string_pretty(data).map_err(|e| e.to_string())),
        OutputFormat::JsonCompact => ("JSON", serde_json::to_string(data).map_err(|e| e.to_string())),
        OutputFormat::Yaml => ("YAML", serde_yaml::to_string(data).map_err(|e| e.to_string())),
        OutputFormat::Table | OutputFormat::Plain => return None,
    };
    Some(rendered.map_err(|e| CliError::Internal {
        message: format!("{kind} serialization failed: {e}"),
    }))
}

/// Many items: a rounded table of `to_row` rows, or `key` per line for plain.
pub fn render_list<T, R>(
    format: OutputFormat,
    items: &[T],
    to_row: impl Fn(&T) -> R,
    key: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: Serialize,
    R: Tabled,
{
    if let Some(out) = structured(format, items) {
        return out;
    }
    Ok(match format {
        OutputFormat::Plain => items.iter().map(key).collect::<Vec<_>>().join("\n"),
        _ => {
            let rows: Vec<R> = items.iter().map(to_row).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
    })
}

/// One item: `detail` lays out the table mode as aligned `Label: value` lines.
pub fn render_single<T: Serialize>(
    format: OutputFormat,
    item: &T,
    detail: impl Fn(&T) -> String,
    key: impl Fn(&T) -> String,
) -> Result<String, CliError> {
    if let Some(out) = structured(format, item) {
        return out;
    }
    Ok(match format {
        OutputFormat::Plain => key(item),
        _ => detail(item),
    })
}

/// Results go to stdout; `--quiet` and empty renders print nothing.
pub fn print_output(rendered: &str, quiet: bool) {
    if quiet || rendered.is_empty() {
        return;
    }
    let _ = writeln!(io::stdout().lock(), "{rendered}");
}

/// Progress and confirmations go to stderr so stdout stays parseable.
pub fn print_status(message: &str, quiet: bool) {
    if !quiet {
        eprintln!("{message}");
    }
}
