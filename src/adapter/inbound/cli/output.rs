//! Terminal output for the CLI.
//!
//! Every printer has two renderings: a colored human one and a JSON line
//! (`{"type": ..., "payload": ...}`) for scripting. Human output goes to
//! stdout except errors; JSON mode keeps stdout machine-readable.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};

use owo_colors::OwoColorize;
use serde::Serialize;
use serde_json::json;

use crate::domain::{JobStatus, StatusChange};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

fn regular_output_suppressed(config: OutputConfig) -> bool {
    !config.json && config.quiet
}

fn emit_json_line(kind: &str, payload: serde_json::Value) {
    println!(
        "{}",
        json!({
            "type": kind,
            "payload": payload,
        })
    );
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    let config = read_config();
    if config.json {
        emit_json_line(
            "header",
            json!({
                "app": "optivault",
                "version": version,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("{} {}", "optivault".bold(), version.dimmed());
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let config = read_config();
    let value = value.to_string();

    if config.json {
        emit_json_line(
            "field",
            json!({
                "label": label,
                "value": value,
            }),
        );
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {:<16} {}", label.dimmed(), value);
}

pub fn success(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("success", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {} {}", "✓".green(), message);
}

pub fn warning(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("warning", json!({ "message": message }));
        return;
    }

    println!("  {} {}", "⚠".yellow(), message);
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    let config = read_config();

    if config.json {
        eprintln!(
            "{}",
            json!({
                "type": "error",
                "payload": { "message": message },
            })
        );
        return;
    }

    eprintln!("  {} {}", "×".red(), message);
}

pub fn section(title: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("section", json!({ "title": title }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!();
    println!("{}", title.bold());
}

pub fn note(message: &str) {
    let config = read_config();

    if config.json {
        emit_json_line("note", json!({ "message": message }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    println!("  {}", message.dimmed());
}

/// Print one job lifecycle transition.
///
/// In JSON mode the whole change is emitted, including the result or
/// failure carried by terminal states.
pub fn status_change(change: &StatusChange) {
    let config = read_config();

    if config.json {
        emit_json_line("status", serde_json::to_value(change).unwrap_or_default());
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    let label = change.status.to_string();
    let label = match change.status {
        JobStatus::Pending => format!("{}", label.dimmed()),
        JobStatus::Active => format!("{}", label.cyan()),
        JobStatus::Completed => format!("{}", label.green()),
        JobStatus::Failed => format!("{}", label.red()),
        JobStatus::Cancelled => format!("{}", label.yellow()),
    };
    println!(
        "  {} {:<20} attempt {}",
        change.at.format("%H:%M:%S%.3f").to_string().dimmed(),
        label,
        change.attempts
    );
}

/// Emit a serializable value as one JSON line of the given type.
///
/// No-op in human mode; callers print their own rendering there.
pub fn json_value<T: Serialize>(kind: &str, value: &T) {
    if !is_json() {
        return;
    }
    emit_json_line(kind, serde_json::to_value(value).unwrap_or_default());
}

/// Format a signed amount: green when positive, red when negative.
pub fn signed(value: impl Display + PartialOrd + Default) -> String {
    let positive = value > Default::default();
    let negative = value < Default::default();
    let value = value.to_string();
    if is_json() {
        return value;
    }
    if positive {
        format!("{}", value.green())
    } else if negative {
        format!("{}", value.red())
    } else {
        value
    }
}

pub fn highlight(value: impl Display) -> String {
    let value = value.to_string();
    if is_json() {
        return value;
    }
    format!("{}", value.cyan())
}

/// Print a table header row.
pub fn table_header(columns: &[(&str, usize)]) {
    let config = read_config();

    if config.json {
        let cols: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        emit_json_line("table_header", json!({ "columns": cols }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    let mut line = String::from("  ");
    for (name, width) in columns {
        line.push_str(&format!("{name:>width$} "));
    }
    println!("{}", line.dimmed());

    let mut rule = String::from("  ");
    for (_, width) in columns {
        rule.push_str(&"─".repeat(*width));
        rule.push(' ');
    }
    println!("{}", rule.dimmed());
}

/// Print a table data row.
pub fn table_row(cells: &[String], widths: &[usize]) {
    let config = read_config();

    if config.json {
        emit_json_line("table_row", json!({ "cells": cells }));
        return;
    }
    if regular_output_suppressed(config) {
        return;
    }

    let mut line = String::from("  ");
    for (cell, width) in cells.iter().zip(widths.iter()) {
        line.push_str(&format!("{cell:>width$} "));
    }
    println!("{line}");
}
