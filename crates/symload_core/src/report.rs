//! Console rendering for invocation results.
//!
//! # Responsibility
//! - Turn [`Invocation`] values into user-facing console lines.
//! - Bound diagnostic lists so large trees cannot flood the console.
//!
//! # Invariants
//! - At most [`SUMMARY_LIMIT`] entries per list, followed by an overflow line.
//! - Rendering has no side effects; callers decide where lines go.

use crate::outcome::{Invocation, LoadOutcome, ScanReport};
use colored::Colorize;
use std::path::Path;

/// Maximum entries printed per diagnostic list.
pub const SUMMARY_LIMIT: usize = 5;

/// Live line for one file outcome; only successes are echoed immediately.
pub fn render_progress(outcome: &LoadOutcome) -> Option<String> {
    match outcome {
        LoadOutcome::Loaded { path } => Some(format!("{} {}", "Loaded".green(), quoted(path))),
        _ => None,
    }
}

/// Summary lines printed after an invocation finished.
pub fn render_invocation(invocation: &Invocation) -> Vec<String> {
    match invocation {
        Invocation::NotFound(path) => vec![format!(
            "{} {}",
            "load-symbols: no such path:".red(),
            quoted(path)
        )],
        Invocation::RootPermissionDenied(path) => {
            vec![format!("{} {}", "Permission denied:".red(), quoted(path))]
        }
        Invocation::UnsupportedFile(path) => {
            vec![format!("{} {}", "Unsupported file:".yellow(), quoted(path))]
        }
        Invocation::File(outcome) => render_single_file(outcome),
        Invocation::Directory(report) => render_scan(report),
    }
}

fn render_single_file(outcome: &LoadOutcome) -> Vec<String> {
    match outcome {
        LoadOutcome::Loaded { .. } => vec![total_line(1)],
        LoadOutcome::AlreadyLoaded { path } => vec![format!(
            "{} {}",
            quoted(path),
            "has already been loaded.".yellow()
        )],
        LoadOutcome::UnsupportedExtension { path } => {
            vec![format!("{} {}", "Unsupported file:".yellow(), quoted(path))]
        }
        LoadOutcome::PermissionDenied { reason, .. } | LoadOutcome::Failed { reason, .. } => {
            vec![reason.red().to_string(), total_line(0)]
        }
    }
}

/// Summary for one directory scan.
pub fn render_scan(report: &ScanReport) -> Vec<String> {
    let mut lines = Vec::new();

    if report.interrupted {
        lines.push("Interrupted; showing partial results.".yellow().to_string());
    }

    push_bounded(
        &mut lines,
        report.failures.iter().map(|(_, reason)| reason.red().to_string()),
        report.failures.len(),
        "failures",
    );

    if !report.unsupported.is_empty() {
        lines.push(format!(
            "{} {} {}",
            "Skipped".yellow(),
            report.unsupported.len().to_string().cyan(),
            "unsupported files:".yellow()
        ));
        push_bounded(
            &mut lines,
            report
                .unsupported
                .iter()
                .map(|path| format!("  {}", quoted(path))),
            report.unsupported.len(),
            "unsupported files",
        );
    }

    push_bounded(
        &mut lines,
        report
            .denied
            .iter()
            .map(|path| format!("{} {}", "Permission denied:".red(), quoted(path))),
        report.denied.len(),
        "denied directories",
    );

    push_bounded(
        &mut lines,
        report
            .walk_errors
            .iter()
            .map(|(_, reason)| reason.red().to_string()),
        report.walk_errors.len(),
        "walk errors",
    );

    if report.skipped > 0 {
        lines.push(format!(
            "{} {} {}",
            "Skipped".yellow(),
            report.skipped.to_string().cyan(),
            "already loaded symbol files.".yellow()
        ));
    }

    if report.loaded > 0 {
        lines.push(String::new());
        lines.push(total_line(report.loaded));
    } else if report.skipped > 0 && report.failures.is_empty() {
        lines.push(format!(
            "{} {} {}",
            "All symbol files in".yellow(),
            quoted(&report.root),
            "have already been loaded.".yellow()
        ));
    } else {
        lines.push(format!(
            "{} {}",
            "No symbol files were loaded from:".yellow(),
            quoted(&report.root)
        ));
    }

    lines
}

fn push_bounded(
    lines: &mut Vec<String>,
    items: impl Iterator<Item = String>,
    total: usize,
    noun: &str,
) {
    lines.extend(items.take(SUMMARY_LIMIT));
    if total > SUMMARY_LIMIT {
        let overflow = format!("  ... and {} more {noun}", total - SUMMARY_LIMIT);
        lines.push(overflow.yellow().to_string());
    }
}

fn total_line(count: usize) -> String {
    let noun = if count == 1 {
        "symbol file."
    } else {
        "symbol files."
    };
    format!(
        "{} {} {}",
        "Total loaded".yellow(),
        count.to_string().cyan(),
        noun.yellow()
    )
}

fn quoted(path: &Path) -> String {
    format!("'{}'", path.display()).purple().to_string()
}
