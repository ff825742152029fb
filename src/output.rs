//! CLI output formatting for batch runs.
//!
//! # Output Format
//!
//! ## Run
//!
//! ```text
//! web-thumbs: max 512px, webp q85 e4 (2 images)
//!     ✓ flow-fields → interactive/web/thumbnails/flow-fields.webp (512x288, 812.3KB → 31.4KB, 96.1% smaller)
//!         Archived: interactive/web/thumbnails/originals/Flow Fields.png
//!     ↷ sunset: up to date
//!     ✗ broken: failed to decode interactive/web/thumbnails/broken.jpg: ...
//!     1 processed, 1 failed, 1 skipped (812.3KB → 31.4KB, 96.1% smaller)
//!
//! Done: 3 jobs, 12 processed, 1 failed, 4 skipped
//! ```
//!
//! ## Check
//!
//! ```text
//! photos-astro: max 1920px, webp q85 e4 (1 image)
//!     hero
//!         Source: photos/astro/import/hero.jpg
//!         Output: photos/astro/hero.webp
//!         Output: photos/astro/astro-01.webp
//!         Archive: photos/astro/originals/
//!     Note: skipped 2 previously generated file(s) in photos/astro/import
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.
//! Paths are shown relative to the config directory.

use crate::batch::{BatchEvent, BatchReport, JobPlan, SkipReason};
use crate::imaging::TransformPolicy;
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn relative(path: &Path, base: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{n} {word}")
    } else {
        format!("{n} {word}s")
    }
}

/// Human-readable byte count: `512B`, `95.1KB`, `1.5MB`.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes}B")
    } else if b < KB * KB {
        format!("{:.1}KB", b / KB)
    } else {
        format!("{:.1}MB", b / (KB * KB))
    }
}

/// `88.3% smaller`, or `12.0% larger` when re-encoding grew the file.
pub fn format_savings(before: u64, after: u64) -> String {
    if before == 0 {
        return "n/a".to_string();
    }
    let ratio = (before as f64 - after as f64) / before as f64 * 100.0;
    if ratio >= 0.0 {
        format!("{ratio:.1}% smaller")
    } else {
        format!("{:.1}% larger", -ratio)
    }
}

fn size_change(before: u64, after: u64) -> String {
    format!(
        "{} → {}, {}",
        format_size(before),
        format_size(after),
        format_savings(before, after)
    )
}

/// Job header line.
///
/// ```text
/// hero-thumbs: square 768px, webp q90 e6 (4 images)
/// ```
pub fn format_job_header(job: &str, policy: &TransformPolicy, items: usize) -> String {
    format!("{job}: {policy} ({})", plural(items, "image"))
}

fn format_notes(notes: &[String]) -> Vec<String> {
    notes
        .iter()
        .map(|n| format!("{}Note: {n}", indent(1)))
        .collect()
}

/// Format a planned job without running it (the `check` command).
pub fn format_plan(plan: &JobPlan, base: &Path) -> Vec<String> {
    let mut lines = vec![format_job_header(&plan.id, &plan.policy, plan.items.len())];
    for item in &plan.items {
        lines.push(format!("{}{}", indent(1), item.id));
        lines.push(format!(
            "{}Source: {}",
            indent(2),
            relative(&item.input, base)
        ));
        for output in &item.outputs {
            lines.push(format!("{}Output: {}", indent(2), relative(output, base)));
        }
        if let Some(dir) = &item.archive_to {
            lines.push(format!("{}Archive: {}/", indent(2), relative(dir, base)));
        }
    }
    lines.extend(format_notes(&plan.notes));
    lines
}

pub fn print_plan(plan: &JobPlan, base: &Path) {
    for line in format_plan(plan, base) {
        println!("{}", line);
    }
}

/// Format a single batch progress event as display lines.
pub fn format_batch_event(event: &BatchEvent, base: &Path) -> Vec<String> {
    match event {
        BatchEvent::Processed { id, result, .. } => {
            let outputs: Vec<String> = result
                .outputs
                .iter()
                .map(|o| relative(o, base))
                .collect();
            let mut lines = vec![format!(
                "{}✓ {id} → {} ({}x{}, {})",
                indent(1),
                outputs.join(", "),
                result.width,
                result.height,
                size_change(result.bytes_before, result.bytes_after)
            )];
            if let Some(archived) = &result.archived_to {
                lines.push(format!(
                    "{}Archived: {}",
                    indent(2),
                    relative(archived, base)
                ));
            }
            lines
        }
        BatchEvent::Skipped { id, reason, .. } => {
            let why = match reason {
                SkipReason::UpToDate => "up to date",
            };
            vec![format!("{}↷ {id}: {why}", indent(1))]
        }
        BatchEvent::Failed { id, error, .. } => {
            vec![format!("{}✗ {id}: {error}", indent(1))]
        }
    }
}

/// Per-job tally line.
///
/// ```text
///     3 processed, 1 failed, 0 skipped (2.4MB → 310.2KB, 87.4% smaller)
/// ```
pub fn format_job_summary(report: &BatchReport) -> Vec<String> {
    let mut line = format!(
        "{}{} processed, {} failed, {} skipped",
        indent(1),
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
    if report.succeeded() > 0 {
        line.push_str(&format!(
            " ({})",
            size_change(report.bytes_before(), report.bytes_after())
        ));
    }
    let mut lines = format_notes(&report.notes);
    lines.push(line);
    lines
}

pub fn print_job_summary(report: &BatchReport) {
    for line in format_job_summary(report) {
        println!("{}", line);
    }
}

/// Final line across every job of the run.
pub fn format_run_summary(reports: &[BatchReport]) -> String {
    let processed: usize = reports.iter().map(BatchReport::succeeded).sum();
    let failed: usize = reports.iter().map(BatchReport::failed).sum();
    let skipped: usize = reports.iter().map(BatchReport::skipped).sum();
    format!(
        "Done: {}, {processed} processed, {failed} failed, {skipped} skipped",
        plural(reports.len(), "job")
    )
}
