//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Check
//!
//! ```text
//! Sheet (file mode): 2 rows
//! 001 photo1.jpg
//!     8.5 × 11 in → 3300 × 2550 px
//! 002 photo2.jpg
//!     4 × 6 in → 1800 × 1200 px
//! Warning: Detected header row - skipping first row
//! ```
//!
//! ## Run
//!
//! ```text
//! [  0%] Extracting archive...
//! [  5%] Found 2 images in archive
//! [ 50%] Processing photo1.jpg... (1/2, ~2s left)
//! [100%] Processing complete! (2/2)
//! 001 photo1.jpg
//!     1000 × 1000 px → 3300 × 2550 px (1.2 MB)
//! 002 missing.jpg
//!     skipped: not in archive
//! Resized 1, failed 0, skipped 1
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::estimate::format_duration;
use crate::imaging::requested_pixels;
use crate::progress::ProgressEvent;
use crate::session::SessionResult;
use crate::spec_sheet::{ResizeMode, SpecDocument};
use crate::validation::format_file_size;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

// ============================================================================
// Check: parsed sheet
// ============================================================================

/// Format a parsed sheet: retained rows with their requested pixel box,
/// then warnings and errors.
pub fn format_spec_document(doc: &SpecDocument, mode: ResizeMode) -> Vec<String> {
    let mut lines = vec![format!("Sheet ({} mode): {} rows", mode, doc.rows.len())];

    for (i, row) in doc.rows.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), row.identity()));
        if row.identity() != row.key() {
            lines.push(format!("{}Variant: {}", indent(1), row.key()));
        }
        let px = requested_pixels(row.length_inches(), row.width_inches());
        lines.push(format!(
            "{}{} × {} in → {} × {} px",
            indent(1),
            row.length_inches(),
            row.width_inches(),
            px.width,
            px.height
        ));
    }

    lines.extend(doc.warnings.iter().map(|w| format!("Warning: {w}")));
    lines.extend(doc.errors.iter().map(|e| format!("Error: {e}")));
    lines
}

pub fn print_spec_document(doc: &SpecDocument, mode: ResizeMode) {
    for line in format_spec_document(doc, mode) {
        println!("{}", line);
    }
}

// ============================================================================
// Run: progress and summary
// ============================================================================

/// Format one progress event as a single status line.
pub fn format_progress_event(event: &ProgressEvent) -> String {
    let mut line = format!("[{:>3}%] {}", event.percentage, event.message);
    if event.current > 0 {
        line.push_str(&format!(" ({}/{}", event.current, event.total));
        let remaining = event
            .time_estimate
            .as_ref()
            .filter(|_| event.current < event.total);
        if let Some(estimate) = remaining {
            line.push_str(&format!(", ~{} left", format_duration(estimate.remaining)));
        }
        line.push(')');
    }
    line
}

/// Format per-row results and totals of a finished batch.
///
/// Rows appear as processed items first, in sheet order, followed by skips.
pub fn format_session_summary(result: &SessionResult) -> Vec<String> {
    let mut lines = Vec::new();
    let mut pos = 0;

    for item in &result.items {
        pos += 1;
        lines.push(format!("{} {}", format_index(pos), item.output_name));
        if item.success {
            let size = item
                .output_byte_size
                .map(|b| format!(" ({})", format_file_size(b)))
                .unwrap_or_default();
            lines.push(format!(
                "{}{} → {}{}",
                indent(1),
                item.original_size,
                item.target_size,
                size
            ));
        } else {
            lines.push(format!(
                "{}failed: {}",
                indent(1),
                item.error.as_deref().unwrap_or("Unknown error")
            ));
        }
    }
    for key in &result.skipped {
        pos += 1;
        lines.push(format!("{} {}", format_index(pos), key));
        lines.push(format!("{}skipped: not in archive", indent(1)));
    }

    let counts = result.counts();
    lines.push(format!(
        "Resized {}, failed {}, skipped {}",
        counts.succeeded, counts.failed, counts.skipped
    ));
    lines
}

pub fn print_session_summary(result: &SessionResult) {
    for line in format_session_summary(result) {
        println!("{}", line);
    }
}

/// Final line after the output archive is written.
pub fn format_package_output(path: &Path, bytes: usize) -> String {
    format!("Wrote {} ({})", path.display(), format_file_size(bytes as u64))
}
