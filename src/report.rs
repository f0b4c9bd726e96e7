//! Plain-text processing report bundled with the output archive.
//!
//! ```text
//! Image Resizing Processing Report
//! Generated: 2026-03-14 09:26:53
//!
//! SUMMARY:
//! ========
//! Total Images Processed: 2
//! ...
//! ```
//!
//! Sections always appear in the same order. Failure, skip and error sections
//! are omitted when empty; the summary counts are always present.

use crate::imaging::{DPI, Quality};
use crate::session::SessionResult;
use crate::validation::format_file_size;
use chrono::{DateTime, Local};

/// Render the report for a finished session.
pub fn build_report(result: &SessionResult, quality: Quality, generated_at: DateTime<Local>) -> String {
    let counts = result.counts();
    let mut lines = vec![
        "Image Resizing Processing Report".to_string(),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S")),
        String::new(),
    ];

    lines.extend(section("SUMMARY:"));
    lines.push(format!("Total Images Processed: {}", counts.processed));
    lines.push(format!("Successfully Resized: {}", counts.succeeded));
    lines.push(format!("Failed: {}", counts.failed));
    lines.push(format!("Skipped (Not Found): {}", counts.skipped));
    lines.push(String::new());

    lines.extend(section("SUCCESSFULLY PROCESSED IMAGES:"));
    for item in result.successes() {
        lines.push(format!("✓ {}", item.output_name));
        if item.output_name != item.key {
            lines.push(format!("  Source: {}", item.key));
        }
        lines.push(format!("  Original Size: {}", item.original_size));
        lines.push(format!("  Resized To: {} ({} DPI)", item.target_size, DPI));
        let bytes = item.output_byte_size.unwrap_or(item.output.len() as u64);
        lines.push(format!("  File Size: {}", format_file_size(bytes)));
        lines.push(String::new());
    }

    if counts.failed > 0 {
        lines.extend(section("FAILED IMAGES:"));
        for item in result.failures() {
            lines.push(format!("✗ {}", item.key));
            lines.push(format!(
                "  Error: {}",
                item.error.as_deref().unwrap_or("Unknown error")
            ));
            lines.push(String::new());
        }
    }

    if !result.skipped.is_empty() {
        lines.extend(section("SKIPPED FILES (NOT FOUND IN ZIP):"));
        lines.extend(result.skipped.iter().map(|key| format!("- {key}")));
    }

    if !result.errors.is_empty() {
        lines.push(String::new());
        lines.extend(section("PROCESSING ERRORS:"));
        lines.extend(
            result
                .errors
                .iter()
                .enumerate()
                .map(|(i, error)| format!("{}. {}", i + 1, error)),
        );
    }

    lines.push(String::new());
    lines.extend(section("TECHNICAL DETAILS:"));
    lines.push(format!("- All images resized to {} DPI", DPI));
    lines.push(format!("- Output format: JPEG ({}% quality)", quality.value()));
    lines.push("- Resampling: bicubic (Catmull-Rom) interpolation".to_string());

    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Heading followed by an `=` underline of the same width.
fn section(title: &str) -> [String; 2] {
    [title.to_string(), "=".repeat(title.chars().count())]
}
