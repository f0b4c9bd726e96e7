//! Output archive assembly.
//!
//! ```text
//! resized_images_2026-03-14T09-26-53.zip
//! ├── resized_images/
//! │   ├── photo1.jpg
//! │   └── Acme Mug.jpg
//! └── processing_report.txt
//! ```
//!
//! Only successful items are written. Two items that resolve to the same
//! entry name get a numeric suffix (`photo1_2.jpg`) so nothing is silently
//! overwritten.

use crate::progress::{ProgressEvent, ProgressReporter, Stage, banded};
use crate::session::SessionResult;
use chrono::{DateTime, Utc};
use log::{debug, info};
use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::sync::mpsc::Sender;
use thiserror::Error;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

pub const IMAGES_DIR: &str = "resized_images";
pub const REPORT_NAME: &str = "processing_report.txt";

#[derive(Error, Debug)]
pub enum PackageError {
    #[error("No successfully processed images to download")]
    NoSuccessfulImages,
    #[error("Failed to generate ZIP file: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Failed to generate ZIP file: {0}")]
    Io(#[from] std::io::Error),
}

/// Build the output zip from a finished session and its rendered report.
pub fn package(
    result: &SessionResult,
    report: &str,
    compression_level: u8,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<Vec<u8>, PackageError> {
    let successes: Vec<_> = result.successes().collect();
    if successes.is_empty() {
        return Err(PackageError::NoSuccessfulImages);
    }
    let total = successes.len();
    let mut reporter = ProgressReporter::new(Stage::Packaging, progress);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(i64::from(compression_level)));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    reporter.emit("Adding images to ZIP...", 0, total, 0);
    zip.add_directory(format!("{IMAGES_DIR}/"), options)?;

    let mut taken = HashSet::new();
    for (i, item) in successes.iter().enumerate() {
        let name = unique_name(&item.output_name, &mut taken);
        reporter.emit(
            format!("Adding {name}..."),
            i + 1,
            total,
            banded(i + 1, total, 0, 70),
        );
        debug!("Packaging {} as {IMAGES_DIR}/{name}", item.key);
        zip.start_file(format!("{IMAGES_DIR}/{name}"), options)?;
        zip.write_all(&item.output)?;
    }

    reporter.emit("Generating processing report...", total, total, 75);
    zip.start_file(REPORT_NAME, options)?;
    zip.write_all(report.as_bytes())?;

    reporter.emit("Finalizing ZIP file...", total, total, 90);
    let bytes = zip.finish()?.into_inner();

    reporter.emit("ZIP file ready for download!", total, total, 100);
    info!("Packaged {} images ({} bytes)", total, bytes.len());
    Ok(bytes)
}

/// `name`, or `stem_N.ext` for the first free N ≥ 2.
fn unique_name(name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.to_string()) {
        return name.to_string();
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };
    let mut n = 2;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{stem}_{n}.{ext}"),
            None => format!("{stem}_{n}"),
        };
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Suggested file name for the output archive.
pub fn download_filename(now: DateTime<Utc>) -> String {
    format!("resized_images_{}.zip", now.format("%Y-%m-%dT%H-%M-%S"))
}
