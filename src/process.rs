//! Batch resizing.
//!
//! Takes the raw image archive and the validated sheet rows and produces a
//! [`SessionResult`] with exactly one outcome per row, in row order.
//!
//! ## Per-row pipeline
//!
//! ```text
//! lookup ──miss──▶ Skipped
//!   │
//! size guard ──over limit──▶ Failed (no decode)
//!   │
//! capped read ──inflates past limit──▶ Failed (no decode)
//!   │
//! identify → target size → resample + JPEG ──error──▶ Failed
//!   │
//! Completed
//! ```
//!
//! Row-level problems never abort the batch. Only an archive that cannot be
//! opened at all is returned as an error.
//!
//! ## Progress
//!
//! ```text
//!   0%  Extracting archive...
//!   5%  Found N images in archive
//!   5 + round((i+1)/n × 90)%  per row
//! 100%  Processing complete!   (with final time estimate)
//! ```
//!
//! ## Parallel Processing
//!
//! With `max_processes > 1` rows are resized on the global rayon pool (sized
//! by the caller). Results land in per-row slots, so the session keeps row
//! order; progress is then reported as rows finish.

use crate::archive::{ArchiveError, ArchiveIndex};
use crate::config::{ResizerConfig, effective_threads};
use crate::estimate::TimeEstimator;
use crate::imaging::{
    BackendError, Dimensions, ImageBackend, Quality, ResizeParams, RustBackend, requested_pixels,
    target_dimensions,
};
use crate::progress::{ProgressEvent, ProgressReporter, Stage, banded};
use crate::session::{ProcessedItem, RowOutcome, SessionResult};
use crate::spec_sheet::{ResizeMode, SpecRow};
use crate::validation::format_file_size;
use log::{debug, info};
use rayon::prelude::*;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Failed to process ZIP file: {0}")]
    ArchiveRead(#[from] ArchiveError),
}

/// Settings for one batch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchOptions {
    pub mode: ResizeMode,
    /// Entries larger than this are rejected before decoding.
    pub max_image_bytes: u64,
    pub quality: Quality,
    pub max_processes: usize,
}

impl BatchOptions {
    pub fn from_config(config: &ResizerConfig, mode: ResizeMode) -> Self {
        Self {
            mode,
            max_image_bytes: config.limits.max_image_bytes,
            quality: Quality::new(config.output.quality),
            max_processes: effective_threads(&config.processing),
        }
    }

    /// Stock settings, sequential.
    pub fn new(mode: ResizeMode) -> Self {
        Self::from_config(&ResizerConfig::default(), mode)
    }
}

/// Resize every row with the pure-Rust backend.
pub fn run_batch(
    archive: impl Into<Arc<[u8]>>,
    rows: &[SpecRow],
    options: &BatchOptions,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<SessionResult, ProcessError> {
    run_batch_with_backend(&RustBackend::new(), archive, rows, options, progress)
}

/// Resize every row using a specific backend (allows testing with mock).
pub fn run_batch_with_backend(
    backend: &impl ImageBackend,
    archive: impl Into<Arc<[u8]>>,
    rows: &[SpecRow],
    options: &BatchOptions,
    progress: Option<Sender<ProgressEvent>>,
) -> Result<SessionResult, ProcessError> {
    let total = rows.len();
    let mut reporter = ProgressReporter::new(Stage::Processing, progress);
    let mut estimator = TimeEstimator::new();

    info!("Processing {} rows in {} mode", total, options.mode);
    reporter.emit("Extracting archive...", 0, total, 0);
    let index = ArchiveIndex::build(archive)?;
    reporter.emit(
        format!("Found {} images in archive", index.len()),
        0,
        total,
        5,
    );

    estimator.start();
    let outcomes = if options.max_processes > 1 && total > 1 {
        process_parallel(backend, &index, rows, options, estimator, reporter)
    } else {
        process_sequential(backend, &index, rows, options, estimator, reporter)
    };

    let mut session = SessionResult::new();
    for outcome in outcomes {
        session.record(outcome);
    }

    let counts = session.counts();
    info!(
        "Batch finished: {} resized, {} failed, {} skipped",
        counts.succeeded, counts.failed, counts.skipped
    );
    Ok(session)
}

fn process_sequential(
    backend: &impl ImageBackend,
    index: &ArchiveIndex,
    rows: &[SpecRow],
    options: &BatchOptions,
    mut estimator: TimeEstimator,
    mut reporter: ProgressReporter,
) -> Vec<RowOutcome> {
    let total = rows.len();
    let mut outcomes = Vec::with_capacity(total);

    for (i, row) in rows.iter().enumerate() {
        reporter.emit_with_estimate(
            format!("Processing {}...", row.key()),
            i + 1,
            total,
            banded(i + 1, total, 5, 90),
            Some(estimator.estimate(i, total)),
        );
        outcomes.push(process_row(backend, index, row, options));
        estimator.record_item_completion();
    }

    finish(&mut reporter, &estimator, total);
    outcomes
}

fn process_parallel(
    backend: &impl ImageBackend,
    index: &ArchiveIndex,
    rows: &[SpecRow],
    options: &BatchOptions,
    estimator: TimeEstimator,
    reporter: ProgressReporter,
) -> Vec<RowOutcome> {
    let total = rows.len();
    let shared = Mutex::new((estimator, reporter, 0usize));

    let outcomes: Vec<RowOutcome> = rows
        .par_iter()
        .map(|row| {
            let outcome = process_row(backend, index, row, options);
            let mut guard = shared.lock().unwrap_or_else(PoisonError::into_inner);
            let (estimator, reporter, done) = &mut *guard;
            estimator.record_item_completion();
            *done += 1;
            let estimate = estimator.estimate(*done, total);
            reporter.emit_with_estimate(
                format!("Processed {}", row.key()),
                *done,
                total,
                banded(*done, total, 5, 90),
                Some(estimate),
            );
            outcome
        })
        .collect();

    let (estimator, mut reporter, _) = shared.into_inner().unwrap_or_else(PoisonError::into_inner);
    finish(&mut reporter, &estimator, total);
    outcomes
}

fn finish(reporter: &mut ProgressReporter, estimator: &TimeEstimator, total: usize) {
    reporter.emit_with_estimate(
        "Processing complete!",
        total,
        total,
        100,
        Some(estimator.estimate(total, total)),
    );
}

/// Run one row through lookup, size guard and resize.
pub fn process_row(
    backend: &impl ImageBackend,
    index: &ArchiveIndex,
    row: &SpecRow,
    options: &BatchOptions,
) -> RowOutcome {
    let key = row.key();
    let requested = requested_pixels(row.length_inches(), row.width_inches());

    let Some(handle) = index.lookup(key, options.mode) else {
        debug!("{key}: not in archive");
        return RowOutcome::Skipped { key: key.to_string() };
    };

    if handle.size() > options.max_image_bytes {
        return size_limit_failure(row, requested, handle.size(), options);
    }

    let source = match index.read(handle, options.max_image_bytes) {
        Ok(source) => source,
        Err(ArchiveError::OverLimit { read, .. }) => {
            debug!("{key}: declared {} bytes, inflated past limit", handle.size());
            return size_limit_failure(row, requested, read, options);
        }
        Err(e) => return row_failure(row, requested, handle.size(), e.to_string()),
    };
    let source_bytes = source.len() as u64;
    let resized = resize_source(backend, &source, requested, options);

    match resized {
        Ok((original_size, target_size, output)) => {
            debug!("{key}: {original_size} -> {target_size}");
            RowOutcome::Completed(ProcessedItem {
                key: key.to_string(),
                output_name: row.output_name(),
                original_size,
                target_size,
                output_byte_size: Some(output.len() as u64),
                output,
                success: true,
                error: None,
                original_byte_size: Some(source_bytes),
            })
        }
        Err(e) => row_failure(row, requested, source_bytes, e.to_string()),
    }
}

/// Failed row for an entry over the per-image limit; `bytes` is its size.
fn size_limit_failure(
    row: &SpecRow,
    requested: Dimensions,
    bytes: u64,
    options: &BatchOptions,
) -> RowOutcome {
    let key = row.key();
    let message = format!(
        "Image \"{}\" is {} (max: {})",
        key,
        format_file_size(bytes),
        format_file_size(options.max_image_bytes)
    );
    debug!("{key}: over size limit");
    let mut item = ProcessedItem::failure(key, row.output_name(), requested, message.clone());
    item.original_byte_size = Some(bytes);
    RowOutcome::Failed { item, message }
}

/// Failed row for a read or resize error.
fn row_failure(row: &SpecRow, requested: Dimensions, bytes: u64, reason: String) -> RowOutcome {
    let key = row.key();
    debug!("{key}: {reason}");
    let message = format!("Failed to process {key}: {reason}");
    let mut item = ProcessedItem::failure(key, row.output_name(), requested, reason);
    item.original_byte_size = Some(bytes);
    RowOutcome::Failed { item, message }
}

fn resize_source(
    backend: &impl ImageBackend,
    source: &[u8],
    requested: Dimensions,
    options: &BatchOptions,
) -> Result<(Dimensions, Dimensions, Vec<u8>), BackendError> {
    let original = backend.identify(source)?;
    let target = target_dimensions(options.mode, original, requested);
    let output = backend.resize(&ResizeParams {
        source,
        width: target.width,
        height: target.height,
        quality: options.quality,
    })?;
    Ok((original, target, output))
}
