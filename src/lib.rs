//! # printbatch
//!
//! Batch-resize product photos to print sizes. A CSV size sheet names each
//! image and its print size in inches; a zip archive holds the images. The
//! output is a zip of 300 DPI JPEGs plus a plain-text processing report.
//!
//! # Pipeline
//!
//! ```text
//! 1. Parse     sizes.csv   →  SpecDocument     (rows, errors, warnings)
//! 2. Process   images.zip  →  SessionResult    (one outcome per row)
//! 3. Package   session     →  resized_images_<timestamp>.zip
//! ```
//!
//! Each stage is a plain function over in-memory data, so the whole pipeline
//! can be tested without touching the filesystem.
//!
//! # Modes
//!
//! | Mode | Sheet columns | Target size |
//! |------|---------------|-------------|
//! | `file` | filename, length, width | exact `width × 300` by `length × 300` box |
//! | `constrained` | filename, length, width | aspect kept, anchored on the smaller requested side |
//! | `brand` | product, length, width, variant | exact box; the variant picks the archive image |
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`spec_sheet`] | CSV size sheet parsing and row validation |
//! | [`archive`] | Input zip indexing by base filename |
//! | [`imaging`] | Pixel math per mode and the `image`-crate resize backend |
//! | [`process`] | Runs every row through lookup, size guard and resize |
//! | [`estimate`] | Remaining-time estimation from recent item durations |
//! | [`progress`] | Monotonic progress events over an `mpsc` channel |
//! | [`session`] | Per-row outcomes aggregated into a batch result |
//! | [`report`] | `processing_report.txt` rendering |
//! | [`package`] | Output zip assembly and download naming |
//! | [`keepalive`] | Scoped keep-alive around long batches |
//! | [`validation`] | Upload name and size checks |
//! | [`config`] | `printbatch.toml` loading, validation, and merging |
//! | [`output`] | CLI output formatting |

pub mod archive;
pub mod config;
pub mod estimate;
pub mod imaging;
pub mod keepalive;
pub mod output;
pub mod package;
pub mod process;
pub mod progress;
pub mod report;
pub mod session;
pub mod spec_sheet;
pub mod validation;
