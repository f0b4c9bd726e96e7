//! Batch outcome aggregation.
//!
//! Every sheet row ends as exactly one [`RowOutcome`]: a processed item
//! (successful or failed) or a skip. [`SessionResult::record`] is the only
//! way outcomes enter a session, which keeps the one-record-per-row rule and
//! the error list consistent with each other.

use crate::imaging::Dimensions;
use serde::Serialize;

/// Result of resizing one sheet row whose image was found in the archive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedItem {
    /// Archive lookup key from the sheet.
    pub key: String,
    /// Entry name inside `resized_images/`.
    pub output_name: String,
    /// Source pixel size; zero when the source was never decoded.
    pub original_size: Dimensions,
    pub target_size: Dimensions,
    /// Encoded output image; empty on failure.
    #[serde(skip)]
    pub output: Vec<u8>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_byte_size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_byte_size: Option<u64>,
}

impl ProcessedItem {
    /// A failed item with no output.
    pub fn failure(
        key: impl Into<String>,
        output_name: impl Into<String>,
        target_size: Dimensions,
        error: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            output_name: output_name.into(),
            original_size: Dimensions::default(),
            target_size,
            output: Vec::new(),
            success: false,
            error: Some(error.into()),
            original_byte_size: None,
            output_byte_size: None,
        }
    }
}

/// What happened to one row.
#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    /// Resized successfully.
    Completed(ProcessedItem),
    /// Found but could not be resized. `message` goes to the session error list.
    Failed { item: ProcessedItem, message: String },
    /// No archive entry for this key.
    Skipped { key: String },
}

/// Everything a batch produced, in sheet row order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionResult {
    pub items: Vec<ProcessedItem>,
    pub skipped: Vec<String>,
    pub errors: Vec<String>,
}

impl SessionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one row's outcome.
    pub fn record(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Completed(item) => self.items.push(item),
            RowOutcome::Failed { item, message } => {
                self.items.push(item);
                self.errors.push(message);
            }
            RowOutcome::Skipped { key } => {
                self.errors.push(format!("Image not found in archive: {key}"));
                self.skipped.push(key);
            }
        }
    }

    /// True when at least one image was resized.
    pub fn success(&self) -> bool {
        self.items.iter().any(|i| i.success)
    }

    pub fn successes(&self) -> impl Iterator<Item = &ProcessedItem> {
        self.items.iter().filter(|i| i.success)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ProcessedItem> {
        self.items.iter().filter(|i| !i.success)
    }

    pub fn counts(&self) -> SessionCounts {
        let succeeded = self.successes().count();
        SessionCounts {
            processed: self.items.len(),
            succeeded,
            failed: self.items.len() - succeeded,
            skipped: self.skipped.len(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionCounts {
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}
