//! Progress events for the two long-running phases.
//!
//! Both the resize loop and packaging report through a [`ProgressReporter`],
//! which forwards [`ProgressEvent`]s to an optional `mpsc::Sender`. Each
//! reporter owns one phase and keeps its percentage and item index
//! monotonic: a value lower than one already sent is raised to it.
//!
//! A dropped receiver is not an error; the batch keeps running silently.

use crate::estimate::TimeEstimate;
use serde::Serialize;
use std::sync::mpsc::Sender;

/// Which phase an event belongs to. Percentages restart at 0 per phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Processing,
    Packaging,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub stage: Stage,
    pub current: usize,
    pub total: usize,
    pub percentage: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_estimate: Option<TimeEstimate>,
}

/// Monotonic event emitter for one phase.
#[derive(Debug)]
pub struct ProgressReporter {
    stage: Stage,
    sender: Option<Sender<ProgressEvent>>,
    last_percentage: u8,
    last_current: usize,
}

impl ProgressReporter {
    pub fn new(stage: Stage, sender: Option<Sender<ProgressEvent>>) -> Self {
        Self {
            stage,
            sender,
            last_percentage: 0,
            last_current: 0,
        }
    }

    pub fn emit(&mut self, message: impl Into<String>, current: usize, total: usize, percentage: u8) {
        self.emit_with_estimate(message, current, total, percentage, None);
    }

    pub fn emit_with_estimate(
        &mut self,
        message: impl Into<String>,
        current: usize,
        total: usize,
        percentage: u8,
        time_estimate: Option<TimeEstimate>,
    ) {
        self.last_percentage = self.last_percentage.max(percentage.min(100));
        self.last_current = self.last_current.max(current);

        let Some(sender) = &self.sender else {
            return;
        };
        let event = ProgressEvent {
            stage: self.stage,
            current: self.last_current,
            total,
            percentage: self.last_percentage,
            message: message.into(),
            time_estimate,
        };
        if sender.send(event).is_err() {
            // Receiver gone; stop formatting events nobody reads.
            self.sender = None;
        }
    }
}

/// Percentage of `done` out of `total` scaled into `[offset, offset + span]`.
pub fn banded(done: usize, total: usize, offset: u8, span: u8) -> u8 {
    if total == 0 {
        return offset.saturating_add(span);
    }
    let fraction = done.min(total) as f64 / total as f64;
    offset.saturating_add((fraction * span as f64).round() as u8)
}
