//! Remaining-time estimation for the resize loop.
//!
//! The estimator keeps the duration of every completed item and averages the
//! most recent [`RECENT_WINDOW`] of them, so a slow start (first decode, page
//! faults) stops skewing the ETA after a few items. Before any item finishes
//! it falls back to elapsed time per started item, and before anything has
//! happened at all to a fixed [`BOOTSTRAP_PER_ITEM`].
//!
//! `*_at` variants take the clock readings explicitly so the arithmetic can be
//! tested without sleeping.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Number of most recent item durations that feed the average.
pub const RECENT_WINDOW: usize = 5;

/// Assumed cost of one item before any timing data exists.
pub const BOOTSTRAP_PER_ITEM: Duration = Duration::from_millis(2000);

/// Snapshot of progress timing. Recomputed on every tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeEstimate {
    pub elapsed: Duration,
    pub average_per_item: Duration,
    pub remaining: Duration,
    pub total: Duration,
    pub eta: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TimeEstimator {
    started: Instant,
    last_completion: Instant,
    item_times: Vec<Duration>,
}

impl Default for TimeEstimator {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeEstimator {
    /// A started estimator.
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            started: now,
            last_completion: now,
            item_times: Vec::new(),
        }
    }

    /// Reset all history and restart the clock.
    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started = now;
        self.last_completion = now;
        self.item_times.clear();
    }

    /// Record that one more item finished.
    pub fn record_item_completion(&mut self) {
        self.record_completion_at(Instant::now());
    }

    pub fn record_completion_at(&mut self, now: Instant) {
        self.item_times
            .push(now.saturating_duration_since(self.last_completion));
        self.last_completion = now;
    }

    /// Number of completions recorded since the last start.
    pub fn completed(&self) -> usize {
        self.item_times.len()
    }

    /// Estimate with `current` of `total` items done.
    pub fn estimate(&self, current: usize, total: usize) -> TimeEstimate {
        self.estimate_at(Instant::now(), Utc::now(), current, total)
    }

    pub fn estimate_at(
        &self,
        now: Instant,
        wall_now: DateTime<Utc>,
        current: usize,
        total: usize,
    ) -> TimeEstimate {
        let elapsed = now.saturating_duration_since(self.started);

        let average_per_item = if !self.item_times.is_empty() {
            let recent = &self.item_times[self.item_times.len().saturating_sub(RECENT_WINDOW)..];
            recent.iter().sum::<Duration>() / recent.len() as u32
        } else if current > 0 {
            elapsed / current as u32
        } else {
            BOOTSTRAP_PER_ITEM
        };

        let remaining_items = total.saturating_sub(current) as u32;
        let remaining = average_per_item * remaining_items;
        let eta = chrono::Duration::from_std(remaining)
            .ok()
            .and_then(|d| wall_now.checked_add_signed(d))
            .unwrap_or(wall_now);

        TimeEstimate {
            elapsed,
            average_per_item,
            remaining,
            total: elapsed + remaining,
            eta,
        }
    }
}

/// Human-friendly duration: `< 1s`, `42s`, `3m 5s`, `1h 2m`.
pub fn format_duration(d: Duration) -> String {
    if d < Duration::from_secs(1) {
        return "< 1s".to_string();
    }
    let seconds = d.as_secs();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    if hours > 0 {
        format!("{}h {}m", hours, minutes % 60)
    } else if minutes > 0 {
        format!("{}m {}s", minutes, seconds % 60)
    } else {
        format!("{}s", seconds)
    }
}
