//! telemetry/progress.rs
//! Shared completion percentage, advanced by many producers and polled by one reporter.

use std::sync::atomic::{AtomicU8, Ordering};

use crate::constants::PROGRESS_COMPLETE;

/// Monotonic percentage in `[0, 100]`.
///
/// Producers only ever raise the value (`fetch_max`), so out-of-order completions
/// cannot make it regress. `reset` is called once at the start of each run.
#[derive(Debug, Default)]
pub struct ProgressTracker {
    percent: AtomicU8,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u8 {
        self.percent.load(Ordering::Acquire)
    }

    pub fn is_complete(&self) -> bool {
        self.get() >= PROGRESS_COMPLETE
    }

    pub fn reset(&self) {
        self.percent.store(0, Ordering::Release);
    }

    /// Raise to `percent` (clamped to 100). Returns true if the stored value grew.
    pub fn advance_to(&self, percent: u8) -> bool {
        let percent = percent.min(PROGRESS_COMPLETE);
        self.percent.fetch_max(percent, Ordering::AcqRel) < percent
    }

    /// Record that chunk `index` of `total` is done.
    pub fn record(&self, index: u64, total: u64) -> bool {
        self.advance_to(percent_of(index, total))
    }

    /// Like `record`, but stays below 100: only `complete` marks a run finished.
    pub fn record_partial(&self, index: u64, total: u64) -> bool {
        self.advance_to(percent_of(index, total).min(PROGRESS_COMPLETE - 1))
    }

    pub fn complete(&self) {
        self.advance_to(PROGRESS_COMPLETE);
    }
}

/// `floor(index * 100 / total)`, capped at 100. A zero total counts as complete.
pub fn percent_of(index: u64, total: u64) -> u8 {
    if total == 0 {
        return PROGRESS_COMPLETE;
    }
    let pct = (index as u128 * 100) / total as u128;
    pct.min(PROGRESS_COMPLETE as u128) as u8
}
