//! telemetry/mod.rs
//! Unified telemetry module: counters, timers, progress, and immutable snapshots.
//!
//! Notes:
//! - Workers accumulate local counters/timers and merge them once per chunk.
//! - `ProgressTracker` is the only value polled while a run is in flight.
//! - Snapshots are returned to the caller once a run has drained.

pub mod counters;
pub mod timers;
pub mod snapshot;
pub mod progress;

pub use counters::*;
pub use timers::*;
pub use snapshot::*;
pub use progress::*;
