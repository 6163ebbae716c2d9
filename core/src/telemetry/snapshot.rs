//! telemetry/snapshot.rs
//!
//! Immutable summary of one encode or decode run.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::telemetry::counters::TelemetryCounters;
use crate::telemetry::timers::{StageTimes, TelemetryTimer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Encode,
    Decode,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Encode => "encode",
            Direction::Decode => "decode",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub direction: Direction,
    pub total_chunks: u64,
    pub chunks_processed: u64,
    pub bytes_payload: u64,
    pub bytes_artifacts: u64,
    pub fallback_decodes: u64,
    /// Highest number of admission slots held at once.
    pub peak_in_flight: usize,
    pub throughput_payload_bytes_per_sec: f64,
    pub elapsed: Duration,
    pub stage_times: StageTimes,
}

impl TelemetrySnapshot {
    pub fn from(
        direction: Direction,
        total_chunks: u64,
        peak_in_flight: usize,
        counters: &TelemetryCounters,
        timer: &TelemetryTimer,
    ) -> Self {
        let elapsed = timer.elapsed();
        let throughput = if elapsed.as_secs_f64() > 0.0 {
            counters.bytes_payload as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        Self {
            direction,
            total_chunks,
            chunks_processed: counters.chunks_processed,
            bytes_payload: counters.bytes_payload,
            bytes_artifacts: counters.bytes_artifacts,
            fallback_decodes: counters.fallback_decodes,
            peak_in_flight,
            throughput_payload_bytes_per_sec: throughput,
            elapsed,
            stage_times: timer.stage_times.clone(),
        }
    }

    /// Every chunk the run counted was processed.
    pub fn is_complete(&self) -> bool {
        self.chunks_processed == self.total_chunks
    }
}
