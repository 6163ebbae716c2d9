//! telemetry/counters.rs
//! Mutable counters used during encode/decode runs.
//!
//! Summary: Collects chunk counts and byte counts per worker.
//! Converted into an immutable TelemetrySnapshot at pipeline end.
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

/// Deterministic counters collected during a run
#[derive(Default, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TelemetryCounters {
    pub chunks_processed: u64,
    pub bytes_payload: u64,
    pub bytes_artifacts: u64,
    pub fallback_decodes: u64,
}

impl TelemetryCounters {
    /// Record one chunk rendered and persisted as an artifact.
    ///
    /// - `payload_len`: chunk bytes fed to the codec
    /// - `artifact_len`: size of the written image file
    pub fn add_encoded(&mut self, payload_len: usize, artifact_len: u64) {
        self.chunks_processed += 1;
        self.bytes_payload += payload_len as u64;
        self.bytes_artifacts += artifact_len;
    }

    /// Record one artifact read back into a payload.
    ///
    /// - `artifact_len`: size of the image file read
    /// - `payload_len`: bytes recovered from the symbol
    /// - `used_fallback`: the primary hints failed and the fallback hints succeeded
    pub fn add_decoded(&mut self, artifact_len: u64, payload_len: usize, used_fallback: bool) {
        self.chunks_processed += 1;
        self.bytes_payload += payload_len as u64;
        self.bytes_artifacts += artifact_len;
        if used_fallback {
            self.fallback_decodes += 1;
        }
    }

    pub fn merge(&mut self, other: &TelemetryCounters) {
        self.chunks_processed += other.chunks_processed;
        self.bytes_payload += other.bytes_payload;
        self.bytes_artifacts += other.bytes_artifacts;
        self.fallback_decodes += other.fallback_decodes;
    }
}

impl AddAssign for TelemetryCounters {
    fn add_assign(&mut self, rhs: Self) {
        self.merge(&rhs);
    }
}
