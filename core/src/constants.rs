//! constants.rs
//! Defaults for the converter and fixed artifact format parameters.

use std::time::Duration;

/// Defaults when the caller does not override `ConverterConfig`.
pub const DEFAULT_MAX_PARALLEL: usize = 25;
/// Version 40-L QR holds 2953 bytes in byte mode; keep a small margin.
pub const DEFAULT_CHUNK_SIZE: usize = 2950;
/// 177 modules + 8 quiet-zone modules = 185, i.e. 8 px per module.
pub const DEFAULT_SIDE_LENGTH: u32 = 1480;
pub const DEFAULT_PAD_LENGTH: usize = 15;
pub const DEFAULT_PREFIX: &str = "";

/// Sanity bounds enforced by `ConverterConfig::validate`.
pub const MIN_SIDE_LENGTH: u32 = 21;
/// `u64::MAX` has 20 decimal digits.
pub const MAX_PAD_LENGTH: usize = 20;

/// Artifact file extension (without the dot).
pub const ARTIFACT_EXTENSION: &str = "png";

/// Slice the stream writer waits on the reassembly buffer before re-checking cancellation.
pub const WRITER_WAIT_SLICE: Duration = Duration::from_millis(50);

/// Interval an external reporter is expected to poll the progress tracker at.
pub const PROGRESS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Progress value that marks a finished run.
pub const PROGRESS_COMPLETE: u8 = 100;
