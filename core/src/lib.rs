//! file2qr-core
//!
//! Pure Rust file <-> image-symbol converter.
//! Splits a file into fixed-size chunks, renders each as an independently
//! decodable artifact with bounded parallelism, and reassembles them in order.

#![forbid(unsafe_code)]

// Shared and top level
pub mod constants;
pub mod types;
pub mod config;
pub mod utils;

pub mod codec;
pub mod telemetry;

// Stream layers
pub mod pipeline;

// -----------------------------------------------------------------------------
// Prelude (Rust users)
// -----------------------------------------------------------------------------
pub mod prelude {
    pub use crate::codec::{CodecError, DecodeHints, QrCodec, SymbolCodec};
    pub use crate::config::ConverterConfig;
    pub use crate::pipeline::{CancelToken, Converter};
    pub use crate::telemetry::{Direction, ProgressTracker, TelemetrySnapshot};
    pub use crate::types::ConvertError;
    pub use crate::utils::file_sha256;
}
