//! codec/mod.rs
//! Symbol codec seam: payload bytes <-> single-symbol grey image.
//!
//! Notes:
//! - The pipeline only ever talks to `SymbolCodec`; the QR implementation is the default.
//! - Codecs are stateless and shared by reference across worker threads.

pub mod types;
pub mod qr;

pub use types::*;
pub use qr::QrCodec;
