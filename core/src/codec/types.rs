use image::GrayImage;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("payload of {len} bytes exceeds symbol capacity of {max} bytes")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("side length {side}px cannot fit a symbol needing {required}px")]
    SideTooSmall { side: u32, required: u32 },

    #[error("symbol render failed: {0}")]
    Render(String),

    #[error("no readable symbol: {0}")]
    Unrecognized(String),

    #[error("raster error: {0}")]
    Image(#[from] image::ImageError),
}

/// Detection hints passed to `SymbolCodec::decode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeHints {
    /// The image is a clean, uncropped render of exactly one symbol.
    pub pure_symbol: bool,
}

impl DecodeHints {
    pub const PRIMARY: DecodeHints = DecodeHints { pure_symbol: true };
    pub const FALLBACK: DecodeHints = DecodeHints { pure_symbol: false };
}

// Require Send + Sync so one codec instance can serve every worker.
pub trait SymbolCodec: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Render `payload` as one symbol on a `side_length × side_length` canvas.
    fn encode(&self, payload: &[u8], side_length: u32) -> Result<GrayImage, CodecError>;

    /// Recover the exact payload bytes from a symbol image.
    fn decode(&self, image: &GrayImage, hints: DecodeHints) -> Result<Vec<u8>, CodecError>;
}

/// Outcome of a decode attempt, recording whether the fallback hints were needed.
#[derive(Debug)]
pub struct Decoded {
    pub payload: Vec<u8>,
    pub used_fallback: bool,
}

/// Decode with the primary hints first and the fallback hints second.
/// Both failing yields the fallback's error.
pub fn decode_with_fallback<C>(codec: &C, image: &GrayImage) -> Result<Decoded, CodecError>
where
    C: SymbolCodec + ?Sized,
{
    match codec.decode(image, DecodeHints::PRIMARY) {
        Ok(payload) => Ok(Decoded { payload, used_fallback: false }),
        Err(primary) => {
            debug!("[CODEC:{}] primary decode failed ({primary}), retrying with fallback hints", codec.name());
            let payload = codec.decode(image, DecodeHints::FALLBACK)?;
            Ok(Decoded { payload, used_fallback: true })
        }
    }
}
