//! codec/qr.rs
//!
//! QR Code symbol codec.
//!
//! Design notes:
//! - Byte mode is forced so arbitrary binary chunks survive unchanged (no numeric/kanji segmentation).
//! - The smallest version that fits the payload is chosen, rendered with a 4-module quiet zone
//!   at an integer module scale, centred on an exactly `side × side` canvas.
//! - Detection uses `rqrr`; raw segment bytes are extracted with `decode_to`.

use image::{GrayImage, Luma};
use qrcode::bits::Bits;
use qrcode::{Color, EcLevel, QrCode, Version};

use super::types::{CodecError, DecodeHints, SymbolCodec};

const QUIET_ZONE_MODULES: u32 = 4;
const MAX_VERSION: i16 = 40;
const DARK: Luma<u8> = Luma([0]);
const LIGHT: Luma<u8> = Luma([255]);

#[derive(Debug, Clone, Copy)]
pub struct QrCodec {
    ec_level: EcLevel,
}

impl Default for QrCodec {
    fn default() -> Self {
        Self { ec_level: EcLevel::L }
    }
}

impl QrCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ec_level(ec_level: EcLevel) -> Self {
        Self { ec_level }
    }

    /// Byte-mode capacity of a version 40 symbol at this codec's EC level.
    pub fn max_payload(&self) -> usize {
        match self.ec_level {
            EcLevel::L => 2953,
            EcLevel::M => 2331,
            EcLevel::Q => 1663,
            EcLevel::H => 1273,
        }
    }

    fn build_symbol(&self, payload: &[u8]) -> Result<QrCode, CodecError> {
        if payload.len() > self.max_payload() {
            return Err(CodecError::PayloadTooLarge { len: payload.len(), max: self.max_payload() });
        }
        for v in 1..=MAX_VERSION {
            let mut bits = Bits::new(Version::Normal(v));
            if bits.push_byte_data(payload).is_err() || bits.push_terminator(self.ec_level).is_err() {
                continue;
            }
            return QrCode::with_bits(bits, self.ec_level).map_err(|e| CodecError::Render(e.to_string()));
        }
        Err(CodecError::PayloadTooLarge { len: payload.len(), max: self.max_payload() })
    }
}

impl SymbolCodec for QrCodec {
    fn name(&self) -> &'static str {
        "qr"
    }

    fn encode(&self, payload: &[u8], side_length: u32) -> Result<GrayImage, CodecError> {
        let code = self.build_symbol(payload)?;
        let modules = code.width() as u32;
        let span = modules + 2 * QUIET_ZONE_MODULES;
        let scale = side_length / span;
        if scale == 0 {
            return Err(CodecError::SideTooSmall { side: side_length, required: span });
        }

        let mut canvas = GrayImage::from_pixel(side_length, side_length, LIGHT);
        let origin = (side_length - span * scale) / 2 + QUIET_ZONE_MODULES * scale;

        for my in 0..modules {
            for mx in 0..modules {
                if code[(mx as usize, my as usize)] != Color::Dark {
                    continue;
                }
                let (px, py) = (origin + mx * scale, origin + my * scale);
                for dy in 0..scale {
                    for dx in 0..scale {
                        canvas.put_pixel(px + dx, py + dy, DARK);
                    }
                }
            }
        }
        Ok(canvas)
    }

    fn decode(&self, image: &GrayImage, hints: DecodeHints) -> Result<Vec<u8>, CodecError> {
        let normalized;
        let source = if hints.pure_symbol {
            image
        } else {
            normalized = normalize(image);
            &normalized
        };

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            source.width() as usize,
            source.height() as usize,
            |x, y| source.get_pixel(x as u32, y as u32)[0],
        );
        let grids = prepared.detect_grids();
        if grids.is_empty() {
            return Err(CodecError::Unrecognized("no symbol detected".into()));
        }

        let mut last_err = None;
        for grid in &grids {
            let mut payload = Vec::new();
            match grid.decode_to(&mut payload) {
                Ok(_) => return Ok(payload),
                Err(e) => last_err = Some(e.to_string()),
            }
        }
        Err(CodecError::Unrecognized(last_err.unwrap_or_else(|| "symbol unreadable".into())))
    }
}

/// Fallback preparation: binarise around the mean luminance and add a white margin,
/// so tightly cropped or low-contrast scans still expose finder patterns.
fn normalize(image: &GrayImage) -> GrayImage {
    let (w, h) = image.dimensions();
    let pixels = (w as u64 * h as u64).max(1);
    let mean = image.pixels().map(|p| p[0] as u64).sum::<u64>() / pixels;
    let threshold = mean.clamp(1, 254) as u8;

    let margin = (w.max(h) / 8).max(QUIET_ZONE_MODULES);
    let mut out = GrayImage::from_pixel(w + 2 * margin, h + 2 * margin, LIGHT);
    for (x, y, p) in image.enumerate_pixels() {
        let v = if p[0] < threshold { DARK } else { LIGHT };
        out.put_pixel(x + margin, y + margin, v);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_has_exact_side_length() {
        let codec = QrCodec::new();
        let img = codec.encode(b"hello", 300).unwrap();
        assert_eq!(img.dimensions(), (300, 300));
    }

    #[test]
    fn too_small_side_is_rejected() {
        let codec = QrCodec::new();
        let err = codec.encode(&[0u8; 500], 40).unwrap_err();
        assert!(matches!(err, CodecError::SideTooSmall { side: 40, .. }));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let codec = QrCodec::new();
        let err = codec.encode(&vec![7u8; 3000], 1480).unwrap_err();
        assert!(matches!(err, CodecError::PayloadTooLarge { len: 3000, max: 2953 }));
    }

    #[test]
    fn normalize_adds_margin() {
        let img = GrayImage::from_pixel(80, 80, Luma([10]));
        let out = normalize(&img);
        assert_eq!(out.dimensions(), (100, 100));
        assert_eq!(out.get_pixel(0, 0)[0], 255);
    }
}
