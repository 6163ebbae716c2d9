// Shared helpers for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use image::{GrayImage, Luma};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

use file2qr_core::codec::{CodecError, DecodeHints, SymbolCodec};
use file2qr_core::config::ConverterConfig;

// ------------------------------------------------------------
// Codecs
// ------------------------------------------------------------

/// Lossless stand-in for QR: a 4-byte big-endian length, then the payload, one byte per pixel.
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelCodec;

impl SymbolCodec for PixelCodec {
    fn name(&self) -> &'static str {
        "pixel"
    }

    fn encode(&self, payload: &[u8], side_length: u32) -> Result<GrayImage, CodecError> {
        let capacity = (side_length as usize * side_length as usize).saturating_sub(4);
        if payload.len() > capacity {
            return Err(CodecError::PayloadTooLarge { len: payload.len(), max: capacity });
        }
        let mut bytes = (payload.len() as u32).to_be_bytes().to_vec();
        bytes.extend_from_slice(payload);
        bytes.resize(side_length as usize * side_length as usize, 0xFF);
        GrayImage::from_raw(side_length, side_length, bytes)
            .ok_or_else(|| CodecError::Render("buffer size mismatch".into()))
    }

    fn decode(&self, image: &GrayImage, _hints: DecodeHints) -> Result<Vec<u8>, CodecError> {
        let raw = image.as_raw();
        if raw.len() < 4 {
            return Err(CodecError::Unrecognized("image too small".into()));
        }
        let len = u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]) as usize;
        if len > raw.len() - 4 {
            return Err(CodecError::Unrecognized(format!("length {len} exceeds image")));
        }
        Ok(raw[4..4 + len].to_vec())
    }
}

/// Tracks how many encode/decode calls overlap.
#[derive(Debug, Default)]
pub struct CountingCodec {
    pub active: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
    pub delay: Duration,
}

impl CountingCodec {
    pub fn with_delay(delay: Duration) -> Self {
        Self { delay, ..Self::default() }
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn enter(&self) {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);
    }

    fn exit(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SymbolCodec for CountingCodec {
    fn name(&self) -> &'static str {
        "counting"
    }

    fn encode(&self, payload: &[u8], side_length: u32) -> Result<GrayImage, CodecError> {
        self.enter();
        let out = PixelCodec.encode(payload, side_length);
        self.exit();
        out
    }

    fn decode(&self, image: &GrayImage, hints: DecodeHints) -> Result<Vec<u8>, CodecError> {
        self.enter();
        let out = PixelCodec.decode(image, hints);
        self.exit();
        out
    }
}

/// Sleeps a random few milliseconds per call so workers finish out of order.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShuffleCodec;

impl ShuffleCodec {
    fn jitter() {
        let ms = rand::thread_rng().gen_range(0..6);
        thread::sleep(Duration::from_millis(ms));
    }
}

impl SymbolCodec for ShuffleCodec {
    fn name(&self) -> &'static str {
        "shuffle"
    }

    fn encode(&self, payload: &[u8], side_length: u32) -> Result<GrayImage, CodecError> {
        Self::jitter();
        PixelCodec.encode(payload, side_length)
    }

    fn decode(&self, image: &GrayImage, hints: DecodeHints) -> Result<Vec<u8>, CodecError> {
        Self::jitter();
        PixelCodec.decode(image, hints)
    }
}

/// Fails every primary-hint decode, so each artifact needs the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackOnlyCodec;

impl SymbolCodec for FallbackOnlyCodec {
    fn name(&self) -> &'static str {
        "fallback-only"
    }

    fn encode(&self, payload: &[u8], side_length: u32) -> Result<GrayImage, CodecError> {
        PixelCodec.encode(payload, side_length)
    }

    fn decode(&self, image: &GrayImage, hints: DecodeHints) -> Result<Vec<u8>, CodecError> {
        if hints.pure_symbol {
            return Err(CodecError::Unrecognized("primary disabled".into()));
        }
        PixelCodec.decode(image, hints)
    }
}

/// Fails the `fail_on`-th encode call (1-based); the others behave like `PixelCodec`.
#[derive(Debug, Default)]
pub struct FailingCodec {
    pub fail_on: usize,
    pub calls: AtomicUsize,
}

impl FailingCodec {
    pub fn new(fail_on: usize) -> Self {
        Self { fail_on, calls: AtomicUsize::new(0) }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SymbolCodec for FailingCodec {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn encode(&self, payload: &[u8], side_length: u32) -> Result<GrayImage, CodecError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_on {
            return Err(CodecError::Render(format!("injected failure on call {n}")));
        }
        thread::sleep(Duration::from_millis(1));
        PixelCodec.encode(payload, side_length)
    }

    fn decode(&self, image: &GrayImage, hints: DecodeHints) -> Result<Vec<u8>, CodecError> {
        PixelCodec.decode(image, hints)
    }
}

// ------------------------------------------------------------
// Fixtures
// ------------------------------------------------------------

/// Small images for the pixel codecs: 64 * 64 - 4 bytes fit a default 2950-byte chunk.
pub fn fast_config() -> ConverterConfig {
    ConverterConfig { side_length: 64, ..ConverterConfig::default() }
}

pub fn random_bytes(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut data = vec![0u8; len];
    rng.fill_bytes(&mut data);
    data
}

pub fn write_input(dir: &Path, name: &str, data: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, data).unwrap();
    path
}

/// Sorted file names in `dir`.
pub fn list_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// A checkerboard that no codec should recognise.
pub fn noise_image(side: u32) -> GrayImage {
    GrayImage::from_fn(side, side, |x, y| Luma([if (x / 3 + y / 3) % 2 == 0 { 0 } else { 255 }]))
}
