//! config.rs
//! Converter tunables. Code-level configuration, optionally loaded from JSON.

use std::path::{Path, MAIN_SEPARATOR};

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_CHUNK_SIZE, DEFAULT_MAX_PARALLEL, DEFAULT_PAD_LENGTH, DEFAULT_PREFIX,
    DEFAULT_SIDE_LENGTH, MAX_PAD_LENGTH, MIN_SIDE_LENGTH,
};
use crate::types::{io_at, ConvertError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConverterConfig {
    /// Concurrent encode/decode workers. Decode reserves one extra slot for the stream writer.
    pub max_parallel: usize,
    /// Payload bytes per artifact.
    pub chunk_size: usize,
    /// Width and height of every artifact image, in pixels.
    pub side_length: u32,
    /// Zero-padded width of the index in artifact file names.
    pub filename_pad_length: usize,
    pub filename_prefix: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            max_parallel: DEFAULT_MAX_PARALLEL,
            chunk_size: DEFAULT_CHUNK_SIZE,
            side_length: DEFAULT_SIDE_LENGTH,
            filename_pad_length: DEFAULT_PAD_LENGTH,
            filename_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

impl ConverterConfig {
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.max_parallel < 1 {
            return Err(ConvertError::Config("max_parallel must be at least 1".into()));
        }
        if self.chunk_size < 1 {
            return Err(ConvertError::Config("chunk_size must be at least 1".into()));
        }
        if self.side_length < MIN_SIDE_LENGTH {
            return Err(ConvertError::Config(format!(
                "side_length {} is below the minimum of {MIN_SIDE_LENGTH}",
                self.side_length
            )));
        }
        if self.filename_pad_length < 1 || self.filename_pad_length > MAX_PAD_LENGTH {
            return Err(ConvertError::Config(format!(
                "filename_pad_length {} must be within 1..={MAX_PAD_LENGTH}",
                self.filename_pad_length
            )));
        }
        if self.filename_prefix.contains(['/', '\\', MAIN_SEPARATOR]) {
            return Err(ConvertError::Config(format!(
                "filename_prefix {:?} must not contain path separators",
                self.filename_prefix
            )));
        }
        Ok(())
    }

    /// Parse a (possibly partial) JSON override; missing fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConvertError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConvertError::Config(format!("malformed config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(io_at(path))?;
        Self::from_json_str(&raw)
    }
}
