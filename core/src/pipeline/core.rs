// Stable public API over the encode/decode pipelines.

use std::path::Path;

use crate::{
    codec::{QrCodec, SymbolCodec},
    config::ConverterConfig,
    pipeline::{decode::run_decode_pipeline, encode::run_encode_pipeline, parallelism::CancelToken},
    telemetry::{ProgressTracker, TelemetrySnapshot},
    types::ConvertError,
};

/// File <-> artifact-folder converter.
///
/// `progress` is supplied by the caller so it can be polled from another thread
/// while a run is in flight; each call resets it to 0 first.
#[derive(Debug, Clone, Default)]
pub struct Converter<C: SymbolCodec = QrCodec> {
    config: ConverterConfig,
    codec: C,
}

impl Converter<QrCodec> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: SymbolCodec> Converter<C> {
    pub fn with_codec(config: ConverterConfig, codec: C) -> Self {
        Self { config, codec }
    }

    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ConverterConfig {
        &mut self.config
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Split `input` into artifacts under `output_dir`.
    pub fn encode(
        &self,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        progress: &ProgressTracker,
    ) -> Result<TelemetrySnapshot, ConvertError> {
        self.encode_with_cancel(input, output_dir, progress, &CancelToken::new())
    }

    pub fn encode_with_cancel(
        &self,
        input: impl AsRef<Path>,
        output_dir: impl AsRef<Path>,
        progress: &ProgressTracker,
        cancel: &CancelToken,
    ) -> Result<TelemetrySnapshot, ConvertError> {
        self.config.validate()?;
        run_encode_pipeline(input.as_ref(), output_dir.as_ref(), &self.codec, &self.config, progress, cancel)
    }

    /// Rebuild `output` from the artifacts in `input_dir`.
    pub fn decode(
        &self,
        input_dir: impl AsRef<Path>,
        output: impl AsRef<Path>,
        progress: &ProgressTracker,
    ) -> Result<TelemetrySnapshot, ConvertError> {
        self.decode_with_cancel(input_dir, output, progress, &CancelToken::new())
    }

    pub fn decode_with_cancel(
        &self,
        input_dir: impl AsRef<Path>,
        output: impl AsRef<Path>,
        progress: &ProgressTracker,
        cancel: &CancelToken,
    ) -> Result<TelemetrySnapshot, ConvertError> {
        self.config.validate()?;
        run_decode_pipeline(input_dir.as_ref(), output.as_ref(), &self.codec, &self.config, progress, cancel)
    }
}
