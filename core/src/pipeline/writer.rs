//! pipeline/writer.rs
//! Ordered drain: appends payloads `1..=total` to the output as soon as each is available.

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, trace};

use crate::pipeline::parallelism::CancelToken;
use crate::pipeline::reassembly::ReassemblyBuffer;
use crate::telemetry::{ProgressTracker, Stage, StageTimes};
use crate::types::ConvertError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteReport {
    pub chunks_written: u64,
    pub bytes_written: u64,
    pub stage_times: StageTimes,
}

pub struct StreamWriter<'a, W: Write> {
    out: W,
    target: PathBuf,
    buffer: &'a ReassemblyBuffer,
    progress: &'a ProgressTracker,
    total: u64,
    next: u64,
}

impl<'a, W: Write> StreamWriter<'a, W> {
    /// `target` names the sink in error messages.
    pub fn new(
        out: W,
        target: impl Into<PathBuf>,
        buffer: &'a ReassemblyBuffer,
        progress: &'a ProgressTracker,
        total: u64,
    ) -> Self {
        Self { out, target: target.into(), buffer, progress, total, next: 1 }
    }

    /// Drain to completion. Sets progress to 100 only after every chunk is flushed.
    pub fn run(mut self, cancel: &CancelToken) -> Result<WriteReport, ConvertError> {
        let mut report = WriteReport::default();

        while self.next <= self.total {
            let payload = self
                .buffer
                .wait_take(self.next, cancel)
                .ok_or(ConvertError::Cancelled)?;

            let started = Instant::now();
            self.out
                .write_all(&payload)
                .map_err(|e| ConvertError::io(&self.target, e))?;
            report.stage_times.add(Stage::Write, started.elapsed());

            report.chunks_written += 1;
            report.bytes_written += payload.len() as u64;
            self.progress.record_partial(self.next, self.total);
            trace!("[WRITER] flushed chunk {} ({} bytes)", self.next, payload.len());

            self.next += 1;
        }

        self.out.flush().map_err(|e| ConvertError::io(&self.target, e))?;
        self.progress.complete();
        debug!("[WRITER] finished: {} chunks, {} bytes", report.chunks_written, report.bytes_written);
        Ok(report)
    }
}
