//! pipeline/decode.rs
//! Artifacts -> file. Parallel load+decode into the reassembly buffer, one ordered stream writer.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::thread;
use std::time::Instant;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::codec::{decode_with_fallback, SymbolCodec};
use crate::config::ConverterConfig;
use crate::pipeline::io::{artifact_path, enumerate_artifacts, read_artifact};
use crate::pipeline::parallelism::{AdmissionGate, CancelToken};
use crate::pipeline::reassembly::ReassemblyBuffer;
use crate::pipeline::writer::{StreamWriter, WriteReport};
use crate::telemetry::{
    Direction, ProgressTracker, Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer,
};
use crate::types::{io_at, ConvertError};

pub fn run_decode_pipeline<C>(
    input_dir: &Path,
    output: &Path,
    codec: &C,
    config: &ConverterConfig,
    progress: &ProgressTracker,
    cancel: &CancelToken,
) -> Result<TelemetrySnapshot, ConvertError>
where
    C: SymbolCodec + ?Sized,
{
    let mut timer = TelemetryTimer::new();
    progress.reset();

    // ---- Dispatch-path checks: fail before any worker starts ----
    let artifacts = enumerate_artifacts(input_dir, config)?;
    let total = artifacts.total;
    // An existing output is only truncated by a run that can still proceed.
    if cancel.is_cancelled() {
        return Err(ConvertError::Cancelled);
    }
    let out_file = File::create(output).map_err(io_at(output))?;

    if total == 0 {
        warn!("[DECODE] {} holds no artifacts; output will be empty", input_dir.display());
    }
    info!(
        "[DECODE] {} ({} artifacts) -> {} via {} (max_parallel={})",
        input_dir.display(),
        total,
        output.display(),
        codec.name(),
        config.max_parallel
    );

    // One slot stays with the stream writer for the whole run.
    let gate = AdmissionGate::new(config.max_parallel + 1);
    let buffer = ReassemblyBuffer::new();
    let counters = Mutex::new(TelemetryCounters::default());
    let stage_times = Mutex::new(StageTimes::default());
    let writer_permit = gate.acquire(cancel)?;

    let report = thread::scope(|scope| {
        let writer = StreamWriter::new(BufWriter::new(out_file), output, &buffer, progress, total);
        let buffer = &buffer;

        let writer_handle = scope.spawn(move || {
            let _permit = writer_permit;
            match writer.run(cancel) {
                Ok(report) => Some(report),
                Err(e) => {
                    if !e.is_cancelled() {
                        error!("[WRITER] failed: {}", e);
                    }
                    cancel.fail(e);
                    None
                }
            }
        });

        for index in 1..=total {
            let permit = match gate.acquire(cancel) {
                Ok(permit) => permit,
                Err(_) => break,
            };
            debug!("[DECODE] dispatching artifact {}/{}", index, total);

            let path = artifact_path(input_dir, config, index);
            let (counters, stage_times) = (&counters, &stage_times);
            scope.spawn(move || {
                let _permit = permit;
                if cancel.is_cancelled() {
                    return;
                }
                let inserted = decode_artifact(index, &path, codec).and_then(|(payload, c, t)| {
                    counters.lock().merge(&c);
                    stage_times.lock().merge(&t);
                    buffer.insert(index, payload)
                });
                if let Err(e) = inserted {
                    error!("[DECODE] artifact {} failed: {}", index, e);
                    cancel.fail(e);
                    buffer.wake_all();
                }
            });
        }

        writer_handle
            .join()
            .map_err(|_| ConvertError::Pipeline("stream writer panicked".into()))
    })?;

    cancel.outcome()?;
    let report: WriteReport = report.ok_or(ConvertError::Cancelled)?;

    let mut stage_times = stage_times.into_inner();
    stage_times.merge(&report.stage_times);
    timer.stage_times = stage_times;
    timer.finish();

    let snapshot = TelemetrySnapshot::from(Direction::Decode, total, gate.peak(), &counters.into_inner(), &timer);
    info!(
        "[DECODE] done: {} chunks, {} bytes written in {:.2?} (peak buffered {}) [{}]",
        report.chunks_written,
        report.bytes_written,
        snapshot.elapsed,
        buffer.peak_pending(),
        snapshot.stage_times.summary()
    );
    Ok(snapshot)
}

/// Worker body: load one artifact and recover its payload.
pub fn decode_artifact<C>(
    index: u64,
    path: &Path,
    codec: &C,
) -> Result<(Bytes, TelemetryCounters, StageTimes), ConvertError>
where
    C: SymbolCodec + ?Sized,
{
    let mut counters = TelemetryCounters::default();
    let mut times = StageTimes::default();

    let started = Instant::now();
    let (image, artifact_len) = read_artifact(path, index)?;
    times.add(Stage::Read, started.elapsed());

    let started = Instant::now();
    let decoded = decode_with_fallback(codec, &image).map_err(|e| ConvertError::codec(index, e))?;
    times.add(Stage::Decode, started.elapsed());
    if decoded.used_fallback {
        debug!("[DECODE] artifact {} needed fallback hints", index);
    }

    counters.add_decoded(artifact_len, decoded.payload.len(), decoded.used_fallback);
    Ok((Bytes::from(decoded.payload), counters, times))
}
