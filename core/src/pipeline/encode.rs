//! pipeline/encode.rs
//! File -> artifacts. Sequential ordered reads, parallel encode+persist behind the admission gate.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::thread;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, error, info};

use crate::codec::SymbolCodec;
use crate::config::ConverterConfig;
use crate::pipeline::io::{artifact_path, chunk_count, write_artifact, Chunk, ChunkSource};
use crate::pipeline::parallelism::{AdmissionGate, CancelToken};
use crate::telemetry::{
    Direction, ProgressTracker, Stage, StageTimes, TelemetryCounters, TelemetrySnapshot, TelemetryTimer,
};
use crate::types::{io_at, ConvertError};

pub fn run_encode_pipeline<C>(
    input: &Path,
    output_dir: &Path,
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
    let file = File::open(input).map_err(io_at(input))?;
    let file_size = file.metadata().map_err(io_at(input))?.len();
    let total = chunk_count(file_size, config.chunk_size);

    info!(
        "[ENCODE] {} ({} bytes) -> {} as {} artifacts via {} (max_parallel={})",
        input.display(),
        file_size,
        output_dir.display(),
        total,
        codec.name(),
        config.max_parallel
    );

    let gate = AdmissionGate::new(config.max_parallel);
    let counters = Mutex::new(TelemetryCounters::default());
    let stage_times = Mutex::new(StageTimes::default());
    let mut source = ChunkSource::new(BufReader::new(file), config.chunk_size, total);

    thread::scope(|scope| {
        while source.remaining() > 0 {
            // Backpressure: at most `max_parallel` chunks are read-but-not-persisted.
            let permit = match gate.acquire(cancel) {
                Ok(permit) => permit,
                Err(_) => break,
            };

            let started = Instant::now();
            let chunk = match source.next() {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    cancel.fail(ConvertError::io(input, e));
                    break;
                }
                None => break,
            };
            stage_times.lock().add(Stage::Read, started.elapsed());
            debug!("[ENCODE] dispatching chunk {}/{} ({} bytes)", chunk.index, total, chunk.payload.len());

            let (counters, stage_times) = (&counters, &stage_times);
            scope.spawn(move || {
                let _permit = permit;
                if cancel.is_cancelled() {
                    return;
                }
                match encode_chunk(&chunk, codec, config, output_dir) {
                    Ok((chunk_counters, chunk_times)) => {
                        counters.lock().merge(&chunk_counters);
                        stage_times.lock().merge(&chunk_times);
                        progress.record_partial(chunk.index, total);
                    }
                    Err(e) => {
                        error!("[ENCODE] chunk {} failed: {}", chunk.index, e);
                        cancel.fail(e);
                    }
                }
            });
        }
    });

    // All workers joined at scope exit.
    cancel.outcome()?;
    progress.complete();

    timer.stage_times = stage_times.into_inner();
    timer.finish();
    let snapshot = TelemetrySnapshot::from(Direction::Encode, total, gate.peak(), &counters.into_inner(), &timer);
    info!(
        "[ENCODE] done: {} artifacts, {} payload bytes in {:.2?} [{}]",
        snapshot.chunks_processed,
        snapshot.bytes_payload,
        snapshot.elapsed,
        snapshot.stage_times.summary()
    );
    Ok(snapshot)
}

/// Worker body: render one chunk and persist it under its artifact name.
pub fn encode_chunk<C>(
    chunk: &Chunk,
    codec: &C,
    config: &ConverterConfig,
    output_dir: &Path,
) -> Result<(TelemetryCounters, StageTimes), ConvertError>
where
    C: SymbolCodec + ?Sized,
{
    let mut counters = TelemetryCounters::default();
    let mut times = StageTimes::default();

    let started = Instant::now();
    let image = codec
        .encode(&chunk.payload, config.side_length)
        .map_err(|e| ConvertError::codec(chunk.index, e))?;
    times.add(Stage::Encode, started.elapsed());

    let started = Instant::now();
    fs::create_dir_all(output_dir).map_err(io_at(output_dir))?;
    let path = artifact_path(output_dir, config, chunk.index);
    let artifact_len = write_artifact(&path, chunk.index, &image)?;
    times.add(Stage::Write, started.elapsed());

    counters.add_encoded(chunk.payload.len(), artifact_len);
    Ok((counters, times))
}
