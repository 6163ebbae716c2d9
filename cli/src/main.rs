//! file2qr CLI
//!
//! Turns a file into a folder of QR code images and back.
//!
//! # Modes
//! - `--encode` - split `--encode-file` into artifacts under `--encode-folder-destination`
//! - `--decode` - rebuild `--decode-file-destination` from `--decode-folder`
//!
//! Both may be given; encode runs first.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use file2qr_core::prelude::*;

mod progress;

use progress::ProgressPoller;

#[derive(Parser)]
#[command(name = "file2qr")]
#[command(about = "Convert a file into QR code images and back")]
#[command(version)]
struct Cli {
    /// Encode a file
    #[arg(long)]
    encode: bool,

    /// File to encode
    #[arg(long, default_value = "input.mp4")]
    encode_file: PathBuf,

    /// Folder to write the QR codes into
    #[arg(long, default_value = "frames-encoded")]
    encode_folder_destination: PathBuf,

    /// Decode a file
    #[arg(long)]
    decode: bool,

    /// Folder with QR codes to decode
    #[arg(long, default_value = "frames-encoded")]
    decode_folder: PathBuf,

    /// File where all decoded codes should be saved
    #[arg(long, default_value = "output.mp4")]
    decode_file_destination: PathBuf,

    /// Converter settings as JSON (missing fields keep their defaults)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print each run's telemetry as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if !cli.encode && !cli.decode {
        let _ = Cli::command().print_help();
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let mut converter = Converter::new();
    if let Some(path) = &cli.config {
        *converter.config_mut() = ConverterConfig::from_json_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?;
    }
    info!("[CLI] {:?}", converter.config());
    let progress = Arc::new(ProgressTracker::new());

    if cli.encode {
        let poller = ProgressPoller::start("encode", Arc::clone(&progress));
        let result = converter.encode(&cli.encode_file, &cli.encode_folder_destination, &progress);
        poller.finish();
        let snapshot = result.with_context(|| format!("encoding {} failed", cli.encode_file.display()))?;
        report(cli, &snapshot, &cli.encode_file)?;
    }

    if cli.decode {
        // The new poller must not see the encode run's 100.
        progress.reset();
        let poller = ProgressPoller::start("decode", Arc::clone(&progress));
        let result = converter.decode(&cli.decode_folder, &cli.decode_file_destination, &progress);
        poller.finish();
        let snapshot = result.with_context(|| format!("decoding {} failed", cli.decode_folder.display()))?;
        report(cli, &snapshot, &cli.decode_file_destination)?;
    }

    Ok(())
}

/// `file` is the plaintext side of the run: the encode input or the decode output.
fn report(cli: &Cli, snapshot: &TelemetrySnapshot, file: &Path) -> Result<()> {
    if cli.json {
        println!("{}", serde_json::to_string_pretty(snapshot).context("failed to serialize telemetry")?);
        return Ok(());
    }

    let digest = file_sha256(file).with_context(|| format!("failed to hash {}", file.display()))?;
    println!(
        "{}: {} chunks, {} payload bytes, {} artifact bytes in {:.2?} ({:.1} KiB/s, peak {} in flight)",
        snapshot.direction,
        snapshot.chunks_processed,
        snapshot.bytes_payload,
        snapshot.bytes_artifacts,
        snapshot.elapsed,
        snapshot.throughput_payload_bytes_per_sec / 1024.0,
        snapshot.peak_in_flight,
    );
    if snapshot.fallback_decodes > 0 {
        println!("  {} artifacts needed fallback decoding", snapshot.fallback_decodes);
    }
    println!("  sha256 {}  {}", digest, file.display());
    Ok(())
}
