//! pipeline/io.rs
//! Chunk source, artifact naming, folder enumeration and raster persistence.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use image::{GrayImage, ImageError, ImageFormat};
use tracing::{debug, warn};

use crate::codec::CodecError;
use crate::config::ConverterConfig;
use crate::constants::ARTIFACT_EXTENSION;
use crate::types::{io_at, ConvertError};

// ================= Chunks =================

/// One contiguous slice of the input, 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub index: u64,
    pub payload: Bytes,
}

/// `floor(size / chunk_size) + 1`: exact multiples end with one empty chunk.
pub fn chunk_count(file_size: u64, chunk_size: usize) -> u64 {
    file_size / chunk_size.max(1) as u64 + 1
}

/// Fill up to `len` bytes, stopping early only at EOF.
pub fn read_exact_or_eof<R: Read>(r: &mut R, len: usize) -> io::Result<Bytes> {
    let mut buf = vec![0u8; len];
    let mut off = 0;

    while off < len {
        match r.read(&mut buf[off..]) {
            Ok(0) => break,
            Ok(n) => off += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    buf.truncate(off);
    Ok(Bytes::from(buf))
}

/// Sequential reader yielding exactly `total` chunks in index order.
#[derive(Debug)]
pub struct ChunkSource<R> {
    reader: R,
    chunk_size: usize,
    next: u64,
    total: u64,
}

impl<R: Read> ChunkSource<R> {
    pub fn new(reader: R, chunk_size: usize, total: u64) -> Self {
        Self { reader, chunk_size: chunk_size.max(1), next: 1, total }
    }

    pub fn remaining(&self) -> u64 {
        (self.total + 1).saturating_sub(self.next)
    }
}

impl<R: Read> Iterator for ChunkSource<R> {
    type Item = io::Result<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.total {
            return None;
        }
        let index = self.next;
        self.next += 1;
        Some(read_exact_or_eof(&mut self.reader, self.chunk_size).map(|payload| Chunk { index, payload }))
    }
}

// ================= Naming =================

/// `prefix + zero-padded(index, pad) + ".png"`
pub fn artifact_name(prefix: &str, index: u64, pad: usize) -> String {
    format!("{}{:0width$}.{}", prefix, index, ARTIFACT_EXTENSION, width = pad)
}

pub fn artifact_path(dir: &Path, config: &ConverterConfig, index: u64) -> PathBuf {
    dir.join(artifact_name(&config.filename_prefix, index, config.filename_pad_length))
}

/// Inverse of `artifact_name`. Only canonical names are accepted.
pub fn parse_artifact_index(name: &str, prefix: &str, pad: usize) -> Option<u64> {
    let digits = name
        .strip_prefix(prefix)?
        .strip_suffix(ARTIFACT_EXTENSION)?
        .strip_suffix('.')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index: u64 = digits.parse().ok()?;
    if index == 0 || artifact_name(prefix, index, pad) != name {
        return None;
    }
    Some(index)
}

// ================= Enumeration =================

/// Artifacts found in a folder: always the contiguous run `1..=total`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactSet {
    pub dir: PathBuf,
    pub total: u64,
    /// Entries that are not artifacts under the configured naming scheme.
    pub ignored: usize,
}

pub fn enumerate_artifacts(dir: &Path, config: &ConverterConfig) -> Result<ArtifactSet, ConvertError> {
    let prefix = config.filename_prefix.as_str();
    let pad = config.filename_pad_length;

    let mut indices = BTreeSet::new();
    let mut ignored = 0usize;

    for entry in fs::read_dir(dir).map_err(io_at(dir))? {
        let entry = entry.map_err(io_at(dir))?;
        let path = entry.path();
        let parsed = if path.is_file() {
            entry.file_name().to_str().and_then(|n| parse_artifact_index(n, prefix, pad))
        } else {
            None
        };

        match parsed {
            Some(index) => {
                indices.insert(index);
            }
            None => {
                debug!("[ENUM] ignoring {}", path.display());
                ignored += 1;
            }
        }
    }

    if ignored > 0 {
        warn!("[ENUM] {} entries in {} are not artifacts and were ignored", ignored, dir.display());
    }

    let total = indices.len() as u64;
    if let Some(missing) = first_gap(&indices) {
        return Err(ConvertError::MissingArtifact { index: missing, dir: dir.to_path_buf() });
    }

    Ok(ArtifactSet { dir: dir.to_path_buf(), total, ignored })
}

/// Smallest index in `1..=len` absent from the (sorted, distinct) set.
fn first_gap(indices: &BTreeSet<u64>) -> Option<u64> {
    indices
        .iter()
        .zip(1u64..)
        .find(|(found, expected)| **found != *expected)
        .map(|(_, expected)| expected)
}

// ================= Raster persistence =================

/// Write `image` as a PNG artifact, returning the file size.
pub fn write_artifact(path: &Path, index: u64, image: &GrayImage) -> Result<u64, ConvertError> {
    let file = File::create(path).map_err(io_at(path))?;
    let mut writer = BufWriter::new(file);

    image.write_to(&mut writer, ImageFormat::Png).map_err(|e| match e {
        ImageError::IoError(source) => ConvertError::io(path, source),
        other => ConvertError::codec(index, CodecError::Image(other)),
    })?;
    writer.flush().map_err(io_at(path))?;

    let len = writer.get_ref().metadata().map_err(io_at(path))?.len();
    Ok(len)
}

/// Load an artifact as 8-bit grey. Any failure after the file opened is a codec error.
pub fn read_artifact(path: &Path, index: u64) -> Result<(GrayImage, u64), ConvertError> {
    let file = File::open(path).map_err(io_at(path))?;
    let len = file.metadata().map_err(io_at(path))?.len();

    let image = image::load(BufReader::new(file), ImageFormat::Png)
        .map_err(|e| ConvertError::codec(index, CodecError::Image(e)))?;
    Ok((image.into_luma8(), len))
}
