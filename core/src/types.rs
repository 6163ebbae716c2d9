use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::CodecError;

/// Unified converter error covering I/O, codec, layout, config and pipeline failures.
/// - Dispatch-path failures are returned before any worker starts.
/// - Worker failures are collected through `CancelToken::fail` and surface after drain.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// File open/create/read/write/stat/list failure.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Payload could not be rendered, or an artifact could not be recognised.
    #[error("codec error on chunk {index}: {source}")]
    Codec {
        index: u64,
        #[source]
        source: CodecError,
    },

    /// Invalid converter configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Artifact folder is not a contiguous `1..=N` run.
    #[error("artifact {index} missing from {}", dir.display())]
    MissingArtifact { index: u64, dir: PathBuf },

    /// A chunk index was inserted into the reassembly buffer twice.
    #[error("chunk {index} delivered more than once")]
    DuplicateChunk { index: u64 },

    /// The run was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,

    /// Internal pipeline wiring failure.
    #[error("pipeline error: {0}")]
    Pipeline(String),

    /// Several workers failed; `first` is the earliest recorded failure.
    #[error("{first} (and {} more worker failure(s))", others.len())]
    Aggregate {
        first: Box<ConvertError>,
        others: Vec<ConvertError>,
    },
}

impl ConvertError {
    /// Attach a path to an I/O error.
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        ConvertError::Io { path: path.as_ref().to_path_buf(), source }
    }

    pub fn codec(index: u64, source: CodecError) -> Self {
        ConvertError::Codec { index, source }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ConvertError::Cancelled)
    }

    /// The error that caused the run to fail, unwrapping aggregates.
    pub fn root(&self) -> &ConvertError {
        match self {
            ConvertError::Aggregate { first, .. } => first.root(),
            other => other,
        }
    }
}

/// Closure helper for `map_err` on path-bound I/O calls.
pub(crate) fn io_at(path: &Path) -> impl FnOnce(io::Error) -> ConvertError + '_ {
    move |source| ConvertError::io(path, source)
}
