//! pipeline: bounded-parallel chunk/encode and decode/reassemble stages.
//!
//! Layering: `io` (chunks, artifact naming, PNG persistence) and `parallelism`
//! (admission gate, cancellation) at the bottom; `reassembly` and `writer` for the
//! ordered drain; `encode`/`decode` wire them together; `core` is the stable API.

pub mod parallelism;
pub mod io;
pub mod reassembly;
pub mod writer;
pub mod encode;
pub mod decode;
pub mod core;

pub use parallelism::{AdmissionGate, CancelToken, Permit};
pub use io::{artifact_name, chunk_count, enumerate_artifacts, parse_artifact_index, ArtifactSet, Chunk};
pub use reassembly::ReassemblyBuffer;
pub use writer::{StreamWriter, WriteReport};
pub use encode::run_encode_pipeline;
pub use decode::run_decode_pipeline;
pub use self::core::Converter;
