use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::types::{io_at, ConvertError};

/// Lowercase hex SHA-256 of a file's contents, streamed.
pub fn file_sha256(path: impl AsRef<Path>) -> Result<String, ConvertError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(io_at(path))?;
    let mut hasher = Sha256::new();
    io::copy(&mut BufReader::new(file), &mut hasher).map_err(io_at(path))?;
    Ok(hex::encode(hasher.finalize()))
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
