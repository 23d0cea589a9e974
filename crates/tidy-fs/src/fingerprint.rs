//! Streaming SHA-256 content fingerprints
//!
//! Every fingerprint uses the canonical format `sha256:<hex>`. File and reader
//! hashing reads in fixed-size chunks so memory use does not grow with the
//! size of the input.

use crate::{Error, Result};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Prefix for all fingerprints produced by this module
const PREFIX: &str = "sha256:";

/// Bytes read per chunk when streaming.
pub const CHUNK_SIZE: usize = 1024 * 1024;

/// Fingerprint an in-memory byte slice.
pub fn fingerprint_bytes(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{}{:x}", PREFIX, hasher.finalize())
}

/// Fingerprint everything a reader yields, one chunk at a time.
pub fn fingerprint_reader<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(format!("{}{:x}", PREFIX, hasher.finalize()))
}

/// Fingerprint the contents of a file.
///
/// # Errors
///
/// Returns [`Error::Io`] if the file cannot be opened or read.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| Error::io(path, e))?;
    fingerprint_reader(file).map_err(|e| Error::io(path, e))
}
