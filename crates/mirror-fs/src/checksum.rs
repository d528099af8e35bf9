//! SHA-256 content fingerprints
//!
//! Fingerprints are lowercase hex digests of file content only. Path and
//! modification time never contribute, so identical bytes always produce
//! identical fingerprints on any machine.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Read buffer size used when hashing files
const CHUNK_SIZE: usize = 64 * 1024;

/// Compute the SHA-256 fingerprint of in-memory content.
pub fn compute_content_checksum(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Compute the SHA-256 fingerprint of a file's contents.
///
/// The file is streamed in fixed-size chunks, so memory use stays bounded
/// regardless of file size.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_file_checksum(path: &Path) -> std::io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];

    loop {
        let read = match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
