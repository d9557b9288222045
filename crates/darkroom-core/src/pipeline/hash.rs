//! Content hashing for change detection.

use blake3::Hasher as Blake3Hasher;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// BLAKE3 content hashes of files and buffers.
pub struct Hasher;

impl Hasher {
    /// Hash a file's contents.
    ///
    /// Streams the file in 64KB chunks instead of loading it whole.
    pub fn content_hash(path: &Path) -> std::io::Result<blake3::Hash> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut hasher = Blake3Hasher::new();

        let mut buffer = [0u8; 65536];
        loop {
            let bytes_read = reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(hasher.finalize())
    }

    /// Hash an in-memory byte buffer.
    pub fn content_hash_from_bytes(data: &[u8]) -> blake3::Hash {
        blake3::hash(data)
    }
}
