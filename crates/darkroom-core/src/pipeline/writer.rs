//! Content-hash-gated writes of encoded variants.

use std::io::ErrorKind;
use std::path::Path;

use crate::error::PipelineError;
use crate::types::WriteOutcome;

use super::hash::Hasher;

/// Writes encoded bytes only when they differ from what is already on disk.
///
/// Overwrites discard the previous content; there is no backup.
pub struct IdempotentWriter;

impl IdempotentWriter {
    /// Write `bytes` to `destination` unless the file already holds them.
    ///
    /// Parent directories are created as needed; a directory created
    /// concurrently by another worker is not an error. Any other I/O failure
    /// is returned as [`PipelineError::Write`].
    pub fn write(
        destination: &Path,
        bytes: &[u8],
        captured_at: &str,
    ) -> Result<WriteOutcome, PipelineError> {
        let write_err = |source: std::io::Error| PipelineError::Write {
            path: destination.to_path_buf(),
            source,
        };

        match Hasher::content_hash(destination) {
            Ok(existing) => {
                if existing == Hasher::content_hash_from_bytes(bytes) {
                    tracing::info!("Skipping {} (file unchanged)", destination.display());
                    return Ok(WriteOutcome::Unchanged);
                }
                tracing::info!("{} truncated", destination.display());
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(write_err(e)),
        }

        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }

        tracing::info!("Saving {} [{}]", destination.display(), captured_at);
        std::fs::write(destination, bytes).map_err(write_err)?;
        Ok(WriteOutcome::Written)
    }
}
