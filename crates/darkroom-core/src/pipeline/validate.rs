//! Input validation before and after decoding.

use std::path::Path;

use crate::config::LimitsConfig;
use crate::error::PipelineError;

/// JPEG start-of-image marker followed by any segment marker.
const JPEG_MAGIC: [u8; 3] = [0xFF, 0xD8, 0xFF];

/// Validates source files against the configured limits.
#[derive(Debug, Clone)]
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Quick checks on the file before it is read in full.
    ///
    /// Checks:
    /// - File exists and is readable
    /// - File size is within limits
    pub fn validate_file(&self, path: &Path) -> Result<(), PipelineError> {
        let metadata = std::fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::FileNotFound(path.to_path_buf()),
            _ => PipelineError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        let max_bytes = self.limits.max_file_size_mb.saturating_mul(1024 * 1024);
        if metadata.len() > max_bytes {
            return Err(PipelineError::FileTooLarge {
                path: path.to_path_buf(),
                size_mb: metadata.len() / (1024 * 1024),
                max_mb: self.limits.max_file_size_mb,
            });
        }
        Ok(())
    }

    /// Check the leading bytes for a JPEG signature.
    pub fn validate_header(&self, bytes: &[u8], path: &Path) -> Result<(), PipelineError> {
        if bytes.len() < 4 {
            return Err(PipelineError::Decode {
                path: path.to_path_buf(),
                message: "File too small to be a valid image".to_string(),
            });
        }
        if !Self::is_jpeg_header(bytes) {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: "not a JPEG (invalid magic bytes)".to_string(),
            });
        }
        Ok(())
    }

    /// Reject decoded images beyond the dimension limit.
    pub fn validate_dimensions(
        &self,
        width: u32,
        height: u32,
        path: &Path,
    ) -> Result<(), PipelineError> {
        let max_dim = self.limits.max_image_dimension;
        if width > max_dim || height > max_dim {
            return Err(PipelineError::ImageTooLarge {
                path: path.to_path_buf(),
                width,
                height,
                max_dim,
            });
        }
        Ok(())
    }

    fn is_jpeg_header(bytes: &[u8]) -> bool {
        bytes.starts_with(&JPEG_MAGIC)
    }
}
