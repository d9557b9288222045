//! Error types for the Darkroom derivative pipeline.
//!
//! Errors are organized by stage so log lines carry the file path and the
//! specific issue. [`PipelineError::is_fatal`] separates the conditions that
//! abort a batch from the per-photo defects that only skip one file.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for Darkroom operations.
#[derive(Error, Debug)]
pub enum DarkroomError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source file could not be read
    #[error("Read error for {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// The embedded tag set has no capture time
    #[error("Time not found in EXIF: {0}")]
    MissingTimestamp(PathBuf),

    /// The capture time tag is present but not `YYYY:MM:DD HH:MM:SS`
    #[error("Invalid EXIF timestamp for {path}: {value:?}")]
    InvalidTimestamp { path: PathBuf, value: String },

    /// Variant encoding failed
    #[error("Encode error for {path} (variant {variant}): {message}")]
    Encode {
        path: PathBuf,
        variant: String,
        message: String,
    },

    /// Writing a variant or the manifest failed
    #[error("Write error for {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {path} after {timeout_ms}ms")]
    Timeout {
        path: PathBuf,
        stage: String,
        timeout_ms: u64,
    },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Not a JPEG
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File or directory not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

impl PipelineError {
    /// Whether this error must abort the whole batch.
    ///
    /// Only destination-side write failures are fatal; every input defect
    /// degrades to a skipped photo.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

/// Convenience type alias for Darkroom results.
pub type Result<T> = std::result::Result<T, DarkroomError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
