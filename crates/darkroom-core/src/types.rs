//! Core data types for the Darkroom pipeline.
//!
//! These types describe what processing one photo produced and what a whole
//! batch run did.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Metadata for one successfully processed photo.
///
/// Serialized in the manifest as `{"hw": [height, width], "time": ..., "name": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "ManifestEntry", from = "ManifestEntry")]
pub struct PhotoMetadata {
    /// Displayed height, after orientation
    pub height: u32,

    /// Displayed width, after orientation
    pub width: u32,

    /// Capture time, ISO 8601 with offset (e.g. `2023-05-01T10:00:00+08:00`)
    pub time: String,

    /// Source file base name
    pub name: String,
}

/// Wire shape of a manifest entry.
#[derive(Serialize, Deserialize)]
struct ManifestEntry {
    hw: [u32; 2],
    time: String,
    name: String,
}

impl From<PhotoMetadata> for ManifestEntry {
    fn from(meta: PhotoMetadata) -> Self {
        Self {
            hw: [meta.height, meta.width],
            time: meta.time,
            name: meta.name,
        }
    }
}

impl From<ManifestEntry> for PhotoMetadata {
    fn from(entry: ManifestEntry) -> Self {
        let [height, width] = entry.hw;
        Self {
            height,
            width,
            time: entry.time,
            name: entry.name,
        }
    }
}

/// What the idempotent writer did with one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The file was created or its content replaced
    Written,
    /// The file already held identical bytes and was left untouched
    Unchanged,
}

/// Why a photo was left out of the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No capture-time tag in the embedded tag set
    MissingTimestamp,
    /// The capture-time tag could not be parsed
    InvalidTimestamp(String),
    /// The file could not be read, validated or decoded
    Unreadable(String),
    /// A variant could not be encoded
    EncodeFailed(String),
    /// Processing exceeded the per-photo timeout
    TimedOut,
    /// The worker panicked
    Panicked(String),
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::MissingTimestamp => write!(f, "time not found in EXIF"),
            SkipReason::InvalidTimestamp(value) => write!(f, "invalid EXIF time {value:?}"),
            SkipReason::Unreadable(msg) => write!(f, "unreadable: {msg}"),
            SkipReason::EncodeFailed(msg) => write!(f, "encode failed: {msg}"),
            SkipReason::TimedOut => write!(f, "timed out"),
            SkipReason::Panicked(msg) => write!(f, "worker panicked: {msg}"),
        }
    }
}

/// Result of running one photo through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoOutcome {
    /// All variants are on disk
    Done {
        metadata: PhotoMetadata,
        /// Variants created or replaced
        written: usize,
        /// Variants whose content was already current
        unchanged: usize,
    },
    /// The photo was skipped; nothing was written for it
    Skipped(SkipReason),
}

impl PhotoOutcome {
    /// The manifest record, if the photo made it through.
    pub fn into_metadata(self) -> Option<PhotoMetadata> {
        match self {
            PhotoOutcome::Done { metadata, .. } => Some(metadata),
            PhotoOutcome::Skipped(_) => None,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, PhotoOutcome::Done { .. })
    }
}

/// Statistics for one batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    /// Source files found
    pub discovered: usize,

    /// Photos written to the manifest
    pub processed: usize,

    /// Photos skipped for any reason (including timeouts)
    pub skipped: usize,

    /// Photos skipped because they timed out
    pub timed_out: usize,

    /// Variant files created or replaced
    pub variants_written: usize,

    /// Variant files left untouched because their content was current
    pub variants_unchanged: usize,

    /// Where the manifest was written
    pub manifest_path: PathBuf,

    /// Wall-clock time of the run
    pub elapsed: Duration,
}

impl BatchSummary {
    /// Photos per second over the whole run.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.discovered as f64 / secs
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PhotoMetadata {
        PhotoMetadata {
            height: 600,
            width: 800,
            time: "2023-05-01T10:00:00+08:00".to_string(),
            name: "a.jpg".to_string(),
        }
    }

    #[test]
    fn test_metadata_wire_shape() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "hw": [600, 800],
                "time": "2023-05-01T10:00:00+08:00",
                "name": "a.jpg"
            })
        );
    }

    #[test]
    fn test_metadata_reads_hw_as_height_width() {
        let meta: PhotoMetadata = serde_json::from_str(
            r#"{"hw":[3,4],"time":"2023-05-02T09:00:00+08:00","name":"b.jpg"}"#,
        )
        .unwrap();
        assert_eq!(meta.height, 3);
        assert_eq!(meta.width, 4);
    }

    #[test]
    fn test_outcome_into_metadata() {
        let done = PhotoOutcome::Done {
            metadata: sample(),
            written: 3,
            unchanged: 0,
        };
        assert!(done.is_done());
        assert_eq!(done.into_metadata(), Some(sample()));

        let skipped = PhotoOutcome::Skipped(SkipReason::MissingTimestamp);
        assert!(skipped.into_metadata().is_none());
    }

    #[test]
    fn test_summary_rate_with_zero_elapsed() {
        let summary = BatchSummary::default();
        assert_eq!(summary.rate(), 0.0);
    }
}
