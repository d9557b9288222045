//! The metadata manifest: every processed photo, sorted by capture time.
//!
//! The manifest is rebuilt from scratch on each run and replaces whatever was
//! on disk before; entries from earlier runs are never merged in.

use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::PipelineError;
use crate::types::PhotoMetadata;

/// Sorted list of photo records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<PhotoMetadata>,
}

impl Manifest {
    /// Build a manifest from per-photo results in any order.
    ///
    /// Entries are sorted by `time`, then `name`. Times share one offset and a
    /// fixed width, so string order is chronological order; the name
    /// tie-break keeps the output independent of completion order.
    pub fn from_records(mut entries: Vec<PhotoMetadata>) -> Self {
        entries.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.name.cmp(&b.name)));
        Self { entries }
    }

    pub fn entries(&self) -> &[PhotoMetadata] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the manifest as a JSON array, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), PipelineError> {
        let write_err = |source: std::io::Error| PipelineError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_err)?;
        }
        let file = std::fs::File::create(path).map_err(write_err)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.entries)
            .map_err(|e| write_err(std::io::Error::other(e)))?;
        writer.flush().map_err(write_err)?;
        Ok(())
    }

    /// Read a manifest previously written by [`Manifest::write_to`].
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let entries: Vec<PhotoMetadata> = serde_json::from_str(&content)?;
        Ok(Self::from_records(entries))
    }
}
