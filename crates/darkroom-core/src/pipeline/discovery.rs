//! Source file discovery: one flat directory, one extension.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ProcessingConfig;
use crate::error::PipelineError;

/// Finds source photos directly inside a directory.
pub struct FileDiscovery {
    config: ProcessingConfig,
}

/// Information about a discovered file.
#[derive(Debug, Clone)]
pub struct DiscoveredFile {
    /// Full path to the file
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
}

impl FileDiscovery {
    /// Create a new file discovery instance.
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    /// List the supported files in `dir`, without descending into subdirectories.
    ///
    /// The result is sorted by path. A missing directory is an error rather
    /// than an empty batch.
    pub fn discover(&self, dir: &Path) -> Result<Vec<DiscoveredFile>, PipelineError> {
        if !dir.is_dir() {
            return Err(PipelineError::FileNotFound(dir.to_path_buf()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            let entry_path = entry.path();
            if entry.file_type().is_file() && self.is_supported(entry_path) {
                if let Ok(meta) = entry.metadata() {
                    files.push(DiscoveredFile {
                        path: entry_path.to_path_buf(),
                        size: meta.len(),
                    });
                }
            }
        }

        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }

    /// Check if a file has the configured extension (case-insensitive).
    fn is_supported(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.config.extension))
            .unwrap_or(false)
    }

    /// Get total size of all discovered files.
    pub fn total_size(files: &[DiscoveredFile]) -> u64 {
        files.iter().map(|f| f.size).sum()
    }
}
