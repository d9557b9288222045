//! Configuration validation with range checks.

use std::collections::HashSet;

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.processing.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "processing.parallel_workers must be > 0".into(),
            ));
        }
        if self.processing.extension.is_empty() || self.processing.extension.starts_with('.') {
            return Err(ConfigError::ValidationError(
                "processing.extension must be non-empty and have no leading dot".into(),
            ));
        }
        if !(1..=100).contains(&self.output.quality) {
            return Err(ConfigError::ValidationError(
                "output.quality must be between 1 and 100".into(),
            ));
        }
        self.utc_offset()?;
        if self.limits.max_file_size_mb == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.limits.max_image_dimension == 0 {
            return Err(ConfigError::ValidationError(
                "limits.max_image_dimension must be > 0".into(),
            ));
        }
        if self.limits.photo_timeout_ms == Some(0) {
            return Err(ConfigError::ValidationError(
                "limits.photo_timeout_ms must be > 0 when set".into(),
            ));
        }
        for name in [
            &self.layout.source_dir,
            &self.layout.generated_dir,
            &self.layout.manifest_name,
        ] {
            if name.is_empty() {
                return Err(ConfigError::ValidationError(
                    "layout names must be non-empty".into(),
                ));
            }
        }
        self.validate_variants()
    }

    fn validate_variants(&self) -> Result<(), ConfigError> {
        if self.variants.is_empty() {
            return Err(ConfigError::ValidationError(
                "at least one variant must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for variant in &self.variants {
            let name = variant.name.as_str();
            if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
                return Err(ConfigError::ValidationError(format!(
                    "variant name {name:?} must be a single path component"
                )));
            }
            if name == self.layout.manifest_name {
                return Err(ConfigError::ValidationError(format!(
                    "variant name {name:?} collides with the manifest file"
                )));
            }
            if !seen.insert(name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate variant name {name:?}"
                )));
            }
            if let Some(bounds) = variant.bounds {
                if bounds.width == 0 || bounds.height == 0 {
                    return Err(ConfigError::ValidationError(format!(
                        "variant {name:?} bounds must be > 0"
                    )));
                }
            }
        }
        Ok(())
    }
}
