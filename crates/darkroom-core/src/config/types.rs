//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Number of photos processed concurrently
    pub parallel_workers: usize,

    /// Source file extension (matched case-insensitively, no leading dot)
    pub extension: String,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            parallel_workers: default_parallel_workers(),
            extension: "jpg".to_string(),
        }
    }
}

/// Half of the available hardware concurrency, at least one.
pub fn default_parallel_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// Encoded output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JPEG quality for every variant (1-100)
    pub quality: u8,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { quality: 85 }
    }
}

/// Capture-time interpretation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    /// Offset attached to EXIF timestamps, which carry no zone (`+HH:MM`)
    pub default_utc_offset: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            default_utc_offset: "+08:00".to_string(),
        }
    }
}

/// Directory and file names inside the assets directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Source photos, relative to the assets directory
    pub source_dir: String,

    /// Root of the generated tree, relative to the assets directory
    pub generated_dir: String,

    /// Manifest file name inside the generated tree
    pub manifest_name: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            source_dir: "source".to_string(),
            generated_dir: "_generated".to_string(),
            manifest_name: "metas.json".to_string(),
        }
    }
}

/// Resource limits to protect against problematic inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum file size in megabytes
    pub max_file_size_mb: u64,

    /// Maximum image dimension (width or height)
    pub max_image_dimension: u32,

    /// Per-photo processing timeout in milliseconds. Unset means no timeout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo_timeout_ms: Option<u64>,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: 100,
            max_image_dimension: 20000,
            photo_timeout_ms: None,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Box a bounded variant is scaled down to fit in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// One named rendition in the variant table.
///
/// An entry without `bounds` is the full-resolution oriented image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantSpec {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<BoundingBox>,
}

impl VariantSpec {
    pub fn bounded(name: &str, width: u32, height: u32) -> Self {
        Self {
            name: name.to_string(),
            bounds: Some(BoundingBox::new(width, height)),
        }
    }

    pub fn original(name: &str) -> Self {
        Self {
            name: name.to_string(),
            bounds: None,
        }
    }
}

/// The stock variant table: `xs` (10x10), `s` (800x800), `ori` (full size).
///
/// Larger tiers such as `m` (1600) and `l` (2400) are added through the
/// `[[variants]]` table in the config file.
pub fn default_variants() -> Vec<VariantSpec> {
    vec![
        VariantSpec::bounded("xs", 10, 10),
        VariantSpec::bounded("s", 800, 800),
        VariantSpec::original("ori"),
    ]
}
