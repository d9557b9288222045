//! Darkroom Core - batch derivative generation for photo galleries.
//!
//! Darkroom reads a flat directory of JPEG photos, writes a set of resized
//! renditions for each one, and emits a JSON manifest ordered by capture time.
//!
//! # Architecture
//!
//! ```text
//! source/*.jpg → Decode → EXIF (time, orientation) → Orient → Variants → Encode
//!              → Hash-gated write → _generated/<variant>/<name>
//!                                 → _generated/metas.json
//! ```
//!
//! Photos without a usable capture time are skipped entirely. Re-running on
//! unchanged input rewrites nothing but the manifest.
//!
//! # Usage
//!
//! ```rust,ignore
//! use darkroom_core::{AssetLayout, BatchDriver, Config};
//!
//! #[tokio::main]
//! async fn main() -> darkroom_core::Result<()> {
//!     let config = Config::load()?;
//!     let layout = AssetLayout::resolve("assets".as_ref(), &config.layout);
//!     let driver = BatchDriver::new(config)?;
//!
//!     let summary = driver.run(&layout.source_dir, &layout.generated_dir).await?;
//!     println!("{} photos in manifest", summary.processed);
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod types;

#[cfg(test)]
mod test_fixtures;

// Re-exports for convenient access
pub use config::{AssetLayout, BoundingBox, Config, VariantSpec};
pub use error::{ConfigError, DarkroomError, PipelineError, PipelineResult, Result};
pub use manifest::Manifest;
pub use pipeline::{BatchDriver, PhotoProcessor};
pub use types::{BatchSummary, PhotoMetadata, PhotoOutcome, SkipReason, WriteOutcome};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
