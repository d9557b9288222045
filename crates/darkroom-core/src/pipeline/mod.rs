//! Image derivative pipeline components.
//!
//! This module contains all the stages a source photo goes through:
//! - **discovery**: Find source photos in a flat directory
//! - **validate**: Size and signature checks before decoding
//! - **codec**: JPEG decode, orientation correction, JPEG encode
//! - **metadata**: EXIF capture time and orientation
//! - **variants**: Bounded-box resizing per configured variant
//! - **hash**: Content hashes for change detection
//! - **writer**: Hash-gated idempotent writes
//! - **processor**: Orchestrates one photo end to end
//! - **batch**: Bounded worker pool and manifest output

pub mod batch;
pub mod codec;
pub mod discovery;
pub mod hash;
pub mod metadata;
pub mod processor;
pub mod validate;
pub mod variants;
pub mod writer;

// Re-exports for convenient access
pub use batch::BatchDriver;
pub use discovery::{DiscoveredFile, FileDiscovery};
pub use hash::Hasher;
pub use metadata::{CaptureInfo, MetadataExtractor, Rotation};
pub use processor::{CommitGate, EncodedVariant, PhotoProcessor};
pub use validate::Validator;
pub use variants::{Variant, VariantGenerator};
pub use writer::IdempotentWriter;
