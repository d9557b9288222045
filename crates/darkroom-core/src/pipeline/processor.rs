//! Per-photo orchestration: decode, extract, orient, resize, encode, write.

use exif::Exif;
use image::DynamicImage;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use crate::config::Config;
use crate::error::{ConfigError, PipelineError, PipelineResult};
use crate::types::{PhotoMetadata, PhotoOutcome, SkipReason, WriteOutcome};

use super::codec;
use super::metadata::MetadataExtractor;
use super::validate::Validator;
use super::variants::VariantGenerator;
use super::writer::IdempotentWriter;

/// One encoded rendition on its way to disk.
pub struct EncodedVariant {
    pub variant_name: String,
    pub bytes: Vec<u8>,
    pub destination: PathBuf,
}

/// Decides, exactly once, whether a photo's writes go ahead or it is abandoned.
///
/// The worker [`commit`](Self::commit)s before its first write; the batch
/// driver [`abandon`](Self::abandon)s on timeout. Whichever runs first wins,
/// so an abandoned photo never touches the destination tree and a committed
/// one always finishes its writes.
#[derive(Debug, Default)]
pub struct CommitGate {
    state: AtomicU8,
}

impl CommitGate {
    const OPEN: u8 = 0;
    const COMMITTED: u8 = 1;
    const ABANDONED: u8 = 2;

    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the right to write. Returns false if the photo was abandoned.
    pub fn commit(&self) -> bool {
        self.transition(Self::COMMITTED)
    }

    /// Abandon the photo. Returns false if its writes have already begun.
    pub fn abandon(&self) -> bool {
        self.transition(Self::ABANDONED)
    }

    pub fn is_abandoned(&self) -> bool {
        self.state.load(Ordering::Acquire) == Self::ABANDONED
    }

    fn transition(&self, to: u8) -> bool {
        self.state
            .compare_exchange(Self::OPEN, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Runs one source photo through the whole pipeline.
///
/// Holds only read-only state, so a single instance is shared by all workers.
pub struct PhotoProcessor {
    validator: Validator,
    extractor: MetadataExtractor,
    generator: VariantGenerator,
    quality: u8,
    dest_root: PathBuf,
}

impl PhotoProcessor {
    /// Create a processor writing variants under `dest_root`.
    pub fn new(config: &Config, dest_root: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            validator: Validator::new(config.limits.clone()),
            extractor: MetadataExtractor::new(config.utc_offset()?),
            generator: VariantGenerator::new(config.variants.clone()),
            quality: config.output.quality,
            dest_root: dest_root.into(),
        })
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Where a variant of a source file lands: `<dest_root>/<variant>/<name>`.
    pub fn destination(&self, variant: &str, file_name: &str) -> PathBuf {
        self.dest_root.join(variant).join(file_name)
    }

    /// Process a single photo.
    ///
    /// Input defects (unreadable file, missing or malformed capture time,
    /// failed encode) are logged and reported as [`PhotoOutcome::Skipped`]
    /// with nothing written. Only write failures are returned as errors.
    pub fn process(&self, path: &Path) -> PipelineResult<PhotoOutcome> {
        self.process_gated(path, &CommitGate::new())
    }

    /// Like [`PhotoProcessor::process`], giving up at the next stage boundary
    /// once `gate` is abandoned.
    ///
    /// An abandoned photo returns `Skipped(TimedOut)` and writes nothing.
    pub fn process_gated(&self, path: &Path, gate: &CommitGate) -> PipelineResult<PhotoOutcome> {
        let start = Instant::now();
        tracing::debug!("Processing: {:?}", path);

        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Self::skip(
                path,
                PipelineError::Decode {
                    path: path.to_path_buf(),
                    message: "file name is not valid UTF-8".to_string(),
                },
            ));
        };

        let (image, tags) = match self.load(path) {
            Ok(loaded) => loaded,
            Err(e) => return Ok(Self::skip(path, e)),
        };
        tracing::trace!("  Decode: {:?}", start.elapsed());
        if gate.is_abandoned() {
            return Ok(Self::abandoned(path));
        }

        let capture = match self.extractor.extract(tags.as_ref(), path) {
            Ok(capture) => capture,
            Err(e) => return Ok(Self::skip(path, e)),
        };

        if capture.rotation.swaps_dimensions() {
            tracing::trace!(
                "  Orient: {} degrees counterclockwise, width and height swap",
                capture.rotation.counterclockwise_degrees()
            );
        }
        let oriented = codec::orient(image, capture.rotation);
        let (width, height) = codec::dimensions(&oriented);

        let encode_start = Instant::now();
        let mut encoded = Vec::with_capacity(self.generator.specs().len());
        for variant in self.generator.generate(&oriented) {
            if gate.is_abandoned() {
                return Ok(Self::abandoned(path));
            }
            let bytes = match codec::encode_jpeg(&variant.image, self.quality) {
                Ok(bytes) => bytes,
                Err(e) => {
                    return Ok(Self::skip(
                        path,
                        PipelineError::Encode {
                            path: path.to_path_buf(),
                            variant: variant.name.to_string(),
                            message: e.to_string(),
                        },
                    ))
                }
            };
            encoded.push(EncodedVariant {
                variant_name: variant.name.to_string(),
                bytes,
                destination: self.destination(variant.name, file_name),
            });
        }
        tracing::trace!("  Resize + encode: {:?}", encode_start.elapsed());

        if !gate.commit() {
            return Ok(Self::abandoned(path));
        }

        let mut written = 0;
        let mut unchanged = 0;
        for variant in &encoded {
            let outcome =
                IdempotentWriter::write(&variant.destination, &variant.bytes, &capture.time)?;
            tracing::trace!("  {}: {:?}", variant.variant_name, outcome);
            match outcome {
                WriteOutcome::Written => written += 1,
                WriteOutcome::Unchanged => unchanged += 1,
            }
        }

        tracing::debug!(
            "Processed {:?} in {:?} ({}x{}, {} written, {} unchanged)",
            file_name,
            start.elapsed(),
            width,
            height,
            written,
            unchanged
        );

        Ok(PhotoOutcome::Done {
            metadata: PhotoMetadata {
                height,
                width,
                time: capture.time,
                name: file_name.to_string(),
            },
            written,
            unchanged,
        })
    }

    /// Read, validate and decode a source file, keeping its EXIF tags.
    fn load(&self, path: &Path) -> PipelineResult<(DynamicImage, Option<Exif>)> {
        self.validator.validate_file(path)?;
        let bytes = std::fs::read(path).map_err(|source| PipelineError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.validator.validate_header(&bytes, path)?;

        let tags = MetadataExtractor::read_tags(&bytes);
        let image = codec::decode(&bytes, path)?;
        let (width, height) = codec::dimensions(&image);
        self.validator.validate_dimensions(width, height, path)?;

        Ok((image, tags))
    }

    fn abandoned(path: &Path) -> PhotoOutcome {
        tracing::debug!("Abandoned {:?} before writing", path);
        PhotoOutcome::Skipped(SkipReason::TimedOut)
    }

    /// Log a per-photo defect and turn it into a skip.
    fn skip(path: &Path, error: PipelineError) -> PhotoOutcome {
        let message = error.to_string();
        tracing::error!("{} SKIPPED: {}", path.display(), message);
        let reason = match error {
            PipelineError::MissingTimestamp(_) => SkipReason::MissingTimestamp,
            PipelineError::InvalidTimestamp { value, .. } => SkipReason::InvalidTimestamp(value),
            PipelineError::Encode { .. } => SkipReason::EncodeFailed(message),
            _ => SkipReason::Unreadable(message),
        };
        PhotoOutcome::Skipped(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    fn processor(dest_root: &Path) -> PhotoProcessor {
        PhotoProcessor::new(&Config::default(), dest_root).unwrap()
    }

    fn variant_files(dest_root: &Path) -> Vec<PathBuf> {
        ["xs", "s", "ori"]
            .iter()
            .map(|v| dest_root.join(v))
            .filter(|d| d.is_dir())
            .flat_map(|d| std::fs::read_dir(d).unwrap().map(|e| e.unwrap().path()))
            .collect()
    }

    #[test]
    fn test_process_writes_every_variant() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(
            &dir.path().join("source"),
            "a.jpg",
            &test_fixtures::jpeg_with_exif(1000, 500, Some("2023:05:01 10:00:00"), None),
        );
        let dest = dir.path().join("_generated");

        let outcome = processor(&dest).process(&source).unwrap();
        assert_eq!(
            outcome,
            PhotoOutcome::Done {
                metadata: PhotoMetadata {
                    height: 500,
                    width: 1000,
                    time: "2023-05-01T10:00:00+08:00".to_string(),
                    name: "a.jpg".to_string(),
                },
                written: 3,
                unchanged: 0,
            }
        );

        let s = image::open(dest.join("s").join("a.jpg")).unwrap();
        assert_eq!((s.width(), s.height()), (800, 400));
        let xs = image::open(dest.join("xs").join("a.jpg")).unwrap();
        assert_eq!((xs.width(), xs.height()), (10, 5));
        let ori = image::open(dest.join("ori").join("a.jpg")).unwrap();
        assert_eq!((ori.width(), ori.height()), (1000, 500));
    }

    #[test]
    fn test_orientation_six_reports_displayed_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(
            dir.path(),
            "rotated.jpg",
            &test_fixtures::jpeg_with_exif(60, 20, Some("2023:05:01 10:00:00"), Some(6)),
        );
        let dest = dir.path().join("_generated");

        let metadata = processor(&dest)
            .process(&source)
            .unwrap()
            .into_metadata()
            .unwrap();
        assert_eq!((metadata.width, metadata.height), (20, 60));

        let ori = image::open(dest.join("ori").join("rotated.jpg")).unwrap();
        assert_eq!((ori.width(), ori.height()), (20, 60));
    }

    #[test]
    fn test_missing_timestamp_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(
            dir.path(),
            "untagged.jpg",
            &test_fixtures::jpeg_with_exif(40, 40, None, Some(1)),
        );
        let dest = dir.path().join("_generated");

        let outcome = processor(&dest).process(&source).unwrap();
        assert_eq!(outcome, PhotoOutcome::Skipped(SkipReason::MissingTimestamp));
        assert!(variant_files(&dest).is_empty());
    }

    #[test]
    fn test_no_exif_at_all_is_missing_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(dir.path(), "plain.jpg", &test_fixtures::jpeg(40, 40));
        let dest = dir.path().join("_generated");

        let outcome = processor(&dest).process(&source).unwrap();
        assert_eq!(outcome, PhotoOutcome::Skipped(SkipReason::MissingTimestamp));
    }

    #[test]
    fn test_corrupt_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(dir.path(), "broken.jpg", b"definitely not a jpeg");
        let dest = dir.path().join("_generated");

        let outcome = processor(&dest).process(&source).unwrap();
        assert!(matches!(
            outcome,
            PhotoOutcome::Skipped(SkipReason::Unreadable(_))
        ));
        assert!(variant_files(&dest).is_empty());
    }

    #[test]
    fn test_second_run_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(
            dir.path(),
            "a.jpg",
            &test_fixtures::jpeg_with_exif(120, 80, Some("2023:05:01 10:00:00"), None),
        );
        let dest = dir.path().join("_generated");
        let processor = processor(&dest);

        processor.process(&source).unwrap();
        let second = processor.process(&source).unwrap();
        assert!(matches!(
            second,
            PhotoOutcome::Done {
                written: 0,
                unchanged: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_abandoned_photo_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(
            dir.path(),
            "late.jpg",
            &test_fixtures::jpeg_with_exif(120, 80, Some("2023:05:01 10:00:00"), None),
        );
        let dest = dir.path().join("_generated");

        let gate = CommitGate::new();
        assert!(gate.abandon());
        let outcome = processor(&dest).process_gated(&source, &gate).unwrap();
        assert_eq!(outcome, PhotoOutcome::Skipped(SkipReason::TimedOut));
        assert!(variant_files(&dest).is_empty());
    }

    #[test]
    fn test_completed_photo_commits_gate() {
        let dir = tempfile::tempdir().unwrap();
        let source = test_fixtures::write(
            dir.path(),
            "a.jpg",
            &test_fixtures::jpeg_with_exif(40, 30, Some("2023:05:01 10:00:00"), None),
        );
        let gate = CommitGate::new();
        let outcome = processor(&dir.path().join("_generated"))
            .process_gated(&source, &gate)
            .unwrap();
        assert!(outcome.is_done());
        assert!(!gate.abandon());
    }

    #[test]
    fn test_gate_decides_once() {
        let committed = CommitGate::new();
        assert!(committed.commit());
        assert!(!committed.abandon());
        assert!(!committed.is_abandoned());

        let abandoned = CommitGate::new();
        assert!(abandoned.abandon());
        assert!(!abandoned.commit());
        assert!(abandoned.is_abandoned());
    }

    #[test]
    fn test_destination_layout() {
        let processor = processor(Path::new("/assets/_generated"));
        assert_eq!(
            processor.destination("xs", "a.jpg"),
            PathBuf::from("/assets/_generated/xs/a.jpg")
        );
    }
}
