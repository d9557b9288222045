//! EXIF capture-time and orientation extraction.

use chrono::{FixedOffset, NaiveDateTime, SecondsFormat, TimeZone};
use exif::{Exif, In, Reader, Tag, Value};
use std::io::Cursor;
use std::path::Path;

use crate::error::PipelineError;

/// EXIF capture time layout (`YYYY:MM:DD HH:MM:SS`, no zone).
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Rotation that brings a stored image to its displayed orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    #[default]
    None,
    Clockwise90,
    Clockwise180,
    Clockwise270,
}

impl Rotation {
    /// Classify an EXIF orientation value (tag `0x0112`).
    ///
    /// Only the pure rotations are honored: 3 turns 180°, 6 turns 270°
    /// counterclockwise and 8 turns 90° counterclockwise. Mirrored and
    /// unknown values are left as stored.
    pub fn from_orientation(value: u32) -> Self {
        match value {
            3 => Rotation::Clockwise180,
            6 => Rotation::Clockwise90,
            8 => Rotation::Clockwise270,
            _ => Rotation::None,
        }
    }

    /// Counterclockwise angle in degrees.
    pub fn counterclockwise_degrees(self) -> u16 {
        match self {
            Rotation::None => 0,
            Rotation::Clockwise90 => 270,
            Rotation::Clockwise180 => 180,
            Rotation::Clockwise270 => 90,
        }
    }

    /// Whether width and height trade places.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Rotation::Clockwise90 | Rotation::Clockwise270)
    }
}

/// What the embedded tag set says about a capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureInfo {
    /// ISO 8601 capture time with offset
    pub time: String,
    /// Orientation correction to apply before measuring or resizing
    pub rotation: Rotation,
}

/// Extracts capture metadata from embedded EXIF tags.
#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    default_offset: FixedOffset,
}

impl MetadataExtractor {
    /// `default_offset` is attached to timestamps, which EXIF stores without a zone.
    pub fn new(default_offset: FixedOffset) -> Self {
        Self { default_offset }
    }

    /// Parse the EXIF block out of a JPEG's bytes.
    ///
    /// Returns `None` if the file has no EXIF segment or it is unreadable.
    pub fn read_tags(bytes: &[u8]) -> Option<Exif> {
        Reader::new()
            .read_from_container(&mut Cursor::new(bytes))
            .ok()
    }

    /// Capture time and rotation from a tag set.
    ///
    /// Fails with `MissingTimestamp` when there are no tags or no `DateTime`
    /// (`0x0132`) tag, and `InvalidTimestamp` when it does not parse.
    pub fn extract(&self, tags: Option<&Exif>, path: &Path) -> Result<CaptureInfo, PipelineError> {
        let raw = tags
            .and_then(|exif| Self::get_ascii(exif, Tag::DateTime))
            .ok_or_else(|| PipelineError::MissingTimestamp(path.to_path_buf()))?;

        let time = self
            .parse_time(&raw)
            .ok_or_else(|| PipelineError::InvalidTimestamp {
                path: path.to_path_buf(),
                value: raw.clone(),
            })?;

        let rotation = tags
            .and_then(|exif| Self::get_u32(exif, Tag::Orientation))
            .map(Rotation::from_orientation)
            .unwrap_or_default();

        Ok(CaptureInfo { time, rotation })
    }

    /// Render an EXIF timestamp as ISO 8601 in the default offset.
    pub fn parse_time(&self, raw: &str) -> Option<String> {
        let naive = NaiveDateTime::parse_from_str(raw.trim(), EXIF_DATETIME_FORMAT).ok()?;
        let local = self.default_offset.from_local_datetime(&naive).single()?;
        Some(local.to_rfc3339_opts(SecondsFormat::Secs, false))
    }

    /// Get an ASCII field as a trimmed string.
    fn get_ascii(exif: &Exif, tag: Tag) -> Option<String> {
        let field = exif.get_field(tag, In::PRIMARY)?;
        match &field.value {
            Value::Ascii(values) => values
                .first()
                .and_then(|v| std::str::from_utf8(v).ok())
                .map(|s| s.trim_end_matches('\0').trim().to_string())
                .filter(|s| !s.is_empty()),
            _ => None,
        }
    }

    /// Get a u32 field from EXIF data.
    fn get_u32(exif: &Exif, tag: Tag) -> Option<u32> {
        exif.get_field(tag, In::PRIMARY)
            .and_then(|f| match &f.value {
                Value::Short(v) => v.first().map(|&x| x as u32),
                Value::Long(v) => v.first().copied(),
                _ => None,
            })
    }
}
