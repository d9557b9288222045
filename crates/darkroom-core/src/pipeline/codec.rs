//! Image codec: JPEG decode, rotation, and JPEG encode at a fixed quality.
//!
//! All functions here are synchronous and CPU-bound; the batch driver runs
//! them on the blocking pool.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use crate::error::PipelineError;

use super::metadata::Rotation;

/// Decode a JPEG from an in-memory byte buffer.
///
/// The format is detected from content, not the extension; anything that is
/// not a JPEG is rejected as unsupported.
pub fn decode(bytes: &[u8], path: &Path) -> Result<DynamicImage, PipelineError> {
    let reader = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| PipelineError::Decode {
            path: path.to_path_buf(),
            message: format!("Cannot detect image format: {}", e),
        })?;

    match reader.format() {
        Some(ImageFormat::Jpeg) => {}
        Some(other) => {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: format!("{:?}", other).to_lowercase(),
            })
        }
        None => {
            return Err(PipelineError::UnsupportedFormat {
                path: path.to_path_buf(),
                format: "unknown".to_string(),
            })
        }
    }

    reader.decode().map_err(|e| PipelineError::Decode {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Apply an orientation correction, expanding the canvas for quarter turns.
pub fn orient(image: DynamicImage, rotation: Rotation) -> DynamicImage {
    match rotation {
        Rotation::None => image,
        Rotation::Clockwise90 => image.rotate90(),
        Rotation::Clockwise180 => image.rotate180(),
        Rotation::Clockwise270 => image.rotate270(),
    }
}

/// Encode an image as baseline JPEG at `quality` (1-100).
///
/// JPEG has no alpha or 16-bit support, so other pixel layouts are converted
/// to 8-bit RGB first.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, image::ImageError> {
    let encodable: Cow<'_, DynamicImage> = match image {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => Cow::Borrowed(image),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    };

    let mut buffer = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encodable.write_with_encoder(encoder)?;
    Ok(buffer)
}

/// Displayed dimensions as `(width, height)`.
pub fn dimensions(image: &DynamicImage) -> (u32, u32) {
    image.dimensions()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures;

    #[test]
    fn test_decode_jpeg() {
        let bytes = test_fixtures::jpeg(40, 20);
        let image = decode(&bytes, Path::new("a.jpg")).unwrap();
        assert_eq!(dimensions(&image), (40, 20));
    }

    #[test]
    fn test_png_renamed_to_jpg_is_unsupported() {
        let mut png = Vec::new();
        DynamicImage::new_rgb8(8, 8)
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let err = decode(&png, Path::new("misnamed.jpg")).unwrap_err();
        assert!(matches!(err, PipelineError::UnsupportedFormat { .. }));
    }

    #[test]
    fn test_truncated_jpeg_fails_to_decode() {
        let bytes = test_fixtures::jpeg(64, 64);
        let truncated = &bytes[..20];
        assert!(decode(truncated, Path::new("cut.jpg")).is_err());
    }

    #[test]
    fn test_orient_quarter_turn_swaps_dimensions() {
        let image = DynamicImage::new_rgb8(40, 20);
        assert_eq!(dimensions(&orient(image.clone(), Rotation::Clockwise90)), (20, 40));
        assert_eq!(dimensions(&orient(image.clone(), Rotation::Clockwise270)), (20, 40));
        assert_eq!(dimensions(&orient(image.clone(), Rotation::Clockwise180)), (40, 20));
        assert_eq!(dimensions(&orient(image, Rotation::None)), (40, 20));
    }

    #[test]
    fn test_encode_is_deterministic() {
        let image = DynamicImage::ImageRgb8(test_fixtures::gradient(32, 16));
        let a = encode_jpeg(&image, 85).unwrap();
        let b = encode_jpeg(&image, 85).unwrap();
        assert_eq!(a, b);
        assert_eq!(&a[0..3], &[0xFF, 0xD8, 0xFF]);
    }

    #[test]
    fn test_encode_converts_rgba() {
        let image = DynamicImage::new_rgba8(16, 16);
        let bytes = encode_jpeg(&image, 85).unwrap();
        let decoded = decode(&bytes, Path::new("rgba.jpg")).unwrap();
        assert_eq!(dimensions(&decoded), (16, 16));
    }
}
