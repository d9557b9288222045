//! JPEG fixtures built in memory, with optional EXIF segments.

use exif::experimental::Writer;
use exif::{Field, In, Tag, Value};
use image::codecs::jpeg::JpegEncoder;
use image::{Rgb, RgbImage};
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// A horizontal/vertical gradient so resized variants have real content.
pub fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([
            (x * 255 / width.max(1)) as u8,
            (y * 255 / height.max(1)) as u8,
            128,
        ])
    })
}

/// A plain JPEG without EXIF.
pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let mut buffer = Vec::new();
    JpegEncoder::new_with_quality(&mut buffer, 90)
        .encode_image(&gradient(width, height))
        .unwrap();
    buffer
}

/// A TIFF-structured EXIF block with a camera make and the given tags.
pub fn exif_block(datetime: Option<&str>, orientation: Option<u16>) -> Vec<u8> {
    let mut fields = vec![Field {
        tag: Tag::Make,
        ifd_num: In::PRIMARY,
        value: Value::Ascii(vec![b"TestCam".to_vec()]),
    }];
    if let Some(datetime) = datetime {
        fields.push(Field {
            tag: Tag::DateTime,
            ifd_num: In::PRIMARY,
            value: Value::Ascii(vec![datetime.as_bytes().to_vec()]),
        });
    }
    if let Some(orientation) = orientation {
        fields.push(Field {
            tag: Tag::Orientation,
            ifd_num: In::PRIMARY,
            value: Value::Short(vec![orientation]),
        });
    }

    let mut writer = Writer::new();
    for field in &fields {
        writer.push_field(field);
    }
    let mut buffer = Cursor::new(Vec::new());
    writer.write(&mut buffer, false).unwrap();
    buffer.into_inner()
}

/// A JPEG with an APP1 EXIF segment right after SOI.
pub fn jpeg_with_exif(
    width: u32,
    height: u32,
    datetime: Option<&str>,
    orientation: Option<u16>,
) -> Vec<u8> {
    let plain = jpeg(width, height);
    let tiff = exif_block(datetime, orientation);
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut out = Vec::with_capacity(plain.len() + tiff.len() + 10);
    out.extend_from_slice(&plain[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    out.extend_from_slice(&segment_len.to_be_bytes());
    out.extend_from_slice(b"Exif\0\0");
    out.extend_from_slice(&tiff);
    out.extend_from_slice(&plain[2..]);
    out
}

/// Write fixture bytes into `dir` and return the path.
pub fn write(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}
