//! Pixel dimensions read from image headers.
//!
//! Only the leading bytes of a file are inspected. For every format except
//! JPEG the dimensions sit at a fixed offset inside the first
//! [`MIN_HEADER_BYTES`] bytes; JPEG needs a marker scan that may run past
//! embedded EXIF or ICC segments, so a short prefix can come back truncated.

use crate::{ImageError, ImageFormat, Result, detect_format};
use serde::{Deserialize, Serialize};

/// Smallest prefix that sizes every fixed-offset format.
pub const MIN_HEADER_BYTES: usize = 32;

/// Image metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
}

impl ImageMetadata {
    /// Calculate aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }

    /// Check if image is landscape orientation.
    pub fn is_landscape(&self) -> bool {
        self.width > self.height
    }

    /// Check if image is portrait orientation.
    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    /// Check if image is square.
    pub fn is_square(&self) -> bool {
        self.width == self.height
    }
}

/// Read format and dimensions from the start of an image file.
///
/// # Errors
/// - [`ImageError::UnknownFormat`] when no signature matches
/// - [`ImageError::DimensionsUnsupported`] for formats whose size is not in
///   the header (TIFF, AVIF, HEIC)
/// - [`ImageError::InvalidData`] when the prefix is truncated or the header
///   is malformed
///
/// # Example
/// ```
/// use gfr_image::{read_dimensions, ImageFormat};
///
/// let gif = b"GIF89a\x80\x02\xe0\x01\x00\x00";
/// let meta = read_dimensions(gif).unwrap();
/// assert_eq!((meta.width, meta.height, meta.format), (640, 480, ImageFormat::Gif));
/// ```
pub fn read_dimensions(data: &[u8]) -> Result<ImageMetadata> {
    let format = detect_format(data)?;

    let (width, height) = match format {
        ImageFormat::Jpeg => jpeg_dimensions(data)?,
        ImageFormat::Png => png_dimensions(data)?,
        ImageFormat::Gif => gif_dimensions(data)?,
        ImageFormat::WebP => webp_dimensions(data)?,
        ImageFormat::Bmp => bmp_dimensions(data)?,
        ImageFormat::Tiff | ImageFormat::Avif | ImageFormat::Heic => {
            return Err(ImageError::DimensionsUnsupported(format.name()));
        }
    };

    if width == 0 || height == 0 {
        return Err(ImageError::InvalidData(format!(
            "{} header declares a {width}x{height} image",
            format.name()
        )));
    }

    Ok(ImageMetadata { width, height, format })
}

/// Extract metadata from image data, discarding the failure reason.
pub fn extract_metadata(data: &[u8]) -> Option<ImageMetadata> {
    read_dimensions(data).ok()
}

fn truncated(format: ImageFormat) -> ImageError {
    ImageError::InvalidData(format!("{} header truncated", format.name()))
}

fn be_u16(data: &[u8], at: usize) -> u32 {
    u32::from(u16::from_be_bytes([data[at], data[at + 1]]))
}

fn le_u16(data: &[u8], at: usize) -> u32 {
    u32::from(u16::from_le_bytes([data[at], data[at + 1]]))
}

fn le_u24(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], 0])
}

fn le_u32(data: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

/// Scan JPEG markers for the first start-of-frame segment.
fn jpeg_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    // Skip SOI marker
    let mut i = 2;

    while i + 1 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // Fill byte
        if marker == 0xFF {
            i += 1;
            continue;
        }

        // SOFn, excluding DHT (C4), JPG (C8) and DAC (CC)
        if matches!(marker, 0xC0..=0xC3 | 0xC5..=0xC7 | 0xC9..=0xCB | 0xCD..=0xCF) {
            if i + 9 > data.len() {
                break;
            }
            let height = be_u16(data, i + 5);
            let width = be_u16(data, i + 7);
            return Ok((width, height));
        }

        match marker {
            0xD8 | 0x01 | 0xD0..=0xD7 => i += 2,
            0xD9 | 0xDA => {
                return Err(ImageError::InvalidData(
                    "jpeg scan data reached before a frame header".into(),
                ));
            }
            _ => {
                if i + 3 >= data.len() {
                    break;
                }
                i += 2 + be_u16(data, i + 2) as usize;
            }
        }
    }

    Err(truncated(ImageFormat::Jpeg))
}

/// IHDR is always the first chunk: width and height at bytes 16..24.
fn png_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.len() < 24 {
        return Err(truncated(ImageFormat::Png));
    }

    if &data[12..16] != b"IHDR" {
        return Err(ImageError::InvalidData("png first chunk is not IHDR".into()));
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);

    Ok((width, height))
}

/// Logical screen descriptor follows the 6-byte signature.
fn gif_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.len() < 10 {
        return Err(truncated(ImageFormat::Gif));
    }

    Ok((le_u16(data, 6), le_u16(data, 8)))
}

fn webp_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.len() < 30 {
        return Err(truncated(ImageFormat::WebP));
    }

    match &data[12..16] {
        // Lossy: frame tag, start code 9D 01 2A, then 14-bit width/height
        b"VP8 " => {
            if data[23..26] != [0x9D, 0x01, 0x2A] {
                return Err(ImageError::InvalidData("webp VP8 start code missing".into()));
            }
            Ok((le_u16(data, 26) & 0x3FFF, le_u16(data, 28) & 0x3FFF))
        }
        // Lossless: signature byte, then width-1 and height-1 packed in 14 bits each
        b"VP8L" => {
            if data[20] != 0x2F {
                return Err(ImageError::InvalidData("webp VP8L signature missing".into()));
            }
            let bits = le_u32(data, 21);
            Ok(((bits & 0x3FFF) + 1, ((bits >> 14) & 0x3FFF) + 1))
        }
        // Extended: 24-bit canvas width-1 and height-1 after the flags
        b"VP8X" => Ok((le_u24(data, 24) + 1, le_u24(data, 27) + 1)),
        other => Err(ImageError::InvalidData(format!(
            "unknown webp chunk {:?}",
            String::from_utf8_lossy(other)
        ))),
    }
}

fn bmp_dimensions(data: &[u8]) -> Result<(u32, u32)> {
    if data.len() < 18 {
        return Err(truncated(ImageFormat::Bmp));
    }

    match le_u32(data, 14) {
        // BITMAPCOREHEADER
        12 => {
            if data.len() < 22 {
                return Err(truncated(ImageFormat::Bmp));
            }
            Ok((le_u16(data, 18), le_u16(data, 20)))
        }
        size if size >= 40 => {
            if data.len() < 26 {
                return Err(truncated(ImageFormat::Bmp));
            }
            let width = le_u32(data, 18) as i32;
            // Negative height marks a top-down bitmap
            let height = le_u32(data, 22) as i32;
            Ok((width.unsigned_abs(), height.unsigned_abs()))
        }
        size => Err(ImageError::InvalidData(format!("unsupported bmp header size {size}"))),
    }
}
