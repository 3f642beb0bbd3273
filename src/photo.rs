//! Inline photo payloads (`data:` URIs) attached to student records.

use std::fs;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use thiserror::Error;
use tracing::debug;

/// Largest photo file the entry form accepts.
pub const MAX_UPLOAD_BYTES: usize = 2 * 1024 * 1024;

/// Largest photo that still fits in a card's scan code next to the other
/// fields. The payload is base64 inside JSON, inside one QR symbol.
pub const MAX_PHOTO_BYTES: usize = 1400;

const THUMBNAIL_SIDES: &[u32] = &[64, 48, 40, 32, 24, 16];
const JPEG_QUALITIES: &[u8] = &[70, 45, 20];

const ACCEPTED_MIME: &[&str] = &["image/png", "image/jpeg"];

#[derive(Debug, Error)]
pub enum PhotoError {
    #[error("photo is not a base64 data URI")]
    NotDataUri,
    #[error("unsupported photo type '{0}' (expected PNG or JPEG)")]
    UnsupportedType(String),
    #[error("photo payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("photo is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("photo could not be decoded: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to read photo file: {0}")]
    Io(#[from] std::io::Error),
}

/// A parsed `data:<mime>;base64,<payload>` URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUri {
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl DataUri {
    pub fn parse(uri: &str) -> Result<Self, PhotoError> {
        let rest = uri.strip_prefix("data:").ok_or(PhotoError::NotDataUri)?;
        let (header, payload) = rest.split_once(',').ok_or(PhotoError::NotDataUri)?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or(PhotoError::NotDataUri)?
            .to_ascii_lowercase();
        let bytes = STANDARD.decode(payload.trim())?;
        Ok(Self { mime, bytes })
    }

    pub fn encode(mime: &str, bytes: &[u8]) -> String {
        format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
    }
}

/// Form-level checks applied before a photo is accepted into a record.
pub fn check_upload(uri: &str) -> Result<(), PhotoError> {
    let parsed = DataUri::parse(uri)?;
    if !ACCEPTED_MIME.contains(&parsed.mime.as_str()) {
        return Err(PhotoError::UnsupportedType(parsed.mime));
    }
    if parsed.bytes.len() > MAX_UPLOAD_BYTES {
        return Err(PhotoError::TooLarge {
            size: parsed.bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    Ok(())
}

/// Read an image file into a data URI.
///
/// Files over [`MAX_PHOTO_BYTES`] are re-encoded as a JPEG thumbnail via [`shrink`].
pub fn load_file(path: &Path) -> Result<String, PhotoError> {
    let mime = match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        other => return Err(PhotoError::UnsupportedType(other.unwrap_or("").to_string())),
    };
    let bytes = fs::read(path)?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(PhotoError::TooLarge {
            size: bytes.len(),
            limit: MAX_UPLOAD_BYTES,
        });
    }
    if bytes.len() <= MAX_PHOTO_BYTES {
        return Ok(DataUri::encode(mime, &bytes));
    }
    let thumbnail = shrink(&image::load_from_memory(&bytes)?)?;
    debug!(
        original = bytes.len(),
        shrunk = thumbnail.len(),
        "re-encoded photo as thumbnail"
    );
    Ok(DataUri::encode("image/jpeg", &thumbnail))
}

/// Re-encode `picture` as the largest JPEG thumbnail within [`MAX_PHOTO_BYTES`].
pub fn shrink(picture: &DynamicImage) -> Result<Vec<u8>, PhotoError> {
    let mut smallest = usize::MAX;
    for &side in THUMBNAIL_SIDES {
        let thumbnail = DynamicImage::ImageRgb8(picture.thumbnail(side, side).to_rgb8());
        for &quality in JPEG_QUALITIES {
            let mut buffer = Vec::new();
            thumbnail.write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality))?;
            if buffer.len() <= MAX_PHOTO_BYTES {
                return Ok(buffer);
            }
            smallest = smallest.min(buffer.len());
        }
    }
    Err(PhotoError::TooLarge {
        size: smallest,
        limit: MAX_PHOTO_BYTES,
    })
}

/// Decode the pixels behind a data URI.
pub fn decode(uri: &str) -> Result<DynamicImage, PhotoError> {
    let parsed = DataUri::parse(uri)?;
    Ok(image::load_from_memory(&parsed.bytes)?)
}
