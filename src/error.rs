use thiserror::Error;

use crate::photo::PhotoError;

/// Recoverable failure while turning a card surface into an image.
///
/// Callers report these as "try again"; none of them poison the record store.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("card surface {width}x{height} is not attached to anything renderable")]
    Detached { width: u32, height: u32 },
    #[error("card canvas {width}x{height} exceeds the {limit}px limit")]
    TooLarge { width: u32, height: u32, limit: u32 },
    #[error("student photo could not be drawn: {0}")]
    Photo(#[from] PhotoError),
    #[error("scan code could not be drawn: {0}")]
    Barcode(String),
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("export worker stopped before finishing: {0}")]
    Worker(String),
}
