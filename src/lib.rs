//! Student ID cards: validated records, a local record store, templated card
//! rendering with an embedded QR payload, and PNG export.

mod config;
mod error;
mod graphics;
mod photo;
mod pipeline;
mod record;
mod scan;
mod store;
mod templates;

pub use config::{Branding, Settings};
pub use error::ExportError;
pub use graphics::{
    Area, CardSurface, EXPORT_SCALE, Layer, MAX_CANVAS_SIDE, Paint, Section, rasterize,
};
pub use photo::{DataUri, MAX_PHOTO_BYTES, MAX_UPLOAD_BYTES, PhotoError};
pub use pipeline::{CardExportPipeline, ExportedCard};
pub use record::{
    ALLERGY_OPTIONS, BUS_ROUTE_OPTIONS, CLASS_OPTIONS, DraftRecord, Field, FieldError,
    StudentRecord, validate,
};
pub use scan::{decode_scan, encode_for_scan, fits_scan_code};
pub use store::{
    FileBackend, FileRecordStore, LocalRecordStore, MemoryBackend, MemoryRecordStore,
    RecordStore, STORAGE_KEY, StorageBackend, StorageError,
};
pub use templates::{Fill, PhotoPlacement, Shape, TemplateId, TemplateRegistry, TemplateStyle};

/// Read an image file into a record-ready `data:` URI.
pub fn load_photo(path: &std::path::Path) -> Result<String, PhotoError> {
    photo::load_file(path)
}
