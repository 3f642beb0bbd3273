//! Card layout and PNG rasterization.

mod font;
mod paint;
mod surface;

pub use paint::{EXPORT_SCALE, MAX_CANVAS_SIDE, encode_png, rasterize};
pub use surface::{Area, CardSurface, Layer, Paint, Section, layout};
