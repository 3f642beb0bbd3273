use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_ellipse_mut, draw_filled_rect_mut, draw_hollow_rect_mut,
};
use imageproc::rect::Rect;
use qrcode::{Color, QrCode};

use super::font::draw_text;
use super::surface::{Area, CardSurface, Paint};
use crate::error::ExportError;
use crate::photo;
use crate::scan::SCAN_EC_LEVEL;
use crate::templates::{Fill, Shape};

/// Linear scale applied to the surface's natural size on export.
pub const EXPORT_SCALE: u32 = 2;
/// Largest canvas side accepted for rasterization.
pub const MAX_CANVAS_SIDE: u32 = 8192;

const LIGHT: Rgba<u8> = Rgba([0xff, 0xff, 0xff, 0xff]);

/// Rasterize a populated card surface at [`EXPORT_SCALE`].
pub fn rasterize(surface: &CardSurface) -> Result<RgbaImage, ExportError> {
    let (width, height) = surface.size();
    if width == 0 || height == 0 || surface.layers().is_empty() {
        return Err(ExportError::Detached { width, height });
    }
    let canvas_w = width * EXPORT_SCALE;
    let canvas_h = height * EXPORT_SCALE;
    if canvas_w > MAX_CANVAS_SIDE || canvas_h > MAX_CANVAS_SIDE {
        return Err(ExportError::TooLarge {
            width: canvas_w,
            height: canvas_h,
            limit: MAX_CANVAS_SIDE,
        });
    }

    let mut canvas = RgbaImage::from_pixel(canvas_w, canvas_h, LIGHT);
    for layer in surface.layers() {
        match &layer.paint {
            Paint::Fill { area, fill } => fill_area(&mut canvas, scaled(area), *fill),
            Paint::Shape { area, shape, color } => {
                fill_shape(&mut canvas, scaled(area), *shape, *color)
            }
            Paint::Outline { area, color } => {
                let area = scaled(area);
                if let Some(rect) = rect(area) {
                    draw_hollow_rect_mut(&mut canvas, rect, *color);
                }
            }
            Paint::Text {
                x,
                y,
                scale,
                color,
                text,
            } => draw_text(
                &mut canvas,
                (x * EXPORT_SCALE) as i32,
                (y * EXPORT_SCALE) as i32,
                text,
                *color,
                scale * EXPORT_SCALE,
            ),
            Paint::Photo {
                area,
                shape,
                source,
            } => draw_photo(&mut canvas, scaled(area), *shape, source)?,
            Paint::Placeholder { area, color } => draw_placeholder(&mut canvas, scaled(area), *color),
            Paint::Barcode {
                area,
                payload,
                dark,
            } => draw_barcode(&mut canvas, scaled(area), payload, *dark)?,
        }
    }
    Ok(canvas)
}

/// Encode a rasterized card as PNG bytes.
pub fn encode_png(image: RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgba8(image).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

fn scaled(area: &Area) -> Area {
    Area::new(
        area.x * EXPORT_SCALE,
        area.y * EXPORT_SCALE,
        area.width * EXPORT_SCALE,
        area.height * EXPORT_SCALE,
    )
}

fn rect(area: Area) -> Option<Rect> {
    (area.width > 0 && area.height > 0)
        .then(|| Rect::at(area.x as i32, area.y as i32).of_size(area.width, area.height))
}

fn fill_area(canvas: &mut RgbaImage, area: Area, fill: Fill) {
    match fill {
        Fill::Solid(color) => {
            if let Some(rect) = rect(area) {
                draw_filled_rect_mut(canvas, rect, color);
            }
        }
        Fill::Gradient(top, bottom) => {
            let span = area.height.saturating_sub(1).max(1) as f32;
            for row in 0..area.height {
                let color = lerp(top, bottom, row as f32 / span);
                for col in 0..area.width {
                    put(canvas, area.x + col, area.y + row, color);
                }
            }
        }
    }
}

fn fill_shape(canvas: &mut RgbaImage, area: Area, shape: Shape, color: Rgba<u8>) {
    match shape {
        Shape::Square => fill_area(canvas, area, Fill::Solid(color)),
        Shape::Round => {
            let radius = (area.width.min(area.height) / 2) as i32;
            let center = (
                (area.x + area.width / 2) as i32,
                (area.y + area.height / 2) as i32,
            );
            draw_filled_circle_mut(canvas, center, radius, color);
        }
    }
}

fn draw_photo(
    canvas: &mut RgbaImage,
    area: Area,
    shape: Shape,
    source: &str,
) -> Result<(), ExportError> {
    if area.width == 0 || area.height == 0 {
        return Ok(());
    }
    let picture = photo::decode(source)?
        .resize_to_fill(area.width, area.height, FilterType::Triangle)
        .to_rgba8();
    let radius = area.width.min(area.height) as f32 / 2.0;
    let (cx, cy) = (area.width as f32 / 2.0, area.height as f32 / 2.0);
    for (px, py, pixel) in picture.enumerate_pixels() {
        if shape == Shape::Round {
            let dx = px as f32 + 0.5 - cx;
            let dy = py as f32 + 0.5 - cy;
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
        }
        put(canvas, area.x + px, area.y + py, *pixel);
    }
    Ok(())
}

/// Head and shoulders silhouette centered in `area`.
fn draw_placeholder(canvas: &mut RgbaImage, area: Area, color: Rgba<u8>) {
    let side = area.width.min(area.height) as f32;
    let cx = (area.x + area.width / 2) as i32;
    let top = area.y as f32 + (area.height as f32 - side) / 2.0;
    let head_radius = (side * 0.14).round() as i32;
    let head_y = (top + side * 0.38).round() as i32;
    draw_filled_circle_mut(canvas, (cx, head_y), head_radius, color);
    let body_y = (top + side * 0.70).round() as i32;
    draw_filled_ellipse_mut(
        canvas,
        (cx, body_y),
        (side * 0.24).round() as i32,
        (side * 0.13).round() as i32,
        color,
    );
}

fn draw_barcode(
    canvas: &mut RgbaImage,
    area: Area,
    payload: &str,
    dark: Rgba<u8>,
) -> Result<(), ExportError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), SCAN_EC_LEVEL)
        .map_err(|err| ExportError::Barcode(err.to_string()))?;
    let modules = code.width() as u32;
    let side = area.width.min(area.height);
    // one light module of quiet zone on each side inside the white frame
    let module = side / (modules + 2);
    if module == 0 {
        return Err(ExportError::Barcode(format!(
            "{modules} modules do not fit in {side}px"
        )));
    }
    let offset_x = area.x + (area.width - module * modules) / 2;
    let offset_y = area.y + (area.height - module * modules) / 2;
    fill_area(canvas, area, Fill::Solid(LIGHT));
    for (idx, color) in code.to_colors().into_iter().enumerate() {
        if color != Color::Dark {
            continue;
        }
        let col = idx as u32 % modules;
        let row = idx as u32 / modules;
        let cell = Area::new(
            offset_x + col * module,
            offset_y + row * module,
            module,
            module,
        );
        fill_area(canvas, cell, Fill::Solid(dark));
    }
    Ok(())
}

fn put(canvas: &mut RgbaImage, x: u32, y: u32, color: Rgba<u8>) {
    if x < canvas.width() && y < canvas.height() {
        canvas.put_pixel(x, y, color);
    }
}

fn lerp(a: Rgba<u8>, b: Rgba<u8>, t: f32) -> Rgba<u8> {
    let mix = |i: usize| (a.0[i] as f32 + (b.0[i] as f32 - a.0[i] as f32) * t).round() as u8;
    Rgba([mix(0), mix(1), mix(2), mix(3)])
}
