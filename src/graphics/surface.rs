//! Card layout: turns a record and a template into a retained list of paint layers.

use image::Rgba;

use super::font::{GLYPH_HEIGHT, fit_text, text_width};
use crate::config::Branding;
use crate::record::StudentRecord;
use crate::templates::{Fill, PhotoPlacement, Shape, TemplateId, TemplateStyle};

const PAD: u32 = 24;
const GAP: u32 = 16;
const HEADER_HEIGHT: u32 = 80;
const ROW_HEIGHT: u32 = 16;
const CHIP_HEIGHT: u32 = 17;
const CHIP_PAD: u32 = 6;
const QR_MARGIN: u32 = 8;
const FOOTER_HEIGHT: u32 = 44;
const NAME_SCALE: u32 = 2;

/// Axis-aligned box in the surface's natural (1x) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Area {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Area {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Logical part of the card a layer belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    Card,
    Header,
    Photo,
    Details,
    Allergies,
    Barcode,
    Footer,
}

/// One drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Fill { area: Area, fill: Fill },
    Shape { area: Area, shape: Shape, color: Rgba<u8> },
    Outline { area: Area, color: Rgba<u8> },
    Text { x: u32, y: u32, scale: u32, color: Rgba<u8>, text: String },
    Photo { area: Area, shape: Shape, source: String },
    /// Generic person glyph shown when a record has no photo.
    Placeholder { area: Area, color: Rgba<u8> },
    Barcode { area: Area, payload: String, dark: Rgba<u8> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub section: Section,
    pub paint: Paint,
}

/// A populated card, ready to be rasterized.
///
/// A default surface has no size and nothing attached; exporting it fails.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardSurface {
    template: Option<TemplateId>,
    width: u32,
    height: u32,
    layers: Vec<Layer>,
}

impl CardSurface {
    pub fn template(&self) -> Option<TemplateId> {
        self.template
    }

    /// Natural size before export scaling.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn has_section(&self, section: Section) -> bool {
        self.layers.iter().any(|l| l.section == section)
    }

    /// Strings printed in `section`, in paint order.
    pub fn texts(&self, section: Section) -> Vec<&str> {
        self.layers
            .iter()
            .filter(|l| l.section == section)
            .filter_map(|l| match &l.paint {
                Paint::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn shows_placeholder(&self) -> bool {
        self.layers
            .iter()
            .any(|l| matches!(l.paint, Paint::Placeholder { .. }))
    }

    pub fn photo_source(&self) -> Option<&str> {
        self.layers.iter().find_map(|l| match &l.paint {
            Paint::Photo { source, .. } => Some(source.as_str()),
            _ => None,
        })
    }

    pub fn barcode_payload(&self) -> Option<&str> {
        self.layers.iter().find_map(|l| match &l.paint {
            Paint::Barcode { payload, .. } => Some(payload.as_str()),
            _ => None,
        })
    }
}

struct Builder<'a> {
    style: &'a TemplateStyle,
    layers: Vec<Layer>,
}

impl<'a> Builder<'a> {
    fn push(&mut self, section: Section, paint: Paint) {
        self.layers.push(Layer { section, paint });
    }

    fn text(&mut self, section: Section, x: u32, y: u32, scale: u32, color: Rgba<u8>, text: &str) {
        if text.is_empty() {
            return;
        }
        self.push(
            section,
            Paint::Text {
                x,
                y,
                scale,
                color,
                text: text.to_string(),
            },
        );
    }

    /// Text clipped to `max_width`.
    fn fitted(
        &mut self,
        section: Section,
        x: u32,
        y: u32,
        max_width: u32,
        scale: u32,
        color: Rgba<u8>,
        text: &str,
    ) {
        let text = fit_text(text, max_width, scale);
        self.text(section, x, y, scale, color, &text);
    }

    fn centered(&mut self, section: Section, y: u32, scale: u32, color: Rgba<u8>, text: &str) {
        let content = self.style.width - 2 * PAD;
        let text = fit_text(text, content, scale);
        let x = PAD + (content - text_width(&text, scale)) / 2;
        self.text(section, x, y, scale, color, &text);
    }
}

/// Lay out `record` using `style`. Never fails: missing optional data degrades
/// to placeholders or omitted sections.
pub fn layout(
    record: &StudentRecord,
    style: &TemplateStyle,
    branding: &Branding,
    scan_payload: String,
) -> CardSurface {
    let mut b = Builder {
        style,
        layers: Vec::new(),
    };
    let width = style.width;
    let content = width - 2 * PAD;

    header(&mut b, branding);
    let mut y = HEADER_HEIGHT;

    y = match style.photo.placement {
        PhotoPlacement::Beside => details_beside(&mut b, record, y + GAP),
        PhotoPlacement::Centered => details_centered(&mut b, record, y + GAP),
    } + GAP;

    if record.has_allergies() {
        y = allergies(&mut b, record, y, content) + GAP;
    }

    let frame = style.qr_size + 2 * QR_MARGIN;
    let frame_area = Area::new((width - frame) / 2, y, frame, frame);
    b.push(
        Section::Barcode,
        Paint::Shape {
            area: frame_area,
            shape: Shape::Square,
            color: Rgba([0xff, 0xff, 0xff, 0xff]),
        },
    );
    b.push(
        Section::Barcode,
        Paint::Barcode {
            area: Area::new(
                frame_area.x + QR_MARGIN,
                y + QR_MARGIN,
                style.qr_size,
                style.qr_size,
            ),
            payload: scan_payload,
            dark: style.qr_dark,
        },
    );
    y = frame_area.bottom() + GAP;

    footer(&mut b, branding, y);
    let height = y + FOOTER_HEIGHT;

    let mut layers = vec![Layer {
        section: Section::Card,
        paint: Paint::Fill {
            area: Area::new(0, 0, width, height),
            fill: style.background,
        },
    }];
    layers.append(&mut b.layers);
    layers.push(Layer {
        section: Section::Card,
        paint: Paint::Outline {
            area: Area::new(0, 0, width, height),
            color: style.border,
        },
    });

    CardSurface {
        template: Some(style.id),
        width,
        height,
        layers,
    }
}

fn header(b: &mut Builder<'_>, branding: &Branding) {
    let style = b.style;
    if let Some(fill) = style.header {
        b.push(
            Section::Header,
            Paint::Fill {
                area: Area::new(0, 0, style.width, HEADER_HEIGHT),
                fill,
            },
        );
    }

    let badge = style.badge;
    let badge_area = Area::new(
        style.width - PAD - badge.size,
        (HEADER_HEIGHT - badge.size) / 2,
        badge.size,
        badge.size,
    );
    let title_width = badge_area.x - PAD - GAP;
    let title_y = if style.subtitle.is_some() { 24 } else { 33 };
    b.fitted(
        Section::Header,
        PAD,
        title_y,
        title_width,
        2,
        style.title,
        &branding.school_name,
    );
    if let Some(subtitle) = style.subtitle {
        b.fitted(Section::Header, PAD, 46, title_width, 1, style.title, subtitle);
    }

    b.push(
        Section::Header,
        Paint::Shape {
            area: badge_area,
            shape: badge.shape,
            color: Rgba([0xff, 0xff, 0xff, 0xff]),
        },
    );
    let mark_scale = if badge.text.chars().count() > 1 { 1 } else { 2 };
    let mark_w = text_width(badge.text, mark_scale);
    let mark_h = GLYPH_HEIGHT * mark_scale;
    b.text(
        Section::Header,
        badge_area.x + badge.size.saturating_sub(mark_w) / 2,
        badge_area.y + badge.size.saturating_sub(mark_h) / 2,
        mark_scale,
        badge.text_color,
        badge.text,
    );
}

fn photo(b: &mut Builder<'_>, record: &StudentRecord, area: Area) {
    let slot = b.style.photo;
    b.push(
        Section::Photo,
        Paint::Shape {
            area,
            shape: slot.shape,
            color: slot.frame,
        },
    );
    match &record.photo {
        Some(source) => b.push(
            Section::Photo,
            Paint::Photo {
                area,
                shape: slot.shape,
                source: source.clone(),
            },
        ),
        None => b.push(
            Section::Photo,
            Paint::Placeholder {
                area,
                color: b.style.placeholder,
            },
        ),
    }
}

/// Photo on the left, name and labelled rows on the right. Returns the bottom edge.
fn details_beside(b: &mut Builder<'_>, record: &StudentRecord, top: u32) -> u32 {
    let style = b.style;
    let slot = style.photo;
    let photo_area = Area::new(PAD, top, slot.width, slot.height);
    photo(b, record, photo_area);

    let col_x = PAD + slot.width + GAP;
    let col_w = style.width - col_x - PAD;
    b.fitted(Section::Details, col_x, top, col_w, NAME_SCALE, style.text, &record.name);

    let rows = [
        (style.labels.roll_number, &record.roll_number),
        (style.labels.class_division, &record.class_division),
        (style.labels.rack_number, &record.rack_number),
        (style.labels.bus_route, &record.bus_route),
    ];
    let inset = if style.panel.is_some() { 8 } else { 0 };
    let rows_top = top + GLYPH_HEIGHT * NAME_SCALE + 12;
    let rows_height = rows.len() as u32 * ROW_HEIGHT + 2 * inset;
    if let Some(panel) = style.panel {
        b.push(
            Section::Details,
            Paint::Fill {
                area: Area::new(col_x, rows_top, col_w, rows_height),
                fill: Fill::Solid(panel),
            },
        );
    }
    let label_w = rows
        .iter()
        .map(|(label, _)| text_width(label, 1))
        .max()
        .unwrap_or(0)
        + 6;
    for (idx, (label, value)) in rows.iter().enumerate() {
        let y = rows_top + inset + idx as u32 * ROW_HEIGHT + 4;
        let x = col_x + inset;
        b.text(Section::Details, x, y, 1, style.label, label);
        let value_x = x + label_w;
        let value_w = (col_x + col_w).saturating_sub(value_x + inset);
        b.fitted(Section::Details, value_x, y, value_w, 1, style.text, value);
    }

    photo_area.bottom().max(rows_top + rows_height)
}

/// Photo centered above the name and a two-column grid. Returns the bottom edge.
fn details_centered(b: &mut Builder<'_>, record: &StudentRecord, top: u32) -> u32 {
    let style = b.style;
    let slot = style.photo;
    let photo_area = Area::new((style.width - slot.width) / 2, top, slot.width, slot.height);
    photo(b, record, photo_area);

    let mut y = photo_area.bottom() + 12;
    b.centered(Section::Details, y, NAME_SCALE, style.text, &record.name);
    y += GLYPH_HEIGHT * NAME_SCALE + 8;
    let subline = format!("{} - {}", record.roll_number, record.class_division);
    b.centered(Section::Details, y, 1, style.label, &subline);
    y += GLYPH_HEIGHT + GAP;

    let grid = Area::new(PAD, y, style.width - 2 * PAD, 48);
    if let Some(panel) = style.panel {
        b.push(
            Section::Details,
            Paint::Fill {
                area: grid,
                fill: Fill::Solid(panel),
            },
        );
    }
    let half = grid.width / 2;
    let cells = [
        (style.labels.rack_number, &record.rack_number),
        (style.labels.bus_route, &record.bus_route),
    ];
    for (idx, (label, value)) in cells.iter().enumerate() {
        let x = grid.x + 12 + idx as u32 * half;
        let cell_w = half - 24;
        b.fitted(Section::Details, x, grid.y + 12, cell_w, 1, style.label, label);
        b.fitted(Section::Details, x, grid.y + 28, cell_w, 1, style.text, value);
    }
    grid.bottom()
}

/// Section title and wrapped tag chips. Returns the bottom edge.
fn allergies(b: &mut Builder<'_>, record: &StudentRecord, top: u32, content: u32) -> u32 {
    let style = b.style;
    b.text(Section::Allergies, PAD, top, 1, style.label, style.allergies_title);

    let mut x = PAD;
    let mut y = top + GLYPH_HEIGHT + 8;
    for tag in &record.allergies {
        let label = fit_text(tag, content - 2 * CHIP_PAD, 1);
        let chip_w = text_width(&label, 1) + 2 * CHIP_PAD;
        if x > PAD && x + chip_w > PAD + content {
            x = PAD;
            y += CHIP_HEIGHT + 4;
        }
        b.push(
            Section::Allergies,
            Paint::Fill {
                area: Area::new(x, y, chip_w, CHIP_HEIGHT),
                fill: Fill::Solid(style.chip_fill),
            },
        );
        b.text(Section::Allergies, x + CHIP_PAD, y + 5, 1, style.chip_text, &label);
        x += chip_w + 4;
    }
    y + CHIP_HEIGHT
}

fn footer(b: &mut Builder<'_>, branding: &Branding, top: u32) {
    let style = b.style;
    if let Some(fill) = style.footer_fill {
        b.push(
            Section::Footer,
            Paint::Fill {
                area: Area::new(0, top, style.width, FOOTER_HEIGHT),
                fill: Fill::Solid(fill),
            },
        );
    }
    b.centered(Section::Footer, top + 10, 1, style.footer_text, style.footer_note);
    b.centered(Section::Footer, top + 26, 1, style.footer_text, &branding.footer_line());
}
