use std::fmt;
use std::str::FromStr;

use anyhow::{Result, anyhow};
use image::Rgba;
use serde::{Deserialize, Serialize};

/// Identifier of one of the built-in card layouts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateId {
    #[default]
    #[serde(rename = "template1")]
    A,
    #[serde(rename = "template2")]
    B,
    #[serde(rename = "template3")]
    C,
}

impl TemplateId {
    pub const ALL: [TemplateId; 3] = [TemplateId::A, TemplateId::B, TemplateId::C];

    pub fn style(self) -> &'static TemplateStyle {
        match self {
            TemplateId::A => &BLUE,
            TemplateId::B => &PURPLE,
            TemplateId::C => &GREEN,
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateId::A => write!(f, "a"),
            TemplateId::B => write!(f, "b"),
            TemplateId::C => write!(f, "c"),
        }
    }
}

impl FromStr for TemplateId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        TemplateRegistry::get(s).map(|style| style.id)
    }
}

/// Background treatment of a card region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    Solid(Rgba<u8>),
    /// Top-to-bottom linear gradient.
    Gradient(Rgba<u8>, Rgba<u8>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Square,
    Round,
}

/// Where the photo sits relative to the detail block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoPlacement {
    /// Photo on the left, name and details to its right.
    Beside,
    /// Photo centered above the name, details in a grid below.
    Centered,
}

#[derive(Debug, Clone, Copy)]
pub struct PhotoSlot {
    pub shape: Shape,
    pub width: u32,
    pub height: u32,
    pub placement: PhotoPlacement,
    pub frame: Rgba<u8>,
}

/// Logo mark drawn in the header's right corner.
#[derive(Debug, Clone, Copy)]
pub struct Badge {
    pub shape: Shape,
    pub size: u32,
    pub text: &'static str,
    pub text_color: Rgba<u8>,
}

/// Labels used for the four detail rows, in record order.
#[derive(Debug, Clone, Copy)]
pub struct DetailLabels {
    pub roll_number: &'static str,
    pub class_division: &'static str,
    pub rack_number: &'static str,
    pub bus_route: &'static str,
}

/// Everything that distinguishes one card layout from another.
///
/// The renderer is a single routine; a template is only this data.
#[derive(Debug, Clone)]
pub struct TemplateStyle {
    pub id: TemplateId,
    pub name: &'static str,
    pub description: &'static str,
    pub width: u32,
    pub background: Fill,
    pub border: Rgba<u8>,
    /// Separate header band; `None` lets the card background show through.
    pub header: Option<Fill>,
    pub subtitle: Option<&'static str>,
    pub badge: Badge,
    pub title: Rgba<u8>,
    pub text: Rgba<u8>,
    pub label: Rgba<u8>,
    pub photo: PhotoSlot,
    pub placeholder: Rgba<u8>,
    pub labels: DetailLabels,
    /// Inset panel behind the detail block.
    pub panel: Option<Rgba<u8>>,
    pub allergies_title: &'static str,
    pub chip_fill: Rgba<u8>,
    pub chip_text: Rgba<u8>,
    pub qr_size: u32,
    pub qr_dark: Rgba<u8>,
    pub footer_fill: Option<Rgba<u8>>,
    pub footer_text: Rgba<u8>,
    pub footer_note: &'static str,
}

/// Registry of built-in templates.
pub struct TemplateRegistry;

impl TemplateRegistry {
    pub fn list() -> Vec<&'static TemplateStyle> {
        vec![&BLUE, &PURPLE, &GREEN]
    }

    /// Resolve a template by id (`a`), legacy key (`template1`) or name (`blue`).
    pub fn get(name: &str) -> Result<&'static TemplateStyle> {
        let wanted = name.trim().to_ascii_lowercase();
        Self::list()
            .into_iter()
            .find(|tpl| {
                let legacy = match tpl.id {
                    TemplateId::A => "template1",
                    TemplateId::B => "template2",
                    TemplateId::C => "template3",
                };
                wanted == tpl.id.to_string() || wanted == legacy || wanted == tpl.name
            })
            .ok_or_else(|| anyhow!("unknown template '{}'", name))
    }
}

const fn rgb(r: u8, g: u8, b: u8) -> Rgba<u8> {
    Rgba([r, g, b, 0xff])
}

const WHITE: Rgba<u8> = rgb(0xff, 0xff, 0xff);

static BLUE: TemplateStyle = TemplateStyle {
    id: TemplateId::A,
    name: "blue",
    description: "Light card with a blue gradient header and labelled detail column.",
    width: 384,
    background: Fill::Gradient(WHITE, rgb(0xf8, 0xfa, 0xff)),
    border: rgb(0xe5, 0xe7, 0xeb),
    header: Some(Fill::Gradient(rgb(0x3b, 0x82, 0xf6), rgb(0x4f, 0x46, 0xe5))),
    subtitle: Some("Student Identification Card"),
    badge: Badge {
        shape: Shape::Round,
        size: 56,
        text: "UNITY",
        text_color: rgb(0x4f, 0x46, 0xe5),
    },
    title: WHITE,
    text: rgb(0x1f, 0x29, 0x37),
    label: rgb(0x6b, 0x72, 0x80),
    photo: PhotoSlot {
        shape: Shape::Square,
        width: 96,
        height: 128,
        placement: PhotoPlacement::Beside,
        frame: rgb(0xf3, 0xf4, 0xf6),
    },
    placeholder: rgb(0x9c, 0xa3, 0xaf),
    labels: DetailLabels {
        roll_number: "Roll Number:",
        class_division: "Class & Div:",
        rack_number: "Rack Number:",
        bus_route: "Bus Route:",
    },
    panel: None,
    allergies_title: "Allergies",
    chip_fill: rgb(0xfe, 0xf2, 0xf2),
    chip_text: rgb(0xb9, 0x1c, 0x1c),
    qr_size: 88,
    qr_dark: rgb(0x00, 0x00, 0x00),
    footer_fill: Some(rgb(0xf9, 0xfa, 0xfb)),
    footer_text: rgb(0x6b, 0x72, 0x80),
    footer_note: "This card must be carried at all times while on campus.",
};

static PURPLE: TemplateStyle = TemplateStyle {
    id: TemplateId::B,
    name: "purple",
    description: "Purple-to-pink gradient with a centered round photo and detail grid.",
    width: 384,
    background: Fill::Gradient(rgb(0x7c, 0x3a, 0xed), rgb(0xdb, 0x27, 0x77)),
    border: rgb(0x63, 0x66, 0xf1),
    header: None,
    subtitle: None,
    badge: Badge {
        shape: Shape::Round,
        size: 40,
        text: "U",
        text_color: rgb(0x93, 0x33, 0xea),
    },
    title: WHITE,
    text: WHITE,
    label: rgb(0xe9, 0xd5, 0xff),
    photo: PhotoSlot {
        shape: Shape::Round,
        width: 112,
        height: 112,
        placement: PhotoPlacement::Centered,
        frame: WHITE,
    },
    placeholder: rgb(0x9c, 0xa3, 0xaf),
    labels: DetailLabels {
        roll_number: "Roll Number",
        class_division: "Class",
        rack_number: "Rack Number",
        bus_route: "Bus Route",
    },
    panel: Some(rgb(0x9d, 0x4e, 0xdd)),
    allergies_title: "Allergies",
    chip_fill: rgb(0xec, 0x48, 0x99),
    chip_text: WHITE,
    qr_size: 98,
    qr_dark: rgb(0x5d, 0x23, 0xb8),
    footer_fill: None,
    footer_text: WHITE,
    footer_note: "ID must be displayed at all times on campus",
};

static GREEN: TemplateStyle = TemplateStyle {
    id: TemplateId::C,
    name: "green",
    description: "Emerald-to-teal gradient with a square photo and health information panel.",
    width: 384,
    background: Fill::Gradient(rgb(0x05, 0x96, 0x69), rgb(0x0d, 0x94, 0x88)),
    border: rgb(0x10, 0xb9, 0x81),
    header: None,
    subtitle: None,
    badge: Badge {
        shape: Shape::Square,
        size: 48,
        text: "U",
        text_color: rgb(0x05, 0x96, 0x69),
    },
    title: WHITE,
    text: WHITE,
    label: rgb(0xcc, 0xfb, 0xf1),
    photo: PhotoSlot {
        shape: Shape::Square,
        width: 112,
        height: 112,
        placement: PhotoPlacement::Beside,
        frame: WHITE,
    },
    placeholder: rgb(0x9c, 0xa3, 0xaf),
    labels: DetailLabels {
        roll_number: "Roll No:",
        class_division: "Class:",
        rack_number: "Rack No:",
        bus_route: "Bus Route:",
    },
    panel: Some(rgb(0x22, 0xa5, 0x8c)),
    allergies_title: "Health Information",
    chip_fill: rgb(0x14, 0xb8, 0xa6),
    chip_text: WHITE,
    qr_size: 112,
    qr_dark: rgb(0x0d, 0x94, 0x88),
    footer_fill: Some(rgb(0x1b, 0xa0, 0x88)),
    footer_text: WHITE,
    footer_note: "ID must be displayed at all times on campus",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_ids_legacy_keys_and_names() {
        assert_eq!(TemplateRegistry::get("a").unwrap().id, TemplateId::A);
        assert_eq!(TemplateRegistry::get("template2").unwrap().id, TemplateId::B);
        assert_eq!(TemplateRegistry::get("Green").unwrap().id, TemplateId::C);
        assert!(TemplateRegistry::get("d").is_err());
    }

    #[test]
    fn every_id_maps_to_its_own_style() {
        for id in TemplateId::ALL {
            assert_eq!(id.style().id, id);
        }
    }

    #[test]
    fn blue_layout_is_the_default() {
        assert_eq!(TemplateId::default(), TemplateId::A);
    }

    #[test]
    fn parses_from_cli_strings() {
        assert_eq!("B".parse::<TemplateId>().unwrap(), TemplateId::B);
        assert!("template9".parse::<TemplateId>().is_err());
    }

    #[test]
    fn serde_uses_legacy_keys() {
        assert_eq!(serde_json::to_string(&TemplateId::C).unwrap(), "\"template3\"");
    }
}
