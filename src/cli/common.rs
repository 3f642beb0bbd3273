//! Shared clap helper types for CLI commands.

use clap::ValueEnum;
use unity_id::TemplateId;

/// Card layouts selectable on the command line.
#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum TemplateArg {
    /// Blue header, labelled detail column.
    #[value(name = "a", aliases = ["template1", "blue"])]
    A,
    /// Purple gradient, centered round photo.
    #[value(name = "b", aliases = ["template2", "purple"])]
    B,
    /// Green gradient, health information panel.
    #[value(name = "c", aliases = ["template3", "green"])]
    C,
}

impl From<TemplateArg> for TemplateId {
    fn from(value: TemplateArg) -> TemplateId {
        match value {
            TemplateArg::A => TemplateId::A,
            TemplateArg::B => TemplateId::B,
            TemplateArg::C => TemplateId::C,
        }
    }
}
