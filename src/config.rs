//! Runtime settings: where records live and how cards are branded.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Institution text printed on cards and used for download names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Branding {
    pub school_name: String,
    pub academic_year: String,
    /// Tag prefixed to every downloaded file name.
    pub file_prefix: String,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            school_name: "Unity School".to_string(),
            academic_year: "2023-24".to_string(),
            file_prefix: "unity-id".to_string(),
        }
    }
}

impl Branding {
    pub fn footer_line(&self) -> String {
        format!("{}, Academic Year {}", self.school_name, self.academic_year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the saved-card store.
    pub data_dir: PathBuf,
    /// Default directory for exported PNGs.
    pub output_dir: PathBuf,
    pub branding: Branding,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".unity-id"),
            output_dir: PathBuf::from("."),
            branding: Branding::default(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with a JSON settings file when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse settings {}", path.display()))
    }
}
