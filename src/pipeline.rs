//! Record -> card surface -> PNG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, instrument};

use crate::config::Branding;
use crate::error::ExportError;
use crate::graphics::{self, CardSurface};
use crate::record::StudentRecord;
use crate::scan;
use crate::templates::TemplateId;

/// A rendered card ready to be written to disk.
#[derive(Debug, Clone)]
pub struct ExportedCard {
    pub file_name: String,
    pub png: Vec<u8>,
}

impl ExportedCard {
    /// Write into `dir`, creating it when missing. Returns the written path.
    pub fn save_in(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.png)
            .with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CardExportPipeline {
    branding: Branding,
}

impl CardExportPipeline {
    pub fn new(branding: Branding) -> Self {
        Self { branding }
    }

    pub fn encode_for_scan(&self, record: &StudentRecord) -> String {
        scan::encode_for_scan(record)
    }

    #[instrument(skip(self, record), fields(roll_number = %record.roll_number))]
    pub fn render(&self, record: &StudentRecord, template: TemplateId) -> CardSurface {
        let surface = graphics::layout(
            record,
            template.style(),
            &self.branding,
            self.encode_for_scan(record),
        );
        debug!(layers = surface.layers().len(), "rendered card surface");
        surface
    }

    /// Rasterize and encode on the calling thread.
    pub fn export_blocking(&self, surface: &CardSurface) -> Result<Vec<u8>, ExportError> {
        let canvas = graphics::rasterize(surface)?;
        graphics::encode_png(canvas)
    }

    /// Rasterize on a blocking worker; resolves once with the PNG or the failure.
    #[instrument(skip_all, fields(template = ?surface.template()))]
    pub async fn export(&self, surface: CardSurface) -> Result<Vec<u8>, ExportError> {
        let handle = tokio::task::spawn_blocking(move || {
            let canvas = graphics::rasterize(&surface)?;
            graphics::encode_png(canvas)
        });
        let png = handle
            .await
            .map_err(|err| ExportError::Worker(err.to_string()))??;
        debug!(bytes = png.len(), "exported card image");
        Ok(png)
    }

    /// `<prefix>-<name>.png`, with the name lower-cased and whitespace runs as hyphens.
    pub fn download_filename(&self, name: &str) -> String {
        let slug = name
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        format!("{}-{}.png", self.branding.file_prefix, slug)
    }

    /// Render, export and name a card in one step.
    pub async fn download(
        &self,
        record: &StudentRecord,
        template: TemplateId,
    ) -> Result<ExportedCard, ExportError> {
        let surface = self.render(record, template);
        let png = self.export(surface).await?;
        Ok(ExportedCard {
            file_name: self.download_filename(&record.name),
            png,
        })
    }
}
