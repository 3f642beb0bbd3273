//! Convenience helpers shared across command handlers.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::DateTime;
use tracing::warn;
use unity_id::{
    CardExportPipeline, ExportedCard, FileBackend, FileRecordStore, RecordStore, Settings,
    StudentRecord, TemplateId,
};

/// Everything a command handler needs, built once per invocation.
pub struct AppContext {
    pub settings: Settings,
    pub store: FileRecordStore,
    pub pipeline: CardExportPipeline,
}

impl AppContext {
    pub fn new(settings: Settings) -> Self {
        let store = FileRecordStore::new(FileBackend::new(settings.data_dir.clone()));
        let pipeline = CardExportPipeline::new(settings.branding.clone());
        Self {
            settings,
            store,
            pipeline,
        }
    }

    /// Current saved record for a roll number.
    pub fn saved(&self, roll_number: &str) -> Result<StudentRecord> {
        self.store
            .find(roll_number)
            .ok_or_else(|| anyhow!("no saved ID card for roll number '{}'", roll_number))
    }

    pub fn output_dir(&self, requested: Option<PathBuf>) -> PathBuf {
        requested.unwrap_or_else(|| self.settings.output_dir.clone())
    }
}

/// Export a card and write it under its download name.
///
/// Export failures are transient from the user's point of view; they are
/// reported with a retry hint and do not touch the saved record.
pub async fn download_card(
    ctx: &AppContext,
    record: &StudentRecord,
    template: TemplateId,
    dir: &Path,
) -> Result<PathBuf> {
    let card: ExportedCard = match ctx.pipeline.download(record, template).await {
        Ok(card) => card,
        Err(err) => {
            warn!(roll_number = %record.roll_number, error = %err, "error generating image");
            return Err(anyhow!(err).context("failed to download ID card, please try again"));
        }
    };
    card.save_in(dir)
        .with_context(|| format!("failed to save ID card for {}", record.name))
}

/// `MM/DD/YYYY` for display, or the raw value when it is not RFC 3339.
pub fn format_date(created_at: &str) -> String {
    DateTime::parse_from_rfc3339(created_at)
        .map(|dt| dt.format("%m/%d/%Y").to_string())
        .unwrap_or_else(|_| created_at.to_string())
}
