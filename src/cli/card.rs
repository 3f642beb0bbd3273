//! Card creation (`unity-id card ...`).

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::builder::PossibleValuesParser;
use clap::{Args, Subcommand};
use tracing::info;
use unity_id::{
    ALLERGY_OPTIONS, BUS_ROUTE_OPTIONS, CLASS_OPTIONS, DraftRecord, RecordStore, StudentRecord,
    load_photo, validate,
};

use crate::cli::common::TemplateArg;
use crate::cli::utils::{AppContext, download_card};

/// Supported `unity-id card` subcommands.
#[derive(Subcommand, Debug)]
pub enum CardCommand {
    /// Validate the form fields, save the card and optionally download it.
    Create(CardCreateArgs),
}

/// Form fields for `unity-id card create`.
#[derive(Args, Debug)]
pub struct CardCreateArgs {
    /// Full name, e.g. "Jane Doe".
    #[arg(long)]
    pub name: Option<String>,
    /// Roll number, e.g. U2022001. Re-using one replaces the saved card.
    #[arg(long = "roll")]
    pub roll_number: Option<String>,
    /// Class and division.
    #[arg(long = "class", value_parser = PossibleValuesParser::new(CLASS_OPTIONS.iter().copied()))]
    pub class_division: Option<String>,
    /// Allergy tag; repeat for several.
    #[arg(long = "allergy", value_parser = PossibleValuesParser::new(ALLERGY_OPTIONS.iter().copied()))]
    pub allergies: Vec<String>,
    /// PNG or JPEG photo file, at most 2MB. Files over 1400 bytes are stored
    /// as a small JPEG thumbnail so the whole card fits in its scan code.
    #[arg(long)]
    pub photo: Option<PathBuf>,
    /// Rack number.
    #[arg(long = "rack")]
    pub rack_number: Option<String>,
    /// Bus route.
    #[arg(long = "bus", value_parser = PossibleValuesParser::new(BUS_ROUTE_OPTIONS.iter().copied()))]
    pub bus_route: Option<String>,
    /// Card layout.
    #[arg(long, default_value_t = TemplateArg::A, value_enum)]
    pub template: TemplateArg,
    /// Directory to write the card PNG into; omit to only save the record.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// Execute a card command.
pub async fn handle(ctx: &AppContext, command: CardCommand) -> Result<()> {
    match command {
        CardCommand::Create(args) => create(ctx, args).await,
    }
}

async fn create(ctx: &AppContext, args: CardCreateArgs) -> Result<()> {
    let mut draft = DraftRecord {
        name: args.name,
        roll_number: args.roll_number,
        class_division: args.class_division,
        rack_number: args.rack_number,
        bus_route: args.bus_route,
        ..DraftRecord::default()
    };
    for tag in &args.allergies {
        draft.set_allergy(tag, true);
    }
    if let Some(path) = &args.photo {
        let uri = load_photo(path)
            .with_context(|| format!("failed to attach photo {}", path.display()))?;
        draft.photo = Some(uri);
    }

    let record: StudentRecord = match validate(&draft) {
        Ok(record) => record,
        Err(errors) => {
            for err in &errors {
                eprintln!("  {}", err);
            }
            return Err(anyhow!(
                "form validation failed: please check the {} field(s) above",
                errors.len()
            ));
        }
    };

    ctx.store.upsert(record.clone());
    info!(roll_number = %record.roll_number, "card submitted");
    println!(
        "Student ID card generated for {} ({})",
        record.name, record.roll_number
    );

    if let Some(dir) = args.output {
        let path = download_card(ctx, &record, args.template.into(), &dir).await?;
        println!("ID card downloaded to {}", path.display());
    }
    Ok(())
}
