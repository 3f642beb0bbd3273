//! Saved-card management (`unity-id saved ...`).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use unity_id::RecordStore;

use crate::cli::common::TemplateArg;
use crate::cli::utils::{AppContext, download_card, format_date};

/// Supported `unity-id saved` subcommands.
#[derive(Subcommand, Debug)]
pub enum SavedCommand {
    /// List saved ID cards.
    List,
    /// Show one saved card.
    Show(SavedShowArgs),
    /// Re-download a saved card as PNG.
    Download(SavedDownloadArgs),
    /// Delete a saved card.
    Delete(SavedDeleteArgs),
    /// Print the payload encoded in a card's QR symbol.
    Payload(SavedRollArgs),
}

/// Arguments selecting a saved card by roll number.
#[derive(Args, Debug)]
pub struct SavedRollArgs {
    /// Roll number of the saved card.
    #[arg(long = "roll")]
    pub roll_number: String,
}

/// Arguments for `unity-id saved show`.
#[derive(Args, Debug)]
pub struct SavedShowArgs {
    #[command(flatten)]
    pub target: SavedRollArgs,
    /// Print the stored JSON record.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `unity-id saved download`.
#[derive(Args, Debug)]
pub struct SavedDownloadArgs {
    #[command(flatten)]
    pub target: SavedRollArgs,
    /// Card layout.
    #[arg(long, default_value_t = TemplateArg::A, value_enum)]
    pub template: TemplateArg,
    /// Output directory (defaults to the configured output directory).
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
}

/// Arguments for `unity-id saved delete`.
#[derive(Args, Debug)]
pub struct SavedDeleteArgs {
    #[command(flatten)]
    pub target: SavedRollArgs,
    /// Creation time of the card to delete; defaults to the current saved card's.
    #[arg(long = "created-at")]
    pub created_at: Option<String>,
}

/// Execute a saved-card command.
pub async fn handle(ctx: &AppContext, command: SavedCommand) -> Result<()> {
    match command {
        SavedCommand::List => list(ctx),
        SavedCommand::Show(args) => show(ctx, args),
        SavedCommand::Download(args) => download(ctx, args).await,
        SavedCommand::Delete(args) => delete(ctx, args),
        SavedCommand::Payload(args) => payload(ctx, args),
    }
}

fn list(ctx: &AppContext) -> Result<()> {
    let records = ctx.store.list();
    if records.is_empty() {
        println!("No saved ID cards yet.");
        return Ok(());
    }
    println!("{:<14} {:<24} {:<10} {}", "ROLL", "NAME", "CLASS", "CREATED");
    for record in &records {
        println!(
            "{:<14} {:<24} {:<10} {}",
            record.roll_number,
            record.name,
            record.class_division,
            format_date(&record.created_at)
        );
    }
    Ok(())
}

fn show(ctx: &AppContext, args: SavedShowArgs) -> Result<()> {
    let record = ctx.saved(&args.target.roll_number)?;
    if args.json {
        let json = serde_json::to_string_pretty(&record).context("failed to serialize record")?;
        println!("{}", json);
        return Ok(());
    }
    println!("Name:       {}", record.name);
    println!("Roll:       {}", record.roll_number);
    println!("Class:      {}", record.class_division);
    println!("Rack:       {}", record.rack_number);
    println!("Bus:        {}", record.bus_route);
    if record.has_allergies() {
        println!("Allergies:  {}", record.allergies.join(", "));
    }
    println!(
        "Photo:      {}",
        if record.photo.is_some() { "attached" } else { "none" }
    );
    println!("Created:    {}", format_date(&record.created_at));
    Ok(())
}

async fn download(ctx: &AppContext, args: SavedDownloadArgs) -> Result<()> {
    let record = ctx.saved(&args.target.roll_number)?;
    let dir = ctx.output_dir(args.output);
    let path = download_card(ctx, &record, args.template.into(), &dir).await?;
    println!("ID card downloaded to {}", path.display());
    Ok(())
}

fn delete(ctx: &AppContext, args: SavedDeleteArgs) -> Result<()> {
    let roll = &args.target.roll_number;
    let (name, created_at) = match args.created_at {
        Some(created_at) => (roll.clone(), created_at),
        None => {
            let record = ctx.saved(roll)?;
            (record.name, record.created_at)
        }
    };
    let before = ctx.store.list().len();
    ctx.store.delete(roll, &created_at);
    if ctx.store.list().len() < before {
        println!("ID card for {} has been removed", name);
    } else {
        println!("No saved ID card matched {} created at {}", roll, created_at);
    }
    Ok(())
}

fn payload(ctx: &AppContext, args: SavedRollArgs) -> Result<()> {
    let record = ctx.saved(&args.roll_number)?;
    println!("{}", ctx.pipeline.encode_for_scan(&record));
    Ok(())
}
