//! Command-line interface wiring for the `unity-id` binary.
//!
//! This module owns the clap definitions and delegates execution to
//! specialized submodules that encapsulate each command family.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use unity_id::Settings;

pub mod card;
pub mod common;
pub mod saved;
pub mod template;
pub mod utils;

/// Parsed CLI entrypoint for the `unity-id` binary.
#[derive(Parser, Debug)]
#[command(name = "unity-id", version, about = "Student ID card generator")]
pub struct Cli {
    /// JSON settings file (branding, directories).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory holding saved cards; overrides the settings file.
    #[arg(long = "data-dir", env = "UNITY_ID_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,
    /// Log debug detail to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,
    /// Top-level command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// High-level command families made available to end users.
#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Card(card::CardCommand),
    #[command(subcommand)]
    Saved(saved::SavedCommand),
    #[command(subcommand)]
    Template(template::TemplateCommand),
}

/// Execute the requested command.
pub async fn run(cli: Cli) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(dir) = cli.data_dir {
        settings.data_dir = dir;
    }
    let ctx = utils::AppContext::new(settings);
    match cli.command {
        Command::Card(cmd) => card::handle(&ctx, cmd).await,
        Command::Saved(cmd) => saved::handle(&ctx, cmd).await,
        Command::Template(cmd) => template::handle(cmd),
    }
}
