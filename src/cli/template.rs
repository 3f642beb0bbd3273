//! Template discovery commands (`unity-id template ...`).

use anyhow::Result;
use clap::Subcommand;
use unity_id::TemplateRegistry;

/// Template subcommands.
#[derive(Subcommand, Debug)]
pub enum TemplateCommand {
    /// List all card layouts.
    List,
}

/// Execute a template command.
pub fn handle(command: TemplateCommand) -> Result<()> {
    match command {
        TemplateCommand::List => list(),
    }
}

fn list() -> Result<()> {
    println!("Available templates:");
    for tpl in TemplateRegistry::list() {
        println!("  - {} ({}): {}", tpl.id, tpl.name, tpl.description);
    }
    Ok(())
}
