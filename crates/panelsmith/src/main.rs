//! Panelsmith CLI binary.
//!
//! - Migrate stored legacy shot prompts to the storyboard grid format
//! - Recover the JSON value from a saved model reply

use clap::Parser;
use panelsmith::{LogFormat, init_tracing};

mod cli;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    use cli::{Cli, Commands, handle_extract, handle_migrate};

    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let directive = if cli.verbose { "debug" } else { "info" };
    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(directive, format)?;

    match cli.command {
        Commands::MigrateShotPrompts(args) => {
            handle_migrate(args.options()).await?;
        }
        Commands::Extract { file, expect } => {
            handle_extract(file.as_deref(), expect)?;
        }
    }

    Ok(())
}
