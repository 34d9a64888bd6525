//! UGC CLI - Workshop item uploader.
//!
//! Provides commands for:
//! - `update`: Create or update a workshop item and submit the change
//! - `languages`: List the language codes accepted by `update --language`

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{LanguagesArgs, UpdateArgs};
use output::Output;

/// UGC - Workshop item uploader.
#[derive(Parser)]
#[command(name = "ugc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a workshop item.
    Update(UpdateArgs),
    /// List supported language codes.
    Languages(LanguagesArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Update(args) if args.verbose);

    // --verbose enables DEBUG, otherwise use RUST_LOG or default to INFO
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Update(args) => args.execute(),
        Commands::Languages(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
