//! wikitext CLI - wiki markup renderer.
//!
//! Provides commands for:
//! - `render`: Render a markup file to HTML or JSON
//! - `links`: List internal links and categories of a markup file

mod commands;
mod error;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{LinksArgs, RenderArgs};
use output::Output;

/// wikitext - wiki markup renderer.
#[derive(Parser)]
#[command(name = "wikitext", version, about)]
struct Cli {
    /// Path to configuration file (default: auto-discover wikitext.toml).
    #[arg(short, long, global = true, env = "WIKITEXT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose output (render statistics and rule tracing).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a markup file.
    Render(RenderArgs),
    /// List internal links and categories of a markup file.
    Links(LinksArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables DEBUG level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    let result = match cli.command {
        Commands::Render(args) => args.execute(config_path),
        Commands::Links(args) => args.execute(config_path),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
