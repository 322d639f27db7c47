//! reel-sweeper CLI entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use reel_sweeper::cli::{inspect_cmd, sweep_cmd};
use reel_sweeper::FilterConfig;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "reel-sweeper",
    version,
    about = "Strip video players, embeds and Reels sections from web pages"
)]
struct Cli {
    /// Output machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Suppress summaries and info logs
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Remove videos from a saved HTML page and print the result
    Sweep {
        /// HTML file to process
        file: PathBuf,
        /// URL the page was served from
        #[arg(long)]
        url: String,
        /// Write the pruned page here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Show how a page URL (and optionally an iframe source) is classified
    Inspect {
        url: String,
        /// Iframe `src` to classify as if embedded on the page
        #[arg(long)]
        iframe_src: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Global flags reach the output helpers through the environment.
    if cli.json {
        std::env::set_var("REEL_SWEEPER_JSON", "1");
    }
    if cli.quiet {
        std::env::set_var("REEL_SWEEPER_QUIET", "1");
    }
    if cli.no_color {
        std::env::set_var("REEL_SWEEPER_NO_COLOR", "1");
    }

    init_tracing(cli.json, cli.quiet)?;

    match cli.command {
        Commands::Sweep { file, url, output } => {
            let config = FilterConfig::from_env();
            sweep_cmd::run(&file, &url, output.as_deref(), &config)
        }
        Commands::Inspect { url, iframe_src } => inspect_cmd::run(&url, iframe_src.as_deref()),
    }
}

fn init_tracing(json: bool, quiet: bool) -> Result<()> {
    let level = if quiet { "reel_sweeper=warn" } else { "reel_sweeper=info" };
    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.parse()?);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}
