//! Darkroom CLI - batch derivative generator for photo galleries.
//!
//! Darkroom reads `<assets>/source/*.jpg`, writes resized variants under
//! `<assets>/_generated/<variant>/`, and a capture-time manifest at
//! `<assets>/_generated/metas.json`.
//!
//! # Usage
//!
//! ```bash
//! # Process ./assets with defaults
//! darkroom
//!
//! # Another assets directory, higher quality, 8 workers
//! darkroom -a ~/site/assets -q 92 -p 8
//!
//! # Photos shot in another timezone
//! darkroom --utc-offset -05:00
//! ```

use clap::Parser;

mod cli;
mod logging;

/// Darkroom - resized photo variants plus a manifest sorted by capture time.
#[derive(Parser, Debug)]
#[command(name = "darkroom")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json_logs: bool,

    #[command(flatten)]
    run: cli::RunArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go through eprintln.
    let config = cli::load_config(cli.run.config.as_deref())?;
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Darkroom v{}", darkroom_core::VERSION);

    cli::execute(cli.run, config).await
}
