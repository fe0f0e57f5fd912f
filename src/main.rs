//! Voicepool CLI
//!
//! Command-line interface for the voice-pool graph builder.

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use voicepool::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Voicepool v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd).await,
        None => {
            println!("Voicepool v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

async fn handle_command(cmd: Commands) -> anyhow::Result<()> {
    match cmd {
        Commands::Build {
            config,
            sample_rate,
            module_dir,
            json,
        } => commands::build(config.as_deref(), sample_rate, module_dir.as_deref(), json)
            .await
            .context("voice pool build failed"),
        Commands::RenderExcitation {
            out,
            seconds,
            sample_rate,
            seed,
        } => commands::render_excitation(&out, seconds, sample_rate, seed)
            .await
            .map(|_| ())
            .with_context(|| format!("cannot render excitation to {}", out.display())),
        Commands::ShowConfig => commands::show_config().context("cannot print options"),
    }
}
