use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod ledger;
mod logging;
mod models;
mod naming;
mod pacing;
mod scanner;
mod services;

use config::{AppConfig, ConfigError};
use pacing::TokioPacer;
use scanner::{Confirmer, Renamer, StdinConfirmer};
use services::plex::PlexClient;
use services::youtube::YouTubeClient;

/// Rename downloaded YouTube videos to their titles
#[derive(Debug, Parser)]
#[command(name = "tube-renamer", version, about)]
struct Args {
    /// Config file (TOML, or JSON by extension)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ask before renaming or copying each file
    #[arg(short, long)]
    interactive: bool,

    /// Verbose logging to the console and the run log
    #[arg(short, long)]
    debug: bool,

    /// Write a default config file and exit
    #[arg(short, long)]
    setup: bool,

    /// Show what would change without touching any file
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Load .env file if present
    dotenvy::dotenv().ok();

    if args.setup {
        return setup(args.config);
    }

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            if matches!(e, ConfigError::NotFound(_)) {
                eprintln!("Run with --setup to create a default config file.");
            }
            return ExitCode::from(1);
        }
    };

    if let Err(e) = logging::init_logging(&config.log_file_path, args.debug) {
        eprintln!("Warning: {:#}", e);
    }

    tracing::info!("Starting YouTube title renaming process");
    config.log_config();
    if args.dry_run {
        println!("Dry run: no files will be changed.");
    }

    let youtube = YouTubeClient::new();
    let pacer = TokioPacer;
    let confirmer = StdinConfirmer;
    let plex = config
        .rescan
        .credentials()
        .map(|(token, section)| PlexClient::new(&config.rescan.plex_url, token, section));

    let mut renamer = Renamer::new(&config, &youtube, &pacer).dry_run(args.dry_run);
    if let Some(plex) = plex.as_ref() {
        renamer = renamer.with_notifier(plex);
    }
    if args.interactive {
        renamer = renamer.with_confirmer(&confirmer);
    }

    let result = renamer.run().await;

    tracing::info!(
        "Run complete: {} found, {} placed, {} already processed, {} without title, {} declined, {} failed",
        result.discovered,
        result.placed,
        result.already_processed,
        result.lookup_failed,
        result.declined,
        result.failed
    );
    println!("\nYouTube title renaming process completed.");

    ExitCode::SUCCESS
}

/// `--setup`: write the default config, asking before replacing one
fn setup(explicit: Option<PathBuf>) -> ExitCode {
    let path = config::resolve_config_path(explicit.as_deref());

    if path.exists() {
        let prompt = format!("Config file {} already exists. Overwrite?", path.display());
        if !StdinConfirmer.confirm(&prompt) {
            println!("Keeping existing config file.");
            return ExitCode::SUCCESS;
        }
    }

    match config::write_default_config(&path) {
        Ok(()) => {
            println!("Default configuration written to {}", path.display());
            println!("Edit directory_paths and the Plex settings before the first run.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: failed to write {}: {:#}", path.display(), e);
            ExitCode::from(1)
        }
    }
}
