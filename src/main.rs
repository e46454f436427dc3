use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tagsentry::{Config, NotifyEngine, NotifyOutcome};

#[derive(Parser)]
#[command(name = "tagsentry")]
#[command(about = "Release tag notification service for tracked GitHub repositories")]
#[command(version)]
struct Cli {
    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    info!("Starting TagSentry v{}", env!("CARGO_PKG_VERSION"));

    // Missing configuration is fatal: no partial processing without credentials
    let config = load_config(cli.config)?;

    let engine = NotifyEngine::new(&config)?;
    let summary = engine.run().await?;

    println!("\n📣 Notification run complete");
    println!("   📊 Repositories tracked: {}", summary.total_repositories);
    println!("   ✉️  Notified: {}", summary.notified);
    println!("   ✅ Up to date: {}", summary.up_to_date);
    println!("   ❌ Failed: {}", summary.failed);

    if summary.failed > 0 {
        println!("\n🔍 Failures (state left unchanged, will retry next run):");
        for outcome in &summary.outcomes {
            match outcome {
                NotifyOutcome::LoadFailed { path, error }
                | NotifyOutcome::FetchFailed { path, error }
                | NotifyOutcome::CommitFailed { path, error } => {
                    println!("   ❌ {}: {}", path.display(), error);
                }
                NotifyOutcome::CampaignFailed { path, stage, error } => {
                    println!("   ❌ {} [{}]: {}", path.display(), stage.as_str(), error);
                }
                NotifyOutcome::Notified { .. } | NotifyOutcome::UpToDate { .. } => {}
            }
        }
    }

    // Per-repository failures are recoverable; only configuration errors
    // abort the process with a non-zero exit.
    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<std::path::PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(&path),
        None => Config::load_default(),
    }
}
