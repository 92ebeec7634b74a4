use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use gesturekey::{utils::{config::Config, logging}, Application, GestureSample};
use tracing::{info, error};
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "gesturekey", version, about = "Gesture authentication toolkit")]
struct Cli {
    /// Configuration file; defaults to config/default plus GESTURE__* overrides
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print complexity, security score and recommendations for a sample
    Analyze { sample: PathBuf },
    /// Enroll one sample for a throwaway identity and authenticate another against it
    Verify { template: PathBuf, attempt: PathBuf },
}

fn read_sample(path: &Path) -> anyhow::Result<GestureSample> {
    let raw = std::fs::read(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_slice(&raw)
        .with_context(|| format!("{} is not a gesture sample", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::from_file(path),
        None => Config::new(),
    }
    .context("Failed to load configuration")?;

    let _log_guard = logging::init(&config.logging)?;
    info!("Starting gesturekey v{}", env!("CARGO_PKG_VERSION"));

    let app = Application::new(config).map_err(|e| {
        error!("Failed to initialize application: {}", e);
        e
    })?;
    let service = app.auth_service();

    match cli.command {
        Command::Analyze { sample } => {
            let sample = read_sample(&sample)?;
            let insights = service.analyze_for_insights(&sample)?;
            println!("{}", serde_json::to_string_pretty(&insights)?);
        }
        Command::Verify { template, attempt } => {
            let identity = Uuid::new_v4();
            let summary = service
                .register_template(identity, read_sample(&template)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&summary)?);

            match service.validate_live(identity, read_sample(&attempt)?).await {
                Ok(decision) => println!("{}", serde_json::to_string_pretty(&decision)?),
                Err(e) => {
                    error!("Attempt rejected: {}", e);
                    println!("rejected: {}", e);
                }
            }
        }
    }

    Ok(())
}
