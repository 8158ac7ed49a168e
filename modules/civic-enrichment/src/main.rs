use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use civic_common::{Config, Coordinates};
use civic_enrichment::{pipeline, SummaryRequest};

#[derive(Parser)]
#[command(name = "civic-enrich", about = "Enrich civic issue reports with location, classification and narrative")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline on one photo
    Enrich {
        #[arg(long)]
        image: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
        /// Device-reported accuracy in meters
        #[arg(long)]
        accuracy: Option<f64>,
        /// MIME type of the image (guessed from the extension when omitted)
        #[arg(long)]
        mime: Option<String>,
        /// Also produce a municipal report summary
        #[arg(long)]
        summary: bool,
    },
    /// Reverse-geocode coordinates and show every provider attempt
    Reverse {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
    /// Forward-geocode an address
    Geocode { address: String },
    /// Guess the current position from the network origin
    Locate,
}

fn guess_mime(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("civic_enrichment=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::from_env()?;
    config.log_redacted();

    let orchestrator = pipeline::from_config(&config)?;

    match cli.command {
        Command::Enrich {
            image,
            lat,
            lng,
            accuracy,
            mime,
            summary,
        } => {
            let bytes = tokio::fs::read(&image)
                .await
                .with_context(|| format!("reading {}", image.display()))?;
            let mime = mime.unwrap_or_else(|| guess_mime(&image).to_string());
            let mut coords = Coordinates::new(lat, lng);
            if let Some(meters) = accuracy {
                coords = coords.with_accuracy(meters);
            }

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupted, cancelling enrichment");
                    on_interrupt.cancel();
                }
            });

            info!(image = %image.display(), bytes = bytes.len(), mime = mime.as_str(), "Enriching");
            let result = orchestrator.enrich(&bytes, &mime, &coords, &cancel).await?;

            if summary {
                let request = SummaryRequest {
                    category: result.classification.category.clone(),
                    location: result.location.formatted_address.clone(),
                    image_count: 1,
                    narrative: Some(result.narrative.clone()),
                };
                let summary = orchestrator.narrative().summarize(&request).await;
                print_json(&json!({ "result": result, "summary": summary }))?;
            } else {
                print_json(&result)?;
            }
        }
        Command::Reverse { lat, lng } => {
            let (location, attempts) = orchestrator
                .location()
                .resolve_with_attempts(&Coordinates::new(lat, lng))
                .await;
            print_json(&json!({ "location": location, "attempts": attempts }))?;
        }
        Command::Geocode { address } => {
            print_json(&orchestrator.location().geocode(&address).await)?;
        }
        Command::Locate => {
            print_json(&orchestrator.location().detect_position().await)?;
        }
    }

    Ok(())
}
