//! Vitrine CLI: local image compression and image slot maintenance.
//!
//! The `image-urls` commands talk to a running API; set VITRINE_API_URL
//! (or API_URL) or pass `--api-url`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use vitrine_cli::api_client::ApiClient;
use vitrine_cli::compress::compress_to_file;
use vitrine_cli::init_environment;
use vitrine_core::image_slots::PopulateMode;
use vitrine_core::CompressionConfig;
use vitrine_processing::ImageCompressor;

#[derive(Parser)]
#[command(name = "vitrine", about = "Vitrine media tools")]
struct Cli {
    /// API base URL, overrides VITRINE_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress an image locally with the configured settings
    Compress {
        /// Image to compress
        input: PathBuf,
        /// Output path (defaults to `<stem>.compressed.<ext>` next to the input)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage image URLs in content documents
    ImageUrls {
        #[command(subcommand)]
        sub: ImageUrlCommands,
    },
}

#[derive(Subcommand)]
enum ImageUrlCommands {
    /// List the URLs available for image slots
    List,
    /// Fill empty image slots from the asset pool
    Populate {
        #[arg(long)]
        dry_run: bool,
    },
    /// Overwrite every image slot from the asset pool
    ReplaceAll {
        #[arg(long)]
        dry_run: bool,
    },
    /// Show filled and empty image slots
    Report,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

fn warn_if_empty_pool(pool_size: usize) {
    if pool_size == 0 {
        tracing::warn!("No active assets in the gallery; nothing was populated");
    }
}

fn api_client(api_url: Option<&str>) -> anyhow::Result<ApiClient> {
    match api_url {
        Some(url) => ApiClient::new(url),
        None => ApiClient::from_env(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_environment(None);

    let cli = Cli::parse();

    match cli.command {
        Commands::Compress { input, output } => {
            let config =
                CompressionConfig::from_env().context("Invalid compression configuration")?;
            let compressor = ImageCompressor::new(config)?;
            let report = tokio::task::spawn_blocking(move || {
                compress_to_file(&compressor, &input, output.as_deref())
            })
            .await
            .context("Compression task failed")??;
            print_json(&report)?;
        }
        Commands::ImageUrls { sub } => {
            let client = api_client(cli.api_url.as_deref())?;
            tracing::debug!(api = %client.base_url(), "Using API");

            match sub {
                ImageUrlCommands::List => {
                    print_json(&client.image_url_pool().await?)?;
                }
                ImageUrlCommands::Populate { dry_run } => {
                    let outcome = client
                        .populate_image_urls(PopulateMode::FillEmpty, dry_run)
                        .await?;
                    warn_if_empty_pool(outcome.pool_size);
                    print_json(&outcome)?;
                }
                ImageUrlCommands::ReplaceAll { dry_run } => {
                    let outcome = client
                        .populate_image_urls(PopulateMode::ReplaceAll, dry_run)
                        .await?;
                    warn_if_empty_pool(outcome.pool_size);
                    print_json(&outcome)?;
                }
                ImageUrlCommands::Report => {
                    print_json(&client.image_slot_report().await?)?;
                }
            }
        }
    }

    Ok(())
}
