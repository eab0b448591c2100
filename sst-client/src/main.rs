//! SimpleStamp command-line client

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sha2::{Digest as _, Sha256};
use sst_client::{CalendarClient, CalendarConfig, StampStorage};
use sst_core::Timestamp;
use sst_types::Digest;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser)]
#[command(name = "sst")]
#[command(about = "SimpleStamp blockchain timestamp client", long_about = None)]
struct Cli {
    /// Storage directory
    #[arg(short = 'd', long, default_value = ".sst")]
    storage_dir: PathBuf,

    /// Calendar configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Timestamp a file
    Stamp {
        /// File to timestamp
        file: PathBuf,

        /// Source description mixed into the digest hash
        #[arg(long)]
        source: Option<String>,

        /// Calendar URL (repeatable, replaces the configured calendars)
        #[arg(long = "calendar")]
        calendars: Vec<String>,
    },

    /// Upgrade pending attestations
    Update {
        /// Digest in hex format (defaults to every stored timestamp)
        digest: Option<String>,
    },

    /// Show details of a timestamp
    Show {
        /// Digest in hex format
        digest: String,
    },

    /// List all stored timestamps
    List,

    /// Export a timestamp's binary record
    Export {
        /// Digest in hex format
        digest: String,

        /// Output file (hex to stdout otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a binary record
    Import {
        /// Input file
        file: PathBuf,
    },
}

fn load_config(cli: &Cli) -> Result<CalendarConfig> {
    match &cli.config {
        Some(path) => Ok(CalendarConfig::from_file(path)?),
        None => Ok(CalendarConfig::default().with_env()),
    }
}

fn load(storage: &StampStorage, digest: &str) -> Result<(Digest, Timestamp)> {
    let digest = Digest::from_hex(digest)?;
    let timestamp = storage
        .get(&digest)?
        .ok_or_else(|| anyhow::anyhow!("No timestamp found for digest: {}", digest))?;
    Ok((digest, timestamp))
}

fn status_summary(timestamp: &Timestamp) -> String {
    let pending = timestamp.pending().count();
    let total = timestamp.attestations().len();
    format!("{} attestation(s), {} pending", total, pending)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .init();

    let storage = StampStorage::open(&cli.storage_dir)?;

    match &cli.command {
        Commands::Stamp {
            file,
            source,
            calendars,
        } => {
            let data = std::fs::read(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let hash = Sha256::digest(&data);

            let mut timestamp = Timestamp::new(&hash)?;
            if let Some(source) = source {
                timestamp.set_source(source.clone());
            }

            let client = CalendarClient::new(load_config(&cli)?)?;
            let stamps = if calendars.is_empty() {
                client.stamp(&mut timestamp).await
            } else {
                client.stamp_urls(&mut timestamp, calendars).await
            };

            if stamps == 0 {
                bail!("No calendar accepted the digest for {}", file.display());
            }

            let digest = storage.store(&timestamp)?;
            println!("Timestamp submitted to {} calendar(s)", stamps);
            println!("Digest: {}", digest);
            println!("Hash:   {}", hex::encode(hash));
        }

        Commands::Update { digest } => {
            let targets = match digest {
                Some(digest) => vec![load(&storage, digest)?],
                None => storage.list()?,
            };

            let client = CalendarClient::new(load_config(&cli)?)?;
            let mut upgraded = 0;

            for (digest, mut timestamp) in targets {
                if !timestamp.has_pending() {
                    continue;
                }
                if client.update(&mut timestamp).await {
                    storage.store(&timestamp)?;
                    upgraded += 1;
                }
                println!("{}  {}", digest, status_summary(&timestamp));
            }

            println!("Upgraded {} timestamp(s)", upgraded);
        }

        Commands::Show { digest } => {
            let digest = Digest::from_hex(digest)?;
            println!("{}", storage.export_json(&digest)?);
        }

        Commands::List => {
            let timestamps = storage.list()?;

            if timestamps.is_empty() {
                println!("No stored timestamps");
            } else {
                println!("Stored timestamps ({})", timestamps.len());
                println!();
                for (digest, timestamp) in timestamps {
                    println!("Digest:  {}", digest);
                    println!("Hash:    {}", hex::encode(timestamp.hash()));
                    if !timestamp.source().is_empty() {
                        println!("Source:  {}", timestamp.source());
                    }
                    println!("Status:  {}", status_summary(&timestamp));
                    println!();
                }
            }
        }

        Commands::Export { digest, output } => {
            let (_, timestamp) = load(&storage, digest)?;
            let bytes = timestamp.to_bytes();

            if let Some(output_path) = output {
                std::fs::write(output_path, bytes)?;
                println!("Timestamp exported to {}", output_path.display());
            } else {
                println!("{}", hex::encode(bytes));
            }
        }

        Commands::Import { file } => {
            let bytes = std::fs::read(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let digest = storage.import_bytes(&bytes)?;

            println!("Timestamp imported successfully");
            println!("Digest: {}", digest);
        }
    }

    Ok(())
}
