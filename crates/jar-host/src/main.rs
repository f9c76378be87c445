//! # jarctl
//!
//! Host-side tooling for the heat jar: compiles a plain-text recipe into
//! program slots, uploads it over the framed wireless link and (optionally)
//! stays attached to watch and acknowledge status notifications.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

mod client;
mod recipe;

use client::JarClient;

/// Host tooling for the heat-jar appliance.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a recipe and load it into the appliance's program slots.
    Upload(UploadArgs),
    /// Watch status notifications and acknowledge them.
    Monitor(MonitorArgs),
}

#[derive(Parser, Debug)]
struct UploadArgs {
    /// Appliance address (e.g. a virtual-jar socket).
    #[arg(short, long, default_value = "127.0.0.1:4070")]
    addr: String,

    /// Path to the recipe file.
    recipe: PathBuf,

    /// Stay attached after the upload and monitor progress.
    #[arg(long)]
    monitor: bool,
}

#[derive(Parser, Debug)]
struct MonitorArgs {
    /// Appliance address (e.g. a virtual-jar socket).
    #[arg(short, long, default_value = "127.0.0.1:4070")]
    addr: String,

    /// Exit with an error as soon as the appliance latches a fault.
    #[arg(long)]
    stop_on_fault: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Upload(args) => upload(args).await,
        Commands::Monitor(args) => monitor(args).await,
    }
}

async fn upload(args: UploadArgs) -> Result<()> {
    let text = std::fs::read_to_string(&args.recipe)
        .with_context(|| format!("failed to read recipe {:?}", args.recipe))?;
    let records = recipe::compile(&text)?;
    info!(steps = records.len(), "recipe compiled");

    let mut client = JarClient::connect(&args.addr).await?;
    client.upload(&records).await?;

    if args.monitor {
        client.monitor(false).await?;
    }
    Ok(())
}

async fn monitor(args: MonitorArgs) -> Result<()> {
    let mut client = JarClient::connect(&args.addr).await?;
    client.monitor(args.stop_on_fault).await
}
