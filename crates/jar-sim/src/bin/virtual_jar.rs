//! # Virtual Jar
//!
//! Runs the control kernel against the simulated plant in (scaled) real time
//! and exposes the wireless line protocol on a TCP socket, so host tooling
//! talks to an appliance that only exists in memory:
//!
//! ```text
//! virtual-jar --listen 127.0.0.1:4070
//! jarctl upload --addr 127.0.0.1:4070 recipe.txt --monitor
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use configparser::ini::Ini;
use jar_kernel::KernelConfig;
use jar_sim::{HarnessOptions, JarHarness, JarPlant, PeerMode};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{info, warn};

/// A simulated heat-jar appliance on a TCP socket.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to listen on for the peer connection.
    #[arg(short, long, default_value = "127.0.0.1:4070")]
    listen: String,

    /// Optional INI file overriding the stock deployment constants.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Simulated microseconds per wall-clock millisecond (1000 = real time).
    #[arg(long, default_value_t = 1000)]
    speedup: u64,

    /// Ambient temperature the vessel starts at, °C.
    #[arg(long, default_value_t = 25.0)]
    ambient: f64,

    /// Write the protocol trace to this JSON file on disconnect.
    #[arg(long)]
    trace: Option<PathBuf>,
}

/// Overlays an INI file onto the stock kernel configuration.
fn load_config(path: Option<&PathBuf>) -> Result<KernelConfig> {
    let mut cfg = KernelConfig::default();
    let Some(path) = path else {
        return Ok(cfg);
    };

    let mut ini = Ini::new();
    ini.load(path)
        .map_err(|e| anyhow::anyhow!(e))
        .with_context(|| format!("failed to load configuration file: {path:?}"))?;

    if let Ok(Some(b)) = ini.getfloat("thermistor", "b") {
        cfg.thermistor.b = b as f32;
    }
    if let Ok(Some(r0)) = ini.getfloat("thermistor", "r0") {
        cfg.thermistor.r0 = r0 as f32;
    }
    if let Ok(Some(t0)) = ini.getfloat("thermistor", "t0") {
        cfg.thermistor.t0 = t0 as f32;
    }
    if let Ok(Some(half)) = ini.getuint("mains", "half_cycle_us") {
        cfg.pinned_half_cycle_us = Some(half as u32);
    }
    if let Ok(Some(period)) = ini.getuint("link", "publish_ms") {
        cfg.publish_period_us = period.clamp(1_000, 5_000) * 1_000;
    }
    if let Ok(Some(limit)) = ini.getfloat("safety", "max_temp_c") {
        cfg.max_temp_c = limit as f32;
    }
    Ok(cfg)
}

fn fresh_harness(cfg: KernelConfig, ambient: f64) -> JarHarness {
    JarHarness::new(HarnessOptions {
        config: cfg,
        zero_cross_period_us: Some(10_000),
        poll_period_us: 1_000,
        peer: PeerMode::External,
        plant: Some(JarPlant::new(ambient)),
        adc_jitter: true,
        ..Default::default()
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_ref())?;

    let listener = TcpListener::bind(&cli.listen)
        .await
        .with_context(|| format!("failed to bind {}", cli.listen))?;
    info!(listen = %cli.listen, speedup = cli.speedup, "virtual jar ready");

    loop {
        let (socket, peer) = listener.accept().await?;
        info!(%peer, "peer connected; powering the jar");
        match serve(socket, &cli, cfg).await {
            Ok(()) => info!(%peer, "peer disconnected; jar powered down"),
            Err(e) => warn!(%peer, "session ended: {e:#}"),
        }
    }
}

/// One powered-on life of the jar, ending with the connection.
async fn serve(socket: tokio::net::TcpStream, cli: &Cli, cfg: KernelConfig) -> Result<()> {
    let mut jar = fresh_harness(cfg, cli.ambient);
    let (mut reader, mut writer) = socket.into_split();
    let mut ticker = tokio::time::interval(Duration::from_millis(1));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut buf = [0u8; 256];

    let result = loop {
        tokio::select! {
            _ = ticker.tick() => {
                jar.run_for(cli.speedup);
                let out = jar.link.take_raw_output();
                if !out.is_empty() {
                    if let Err(e) = writer.write_all(&out).await {
                        break Err(e.into());
                    }
                }
            }
            read = reader.read(&mut buf) => {
                match read {
                    Ok(0) => break Ok(()),
                    Ok(n) => jar.link.push_to_device(&buf[..n]),
                    Err(e) => break Err(e.into()),
                }
            }
        }
    };

    if let Some(path) = &cli.trace {
        jar.link.dump_trace(path)?;
        info!(path = %path.display(), "protocol trace written");
    }
    result
}
