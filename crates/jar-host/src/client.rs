//! The framed connection to the appliance.

use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use jar_proto::codec::{JarCodec, PeerOutbound};
use jar_proto::frame::PeerInbound;
use jar_proto::records::{CommandRecord, StatusCode, StatusRecord};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, warn};

pub struct JarClient {
    framed: Framed<TcpStream, JarCodec>,
}

impl JarClient {
    pub async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("failed to connect to {addr}"))?;
        info!(%addr, "connected");
        Ok(Self {
            framed: Framed::new(stream, JarCodec::new()),
        })
    }

    /// Uploads the compiled recipe, one slot per frame.
    pub async fn upload(&mut self, records: &[CommandRecord]) -> Result<()> {
        for record in records {
            debug!(?record, "sending slot");
            self.framed.send(PeerOutbound::Command(*record)).await?;
        }
        info!(slots = records.len(), "recipe uploaded");
        Ok(())
    }

    /// Receives status notifications, acknowledging each, until the
    /// connection closes. Returns on a latched fault if `stop_on_fault`.
    pub async fn monitor(&mut self, stop_on_fault: bool) -> Result<()> {
        while let Some(item) = self.framed.next().await {
            match item {
                Ok(PeerInbound::Status(status)) => {
                    self.framed.send(PeerOutbound::Ack).await?;
                    print_status(&status);
                    if stop_on_fault && status.code < 0 {
                        anyhow::bail!("appliance latched fault {}", status.code);
                    }
                }
                Ok(PeerInbound::RebootRequest) => {
                    // Play the wireless module: come straight back up.
                    warn!("appliance rebooted the wireless module");
                    self.framed.send(PeerOutbound::Ready).await?;
                }
                Ok(PeerInbound::Ignored) => {}
                Err(e) => warn!("ignoring undecodable line: {e}"),
            }
        }
        Ok(())
    }
}

fn print_status(status: &StatusRecord) {
    let temperature = status.temperature as f32 / 256.0;
    let remain = if status.remain_time & 0x8000 != 0 {
        format!("{} min", status.remain_time & 0x7FFF)
    } else {
        format!("{} s", status.remain_time)
    };
    let state = match StatusCode::from_raw(status.code) {
        Some(StatusCode::Standby) => "standby".to_string(),
        Some(StatusCode::Cooking) => "cooking".to_string(),
        Some(code) => format!("FAULT {:?} ({})", code, status.code),
        None => format!("code {}", status.code),
    };
    println!(
        "[{state}] slot {}/{}  power {:>3}%  {temperature:6.2} °C  remaining {remain}",
        status.cmdid, status.cmdnum, status.power
    );
}
