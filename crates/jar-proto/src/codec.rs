//! Peer-side framing for async transports.
//!
//! Host tooling and the simulator talk to the appliance over a stream
//! transport; this codec splits it into protocol lines and maps them through
//! [`frame::parse_peer_line`].

use crate::frame::{self, PeerInbound};
use crate::records::CommandRecord;
use crate::FrameError;
use bytes::{BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Errors from the peer-side codec.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("I/O error")]
    Io(#[from] std::io::Error),
    #[error("frame error: {0}")]
    Frame(FrameError),
}

/// Lines the peer sends toward the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerOutbound {
    /// A command-load frame for the given record.
    Command(CommandRecord),
    /// Acknowledge the last status notification.
    Ack,
    /// Reject the last status notification.
    Nak,
    /// The module's command-mode prompt (the reply to `R,1`).
    Ready,
}

/// A `tokio-util` codec for the peer side of the wireless link.
#[derive(Debug, Default)]
pub struct JarCodec;

impl JarCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Decoder for JarCodec {
    type Item = PeerInbound;
    type Error = CodecError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let Some(pos) = src.iter().position(|&b| b == b'\n') else {
            return Ok(None);
        };
        let line = src.split_to(pos + 1);
        let mut payload = &line[..pos];
        if payload.ends_with(b"\r") {
            payload = &payload[..payload.len() - 1];
        }
        frame::parse_peer_line(payload)
            .map(Some)
            .map_err(CodecError::Frame)
    }
}

impl Encoder<PeerOutbound> for JarCodec {
    type Error = CodecError;

    fn encode(&mut self, item: PeerOutbound, dst: &mut BytesMut) -> Result<(), Self::Error> {
        match item {
            PeerOutbound::Command(record) => dst.put_slice(&frame::command_line(&record)),
            PeerOutbound::Ack => dst.put_slice(frame::ACK_LINE),
            PeerOutbound::Nak => dst.put_slice(frame::NAK_LINE),
            PeerOutbound::Ready => dst.put_slice(frame::READY_LINE),
        }
        Ok(())
    }
}
