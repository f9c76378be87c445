//! The line grammar for both directions of the link.
//!
//! Inbound (peer → appliance): `WV,<service>,<16 hex>[.]` command frames plus
//! the three literal response prefixes from the wireless module. Outbound
//! (appliance → peer): `SHW,001D,<16 hex>` status notifications and the
//! module reboot request `R,1`.
//!
//! The upstream protocol is inconsistent about the `.` terminator after the
//! hex payload, so it is accepted but not required; end-of-line terminates a
//! frame equally well.

use crate::hex;
use crate::records::{CommandRecord, StatusRecord};
use crate::FrameError;
use nom::bytes::complete::{tag, take, take_while_m_n};
use nom::character::is_hex_digit;
use nom::combinator::{eof, opt};
use nom::IResult;

/// Service id of the command-load service.
pub const COMMAND_SERVICE: &[u8] = b"001B";
/// Service id of the status-notification service.
pub const STATUS_SERVICE: &[u8] = b"001D";

/// Module reboot request, sent verbatim.
pub const REBOOT_LINE: &[u8] = b"R,1\n";
/// Positive acknowledgement line.
pub const ACK_LINE: &[u8] = b"AOK\n";
/// Negative acknowledgement line.
pub const NAK_LINE: &[u8] = b"ERR\n";
/// Module command-mode prompt after a reboot.
pub const READY_LINE: &[u8] = b"CMD\n";

/// Longest response line the module is expected to produce.
const MAX_RESPONSE_LEN: usize = 8;

/// A line as seen by the appliance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inbound {
    /// A decoded command-service frame.
    Command(CommandRecord),
    /// `AOK` — the peer acknowledged the last notification.
    Ack,
    /// `ERR` — the peer rejected the last notification.
    Nak,
    /// `CMD` — the wireless module entered command mode.
    Ready,
    /// Anything unrecognized; dropped without effect.
    Ignored,
}

/// A line as seen by the peer (host tooling, simulator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerInbound {
    /// A decoded status notification.
    Status(StatusRecord),
    /// The appliance asked the wireless module to reboot.
    RebootRequest,
    /// Anything unrecognized; dropped without effect.
    Ignored,
}

fn framed_payload<'a>(prefix: &'static str) -> impl Fn(&'a [u8]) -> IResult<&'a [u8], (&'a [u8], &'a [u8])> {
    move |i: &'a [u8]| {
        let (i, _) = tag(prefix)(i)?;
        let (i, service) = take(4usize)(i)?;
        let (i, _) = tag(",")(i)?;
        let (i, digits) = take_while_m_n(16, 16, is_hex_digit)(i)?;
        let (i, _) = opt(tag("."))(i)?;
        let (i, _) = eof(i)?;
        Ok((i, (service, digits)))
    }
}

/// Parses a complete line arriving at the appliance.
///
/// A malformed `WV` frame is an error (the caller latches a status code); a
/// line that is neither a `WV` frame nor a recognized response is `Ignored`.
pub fn parse_line(line: &[u8]) -> Result<Inbound, FrameError> {
    if line.starts_with(b"WV,") {
        let (_, (service, digits)) =
            framed_payload("WV,")(line).map_err(|_| FrameError::Malformed)?;
        if service != COMMAND_SERVICE {
            return Err(FrameError::UnknownService);
        }
        let bytes = hex::decode8(digits)?;
        return Ok(Inbound::Command(CommandRecord::decode(bytes)));
    }
    if line.len() > MAX_RESPONSE_LEN {
        return Ok(Inbound::Ignored);
    }
    if line.starts_with(b"AOK") {
        Ok(Inbound::Ack)
    } else if line.starts_with(b"ERR") {
        Ok(Inbound::Nak)
    } else if line.starts_with(b"CMD") {
        Ok(Inbound::Ready)
    } else {
        Ok(Inbound::Ignored)
    }
}

/// Parses a complete line arriving at the peer.
pub fn parse_peer_line(line: &[u8]) -> Result<PeerInbound, FrameError> {
    if line.starts_with(b"SHW,") {
        let (_, (service, digits)) =
            framed_payload("SHW,")(line).map_err(|_| FrameError::Malformed)?;
        if service != STATUS_SERVICE {
            return Err(FrameError::UnknownService);
        }
        let bytes = hex::decode8(digits)?;
        return Ok(PeerInbound::Status(StatusRecord::decode(bytes)));
    }
    if line == b"R,1" {
        return Ok(PeerInbound::RebootRequest);
    }
    Ok(PeerInbound::Ignored)
}

/// Builds an outbound status notification line, terminator included.
pub fn status_line(record: &StatusRecord) -> heapless::Vec<u8, 28> {
    let mut out = heapless::Vec::new();
    let _ = out.extend_from_slice(b"SHW,");
    let _ = out.extend_from_slice(STATUS_SERVICE);
    let _ = out.extend_from_slice(b",");
    let _ = out.extend_from_slice(&hex::encode8(&record.encode()));
    let _ = out.extend_from_slice(b"\n");
    out
}

/// Builds a command-load line for the peer side, terminator included.
pub fn command_line(record: &CommandRecord) -> heapless::Vec<u8, 28> {
    let mut out = heapless::Vec::new();
    let _ = out.extend_from_slice(b"WV,");
    let _ = out.extend_from_slice(COMMAND_SERVICE);
    let _ = out.extend_from_slice(b",");
    let _ = out.extend_from_slice(&hex::encode8(&record.encode()));
    let _ = out.extend_from_slice(b".\n");
    out
}
