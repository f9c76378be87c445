//! The simulated wireless peer.
//!
//! Implements the appliance side's `SerialLink` over in-memory queues and
//! plays the peer according to a script: acknowledge, reject or drop status
//! notifications, and answer (or ignore) module reboots. Every line in either
//! direction lands in a timestamped trace that can be dumped as JSON for
//! inspection.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write as _;
use std::path::Path;
use std::rc::Rc;

use anyhow::Result;
use jar_kernel::hal::SerialLink;
use jar_proto::frame::{self, PeerInbound};
use jar_proto::records::StatusRecord;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::SimClock;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceDirection {
    DeviceToPeer,
    PeerToDevice,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TraceEntry {
    pub t_us: u64,
    pub direction: TraceDirection,
    pub line: String,
}

/// What the scripted peer does with traffic.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptedPeer {
    /// Leave this many status notifications unanswered before behaving.
    pub drop_acks: usize,
    /// Reply `ERR` to this many status notifications before behaving.
    pub nak_acks: usize,
    /// Leave this many `R,1` requests unanswered before behaving.
    pub drop_reboots: usize,
}

#[derive(Debug, Clone, Copy)]
pub enum PeerMode {
    /// The built-in peer automaton answers per script.
    Scripted(ScriptedPeer),
    /// Nothing answers; an external consumer drains the raw output
    /// (the `virtual-jar` socket bridge).
    External,
}

impl Default for PeerMode {
    fn default() -> Self {
        PeerMode::Scripted(ScriptedPeer::default())
    }
}

#[derive(Debug)]
struct LinkInner {
    mode: PeerMode,
    to_device: VecDeque<u8>,
    device_line: Vec<u8>,
    raw_output: Vec<u8>,
    statuses: Vec<(u64, StatusRecord)>,
    reboot_requests: u32,
    trace: Vec<TraceEntry>,
}

/// The appliance-facing link plus the peer behind it.
#[derive(Debug, Clone)]
pub struct SimLink {
    clock: SimClock,
    inner: Rc<RefCell<LinkInner>>,
}

impl SimLink {
    pub fn new(clock: SimClock, mode: PeerMode) -> Self {
        Self {
            clock,
            inner: Rc::new(RefCell::new(LinkInner {
                mode,
                to_device: VecDeque::new(),
                device_line: Vec::new(),
                raw_output: Vec::new(),
                statuses: Vec::new(),
                reboot_requests: 0,
                trace: Vec::new(),
            })),
        }
    }

    /// Queues bytes for the appliance to read, as the peer would send them.
    pub fn push_to_device(&self, bytes: &[u8]) {
        let now = self.clock.now_us();
        let mut inner = self.inner.borrow_mut();
        inner.trace.push(TraceEntry {
            t_us: now,
            direction: TraceDirection::PeerToDevice,
            line: String::from_utf8_lossy(bytes).trim_end().to_string(),
        });
        inner.to_device.extend(bytes);
    }

    /// Drains the raw appliance output (external-peer mode).
    pub fn take_raw_output(&self) -> Vec<u8> {
        core::mem::take(&mut self.inner.borrow_mut().raw_output)
    }

    /// Every status notification the peer has received, with sim timestamps.
    pub fn statuses(&self) -> Vec<(u64, StatusRecord)> {
        self.inner.borrow().statuses.clone()
    }

    pub fn reboot_requests(&self) -> u32 {
        self.inner.borrow().reboot_requests
    }

    pub fn trace(&self) -> Vec<TraceEntry> {
        self.inner.borrow().trace.clone()
    }

    /// Dumps the recorded trace to a JSON file.
    pub fn dump_trace(&self, path: &Path) -> Result<()> {
        let mut file = File::create(path)?;
        let json = serde_json::to_string_pretty(&self.inner.borrow().trace)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    fn handle_device_line(&self, inner: &mut LinkInner, line: Vec<u8>) {
        let now = self.clock.now_us();
        let text = String::from_utf8_lossy(&line).to_string();
        debug!(t_us = now, line = %text, "device -> peer");
        inner.trace.push(TraceEntry {
            t_us: now,
            direction: TraceDirection::DeviceToPeer,
            line: text,
        });

        match frame::parse_peer_line(&line) {
            Ok(PeerInbound::Status(record)) => {
                inner.statuses.push((now, record));
                let reply = match &mut inner.mode {
                    PeerMode::Scripted(script) => {
                        if script.drop_acks > 0 {
                            script.drop_acks -= 1;
                            None
                        } else if script.nak_acks > 0 {
                            script.nak_acks -= 1;
                            Some(frame::NAK_LINE)
                        } else {
                            Some(frame::ACK_LINE)
                        }
                    }
                    PeerMode::External => None,
                };
                if let Some(response) = reply {
                    Self::reply(inner, now, response);
                }
            }
            Ok(PeerInbound::RebootRequest) => {
                inner.reboot_requests += 1;
                let reply = match &mut inner.mode {
                    PeerMode::Scripted(script) => {
                        if script.drop_reboots > 0 {
                            script.drop_reboots -= 1;
                            None
                        } else {
                            Some(frame::READY_LINE)
                        }
                    }
                    PeerMode::External => None,
                };
                if let Some(response) = reply {
                    Self::reply(inner, now, response);
                }
            }
            Ok(PeerInbound::Ignored) | Err(_) => {}
        }
    }

    fn reply(inner: &mut LinkInner, now: u64, line: &[u8]) {
        inner.trace.push(TraceEntry {
            t_us: now,
            direction: TraceDirection::PeerToDevice,
            line: String::from_utf8_lossy(line).trim_end().to_string(),
        });
        inner.to_device.extend(line);
    }
}

impl SerialLink for SimLink {
    fn read_byte(&mut self) -> Option<u8> {
        self.inner.borrow_mut().to_device.pop_front()
    }

    fn write_all(&mut self, bytes: &[u8]) {
        let mut pending_lines = Vec::new();
        {
            let mut inner = self.inner.borrow_mut();
            inner.raw_output.extend_from_slice(bytes);
            for &byte in bytes {
                if byte == b'\n' {
                    let line = core::mem::take(&mut inner.device_line);
                    pending_lines.push(line);
                } else {
                    inner.device_line.push(byte);
                }
            }
        }
        for line in pending_lines {
            let mut inner = self.inner.borrow_mut();
            self.handle_device_line(&mut inner, line);
        }
    }
}
