//! Command ingest from the wireless link.
//!
//! Drains the UART through the bounded line reader and dispatches complete
//! lines: command frames mutate the program array, module responses are
//! surfaced to the publisher as [`LinkEvent`]s, everything else is dropped.

use heapless::Vec;
use jar_proto::frame::{self, Inbound};
use jar_proto::line::LineReader;
use jar_proto::records::StatusCode;
use jar_proto::FrameError;

use crate::hal::SerialLink;
use crate::program::Program;
use crate::status::StatusBoard;

/// Module responses relevant to the publisher's round-trips.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Ack,
    Nak,
    Ready,
}

/// Upper bound on responses per foreground pass; the link runs at 2400 baud,
/// so even this is generous.
pub const MAX_EVENTS_PER_PASS: usize = 8;

pub struct CommandIngest {
    reader: LineReader,
}

impl CommandIngest {
    pub fn new() -> Self {
        Self {
            reader: LineReader::new(),
        }
    }

    /// Non-blocking drain of everything the link has buffered.
    pub fn poll<L: SerialLink>(
        &mut self,
        link: &mut L,
        program: &mut Program,
        status: &StatusBoard,
    ) -> Vec<LinkEvent, MAX_EVENTS_PER_PASS> {
        let mut events = Vec::new();
        while let Some(byte) = link.read_byte() {
            let Some(line) = self.reader.push(byte) else {
                continue;
            };
            if line.is_empty() {
                continue;
            }
            match frame::parse_line(&line) {
                Ok(Inbound::Command(record)) => {
                    program.store(record, status);
                }
                Ok(Inbound::Ack) => {
                    let _ = events.push(LinkEvent::Ack);
                }
                Ok(Inbound::Nak) => {
                    let _ = events.push(LinkEvent::Nak);
                }
                Ok(Inbound::Ready) => {
                    let _ = events.push(LinkEvent::Ready);
                }
                Ok(Inbound::Ignored) => {}
                Err(FrameError::UnknownService) => status.latch(StatusCode::InvalidCommand),
                Err(_) => status.latch(StatusCode::InvalidArgument),
            }
        }
        events
    }
}

impl Default for CommandIngest {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jar_proto::records::Opcode;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct MemLink {
        rx: VecDeque<u8>,
        tx: std::vec::Vec<u8>,
    }

    impl MemLink {
        fn feed(&mut self, bytes: &[u8]) {
            self.rx.extend(bytes);
        }
    }

    impl SerialLink for MemLink {
        fn read_byte(&mut self) -> Option<u8> {
            self.rx.pop_front()
        }
        fn write_all(&mut self, bytes: &[u8]) {
            self.tx.extend_from_slice(bytes);
        }
    }

    #[test]
    fn a_valid_frame_loads_a_slot() {
        let mut link = MemLink::default();
        let mut program = Program::new();
        let status = StatusBoard::new();
        let mut ingest = CommandIngest::new();

        link.feed(b"WV,001B,0200082000000000.\n");
        let events = ingest.poll(&mut link, &mut program, &status);
        assert!(events.is_empty());
        assert_eq!(program.slot(0).opcode(), Some(Opcode::TargetTemperature));
        assert_eq!(program.slot(0).params[0], 0x08);
        assert_eq!(status.code(), 0);
    }

    #[test]
    fn a_malformed_frame_latches_and_leaves_the_program_alone() {
        let mut link = MemLink::default();
        let mut program = Program::new();
        let status = StatusBoard::new();
        let mut ingest = CommandIngest::new();

        // 15 hex digits
        link.feed(b"WV,001B,020008200000000.\n");
        ingest.poll(&mut link, &mut program, &status);
        assert_eq!(status.code(), StatusCode::InvalidArgument as i8);
        assert_eq!(program.slot(0).opcode(), Some(Opcode::Nop));
    }

    #[test]
    fn responses_become_events_in_arrival_order() {
        let mut link = MemLink::default();
        let mut program = Program::new();
        let status = StatusBoard::new();
        let mut ingest = CommandIngest::new();

        link.feed(b"AOK\nnoise goes nowhere\nCMD\nERR\n");
        let events = ingest.poll(&mut link, &mut program, &status);
        assert_eq!(
            &events[..],
            &[LinkEvent::Ack, LinkEvent::Ready, LinkEvent::Nak]
        );
        assert_eq!(status.code(), 0);
    }

    #[test]
    fn an_unknown_service_is_an_invalid_command() {
        let mut link = MemLink::default();
        let mut program = Program::new();
        let status = StatusBoard::new();
        let mut ingest = CommandIngest::new();

        link.feed(b"WV,0099,0000000000000000.\n");
        ingest.poll(&mut link, &mut program, &status);
        assert_eq!(status.code(), StatusCode::InvalidCommand as i8);
    }
}
