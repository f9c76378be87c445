//! Unit and integration tests for the wireless line protocol.

use jar_proto::frame::{self, Inbound, PeerInbound};
use jar_proto::line::LineReader;
use jar_proto::records::{
    encode_remaining_seconds, CommandRecord, Opcode, StatusCode, StatusRecord,
};
use jar_proto::FrameError;

#[test]
fn status_record_roundtrip() {
    let record = StatusRecord {
        code: StatusCode::Cooking as i8,
        cmdid: 3,
        cmdnum: 7,
        power: 42,
        temperature: (60 * 256) + 128, // 60.5 °C in Q8.8
        remain_time: 0x8078,           // 120 minutes, minutes bit set
    };
    let bytes = record.encode();
    assert_eq!(bytes.len(), StatusRecord::WIRE_SIZE);
    assert_eq!(StatusRecord::decode(bytes), record);
}

#[test]
fn status_record_negative_code_survives_the_wire() {
    let record = StatusRecord {
        code: StatusCode::CommandOverflow as i8,
        ..Default::default()
    };
    let decoded = StatusRecord::decode(record.encode());
    assert_eq!(decoded.code, -61);
    assert_eq!(StatusCode::from_raw(decoded.code), Some(StatusCode::CommandOverflow));
    assert!(StatusCode::from_raw(decoded.code).unwrap().is_fault());
}

#[test]
fn remain_time_boundary_encoding() {
    assert_eq!(encode_remaining_seconds(0), 0);
    assert_eq!(encode_remaining_seconds(3599), 3599);
    // Exactly one hour still fits in the seconds encoding.
    assert_eq!(encode_remaining_seconds(3600), 3600);
    assert_eq!(encode_remaining_seconds(3601), 61 | 0x8000);
    assert_eq!(encode_remaining_seconds(7200), 120 | 0x8000);
}

#[test]
fn command_frame_accepts_dot_terminator() {
    let line = b"WV,001B,0200082000000000.";
    match frame::parse_line(line) {
        Ok(Inbound::Command(record)) => {
            assert_eq!(record.opcode(), Some(Opcode::TargetTemperature));
            assert_eq!(record.index, 0);
            assert_eq!(record.params[0], 0x08);
            assert_eq!(record.params[1], 0x20);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn command_frame_accepts_bare_end_of_line() {
    // The upstream framing is inconsistent about the trailing dot.
    let line = b"WV,001B,0300780000000000";
    match frame::parse_line(line) {
        Ok(Inbound::Command(record)) => {
            assert_eq!(record.opcode(), Some(Opcode::Hold));
            assert_eq!(record.param_u16(0), 120);
        }
        other => panic!("unexpected parse: {other:?}"),
    }
}

#[test]
fn command_frame_rejects_wrong_digit_counts() {
    // 15 hex digits
    assert!(frame::parse_line(b"WV,001B,020008200000000.").is_err());
    // 17 hex digits
    assert!(frame::parse_line(b"WV,001B,02000820000000000.").is_err());
    // non-hex digit in the payload
    assert!(frame::parse_line(b"WV,001B,02000820000000ZZ.").is_err());
    // trailing garbage after the terminator
    assert!(frame::parse_line(b"WV,001B,0200082000000000.x").is_err());
}

#[test]
fn command_frame_rejects_unknown_service() {
    assert_eq!(
        frame::parse_line(b"WV,0042,0200082000000000."),
        Err(FrameError::UnknownService)
    );
}

#[test]
fn command_record_roundtrip_through_frame_text() {
    let record = CommandRecord::set_kp(0.3, 5);
    let line = frame::command_line(&record);
    // The builder terminates with ".\n"; the reader strips the "\n".
    let parsed = frame::parse_line(&line[..line.len() - 1]).unwrap();
    assert_eq!(parsed, Inbound::Command(record));
    match parsed {
        Inbound::Command(r) => assert_eq!(r.param_f32(0), 0.3),
        _ => unreachable!(),
    }
}

#[test]
fn responses_are_recognized_by_prefix() {
    assert_eq!(frame::parse_line(b"AOK"), Ok(Inbound::Ack));
    assert_eq!(frame::parse_line(b"ERR"), Ok(Inbound::Nak));
    assert_eq!(frame::parse_line(b"CMD"), Ok(Inbound::Ready));
    // Prefix matching tolerates short module suffixes...
    assert_eq!(frame::parse_line(b"AOK 1"), Ok(Inbound::Ack));
    // ...but over-long lines and unknown prefixes are dropped.
    assert_eq!(frame::parse_line(b"AOKAOKAOK"), Ok(Inbound::Ignored));
    assert_eq!(frame::parse_line(b"HELLO"), Ok(Inbound::Ignored));
}

#[test]
fn peer_side_decodes_status_and_reboot() {
    let record = StatusRecord {
        code: 1,
        power: 50,
        ..Default::default()
    };
    let line = frame::status_line(&record);
    let parsed = frame::parse_peer_line(&line[..line.len() - 1]).unwrap();
    assert_eq!(parsed, PeerInbound::Status(record));

    assert_eq!(frame::parse_peer_line(b"R,1"), Ok(PeerInbound::RebootRequest));
    assert_eq!(frame::parse_peer_line(b"noise"), Ok(PeerInbound::Ignored));
}

#[test]
fn line_reader_assembles_and_strips_noise() {
    let mut reader = LineReader::new();
    let mut lines = Vec::new();
    for &b in b"AOK\r\n\x02WV,001B\x80,\n".iter() {
        if let Some(line) = reader.push(b) {
            lines.push(line);
        }
    }
    assert_eq!(lines.len(), 2);
    assert_eq!(&lines[0][..], b"AOK");
    // The control bytes vanished, the printable bytes survived.
    assert_eq!(&lines[1][..], b"WV,001B,");
}

#[test]
fn line_reader_overflow_discards_the_line() {
    let mut reader = LineReader::new();
    for _ in 0..100 {
        assert_eq!(reader.push(b'x'), None);
    }
    // After wrapping, the terminator yields only what fit since the wrap.
    let line = reader.push(b'\n').unwrap();
    assert!(line.len() < 64, "wrapped line was {} bytes", line.len());
    assert!(line.iter().all(|&b| b == b'x'));
}

mod codec {
    use super::*;
    use bytes::BytesMut;
    use jar_proto::codec::{JarCodec, PeerOutbound};
    use tokio_util::codec::{Decoder, Encoder};

    #[test]
    fn encode_then_decode_is_identity_for_status() {
        let mut codec = JarCodec::new();
        let mut buffer = BytesMut::new();

        // The appliance side writes the raw line; the peer codec decodes it.
        let record = StatusRecord {
            code: 0,
            temperature: 25 * 256,
            ..Default::default()
        };
        buffer.extend_from_slice(&frame::status_line(&record));
        let decoded = codec.decode(&mut buffer).unwrap().unwrap();
        assert_eq!(decoded, PeerInbound::Status(record));
        assert!(buffer.is_empty());
    }

    #[test]
    fn decode_waits_for_the_terminator() {
        let mut codec = JarCodec::new();
        let mut buffer = BytesMut::from(&b"SHW,001D,00000000"[..]);
        assert!(codec.decode(&mut buffer).unwrap().is_none());
    }

    #[test]
    fn encoded_command_parses_on_the_appliance_side() {
        let mut codec = JarCodec::new();
        let mut buffer = BytesMut::new();
        let record = CommandRecord::hold(90, 0x80);
        codec.encode(PeerOutbound::Command(record), &mut buffer).unwrap();

        let text = buffer.freeze();
        assert!(text.ends_with(b".\n"));
        let parsed = frame::parse_line(&text[..text.len() - 1]).unwrap();
        assert_eq!(parsed, Inbound::Command(record));
    }
}
