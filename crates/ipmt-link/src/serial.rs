//! Packet transport: serial header, sequence bits and acknowledgements.
//!
//! ```text
//! +-------+--------+-------+----------------------+
//! | cmdId | length | flags | payload[0..length]   |
//! +-------+--------+-------+----------------------+
//! flags: bit0 RESPONSE, bit1 packet id (sequence), bit3 SYNC
//! ```
//!
//! Host-originated requests and peer-originated notifications each carry their
//! own alternating sequence bit. Peer frames are acknowledged immediately and a
//! frame repeating the last accepted sequence bit is not delivered twice.

use tracing::{debug, trace};

use crate::constants::*;
use crate::hdlc::HdlcSender;
use crate::transport::ByteTransport;

/// What a received frame turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// Reply to the registered command.
    Reply {
        cmd_id: u8,
        rc: u8,
        /// Bytes after the result code.
        fields: &'a [u8],
    },
    /// Reply nobody is waiting for.
    StaleReply { cmd_id: u8 },
    /// New peer-originated frame with a payload. Already acknowledged.
    Notification { cmd_id: u8, payload: &'a [u8] },
    /// New peer-originated frame without payload. Already acknowledged.
    Empty { cmd_id: u8 },
    /// Retransmitted peer-originated frame. Acknowledged again.
    Duplicate { cmd_id: u8 },
    /// Frame too short for its header or its length field.
    Runt,
}

/// Sequence state and reply correlator for one serial link.
#[derive(Debug, Default)]
pub struct SerialLayer {
    tx_seq: Option<bool>,
    rx_seq: Option<bool>,
    correlator: Option<u8>,
}

impl SerialLayer {
    /// Create a layer with both sequence bits unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Command id of the reply currently expected, if any.
    pub fn expected_reply(&self) -> Option<u8> {
        self.correlator
    }

    /// Forget the expected reply.
    pub fn clear_correlator(&mut self) {
        self.correlator = None;
    }

    /// Frame and transmit a host-originated request, registering `cmd_id` as
    /// the expected reply.
    pub fn send_request<T: ByteTransport>(
        &mut self,
        hdlc: &mut HdlcSender,
        tx: &mut T,
        cmd_id: u8,
        extra_flags: u8,
        payload: &[u8],
    ) {
        self.correlator = Some(cmd_id);

        let (seq, sync) = match self.tx_seq {
            None => (false, FLAG_SYNC),
            Some(seq) => (seq, 0),
        };
        let flags = (u8::from(seq) << 1) | sync | extra_flags;

        trace!(cmd_id, flags, len = payload.len(), "serial tx request");
        hdlc.open(tx);
        hdlc.write(tx, cmd_id);
        hdlc.write(tx, payload.len() as u8);
        hdlc.write(tx, flags);
        for &byte in payload {
            hdlc.write(tx, byte);
        }
        hdlc.close(tx);

        self.tx_seq = Some(!seq);
    }

    /// Classify a received frame, acknowledging it if it is peer-originated.
    pub fn on_frame<'a, T: ByteTransport>(
        &mut self,
        hdlc: &mut HdlcSender,
        tx: &mut T,
        frame: &'a [u8],
    ) -> Inbound<'a> {
        if frame.len() < SERIAL_HEADER_LEN {
            debug!(len = frame.len(), "serial frame too short");
            return Inbound::Runt;
        }

        let cmd_id = frame[0];
        let length = frame[1] as usize;
        let flags = frame[2];
        let available = frame.len() - SERIAL_HEADER_LEN;

        if length > available {
            debug!(cmd_id, length, available, "serial length exceeds frame");
            return Inbound::Runt;
        }
        if length < available {
            trace!(cmd_id, length, extra = available - length, "serial trailing bytes ignored");
        }
        let payload = &frame[SERIAL_HEADER_LEN..SERIAL_HEADER_LEN + length];

        if flags & FLAG_RESPONSE != 0 {
            return match (self.correlator, payload.split_first()) {
                (Some(expected), Some((&rc, fields))) if expected == cmd_id => {
                    Inbound::Reply { cmd_id, rc, fields }
                }
                _ => {
                    debug!(cmd_id, expected = ?self.correlator, "serial reply not expected");
                    Inbound::StaleReply { cmd_id }
                }
            };
        }

        let seq = flags & FLAG_PACKET_ID != 0;
        let fresh = flags & FLAG_SYNC != 0 || self.rx_seq != Some(seq);
        if fresh {
            self.rx_seq = Some(seq);
        }
        self.send_ack(hdlc, tx, cmd_id);

        if !fresh {
            debug!(cmd_id, seq, "serial duplicate suppressed");
            Inbound::Duplicate { cmd_id }
        } else if length == 0 {
            Inbound::Empty { cmd_id }
        } else {
            Inbound::Notification { cmd_id, payload }
        }
    }

    fn send_ack<T: ByteTransport>(&mut self, hdlc: &mut HdlcSender, tx: &mut T, cmd_id: u8) {
        let seq = self.rx_seq.unwrap_or(false);
        let flags = FLAG_RESPONSE | (u8::from(seq) << 1);

        trace!(cmd_id, flags, "serial tx ack");
        hdlc.open(tx);
        hdlc.write(tx, cmd_id);
        hdlc.write(tx, 0);
        hdlc.write(tx, flags);
        hdlc.write(tx, RC_OK);
        hdlc.close(tx);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hdlc::{encode_frame, FrameEvent, HdlcReceiver};

    fn decode_frames(bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut receiver = HdlcReceiver::default();
        bytes
            .iter()
            .filter_map(|&b| match receiver.push_byte(b) {
                Some(FrameEvent::Frame(frame)) => Some(frame),
                _ => None,
            })
            .collect()
    }

    struct Fixture {
        serial: SerialLayer,
        hdlc: HdlcSender,
        wire: Vec<u8>,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                serial: SerialLayer::new(),
                hdlc: HdlcSender::new(),
                wire: Vec::new(),
            }
        }

        fn send(&mut self, cmd_id: u8, payload: &[u8]) -> Vec<u8> {
            self.serial
                .send_request(&mut self.hdlc, &mut self.wire, cmd_id, 0, payload);
            let frames = decode_frames(&std::mem::take(&mut self.wire));
            assert_eq!(frames.len(), 1);
            frames.into_iter().next().unwrap()
        }

        fn receive(&mut self, frame: &[u8]) -> (String, Vec<Vec<u8>>) {
            let kind = format!(
                "{:?}",
                self.serial.on_frame(&mut self.hdlc, &mut self.wire, frame)
            );
            (kind, decode_frames(&std::mem::take(&mut self.wire)))
        }
    }

    #[test]
    fn test_first_request_sets_sync_then_toggles() {
        let mut fx = Fixture::new();

        let first = fx.send(CMDID_JOIN, &[]);
        assert_eq!(first, vec![CMDID_JOIN, 0, FLAG_SYNC]);

        let second = fx.send(CMDID_JOIN, &[]);
        assert_eq!(second[2], FLAG_PACKET_ID);

        let third = fx.send(CMDID_GET_PARAMETER, &[PARAMID_MOTE_INFO]);
        assert_eq!(third, vec![CMDID_GET_PARAMETER, 1, 0, PARAMID_MOTE_INFO]);
    }

    #[test]
    fn test_request_registers_correlator() {
        let mut fx = Fixture::new();
        fx.send(CMDID_JOIN, &[]);
        assert_eq!(fx.serial.expected_reply(), Some(CMDID_JOIN));

        let reply = [CMDID_JOIN, 1, FLAG_RESPONSE, RC_OK];
        match fx.serial.on_frame(&mut fx.hdlc, &mut fx.wire, &reply) {
            Inbound::Reply { cmd_id, rc, fields } => {
                assert_eq!(cmd_id, CMDID_JOIN);
                assert_eq!(rc, RC_OK);
                assert!(fields.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
        // Replies are never acknowledged
        assert!(fx.wire.is_empty());
        // Consumed only by the engine
        assert_eq!(fx.serial.expected_reply(), Some(CMDID_JOIN));
    }

    #[test]
    fn test_mismatched_reply_is_stale() {
        let mut fx = Fixture::new();
        fx.send(CMDID_JOIN, &[]);

        let reply = [CMDID_RESET, 1, FLAG_RESPONSE, RC_OK];
        let (kind, acks) = fx.receive(&reply);
        assert!(kind.starts_with("StaleReply"));
        assert!(acks.is_empty());

        // Reply with no result code
        let reply = [CMDID_JOIN, 0, FLAG_RESPONSE];
        let (kind, _) = fx.receive(&reply);
        assert!(kind.starts_with("StaleReply"));
    }

    #[test]
    fn test_notification_is_acked_and_duplicate_suppressed() {
        let mut fx = Fixture::new();
        let notif = [CMDID_TX_DONE, 3, FLAG_SYNC, 0x00, 0x07, 0x00];

        let (kind, acks) = fx.receive(&notif);
        assert!(kind.starts_with("Notification"));
        assert_eq!(acks, vec![vec![CMDID_TX_DONE, 0, FLAG_RESPONSE, RC_OK]]);

        // Same sequence bit, no SYNC: a retransmission
        let replay = [CMDID_TX_DONE, 3, 0x00, 0x00, 0x07, 0x00];
        let (kind, acks) = fx.receive(&replay);
        assert!(kind.starts_with("Duplicate"));
        assert_eq!(acks.len(), 1);

        // Toggled sequence bit is new
        let next = [CMDID_TX_DONE, 3, FLAG_PACKET_ID, 0x00, 0x08, 0x00];
        let (kind, acks) = fx.receive(&next);
        assert!(kind.starts_with("Notification"));
        assert_eq!(
            acks,
            vec![vec![CMDID_TX_DONE, 0, FLAG_RESPONSE | FLAG_PACKET_ID, RC_OK]]
        );
    }

    #[test]
    fn test_sync_forces_acceptance() {
        let mut fx = Fixture::new();
        let notif = [CMDID_EVENTS, 1, FLAG_PACKET_ID, 0xAA];
        assert!(fx.receive(&notif).0.starts_with("Notification"));

        let resync = [CMDID_EVENTS, 1, FLAG_PACKET_ID | FLAG_SYNC, 0xBB];
        assert!(fx.receive(&resync).0.starts_with("Notification"));
    }

    #[test]
    fn test_zero_length_peer_frame_is_acked_only() {
        let mut fx = Fixture::new();
        let (kind, acks) = fx.receive(&[CMDID_EVENTS, 0, FLAG_SYNC]);
        assert!(kind.starts_with("Empty"));
        assert_eq!(acks.len(), 1);
    }

    #[test]
    fn test_runt_frames_are_dropped() {
        let mut fx = Fixture::new();
        assert_eq!(fx.receive(&[CMDID_EVENTS, 0]).0, "Runt");
        assert_eq!(fx.receive(&[CMDID_EVENTS, 5, 0, 1, 2]).0, "Runt");
        assert!(fx.wire.is_empty());
    }

    #[test]
    fn test_payload_is_bounded_by_length_field() {
        let mut fx = Fixture::new();
        let notif = [CMDID_TX_DONE, 3, FLAG_SYNC, 0x00, 0x07, 0x00, 0xDE, 0xAD];
        match fx.serial.on_frame(&mut fx.hdlc, &mut fx.wire, &notif) {
            Inbound::Notification { payload, .. } => assert_eq!(payload, &[0x00, 0x07, 0x00]),
            other => panic!("unexpected {:?}", other),
        }

        fx.send(CMDID_JOIN, &[]);
        let reply = [CMDID_JOIN, 1, FLAG_RESPONSE, RC_OK, 0xDE, 0xAD];
        match fx.serial.on_frame(&mut fx.hdlc, &mut fx.wire, &reply) {
            Inbound::Reply { rc, fields, .. } => {
                assert_eq!(rc, RC_OK);
                assert!(fields.is_empty());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_request_bytes_on_the_wire() {
        let mut fx = Fixture::new();
        fx.serial
            .send_request(&mut fx.hdlc, &mut fx.wire, CMDID_JOIN, 0, &[]);
        assert_eq!(fx.wire, encode_frame(&[CMDID_JOIN, 0, FLAG_SYNC]));
    }
}
