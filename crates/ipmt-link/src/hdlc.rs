//! HDLC-like link framing.
//!
//! ```text
//! +------+---------------------------+---------+---------+------+
//! | 0x7E | escaped payload           | ~crc lo | ~crc hi | 0x7E |
//! +------+---------------------------+---------+---------+------+
//! ```
//!
//! `0x7E` and `0x7D` inside the payload or CRC are sent as `0x7D, byte ^ 0x20`.
//! The CRC is the PPP FCS-16; running it over payload and trailer together
//! leaves the constant residue [`HDLC_CRC_GOOD`].

use tracing::trace;

use crate::constants::*;
use crate::transport::ByteTransport;

const fn build_crc_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u16;
        let mut bit = 0;
        while bit < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ HDLC_CRC_POLY
            } else {
                crc >> 1
            };
            bit += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

static CRC_TABLE: [u16; 256] = build_crc_table();

/// Fold one byte into a running FCS-16.
#[inline]
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    (crc >> 8) ^ CRC_TABLE[((crc ^ byte as u16) & 0xFF) as usize]
}

/// FCS-16 of `data`, starting from [`HDLC_CRC_INIT`].
pub fn crc16(data: &[u8]) -> u16 {
    data.iter()
        .fold(HDLC_CRC_INIT, |crc, &byte| crc16_update(crc, byte))
}

// ============================================================================
// Receive
// ============================================================================

/// Result of feeding one byte to the receiver, when something happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// A complete frame with a valid CRC, trailer stripped.
    Frame(Vec<u8>),
    /// A frame closed with a bad CRC (or too short to hold one).
    BadCrc,
    /// A frame outgrew the input buffer and was abandoned.
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    Idle,
    Receiving,
}

/// Byte-at-a-time frame receiver.
#[derive(Debug)]
pub struct HdlcReceiver {
    state: RxState,
    escaping: bool,
    crc: u16,
    last_byte: u8,
    buffer: Vec<u8>,
    capacity: usize,
}

impl Default for HdlcReceiver {
    fn default() -> Self {
        Self::new(HDLC_INPUT_BUFFER_SIZE)
    }
}

impl HdlcReceiver {
    /// Create a receiver holding at most `capacity` unescaped bytes per frame,
    /// CRC included.
    pub fn new(capacity: usize) -> Self {
        HdlcReceiver {
            state: RxState::Idle,
            escaping: false,
            crc: HDLC_CRC_INIT,
            last_byte: 0,
            buffer: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Whether a frame is currently being assembled.
    pub fn is_receiving(&self) -> bool {
        self.state == RxState::Receiving
    }

    /// Feed one received byte.
    pub fn push_byte(&mut self, byte: u8) -> Option<FrameEvent> {
        let last = self.last_byte;
        self.last_byte = byte;

        match self.state {
            RxState::Idle => {
                if last == HDLC_FLAG && byte != HDLC_FLAG {
                    self.open();
                    self.consume(byte)
                } else {
                    None
                }
            }
            RxState::Receiving if byte == HDLC_FLAG => self.close(),
            RxState::Receiving => self.consume(byte),
        }
    }

    fn open(&mut self) {
        self.state = RxState::Receiving;
        self.escaping = false;
        self.crc = HDLC_CRC_INIT;
        self.buffer.clear();
    }

    fn consume(&mut self, byte: u8) -> Option<FrameEvent> {
        if byte == HDLC_ESCAPE {
            self.escaping = true;
            return None;
        }

        let byte = if self.escaping {
            self.escaping = false;
            byte ^ HDLC_ESCAPE_MASK
        } else {
            byte
        };

        if self.buffer.len() >= self.capacity {
            trace!(capacity = self.capacity, "hdlc frame overflow");
            self.state = RxState::Idle;
            self.escaping = false;
            self.buffer.clear();
            return Some(FrameEvent::Overflow);
        }

        self.buffer.push(byte);
        self.crc = crc16_update(self.crc, byte);
        None
    }

    fn close(&mut self) -> Option<FrameEvent> {
        self.state = RxState::Idle;
        self.escaping = false;

        if self.crc != HDLC_CRC_GOOD || self.buffer.len() < 2 {
            trace!(len = self.buffer.len(), crc = self.crc, "hdlc frame bad crc");
            self.buffer.clear();
            return Some(FrameEvent::BadCrc);
        }

        self.buffer.truncate(self.buffer.len() - 2);
        if self.buffer.is_empty() {
            return None;
        }

        trace!(len = self.buffer.len(), "hdlc frame received");
        Some(FrameEvent::Frame(std::mem::take(&mut self.buffer)))
    }
}

// ============================================================================
// Transmit
// ============================================================================

/// Frame writer. Call [`open`](Self::open), any number of
/// [`write`](Self::write)s, then [`close`](Self::close).
#[derive(Debug)]
pub struct HdlcSender {
    crc: u16,
}

impl Default for HdlcSender {
    fn default() -> Self {
        Self::new()
    }
}

impl HdlcSender {
    /// Create a new sender.
    pub fn new() -> Self {
        HdlcSender { crc: HDLC_CRC_INIT }
    }

    /// Start a frame.
    pub fn open<T: ByteTransport>(&mut self, tx: &mut T) {
        self.crc = HDLC_CRC_INIT;
        tx.transmit_byte(HDLC_FLAG);
    }

    /// Write one payload byte, escaping as needed.
    pub fn write<T: ByteTransport>(&mut self, tx: &mut T, byte: u8) {
        self.crc = crc16_update(self.crc, byte);
        if byte == HDLC_FLAG || byte == HDLC_ESCAPE {
            tx.transmit_byte(HDLC_ESCAPE);
            tx.transmit_byte(byte ^ HDLC_ESCAPE_MASK);
        } else {
            tx.transmit_byte(byte);
        }
    }

    /// Write the CRC trailer and the closing flag, then flush.
    pub fn close<T: ByteTransport>(&mut self, tx: &mut T) {
        let crc = !self.crc;
        self.write(tx, (crc & 0xFF) as u8);
        self.write(tx, (crc >> 8) as u8);
        tx.transmit_byte(HDLC_FLAG);
        tx.flush();
    }

    /// Write a complete frame.
    pub fn send_frame<T: ByteTransport>(&mut self, tx: &mut T, payload: &[u8]) {
        self.open(tx);
        for &byte in payload {
            self.write(tx, byte);
        }
        self.close(tx);
    }
}

/// Encode `payload` as a complete frame.
pub fn encode_frame(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(payload.len() + 6);
    HdlcSender::new().send_frame(&mut out, payload);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn receive_all(receiver: &mut HdlcReceiver, bytes: &[u8]) -> Vec<FrameEvent> {
        bytes
            .iter()
            .filter_map(|&byte| receiver.push_byte(byte))
            .collect()
    }

    #[test]
    fn test_crc_table() {
        assert_eq!(CRC_TABLE[0], 0x0000);
        assert_eq!(CRC_TABLE[1], 0x1189);
        assert_eq!(CRC_TABLE[255], 0x0F78);
    }

    #[test]
    fn test_crc_check_value() {
        // X.25 check value
        assert_eq!(!crc16(b"123456789"), 0x906E);
    }

    #[test]
    fn test_encode_escapes_reserved_bytes() {
        let frame = encode_frame(&[0x01, 0x7E, 0x7D, 0x02]);
        assert_eq!(frame[0], HDLC_FLAG);
        assert_eq!(&frame[1..7], &[0x01, 0x7D, 0x5E, 0x7D, 0x5D, 0x02]);
        assert_eq!(*frame.last().unwrap(), HDLC_FLAG);
        assert!(!frame[1..frame.len() - 1].contains(&HDLC_FLAG));
    }

    #[test]
    fn test_trailer_leaves_good_residue() {
        let payload = [0x06, 0x00, 0x08];
        let frame = encode_frame(&payload);
        let mut receiver = HdlcReceiver::default();
        let events = receive_all(&mut receiver, &frame);
        assert_eq!(events, vec![FrameEvent::Frame(payload.to_vec())]);

        let fcs = !crc16(&payload);
        let mut with_trailer = payload.to_vec();
        with_trailer.push((fcs & 0xFF) as u8);
        with_trailer.push((fcs >> 8) as u8);
        assert_eq!(crc16(&with_trailer), HDLC_CRC_GOOD);
    }

    #[test]
    fn test_bytes_before_first_flag_are_ignored() {
        let mut receiver = HdlcReceiver::default();
        let mut stream = vec![0x11, 0x22, 0x33];
        stream.extend(encode_frame(&[0xAA]));
        assert_eq!(
            receive_all(&mut receiver, &stream),
            vec![FrameEvent::Frame(vec![0xAA])]
        );
    }

    #[test]
    fn test_shared_delimiter_between_frames() {
        let first = encode_frame(&[1, 2, 3]);
        let second = encode_frame(&[4, 5]);

        // Drop the opening flag of the second frame
        let mut stream = first.clone();
        stream.extend_from_slice(&second[1..]);

        let mut receiver = HdlcReceiver::default();
        assert_eq!(
            receive_all(&mut receiver, &stream),
            vec![
                FrameEvent::Frame(vec![1, 2, 3]),
                FrameEvent::Frame(vec![4, 5]),
            ]
        );
    }

    #[test]
    fn test_repeated_flags_are_idle() {
        let mut stream = vec![HDLC_FLAG, HDLC_FLAG, HDLC_FLAG];
        stream.extend(encode_frame(&[9]));
        stream.extend([HDLC_FLAG, HDLC_FLAG]);

        let mut receiver = HdlcReceiver::default();
        assert_eq!(
            receive_all(&mut receiver, &stream),
            vec![FrameEvent::Frame(vec![9])]
        );
    }

    #[test]
    fn test_corrupted_frame_is_discarded() {
        let mut frame = encode_frame(&[0x10, 0x20, 0x30]);
        frame[2] ^= 0x01;

        let mut receiver = HdlcReceiver::default();
        assert_eq!(receive_all(&mut receiver, &frame), vec![FrameEvent::BadCrc]);

        // The next frame still decodes
        let events = receive_all(&mut receiver, &encode_frame(&[0x40]));
        assert_eq!(events, vec![FrameEvent::Frame(vec![0x40])]);
    }

    #[test]
    fn test_empty_frame_is_discarded() {
        let mut receiver = HdlcReceiver::default();
        assert!(receive_all(&mut receiver, &encode_frame(&[])).is_empty());
    }

    #[test]
    fn test_overflow_aborts_frame() {
        let mut receiver = HdlcReceiver::new(8);
        let big = encode_frame(&[0x55; 16]);
        assert_eq!(receive_all(&mut receiver, &big), vec![FrameEvent::Overflow]);
        assert!(!receiver.is_receiving());

        // Payload plus CRC exactly fills the buffer
        let fits = encode_frame(&[0x55; 6]);
        assert_eq!(
            receive_all(&mut receiver, &fits),
            vec![FrameEvent::Frame(vec![0x55; 6])]
        );
    }

    #[test]
    fn test_escape_state_does_not_leak_across_frames() {
        // A frame cut short right after an escape byte
        let mut stream = vec![HDLC_FLAG, 0x01, HDLC_ESCAPE, HDLC_FLAG];
        stream.extend_from_slice(&encode_frame(&[0x02])[1..]);

        let mut receiver = HdlcReceiver::default();
        assert_eq!(
            receive_all(&mut receiver, &stream),
            vec![FrameEvent::BadCrc, FrameEvent::Frame(vec![0x02])]
        );
    }
}
