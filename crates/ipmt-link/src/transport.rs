//! Byte transport seam.
//!
//! The link never touches a UART directly. Outbound bytes go through a
//! [`ByteTransport`]; inbound bytes are pushed into the link by whoever owns the
//! receive side (interrupt handler, reader thread, socket task).

/// Outbound half of the serial line.
pub trait ByteTransport {
    /// Queue one byte for transmission.
    fn transmit_byte(&mut self, byte: u8);

    /// Called once at the end of every frame.
    fn flush(&mut self) {}
}

/// Collects everything written, for tests and offline encoding.
impl ByteTransport for Vec<u8> {
    fn transmit_byte(&mut self, byte: u8) {
        self.push(byte);
    }
}

/// A transport that accumulates one frame and hands it off on flush.
///
/// Used to bridge the link onto channels and sockets, where sending one byte at
/// a time would be wasteful.
pub struct BufferedTransport<F>
where
    F: FnMut(Vec<u8>),
{
    pending: Vec<u8>,
    on_flush: F,
}

impl<F> BufferedTransport<F>
where
    F: FnMut(Vec<u8>),
{
    /// Create a transport that passes each completed frame to `on_flush`.
    pub fn new(on_flush: F) -> Self {
        BufferedTransport {
            pending: Vec::new(),
            on_flush,
        }
    }
}

impl<F> ByteTransport for BufferedTransport<F>
where
    F: FnMut(Vec<u8>),
{
    fn transmit_byte(&mut self, byte: u8) {
        self.pending.push(byte);
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            (self.on_flush)(std::mem::take(&mut self.pending));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_transport_hands_off_on_flush() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut transport = BufferedTransport::new(move |chunk| {
            tx.send(chunk).expect("receiver alive");
        });

        transport.transmit_byte(1);
        transport.transmit_byte(2);
        assert!(rx.try_recv().is_err());

        transport.flush();
        assert_eq!(rx.try_recv().unwrap(), vec![1, 2]);

        transport.flush();
        assert!(rx.try_recv().is_err());
    }
}
