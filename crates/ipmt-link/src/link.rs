//! The mote link context.
//!
//! [`MoteLink`] owns all protocol state behind one lock. Two kinds of callers
//! drive it: whoever receives bytes from the UART calls [`MoteLink::on_bytes`],
//! and application code calls [`MoteLink::invoke`]. Neither ever blocks on the
//! peer; completions and notifications come out through the [`EventSink`].

use crossbeam_channel::Receiver;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::commands::Command;
use crate::config::LinkConfig;
use crate::constants::SUBCMDID_NONE;
use crate::engine::{CommandEngine, PendingCommand, ReplyOutcome};
use crate::error::LinkResult;
use crate::events::{EventSink, MoteEvent};
use crate::hdlc::{FrameEvent, HdlcReceiver, HdlcSender};
use crate::serial::{Inbound, SerialLayer};
use crate::stats::LinkStats;
use crate::transport::ByteTransport;

struct LinkState<T> {
    receiver: HdlcReceiver,
    sender: HdlcSender,
    serial: SerialLayer,
    engine: CommandEngine,
    transport: T,
    stats: LinkStats,
}

/// Host side of the mote serial API.
pub struct MoteLink<T, S> {
    state: Mutex<LinkState<T>>,
    sink: S,
    config: LinkConfig,
}

impl<T: ByteTransport> MoteLink<T, crossbeam_channel::Sender<MoteEvent>> {
    /// Create a link delivering into a bounded channel of
    /// `config.event_queue_depth` events.
    pub fn with_channel(transport: T, config: LinkConfig) -> (Self, Receiver<MoteEvent>) {
        let (tx, rx) = crossbeam_channel::bounded(config.event_queue_depth.max(1));
        (Self::new(transport, tx, config), rx)
    }
}

impl<T: ByteTransport, S: EventSink> MoteLink<T, S> {
    pub fn new(transport: T, sink: S, config: LinkConfig) -> Self {
        let state = LinkState {
            receiver: HdlcReceiver::new(config.input_buffer_size),
            sender: HdlcSender::new(),
            serial: SerialLayer::new(),
            engine: CommandEngine::new(&config),
            transport,
            stats: LinkStats::default(),
        };
        MoteLink {
            state: Mutex::new(state),
            sink,
            config,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Feed one byte received from the mote.
    pub fn on_byte(&self, byte: u8) {
        let mut state = self.state.lock();
        self.process_byte(&mut state, byte);
    }

    /// Feed a run of received bytes under a single lock acquisition.
    pub fn on_bytes(&self, bytes: &[u8]) {
        let mut state = self.state.lock();
        for &byte in bytes {
            self.process_byte(&mut state, byte);
        }
    }

    /// Send `command` to the mote. The reply arrives later as
    /// [`MoteEvent::Reply`].
    ///
    /// Fails with `Busy` while another command is outstanding and with
    /// `Malformed` if the request does not fit the catalog; nothing is sent in
    /// either case.
    pub fn invoke(&self, command: &Command) -> LinkResult<()> {
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let payload = state.engine.prepare(command)?;
        let kind = command.kind();

        debug!(command = %kind, len = payload.len(), "invoke");
        state.serial.send_request(
            &mut state.sender,
            &mut state.transport,
            kind.cmd_id(),
            0,
            &payload,
        );
        state.engine.begin(kind);
        state.stats.requests_sent += 1;
        Ok(())
    }

    /// Abandon the outstanding command, if any. Nothing is sent to the mote.
    pub fn cancel_outstanding(&self) {
        let mut state = self.state.lock();
        state.engine.cancel();
    }

    pub fn is_busy(&self) -> bool {
        self.state.lock().engine.is_busy()
    }

    pub fn pending(&self) -> Option<PendingCommand> {
        self.state.lock().engine.pending()
    }

    pub fn stats(&self) -> LinkStats {
        self.state.lock().stats
    }

    /// Run `f` on the transport with the link locked.
    pub fn with_transport<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut state = self.state.lock();
        f(&mut state.transport)
    }

    fn process_byte(&self, state: &mut LinkState<T>, byte: u8) {
        match state.receiver.push_byte(byte) {
            None => {}
            Some(FrameEvent::BadCrc) => state.stats.crc_failures += 1,
            Some(FrameEvent::Overflow) => state.stats.overflows += 1,
            Some(FrameEvent::Frame(frame)) => {
                state.stats.frames_received += 1;
                self.process_frame(state, &frame);
            }
        }
    }

    fn process_frame(&self, state: &mut LinkState<T>, frame: &[u8]) {
        let inbound = state
            .serial
            .on_frame(&mut state.sender, &mut state.transport, frame);

        match inbound {
            Inbound::Runt => state.stats.runts += 1,
            Inbound::StaleReply { .. } => state.stats.replies_ignored += 1,
            Inbound::Reply { cmd_id, rc, fields } => match state.engine.on_reply(cmd_id, rc, fields) {
                ReplyOutcome::Accepted(reply) => {
                    let kind = reply.kind;
                    if self.sink.deliver(MoteEvent::Reply(reply)) {
                        trace!(command = %kind, "reply accepted");
                        state.serial.clear_correlator();
                        state.stats.replies_accepted += 1;
                        state.engine.complete();
                    } else {
                        // Slot and correlator stay armed until a retry or cancel
                        debug!(command = %kind, "reply not delivered, command still pending");
                        state.stats.replies_dropped += 1;
                    }
                }
                ReplyOutcome::Ignored(reason) => {
                    debug!(cmd_id, rc, reason, "reply ignored");
                    state.stats.replies_ignored += 1;
                }
            },
            Inbound::Duplicate { .. } => {
                state.stats.acks_sent += 1;
                state.stats.duplicates += 1;
            }
            Inbound::Empty { .. } => state.stats.acks_sent += 1,
            Inbound::Notification { cmd_id, payload } => {
                state.stats.acks_sent += 1;
                let delivered = match state.engine.on_notification(cmd_id, payload) {
                    Some(notification) => self.sink.deliver(MoteEvent::Notification {
                        cmd_id,
                        sub_cmd_id: SUBCMDID_NONE,
                        notification,
                    }),
                    None => false,
                };
                if delivered {
                    state.stats.notifications_delivered += 1;
                } else {
                    state.stats.notifications_dropped += 1;
                }
            }
        }
    }
}
