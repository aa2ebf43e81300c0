//! Wiring a [`MoteLink`] to a [`SimulatedMote`].
//!
//! [`Loopback`] moves bytes only when asked, which makes interleavings
//! reproducible. [`ThreadedMote`] runs the mote on its own thread so blocking
//! callers such as [`Session`] can be exercised end to end.

use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender};
use ipmt_link::{BufferedTransport, LinkConfig, MoteEvent, MoteLink, Session};
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::mote::SimulatedMote;

/// Upper bound on round trips per [`Loopback::pump`].
const MAX_PUMP_ROUNDS: usize = 32;

// ============================================================================
// Loopback
// ============================================================================

/// Host link and simulated mote connected back to back, single-threaded.
pub struct Loopback {
    pub link: MoteLink<Vec<u8>, Sender<MoteEvent>>,
    pub events: Receiver<MoteEvent>,
    pub mote: SimulatedMote,
}

impl Loopback {
    pub fn new(mote: SimulatedMote, config: LinkConfig) -> Self {
        let (link, events) = MoteLink::with_channel(Vec::new(), config);
        Loopback { link, events, mote }
    }

    /// Move pending host bytes to the mote. Returns the number of bytes moved.
    pub fn host_to_mote(&mut self) -> usize {
        let bytes = self.link.with_transport(std::mem::take);
        self.mote.feed(&bytes);
        bytes.len()
    }

    /// Move pending mote bytes to the host. Returns the number of bytes moved.
    pub fn mote_to_host(&mut self) -> usize {
        let bytes = self.mote.take_output();
        self.link.on_bytes(&bytes);
        bytes.len()
    }

    /// Shuttle bytes both ways until the wire is quiet.
    pub fn pump(&mut self) {
        for round in 0..MAX_PUMP_ROUNDS {
            let moved = self.mote_to_host() + self.host_to_mote();
            if moved == 0 {
                trace!(round, "loopback quiet");
                return;
            }
        }
        debug!("loopback still busy after {} rounds", MAX_PUMP_ROUNDS);
    }

    /// All events delivered so far.
    pub fn drain_events(&self) -> Vec<MoteEvent> {
        self.events.try_iter().collect()
    }
}

// ============================================================================
// Threaded
// ============================================================================

/// Transport carrying host frames to the mote thread.
pub type ChannelTransport = BufferedTransport<Box<dyn FnMut(Vec<u8>) + Send>>;

/// A simulated mote served by a background thread.
///
/// The thread exits once every handle to the host link is dropped.
pub struct ThreadedMote {
    link: Arc<MoteLink<ChannelTransport, Sender<MoteEvent>>>,
    mote: Arc<Mutex<SimulatedMote>>,
}

impl ThreadedMote {
    /// Start the mote thread. Returns the harness and a [`Session`] bound to
    /// the host link.
    pub fn spawn(mote: SimulatedMote, config: LinkConfig) -> (Self, Session<ChannelTransport>) {
        let (wire_tx, wire_rx) = crossbeam_channel::unbounded::<Vec<u8>>();
        let transport: ChannelTransport = BufferedTransport::new(Box::new(move |chunk| {
            if wire_tx.send(chunk).is_err() {
                debug!("mote thread gone, frame dropped");
            }
        }));

        let (link, events) = MoteLink::with_channel(transport, config);
        let link = Arc::new(link);
        let mote = Arc::new(Mutex::new(mote));

        // Bytes the mote produced before the thread started
        flush_mote(&mote, &link);

        {
            let link = Arc::downgrade(&link);
            let mote = Arc::clone(&mote);
            std::thread::spawn(move || run_mote(wire_rx, mote, link));
        }

        let session = Session::new(Arc::clone(&link), events);
        (ThreadedMote { link, mote }, session)
    }

    pub fn link(&self) -> &Arc<MoteLink<ChannelTransport, Sender<MoteEvent>>> {
        &self.link
    }

    /// Run `f` on the mote, then forward whatever it wrote to the host.
    pub fn with_mote<R>(&self, f: impl FnOnce(&mut SimulatedMote) -> R) -> R {
        let result = f(&mut self.mote.lock());
        flush_mote(&self.mote, &self.link);
        result
    }
}

fn flush_mote(
    mote: &Mutex<SimulatedMote>,
    link: &MoteLink<ChannelTransport, Sender<MoteEvent>>,
) {
    let mut mote = mote.lock();
    let output = mote.take_output();
    if !output.is_empty() {
        link.on_bytes(&output);
    }
}

fn run_mote(
    wire: Receiver<Vec<u8>>,
    mote: Arc<Mutex<SimulatedMote>>,
    link: Weak<MoteLink<ChannelTransport, Sender<MoteEvent>>>,
) {
    while let Ok(chunk) = wire.recv() {
        let Some(link) = link.upgrade() else {
            break;
        };
        // Hold the mote lock while forwarding so output stays in order
        let mut mote = mote.lock();
        mote.feed(&chunk);
        let output = mote.take_output();
        if !output.is_empty() {
            link.on_bytes(&output);
        }
    }
    debug!("mote thread exiting");
}
