//! Simulated SmartMesh IP mote.
//!
//! A [`SimulatedMote`] implements the mote side of the serial API well enough
//! to drive the host link through every catalog command: it keeps a parameter
//! store, tracks a join state, opens sockets, raises notifications with correct
//! sequence and SYNC bits and records the acknowledgements it receives.
//!
//! The [`harness`] module connects one to a host [`ipmt_link::MoteLink`],
//! either single-threaded ([`Loopback`]) or on a background thread
//! ([`ThreadedMote`]).

pub mod harness;

mod error;
mod mote;
mod params;

pub use error::*;
pub use harness::{ChannelTransport, Loopback, ThreadedMote};
pub use mote::*;
pub use params::*;
