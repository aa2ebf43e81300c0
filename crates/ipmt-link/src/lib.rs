//! SmartMesh IP Mote Host Link
//!
//! This crate implements the host side of the serial API exposed by SmartMesh
//! IP motes. A host talks to the mote over a UART through three layers:
//!
//! - **HDLC framing**: `0x7E`-delimited, byte-stuffed frames with an FCS-16
//!   trailer ([`HdlcReceiver`], [`HdlcSender`])
//! - **Packet transport**: a 3-byte header with per-direction sequence bits,
//!   acknowledgements and duplicate suppression ([`SerialLayer`])
//! - **Command API**: one outstanding typed [`Command`], correlated with its
//!   typed [`Reply`], plus decoded [`Notification`]s ([`CommandEngine`])
//!
//! [`MoteLink`] ties them together behind a single lock so bytes can be fed
//! from a reader thread while commands are issued from another.
//!
//! # Example
//!
//! ```rust,ignore
//! use ipmt_link::{Command, GetParameter, LinkConfig, MoteLink, Session};
//!
//! let (link, events) = MoteLink::with_channel(uart_tx, LinkConfig::default());
//! let link = std::sync::Arc::new(link);
//!
//! // Reader thread: link.on_bytes(&buf[..n]);
//!
//! let mut session = Session::new(link.clone(), events);
//! let reply = session.request(
//!     &Command::GetParameter(GetParameter::MoteStatus),
//!     std::time::Duration::from_secs(1),
//! )?;
//! ```

pub mod wire;

mod catalog;
mod commands;
mod config;
mod constants;
mod engine;
mod error;
mod events;
mod hdlc;
mod link;
mod notifications;
mod records;
mod replies;
mod serial;
mod session;
mod stats;
mod transport;

pub use catalog::*;
pub use commands::*;
pub use config::*;
pub use constants::*;
pub use engine::*;
pub use error::*;
pub use events::*;
pub use hdlc::*;
pub use link::*;
pub use notifications::*;
pub use records::*;
pub use replies::*;
pub use serial::*;
pub use session::*;
pub use stats::*;
pub use transport::*;
pub use wire::WireField;
