//! Link counters.

use serde::Serialize;

/// Counters of everything the link received, delivered or discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    /// Frames that passed the CRC check.
    pub frames_received: u64,
    pub crc_failures: u64,
    pub overflows: u64,
    /// Frames too short for their serial header or length field.
    pub runts: u64,
    pub duplicates: u64,
    pub acks_sent: u64,
    pub requests_sent: u64,
    pub replies_accepted: u64,
    /// Replies dropped for a wrong command id, parameter id or length.
    pub replies_ignored: u64,
    /// Accepted replies the sink refused. The command stays outstanding.
    pub replies_dropped: u64,
    pub notifications_delivered: u64,
    /// Notifications that were unknown, malformed or refused by the sink.
    pub notifications_dropped: u64,
}
