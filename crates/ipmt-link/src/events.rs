//! Upward delivery of replies and notifications.

use crossbeam_channel::{Sender, TrySendError};
use tracing::warn;

use crate::notifications::Notification;
use crate::replies::Reply;

/// Something the mote told the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoteEvent {
    /// Completion of the outstanding command.
    Reply(Reply),
    /// Unsolicited notification.
    Notification {
        cmd_id: u8,
        /// Always `SUBCMDID_NONE` for this API.
        sub_cmd_id: u8,
        notification: Notification,
    },
}

/// Receives events from the link.
///
/// Called with the link lock held: implementations must not block and must
/// not call back into the link.
pub trait EventSink {
    /// Deliver one event. Returns `false` if it was dropped.
    fn deliver(&self, event: MoteEvent) -> bool;
}

impl EventSink for Sender<MoteEvent> {
    fn deliver(&self, event: MoteEvent) -> bool {
        match self.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                warn!(?event, "event queue full, dropping");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("event receiver gone, dropping");
                false
            }
        }
    }
}
