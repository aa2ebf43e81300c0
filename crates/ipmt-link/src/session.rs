//! Blocking request/reply helper on top of [`MoteLink`].
//!
//! The link itself never waits. A [`Session`] owns the receiving end of the
//! event channel and gives application code a call-and-wait interface with a
//! deadline; notifications that arrive while waiting are queued, not lost.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use thiserror::Error;
use tracing::{debug, warn};

use crate::commands::Command;
use crate::error::LinkError;
use crate::events::MoteEvent;
use crate::link::MoteLink;
use crate::notifications::Notification;
use crate::replies::Reply;
use crate::transport::ByteTransport;

/// Errors from a [`Session`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The link refused the request.
    #[error(transparent)]
    Link(#[from] LinkError),

    /// No reply before the deadline. The command has been cancelled.
    #[error("no reply within {0:?}")]
    Timeout(Duration),

    /// The link side of the event channel is gone.
    #[error("event channel disconnected")]
    Disconnected,
}

pub type SessionResult<T> = Result<T, SessionError>;

/// A notification as queued by the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedNotification {
    pub cmd_id: u8,
    pub sub_cmd_id: u8,
    pub notification: Notification,
}

pub struct Session<T: ByteTransport> {
    link: Arc<MoteLink<T, Sender<MoteEvent>>>,
    events: Receiver<MoteEvent>,
    backlog: VecDeque<ReceivedNotification>,
}

impl<T: ByteTransport> Session<T> {
    pub fn new(link: Arc<MoteLink<T, Sender<MoteEvent>>>, events: Receiver<MoteEvent>) -> Self {
        Session {
            link,
            events,
            backlog: VecDeque::new(),
        }
    }

    pub fn link(&self) -> &Arc<MoteLink<T, Sender<MoteEvent>>> {
        &self.link
    }

    /// Invoke `command` and wait up to `timeout` for its reply.
    ///
    /// On timeout the outstanding command is cancelled so the link accepts a
    /// new one; a reply arriving later is discarded by the link.
    pub fn request(&mut self, command: &Command, timeout: Duration) -> SessionResult<Reply> {
        let kind = command.kind();
        self.discard_stale_replies();
        self.link.invoke(command)?;

        let deadline = Instant::now() + timeout;
        loop {
            match self.events.recv_deadline(deadline) {
                Ok(MoteEvent::Reply(reply)) if reply.kind == kind => return Ok(reply),
                Ok(MoteEvent::Reply(reply)) => {
                    warn!(expected = %kind, got = %reply.kind, "unexpected reply discarded");
                }
                Ok(MoteEvent::Notification {
                    cmd_id,
                    sub_cmd_id,
                    notification,
                }) => self.backlog.push_back(ReceivedNotification {
                    cmd_id,
                    sub_cmd_id,
                    notification,
                }),
                Err(RecvTimeoutError::Timeout) => {
                    debug!(command = %kind, ?timeout, "request timed out");
                    self.link.cancel_outstanding();
                    return Err(SessionError::Timeout(timeout));
                }
                Err(RecvTimeoutError::Disconnected) => {
                    self.link.cancel_outstanding();
                    return Err(SessionError::Disconnected);
                }
            }
        }
    }

    /// Next notification, waiting up to `timeout`. Queued notifications are
    /// returned first. `Ok(None)` means none arrived in time.
    pub fn next_notification(
        &mut self,
        timeout: Duration,
    ) -> SessionResult<Option<ReceivedNotification>> {
        if let Some(queued) = self.backlog.pop_front() {
            return Ok(Some(queued));
        }

        let deadline = Instant::now() + timeout;
        loop {
            match self.events.recv_deadline(deadline) {
                Ok(MoteEvent::Notification {
                    cmd_id,
                    sub_cmd_id,
                    notification,
                }) => {
                    return Ok(Some(ReceivedNotification {
                        cmd_id,
                        sub_cmd_id,
                        notification,
                    }))
                }
                Ok(MoteEvent::Reply(reply)) => {
                    warn!(got = %reply.kind, "reply with no request waiting discarded");
                }
                Err(RecvTimeoutError::Timeout) => return Ok(None),
                Err(RecvTimeoutError::Disconnected) => return Err(SessionError::Disconnected),
            }
        }
    }

    /// Drop replies queued before the current request, such as one that
    /// raced a timeout. Notifications move to the backlog.
    fn discard_stale_replies(&mut self) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                MoteEvent::Reply(reply) => {
                    debug!(got = %reply.kind, "stale reply discarded");
                }
                MoteEvent::Notification {
                    cmd_id,
                    sub_cmd_id,
                    notification,
                } => self.backlog.push_back(ReceivedNotification {
                    cmd_id,
                    sub_cmd_id,
                    notification,
                }),
            }
        }
    }

    /// Take every notification queued so far without waiting.
    pub fn drain_notifications(&mut self) -> Vec<ReceivedNotification> {
        while let Ok(event) = self.events.try_recv() {
            if let MoteEvent::Notification {
                cmd_id,
                sub_cmd_id,
                notification,
            } = event
            {
                self.backlog.push_back(ReceivedNotification {
                    cmd_id,
                    sub_cmd_id,
                    notification,
                });
            }
        }
        self.backlog.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LinkConfig;
    use crate::constants::*;
    use crate::hdlc::encode_frame;

    fn session() -> Session<Vec<u8>> {
        let (link, events) = MoteLink::with_channel(Vec::new(), LinkConfig::default());
        Session::new(Arc::new(link), events)
    }

    #[test]
    fn test_timeout_cancels_command() {
        let mut session = session();
        let result = session.request(&Command::Join, Duration::from_millis(20));
        assert_eq!(result, Err(SessionError::Timeout(Duration::from_millis(20))));
        assert!(!session.link().is_busy());
    }

    #[test]
    fn test_busy_is_reported_as_link_error() {
        let mut session = session();
        session.link().invoke(&Command::Reset).unwrap();
        let result = session.request(&Command::Join, Duration::from_millis(5));
        assert_eq!(result, Err(SessionError::Link(LinkError::Busy)));
    }

    #[test]
    fn test_stale_reply_does_not_answer_next_request() {
        let mut session = session();
        // A join reply left in the queue after its request was given up
        session.link().invoke(&Command::Join).unwrap();
        session
            .link()
            .on_bytes(&encode_frame(&[CMDID_JOIN, 1, FLAG_RESPONSE, RC_OK]));
        session
            .link()
            .on_bytes(&encode_frame(&[CMDID_TX_DONE, 3, FLAG_SYNC, 0, 4, 0]));
        assert!(!session.link().is_busy());

        let result = session.request(&Command::Join, Duration::from_millis(20));
        assert_eq!(result, Err(SessionError::Timeout(Duration::from_millis(20))));
        assert_eq!(session.drain_notifications().len(), 1);
    }

    #[test]
    fn test_queued_notification_is_returned() {
        let mut session = session();
        session
            .link()
            .on_bytes(&encode_frame(&[CMDID_TX_DONE, 3, FLAG_SYNC, 0, 4, 0]));

        let received = session
            .next_notification(Duration::from_millis(5))
            .unwrap()
            .unwrap();
        assert_eq!(received.cmd_id, CMDID_TX_DONE);
        assert_eq!(session.next_notification(Duration::from_millis(5)), Ok(None));
    }
}
