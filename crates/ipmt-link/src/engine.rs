//! Command engine: the single outstanding-command slot.

use tracing::debug;

use crate::catalog::CommandKind;
use crate::commands::Command;
use crate::config::LinkConfig;
use crate::error::{LinkError, LinkResult, ResultCode};
use crate::notifications::{notification_min_len, Notification};
use crate::replies::{Reply, ReplyData};

/// The command currently awaiting its reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCommand {
    pub kind: CommandKind,
    pub cmd_id: u8,
    pub param_id: Option<u8>,
}

/// What the engine made of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Well-formed reply to the pending command.
    Accepted(Reply),
    /// Not for us; the pending command is untouched.
    Ignored(&'static str),
}

#[derive(Debug)]
pub struct CommandEngine {
    pending: Option<PendingCommand>,
    max_payload_len: usize,
    notification_buffer_len: usize,
}

impl CommandEngine {
    pub fn new(config: &LinkConfig) -> Self {
        CommandEngine {
            pending: None,
            max_payload_len: config.max_payload_len.min(u8::MAX as usize),
            notification_buffer_len: config.notification_buffer_len,
        }
    }

    pub fn pending(&self) -> Option<PendingCommand> {
        self.pending
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Check the busy gate and encode `command` against the catalog.
    ///
    /// Nothing is recorded; call [`begin`](Self::begin) once the request is
    /// on the wire.
    pub fn prepare(&self, command: &Command) -> LinkResult<Vec<u8>> {
        if self.pending.is_some() {
            return Err(LinkError::Busy);
        }

        let entry = command.kind().entry();
        let payload = command.encode();

        if payload.len() > self.max_payload_len {
            return Err(LinkError::Malformed(format!(
                "{} request is {} bytes, limit is {}",
                entry.name,
                payload.len(),
                self.max_payload_len
            )));
        }

        let length_ok = if entry.variable_request {
            payload.len() >= entry.request_len
        } else {
            payload.len() == entry.request_len
        };
        if !length_ok {
            return Err(LinkError::Malformed(format!(
                "{} request is {} bytes, catalog says {}",
                entry.name,
                payload.len(),
                entry.request_len
            )));
        }

        Ok(payload)
    }

    /// Mark `kind` as outstanding.
    pub fn begin(&mut self, kind: CommandKind) {
        let entry = kind.entry();
        self.pending = Some(PendingCommand {
            kind,
            cmd_id: entry.cmd_id,
            param_id: entry.param_id,
        });
    }

    /// Match a reply against the pending command and decode it.
    ///
    /// `fields` are the bytes after the result code. Acceptance does not clear
    /// the slot; call [`complete`](Self::complete) after delivery.
    pub fn on_reply(&self, cmd_id: u8, rc: u8, fields: &[u8]) -> ReplyOutcome {
        let Some(pending) = self.pending else {
            return ReplyOutcome::Ignored("no command pending");
        };
        if pending.cmd_id != cmd_id {
            return ReplyOutcome::Ignored("command id mismatch");
        }

        let body = match pending.param_id {
            None => fields,
            Some(param_id) => match fields.split_first() {
                Some((&echo, rest)) if echo == param_id => rest,
                _ => return ReplyOutcome::Ignored("parameter id mismatch"),
            },
        };

        let rc = ResultCode::from(rc);
        let data = if rc.is_ok() {
            if fields.len() < pending.kind.entry().reply_len {
                return ReplyOutcome::Ignored("reply shorter than catalog length");
            }
            match ReplyData::decode(pending.kind, body) {
                Some(data) => Some(data),
                None => return ReplyOutcome::Ignored("reply fields undecodable"),
            }
        } else {
            None
        };

        ReplyOutcome::Accepted(Reply {
            kind: pending.kind,
            rc,
            data,
        })
    }

    /// Release the slot after a reply was delivered.
    pub fn complete(&mut self) {
        self.pending = None;
    }

    /// Release the slot without a reply.
    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!(command = %pending.kind, "command cancelled");
        }
    }

    /// Validate and decode a peer-originated payload.
    pub fn on_notification(&self, cmd_id: u8, payload: &[u8]) -> Option<Notification> {
        let Some(min_len) = notification_min_len(cmd_id) else {
            debug!(cmd_id, "unknown notification");
            return None;
        };
        if payload.len() < min_len || payload.len() > self.notification_buffer_len {
            debug!(
                cmd_id,
                len = payload.len(),
                min_len,
                max_len = self.notification_buffer_len,
                "notification length out of range"
            );
            return None;
        }
        Notification::decode(cmd_id, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{GetParameter, SetParameter};
    use crate::constants::*;
    use crate::records::SendToArgs;

    fn engine() -> CommandEngine {
        CommandEngine::new(&LinkConfig::default())
    }

    #[test]
    fn test_busy_gate() {
        let mut engine = engine();
        assert!(engine.prepare(&Command::Join).is_ok());
        engine.begin(CommandKind::Join);

        assert_eq!(engine.prepare(&Command::Reset), Err(LinkError::Busy));
        engine.cancel();
        assert!(engine.prepare(&Command::Reset).is_ok());
    }

    #[test]
    fn test_oversized_send_to_is_malformed() {
        let engine = engine();
        let command = Command::SendTo(SendToArgs {
            payload: vec![0; 106],
            ..Default::default()
        });
        assert!(matches!(engine.prepare(&command), Err(LinkError::Malformed(_))));

        let command = Command::SendTo(SendToArgs {
            payload: vec![0; 105],
            ..Default::default()
        });
        assert_eq!(engine.prepare(&command).map(|p| p.len()), Ok(128));
    }

    #[test]
    fn test_reply_for_other_command_is_ignored() {
        let mut engine = engine();
        engine.begin(CommandKind::Join);
        assert_eq!(
            engine.on_reply(CMDID_RESET, RC_OK, &[]),
            ReplyOutcome::Ignored("command id mismatch")
        );
        assert!(engine.is_busy());
    }

    #[test]
    fn test_parameter_echo_is_checked() {
        let mut engine = engine();
        engine.begin(CommandKind::GetNetworkId);

        let wrong = engine.on_reply(CMDID_GET_PARAMETER, RC_OK, &[PARAMID_TX_POWER, 0x04, 0xCD]);
        assert_eq!(wrong, ReplyOutcome::Ignored("parameter id mismatch"));

        let right = engine.on_reply(CMDID_GET_PARAMETER, RC_OK, &[PARAMID_NETWORK_ID, 0x04, 0xCD]);
        assert_eq!(
            right,
            ReplyOutcome::Accepted(Reply {
                kind: CommandKind::GetNetworkId,
                rc: ResultCode::Ok,
                data: Some(ReplyData::NetworkId(1229)),
            })
        );
    }

    #[test]
    fn test_undersized_success_reply_is_ignored() {
        let mut engine = engine();
        engine.begin(CommandKind::GetNetworkId);
        assert_eq!(
            engine.on_reply(CMDID_GET_PARAMETER, RC_OK, &[PARAMID_NETWORK_ID, 0x04]),
            ReplyOutcome::Ignored("reply shorter than catalog length")
        );
        assert!(engine.is_busy());
    }

    #[test]
    fn test_error_reply_has_no_data() {
        let mut engine = engine();
        engine.begin(CommandKind::SetNetworkId);
        let outcome = engine.on_reply(CMDID_SET_PARAMETER, RC_INVALID_VALUE, &[PARAMID_NETWORK_ID]);
        assert_eq!(
            outcome,
            ReplyOutcome::Accepted(Reply {
                kind: CommandKind::SetNetworkId,
                rc: ResultCode::InvalidValue,
                data: None,
            })
        );
    }

    #[test]
    fn test_notification_length_bounds() {
        let config = LinkConfig {
            notification_buffer_len: 24,
            ..Default::default()
        };
        let engine = CommandEngine::new(&config);

        assert!(engine.on_notification(CMDID_TX_DONE, &[0, 1, 0]).is_some());
        assert!(engine.on_notification(CMDID_TX_DONE, &[0, 1]).is_none());
        assert!(engine.on_notification(CMDID_MAC_RX, &[0; 25]).is_none());
        assert!(engine.on_notification(0x42, &[0; 4]).is_none());
    }

    #[test]
    fn test_set_then_get_kinds_are_distinct() {
        let set = Command::SetParameter(SetParameter::NetworkId(1));
        let get = Command::GetParameter(GetParameter::NetworkId);
        assert_ne!(set.kind().cmd_id(), get.kind().cmd_id());
        assert_eq!(set.kind().param_id(), get.kind().param_id());
    }
}
