//! Unsolicited notifications (mote → host).

use crate::constants::*;
use crate::records::*;
use crate::wire::WireField;

/// A decoded notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    TimeIndication(TimeIndication),
    Events(Events),
    Receive(Receive),
    MacRx(MacRx),
    TxDone(TxDone),
    AdvReceived(AdvReceived),
}

/// Minimum payload length of notification `cmd_id`, or `None` if unknown.
pub fn notification_min_len(cmd_id: u8) -> Option<usize> {
    match cmd_id {
        CMDID_TIME_INDICATION => Some(TimeIndication::WIRE_LEN),
        CMDID_EVENTS => Some(Events::WIRE_LEN),
        CMDID_RECEIVE => Some(Receive::WIRE_LEN),
        CMDID_MAC_RX => Some(MacRx::WIRE_LEN),
        CMDID_TX_DONE => Some(TxDone::WIRE_LEN),
        CMDID_ADV_RECEIVED => Some(AdvReceived::WIRE_LEN),
        _ => None,
    }
}

impl Notification {
    /// Command id this notification travels under.
    pub fn cmd_id(&self) -> u8 {
        match self {
            Notification::TimeIndication(_) => CMDID_TIME_INDICATION,
            Notification::Events(_) => CMDID_EVENTS,
            Notification::Receive(_) => CMDID_RECEIVE,
            Notification::MacRx(_) => CMDID_MAC_RX,
            Notification::TxDone(_) => CMDID_TX_DONE,
            Notification::AdvReceived(_) => CMDID_ADV_RECEIVED,
        }
    }

    /// Decode a notification payload. Returns `None` for unknown ids and
    /// payloads shorter than the notification's minimum.
    pub fn decode(cmd_id: u8, payload: &[u8]) -> Option<Notification> {
        let notification = match cmd_id {
            CMDID_TIME_INDICATION => Notification::TimeIndication(WireField::from_wire(payload)?),
            CMDID_EVENTS => Notification::Events(WireField::from_wire(payload)?),
            CMDID_RECEIVE => Notification::Receive(WireField::from_wire(payload)?),
            CMDID_MAC_RX => Notification::MacRx(WireField::from_wire(payload)?),
            CMDID_TX_DONE => Notification::TxDone(WireField::from_wire(payload)?),
            CMDID_ADV_RECEIVED => Notification::AdvReceived(WireField::from_wire(payload)?),
            _ => return None,
        };
        Some(notification)
    }

    /// Encode the notification payload.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Notification::TimeIndication(n) => n.to_wire(),
            Notification::Events(n) => n.to_wire(),
            Notification::Receive(n) => n.to_wire(),
            Notification::MacRx(n) => n.to_wire(),
            Notification::TxDone(n) => n.to_wire(),
            Notification::AdvReceived(n) => n.to_wire(),
        }
    }
}
