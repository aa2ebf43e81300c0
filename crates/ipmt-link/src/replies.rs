//! Typed replies (mote → host).

use crate::catalog::CommandKind;
use crate::error::ResultCode;
use crate::records::*;
use crate::wire::WireField;

/// Decoded reply fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyData {
    /// The command returns nothing beyond the result code (and parameter echo).
    Empty,
    MacAddress(MacAddress),
    NetworkId(u16),
    TxPower(i8),
    JoinDutyCycle(u8),
    EventMask(u32),
    MoteInfo(MoteInfo),
    NetInfo(NetInfo),
    MoteStatus(MoteStatus),
    Time(TimeInfo),
    Charge(Charge),
    TestRadioRxStats(TestRadioRxStats),
    OtapLockout(bool),
    MoteId(u16),
    Ipv6Address(Ipv6Address),
    RoutingMode(bool),
    AppInfo(AppInfo),
    PowerSrcInfo(PowerSrcInfo),
    AutoJoin(bool),
    ServiceInfo(ServiceInfo),
    OpenSocket { socket_id: u8 },
    SocketInfo(SocketInfo),
}

impl ReplyData {
    /// Decode the reply fields of `kind`. `fields` starts after the result code
    /// and, for parameterized commands, after the echoed parameter id.
    pub fn decode(kind: CommandKind, fields: &[u8]) -> Option<ReplyData> {
        let data = match kind {
            CommandKind::GetMacAddress => ReplyData::MacAddress(WireField::from_wire(fields)?),
            CommandKind::GetNetworkId => ReplyData::NetworkId(WireField::from_wire(fields)?),
            CommandKind::GetTxPower => ReplyData::TxPower(WireField::from_wire(fields)?),
            CommandKind::GetJoinDutyCycle => ReplyData::JoinDutyCycle(WireField::from_wire(fields)?),
            CommandKind::GetEventMask => ReplyData::EventMask(WireField::from_wire(fields)?),
            CommandKind::GetMoteInfo => ReplyData::MoteInfo(WireField::from_wire(fields)?),
            CommandKind::GetNetInfo => ReplyData::NetInfo(WireField::from_wire(fields)?),
            CommandKind::GetMoteStatus => ReplyData::MoteStatus(WireField::from_wire(fields)?),
            CommandKind::GetTime => ReplyData::Time(WireField::from_wire(fields)?),
            CommandKind::GetCharge => ReplyData::Charge(WireField::from_wire(fields)?),
            CommandKind::GetTestRadioRxStats => {
                ReplyData::TestRadioRxStats(WireField::from_wire(fields)?)
            }
            CommandKind::GetOtapLockout => ReplyData::OtapLockout(WireField::from_wire(fields)?),
            CommandKind::GetMoteId => ReplyData::MoteId(WireField::from_wire(fields)?),
            CommandKind::GetIpv6Address => ReplyData::Ipv6Address(WireField::from_wire(fields)?),
            CommandKind::GetRoutingMode => ReplyData::RoutingMode(WireField::from_wire(fields)?),
            CommandKind::GetAppInfo => ReplyData::AppInfo(WireField::from_wire(fields)?),
            CommandKind::GetPowerSrcInfo => ReplyData::PowerSrcInfo(WireField::from_wire(fields)?),
            CommandKind::GetAutoJoin => ReplyData::AutoJoin(WireField::from_wire(fields)?),
            CommandKind::GetServiceInfo => ReplyData::ServiceInfo(WireField::from_wire(fields)?),
            CommandKind::OpenSocket => ReplyData::OpenSocket {
                socket_id: WireField::from_wire(fields)?,
            },
            CommandKind::SocketInfo => ReplyData::SocketInfo(WireField::from_wire(fields)?),
            _ => ReplyData::Empty,
        };
        Some(data)
    }

    /// Encode the reply fields, without result code or parameter echo.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            ReplyData::Empty => Vec::new(),
            ReplyData::MacAddress(v) => v.to_wire(),
            ReplyData::NetworkId(v) => v.to_wire(),
            ReplyData::TxPower(v) => v.to_wire(),
            ReplyData::JoinDutyCycle(v) => v.to_wire(),
            ReplyData::EventMask(v) => v.to_wire(),
            ReplyData::MoteInfo(v) => v.to_wire(),
            ReplyData::NetInfo(v) => v.to_wire(),
            ReplyData::MoteStatus(v) => v.to_wire(),
            ReplyData::Time(v) => v.to_wire(),
            ReplyData::Charge(v) => v.to_wire(),
            ReplyData::TestRadioRxStats(v) => v.to_wire(),
            ReplyData::OtapLockout(v) => v.to_wire(),
            ReplyData::MoteId(v) => v.to_wire(),
            ReplyData::Ipv6Address(v) => v.to_wire(),
            ReplyData::RoutingMode(v) => v.to_wire(),
            ReplyData::AppInfo(v) => v.to_wire(),
            ReplyData::PowerSrcInfo(v) => v.to_wire(),
            ReplyData::AutoJoin(v) => v.to_wire(),
            ReplyData::ServiceInfo(v) => v.to_wire(),
            ReplyData::OpenSocket { socket_id } => socket_id.to_wire(),
            ReplyData::SocketInfo(v) => v.to_wire(),
        }
    }
}

/// Completion of an invoked command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub kind: CommandKind,
    pub rc: ResultCode,
    /// Decoded fields, present only when `rc` is OK.
    pub data: Option<ReplyData>,
}

impl Reply {
    /// Whether the mote reported success.
    pub fn is_ok(&self) -> bool {
        self.rc.is_ok()
    }
}
