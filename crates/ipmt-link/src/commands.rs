//! Typed requests (host → mote).

use crate::catalog::CommandKind;
use crate::records::*;
use crate::wire::WireField;

/// Value written by `setParameter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetParameter {
    /// Takes effect after the next reset.
    MacAddress(MacAddress),
    JoinKey(Key),
    NetworkId(u16),
    /// Output power, in dBm.
    TxPower(i8),
    JoinDutyCycle(u8),
    /// Bitmap of `EVENT_*` values to report.
    EventMask(u32),
    OtapLockout(bool),
    RoutingMode(bool),
    PowerSrcInfo(PowerSrcInfo),
    AdvKey(Key),
    AutoJoin(bool),
}

/// Parameter read by `getParameter`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GetParameter {
    MacAddress,
    NetworkId,
    TxPower,
    JoinDutyCycle,
    EventMask,
    MoteInfo,
    NetInfo,
    MoteStatus,
    Time,
    Charge,
    TestRadioRxStats,
    OtapLockout,
    MoteId,
    Ipv6Address,
    RoutingMode,
    AppInfo,
    PowerSrcInfo,
    AutoJoin,
}

impl GetParameter {
    /// All readable parameters.
    pub const ALL: [GetParameter; 18] = [
        GetParameter::MacAddress,
        GetParameter::NetworkId,
        GetParameter::TxPower,
        GetParameter::JoinDutyCycle,
        GetParameter::EventMask,
        GetParameter::MoteInfo,
        GetParameter::NetInfo,
        GetParameter::MoteStatus,
        GetParameter::Time,
        GetParameter::Charge,
        GetParameter::TestRadioRxStats,
        GetParameter::OtapLockout,
        GetParameter::MoteId,
        GetParameter::Ipv6Address,
        GetParameter::RoutingMode,
        GetParameter::AppInfo,
        GetParameter::PowerSrcInfo,
        GetParameter::AutoJoin,
    ];

    pub fn kind(self) -> CommandKind {
        match self {
            GetParameter::MacAddress => CommandKind::GetMacAddress,
            GetParameter::NetworkId => CommandKind::GetNetworkId,
            GetParameter::TxPower => CommandKind::GetTxPower,
            GetParameter::JoinDutyCycle => CommandKind::GetJoinDutyCycle,
            GetParameter::EventMask => CommandKind::GetEventMask,
            GetParameter::MoteInfo => CommandKind::GetMoteInfo,
            GetParameter::NetInfo => CommandKind::GetNetInfo,
            GetParameter::MoteStatus => CommandKind::GetMoteStatus,
            GetParameter::Time => CommandKind::GetTime,
            GetParameter::Charge => CommandKind::GetCharge,
            GetParameter::TestRadioRxStats => CommandKind::GetTestRadioRxStats,
            GetParameter::OtapLockout => CommandKind::GetOtapLockout,
            GetParameter::MoteId => CommandKind::GetMoteId,
            GetParameter::Ipv6Address => CommandKind::GetIpv6Address,
            GetParameter::RoutingMode => CommandKind::GetRoutingMode,
            GetParameter::AppInfo => CommandKind::GetAppInfo,
            GetParameter::PowerSrcInfo => CommandKind::GetPowerSrcInfo,
            GetParameter::AutoJoin => CommandKind::GetAutoJoin,
        }
    }

    /// Parse a parameter name as written in the mote API, e.g. `moteInfo`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|param| {
            param
                .kind()
                .name()
                .strip_prefix("getParameter.")
                .is_some_and(|n| n.eq_ignore_ascii_case(name))
        })
    }
}

/// A request to the mote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetParameter(SetParameter),
    GetParameter(GetParameter),
    /// Start searching for and joining a network.
    Join,
    Disconnect,
    Reset,
    /// Enter deep sleep. Only a hardware reset wakes the mote.
    LowPowerSleep,
    TestRadioRx(TestRadioRxArgs),
    /// Restore factory parameters. Takes effect after reset.
    ClearNv,
    RequestService(RequestServiceArgs),
    GetServiceInfo(ServiceInfoArgs),
    OpenSocket {
        /// Only UDP (0) is supported by the mote.
        protocol: u8,
    },
    CloseSocket {
        socket_id: u8,
    },
    BindSocket(BindSocketArgs),
    SendTo(SendToArgs),
    /// Listen for advertisements without joining.
    Search,
    TestRadioTxExt(TestRadioTxExtArgs),
    Zeroize,
    SocketInfo {
        index: u8,
    },
}

impl Command {
    /// The catalog entry this request is checked against.
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::SetParameter(param) => match param {
                SetParameter::MacAddress(_) => CommandKind::SetMacAddress,
                SetParameter::JoinKey(_) => CommandKind::SetJoinKey,
                SetParameter::NetworkId(_) => CommandKind::SetNetworkId,
                SetParameter::TxPower(_) => CommandKind::SetTxPower,
                SetParameter::JoinDutyCycle(_) => CommandKind::SetJoinDutyCycle,
                SetParameter::EventMask(_) => CommandKind::SetEventMask,
                SetParameter::OtapLockout(_) => CommandKind::SetOtapLockout,
                SetParameter::RoutingMode(_) => CommandKind::SetRoutingMode,
                SetParameter::PowerSrcInfo(_) => CommandKind::SetPowerSrcInfo,
                SetParameter::AdvKey(_) => CommandKind::SetAdvKey,
                SetParameter::AutoJoin(_) => CommandKind::SetAutoJoin,
            },
            Command::GetParameter(param) => param.kind(),
            Command::Join => CommandKind::Join,
            Command::Disconnect => CommandKind::Disconnect,
            Command::Reset => CommandKind::Reset,
            Command::LowPowerSleep => CommandKind::LowPowerSleep,
            Command::TestRadioRx(_) => CommandKind::TestRadioRx,
            Command::ClearNv => CommandKind::ClearNv,
            Command::RequestService(_) => CommandKind::RequestService,
            Command::GetServiceInfo(_) => CommandKind::GetServiceInfo,
            Command::OpenSocket { .. } => CommandKind::OpenSocket,
            Command::CloseSocket { .. } => CommandKind::CloseSocket,
            Command::BindSocket(_) => CommandKind::BindSocket,
            Command::SendTo(_) => CommandKind::SendTo,
            Command::Search => CommandKind::Search,
            Command::TestRadioTxExt(_) => CommandKind::TestRadioTxExt,
            Command::Zeroize => CommandKind::Zeroize,
            Command::SocketInfo { .. } => CommandKind::SocketInfo,
        }
    }

    /// Encode the request payload, parameter id first for parameterized
    /// commands. Length is not checked here.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        if let Some(param_id) = self.kind().param_id() {
            buf.push(param_id);
        }

        match self {
            Command::SetParameter(param) => match param {
                SetParameter::MacAddress(v) => v.put(&mut buf),
                SetParameter::JoinKey(v) => v.put(&mut buf),
                SetParameter::NetworkId(v) => v.put(&mut buf),
                SetParameter::TxPower(v) => v.put(&mut buf),
                SetParameter::JoinDutyCycle(v) => v.put(&mut buf),
                SetParameter::EventMask(v) => v.put(&mut buf),
                SetParameter::OtapLockout(v) => v.put(&mut buf),
                SetParameter::RoutingMode(v) => v.put(&mut buf),
                SetParameter::PowerSrcInfo(v) => v.put(&mut buf),
                SetParameter::AdvKey(v) => v.put(&mut buf),
                SetParameter::AutoJoin(v) => v.put(&mut buf),
            },
            Command::GetParameter(_)
            | Command::Join
            | Command::Disconnect
            | Command::Reset
            | Command::LowPowerSleep
            | Command::ClearNv
            | Command::Search
            | Command::Zeroize => {}
            Command::TestRadioRx(args) => args.put(&mut buf),
            Command::RequestService(args) => args.put(&mut buf),
            Command::GetServiceInfo(args) => args.put(&mut buf),
            Command::OpenSocket { protocol } => protocol.put(&mut buf),
            Command::CloseSocket { socket_id } => socket_id.put(&mut buf),
            Command::BindSocket(args) => args.put(&mut buf),
            Command::SendTo(args) => args.put(&mut buf),
            Command::TestRadioTxExt(args) => args.put(&mut buf),
            Command::SocketInfo { index } => index.put(&mut buf),
        }

        buf
    }

    /// Decode a request payload as received by the mote. The payload must
    /// include the parameter id for parameterized commands.
    pub fn decode(cmd_id: u8, payload: &[u8]) -> Option<Command> {
        let entry = crate::catalog::lookup(cmd_id, payload.first().copied())?;
        let body = if entry.param_id.is_some() {
            &payload[1..]
        } else {
            payload
        };

        let command = match entry.kind {
            CommandKind::SetMacAddress => Command::SetParameter(SetParameter::MacAddress(WireField::from_wire(body)?)),
            CommandKind::SetJoinKey => Command::SetParameter(SetParameter::JoinKey(WireField::from_wire(body)?)),
            CommandKind::SetNetworkId => Command::SetParameter(SetParameter::NetworkId(WireField::from_wire(body)?)),
            CommandKind::SetTxPower => Command::SetParameter(SetParameter::TxPower(WireField::from_wire(body)?)),
            CommandKind::SetJoinDutyCycle => Command::SetParameter(SetParameter::JoinDutyCycle(WireField::from_wire(body)?)),
            CommandKind::SetEventMask => Command::SetParameter(SetParameter::EventMask(WireField::from_wire(body)?)),
            CommandKind::SetOtapLockout => Command::SetParameter(SetParameter::OtapLockout(WireField::from_wire(body)?)),
            CommandKind::SetRoutingMode => Command::SetParameter(SetParameter::RoutingMode(WireField::from_wire(body)?)),
            CommandKind::SetPowerSrcInfo => Command::SetParameter(SetParameter::PowerSrcInfo(WireField::from_wire(body)?)),
            CommandKind::SetAdvKey => Command::SetParameter(SetParameter::AdvKey(WireField::from_wire(body)?)),
            CommandKind::SetAutoJoin => Command::SetParameter(SetParameter::AutoJoin(WireField::from_wire(body)?)),
            CommandKind::Join => Command::Join,
            CommandKind::Disconnect => Command::Disconnect,
            CommandKind::Reset => Command::Reset,
            CommandKind::LowPowerSleep => Command::LowPowerSleep,
            CommandKind::TestRadioRx => Command::TestRadioRx(WireField::from_wire(body)?),
            CommandKind::ClearNv => Command::ClearNv,
            CommandKind::RequestService => Command::RequestService(WireField::from_wire(body)?),
            CommandKind::GetServiceInfo => Command::GetServiceInfo(WireField::from_wire(body)?),
            CommandKind::OpenSocket => Command::OpenSocket {
                protocol: WireField::from_wire(body)?,
            },
            CommandKind::CloseSocket => Command::CloseSocket {
                socket_id: WireField::from_wire(body)?,
            },
            CommandKind::BindSocket => Command::BindSocket(WireField::from_wire(body)?),
            CommandKind::SendTo => Command::SendTo(WireField::from_wire(body)?),
            CommandKind::Search => Command::Search,
            CommandKind::TestRadioTxExt => Command::TestRadioTxExt(WireField::from_wire(body)?),
            CommandKind::Zeroize => Command::Zeroize,
            CommandKind::SocketInfo => Command::SocketInfo {
                index: WireField::from_wire(body)?,
            },
            get => {
                let param = GetParameter::ALL.into_iter().find(|p| p.kind() == get)?;
                Command::GetParameter(param)
            }
        };
        Some(command)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::*;

    #[test]
    fn test_every_command_matches_catalog_length() {
        let commands = vec![
            Command::SetParameter(SetParameter::MacAddress([1; 8])),
            Command::SetParameter(SetParameter::JoinKey([2; 16])),
            Command::SetParameter(SetParameter::NetworkId(1229)),
            Command::SetParameter(SetParameter::TxPower(8)),
            Command::SetParameter(SetParameter::JoinDutyCycle(255)),
            Command::SetParameter(SetParameter::EventMask(0xFF)),
            Command::SetParameter(SetParameter::OtapLockout(true)),
            Command::SetParameter(SetParameter::RoutingMode(false)),
            Command::SetParameter(SetParameter::PowerSrcInfo(PowerSrcInfo::default())),
            Command::SetParameter(SetParameter::AdvKey([3; 16])),
            Command::SetParameter(SetParameter::AutoJoin(true)),
            Command::Join,
            Command::Disconnect,
            Command::Reset,
            Command::LowPowerSleep,
            Command::TestRadioRx(TestRadioRxArgs::default()),
            Command::ClearNv,
            Command::RequestService(RequestServiceArgs::default()),
            Command::GetServiceInfo(ServiceInfoArgs::default()),
            Command::OpenSocket { protocol: 0 },
            Command::CloseSocket { socket_id: 22 },
            Command::BindSocket(BindSocketArgs::default()),
            Command::SendTo(SendToArgs::default()),
            Command::Search,
            Command::TestRadioTxExt(TestRadioTxExtArgs::default()),
            Command::Zeroize,
            Command::SocketInfo { index: 0 },
        ];

        for command in commands
            .into_iter()
            .chain(GetParameter::ALL.into_iter().map(Command::GetParameter))
        {
            let entry = command.kind().entry();
            assert_eq!(command.encode().len(), entry.request_len, "{}", entry.name);
        }
    }

    #[test]
    fn test_set_network_id_encoding() {
        let command = Command::SetParameter(SetParameter::NetworkId(0x04CD));
        assert_eq!(command.encode(), vec![PARAMID_NETWORK_ID, 0x04, 0xCD]);
    }

    #[test]
    fn test_send_to_encoding() {
        let command = Command::SendTo(SendToArgs {
            socket_id: 22,
            dest_ip: IPV6_ADDR_MANAGER,
            dest_port: 0xF0B8,
            service_type: 0,
            priority: 1,
            packet_id: 0x1234,
            payload: vec![0xAA, 0xBB],
        });
        let bytes = command.encode();
        assert_eq!(bytes.len(), 25);
        assert_eq!(bytes[0], 22);
        assert_eq!(&bytes[1..17], &IPV6_ADDR_MANAGER);
        assert_eq!(&bytes[17..19], &[0xF0, 0xB8]);
        assert_eq!(&bytes[21..23], &[0x12, 0x34]);
        assert_eq!(&bytes[23..], &[0xAA, 0xBB]);
    }

    #[test]
    fn test_decode_request() {
        let command = Command::SetParameter(SetParameter::TxPower(-2));
        let decoded = Command::decode(CMDID_SET_PARAMETER, &command.encode());
        assert_eq!(decoded, Some(command));

        let get = Command::decode(CMDID_GET_PARAMETER, &[PARAMID_CHARGE]);
        assert_eq!(get, Some(Command::GetParameter(GetParameter::Charge)));

        assert_eq!(Command::decode(CMDID_OPEN_SOCKET, &[]), None);
        assert_eq!(Command::decode(CMDID_GET_PARAMETER, &[0x7F]), None);
    }

    #[test]
    fn test_get_parameter_from_name() {
        assert_eq!(GetParameter::from_name("moteInfo"), Some(GetParameter::MoteInfo));
        assert_eq!(GetParameter::from_name("otaplockout"), Some(GetParameter::OtapLockout));
        assert_eq!(GetParameter::from_name("nope"), None);
    }
}
