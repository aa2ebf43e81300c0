//! Static command catalog.
//!
//! One entry per request the host can issue. Lengths count application bytes
//! only: for parameterized commands they include the parameter id, for replies
//! they exclude the result code.

use crate::constants::*;

/// Every request in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    SetMacAddress,
    SetJoinKey,
    SetNetworkId,
    SetTxPower,
    SetJoinDutyCycle,
    SetEventMask,
    SetOtapLockout,
    SetRoutingMode,
    SetPowerSrcInfo,
    SetAdvKey,
    SetAutoJoin,
    GetMacAddress,
    GetNetworkId,
    GetTxPower,
    GetJoinDutyCycle,
    GetEventMask,
    GetMoteInfo,
    GetNetInfo,
    GetMoteStatus,
    GetTime,
    GetCharge,
    GetTestRadioRxStats,
    GetOtapLockout,
    GetMoteId,
    GetIpv6Address,
    GetRoutingMode,
    GetAppInfo,
    GetPowerSrcInfo,
    GetAutoJoin,
    Join,
    Disconnect,
    Reset,
    LowPowerSleep,
    TestRadioRx,
    ClearNv,
    RequestService,
    GetServiceInfo,
    OpenSocket,
    CloseSocket,
    BindSocket,
    SendTo,
    Search,
    TestRadioTxExt,
    Zeroize,
    SocketInfo,
}

/// Wire metadata of one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub kind: CommandKind,
    /// Name as used by the mote API documentation.
    pub name: &'static str,
    pub cmd_id: u8,
    /// Parameter id prefixed to the request and echoed in the reply.
    pub param_id: Option<u8>,
    /// Request payload length (the minimum when `variable_request` is set).
    pub request_len: usize,
    /// Request ends in a variable-length tail.
    pub variable_request: bool,
    /// Minimum reply length after the result code, on success.
    pub reply_len: usize,
}

const fn plain(kind: CommandKind, name: &'static str, cmd_id: u8, req: usize, rep: usize) -> CatalogEntry {
    CatalogEntry {
        kind,
        name,
        cmd_id,
        param_id: None,
        request_len: req,
        variable_request: false,
        reply_len: rep,
    }
}

const fn set(kind: CommandKind, name: &'static str, param_id: u8, req: usize) -> CatalogEntry {
    CatalogEntry {
        kind,
        name,
        cmd_id: CMDID_SET_PARAMETER,
        param_id: Some(param_id),
        request_len: req,
        variable_request: false,
        reply_len: 1,
    }
}

const fn get(kind: CommandKind, name: &'static str, param_id: u8, rep: usize) -> CatalogEntry {
    CatalogEntry {
        kind,
        name,
        cmd_id: CMDID_GET_PARAMETER,
        param_id: Some(param_id),
        request_len: 1,
        variable_request: false,
        reply_len: rep,
    }
}

use CommandKind as K;

/// The catalog, in [`CommandKind`] declaration order.
pub static CATALOG: [CatalogEntry; 45] = [
    set(K::SetMacAddress, "setParameter.macAddress", PARAMID_MAC_ADDRESS, 9),
    set(K::SetJoinKey, "setParameter.joinKey", PARAMID_JOIN_KEY, 17),
    set(K::SetNetworkId, "setParameter.networkId", PARAMID_NETWORK_ID, 3),
    set(K::SetTxPower, "setParameter.txPower", PARAMID_TX_POWER, 2),
    set(K::SetJoinDutyCycle, "setParameter.joinDutyCycle", PARAMID_JOIN_DUTY_CYCLE, 2),
    set(K::SetEventMask, "setParameter.eventMask", PARAMID_EVENT_MASK, 5),
    set(K::SetOtapLockout, "setParameter.OTAPLockout", PARAMID_OTAP_LOCKOUT, 2),
    set(K::SetRoutingMode, "setParameter.routingMode", PARAMID_ROUTING_MODE, 2),
    set(K::SetPowerSrcInfo, "setParameter.powerSrcInfo", PARAMID_POWER_SRC_INFO, 22),
    set(K::SetAdvKey, "setParameter.advKey", PARAMID_ADV_KEY, 17),
    set(K::SetAutoJoin, "setParameter.autoJoin", PARAMID_AUTO_JOIN, 2),
    get(K::GetMacAddress, "getParameter.macAddress", PARAMID_MAC_ADDRESS, 9),
    get(K::GetNetworkId, "getParameter.networkId", PARAMID_NETWORK_ID, 3),
    get(K::GetTxPower, "getParameter.txPower", PARAMID_TX_POWER, 2),
    get(K::GetJoinDutyCycle, "getParameter.joinDutyCycle", PARAMID_JOIN_DUTY_CYCLE, 2),
    get(K::GetEventMask, "getParameter.eventMask", PARAMID_EVENT_MASK, 5),
    get(K::GetMoteInfo, "getParameter.moteInfo", PARAMID_MOTE_INFO, 18),
    get(K::GetNetInfo, "getParameter.netInfo", PARAMID_NET_INFO, 15),
    get(K::GetMoteStatus, "getParameter.moteStatus", PARAMID_MOTE_STATUS, 11),
    get(K::GetTime, "getParameter.time", PARAMID_TIME, 24),
    get(K::GetCharge, "getParameter.charge", PARAMID_CHARGE, 11),
    get(K::GetTestRadioRxStats, "getParameter.testRadioRxStats", PARAMID_TEST_RADIO_RX_STATS, 5),
    get(K::GetOtapLockout, "getParameter.OTAPLockout", PARAMID_OTAP_LOCKOUT, 2),
    get(K::GetMoteId, "getParameter.moteId", PARAMID_MOTE_ID, 3),
    get(K::GetIpv6Address, "getParameter.ipv6Address", PARAMID_IPV6_ADDRESS, 17),
    get(K::GetRoutingMode, "getParameter.routingMode", PARAMID_ROUTING_MODE, 2),
    get(K::GetAppInfo, "getParameter.appInfo", PARAMID_APP_INFO, 9),
    get(K::GetPowerSrcInfo, "getParameter.powerSrcInfo", PARAMID_POWER_SRC_INFO, 22),
    get(K::GetAutoJoin, "getParameter.autoJoin", PARAMID_AUTO_JOIN, 2),
    plain(K::Join, "join", CMDID_JOIN, 0, 0),
    plain(K::Disconnect, "disconnect", CMDID_DISCONNECT, 0, 0),
    plain(K::Reset, "reset", CMDID_RESET, 0, 0),
    plain(K::LowPowerSleep, "lowPowerSleep", CMDID_LOW_POWER_SLEEP, 0, 0),
    plain(K::TestRadioRx, "testRadioRx", CMDID_TEST_RADIO_RX, 5, 0),
    plain(K::ClearNv, "clearNV", CMDID_CLEAR_NV, 0, 0),
    plain(K::RequestService, "requestService", CMDID_REQUEST_SERVICE, 7, 0),
    plain(K::GetServiceInfo, "getServiceInfo", CMDID_GET_SERVICE_INFO, 3, 8),
    plain(K::OpenSocket, "openSocket", CMDID_OPEN_SOCKET, 1, 1),
    plain(K::CloseSocket, "closeSocket", CMDID_CLOSE_SOCKET, 1, 0),
    plain(K::BindSocket, "bindSocket", CMDID_BIND_SOCKET, 3, 0),
    CatalogEntry {
        variable_request: true,
        ..plain(K::SendTo, "sendTo", CMDID_SEND_TO, 23, 0)
    },
    plain(K::Search, "search", CMDID_SEARCH, 0, 0),
    plain(K::TestRadioTxExt, "testRadioTxExt", CMDID_TEST_RADIO_TX_EXT, 38, 0),
    plain(K::Zeroize, "zeroize", CMDID_ZEROIZE, 0, 0),
    plain(K::SocketInfo, "socketInfo", CMDID_SOCKET_INFO, 1, 6),
];

impl CommandKind {
    /// Catalog entry of this command.
    pub fn entry(self) -> &'static CatalogEntry {
        &CATALOG[self as usize]
    }

    pub fn cmd_id(self) -> u8 {
        self.entry().cmd_id
    }

    pub fn param_id(self) -> Option<u8> {
        self.entry().param_id
    }

    pub fn name(self) -> &'static str {
        self.entry().name
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Find the entry for a request as it appears on the wire.
pub fn lookup(cmd_id: u8, param_id: Option<u8>) -> Option<&'static CatalogEntry> {
    CATALOG.iter().find(|entry| {
        entry.cmd_id == cmd_id && (entry.param_id.is_none() || entry.param_id == param_id)
    })
}

/// Find an entry by its documented name, e.g. `getParameter.moteInfo`.
pub fn lookup_name(name: &str) -> Option<&'static CatalogEntry> {
    CATALOG
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(name))
}
