//! Protocol constants
//!
//! These constants define the HDLC link configuration, the serial header flags,
//! and the command, parameter, notification and result codes of the SmartMesh IP
//! mote serial API. They must match the mote firmware bit-for-bit.

// ============================================================================
// HDLC link configuration
// ============================================================================

/// Frame delimiter.
pub const HDLC_FLAG: u8 = 0x7E;
/// Escape byte.
pub const HDLC_ESCAPE: u8 = 0x7D;
/// Mask XORed into an escaped byte.
pub const HDLC_ESCAPE_MASK: u8 = 0x20;
/// Initial value of the running CRC.
pub const HDLC_CRC_INIT: u16 = 0xFFFF;
/// Residue of the CRC computed over a frame including its own checksum.
pub const HDLC_CRC_GOOD: u16 = 0xF0B8;
/// Reflected CCITT polynomial used to build the CRC table.
pub const HDLC_CRC_POLY: u16 = 0x8408;
/// Default capacity of the receive buffer (unescaped bytes, CRC included).
pub const HDLC_INPUT_BUFFER_SIZE: usize = 128;

// ============================================================================
// Serial header
// ============================================================================

/// Length of the serial header (`cmdId`, `length`, `flags`).
pub const SERIAL_HEADER_LEN: usize = 3;
/// Flags bit: frame is a response.
pub const FLAG_RESPONSE: u8 = 0x01;
/// Flags bit: packet sequence bit.
pub const FLAG_PACKET_ID: u8 = 0x02;
/// Flags bit: resynchronize the sequence bit.
pub const FLAG_SYNC: u8 = 0x08;

/// Maximum application payload carried in one frame.
pub const MAX_FRAME_LENGTH: usize = 128;
/// Sub-command id passed with notifications; this API has none.
pub const SUBCMDID_NONE: u8 = 0xFF;

/// Well-known IPv6 address of the SmartMesh IP manager (`ff02::2`).
pub const IPV6_ADDR_MANAGER: [u8; 16] = [
    0xFF, 0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x02,
];

// ============================================================================
// Command IDs (requests, host → mote)
// ============================================================================

/// Write a mote parameter.
pub const CMDID_SET_PARAMETER: u8 = 0x01;
/// Read a mote parameter.
pub const CMDID_GET_PARAMETER: u8 = 0x02;
/// Start joining the network.
pub const CMDID_JOIN: u8 = 0x06;
/// Leave the network.
pub const CMDID_DISCONNECT: u8 = 0x07;
/// Reset the mote.
pub const CMDID_RESET: u8 = 0x08;
/// Enter deep sleep.
pub const CMDID_LOW_POWER_SLEEP: u8 = 0x09;
/// Radio receive test.
pub const CMDID_TEST_RADIO_RX: u8 = 0x0C;
/// Clear non-volatile storage.
pub const CMDID_CLEAR_NV: u8 = 0x10;
/// Request bandwidth from the manager.
pub const CMDID_REQUEST_SERVICE: u8 = 0x11;
/// Read the state of a service.
pub const CMDID_GET_SERVICE_INFO: u8 = 0x12;
/// Open a UDP socket.
pub const CMDID_OPEN_SOCKET: u8 = 0x15;
/// Close a socket.
pub const CMDID_CLOSE_SOCKET: u8 = 0x16;
/// Bind a socket to a port.
pub const CMDID_BIND_SOCKET: u8 = 0x17;
/// Send a packet.
pub const CMDID_SEND_TO: u8 = 0x18;
/// Listen for advertisements without joining.
pub const CMDID_SEARCH: u8 = 0x24;
/// Extended radio transmit test.
pub const CMDID_TEST_RADIO_TX_EXT: u8 = 0x28;
/// Erase all keys and parameters.
pub const CMDID_ZEROIZE: u8 = 0x29;
/// Read socket information.
pub const CMDID_SOCKET_INFO: u8 = 0x2B;

// ============================================================================
// Command IDs (notifications, mote → host)
// ============================================================================

/// Time indication.
pub const CMDID_TIME_INDICATION: u8 = 0x0D;
/// Network events.
pub const CMDID_EVENTS: u8 = 0x0F;
/// Packet received on a socket.
pub const CMDID_RECEIVE: u8 = 0x19;
/// Raw MAC-layer packet received (shares its id with `search`).
pub const CMDID_MAC_RX: u8 = 0x24;
/// Packet transmission completed.
pub const CMDID_TX_DONE: u8 = 0x25;
/// Advertisement received while searching.
pub const CMDID_ADV_RECEIVED: u8 = 0x26;

// ============================================================================
// Parameter IDs
// ============================================================================

pub const PARAMID_MAC_ADDRESS: u8 = 0x01;
pub const PARAMID_JOIN_KEY: u8 = 0x02;
pub const PARAMID_NETWORK_ID: u8 = 0x03;
pub const PARAMID_TX_POWER: u8 = 0x04;
pub const PARAMID_JOIN_DUTY_CYCLE: u8 = 0x06;
pub const PARAMID_EVENT_MASK: u8 = 0x0B;
pub const PARAMID_MOTE_INFO: u8 = 0x0C;
pub const PARAMID_NET_INFO: u8 = 0x0D;
pub const PARAMID_MOTE_STATUS: u8 = 0x0E;
pub const PARAMID_TIME: u8 = 0x0F;
pub const PARAMID_CHARGE: u8 = 0x10;
pub const PARAMID_TEST_RADIO_RX_STATS: u8 = 0x11;
pub const PARAMID_OTAP_LOCKOUT: u8 = 0x15;
pub const PARAMID_MOTE_ID: u8 = 0x17;
pub const PARAMID_IPV6_ADDRESS: u8 = 0x18;
pub const PARAMID_ROUTING_MODE: u8 = 0x1D;
pub const PARAMID_APP_INFO: u8 = 0x1E;
pub const PARAMID_POWER_SRC_INFO: u8 = 0x1F;
pub const PARAMID_ADV_KEY: u8 = 0x22;
pub const PARAMID_AUTO_JOIN: u8 = 0x24;

// ============================================================================
// Result codes
// ============================================================================

pub const RC_OK: u8 = 0;
pub const RC_BUSY: u8 = 3;
pub const RC_INVALID_LEN: u8 = 4;
pub const RC_INVALID_STATE: u8 = 5;
pub const RC_UNSUPPORTED: u8 = 6;
pub const RC_UNKNOWN_PARAM: u8 = 7;
pub const RC_UNKNOWN_CMD: u8 = 8;
pub const RC_WRITE_FAIL: u8 = 9;
pub const RC_READ_FAIL: u8 = 10;
pub const RC_LOW_VOLTAGE: u8 = 11;
pub const RC_NO_RESOURCES: u8 = 12;
pub const RC_INCOMPLETE_JOIN_INFO: u8 = 13;
pub const RC_NOT_FOUND: u8 = 14;
pub const RC_INVALID_VALUE: u8 = 15;
pub const RC_ACCESS_DENIED: u8 = 16;
pub const RC_ERASE_FAIL: u8 = 18;

// ============================================================================
// Mote states (moteStatus / events notification)
// ============================================================================

pub const MOTE_STATE_INIT: u8 = 0x00;
pub const MOTE_STATE_IDLE: u8 = 0x01;
pub const MOTE_STATE_SEARCHING: u8 = 0x02;
pub const MOTE_STATE_NEGOTIATING: u8 = 0x03;
pub const MOTE_STATE_CONNECTED: u8 = 0x04;
pub const MOTE_STATE_OPERATIONAL: u8 = 0x05;

// ============================================================================
// Event bits (events notification)
// ============================================================================

pub const EVENT_BOOT: u32 = 0x0001;
pub const EVENT_ALARM_CHANGE: u32 = 0x0002;
pub const EVENT_TIME_CHANGE: u32 = 0x0004;
pub const EVENT_JOIN_FAIL: u32 = 0x0008;
pub const EVENT_DISCONNECTED: u32 = 0x0010;
pub const EVENT_OPERATIONAL: u32 = 0x0020;
pub const EVENT_SVC_CHANGE: u32 = 0x0080;
pub const EVENT_JOIN_STARTED: u32 = 0x0100;
