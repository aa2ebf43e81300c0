//! Fixed-layout records carried in requests, replies and notifications.
//!
//! All multi-byte integers are big-endian. Records that end in a `Vec<u8>`
//! field carry a variable-length tail.

use crate::wire_record;

/// 8-byte IEEE EUI-64 address.
pub type MacAddress = [u8; 8];
/// 16-byte AES key.
pub type Key = [u8; 16];
/// 16-byte IPv6 address.
pub type Ipv6Address = [u8; 16];
/// 5-byte absolute slot number.
pub type Asn = [u8; 5];

// ============================================================================
// Parameter values
// ============================================================================

wire_record! {
    /// Identification of the mote hardware and software.
    pub struct MoteInfo {
        pub api_version: u8,
        pub serial_number: MacAddress,
        pub hw_model: u8,
        pub hw_rev: u8,
        pub sw_ver_major: u8,
        pub sw_ver_minor: u8,
        pub sw_ver_patch: u8,
        pub sw_ver_build: u16,
        pub boot_sw_ver: u8,
    }
}

wire_record! {
    /// Network identity of the mote.
    pub struct NetInfo {
        pub mac_address: MacAddress,
        pub mote_id: u16,
        pub network_id: u16,
        pub slot_size: u16,
    }
}

wire_record! {
    /// Current mote state and alarms.
    pub struct MoteStatus {
        /// One of the `MOTE_STATE_*` values.
        pub state: u8,
        pub reserved0: u8,
        pub reserved1: u16,
        pub num_parents: u8,
        pub alarms: u32,
        pub reserved2: u8,
    }
}

wire_record! {
    /// Network time as seen by the mote.
    pub struct TimeInfo {
        /// Seconds since boot.
        pub up_time: u32,
        pub utc_secs: [u8; 8],
        pub utc_usecs: u32,
        pub asn: Asn,
        /// Offset into the current slot, in microseconds.
        pub asn_offset: u16,
    }
}

wire_record! {
    /// Charge consumed since the last reset.
    pub struct Charge {
        /// Total charge, in millicoulombs.
        pub q_total: u32,
        pub up_time: u32,
        pub temp_int: i8,
        pub temp_frac: u8,
    }
}

wire_record! {
    /// Counters of the radio receive test.
    pub struct TestRadioRxStats {
        pub rx_ok: u16,
        pub rx_failed: u16,
    }
}

wire_record! {
    /// Application identification.
    pub struct AppInfo {
        pub vendor_id: u16,
        pub app_id: u8,
        pub app_ver: [u8; 5],
    }
}

wire_record! {
    /// One current limit of a power source.
    pub struct PowerLimit {
        pub current_limit: u16,
        pub discharge_period: u16,
        pub recharge_period: u16,
    }
}

wire_record! {
    /// Power source capabilities.
    pub struct PowerSrcInfo {
        pub max_st_current: u16,
        pub min_lifetime: u8,
        pub limits: [PowerLimit; 3],
    }
}

// ============================================================================
// Command arguments and results
// ============================================================================

wire_record! {
    /// Arguments of `testRadioRx`.
    pub struct TestRadioRxArgs {
        pub channel_mask: u16,
        /// Test duration, in seconds.
        pub time: u16,
        pub station_id: u8,
    }
}

wire_record! {
    /// Arguments of `requestService`.
    pub struct RequestServiceArgs {
        pub dest_addr: u16,
        pub service_type: u8,
        /// Requested interval, in milliseconds.
        pub value: u32,
    }
}

wire_record! {
    /// Arguments of `getServiceInfo`.
    pub struct ServiceInfoArgs {
        pub dest_addr: u16,
        pub service_type: u8,
    }
}

wire_record! {
    /// State of a service.
    pub struct ServiceInfo {
        pub dest_addr: u16,
        pub service_type: u8,
        pub state: u8,
        pub value: u32,
    }
}

wire_record! {
    /// Arguments of `bindSocket`.
    pub struct BindSocketArgs {
        pub socket_id: u8,
        pub port: u16,
    }
}

wire_record! {
    /// Arguments of `sendTo`.
    pub struct SendToArgs {
        pub socket_id: u8,
        pub dest_ip: Ipv6Address,
        pub dest_port: u16,
        pub service_type: u8,
        pub priority: u8,
        /// Identifier echoed back in the `txDone` notification.
        pub packet_id: u16,
        pub payload: Vec<u8>,
    }
}

wire_record! {
    /// One step of a transmit test sequence.
    pub struct TxTestStep {
        pub pk_len: u8,
        pub delay: u16,
    }
}

wire_record! {
    /// Arguments of `testRadioTxExt`.
    pub struct TestRadioTxExtArgs {
        pub test_type: u8,
        pub chan_mask: u16,
        pub repeat_cnt: u16,
        pub tx_power: i8,
        /// Number of meaningful entries in `sequence`.
        pub seq_size: u8,
        pub sequence: [TxTestStep; 10],
        pub station_id: u8,
    }
}

wire_record! {
    /// Socket table entry.
    pub struct SocketInfo {
        pub index: u8,
        pub socket_id: u8,
        pub protocol: u8,
        pub bind_state: u8,
        pub port: u16,
    }
}

// ============================================================================
// Notifications
// ============================================================================

wire_record! {
    /// Periodic or requested time indication.
    pub struct TimeIndication {
        pub uptime: u32,
        pub utc_secs: [u8; 8],
        pub utc_usecs: u32,
        pub asn: Asn,
        pub asn_offset: u16,
    }
}

wire_record! {
    /// Network event notification.
    pub struct Events {
        /// Bitmap of `EVENT_*` values.
        pub events: u32,
        pub state: u8,
        pub alarms_list: u32,
    }
}

wire_record! {
    /// Packet received on a socket.
    pub struct Receive {
        pub socket_id: u8,
        pub src_addr: Ipv6Address,
        pub src_port: u16,
        pub payload: Vec<u8>,
    }
}

wire_record! {
    /// Raw MAC-layer packet.
    pub struct MacRx {
        pub payload: Vec<u8>,
    }
}

wire_record! {
    /// Outcome of a `sendTo`.
    pub struct TxDone {
        pub packet_id: u16,
        pub status: u8,
    }
}

wire_record! {
    /// Advertisement heard while searching.
    pub struct AdvReceived {
        pub net_id: u16,
        pub mote_id: u16,
        pub rssi: i8,
        pub join_pri: u8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WireField;

    #[test]
    fn test_record_lengths() {
        assert_eq!(MoteInfo::WIRE_LEN, 17);
        assert_eq!(NetInfo::WIRE_LEN, 14);
        assert_eq!(MoteStatus::WIRE_LEN, 10);
        assert_eq!(TimeInfo::WIRE_LEN, 23);
        assert_eq!(Charge::WIRE_LEN, 10);
        assert_eq!(AppInfo::WIRE_LEN, 8);
        assert_eq!(PowerSrcInfo::WIRE_LEN, 21);
        assert_eq!(SendToArgs::WIRE_LEN, 23);
        assert_eq!(TestRadioTxExtArgs::WIRE_LEN, 38);
        assert_eq!(SocketInfo::WIRE_LEN, 6);
        assert_eq!(TimeIndication::WIRE_LEN, 23);
        assert_eq!(Events::WIRE_LEN, 9);
        assert_eq!(Receive::WIRE_LEN, 19);
        assert_eq!(MacRx::WIRE_LEN, 0);
        assert_eq!(TxDone::WIRE_LEN, 3);
        assert_eq!(AdvReceived::WIRE_LEN, 6);
    }

    #[test]
    fn test_net_info_decode() {
        let bytes = [
            0x00, 0x17, 0x0D, 0x00, 0x00, 0x38, 0x06, 0x8C, // mac
            0x00, 0x02, // moteId
            0x05, 0xDC, // networkId 1500
            0x00, 0x0A, // slotSize
        ];
        let info = NetInfo::from_wire(&bytes).unwrap();
        assert_eq!(info.mac_address[7], 0x8C);
        assert_eq!(info.mote_id, 2);
        assert_eq!(info.network_id, 1500);
        assert_eq!(info.slot_size, 10);
    }

    #[test]
    fn test_power_src_info_nested_limits() {
        let mut info = PowerSrcInfo {
            max_st_current: 0x0102,
            min_lifetime: 3,
            ..Default::default()
        };
        info.limits[2].recharge_period = 0xABCD;

        let bytes = info.to_wire();
        assert_eq!(bytes.len(), 21);
        assert_eq!(&bytes[19..], &[0xAB, 0xCD]);
        assert_eq!(PowerSrcInfo::from_wire(&bytes), Some(info));
    }
}
