//! Parameter store of the simulated mote.

use ipmt_link::{
    AppInfo, Ipv6Address, Key, MacAddress, MoteInfo, PowerSrcInfo, EVENT_BOOT, EVENT_DISCONNECTED,
    EVENT_JOIN_FAIL, EVENT_OPERATIONAL, EVENT_SVC_CHANGE,
};
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

// ============================================================================
// Configuration
// ============================================================================

/// User-facing configuration of a simulated mote.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// EUI-64, as 16 hex digits.
    pub mac_address: String,
    pub network_id: u16,
    /// Short address assigned on join.
    pub mote_id: u16,
    /// Send a boot event when the simulation starts.
    pub boot_event: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            mac_address: "00170d000038068c".to_string(),
            network_id: 1229,
            mote_id: 2,
            boot_event: true,
        }
    }
}

impl SimConfig {
    /// Build the initial parameter store.
    pub fn to_params(&self) -> SimResult<MoteParams> {
        Ok(MoteParams {
            mac_address: parse_mac(&self.mac_address)?,
            network_id: self.network_id,
            mote_id: self.mote_id,
            ..MoteParams::default()
        })
    }
}

fn parse_mac(text: &str) -> SimResult<MacAddress> {
    let digits: String = text.chars().filter(|c| *c != ':' && *c != '-').collect();
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(SimError::InvalidConfig(format!(
            "mac address '{}' is not hex",
            text
        )));
    }
    if digits.len() != 16 {
        return Err(SimError::InvalidConfig(format!(
            "mac address '{}' must have 8 bytes",
            text
        )));
    }

    let mut mac = [0u8; 8];
    for (i, byte) in mac.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&digits[i * 2..i * 2 + 2], 16)
            .map_err(|e| SimError::InvalidConfig(e.to_string()))?;
    }
    Ok(mac)
}

// ============================================================================
// Parameters
// ============================================================================

/// Values readable and writable through `getParameter` / `setParameter`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoteParams {
    pub mac_address: MacAddress,
    pub join_key: Key,
    pub network_id: u16,
    pub tx_power: i8,
    pub join_duty_cycle: u8,
    pub event_mask: u32,
    pub otap_lockout: bool,
    pub routing_mode: bool,
    pub power_src_info: PowerSrcInfo,
    pub adv_key: Key,
    pub auto_join: bool,
    pub mote_id: u16,
    pub mote_info: MoteInfo,
    pub app_info: AppInfo,
}

impl Default for MoteParams {
    fn default() -> Self {
        let mac_address = [0x00, 0x17, 0x0D, 0x00, 0x00, 0x38, 0x06, 0x8C];
        MoteParams {
            mac_address,
            join_key: [0x44; 16],
            network_id: 1229,
            tx_power: 8,
            join_duty_cycle: 255,
            event_mask: EVENT_BOOT
                | EVENT_JOIN_FAIL
                | EVENT_DISCONNECTED
                | EVENT_OPERATIONAL
                | EVENT_SVC_CHANGE,
            otap_lockout: false,
            routing_mode: false,
            power_src_info: PowerSrcInfo::default(),
            adv_key: [0x44; 16],
            auto_join: false,
            mote_id: 2,
            mote_info: MoteInfo {
                api_version: 4,
                serial_number: mac_address,
                hw_model: 3,
                hw_rev: 1,
                sw_ver_major: 1,
                sw_ver_minor: 4,
                sw_ver_patch: 1,
                sw_ver_build: 8,
                boot_sw_ver: 6,
            },
            app_info: AppInfo {
                vendor_id: 1,
                app_id: 1,
                app_ver: [1, 0, 0, 0, 1],
            },
        }
    }
}

impl MoteParams {
    /// IPv6 address derived from the network id and MAC address.
    pub fn ipv6_address(&self) -> Ipv6Address {
        let mut addr = [0u8; 16];
        addr[0] = 0xFE;
        addr[1] = 0x80;
        addr[6..8].copy_from_slice(&self.network_id.to_be_bytes());
        addr[8..].copy_from_slice(&self.mac_address);
        addr
    }

    /// Forget user-set values, keeping the factory identity.
    pub fn clear_nv(&mut self) {
        let factory = MoteParams {
            mac_address: self.mote_info.serial_number,
            mote_info: self.mote_info.clone(),
            ..MoteParams::default()
        };
        *self = factory;
    }

    /// Erase all keys.
    pub fn zeroize(&mut self) {
        self.join_key = [0; 16];
        self.adv_key = [0; 16];
    }
}
