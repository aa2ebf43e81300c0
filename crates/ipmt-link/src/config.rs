//! Link configuration.

use serde::{Deserialize, Serialize};

use crate::constants::{HDLC_INPUT_BUFFER_SIZE, MAX_FRAME_LENGTH};

/// Sizing of a [`MoteLink`](crate::MoteLink), fixed at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Capacity of the frame receive buffer, CRC included.
    pub input_buffer_size: usize,
    /// Largest notification payload handed to the application.
    pub notification_buffer_len: usize,
    /// Largest request payload the link will send.
    pub max_payload_len: usize,
    /// Depth of the event channel created by [`MoteLink::with_channel`](crate::MoteLink::with_channel).
    pub event_queue_depth: usize,
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig {
            input_buffer_size: HDLC_INPUT_BUFFER_SIZE,
            notification_buffer_len: MAX_FRAME_LENGTH,
            max_payload_len: MAX_FRAME_LENGTH,
            event_queue_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LinkConfig::default();
        assert_eq!(config.input_buffer_size, 128);
        assert_eq!(config.notification_buffer_len, 128);
        assert_eq!(config.max_payload_len, 128);
        assert_eq!(config.event_queue_depth, 64);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: LinkConfig = serde_yaml::from_str("notification_buffer_len: 40\n").unwrap();
        assert_eq!(config.notification_buffer_len, 40);
        assert_eq!(config.input_buffer_size, 128);
    }
}
