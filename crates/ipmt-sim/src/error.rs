//! Error types for the simulated mote.

use thiserror::Error;

/// Errors raised by the simulated mote.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimError {
    /// Frame payload does not fit the serial length field.
    #[error("payload too large: max {max} bytes, got {actual}")]
    PayloadTooLarge { max: usize, actual: usize },

    /// Configuration value rejected.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The host side of a harness went away.
    #[error("link closed")]
    LinkClosed,
}

/// Result type alias for simulator operations.
pub type SimResult<T> = Result<T, SimError>;
