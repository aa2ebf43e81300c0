//! Link error types.

use thiserror::Error;

/// Errors returned synchronously by the command API.
///
/// Anything that goes wrong below the invocation boundary (bad CRC, stale
/// replies, undersized payloads) is discarded locally and never shows up here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// A command is already outstanding.
    #[error("a command is already outstanding")]
    Busy,

    /// The request could not be encoded against the catalog.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// Not connected to the peer. Reserved, never produced by the mote link.
    #[error("not connected")]
    NotConnected,

    /// Operation already in progress. Reserved, never produced by the mote link.
    #[error("already in progress")]
    Already,
}

/// Result type alias for link operations.
pub type LinkResult<T> = Result<T, LinkError>;

/// Result code carried as the first byte of every reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Command succeeded.
    Ok,
    /// Mote is busy.
    Busy,
    /// Request length is wrong.
    InvalidLen,
    /// Mote is in the wrong state.
    InvalidState,
    /// Command is not supported.
    Unsupported,
    /// Parameter id is unknown.
    UnknownParam,
    /// Command id is unknown.
    UnknownCmd,
    /// Persistent storage write failed.
    WriteFail,
    /// Persistent storage read failed.
    ReadFail,
    /// Supply voltage too low.
    LowVoltage,
    /// Out of resources.
    NoResources,
    /// Join information is incomplete.
    IncompleteJoinInfo,
    /// Item not found.
    NotFound,
    /// Value out of range.
    InvalidValue,
    /// Access denied.
    AccessDenied,
    /// Persistent storage erase failed.
    EraseFail,
    /// Code not known to this library.
    Unknown(u8),
}

impl ResultCode {
    /// Whether this code signals success.
    pub fn is_ok(self) -> bool {
        self == ResultCode::Ok
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultCode::Ok => write!(f, "ok"),
            ResultCode::Busy => write!(f, "busy"),
            ResultCode::InvalidLen => write!(f, "invalid length"),
            ResultCode::InvalidState => write!(f, "invalid state"),
            ResultCode::Unsupported => write!(f, "unsupported"),
            ResultCode::UnknownParam => write!(f, "unknown parameter"),
            ResultCode::UnknownCmd => write!(f, "unknown command"),
            ResultCode::WriteFail => write!(f, "write failed"),
            ResultCode::ReadFail => write!(f, "read failed"),
            ResultCode::LowVoltage => write!(f, "low voltage"),
            ResultCode::NoResources => write!(f, "no resources"),
            ResultCode::IncompleteJoinInfo => write!(f, "incomplete join info"),
            ResultCode::NotFound => write!(f, "not found"),
            ResultCode::InvalidValue => write!(f, "invalid value"),
            ResultCode::AccessDenied => write!(f, "access denied"),
            ResultCode::EraseFail => write!(f, "erase failed"),
            ResultCode::Unknown(code) => write!(f, "unknown result (0x{:02X})", code),
        }
    }
}

impl From<u8> for ResultCode {
    fn from(code: u8) -> Self {
        use crate::constants::*;
        match code {
            RC_OK => ResultCode::Ok,
            RC_BUSY => ResultCode::Busy,
            RC_INVALID_LEN => ResultCode::InvalidLen,
            RC_INVALID_STATE => ResultCode::InvalidState,
            RC_UNSUPPORTED => ResultCode::Unsupported,
            RC_UNKNOWN_PARAM => ResultCode::UnknownParam,
            RC_UNKNOWN_CMD => ResultCode::UnknownCmd,
            RC_WRITE_FAIL => ResultCode::WriteFail,
            RC_READ_FAIL => ResultCode::ReadFail,
            RC_LOW_VOLTAGE => ResultCode::LowVoltage,
            RC_NO_RESOURCES => ResultCode::NoResources,
            RC_INCOMPLETE_JOIN_INFO => ResultCode::IncompleteJoinInfo,
            RC_NOT_FOUND => ResultCode::NotFound,
            RC_INVALID_VALUE => ResultCode::InvalidValue,
            RC_ACCESS_DENIED => ResultCode::AccessDenied,
            RC_ERASE_FAIL => ResultCode::EraseFail,
            _ => ResultCode::Unknown(code),
        }
    }
}

impl From<ResultCode> for u8 {
    fn from(code: ResultCode) -> Self {
        use crate::constants::*;
        match code {
            ResultCode::Ok => RC_OK,
            ResultCode::Busy => RC_BUSY,
            ResultCode::InvalidLen => RC_INVALID_LEN,
            ResultCode::InvalidState => RC_INVALID_STATE,
            ResultCode::Unsupported => RC_UNSUPPORTED,
            ResultCode::UnknownParam => RC_UNKNOWN_PARAM,
            ResultCode::UnknownCmd => RC_UNKNOWN_CMD,
            ResultCode::WriteFail => RC_WRITE_FAIL,
            ResultCode::ReadFail => RC_READ_FAIL,
            ResultCode::LowVoltage => RC_LOW_VOLTAGE,
            ResultCode::NoResources => RC_NO_RESOURCES,
            ResultCode::IncompleteJoinInfo => RC_INCOMPLETE_JOIN_INFO,
            ResultCode::NotFound => RC_NOT_FOUND,
            ResultCode::InvalidValue => RC_INVALID_VALUE,
            ResultCode::AccessDenied => RC_ACCESS_DENIED,
            ResultCode::EraseFail => RC_ERASE_FAIL,
            ResultCode::Unknown(code) => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_code_unknown_is_preserved() {
        let rc = ResultCode::from(0x42);
        assert_eq!(rc, ResultCode::Unknown(0x42));
        assert_eq!(u8::from(rc), 0x42);
    }

    #[test]
    fn test_result_code_known_values() {
        assert!(ResultCode::from(0).is_ok());
        assert_eq!(ResultCode::from(8), ResultCode::UnknownCmd);
        assert_eq!(u8::from(ResultCode::EraseFail), 18);
        assert!(!ResultCode::Busy.is_ok());
    }
}
