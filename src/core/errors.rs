//! Error types for the car control operations.
//! One enum per operation so callers can tell "not attempted" apart from
//! "attempted and failed"; none of these are fatal to a control loop.

use std::time::Duration;

use thiserror::Error;

use crate::core::bluetooth::transport::TransportError;

/// Scan failures. The registry still lists configured known cars after one
/// of these, so a failed scan never empties the device list.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The underlying scan call failed.
    #[error("scan failed: {0}")]
    Transport(#[from] TransportError),
}

/// Connect failures.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Index outside the registry; the transport was never touched.
    #[error("device index {index} out of range ({count} devices listed)")]
    InvalidIndex { index: usize, count: usize },

    /// A connect attempt is already in flight.
    #[error("another connect attempt is already in progress")]
    Busy,

    /// The configured connect ceiling elapsed.
    #[error("connecting to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },

    /// The transport refused or dropped the dial.
    #[error("connect failed: {0}")]
    Transport(#[from] TransportError),
}

/// Disconnect failures. Local state is forced to disconnected even when one
/// of these is returned.
#[derive(Debug, Error)]
pub enum DisconnectError {
    /// There was no active connection to tear down.
    #[error("no car connected")]
    NotConnected,

    /// The transport-level teardown failed.
    #[error("disconnect failed: {0}")]
    Transport(#[from] TransportError),
}

/// Dispatch failures. A failed write never changes the connection state;
/// tearing the link down stays an explicit caller decision.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The configured write ceiling elapsed.
    #[error("write of {len} bytes to handle 0x{handle:04x} timed out after {timeout:?}")]
    Timeout {
        handle: u16,
        len: usize,
        timeout: Duration,
    },

    /// The transport reported the write as failed.
    #[error("write failed: {0}")]
    Transport(#[from] TransportError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_index_message_names_both_numbers() {
        let err = ConnectError::InvalidIndex { index: 5, count: 3 };
        assert_eq!(
            err.to_string(),
            "device index 5 out of range (3 devices listed)"
        );
    }

    #[test]
    fn transport_errors_convert_into_operation_errors() {
        let scan: ScanError = TransportError::AdapterUnavailable.into();
        assert!(matches!(scan, ScanError::Transport(_)));

        let dispatch: DispatchError = TransportError::NotConnected.into();
        assert!(matches!(dispatch, DispatchError::Transport(_)));
    }
}
