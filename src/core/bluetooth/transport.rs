//! BLE transport boundary for the car control core.
//! Everything radio-level lives behind these traits; the core only ever
//! sees scan results, an opaque link, and handle-addressed reads/writes.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::bluetooth::types::GattServiceInfo;

/// BLE address type as reported by the underlying stack.
///
/// Only `Public` addresses are stable enough to reconnect to later, so the
/// registry keeps nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum AddressType {
    Public,
    Random,
    Unknown,
}

/// One device reported by a scan.
#[derive(Debug, Clone, PartialEq)]
pub struct Advertisement {
    /// Address the transport will accept in [`CarTransport::connect`].
    pub address: String,
    pub address_type: AddressType,
    /// Advertised local name, if any.
    pub name: Option<String>,
    pub rssi: Option<i16>,
}

/// Errors surfaced by a transport implementation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// No usable Bluetooth adapter on this host.
    #[error("no Bluetooth adapter available")]
    AdapterUnavailable,

    /// The requested address was never discovered, so there is no peer
    /// object to dial.
    #[error("device {address} not found; scan first or check the address")]
    DeviceNotFound { address: String },

    /// Operation needs an established link but the peer is gone.
    #[error("not connected")]
    NotConnected,

    /// The link has no characteristic mapped to this handle.
    #[error("no characteristic mapped to handle 0x{handle:04x}")]
    UnknownHandle { handle: u16 },

    /// Service discovery found nothing the control protocol can write to.
    #[error("peer exposes no writable characteristic")]
    NoWritableCharacteristic,

    /// A UUID string from the configuration failed to parse.
    #[error("invalid UUID in configuration: {0}")]
    InvalidUuid(String),

    /// Anything the platform BLE stack reported, stringified at the boundary.
    #[error("bluetooth backend error: {0}")]
    Backend(String),
}

/// Scanning and dialing, the central role of the transport.
#[async_trait]
pub trait CarTransport: Send + Sync {
    /// Runs one bounded scan and returns every device seen.
    async fn scan(&self, timeout: Duration) -> Result<Vec<Advertisement>, TransportError>;

    /// Dials a previously advertised address and returns the live link.
    async fn connect(&self, address: &str) -> Result<Box<dyn CarLink>, TransportError>;
}

/// An established connection to one car.
///
/// The link is owned by the connection manager for exactly the lifetime of
/// the connected state and is dropped on every exit from it.
#[async_trait]
pub trait CarLink: Send + Sync {
    /// Writes raw bytes to the characteristic behind `handle`.
    async fn write_characteristic(
        &self,
        handle: u16,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError>;

    /// Reads the characteristic behind `handle`. Diagnostic use only.
    async fn read_characteristic(&self, handle: u16) -> Result<Vec<u8>, TransportError>;

    /// Enumerates the peer's GATT tree. Diagnostic use only.
    async fn services(&self) -> Result<Vec<GattServiceInfo>, TransportError>;

    /// Tears the link down at the transport level.
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_handle_error_names_the_handle() {
        let err = TransportError::UnknownHandle { handle: 0x0017 };
        assert_eq!(
            err.to_string(),
            "no characteristic mapped to handle 0x0017"
        );
    }

    #[test]
    fn advertisement_equality_covers_all_fields() {
        let a = Advertisement {
            address: "AA:BB:CC:DD:EE:FF".into(),
            address_type: AddressType::Public,
            name: Some("REV-1".into()),
            rssi: Some(-40),
        };
        let mut b = a.clone();
        assert_eq!(a, b);
        b.address_type = AddressType::Random;
        assert_ne!(a, b);
    }
}
