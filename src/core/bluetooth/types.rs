//! Shared data structures for the Bluetooth module.

use std::fmt;

/// Where a registry entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum DeviceOrigin {
    /// Reported by the most recent scan.
    Scanned,
    /// Taken from the known-cars configuration.
    Known,
}

impl fmt::Display for DeviceOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceOrigin::Scanned => write!(f, "scanned"),
            DeviceOrigin::Known => write!(f, "Known Device"),
        }
    }
}

/// A car the registry can connect to, either scanned or pre-configured.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct DiscoveredDevice {
    /// Advertised name, if the advertisement carried one.
    pub name: Option<String>,
    /// BLE MAC address as colon-separated hex octets.
    pub address: String,
    /// Whether this entry was scanned or configured.
    pub origin: DeviceOrigin,
    /// Signal strength at discovery time; display-only, absent for known cars.
    pub rssi: Option<i16>,
}

impl DiscoveredDevice {
    /// Creates an entry for a device reported by a scan.
    pub fn scanned(name: Option<String>, address: String, rssi: Option<i16>) -> Self {
        Self {
            name,
            address,
            origin: DeviceOrigin::Scanned,
            rssi,
        }
    }

    /// Creates an entry for a pre-configured known car.
    pub fn known(name: String, address: String) -> Self {
        Self {
            name: Some(name),
            address,
            origin: DeviceOrigin::Known,
            rssi: None,
        }
    }

    /// Name to show in listings when the advertisement carried none.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("(unknown)")
    }
}

impl fmt::Display for DiscoveredDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}), [{}]", self.address, self.origin, self.display_name())?;
        if let Some(rssi) = self.rssi {
            write!(f, ", {} dBm", rssi)?;
        }
        Ok(())
    }
}

/// Lifecycle of the single active connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Connected => write!(f, "connected"),
        }
    }
}

/// One write against the control characteristic, the only wire-level
/// artifact the command layer produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicWrite {
    /// GATT handle addressing the target characteristic.
    pub handle: u16,
    /// Raw bytes to write.
    pub payload: Vec<u8>,
    /// Whether the peripheral must acknowledge the write.
    pub with_response: bool,
}

impl CharacteristicWrite {
    pub fn new(handle: u16, payload: Vec<u8>, with_response: bool) -> Self {
        Self {
            handle,
            payload,
            with_response,
        }
    }
}

/// A GATT service as reported by the diagnostics enumeration.
#[derive(Debug, Clone, serde::Serialize)]
pub struct GattServiceInfo {
    pub uuid: String,
    /// Well-known name for assigned UUIDs, if any.
    pub common_name: Option<String>,
    pub characteristics: Vec<GattCharacteristicInfo>,
}

/// A characteristic inside a [`GattServiceInfo`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct GattCharacteristicInfo {
    pub uuid: String,
    pub common_name: Option<String>,
    /// Space-separated property flags, e.g. `"READ WRITE NOTIFY"`.
    pub properties: String,
    pub descriptors: Vec<GattDescriptorInfo>,
}

/// A descriptor inside a [`GattCharacteristicInfo`].
#[derive(Debug, Clone, serde::Serialize)]
pub struct GattDescriptorInfo {
    pub uuid: String,
    pub common_name: Option<String>,
}
