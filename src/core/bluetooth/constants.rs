//! Constants used throughout the application
//! This module contains the vendor protocol constants for the REV car,
//! default timeouts, and well-known GATT UUIDs used by the diagnostics.

use uuid::Uuid;

/// Default GATT handle of the drive characteristic. The deployed cars all
/// expose it at 0x0017; the value is still configurable per link.
pub const DEFAULT_CONTROL_HANDLE: u16 = 0x0017;

/// Vendor handshake the car requires before it accepts drive commands.
/// Eight opaque byte strings, written with response, in exactly this order.
/// The sequence is not derivable from anything else; changing a single byte
/// breaks compatibility with the real device.
pub const HANDSHAKE_SEQUENCE: [&[u8]; 8] = [
    &[0x16],
    &[0x91, 0x01],
    &[0x84, 0x04],
    &[0x79],
    &[0x91, 0x01],
    &[0x19],
    &[0x91, 0xFF],
    &[0x14],
];

/// Payload that fires the car's gun, written without response.
pub const FIRE_PAYLOAD: [u8; 4] = [0x95, 0x00, 0x04, 0x01];

/// Opcode prefixing every three-byte drive payload.
pub const DRIVE_OPCODE: u8 = 0x78;

/// Direction offsets added to the scaled magnitude.
/// Forward/reverse land in byte 1 of the payload, right/left in byte 2.
pub const DRIVE_FORWARD_OFFSET: u8 = 0x00;
pub const DRIVE_REVERSE_OFFSET: u8 = 0x20;
pub const DRIVE_RIGHT_OFFSET: u8 = 0x40;
pub const DRIVE_LEFT_OFFSET: u8 = 0x60;

/// Full-scale step count for intensity quantization (5 bits).
pub const INTENSITY_SCALE: u8 = 0x1F;

/// Closed intensity interval the car accepts.
pub const INTENSITY_MIN: f64 = 0.1;
pub const INTENSITY_MAX: f64 = 1.0;

/// Half throttle, used when a drive command names no intensity.
pub const DEFAULT_DRIVE_INTENSITY: f64 = 0.5;

/// Scan duration in seconds
pub const DEFAULT_SCAN_TIMEOUT_SECS: u64 = 10;

/// Ceiling on a single connect attempt in seconds
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Ceiling on a single characteristic write in milliseconds
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 1000;

/// Standard Bluetooth Service UUIDs
pub const UUID_GENERIC_ACCESS_SERVICE: Uuid =
    Uuid::from_u128(0x00001800_0000_1000_8000_00805f9b34fb);
pub const UUID_GENERIC_ATTRIBUTE_SERVICE: Uuid =
    Uuid::from_u128(0x00001801_0000_1000_8000_00805f9b34fb);
pub const UUID_DEVICE_INFORMATION_SERVICE: Uuid =
    Uuid::from_u128(0x0000180a_0000_1000_8000_00805f9b34fb);
pub const UUID_BATTERY_SERVICE: Uuid = Uuid::from_u128(0x0000180f_0000_1000_8000_00805f9b34fb);

/// Standard Bluetooth Characteristic UUIDs
pub const UUID_DEVICE_NAME: Uuid = Uuid::from_u128(0x00002a00_0000_1000_8000_00805f9b34fb);
pub const UUID_APPEARANCE: Uuid = Uuid::from_u128(0x00002a01_0000_1000_8000_00805f9b34fb);
pub const UUID_MANUFACTURER_NAME: Uuid = Uuid::from_u128(0x00002a29_0000_1000_8000_00805f9b34fb);
pub const UUID_MODEL_NUMBER: Uuid = Uuid::from_u128(0x00002a24_0000_1000_8000_00805f9b34fb);
pub const UUID_BATTERY_LEVEL: Uuid = Uuid::from_u128(0x00002a19_0000_1000_8000_00805f9b34fb);

/// Standard Bluetooth Descriptor UUIDs
pub const UUID_CLIENT_CHARACTERISTIC_CONFIG: Uuid =
    Uuid::from_u128(0x00002902_0000_1000_8000_00805f9b34fb);

/// Human-readable name for assigned GATT UUIDs, used by the service listing.
pub fn gatt_common_name(uuid: &Uuid) -> Option<&'static str> {
    match *uuid {
        UUID_GENERIC_ACCESS_SERVICE => Some("Generic Access"),
        UUID_GENERIC_ATTRIBUTE_SERVICE => Some("Generic Attribute"),
        UUID_DEVICE_INFORMATION_SERVICE => Some("Device Information"),
        UUID_BATTERY_SERVICE => Some("Battery Service"),
        UUID_DEVICE_NAME => Some("Device Name"),
        UUID_APPEARANCE => Some("Appearance"),
        UUID_MANUFACTURER_NAME => Some("Manufacturer Name String"),
        UUID_MODEL_NUMBER => Some("Model Number String"),
        UUID_BATTERY_LEVEL => Some("Battery Level"),
        UUID_CLIENT_CHARACTERISTIC_CONFIG => Some("Client Characteristic Configuration"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handshake_is_eight_fixed_steps() {
        assert_eq!(HANDSHAKE_SEQUENCE.len(), 8);
        assert_eq!(HANDSHAKE_SEQUENCE[0], &[0x16]);
        assert_eq!(HANDSHAKE_SEQUENCE[1], &[0x91, 0x01]);
        assert_eq!(HANDSHAKE_SEQUENCE[6], &[0x91, 0xFF]);
        assert_eq!(HANDSHAKE_SEQUENCE[7], &[0x14]);
    }

    #[test]
    fn assigned_uuids_resolve_to_names() {
        assert_eq!(
            gatt_common_name(&UUID_BATTERY_SERVICE),
            Some("Battery Service")
        );
        assert_eq!(gatt_common_name(&Uuid::from_u128(0xdead_beef)), None);
    }
}
