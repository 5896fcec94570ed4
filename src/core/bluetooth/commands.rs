//! REV car command encoding.
//! Pure mapping from a logical command to the bytes written at the drive
//! characteristic; nothing in here touches the transport.

use crate::core::bluetooth::constants::{
    DRIVE_FORWARD_OFFSET, DRIVE_LEFT_OFFSET, DRIVE_OPCODE, DRIVE_REVERSE_OFFSET,
    DRIVE_RIGHT_OFFSET, FIRE_PAYLOAD, HANDSHAKE_SEQUENCE, INTENSITY_MAX, INTENSITY_MIN,
    INTENSITY_SCALE,
};
use crate::core::bluetooth::types::CharacteristicWrite;

/// What to do with an intensity outside `[0.1, 1.0]`.
///
/// The real car firmware was only ever driven with the drop behavior, so
/// that stays the default; clamping is offered for front ends that prefer a
/// forgiving control surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum IntensityPolicy {
    /// Encode nothing; the command is dropped without an error.
    #[default]
    Drop,
    /// Pull the value into range before quantizing.
    Clamp,
}

/// Commands the car understands.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CarCommand {
    /// Drive forward at the given intensity.
    Forward(f64),
    /// Drive backward at the given intensity.
    Reverse(f64),
    /// Steer left at the given intensity.
    Left(f64),
    /// Steer right at the given intensity.
    Right(f64),
    /// Fire the gun.
    Fire,
    /// One step of the vendor handshake, by position in the sequence.
    HandshakeStep(usize),
}

impl CarCommand {
    /// Encodes this command as a write against `handle`.
    ///
    /// Drive format: `[0x78, byte1, byte2]` with the direction offset plus
    /// `round(0x1F * intensity)` in byte 1 for the throttle axis or byte 2
    /// for the steering axis, the other byte forced to zero.
    ///
    /// Returns `None` when there is nothing to send: an intensity outside
    /// `[0.1, 1.0]` under [`IntensityPolicy::Drop`], a non-finite intensity,
    /// or a handshake index past the end of the sequence.
    pub fn encode(&self, handle: u16, policy: IntensityPolicy) -> Option<CharacteristicWrite> {
        match *self {
            CarCommand::Forward(intensity) => {
                throttle_write(handle, DRIVE_FORWARD_OFFSET, intensity, policy)
            }
            CarCommand::Reverse(intensity) => {
                throttle_write(handle, DRIVE_REVERSE_OFFSET, intensity, policy)
            }
            CarCommand::Right(intensity) => {
                steer_write(handle, DRIVE_RIGHT_OFFSET, intensity, policy)
            }
            CarCommand::Left(intensity) => {
                steer_write(handle, DRIVE_LEFT_OFFSET, intensity, policy)
            }
            CarCommand::Fire => Some(CharacteristicWrite::new(
                handle,
                FIRE_PAYLOAD.to_vec(),
                false,
            )),
            CarCommand::HandshakeStep(index) => HANDSHAKE_SEQUENCE
                .get(index)
                .map(|step| CharacteristicWrite::new(handle, step.to_vec(), true)),
        }
    }
}

/// The full handshake as ready-to-dispatch writes, in sequence order.
pub fn handshake_writes(handle: u16) -> Vec<CharacteristicWrite> {
    HANDSHAKE_SEQUENCE
        .iter()
        .map(|step| CharacteristicWrite::new(handle, step.to_vec(), true))
        .collect()
}

/// Quantizes an intensity to the car's 5-bit magnitude scale.
fn scaled_magnitude(intensity: f64, policy: IntensityPolicy) -> Option<u8> {
    let intensity = match policy {
        IntensityPolicy::Drop => {
            if !(INTENSITY_MIN..=INTENSITY_MAX).contains(&intensity) {
                return None;
            }
            intensity
        }
        IntensityPolicy::Clamp => {
            if !intensity.is_finite() {
                return None;
            }
            intensity.clamp(INTENSITY_MIN, INTENSITY_MAX)
        }
    };
    Some((f64::from(INTENSITY_SCALE) * intensity).round() as u8)
}

fn throttle_write(
    handle: u16,
    offset: u8,
    intensity: f64,
    policy: IntensityPolicy,
) -> Option<CharacteristicWrite> {
    let scaled = scaled_magnitude(intensity, policy)?;
    Some(CharacteristicWrite::new(
        handle,
        vec![DRIVE_OPCODE, offset + scaled, 0x00],
        true,
    ))
}

fn steer_write(
    handle: u16,
    offset: u8,
    intensity: f64,
    policy: IntensityPolicy,
) -> Option<CharacteristicWrite> {
    let scaled = scaled_magnitude(intensity, policy)?;
    Some(CharacteristicWrite::new(
        handle,
        vec![DRIVE_OPCODE, 0x00, offset + scaled],
        true,
    ))
}
