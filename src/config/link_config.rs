use serde::{Deserialize, Serialize};

use crate::core::bluetooth::commands::IntensityPolicy;
use crate::core::bluetooth::constants::{
    DEFAULT_CONNECT_TIMEOUT_SECS, DEFAULT_CONTROL_HANDLE, DEFAULT_SCAN_TIMEOUT_SECS,
    DEFAULT_WRITE_TIMEOUT_MS,
};

/// Radio-side settings for talking to a car.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// ATT handle every control write is addressed to.
    pub control_handle: u16,

    /// How long a scan keeps collecting advertisements, in seconds.
    pub scan_timeout_secs: u64,

    /// Ceiling on a single connection attempt, in seconds.
    pub connect_timeout_secs: u64,

    /// Ceiling on a single characteristic write, in milliseconds.
    pub write_timeout_ms: u64,

    /// What to do with drive intensities outside the valid range.
    pub intensity_policy: IntensityPolicy,

    /// Pins the control service by UUID instead of probing for one.
    pub service_uuid: Option<String>,

    /// Pins the control characteristic by UUID instead of taking the
    /// first writable one.
    pub characteristic_uuid: Option<String>,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            control_handle: DEFAULT_CONTROL_HANDLE,
            scan_timeout_secs: DEFAULT_SCAN_TIMEOUT_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
            intensity_policy: IntensityPolicy::default(),
            service_uuid: None,
            characteristic_uuid: None,
        }
    }
}
