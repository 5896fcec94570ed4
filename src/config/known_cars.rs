use serde::{Deserialize, Serialize};

/// A car pinned in configuration.
///
/// Known cars are appended to every scan result, so they stay dialable
/// even when their advertisements are missed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownCar {
    /// Label shown in the roster.
    pub name: String,
    /// MAC-style address the car answers on.
    pub address: String,
}
