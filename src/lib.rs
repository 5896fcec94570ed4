//! Remote control for REV BLE battle cars.
//! Scans for cars, keeps an indexable roster, drives one car at a time over
//! handle-addressed characteristic writes.

// Module declarations
pub mod config;
pub mod core;

// Re-export the pieces a front end needs
pub use crate::config::{AppConfig, KnownCar, LinkConfig};
pub use crate::core::bluetooth::{
    BluestTransport, CarCommand, CarTransport, ConnectionState, DiscoveredDevice,
    IntensityPolicy, MockTransport,
};
pub use crate::core::CarManager;
