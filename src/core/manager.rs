//! The one front door for driving cars.
//!
//! Owns the device roster, the single connection slot and the dispatcher,
//! and exposes the operations the command line maps onto. One manager, one
//! car, one write in flight at a time.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};

use crate::config::AppConfig;
use crate::core::bluetooth::commands::{self, CarCommand, IntensityPolicy};
use crate::core::bluetooth::connection::ConnectionManager;
use crate::core::bluetooth::dispatcher::CommandDispatcher;
use crate::core::bluetooth::registry::DeviceRegistry;
use crate::core::bluetooth::transport::{CarTransport, TransportError};
use crate::core::bluetooth::types::{ConnectionState, DiscoveredDevice, GattServiceInfo};
use crate::core::errors::{ConnectError, DisconnectError, DispatchError, ScanError};

pub struct CarManager {
    transport: Arc<dyn CarTransport>,
    registry: DeviceRegistry,
    connection: ConnectionManager,
    dispatcher: CommandDispatcher,
    control_handle: u16,
    scan_timeout: Duration,
    intensity_policy: IntensityPolicy,
}

impl CarManager {
    pub fn new(transport: Arc<dyn CarTransport>, config: &AppConfig) -> Self {
        Self {
            transport: transport.clone(),
            registry: DeviceRegistry::new(config.known_cars.clone()),
            connection: ConnectionManager::new(
                transport,
                Duration::from_secs(config.link.connect_timeout_secs),
            ),
            dispatcher: CommandDispatcher::new(Duration::from_millis(
                config.link.write_timeout_ms,
            )),
            control_handle: config.link.control_handle,
            scan_timeout: Duration::from_secs(config.link.scan_timeout_secs),
            intensity_policy: config.link.intensity_policy,
        }
    }

    /// Rebuilds the device roster; returns how many entries it now holds.
    pub async fn scan(&mut self) -> Result<usize, ScanError> {
        self.registry
            .refresh(self.transport.as_ref(), self.scan_timeout)
            .await
    }

    /// Connects to the roster entry at `index` and wakes the car up.
    ///
    /// The index is validated against the roster before the radio is
    /// touched. A failed wake-up handshake is logged but keeps the link;
    /// the car may already be awake from an earlier session.
    pub async fn connect(&mut self, index: usize) -> Result<DiscoveredDevice, ConnectError> {
        let device = self
            .registry
            .get(index)
            .cloned()
            .ok_or(ConnectError::InvalidIndex {
                index,
                count: self.registry.len(),
            })?;

        self.connection.connect(&device).await?;

        if let Err(e) = self.send_handshake().await {
            warn!("Wake-up handshake failed: {e}");
        }
        Ok(device)
    }

    pub async fn disconnect(&mut self) -> Result<(), DisconnectError> {
        self.connection.disconnect().await
    }

    /// Replays the wake-up sequence on the active car.
    pub async fn send_handshake(&mut self) -> Result<(), DispatchError> {
        for write in commands::handshake_writes(self.control_handle) {
            self.dispatcher
                .dispatch(self.connection.link(), &write)
                .await?;
        }
        Ok(())
    }

    /// Encodes and dispatches a single command.
    ///
    /// Commands that encode to nothing, out-of-range intensities under the
    /// drop policy, are discarded here without an error.
    pub async fn send_command(&mut self, command: CarCommand) -> Result<(), DispatchError> {
        match command.encode(self.control_handle, self.intensity_policy) {
            Some(write) => self.dispatcher.dispatch(self.connection.link(), &write).await,
            None => {
                debug!("Dropping {command:?}: nothing to send");
                Ok(())
            }
        }
    }

    pub async fn drive_forward(&mut self, intensity: f64) -> Result<(), DispatchError> {
        self.send_command(CarCommand::Forward(intensity)).await
    }

    pub async fn drive_reverse(&mut self, intensity: f64) -> Result<(), DispatchError> {
        self.send_command(CarCommand::Reverse(intensity)).await
    }

    pub async fn steer_left(&mut self, intensity: f64) -> Result<(), DispatchError> {
        self.send_command(CarCommand::Left(intensity)).await
    }

    pub async fn steer_right(&mut self, intensity: f64) -> Result<(), DispatchError> {
        self.send_command(CarCommand::Right(intensity)).await
    }

    pub async fn fire(&mut self) -> Result<(), DispatchError> {
        self.send_command(CarCommand::Fire).await
    }

    pub fn devices(&self) -> &[DiscoveredDevice] {
        self.registry.devices()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    pub fn connected_car(&self) -> Option<&DiscoveredDevice> {
        self.connection.connected_device()
    }

    /// Walks the GATT tree of the active car.
    pub async fn services(&self) -> Result<Vec<GattServiceInfo>, TransportError> {
        let link = self.connection.link().ok_or(TransportError::NotConnected)?;
        link.services().await
    }

    /// Reads the current value behind `handle` on the active car.
    pub async fn read_value(&self, handle: u16) -> Result<Vec<u8>, TransportError> {
        let link = self.connection.link().ok_or(TransportError::NotConnected)?;
        link.read_characteristic(handle).await
    }
}
