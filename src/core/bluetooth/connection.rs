//! Link lifecycle for a single car.
//!
//! One car at a time: a new connect releases the previous link, a
//! disconnect always lands the manager back in `Disconnected` even when
//! the transport refuses to let go.

use std::sync::Arc;
use std::time::Duration;

use log::{info, warn};

use crate::core::bluetooth::transport::{CarLink, CarTransport};
use crate::core::bluetooth::types::{ConnectionState, DiscoveredDevice};
use crate::core::errors::{ConnectError, DisconnectError};

pub struct ConnectionManager {
    transport: Arc<dyn CarTransport>,
    state: ConnectionState,
    link: Option<Box<dyn CarLink>>,
    device: Option<DiscoveredDevice>,
    connect_timeout: Duration,
}

impl ConnectionManager {
    pub fn new(transport: Arc<dyn CarTransport>, connect_timeout: Duration) -> Self {
        Self {
            transport,
            state: ConnectionState::Disconnected,
            link: None,
            device: None,
            connect_timeout,
        }
    }

    /// Dials `device` and, on success, makes it the active car.
    ///
    /// An already-active link is released first; its disconnect outcome is
    /// logged but never blocks the new attempt. While an attempt is in
    /// flight the manager reports [`ConnectError::Busy`] instead of piling
    /// up a second one.
    pub async fn connect(&mut self, device: &DiscoveredDevice) -> Result<(), ConnectError> {
        if self.state == ConnectionState::Connecting {
            return Err(ConnectError::Busy);
        }

        if let Some(previous) = self.link.take() {
            info!("Releasing current link before dialing {}", device.address);
            if let Err(e) = previous.disconnect().await {
                warn!("Releasing previous link failed: {e}");
            }
        }
        self.device = None;
        self.state = ConnectionState::Connecting;

        let attempt = tokio::time::timeout(
            self.connect_timeout,
            self.transport.connect(&device.address),
        )
        .await;

        match attempt {
            Ok(Ok(link)) => {
                info!("Connected to {}", device.address);
                self.link = Some(link);
                self.device = Some(device.clone());
                self.state = ConnectionState::Connected;
                Ok(())
            }
            Ok(Err(e)) => {
                self.state = ConnectionState::Disconnected;
                Err(e.into())
            }
            Err(_) => {
                self.state = ConnectionState::Disconnected;
                Err(ConnectError::Timeout {
                    address: device.address.clone(),
                    timeout: self.connect_timeout,
                })
            }
        }
    }

    /// Releases the active link.
    ///
    /// Local state is cleared before the transport is asked to tear the
    /// link down, so the manager is `Disconnected` afterwards no matter
    /// what the radio reports.
    pub async fn disconnect(&mut self) -> Result<(), DisconnectError> {
        self.state = ConnectionState::Disconnected;
        self.device = None;

        let link = self.link.take().ok_or(DisconnectError::NotConnected)?;
        link.disconnect().await?;
        info!("Disconnected");
        Ok(())
    }

    pub fn link(&self) -> Option<&dyn CarLink> {
        self.link.as_deref()
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn connected_device(&self) -> Option<&DiscoveredDevice> {
        self.device.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn force_state(&mut self, state: ConnectionState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::mock::MockTransport;

    fn scanned(address: &str) -> DiscoveredDevice {
        DiscoveredDevice::scanned(None, address.to_string(), None)
    }

    #[tokio::test]
    async fn connect_then_disconnect_round_trip() {
        let transport = MockTransport::new();
        let mut manager =
            ConnectionManager::new(Arc::new(transport.clone()), Duration::from_secs(5));

        manager.connect(&scanned("AA:BB:CC:DD:EE:01")).await.unwrap();
        assert!(manager.is_connected());
        assert_eq!(
            manager.connected_device().unwrap().address,
            "AA:BB:CC:DD:EE:01"
        );

        manager.disconnect().await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.connected_device().is_none());
        assert_eq!(transport.disconnect_count(), 1);
    }

    #[tokio::test]
    async fn failed_connect_leaves_the_manager_disconnected() {
        let transport = MockTransport::new();
        transport.refuse_connect("AA:BB:CC:DD:EE:01");
        let mut manager =
            ConnectionManager::new(Arc::new(transport.clone()), Duration::from_secs(5));

        let result = manager.connect(&scanned("AA:BB:CC:DD:EE:01")).await;

        assert!(matches!(result, Err(ConnectError::Transport(_))));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.link().is_none());
    }

    #[tokio::test]
    async fn slow_connect_times_out() {
        let transport = MockTransport::new();
        transport.set_connect_delay(Duration::from_millis(200));
        let mut manager =
            ConnectionManager::new(Arc::new(transport.clone()), Duration::from_millis(20));

        let result = manager.connect(&scanned("AA:BB:CC:DD:EE:01")).await;

        assert!(matches!(result, Err(ConnectError::Timeout { .. })));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn connect_while_connecting_is_refused() {
        let transport = MockTransport::new();
        let mut manager =
            ConnectionManager::new(Arc::new(transport.clone()), Duration::from_secs(5));
        manager.force_state(ConnectionState::Connecting);

        let result = manager.connect(&scanned("AA:BB:CC:DD:EE:01")).await;

        assert!(matches!(result, Err(ConnectError::Busy)));
        assert!(transport.connect_attempts().is_empty());
    }

    #[tokio::test]
    async fn reconnect_releases_the_previous_link_first() {
        let transport = MockTransport::new();
        let mut manager =
            ConnectionManager::new(Arc::new(transport.clone()), Duration::from_secs(5));

        manager.connect(&scanned("AA:BB:CC:DD:EE:01")).await.unwrap();
        manager.connect(&scanned("AA:BB:CC:DD:EE:02")).await.unwrap();

        assert_eq!(transport.disconnect_count(), 1);
        assert_eq!(
            manager.connected_device().unwrap().address,
            "AA:BB:CC:DD:EE:02"
        );
    }

    #[tokio::test]
    async fn disconnect_without_a_link_reports_not_connected() {
        let transport = MockTransport::new();
        let mut manager =
            ConnectionManager::new(Arc::new(transport.clone()), Duration::from_secs(5));

        let result = manager.disconnect().await;

        assert!(matches!(result, Err(DisconnectError::NotConnected)));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn disconnect_failure_still_clears_local_state() {
        let transport = MockTransport::new();
        transport.set_disconnect_failure(true);
        let mut manager =
            ConnectionManager::new(Arc::new(transport.clone()), Duration::from_secs(5));

        manager.connect(&scanned("AA:BB:CC:DD:EE:01")).await.unwrap();
        let result = manager.disconnect().await;

        assert!(result.is_err());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.link().is_none());
        assert!(manager.connected_device().is_none());
    }
}
