//! Ordered roster of cars the user can dial by index.
//!
//! Every refresh rebuilds the list from a fresh scan, then appends the
//! known cars from configuration so they stay reachable even when the
//! radio finds nothing.

use std::time::Duration;

use log::{debug, info, warn};

use crate::config::KnownCar;
use crate::core::bluetooth::transport::{AddressType, CarTransport};
use crate::core::bluetooth::types::DiscoveredDevice;
use crate::core::errors::ScanError;

pub struct DeviceRegistry {
    devices: Vec<DiscoveredDevice>,
    known_cars: Vec<KnownCar>,
}

impl DeviceRegistry {
    pub fn new(known_cars: Vec<KnownCar>) -> Self {
        Self {
            devices: Vec::new(),
            known_cars,
        }
    }

    /// Replaces the roster with a fresh scan plus the configured known cars.
    ///
    /// Indices handed out before a refresh are invalidated by it. The known
    /// cars are appended even when the scan itself fails, so a dead adapter
    /// still leaves the configured cars dialable; the scan error is returned
    /// after the roster is rebuilt.
    pub async fn refresh(
        &mut self,
        transport: &dyn CarTransport,
        timeout: Duration,
    ) -> Result<usize, ScanError> {
        self.devices.clear();

        match transport.scan(timeout).await {
            Ok(advertisements) => {
                for advertisement in advertisements {
                    // Cars advertise with a fixed public address; everything
                    // hopping on a random address is some other gadget.
                    if advertisement.address_type != AddressType::Public {
                        debug!(
                            "Skipping non-public advertiser {}",
                            advertisement.address
                        );
                        continue;
                    }
                    self.devices.push(DiscoveredDevice::scanned(
                        advertisement.name,
                        advertisement.address,
                        advertisement.rssi,
                    ));
                }
                let scanned = self.devices.len();
                self.append_known_cars();
                info!(
                    "Scan finished: {} scanned, {} known, {} total",
                    scanned,
                    self.known_cars.len(),
                    self.devices.len()
                );
                Ok(self.devices.len())
            }
            Err(e) => {
                warn!("Scan failed ({e}), listing known cars only");
                self.append_known_cars();
                Err(e.into())
            }
        }
    }

    fn append_known_cars(&mut self) {
        for car in &self.known_cars {
            self.devices.push(DiscoveredDevice::known(
                car.name.clone(),
                car.address.clone(),
            ));
        }
    }

    pub fn devices(&self) -> &[DiscoveredDevice] {
        &self.devices
    }

    pub fn get(&self, index: usize) -> Option<&DiscoveredDevice> {
        self.devices.get(index)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bluetooth::mock::MockTransport;
    use crate::core::bluetooth::types::DeviceOrigin;

    fn known(name: &str, address: &str) -> KnownCar {
        KnownCar {
            name: name.to_string(),
            address: address.to_string(),
        }
    }

    #[tokio::test]
    async fn refresh_keeps_public_devices_and_appends_known_cars() {
        let transport = MockTransport::new();
        transport.advertise_public("REV-A", "AA:BB:CC:DD:EE:01", -42);
        transport.advertise_random("4f[random]");
        transport.advertise_public("REV-B", "AA:BB:CC:DD:EE:02", -60);

        let mut registry = DeviceRegistry::new(vec![known("Garage car", "AA:BB:CC:DD:EE:99")]);
        let total = registry
            .refresh(&transport, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(total, 3);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry.get(0).unwrap().address, "AA:BB:CC:DD:EE:01");
        assert_eq!(registry.get(0).unwrap().origin, DeviceOrigin::Scanned);
        assert_eq!(registry.get(1).unwrap().address, "AA:BB:CC:DD:EE:02");
        assert_eq!(registry.get(2).unwrap().origin, DeviceOrigin::Known);
        assert_eq!(registry.get(2).unwrap().name.as_deref(), Some("Garage car"));
    }

    #[tokio::test]
    async fn refresh_lists_known_cars_even_when_the_scan_fails() {
        let transport = MockTransport::new();
        transport.set_scan_failure(true);

        let mut registry = DeviceRegistry::new(vec![
            known("One", "AA:BB:CC:DD:EE:01"),
            known("Two", "AA:BB:CC:DD:EE:02"),
        ]);
        let result = registry.refresh(&transport, Duration::from_secs(1)).await;

        assert!(result.is_err());
        assert_eq!(registry.len(), 2);
        assert!(registry
            .devices()
            .iter()
            .all(|d| d.origin == DeviceOrigin::Known));
    }

    #[tokio::test]
    async fn refresh_discards_the_previous_roster() {
        let transport = MockTransport::new();
        transport.advertise_public("REV-A", "AA:BB:CC:DD:EE:01", -42);

        let mut registry = DeviceRegistry::new(Vec::new());
        registry
            .refresh(&transport, Duration::from_secs(1))
            .await
            .unwrap();
        registry
            .refresh(&transport, Duration::from_secs(1))
            .await
            .unwrap();

        // The single advertiser must not accumulate across refreshes.
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn get_is_none_past_the_end() {
        let registry = DeviceRegistry::new(Vec::new());
        assert!(registry.get(0).is_none());
        assert!(registry.is_empty());
    }
}
