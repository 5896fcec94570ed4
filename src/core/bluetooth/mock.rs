//! Scripted in-memory transport for development and testing.
//! Tests preload advertisements and failure switches, then inspect the
//! writes the control layer produced; no radio is involved.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::core::bluetooth::transport::{
    Advertisement, AddressType, CarLink, CarTransport, TransportError,
};
use crate::core::bluetooth::types::{CharacteristicWrite, GattServiceInfo};

#[derive(Default)]
struct MockState {
    advertisements: Vec<Advertisement>,
    fail_scan: bool,
    refuse_connect: HashSet<String>,
    connect_delay: Option<Duration>,
    fail_write: bool,
    fail_disconnect: bool,
    read_values: HashMap<u16, Vec<u8>>,
    services: Vec<GattServiceInfo>,

    scan_count: usize,
    connect_attempts: Vec<String>,
    writes: Vec<CharacteristicWrite>,
    disconnect_count: usize,
}

/// Transport double backed by shared scripted state.
///
/// Clones share the same state, so a test can hand one clone to the control
/// layer and keep another for scripting and inspection.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a device every subsequent scan will report.
    pub fn advertise(&self, advertisement: Advertisement) {
        self.state.lock().unwrap().advertisements.push(advertisement);
    }

    /// Shorthand for a named public-address device.
    pub fn advertise_public(&self, name: &str, address: &str, rssi: i16) {
        self.advertise(Advertisement {
            address: address.to_string(),
            address_type: AddressType::Public,
            name: Some(name.to_string()),
            rssi: Some(rssi),
        });
    }

    /// Shorthand for a random-address device, which the registry filters out.
    pub fn advertise_random(&self, address: &str) {
        self.advertise(Advertisement {
            address: address.to_string(),
            address_type: AddressType::Random,
            name: None,
            rssi: Some(-70),
        });
    }

    /// Makes every scan fail at the transport level.
    pub fn set_scan_failure(&self, fail: bool) {
        self.state.lock().unwrap().fail_scan = fail;
    }

    /// Makes connects to `address` fail.
    pub fn refuse_connect(&self, address: &str) {
        self.state
            .lock()
            .unwrap()
            .refuse_connect
            .insert(address.to_string());
    }

    /// Stalls every connect by `delay` before it resolves.
    pub fn set_connect_delay(&self, delay: Duration) {
        self.state.lock().unwrap().connect_delay = Some(delay);
    }

    /// Makes every characteristic write fail.
    pub fn set_write_failure(&self, fail: bool) {
        self.state.lock().unwrap().fail_write = fail;
    }

    /// Makes transport-level disconnects fail.
    pub fn set_disconnect_failure(&self, fail: bool) {
        self.state.lock().unwrap().fail_disconnect = fail;
    }

    /// Scripts the value a diagnostic read of `handle` returns.
    pub fn set_read_value(&self, handle: u16, value: Vec<u8>) {
        self.state.lock().unwrap().read_values.insert(handle, value);
    }

    /// Scripts the GATT tree the diagnostics enumeration returns.
    pub fn set_services(&self, services: Vec<GattServiceInfo>) {
        self.state.lock().unwrap().services = services;
    }

    /// Number of scans the control layer has run.
    pub fn scan_count(&self) -> usize {
        self.state.lock().unwrap().scan_count
    }

    /// Addresses the control layer tried to dial, in order.
    pub fn connect_attempts(&self) -> Vec<String> {
        self.state.lock().unwrap().connect_attempts.clone()
    }

    /// Every successful characteristic write, in order.
    pub fn writes(&self) -> Vec<CharacteristicWrite> {
        self.state.lock().unwrap().writes.clone()
    }

    /// Number of transport-level disconnects requested.
    pub fn disconnect_count(&self) -> usize {
        self.state.lock().unwrap().disconnect_count
    }
}

#[async_trait]
impl CarTransport for MockTransport {
    async fn scan(&self, _timeout: Duration) -> Result<Vec<Advertisement>, TransportError> {
        let mut state = self.state.lock().unwrap();
        state.scan_count += 1;
        if state.fail_scan {
            return Err(TransportError::Backend("scan failed by script".into()));
        }
        Ok(state.advertisements.clone())
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn CarLink>, TransportError> {
        let delay = self.state.lock().unwrap().connect_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.connect_attempts.push(address.to_string());
        if state.refuse_connect.contains(address) {
            return Err(TransportError::Backend(format!(
                "connect to {address} refused by script"
            )));
        }
        Ok(Box::new(MockLink {
            state: self.state.clone(),
        }))
    }
}

struct MockLink {
    state: Arc<Mutex<MockState>>,
}

#[async_trait]
impl CarLink for MockLink {
    async fn write_characteristic(
        &self,
        handle: u16,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.fail_write {
            return Err(TransportError::Backend("write failed by script".into()));
        }
        state
            .writes
            .push(CharacteristicWrite::new(handle, payload.to_vec(), with_response));
        Ok(())
    }

    async fn read_characteristic(&self, handle: u16) -> Result<Vec<u8>, TransportError> {
        self.state
            .lock()
            .unwrap()
            .read_values
            .get(&handle)
            .cloned()
            .ok_or(TransportError::UnknownHandle { handle })
    }

    async fn services(&self) -> Result<Vec<GattServiceInfo>, TransportError> {
        Ok(self.state.lock().unwrap().services.clone())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.disconnect_count += 1;
        if state.fail_disconnect {
            return Err(TransportError::Backend(
                "disconnect failed by script".into(),
            ));
        }
        Ok(())
    }
}
