//! Live transport over the system Bluetooth stack.
//!
//! Platform device ids are mapped to stable MAC-style addresses where the
//! backend exposes one; everything else is carried under its raw id with an
//! unknown address type and filtered upstream.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bluest::{Adapter, Characteristic, CharacteristicProperties, Device};
use futures_util::StreamExt;
use log::{debug, info, warn};
use regex::Regex;
use uuid::Uuid;

use crate::config::LinkConfig;
use crate::core::bluetooth::constants::gatt_common_name;
use crate::core::bluetooth::transport::{
    AddressType, Advertisement, CarLink, CarTransport, TransportError,
};
use crate::core::bluetooth::types::{
    GattCharacteristicInfo, GattDescriptorInfo, GattServiceInfo,
};

/// Scan window used when a connect target is missing from the cache.
const REDISCOVERY_WINDOW: Duration = Duration::from_secs(5);

impl From<bluest::Error> for TransportError {
    fn from(e: bluest::Error) -> Self {
        TransportError::Backend(e.to_string())
    }
}

pub struct BluestTransport {
    adapter: Adapter,
    /// Map of reported addresses to backend devices, rebuilt by each scan.
    devices: Arc<Mutex<HashMap<String, Device>>>,
    control_handle: u16,
    service_uuid: Option<Uuid>,
    characteristic_uuid: Option<Uuid>,
}

impl BluestTransport {
    pub async fn new(config: &LinkConfig) -> Result<Self, TransportError> {
        let adapter = Adapter::default()
            .await
            .ok_or(TransportError::AdapterUnavailable)?;
        adapter.wait_available().await?;
        info!("Bluetooth adapter is available.");

        Ok(Self {
            adapter,
            devices: Arc::new(Mutex::new(HashMap::new())),
            control_handle: config.control_handle,
            service_uuid: parse_uuid(config.service_uuid.as_deref())?,
            characteristic_uuid: parse_uuid(config.characteristic_uuid.as_deref())?,
        })
    }

    async fn rediscover(&self, address: &str) -> Result<Device, TransportError> {
        info!("{address} is not in the scan cache, running a short rediscovery scan");
        let mut scan_stream = self.adapter.scan(&[]).await?;
        let deadline = tokio::time::sleep(REDISCOVERY_WINDOW);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                discovered = scan_stream.next() => {
                    match discovered {
                        Some(discovered_device) => {
                            let device = discovered_device.device;
                            let id = device.id().to_string();
                            let matches = extract_mac_address(&id).as_deref() == Some(address)
                                || id == address;
                            if matches {
                                self.devices
                                    .lock()
                                    .unwrap()
                                    .insert(address.to_string(), device.clone());
                                return Ok(device);
                            }
                        }
                        None => break,
                    }
                }
                _ = &mut deadline => break,
            }
        }

        Err(TransportError::DeviceNotFound {
            address: address.to_string(),
        })
    }

    /// Picks the characteristic all control writes go to.
    ///
    /// A configured service/characteristic UUID pins the choice; without one
    /// the first writable characteristic wins, which on these cars is the
    /// vendor control point.
    async fn resolve_control_characteristic(
        &self,
        device: &Device,
    ) -> Result<Characteristic, TransportError> {
        let services = device.services().await?;

        for service in &services {
            if let Some(wanted) = self.service_uuid {
                if service.uuid() != wanted {
                    continue;
                }
            }
            for characteristic in service.characteristics().await? {
                if let Some(wanted) = self.characteristic_uuid {
                    if characteristic.uuid() == wanted {
                        info!("Using configured control characteristic {wanted}");
                        return Ok(characteristic);
                    }
                    continue;
                }
                let properties = characteristic.properties().await?;
                if properties.write || properties.write_without_response {
                    info!(
                        "Using writable characteristic {} in service {}",
                        characteristic.uuid(),
                        service.uuid()
                    );
                    return Ok(characteristic);
                }
            }
        }

        for service in &services {
            info!("Available service: {}", service.uuid());
        }
        Err(TransportError::NoWritableCharacteristic)
    }
}

#[async_trait]
impl CarTransport for BluestTransport {
    async fn scan(&self, timeout: Duration) -> Result<Vec<Advertisement>, TransportError> {
        self.devices.lock().unwrap().clear();

        info!("Starting bluetooth scan");
        let mut scan_stream = self.adapter.scan(&[]).await?;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);

        let mut seen = HashSet::new();
        let mut found = Vec::new();
        loop {
            tokio::select! {
                discovered = scan_stream.next() => {
                    match discovered {
                        Some(discovered_device) => {
                            let device = discovered_device.device;
                            let rssi = discovered_device.rssi;
                            let id = device.id().to_string();
                            if !seen.insert(id.clone()) {
                                continue;
                            }

                            let name = device.name().ok().filter(|n| !n.is_empty());
                            debug!("Found device - ID: {id}, Name: {name:?}, RSSI: {rssi:?}");

                            let (address, address_type) = match extract_mac_address(&id) {
                                Some(mac) => (mac, AddressType::Public),
                                None => (id.clone(), AddressType::Unknown),
                            };
                            self.devices
                                .lock()
                                .unwrap()
                                .insert(address.clone(), device);
                            found.push(Advertisement {
                                address,
                                address_type,
                                name,
                                rssi,
                            });
                        }
                        None => {
                            info!("Bluetooth scan stream has ended.");
                            break;
                        }
                    }
                }
                _ = &mut deadline => break,
            }
        }

        info!("Scan finished, {} advertisers seen", found.len());
        Ok(found)
    }

    async fn connect(&self, address: &str) -> Result<Box<dyn CarLink>, TransportError> {
        let cached = self.devices.lock().unwrap().get(address).cloned();
        let device = match cached {
            Some(device) => device,
            None => self.rediscover(address).await?,
        };

        if !device.is_connected().await {
            info!("Initiating connection to {address}...");
            self.adapter.connect_device(&device).await?;
        }

        info!("Connection successful, resolving control characteristic...");
        let control = self.resolve_control_characteristic(&device).await?;
        let mut characteristics = HashMap::new();
        characteristics.insert(self.control_handle, control);

        Ok(Box::new(BluestLink {
            adapter: self.adapter.clone(),
            device,
            characteristics,
        }))
    }
}

struct BluestLink {
    adapter: Adapter,
    device: Device,
    /// Handles the control layer may address, resolved at connect time.
    characteristics: HashMap<u16, Characteristic>,
}

impl BluestLink {
    fn characteristic(&self, handle: u16) -> Result<&Characteristic, TransportError> {
        self.characteristics
            .get(&handle)
            .ok_or(TransportError::UnknownHandle { handle })
    }
}

#[async_trait]
impl CarLink for BluestLink {
    async fn write_characteristic(
        &self,
        handle: u16,
        payload: &[u8],
        with_response: bool,
    ) -> Result<(), TransportError> {
        let characteristic = self.characteristic(handle)?;
        if with_response {
            characteristic.write(payload).await?;
        } else {
            characteristic.write_without_response(payload).await?;
        }
        Ok(())
    }

    async fn read_characteristic(&self, handle: u16) -> Result<Vec<u8>, TransportError> {
        let characteristic = self.characteristic(handle)?;
        Ok(characteristic.read().await?)
    }

    async fn services(&self) -> Result<Vec<GattServiceInfo>, TransportError> {
        let mut tree = Vec::new();
        for service in self.device.services().await? {
            let mut characteristics = Vec::new();
            for characteristic in service.characteristics().await? {
                let properties = characteristic.properties().await?;
                let mut descriptors = Vec::new();
                match characteristic.descriptors().await {
                    Ok(found) => {
                        for descriptor in found {
                            descriptors.push(GattDescriptorInfo {
                                uuid: descriptor.uuid().to_string(),
                                common_name: gatt_common_name(&descriptor.uuid())
                                    .map(str::to_string),
                            });
                        }
                    }
                    Err(e) => {
                        warn!(
                            "Descriptor discovery failed on {}: {e}",
                            characteristic.uuid()
                        );
                    }
                }
                characteristics.push(GattCharacteristicInfo {
                    uuid: characteristic.uuid().to_string(),
                    common_name: gatt_common_name(&characteristic.uuid()).map(str::to_string),
                    properties: properties_label(&properties),
                    descriptors,
                });
            }
            tree.push(GattServiceInfo {
                uuid: service.uuid().to_string(),
                common_name: gatt_common_name(&service.uuid()).map(str::to_string),
                characteristics,
            });
        }
        Ok(tree)
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        if self.device.is_connected().await {
            info!("Disconnecting from device {}", self.device.id());
            self.adapter.disconnect_device(&self.device).await?;
            info!("Successfully disconnected");
        } else {
            info!("Device {} not connected", self.device.id());
        }
        Ok(())
    }
}

fn parse_uuid(raw: Option<&str>) -> Result<Option<Uuid>, TransportError> {
    match raw {
        Some(s) => Uuid::parse_str(s)
            .map(Some)
            .map_err(|_| TransportError::InvalidUuid(s.to_string())),
        None => Ok(None),
    }
}

fn properties_label(properties: &CharacteristicProperties) -> String {
    let mut labels = Vec::new();
    if properties.broadcast {
        labels.push("BROADCAST");
    }
    if properties.read {
        labels.push("READ");
    }
    if properties.write_without_response {
        labels.push("WRITE NO RESPONSE");
    }
    if properties.write {
        labels.push("WRITE");
    }
    if properties.notify {
        labels.push("NOTIFY");
    }
    if properties.indicate {
        labels.push("INDICATE");
    }
    labels.join(" ")
}

fn extract_mac_address(device_id_str: &str) -> Option<String> {
    let re = Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").unwrap();
    re.find_iter(device_id_str)
        .last()
        .map(|m| m.as_str().to_string().to_uppercase())
}
