//! Bluetooth plumbing for the car controller.
//! Scanning and the device roster, the single-car connection, the vendor
//! command encoding and the dispatcher that carries writes to the link.

pub mod bluest;
pub mod commands;
pub mod connection;
pub mod constants;
pub mod dispatcher;
pub mod mock;
pub mod registry;
pub mod transport;
pub mod types;

// Re-export types that should be publicly accessible
pub use self::bluest::BluestTransport;
pub use commands::{CarCommand, IntensityPolicy};
pub use connection::ConnectionManager;
pub use constants::*; // Re-export all constants
pub use dispatcher::CommandDispatcher;
pub use mock::MockTransport;
pub use registry::DeviceRegistry;
pub use transport::{AddressType, Advertisement, CarLink, CarTransport, TransportError};
pub use types::{
    CharacteristicWrite, ConnectionState, DeviceOrigin, DiscoveredDevice,
    GattCharacteristicInfo, GattDescriptorInfo, GattServiceInfo,
};
