//! Core functionality for the car controller.
//! Everything between the command line and the radio lives here.

pub mod bluetooth;
pub mod errors;
pub mod manager;

// Re-export commonly used types
pub use errors::{ConnectError, DisconnectError, DispatchError, ScanError};
pub use manager::CarManager;
