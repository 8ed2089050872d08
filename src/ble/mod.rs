//! BLE communication module.
//!
//! This module provides the transport boundary used by the profile sessions
//! and its btleplug implementation.

pub mod characteristics;
pub mod connection;
pub mod transport;
pub mod uuids;

pub use characteristics::CharacteristicHandler;
pub use connection::{ConnectionManager, ConnectionState};
pub use transport::{DiscoveredCharacteristic, GattTransport, NotificationEvent, ServiceSet};
pub use uuids::*;
