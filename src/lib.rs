// Allow unusual byte groupings for UUIDs which have standard format
#![allow(clippy::unusual_byte_groupings)]

//! # health-profiles-ble
//!
//! A Rust library implementing the client side of the Bluetooth SIG
//! Blood Pressure and Cycling Speed & Cadence GATT profiles.
//!
//! ## Features
//!
//! - **Blood Pressure**: Measurement indications and Intermediate Cuff Pressure notifications
//! - **Stored Records**: Record Access Control Point retrieval, delete and abort
//! - **Clock Sync**: Current Time written to the device on connect
//! - **Speed & Cadence**: Wheel and crank revolution data plus battery level
//! - **Sans-IO Sessions**: Protocol logic runs without a radio, driven by plain events
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use btleplug::api::{Central, Manager as _};
//! use btleplug::platform::Manager;
//! use health_profiles_ble::{BloodPressureMonitor, SessionConfig, SessionEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let manager = Manager::new().await?;
//!     let adapter = manager.adapters().await?.remove(0);
//!     let peripheral = adapter.peripherals().await?.remove(0);
//!
//!     let monitor = BloodPressureMonitor::new(peripheral, SessionConfig::default());
//!     let mut events = monitor.subscribe();
//!     monitor.connect().await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         match event {
//!             SessionEvent::DeviceReady => monitor.get_all_records(),
//!             SessionEvent::BloodPressureMeasurement { systolic, diastolic, unit, .. } => {
//!                 println!("{}/{} {}", systolic, diastolic, unit);
//!             }
//!             SessionEvent::OperationCompleted => break,
//!             _ => {}
//!         }
//!     }
//!
//!     monitor.disconnect().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Testing without hardware
//!
//! [`BloodPressureSession`] and [`CyclingSpeedCadenceSession`] implement
//! [`GattProfile`]: feed them [`TransportEvent`]s and inspect the
//! [`SessionEvent`]s and queued [`GattCommand`]s they produce. [`Device`]
//! drives any profile over any [`GattTransport`].
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization for data and config types

// Public modules
pub mod ble;
pub mod blood_pressure_monitor;
pub mod config;
pub mod cycling_sensor;
pub mod data;
pub mod device;
pub mod error;
pub mod protocol;
pub mod session;
pub mod utils;

// Re-exports for convenience
pub use blood_pressure_monitor::BloodPressureMonitor;
pub use config::SessionConfig;
pub use cycling_sensor::CyclingSensor;
pub use device::{CallbackHandle, Device};
pub use error::{Error, Result};
pub use utils::{kpa_to_mmhg, mmhg_to_kpa};

// Re-export commonly used types from submodules
pub use ble::connection::ConnectionState;
pub use ble::transport::{GattTransport, NotificationEvent, ServiceSet};
pub use data::{MeasurementRecord, PressureUnit, RecordStore, Timestamp};
pub use protocol::csc::CscSample;
pub use protocol::racp::{OpCode, Operator, RacpCommand, RacpResponse, ResponseCode};
pub use session::{
    BloodPressureSession, CyclingSpeedCadenceSession, GattCommand, GattProfile, RacpPhase,
    SessionCallbacks, SessionEvent, TransportEvent,
};
