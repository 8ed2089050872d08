//! Profile sessions.
//!
//! A session owns everything known about one connection: characteristic
//! handles, protocol state and the outbound request queue. Sessions are
//! driven by [`TransportEvent`]s and answer with [`SessionEvent`]s; the GATT
//! procedures they want executed are left in their [`RequestQueue`].

pub mod blood_pressure;
pub mod cycling;
pub mod events;
pub mod queue;
pub mod racp;

pub use blood_pressure::BloodPressureSession;
pub use cycling::CyclingSpeedCadenceSession;
pub use events::{SessionCallbacks, SessionEvent};
pub use queue::{GattCommand, RequestQueue};
pub use racp::{RacpInput, RacpMachine, RacpOutput, RacpPhase};

use uuid::Uuid;

use crate::ble::transport::ServiceSet;

/// Something the transport reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The link is up.
    Connected,
    /// The link went down.
    Disconnected,
    /// Service discovery finished.
    ServicesDiscovered(ServiceSet),
    /// A notification or indication arrived.
    CharacteristicChanged {
        /// Source characteristic.
        uuid: Uuid,
        /// The value.
        value: Vec<u8>,
    },
    /// A read request completed.
    CharacteristicRead {
        /// Source characteristic.
        uuid: Uuid,
        /// The value read.
        value: Vec<u8>,
    },
    /// A write or CCCD update completed.
    WriteComplete(Uuid),
    /// A GATT procedure failed.
    Error {
        /// Description of the failure.
        reason: String,
        /// GATT status code.
        code: i32,
    },
}

impl TransportEvent {
    /// Whether the event finishes the in-flight request.
    pub fn completes_request(&self) -> bool {
        matches!(
            self,
            Self::CharacteristicRead { .. } | Self::WriteComplete(_) | Self::Error { .. }
        )
    }
}

/// A GATT client profile driven by transport events.
pub trait GattProfile: Send + 'static {
    /// Process one transport event.
    fn handle_event(&mut self, event: TransportEvent) -> Vec<SessionEvent>;

    /// Outbound requests waiting to be executed.
    fn requests(&mut self) -> &mut RequestQueue;

    /// Whether the profile is waiting on the device and wants a watchdog.
    fn operation_pending(&self) -> bool {
        false
    }

    /// The watchdog fired while an operation was pending.
    fn on_watchdog_expired(&mut self) -> Vec<SessionEvent> {
        Vec::new()
    }
}
