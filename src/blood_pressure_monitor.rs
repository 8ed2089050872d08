//! Blood pressure monitor front-end.
//!
//! Ties a btleplug peripheral to a [`BloodPressureSession`] through the
//! [`Device`] driver.

use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use chrono::NaiveDateTime;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use crate::ble::characteristics::CharacteristicHandler;
use crate::ble::connection::{ConnectionManager, ConnectionState};
use crate::config::SessionConfig;
use crate::data::MeasurementRecord;
use crate::device::{CallbackHandle, Device};
use crate::error::Result;
use crate::session::racp::RacpPhase;
use crate::session::{BloodPressureSession, SessionCallbacks, SessionEvent};

/// A Blood Pressure profile device.
///
/// # Example
///
/// ```rust,no_run
/// use health_profiles_ble::{BloodPressureMonitor, SessionConfig, SessionEvent};
/// # async fn run(peripheral: btleplug::platform::Peripheral) -> health_profiles_ble::Result<()> {
/// let monitor = BloodPressureMonitor::new(peripheral, SessionConfig::default());
/// let mut events = monitor.subscribe();
/// monitor.connect().await?;
///
/// while let Ok(event) = events.recv().await {
///     match event {
///         SessionEvent::DeviceReady => monitor.get_all_records(),
///         SessionEvent::OperationCompleted => break,
///         _ => {}
///     }
/// }
///
/// for record in monitor.records() {
///     println!("{}/{} {}", record.systolic, record.diastolic, record.unit);
/// }
/// # Ok(())
/// # }
/// ```
pub struct BloodPressureMonitor {
    identifier: String,
    connection: Arc<ConnectionManager>,
    link: Mutex<Option<CallbackHandle>>,
    device: Device<BloodPressureSession, CharacteristicHandler>,
    config: SessionConfig,
}

impl BloodPressureMonitor {
    /// Create a monitor for a peripheral. Call [`BloodPressureMonitor::connect`]
    /// to start the session.
    pub fn new(peripheral: Peripheral, config: SessionConfig) -> Self {
        Self::with_session(peripheral, BloodPressureSession::new(), config)
    }

    /// Create a monitor around a preconfigured session.
    pub fn with_session(
        peripheral: Peripheral,
        session: BloodPressureSession,
        config: SessionConfig,
    ) -> Self {
        let identifier = format!("{:?}", peripheral.id());
        let transport = Arc::new(CharacteristicHandler::new(peripheral.clone()));

        Self {
            identifier,
            connection: Arc::new(ConnectionManager::with_config(peripheral, &config)),
            link: Mutex::new(None),
            device: Device::new(session, transport, &config),
            config,
        }
    }

    /// BLE identifier of the peripheral.
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Get the connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Connect, discover services and start the initialization sequence.
    pub async fn connect(&self) -> Result<()> {
        info!("Connecting to blood pressure monitor {}", self.identifier);

        self.connection
            .connect(self.config.maintain_connection)
            .await?;

        // The link tracker only stays registered if this call started the pump.
        let link = self.device.set_callbacks(self.connection.clone());
        if self.device.start().await? {
            *self.link.lock() = Some(link);
        }
        Ok(())
    }

    /// Stop the session and disconnect.
    pub async fn disconnect(&self) -> Result<()> {
        info!("Disconnecting from blood pressure monitor {}", self.identifier);

        let result = self.connection.disconnect().await;
        self.device.stop().await;
        self.link.lock().take();
        result
    }

    /// Subscribe to session events.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.device.subscribe()
    }

    /// Register callbacks for session events.
    pub fn set_callbacks(&self, callbacks: Arc<dyn SessionCallbacks>) -> CallbackHandle {
        self.device.set_callbacks(callbacks)
    }

    // === Records ===

    /// Records received since the last clear.
    pub fn records(&self) -> Vec<MeasurementRecord> {
        self.device.with_session(|s| s.records().records().to_vec())
    }

    /// Current RACP phase.
    pub fn racp_phase(&self) -> RacpPhase {
        self.device.with_session(|s| s.racp_phase())
    }

    /// Whether the device exposes a Record Access Control Point.
    pub fn has_record_access(&self) -> bool {
        self.device.with_session(|s| s.has_record_access())
    }

    /// Request every stored record.
    pub fn get_all_records(&self) {
        self.device.perform(|s| s.get_all_records());
    }

    /// Request the oldest stored record.
    pub fn get_first_record(&self) {
        self.device.perform(|s| s.get_first_record());
    }

    /// Request the most recent stored record.
    pub fn get_last_record(&self) {
        self.device.perform(|s| s.get_last_record());
    }

    /// Request records at or after (`greater_or_equal`) or at or before a
    /// sequence number.
    pub fn get_records_by_sequence(&self, sequence_number: u16, greater_or_equal: bool) {
        self.device
            .perform(|s| s.get_records_by_sequence(sequence_number, greater_or_equal));
    }

    /// Request records whose sequence number lies in `min..=max`.
    pub fn get_records_in_range(&self, min: u16, max: u16) -> Result<()> {
        self.device
            .try_perform(|s| s.get_records_in_range(min, max))
            .map(|_| ())
    }

    /// Request records at or after (`greater_or_equal`) or at or before a time.
    pub fn get_specific_record(&self, time: &NaiveDateTime, greater_or_equal: bool) -> Result<()> {
        self.device
            .try_perform(|s| s.get_specific_record(time, greater_or_equal))
            .map(|_| ())
    }

    /// Ask the device how many records it holds, then fetch them.
    pub fn request_number_of_records(&self) {
        self.device.perform(|s| s.request_number_of_records());
    }

    /// Delete every record on the device.
    pub fn delete_all_records(&self) {
        self.device.perform(|s| s.delete_all_records());
    }

    /// Abort the running operation.
    pub fn abort(&self) {
        self.device.perform(|s| s.abort());
    }

    /// Fetch all records if none are held yet.
    pub fn refresh_records(&self) {
        self.device.perform(|s| s.refresh_records());
    }

    /// Empty the local record store.
    pub fn clear(&self) {
        self.device.perform(|s| s.clear());
    }
}

impl std::fmt::Debug for BloodPressureMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloodPressureMonitor")
            .field("identifier", &self.identifier)
            .field("connection_state", &self.connection_state())
            .field("racp_phase", &self.racp_phase())
            .finish()
    }
}
