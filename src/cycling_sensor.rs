//! Cycling speed and cadence sensor front-end.

use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

use crate::ble::characteristics::CharacteristicHandler;
use crate::ble::connection::{ConnectionManager, ConnectionState};
use crate::config::SessionConfig;
use crate::device::{CallbackHandle, Device};
use crate::error::Result;
use crate::protocol::csc::CscSample;
use crate::session::{CyclingSpeedCadenceSession, SessionCallbacks, SessionEvent};

/// A Cycling Speed and Cadence profile device.
pub struct CyclingSensor {
    identifier: String,
    connection: Arc<ConnectionManager>,
    link: Mutex<Option<CallbackHandle>>,
    device: Device<CyclingSpeedCadenceSession, CharacteristicHandler>,
    config: SessionConfig,
}

impl CyclingSensor {
    /// Create a sensor for a peripheral.
    pub fn new(peripheral: Peripheral, config: SessionConfig) -> Self {
        let identifier = format!("{:?}", peripheral.id());
        let transport = Arc::new(CharacteristicHandler::new(peripheral.clone()));

        Self {
            identifier,
            connection: Arc::new(ConnectionManager::with_config(peripheral, &config)),
            link: Mutex::new(None),
            device: Device::new(CyclingSpeedCadenceSession::new(), transport, &config),
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

    /// Connect and start streaming measurements.
    pub async fn connect(&self) -> Result<()> {
        info!("Connecting to cycling sensor {}", self.identifier);

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
        info!("Disconnecting from cycling sensor {}", self.identifier);

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

    /// Register a callback for wheel and crank blocks.
    ///
    /// Wheel data is `(revolutions, event_time)`; crank data likewise.
    pub fn on_measurement<F>(&self, callback: F) -> CallbackHandle
    where
        F: Fn(Option<(u32, u16)>, Option<(u16, u16)>) + Send + Sync + 'static,
    {
        struct Forward<F>(F);

        impl<F> SessionCallbacks for Forward<F>
        where
            F: Fn(Option<(u32, u16)>, Option<(u16, u16)>) + Send + Sync,
        {
            fn on_wheel_measurement(&self, revolutions: u32, event_time: u16) {
                (self.0)(Some((revolutions, event_time)), None);
            }

            fn on_crank_measurement(&self, revolutions: u16, event_time: u16) {
                (self.0)(None, Some((revolutions, event_time)));
            }
        }

        self.set_callbacks(Arc::new(Forward(callback)))
    }

    /// The most recent complete measurement.
    pub fn last_sample(&self) -> Option<CscSample> {
        self.device.with_session(|s| s.last_sample())
    }

    /// Whether the sensor exposes a Battery Level characteristic.
    pub fn has_battery_level(&self) -> bool {
        self.device.with_session(|s| s.has_battery_level())
    }
}

impl std::fmt::Debug for CyclingSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CyclingSensor")
            .field("identifier", &self.identifier)
            .field("connection_state", &self.connection_state())
            .finish()
    }
}
