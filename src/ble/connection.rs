//! BLE link management.
//!
//! Brings the link to a health profile peripheral up and down. Service
//! discovery and everything after it belongs to the session driver.

use btleplug::api::Peripheral as _;
use btleplug::platform::Peripheral;
use parking_lot::RwLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::session::SessionCallbacks;

/// Link state of a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConnectionState {
    /// No link.
    #[default]
    Disconnected,
    /// Link being established.
    Connecting,
    /// Link up.
    Connected,
    /// Link being torn down.
    Disconnecting,
}

impl ConnectionState {
    /// Check if the link is up.
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }

    /// Check if the link is changing state.
    pub fn is_transitioning(&self) -> bool {
        matches!(self, Self::Connecting | Self::Disconnecting)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::Disconnecting => "Disconnecting",
        };
        f.write_str(name)
    }
}

/// Owns the link to one peripheral.
///
/// Registered as session callbacks by the profile front-ends so that a link
/// dropped by the peripheral is reflected in [`ConnectionManager::state`].
pub struct ConnectionManager {
    peripheral: Peripheral,
    state: RwLock<ConnectionState>,
    max_attempts: u32,
    retry_delay: Duration,
}

impl ConnectionManager {
    /// Create a connection manager with default retry settings.
    pub fn new(peripheral: Peripheral) -> Self {
        Self::with_config(peripheral, &SessionConfig::default())
    }

    /// Create a connection manager using the reconnect settings of `config`.
    pub fn with_config(peripheral: Peripheral, config: &SessionConfig) -> Self {
        Self {
            peripheral,
            state: RwLock::new(ConnectionState::Disconnected),
            max_attempts: config.max_reconnect_attempts.max(1),
            retry_delay: config.reconnect_delay,
        }
    }

    /// Current link state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Check if the link is up.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Bring the link up.
    ///
    /// With `maintain` set, failed attempts are retried up to the configured
    /// maximum with the configured delay in between; otherwise one attempt
    /// is made.
    pub async fn connect(&self, maintain: bool) -> Result<()> {
        match self.state() {
            ConnectionState::Connected => {
                debug!("Already connected");
                return Ok(());
            }
            state if state.is_transitioning() => {
                return Err(Error::ConnectionFailed {
                    reason: format!("Link is {}", state),
                });
            }
            _ => {}
        }

        self.set_state(ConnectionState::Connecting);

        if self.peripheral.is_connected().await.unwrap_or(false) {
            info!("Peripheral already connected at BLE level");
            self.set_state(ConnectionState::Connected);
            return Ok(());
        }

        let attempts = if maintain { self.max_attempts } else { 1 };
        for attempt in 1..=attempts {
            debug!("Connection attempt {} of {}", attempt, attempts);

            match self.peripheral.connect().await {
                Ok(()) => {
                    info!("Connected to peripheral {:?}", self.peripheral.id());
                    self.set_state(ConnectionState::Connected);
                    return Ok(());
                }
                Err(e) => {
                    warn!("Connection attempt {} failed: {}", attempt, e);
                    if attempt < attempts {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                }
            }
        }

        self.set_state(ConnectionState::Disconnected);
        Err(Error::ConnectionFailed {
            reason: format!("Failed after {} attempts", attempts),
        })
    }

    /// Tear the link down.
    pub async fn disconnect(&self) -> Result<()> {
        if matches!(
            self.state(),
            ConnectionState::Disconnected | ConnectionState::Disconnecting
        ) {
            return Ok(());
        }

        self.set_state(ConnectionState::Disconnecting);
        let result = self.peripheral.disconnect().await;
        self.set_state(ConnectionState::Disconnected);

        match result {
            Ok(()) => {
                info!("Disconnected from peripheral {:?}", self.peripheral.id());
                Ok(())
            }
            Err(e) => {
                error!("Failed to disconnect: {}", e);
                Err(Error::Bluetooth(e))
            }
        }
    }

    /// Record that the link dropped without a local disconnect.
    ///
    /// Has no effect unless the state is [`ConnectionState::Connected`].
    pub fn mark_disconnected(&self) {
        if self.is_connected() {
            warn!("Link to {:?} lost", self.peripheral.id());
            self.set_state(ConnectionState::Disconnected);
        }
    }

    fn set_state(&self, new_state: ConnectionState) {
        let old_state = std::mem::replace(&mut *self.state.write(), new_state);
        if old_state != new_state {
            debug!("Connection state changed: {} -> {}", old_state, new_state);
        }
    }
}

impl SessionCallbacks for ConnectionManager {
    fn on_device_disconnected(&self) {
        self.mark_disconnected();
    }
}
