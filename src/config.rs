//! Session configuration.

use std::time::Duration;

/// Tunables shared by the profile front-ends and the session driver.
///
/// # Example
///
/// ```
/// use health_profiles_ble::SessionConfig;
/// use std::time::Duration;
///
/// let config = SessionConfig::default()
///     .with_racp_timeout(Duration::from_secs(10))
///     .with_maintain_connection(true);
/// assert_eq!(config.max_reconnect_attempts, 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// How long a RACP operation may go without any inbound event before it
    /// is failed locally.
    pub racp_timeout: Duration,
    /// Retry the initial connect up to `max_reconnect_attempts` times.
    pub maintain_connection: bool,
    /// Connection attempts when `maintain_connection` is set.
    pub max_reconnect_attempts: u32,
    /// Delay between connection attempts.
    pub reconnect_delay: Duration,
    /// Capacity of the session event channel.
    pub event_capacity: usize,
}

impl SessionConfig {
    /// Default RACP watchdog timeout (30 seconds).
    pub const DEFAULT_RACP_TIMEOUT: Duration = Duration::from_secs(30);

    /// Set the RACP watchdog timeout.
    pub fn with_racp_timeout(mut self, timeout: Duration) -> Self {
        self.racp_timeout = timeout;
        self
    }

    /// Set whether connection attempts are retried.
    pub fn with_maintain_connection(mut self, maintain: bool) -> Self {
        self.maintain_connection = maintain;
        self
    }

    /// Set the reconnection parameters.
    pub fn with_reconnect_params(mut self, max_attempts: u32, delay: Duration) -> Self {
        self.max_reconnect_attempts = max_attempts;
        self.reconnect_delay = delay;
        self
    }

    /// Set the event channel capacity. Zero is raised to one.
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            racp_timeout: Self::DEFAULT_RACP_TIMEOUT,
            maintain_connection: false,
            max_reconnect_attempts: 3,
            reconnect_delay: Duration::from_secs(1),
            event_capacity: 64,
        }
    }
}
