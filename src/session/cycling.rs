//! Cycling Speed and Cadence profile session.

use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::ble::transport::{DiscoveredCharacteristic, ServiceSet};
use crate::ble::uuids::*;
use crate::protocol::csc::{parse_battery_level, CscBlock, CscSample};
use crate::session::events::SessionEvent;
use crate::session::queue::{GattCommand, RequestQueue};
use crate::session::{GattProfile, TransportEvent};

/// Session state for one connected speed and cadence sensor.
///
/// The sensor only streams measurements, so there is no retrieval dialogue
/// and no watchdog.
#[derive(Debug, Default)]
pub struct CyclingSpeedCadenceSession {
    measurement: Option<Uuid>,
    battery_level: Option<Uuid>,
    requests: RequestQueue,
    last_sample: Option<CscSample>,
}

impl CyclingSpeedCadenceSession {
    /// Create a session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether discovery found the CSC Measurement characteristic.
    pub fn is_supported(&self) -> bool {
        self.measurement.is_some()
    }

    /// Whether the device exposes a Battery Level characteristic.
    pub fn has_battery_level(&self) -> bool {
        self.battery_level.is_some()
    }

    /// The most recent complete measurement.
    pub fn last_sample(&self) -> Option<CscSample> {
        self.last_sample
    }

    fn on_services_discovered(&mut self, services: &ServiceSet) -> Vec<SessionEvent> {
        self.requests.clear();
        self.last_sample = None;

        let measurement = services
            .characteristic(&CYCLING_SPEED_CADENCE_SERVICE_UUID, &CSC_MEASUREMENT_UUID)
            .map(|c| c.uuid);
        let battery = services
            .characteristic(&BATTERY_SERVICE_UUID, &BATTERY_LEVEL_UUID)
            .copied();

        let measurement = match measurement {
            Some(uuid) => uuid,
            None => {
                warn!("CSC Measurement characteristic not found");
                self.measurement = None;
                self.battery_level = None;
                return vec![SessionEvent::ServiceUnavailable {
                    uuid: CSC_MEASUREMENT_UUID,
                }];
            }
        };

        info!(
            "Cycling speed and cadence service found (battery: {})",
            battery.is_some()
        );
        self.measurement = Some(measurement);
        self.battery_level = battery.map(|c| c.uuid);

        self.requests.begin_initialization();
        if let Some(battery) = battery {
            self.queue_battery(&battery);
        }
        self.requests.push(GattCommand::EnableNotifications(measurement));

        vec![SessionEvent::ServicesDiscovered {
            optional_services_found: false,
        }]
    }

    /// Read the level if the characteristic allows it, else subscribe to it.
    fn queue_battery(&mut self, battery: &DiscoveredCharacteristic) {
        if battery.is_readable() {
            self.requests.push(GattCommand::Read(battery.uuid));
        } else if battery.is_notifiable() {
            self.requests.push(GattCommand::EnableNotifications(battery.uuid));
        } else {
            debug!("Battery Level is neither readable nor notifiable");
        }
    }

    fn on_battery_value(&self, value: &[u8]) -> Vec<SessionEvent> {
        match parse_battery_level(value) {
            Ok(level) => {
                debug!("Battery level: {}%", level);
                vec![SessionEvent::BatteryLevel(level)]
            }
            Err(e) => {
                warn!("Dropping Battery Level: {}", e);
                vec![SessionEvent::from_error(&e)]
            }
        }
    }

    fn on_measurement(&mut self, value: &[u8]) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        let result = CscSample::decode_with(value, |block| {
            events.push(match block {
                CscBlock::Wheel {
                    revolutions,
                    event_time,
                } => SessionEvent::WheelMeasurement {
                    revolutions,
                    event_time,
                },
                CscBlock::Crank {
                    revolutions,
                    event_time,
                } => SessionEvent::CrankMeasurement {
                    revolutions,
                    event_time,
                },
            })
        });

        match result {
            Ok(sample) => self.last_sample = Some(sample),
            Err(e) => {
                warn!("Dropping CSC Measurement: {}", e);
                events.push(SessionEvent::from_error(&e));
            }
        }

        events
    }
}

impl GattProfile for CyclingSpeedCadenceSession {
    fn handle_event(&mut self, event: TransportEvent) -> Vec<SessionEvent> {
        if event.completes_request() {
            self.requests.complete();
        }

        let mut events = match event {
            TransportEvent::Connected => {
                info!("Cycling sensor connected");
                vec![SessionEvent::Connected]
            }
            TransportEvent::Disconnected => {
                info!("Cycling sensor disconnected");
                *self = Self::new();
                vec![SessionEvent::Disconnected]
            }
            TransportEvent::ServicesDiscovered(services) => {
                self.on_services_discovered(&services)
            }
            TransportEvent::CharacteristicChanged { uuid, value } => {
                if Some(uuid) == self.measurement {
                    self.on_measurement(&value)
                } else if Some(uuid) == self.battery_level {
                    self.on_battery_value(&value)
                } else {
                    trace!("Ignoring value from {}", uuid);
                    Vec::new()
                }
            }
            TransportEvent::CharacteristicRead { uuid, value } => {
                if Some(uuid) == self.battery_level {
                    self.on_battery_value(&value)
                } else {
                    Vec::new()
                }
            }
            TransportEvent::WriteComplete(uuid) => {
                debug!("Request on {} complete", uuid);
                Vec::new()
            }
            TransportEvent::Error { reason, code } => {
                warn!("GATT error: {} ({})", reason, code);
                vec![SessionEvent::Error { reason, code }]
            }
        };

        if self.requests.take_ready() {
            info!("Cycling sensor ready");
            events.push(SessionEvent::DeviceReady);
        }

        events
    }

    fn requests(&mut self) -> &mut RequestQueue {
        &mut self.requests
    }
}
