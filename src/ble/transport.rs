//! GATT transport boundary.
//!
//! Sessions never talk to a Bluetooth stack directly. The driver in
//! [`crate::device`] executes their requests against a [`GattTransport`] and
//! feeds the results back. [`crate::ble::CharacteristicHandler`] implements it
//! over btleplug; tests implement it with in-memory fakes.

use std::collections::HashMap;

use async_trait::async_trait;
use btleplug::api::{CharPropFlags, Service};
use futures::stream::BoxStream;
use uuid::Uuid;

use crate::error::Result;

/// Notification or indication received from a characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationEvent {
    /// UUID of the characteristic that sent the value.
    pub characteristic_uuid: Uuid,
    /// The value.
    pub data: Vec<u8>,
}

/// A characteristic found during service discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveredCharacteristic {
    /// Characteristic UUID.
    pub uuid: Uuid,
    /// Declared properties.
    pub properties: CharPropFlags,
}

impl DiscoveredCharacteristic {
    /// Check if the characteristic can be read.
    pub fn is_readable(&self) -> bool {
        self.properties.contains(CharPropFlags::READ)
    }

    /// Check if the characteristic supports notifications.
    pub fn is_notifiable(&self) -> bool {
        self.properties.contains(CharPropFlags::NOTIFY)
    }

    /// Check if the characteristic supports indications.
    pub fn is_indicatable(&self) -> bool {
        self.properties.contains(CharPropFlags::INDICATE)
    }
}

/// Services and characteristics reported by discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceSet {
    services: HashMap<Uuid, Vec<DiscoveredCharacteristic>>,
}

impl ServiceSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from btleplug's discovered services.
    pub fn from_services<'a>(services: impl IntoIterator<Item = &'a Service>) -> Self {
        let mut set = Self::new();
        for service in services {
            set.services.entry(service.uuid).or_default();
            for characteristic in &service.characteristics {
                set.insert(service.uuid, characteristic.uuid, characteristic.properties);
            }
        }
        set
    }

    /// Add a characteristic to a service.
    pub fn insert(&mut self, service: Uuid, characteristic: Uuid, properties: CharPropFlags) {
        self.services
            .entry(service)
            .or_default()
            .push(DiscoveredCharacteristic {
                uuid: characteristic,
                properties,
            });
    }

    /// Builder form of [`ServiceSet::insert`].
    pub fn with_characteristic(
        mut self,
        service: Uuid,
        characteristic: Uuid,
        properties: CharPropFlags,
    ) -> Self {
        self.insert(service, characteristic, properties);
        self
    }

    /// Check if a service was discovered.
    pub fn has_service(&self, service: &Uuid) -> bool {
        self.services.contains_key(service)
    }

    /// Look up a characteristic inside a specific service.
    pub fn characteristic(
        &self,
        service: &Uuid,
        characteristic: &Uuid,
    ) -> Option<&DiscoveredCharacteristic> {
        self.services
            .get(service)?
            .iter()
            .find(|c| c.uuid == *characteristic)
    }

    /// Number of discovered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if nothing was discovered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Operations a session needs from a connected GATT client.
///
/// Every call completes one GATT procedure. The driver never issues a second
/// call before the previous one has returned.
#[async_trait]
pub trait GattTransport: Send + Sync {
    /// Discover services and characteristics.
    async fn discover_services(&self) -> Result<ServiceSet>;

    /// Write a value with response.
    async fn write_characteristic(&self, uuid: &Uuid, data: &[u8]) -> Result<()>;

    /// Read a value.
    async fn read_characteristic(&self, uuid: &Uuid) -> Result<Vec<u8>>;

    /// Enable notifications through the CCCD.
    async fn enable_notifications(&self, uuid: &Uuid) -> Result<()>;

    /// Enable indications through the CCCD.
    async fn enable_indications(&self, uuid: &Uuid) -> Result<()>;

    /// Stream of inbound notifications and indications.
    ///
    /// The stream ends when the link is lost.
    async fn notifications(&self) -> Result<BoxStream<'static, NotificationEvent>>;

    /// Tear down the link.
    async fn disconnect(&self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::uuids::*;
    use btleplug::api::Characteristic;
    use std::collections::BTreeSet;

    fn characteristic(service: Uuid, uuid: Uuid, properties: CharPropFlags) -> Characteristic {
        Characteristic {
            uuid,
            service_uuid: service,
            properties,
            descriptors: BTreeSet::new(),
        }
    }

    #[test]
    fn test_from_services_maps_btleplug_table() {
        let services = vec![
            Service {
                uuid: CYCLING_SPEED_CADENCE_SERVICE_UUID,
                primary: true,
                characteristics: [characteristic(
                    CYCLING_SPEED_CADENCE_SERVICE_UUID,
                    CSC_MEASUREMENT_UUID,
                    CharPropFlags::NOTIFY,
                )]
                .into_iter()
                .collect(),
            },
            Service {
                uuid: BATTERY_SERVICE_UUID,
                primary: true,
                characteristics: [characteristic(
                    BATTERY_SERVICE_UUID,
                    BATTERY_LEVEL_UUID,
                    CharPropFlags::READ | CharPropFlags::NOTIFY,
                )]
                .into_iter()
                .collect(),
            },
            Service {
                uuid: CURRENT_TIME_SERVICE_UUID,
                primary: true,
                characteristics: BTreeSet::new(),
            },
        ];

        let set = ServiceSet::from_services(&services);

        assert_eq!(set.len(), 3);
        assert!(set.has_service(&CURRENT_TIME_SERVICE_UUID));
        let csc = set
            .characteristic(&CYCLING_SPEED_CADENCE_SERVICE_UUID, &CSC_MEASUREMENT_UUID)
            .unwrap();
        assert!(csc.is_notifiable());
        assert!(!csc.is_readable());
        let battery = set
            .characteristic(&BATTERY_SERVICE_UUID, &BATTERY_LEVEL_UUID)
            .unwrap();
        assert!(battery.is_readable());
        assert!(battery.is_notifiable());
        assert!(set
            .characteristic(&BATTERY_SERVICE_UUID, &CSC_MEASUREMENT_UUID)
            .is_none());
    }

    #[test]
    fn test_service_set_lookup_is_scoped_to_service() {
        let set = ServiceSet::new()
            .with_characteristic(
                BLOOD_PRESSURE_SERVICE_UUID,
                BLOOD_PRESSURE_MEASUREMENT_UUID,
                CharPropFlags::INDICATE,
            )
            .with_characteristic(
                BATTERY_SERVICE_UUID,
                BATTERY_LEVEL_UUID,
                CharPropFlags::READ | CharPropFlags::NOTIFY,
            );

        assert_eq!(set.len(), 2);
        assert!(set
            .characteristic(&BLOOD_PRESSURE_SERVICE_UUID, &BLOOD_PRESSURE_MEASUREMENT_UUID)
            .is_some());
        assert!(set
            .characteristic(&BATTERY_SERVICE_UUID, &BLOOD_PRESSURE_MEASUREMENT_UUID)
            .is_none());
        assert!(!set.has_service(&CURRENT_TIME_SERVICE_UUID));
    }

    #[test]
    fn test_characteristic_properties() {
        let set = ServiceSet::new().with_characteristic(
            BATTERY_SERVICE_UUID,
            BATTERY_LEVEL_UUID,
            CharPropFlags::NOTIFY,
        );
        let battery = set
            .characteristic(&BATTERY_SERVICE_UUID, &BATTERY_LEVEL_UUID)
            .unwrap();

        assert!(!battery.is_readable());
        assert!(battery.is_notifiable());
        assert!(!battery.is_indicatable());
    }
}
