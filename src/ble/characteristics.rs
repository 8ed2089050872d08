//! GATT characteristic handling.
//!
//! Provides the btleplug-backed [`GattTransport`] used by the profile
//! front-ends.

use async_trait::async_trait;
use btleplug::api::{Characteristic, Peripheral as _, WriteType};
use btleplug::platform::Peripheral;
use futures::stream::{BoxStream, StreamExt};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};
use uuid::Uuid;

use crate::ble::transport::{GattTransport, NotificationEvent, ServiceSet};
use crate::error::{Error, Result};

/// Handler for GATT characteristics on a connected peripheral.
pub struct CharacteristicHandler {
    /// The peripheral to communicate with.
    peripheral: Peripheral,
    /// Cached characteristics by UUID.
    characteristics: Arc<RwLock<HashMap<Uuid, Characteristic>>>,
}

impl CharacteristicHandler {
    /// Create a new characteristic handler for a peripheral.
    ///
    /// Nothing is cached until [`GattTransport::discover_services`] runs.
    pub fn new(peripheral: Peripheral) -> Self {
        Self {
            peripheral,
            characteristics: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Rebuild the characteristic cache from the peripheral's service table.
    fn cache_characteristics(&self) -> ServiceSet {
        let services = self.peripheral.services();

        let mut chars = self.characteristics.write();
        chars.clear();

        for service in &services {
            for characteristic in &service.characteristics {
                debug!(
                    "Found characteristic: {} in service {}",
                    characteristic.uuid, service.uuid
                );
                chars.insert(characteristic.uuid, characteristic.clone());
            }
        }

        debug!("Discovered {} characteristics", chars.len());

        ServiceSet::from_services(&services)
    }

    /// Get a characteristic by UUID.
    pub fn get_characteristic(&self, uuid: &Uuid) -> Option<Characteristic> {
        self.characteristics.read().get(uuid).cloned()
    }

    fn require(&self, uuid: &Uuid) -> Result<Characteristic> {
        self.get_characteristic(uuid)
            .ok_or_else(|| Error::CharacteristicNotFound {
                uuid: uuid.to_string(),
            })
    }

    /// Write the CCCD through btleplug.
    ///
    /// btleplug picks notification or indication from the characteristic
    /// properties, so both enable calls end up here.
    async fn subscribe(&self, uuid: &Uuid) -> Result<()> {
        let characteristic = self.require(uuid)?;

        debug!(
            "Subscribing to {}, properties: {:?}",
            uuid, characteristic.properties
        );

        self.peripheral
            .subscribe(&characteristic)
            .await
            .map_err(|e| {
                debug!("Failed to subscribe to {}: {:?}", uuid, e);
                Error::Bluetooth(e)
            })?;

        debug!("Subscribed to {}", uuid);

        Ok(())
    }
}

#[async_trait]
impl GattTransport for CharacteristicHandler {
    async fn discover_services(&self) -> Result<ServiceSet> {
        self.peripheral
            .discover_services()
            .await
            .map_err(Error::Bluetooth)?;

        Ok(self.cache_characteristics())
    }

    async fn write_characteristic(&self, uuid: &Uuid, data: &[u8]) -> Result<()> {
        let characteristic = self.require(uuid)?;

        self.peripheral
            .write(&characteristic, data, WriteType::WithResponse)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Wrote {} bytes to characteristic {}", data.len(), uuid);

        Ok(())
    }

    async fn read_characteristic(&self, uuid: &Uuid) -> Result<Vec<u8>> {
        let characteristic = self.require(uuid)?;

        let data = self
            .peripheral
            .read(&characteristic)
            .await
            .map_err(Error::Bluetooth)?;

        trace!("Read {} bytes from characteristic {}", data.len(), uuid);

        Ok(data)
    }

    async fn enable_notifications(&self, uuid: &Uuid) -> Result<()> {
        self.subscribe(uuid).await
    }

    async fn enable_indications(&self, uuid: &Uuid) -> Result<()> {
        self.subscribe(uuid).await
    }

    async fn notifications(&self) -> Result<BoxStream<'static, NotificationEvent>> {
        let stream = self
            .peripheral
            .notifications()
            .await
            .map_err(Error::Bluetooth)?;

        Ok(stream
            .map(|notification| {
                trace!(
                    "Notification received from {}: {:02X?}",
                    notification.uuid,
                    notification.value
                );
                NotificationEvent {
                    characteristic_uuid: notification.uuid,
                    data: notification.value,
                }
            })
            .boxed())
    }

    async fn disconnect(&self) -> Result<()> {
        self.peripheral.disconnect().await.map_err(Error::Bluetooth)
    }
}
