//! BLE Service and Characteristic UUIDs.
//!
//! Bluetooth SIG assigned numbers used by the Blood Pressure, Current Time,
//! Cycling Speed & Cadence and Battery profiles, expanded to the 128-bit base
//! UUID form.

use uuid::Uuid;

// Blood Pressure Service
/// Blood Pressure Service UUID (`0x1810`).
pub const BLOOD_PRESSURE_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_1810_0000_1000_8000_00805f9b34fb);
/// Blood Pressure Measurement characteristic UUID (`0x2A35`, Indicate).
pub const BLOOD_PRESSURE_MEASUREMENT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a35_0000_1000_8000_00805f9b34fb);
/// Intermediate Cuff Pressure characteristic UUID (`0x2A36`, Notify).
pub const INTERMEDIATE_CUFF_PRESSURE_UUID: Uuid =
    Uuid::from_u128(0x0000_2a36_0000_1000_8000_00805f9b34fb);
/// Record Access Control Point characteristic UUID (`0x2A52`, Write, Indicate).
pub const RECORD_ACCESS_CONTROL_POINT_UUID: Uuid =
    Uuid::from_u128(0x0000_2a52_0000_1000_8000_00805f9b34fb);

// Current Time Service
/// Current Time Service UUID (`0x1805`).
pub const CURRENT_TIME_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_1805_0000_1000_8000_00805f9b34fb);
/// Current Time characteristic UUID (`0x2A2B`).
pub const CURRENT_TIME_UUID: Uuid = Uuid::from_u128(0x0000_2a2b_0000_1000_8000_00805f9b34fb);

// Cycling Speed and Cadence Service
/// Cycling Speed and Cadence Service UUID (`0x1816`).
pub const CYCLING_SPEED_CADENCE_SERVICE_UUID: Uuid =
    Uuid::from_u128(0x0000_1816_0000_1000_8000_00805f9b34fb);
/// CSC Measurement characteristic UUID (`0x2A5B`, Notify).
pub const CSC_MEASUREMENT_UUID: Uuid = Uuid::from_u128(0x0000_2a5b_0000_1000_8000_00805f9b34fb);

// Battery Service
/// Battery Service UUID (`0x180F`).
pub const BATTERY_SERVICE_UUID: Uuid = Uuid::from_u128(0x0000_180f_0000_1000_8000_00805f9b34fb);
/// Battery Level characteristic UUID (`0x2A19`).
pub const BATTERY_LEVEL_UUID: Uuid = Uuid::from_u128(0x0000_2a19_0000_1000_8000_00805f9b34fb);

/// Client Characteristic Configuration descriptor UUID (`0x2902`).
pub const CLIENT_CHARACTERISTIC_CONFIG_UUID: Uuid =
    Uuid::from_u128(0x0000_2902_0000_1000_8000_00805f9b34fb);

/// Expand a 16-bit SIG assigned number into its 128-bit UUID.
pub const fn sig_uuid(short: u16) -> Uuid {
    Uuid::from_u128(((short as u128) << 96) | 0x0000_0000_0000_1000_8000_00805f9b34fb)
}

/// Check if a service UUID belongs to one of the supported profiles.
pub fn is_supported_service(uuid: &Uuid) -> bool {
    *uuid == BLOOD_PRESSURE_SERVICE_UUID || *uuid == CYCLING_SPEED_CADENCE_SERVICE_UUID
}
