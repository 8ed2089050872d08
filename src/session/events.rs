//! Session events and the callback interface they are delivered through.

use uuid::Uuid;

use crate::data::{PressureUnit, Timestamp};

/// Everything a session reports to the embedding application.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The link is up.
    Connected,
    /// The link is down and the session was reset.
    Disconnected,
    /// Mandatory characteristics were found.
    ServicesDiscovered {
        /// Whether optional characteristics (e.g. ICP) are present.
        optional_services_found: bool,
    },
    /// The initialization sequence finished.
    DeviceReady,
    /// A mandatory characteristic is missing; the session will not proceed.
    ServiceUnavailable {
        /// The missing characteristic.
        uuid: Uuid,
    },
    /// Battery level in percent.
    BatteryLevel(u8),
    /// A decode or transport failure. The session keeps running.
    Error {
        /// Description of the failure.
        reason: String,
        /// GATT status, or `0` when none applies.
        code: i32,
    },
    /// A Blood Pressure Measurement was received.
    BloodPressureMeasurement {
        /// Systolic pressure.
        systolic: f32,
        /// Diastolic pressure.
        diastolic: f32,
        /// Mean arterial pressure.
        mean_arterial_pressure: f32,
        /// Unit of all three values.
        unit: PressureUnit,
    },
    /// An Intermediate Cuff Pressure value was received.
    IntermediateCuffPressure {
        /// Current cuff pressure.
        cuff_pressure: f32,
        /// Unit of the value.
        unit: PressureUnit,
    },
    /// Pulse rate of the last pressure frame.
    PulseRate(Option<f32>),
    /// Timestamp of the last pressure frame.
    Timestamp(Option<Timestamp>),
    /// The record store changed.
    DatasetChanged,
    /// A RACP operation was written.
    OperationStarted,
    /// The running RACP operation finished.
    OperationCompleted,
    /// The running RACP operation was aborted.
    OperationAborted,
    /// The running RACP operation failed.
    OperationFailed,
    /// The device does not support the requested RACP op code.
    OperationNotSupported,
    /// The device reported how many records it holds.
    NumberOfRecordsRequested(u16),
    /// Wheel block of a CSC Measurement.
    WheelMeasurement {
        /// Cumulative wheel revolutions.
        revolutions: u32,
        /// Last wheel event time (1/1024 s).
        event_time: u16,
    },
    /// Crank block of a CSC Measurement.
    CrankMeasurement {
        /// Cumulative crank revolutions.
        revolutions: u16,
        /// Last crank event time (1/1024 s).
        event_time: u16,
    },
}

impl SessionEvent {
    /// Build an [`SessionEvent::Error`] from a crate error.
    pub fn from_error(error: &crate::error::Error) -> Self {
        Self::Error {
            reason: error.to_string(),
            code: error.status_code(),
        }
    }

    /// Invoke the matching callback.
    pub fn dispatch(&self, callbacks: &dyn SessionCallbacks) {
        match self {
            Self::Connected => callbacks.on_device_connected(),
            Self::Disconnected => callbacks.on_device_disconnected(),
            Self::ServicesDiscovered {
                optional_services_found,
            } => callbacks.on_services_discovered(*optional_services_found),
            Self::DeviceReady => callbacks.on_device_ready(),
            Self::ServiceUnavailable { uuid } => callbacks.on_device_not_supported(*uuid),
            Self::BatteryLevel(level) => callbacks.on_battery_level(*level),
            Self::Error { reason, code } => callbacks.on_error(reason, *code),
            Self::BloodPressureMeasurement {
                systolic,
                diastolic,
                mean_arterial_pressure,
                unit,
            } => callbacks.on_blood_pressure_measurement(
                *systolic,
                *diastolic,
                *mean_arterial_pressure,
                *unit,
            ),
            Self::IntermediateCuffPressure {
                cuff_pressure,
                unit,
            } => callbacks.on_intermediate_cuff_pressure(*cuff_pressure, *unit),
            Self::PulseRate(pulse_rate) => callbacks.on_pulse_rate(*pulse_rate),
            Self::Timestamp(timestamp) => callbacks.on_timestamp(*timestamp),
            Self::DatasetChanged => callbacks.on_dataset_changed(),
            Self::OperationStarted => callbacks.on_operation_started(),
            Self::OperationCompleted => callbacks.on_operation_completed(),
            Self::OperationAborted => callbacks.on_operation_aborted(),
            Self::OperationFailed => callbacks.on_operation_failed(),
            Self::OperationNotSupported => callbacks.on_operation_not_supported(),
            Self::NumberOfRecordsRequested(count) => {
                callbacks.on_number_of_records_requested(*count)
            }
            Self::WheelMeasurement {
                revolutions,
                event_time,
            } => callbacks.on_wheel_measurement(*revolutions, *event_time),
            Self::CrankMeasurement {
                revolutions,
                event_time,
            } => callbacks.on_crank_measurement(*revolutions, *event_time),
        }
    }
}

/// Callback interface for session events.
///
/// Every method has an empty default body; implement the ones you need.
/// Callbacks are invoked one at a time, in event order.
#[cfg_attr(test, mockall::automock)]
pub trait SessionCallbacks: Send + Sync {
    /// The link is up.
    fn on_device_connected(&self) {}

    /// The link is down.
    fn on_device_disconnected(&self) {}

    /// Mandatory characteristics were found.
    fn on_services_discovered(&self, _optional_services_found: bool) {}

    /// The initialization sequence finished.
    fn on_device_ready(&self) {}

    /// A mandatory characteristic is missing.
    fn on_device_not_supported(&self, _uuid: Uuid) {}

    /// Battery level in percent.
    fn on_battery_level(&self, _level: u8) {}

    /// A decode or transport failure.
    fn on_error(&self, _reason: &str, _code: i32) {}

    /// A Blood Pressure Measurement was received.
    fn on_blood_pressure_measurement(
        &self,
        _systolic: f32,
        _diastolic: f32,
        _mean_arterial_pressure: f32,
        _unit: PressureUnit,
    ) {
    }

    /// An Intermediate Cuff Pressure value was received.
    fn on_intermediate_cuff_pressure(&self, _cuff_pressure: f32, _unit: PressureUnit) {}

    /// Pulse rate, `None` when the frame carried none.
    fn on_pulse_rate(&self, _pulse_rate: Option<f32>) {}

    /// Timestamp, `None` when the frame carried none.
    fn on_timestamp(&self, _timestamp: Option<Timestamp>) {}

    /// The record store changed.
    fn on_dataset_changed(&self) {}

    /// A RACP operation was written.
    fn on_operation_started(&self) {}

    /// The running RACP operation finished.
    fn on_operation_completed(&self) {}

    /// The running RACP operation was aborted.
    fn on_operation_aborted(&self) {}

    /// The running RACP operation failed.
    fn on_operation_failed(&self) {}

    /// The device does not support the requested op code.
    fn on_operation_not_supported(&self) {}

    /// The device reported its record count.
    fn on_number_of_records_requested(&self, _count: u16) {}

    /// Wheel block of a CSC Measurement.
    fn on_wheel_measurement(&self, _revolutions: u32, _event_time: u16) {}

    /// Crank block of a CSC Measurement.
    fn on_crank_measurement(&self, _revolutions: u16, _event_time: u16) {}
}
