//! Error types for the health-profiles-ble crate.

use thiserror::Error;

/// The main error type for this crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Bluetooth-related error from the underlying BLE library.
    #[error("Bluetooth error: {0}")]
    Bluetooth(#[from] btleplug::Error),

    /// A characteristic value was shorter than its flags require, or carried
    /// a value the decoder cannot interpret.
    #[error("Malformed frame: {context}")]
    MalformedFrame {
        /// Description of what was wrong with the frame.
        context: String,
    },

    /// The device answered a RACP request with "Op Code Not Supported".
    #[error("Operation not supported by device: op code {op_code:#04x}")]
    UnsupportedOperation {
        /// The op code the device rejected.
        op_code: u8,
    },

    /// The device answered a RACP request with a failure response code.
    #[error("Operation {op_code:#04x} failed with response code {response_code:#04x}")]
    OperationFailed {
        /// The op code of the failed request.
        op_code: u8,
        /// The raw response code reported by the device.
        response_code: u8,
    },

    /// A mandatory service or characteristic is missing on the device.
    #[error("Required service unavailable: {uuid}")]
    ServiceUnavailable {
        /// UUID of the missing characteristic.
        uuid: String,
    },

    /// The GATT layer reported a failure.
    #[error("Transport error: {reason} (status {code})")]
    Transport {
        /// Description of the failure.
        reason: String,
        /// GATT status code, if the transport supplied one.
        code: i32,
    },

    /// Operation requires a connection but the device is not connected.
    #[error("Device not connected")]
    NotConnected,

    /// Failed to establish a connection to the device.
    #[error("Connection failed: {reason}")]
    ConnectionFailed {
        /// Description of why the connection failed.
        reason: String,
    },

    /// Characteristic not found on the device.
    #[error("Characteristic not found: {uuid}")]
    CharacteristicNotFound {
        /// The UUID of the characteristic that was not found.
        uuid: String,
    },

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {name} = {value}")]
    InvalidParameter {
        /// The name of the parameter.
        name: String,
        /// The invalid value that was provided.
        value: String,
    },

    /// The device did not answer a pending request in time.
    #[error("Timed out waiting for the device")]
    Timeout,
}

impl Error {
    /// Build a [`Error::MalformedFrame`] from anything printable.
    pub(crate) fn malformed(context: impl Into<String>) -> Self {
        Self::MalformedFrame {
            context: context.into(),
        }
    }

    /// Status code reported alongside this error on the callback interface.
    ///
    /// Only transport errors carry a GATT status; everything else maps to `0`.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Transport { code, .. } => *code,
            _ => 0,
        }
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
