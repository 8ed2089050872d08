//! Data structures for decoded measurements.
//!
//! This module contains the blood pressure record types and the in-memory
//! store that collects them during a retrieval session.

pub mod record;
pub mod store;

pub use record::{MeasurementRecord, PressureUnit, Timestamp, PULSE_RATE_ABSENT};
pub use store::RecordStore;
