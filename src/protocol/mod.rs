//! Protocol module for parsing and constructing characteristic values.
//!
//! This module contains the implementations for:
//! - Blood Pressure Measurement and Intermediate Cuff Pressure decoding
//! - Record Access Control Point requests and responses
//! - Current Time encoding
//! - Cycling Speed and Cadence Measurement decoding
//! - IEEE-11073 SFLOAT conversion

pub mod csc;
pub mod current_time;
pub mod pressure;
pub mod racp;
pub mod reader;
pub mod sfloat;

pub use csc::{parse_battery_level, CscBlock, CscSample};
pub use current_time::{encode_year, CurrentTime};
pub use pressure::{BloodPressureMeasurement, IntermediateCuffPressure, PressureFrame};
pub use racp::{
    FilterType, OpCode, Operator, RacpCommand, RacpFilter, RacpResponse, ResponseCode,
    UserFacingTime,
};
pub use reader::FieldReader;
