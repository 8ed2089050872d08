//! Blood pressure measurement records.

use chrono::{NaiveDate, NaiveDateTime};

use crate::utils::{kpa_to_mmhg, mmhg_to_kpa};

/// Pulse rate reported to legacy consumers when the frame carries none.
pub const PULSE_RATE_ABSENT: f32 = -1.0;

/// Pressure unit selected by bit 0 of the measurement flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum PressureUnit {
    /// Millimetres of mercury.
    #[default]
    MmHg = 0,
    /// Kilopascal.
    KPa = 1,
}

impl PressureUnit {
    /// Create from the unit flag bit.
    pub fn from_raw(value: u8) -> Self {
        match value & 0x01 {
            0 => Self::MmHg,
            _ => Self::KPa,
        }
    }

    /// Convert to the unit flag bit.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }

    /// Convert a value in this unit to mmHg.
    pub fn to_mmhg(&self, value: f32) -> f32 {
        match self {
            Self::MmHg => value,
            Self::KPa => kpa_to_mmhg(value),
        }
    }

    /// Convert a value in this unit to kPa.
    pub fn to_kpa(&self, value: f32) -> f32 {
        match self {
            Self::MmHg => mmhg_to_kpa(value),
            Self::KPa => value,
        }
    }
}

impl std::fmt::Display for PressureUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MmHg => write!(f, "mmHg"),
            Self::KPa => write!(f, "kPa"),
        }
    }
}

/// Date Time as carried in the measurement frame.
///
/// Fields are kept exactly as received. A year of 0 or a month of 0 means
/// "unknown" on the wire, so conversion to a calendar value is fallible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timestamp {
    /// Year (1582-9999, 0 if unknown).
    pub year: u16,
    /// Month of the year (1-12, 0 if unknown).
    pub month: u8,
    /// Day of the month (1-31, 0 if unknown).
    pub day: u8,
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
    /// Second (0-59).
    pub second: u8,
}

impl Timestamp {
    /// Wire size of the Date Time field.
    pub const SIZE: usize = 7;

    /// Create a timestamp from its fields.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Convert to a calendar value, or `None` if any field is out of range.
    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        NaiveDate::from_ymd_opt(self.year as i32, self.month as u32, self.day as u32)?.and_hms_opt(
            self.hour as u32,
            self.minute as u32,
            self.second as u32,
        )
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// A decoded Blood Pressure Measurement.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MeasurementRecord {
    /// Systolic pressure.
    pub systolic: f32,
    /// Diastolic pressure.
    pub diastolic: f32,
    /// Mean arterial pressure.
    pub mean_arterial_pressure: f32,
    /// Pulse rate in beats per minute, if reported.
    pub pulse_rate: Option<f32>,
    /// Time of the measurement, if reported.
    pub timestamp: Option<Timestamp>,
    /// Unit of the three pressure values.
    pub unit: PressureUnit,
}

impl MeasurementRecord {
    /// Pulse rate with [`PULSE_RATE_ABSENT`] standing in for a missing value.
    pub fn pulse_rate_or_sentinel(&self) -> f32 {
        self.pulse_rate.unwrap_or(PULSE_RATE_ABSENT)
    }

    /// Systolic and diastolic pressure converted to mmHg.
    pub fn to_mmhg(&self) -> (f32, f32) {
        (
            self.unit.to_mmhg(self.systolic),
            self.unit.to_mmhg(self.diastolic),
        )
    }
}
