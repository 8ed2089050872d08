//! Blood Pressure Measurement and Intermediate Cuff Pressure parsing.
//!
//! Both characteristics share one layout:
//! - Byte 0: Flags (bit 0: unit, bit 1: timestamp present, bit 2: pulse rate present)
//! - Bytes 1-6: Three SFLOATs (systolic, diastolic, MAP; ICP only uses the first)
//! - Bytes 7-13: Date Time (if timestamp present)
//! - Next 2 bytes: Pulse rate SFLOAT (if pulse rate present)
//!
//! Flag bits above bit 2 are ignored.

use bytes::{BufMut, BytesMut};
use tracing::trace;

use crate::data::{MeasurementRecord, PressureUnit, Timestamp};
use crate::error::Result;
use crate::protocol::reader::FieldReader;
use crate::protocol::sfloat;

const FLAG_UNIT_KPA: u8 = 0x01;
const FLAG_TIMESTAMP_PRESENT: u8 = 0x02;
const FLAG_PULSE_RATE_PRESENT: u8 = 0x04;

/// Decoded pressure-family frame, before it is interpreted as BPM or ICP.
#[derive(Debug, Clone, PartialEq)]
pub struct PressureFrame {
    /// Unit of the compound value.
    pub unit: PressureUnit,
    /// The three SFLOAT fields in wire order.
    pub values: [f32; 3],
    /// Date Time field, if the timestamp flag is set.
    pub timestamp: Option<Timestamp>,
    /// Pulse rate, if the pulse rate flag is set.
    pub pulse_rate: Option<f32>,
}

impl PressureFrame {
    /// Size of a frame with no optional fields.
    pub const MIN_SIZE: usize = 7;

    /// Parse a frame. `frame` names the characteristic in error messages.
    pub fn parse(data: &[u8], frame: &'static str) -> Result<Self> {
        trace!("{} frame: {:02X?}", frame, data);

        let mut reader = FieldReader::new(data, frame);
        let flags = reader.read_u8("flags")?;

        let unit = PressureUnit::from_raw(flags & FLAG_UNIT_KPA);
        let values = [
            reader.read_sfloat("compound value 1")?,
            reader.read_sfloat("compound value 2")?,
            reader.read_sfloat("compound value 3")?,
        ];

        let timestamp = if flags & FLAG_TIMESTAMP_PRESENT != 0 {
            Some(Timestamp {
                year: reader.read_u16("year")?,
                month: reader.read_u8("month")?,
                day: reader.read_u8("day")?,
                hour: reader.read_u8("hour")?,
                minute: reader.read_u8("minute")?,
                second: reader.read_u8("second")?,
            })
        } else {
            None
        };

        let pulse_rate = if flags & FLAG_PULSE_RATE_PRESENT != 0 {
            Some(reader.read_sfloat("pulse rate")?)
        } else {
            None
        };

        Ok(Self {
            unit,
            values,
            timestamp,
            pulse_rate,
        })
    }

    /// Serialize the frame, setting flags from the optional fields.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut flags = self.unit.to_raw();
        if self.timestamp.is_some() {
            flags |= FLAG_TIMESTAMP_PRESENT;
        }
        if self.pulse_rate.is_some() {
            flags |= FLAG_PULSE_RATE_PRESENT;
        }

        let mut buf = BytesMut::with_capacity(Self::MIN_SIZE + Timestamp::SIZE + 2);
        buf.put_u8(flags);
        for value in self.values {
            buf.put_u16_le(sfloat::encode(value));
        }
        if let Some(ts) = &self.timestamp {
            buf.put_u16_le(ts.year);
            buf.put_slice(&[ts.month, ts.day, ts.hour, ts.minute, ts.second]);
        }
        if let Some(pulse_rate) = self.pulse_rate {
            buf.put_u16_le(sfloat::encode(pulse_rate));
        }
        buf.to_vec()
    }
}

/// Blood Pressure Measurement characteristic value.
#[derive(Debug, Clone, PartialEq)]
pub struct BloodPressureMeasurement {
    /// Systolic pressure.
    pub systolic: f32,
    /// Diastolic pressure.
    pub diastolic: f32,
    /// Mean arterial pressure.
    pub mean_arterial_pressure: f32,
    /// Pressure unit.
    pub unit: PressureUnit,
    /// Measurement time, if present.
    pub timestamp: Option<Timestamp>,
    /// Pulse rate, if present.
    pub pulse_rate: Option<f32>,
}

impl BloodPressureMeasurement {
    /// Parse a Blood Pressure Measurement indication.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let frame = PressureFrame::parse(data, "Blood Pressure Measurement")?;
        let [systolic, diastolic, mean_arterial_pressure] = frame.values;
        Ok(Self {
            systolic,
            diastolic,
            mean_arterial_pressure,
            unit: frame.unit,
            timestamp: frame.timestamp,
            pulse_rate: frame.pulse_rate,
        })
    }

    /// Convert into a record for the store.
    pub fn to_record(&self) -> MeasurementRecord {
        MeasurementRecord {
            systolic: self.systolic,
            diastolic: self.diastolic,
            mean_arterial_pressure: self.mean_arterial_pressure,
            pulse_rate: self.pulse_rate,
            timestamp: self.timestamp,
            unit: self.unit,
        }
    }
}

/// Intermediate Cuff Pressure characteristic value.
#[derive(Debug, Clone, PartialEq)]
pub struct IntermediateCuffPressure {
    /// Current cuff pressure.
    pub cuff_pressure: f32,
    /// Pressure unit.
    pub unit: PressureUnit,
    /// Measurement time, if present.
    pub timestamp: Option<Timestamp>,
    /// Pulse rate, if present.
    pub pulse_rate: Option<f32>,
}

impl IntermediateCuffPressure {
    /// Parse an Intermediate Cuff Pressure notification.
    ///
    /// The diastolic and MAP slots are present on the wire but unused.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let frame = PressureFrame::parse(data, "Intermediate Cuff Pressure")?;
        Ok(Self {
            cuff_pressure: frame.values[0],
            unit: frame.unit,
            timestamp: frame.timestamp,
            pulse_rate: frame.pulse_rate,
        })
    }
}
