//! Cycling Speed and Cadence Measurement and Battery Level parsing.
//!
//! CSC Measurement format:
//! - Byte 0: Flags (bit 0: wheel data present, bit 1: crank data present)
//! - Wheel block: cumulative wheel revolutions (u32), last wheel event time (u16)
//! - Crank block: cumulative crank revolutions (u16), last crank event time (u16)
//!
//! Event times are in units of 1/1024 s and roll over.

use tracing::trace;

use crate::error::Result;
use crate::protocol::reader::FieldReader;

const FLAG_WHEEL_PRESENT: u8 = 0x01;
const FLAG_CRANK_PRESENT: u8 = 0x02;

/// One decoded block of a CSC Measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CscBlock {
    /// Wheel revolution data.
    Wheel {
        /// Cumulative wheel revolutions.
        revolutions: u32,
        /// Last wheel event time (1/1024 s).
        event_time: u16,
    },
    /// Crank revolution data.
    Crank {
        /// Cumulative crank revolutions.
        revolutions: u16,
        /// Last crank event time (1/1024 s).
        event_time: u16,
    },
}

/// A decoded CSC Measurement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CscSample {
    /// Cumulative wheel revolutions, if present.
    pub wheel_revolutions: Option<u32>,
    /// Last wheel event time, if present.
    pub last_wheel_event_time: Option<u16>,
    /// Cumulative crank revolutions, if present.
    pub crank_revolutions: Option<u16>,
    /// Last crank event time, if present.
    pub last_crank_event_time: Option<u16>,
}

impl CscSample {
    /// Decode a measurement, handing each block to `on_block` as soon as it
    /// has been read.
    ///
    /// A frame whose crank block is truncated still delivers a complete wheel
    /// block before the error is returned.
    ///
    /// # Arguments
    ///
    /// * `data` - Raw characteristic value
    /// * `on_block` - Called once per decoded block, wheel first
    pub fn decode_with<F>(data: &[u8], mut on_block: F) -> Result<Self>
    where
        F: FnMut(CscBlock),
    {
        trace!("CSC Measurement frame: {:02X?}", data);

        let mut reader = FieldReader::new(data, "CSC Measurement");
        let flags = reader.read_u8("flags")?;
        let mut sample = Self::default();

        if flags & FLAG_WHEEL_PRESENT != 0 {
            let revolutions = reader.read_u32("wheel revolutions")?;
            let event_time = reader.read_u16("last wheel event time")?;
            sample.wheel_revolutions = Some(revolutions);
            sample.last_wheel_event_time = Some(event_time);
            on_block(CscBlock::Wheel {
                revolutions,
                event_time,
            });
        }

        if flags & FLAG_CRANK_PRESENT != 0 {
            let revolutions = reader.read_u16("crank revolutions")?;
            let event_time = reader.read_u16("last crank event time")?;
            sample.crank_revolutions = Some(revolutions);
            sample.last_crank_event_time = Some(event_time);
            on_block(CscBlock::Crank {
                revolutions,
                event_time,
            });
        }

        Ok(sample)
    }

    /// Decode a measurement.
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::decode_with(data, |_| {})
    }

    /// Check if wheel data is present.
    pub fn has_wheel_data(&self) -> bool {
        self.wheel_revolutions.is_some()
    }

    /// Check if crank data is present.
    pub fn has_crank_data(&self) -> bool {
        self.crank_revolutions.is_some()
    }
}

/// Parse a Battery Level value (percent). Trailing bytes are ignored.
pub fn parse_battery_level(data: &[u8]) -> Result<u8> {
    FieldReader::new(data, "Battery Level").read_u8("level")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_wheel_and_crank() {
        let data = [
            0x03, 0x10, 0x27, 0x00, 0x00, 0x00, 0x04, 0x2A, 0x00, 0x00, 0x08,
        ];
        let mut blocks = Vec::new();
        let sample = CscSample::decode_with(&data, |b| blocks.push(b)).unwrap();

        assert_eq!(sample.wheel_revolutions, Some(10_000));
        assert_eq!(sample.last_wheel_event_time, Some(1024));
        assert_eq!(sample.crank_revolutions, Some(42));
        assert_eq!(sample.last_crank_event_time, Some(2048));
        assert_eq!(
            blocks,
            vec![
                CscBlock::Wheel {
                    revolutions: 10_000,
                    event_time: 1024
                },
                CscBlock::Crank {
                    revolutions: 42,
                    event_time: 2048
                },
            ]
        );
    }

    #[test]
    fn test_crank_only_never_reports_wheel() {
        let data = [0x02, 0x05, 0x00, 0x00, 0x04];
        let mut blocks = Vec::new();
        let sample = CscSample::decode_with(&data, |b| blocks.push(b)).unwrap();

        assert!(!sample.has_wheel_data());
        assert_eq!(sample.last_wheel_event_time, None);
        assert_eq!(
            blocks,
            vec![CscBlock::Crank {
                revolutions: 5,
                event_time: 1024
            }]
        );
    }

    #[test]
    fn test_no_data() {
        let sample = CscSample::parse(&[0x00]).unwrap();
        assert!(!sample.has_wheel_data());
        assert!(!sample.has_crank_data());
    }

    #[test]
    fn test_truncated_crank_after_wheel() {
        let data = [0x03, 0x01, 0x00, 0x00, 0x00, 0x10, 0x00, 0x02];
        let mut blocks = Vec::new();
        let err = CscSample::decode_with(&data, |b| blocks.push(b)).unwrap_err();

        assert!(matches!(err, Error::MalformedFrame { .. }));
        assert_eq!(
            blocks,
            vec![CscBlock::Wheel {
                revolutions: 1,
                event_time: 16
            }]
        );
    }

    #[test]
    fn test_truncated_wheel() {
        let mut calls = 0;
        assert!(CscSample::decode_with(&[0x01, 0x01, 0x00], |_| calls += 1).is_err());
        assert_eq!(calls, 0);
        assert!(CscSample::parse(&[]).is_err());
    }

    #[test]
    fn test_battery_level() {
        assert_eq!(parse_battery_level(&[87]).unwrap(), 87);
        assert!(parse_battery_level(&[]).is_err());
    }
}
