//! Current Time characteristic encoding.
//!
//! The frame written on connect is 10 bytes:
//! - Bytes 0-1: Year (see [`encode_year`])
//! - Byte 2: Month (1-12)
//! - Byte 3: Day
//! - Byte 4: Hour
//! - Byte 5: Minute
//! - Bytes 6-9: Seconds, day of week, fractions and adjust reason, all zero

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{Error, Result};

/// Derive the two year bytes the way deployed firmware expects them.
///
/// The year is rendered as lowercase hex with a `'0'` prepended; the low byte
/// is parsed from everything after the first two characters and the high byte
/// from the first two. For years 256 through 4095 this equals the
/// little-endian `u16`, but other years produce different bytes and those
/// must be reproduced exactly (e.g. 255 encodes as `[0x0F, 0x0F]`).
///
/// Years below 16 leave no characters for the low byte and are rejected.
///
/// # Example
///
/// ```
/// use health_profiles_ble::protocol::current_time::encode_year;
///
/// assert_eq!(encode_year(2024).unwrap(), [0xE8, 0x07]);
/// ```
pub fn encode_year(year: u16) -> Result<[u8; 2]> {
    let text = format!("0{:x}", year);
    if text.len() < 3 {
        return Err(Error::InvalidParameter {
            name: "year".to_string(),
            value: year.to_string(),
        });
    }

    let parse = |digits: &str| {
        u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidParameter {
            name: "year".to_string(),
            value: year.to_string(),
        })
    };

    let low = parse(&text[2..])? as u8;
    let high = parse(&text[..2])? as u8;
    Ok([low, high])
}

/// Validate and narrow a calendar year for [`encode_year`].
pub(crate) fn checked_year(year: i32) -> Result<u16> {
    u16::try_from(year).map_err(|_| Error::InvalidParameter {
        name: "year".to_string(),
        value: year.to_string(),
    })
}

/// Value written to the Current Time characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentTime {
    /// Year.
    pub year: u16,
    /// Month (1-12).
    pub month: u8,
    /// Day of the month.
    pub day: u8,
    /// Hour (0-23).
    pub hour: u8,
    /// Minute (0-59).
    pub minute: u8,
}

impl CurrentTime {
    /// Size of the encoded frame.
    pub const SIZE: usize = 10;

    /// Build from a local calendar value. Seconds are not transmitted.
    pub fn from_datetime(datetime: &NaiveDateTime) -> Result<Self> {
        Ok(Self {
            year: checked_year(datetime.year())?,
            month: datetime.month() as u8,
            day: datetime.day() as u8,
            hour: datetime.hour() as u8,
            minute: datetime.minute() as u8,
        })
    }

    /// Encode the 10-byte frame.
    pub fn to_bytes(&self) -> Result<[u8; Self::SIZE]> {
        let [year_low, year_high] = encode_year(self.year)?;
        Ok([
            year_low, year_high, self.month, self.day, self.hour, self.minute, 0, 0, 0, 0,
        ])
    }
}
