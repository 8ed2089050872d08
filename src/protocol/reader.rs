//! Bounds-checked little-endian field reader.
//!
//! Every characteristic codec in this crate walks its payload through a
//! [`FieldReader`]. Reads past the end of the buffer fail with
//! [`Error::MalformedFrame`] instead of panicking, so a short frame only fails
//! its own decode.

use bytes::Buf;

use crate::error::{Error, Result};
use crate::protocol::sfloat;

/// Cursor over a characteristic value.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    buf: &'a [u8],
    offset: usize,
    frame: &'static str,
}

impl<'a> FieldReader<'a> {
    /// Create a reader over `data`. `frame` names the frame in error messages.
    pub fn new(data: &'a [u8], frame: &'static str) -> Self {
        Self {
            buf: data,
            offset: 0,
            frame,
        }
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Offset of the next byte relative to the start of the frame.
    pub fn offset(&self) -> usize {
        self.offset
    }

    fn ensure(&self, needed: usize, field: &str) -> Result<()> {
        if self.buf.remaining() < needed {
            return Err(Error::malformed(format!(
                "{}: {} needs {} bytes at offset {}, {} left",
                self.frame,
                field,
                needed,
                self.offset,
                self.buf.remaining()
            )));
        }
        Ok(())
    }

    /// Read an unsigned byte.
    pub fn read_u8(&mut self, field: &str) -> Result<u8> {
        self.ensure(1, field)?;
        self.offset += 1;
        Ok(self.buf.get_u8())
    }

    /// Read a little-endian `u16`.
    pub fn read_u16(&mut self, field: &str) -> Result<u16> {
        self.ensure(2, field)?;
        self.offset += 2;
        Ok(self.buf.get_u16_le())
    }

    /// Read a little-endian `u32`.
    pub fn read_u32(&mut self, field: &str) -> Result<u32> {
        self.ensure(4, field)?;
        self.offset += 4;
        Ok(self.buf.get_u32_le())
    }

    /// Read an IEEE-11073 16-bit SFLOAT.
    pub fn read_sfloat(&mut self, field: &str) -> Result<f32> {
        self.read_u16(field).map(sfloat::decode)
    }

    /// Skip `count` bytes that are present on the wire but unused.
    pub fn skip(&mut self, count: usize, field: &str) -> Result<()> {
        self.ensure(count, field)?;
        self.offset += count;
        self.buf.advance(count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_little_endian() {
        let data = [0x01, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12];
        let mut reader = FieldReader::new(&data, "test");

        assert_eq!(reader.read_u8("a").unwrap(), 0x01);
        assert_eq!(reader.read_u16("b").unwrap(), 0x1234);
        assert_eq!(reader.read_u32("c").unwrap(), 0x1234_5678);
        assert_eq!(reader.remaining(), 0);
        assert_eq!(reader.offset(), 7);
    }

    #[test]
    fn test_short_read_is_malformed() {
        let data = [0x01];
        let mut reader = FieldReader::new(&data, "test");

        let err = reader.read_u16("count").unwrap_err();
        assert!(matches!(err, Error::MalformedFrame { .. }));
        assert!(err.to_string().contains("count"));
        // A failed read does not consume anything.
        assert_eq!(reader.remaining(), 1);
    }

    #[test]
    fn test_skip() {
        let data = [0xAA, 0xBB, 0xCC];
        let mut reader = FieldReader::new(&data, "test");
        reader.skip(2, "unused").unwrap();
        assert_eq!(reader.read_u8("last").unwrap(), 0xCC);
        assert!(reader.skip(1, "past end").is_err());
    }
}
