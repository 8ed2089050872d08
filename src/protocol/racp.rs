//! Record Access Control Point frames.
//!
//! Request format (written by the client):
//! - Byte 0: Op Code
//! - Byte 1: Operator (always present, may be `Null`)
//! - Byte 2: Filter Type (only when operands follow)
//! - Remaining: Operands, minimum first
//!
//! Response format (indicated by the server):
//! - Byte 0: Op Code (`NumberOfRecordsResponse` or `ResponseCode`)
//! - Byte 1: Operator (`Null`, not interpreted)
//! - Bytes 2-3: Record count (u16), or requested op code + response code
//!
//! Sequence number operands are `u16` little-endian. User facing time operands
//! are written one byte per field, so a single time operand takes seven bytes.
//! The two layouts differ on purpose and must be kept as they are.

use bytes::{BufMut, BytesMut};
use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::error::{Error, Result};
use crate::protocol::current_time::{checked_year, encode_year};
use crate::protocol::reader::FieldReader;

/// RACP op codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum OpCode {
    /// Report stored records (0x01).
    ReportStoredRecords = 0x01,
    /// Delete stored records (0x02).
    DeleteStoredRecords = 0x02,
    /// Abort the running operation (0x03).
    Abort = 0x03,
    /// Report number of stored records (0x04).
    ReportNumberOfRecords = 0x04,
    /// Number of stored records response (0x05).
    NumberOfRecordsResponse = 0x05,
    /// Response code (0x06).
    ResponseCode = 0x06,
}

impl OpCode {
    /// Create from raw byte value.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::ReportStoredRecords),
            0x02 => Some(Self::DeleteStoredRecords),
            0x03 => Some(Self::Abort),
            0x04 => Some(Self::ReportNumberOfRecords),
            0x05 => Some(Self::NumberOfRecordsResponse),
            0x06 => Some(Self::ResponseCode),
            _ => None,
        }
    }

    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }
}

/// RACP operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Operator {
    /// No operator (0x00).
    Null = 0x00,
    /// All records (0x01).
    AllRecords = 0x01,
    /// Less than or equal to (0x02).
    LessOrEqual = 0x02,
    /// Greater than or equal to (0x03).
    GreaterOrEqual = 0x03,
    /// Within range of, inclusive (0x04).
    WithinRange = 0x04,
    /// First (oldest) record (0x05).
    First = 0x05,
    /// Last (most recent) record (0x06).
    Last = 0x06,
}

impl Operator {
    /// Create from raw byte value.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(Self::Null),
            0x01 => Some(Self::AllRecords),
            0x02 => Some(Self::LessOrEqual),
            0x03 => Some(Self::GreaterOrEqual),
            0x04 => Some(Self::WithinRange),
            0x05 => Some(Self::First),
            0x06 => Some(Self::Last),
            _ => None,
        }
    }

    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }

    /// `GreaterOrEqual` or `LessOrEqual` depending on `greater_or_equal`.
    pub fn comparison(greater_or_equal: bool) -> Self {
        if greater_or_equal {
            Self::GreaterOrEqual
        } else {
            Self::LessOrEqual
        }
    }
}

/// RACP filter types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterType {
    /// Filter by record sequence number (0x01).
    SequenceNumber = 0x01,
    /// Filter by user facing time (0x02).
    UserFacingTime = 0x02,
}

impl FilterType {
    /// Create from raw byte value.
    pub fn from_raw(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Self::SequenceNumber),
            0x02 => Some(Self::UserFacingTime),
            _ => None,
        }
    }

    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        *self as u8
    }
}

/// A user facing time operand.
///
/// Encoded as `[year low, year high, month, day, hour, minute, 0]`, with the
/// year bytes produced by [`encode_year`]. That encoding maps some years onto
/// the same bytes (256 and 4096 both give `[0x00, 0x01]`), so two operands are
/// equal when their wire bytes are.
#[derive(Debug, Clone, Copy)]
pub struct UserFacingTime {
    year: u16,
    year_bytes: [u8; 2],
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
}

impl UserFacingTime {
    /// Wire size of one operand.
    pub const SIZE: usize = 7;

    /// Create an operand. Fails for years that cannot be encoded.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8) -> Result<Self> {
        Ok(Self {
            year,
            year_bytes: encode_year(year)?,
            month,
            day,
            hour,
            minute,
        })
    }

    /// Create an operand from a calendar value. Seconds are dropped.
    pub fn from_datetime(datetime: &NaiveDateTime) -> Result<Self> {
        Self::new(
            checked_year(datetime.year())?,
            datetime.month() as u8,
            datetime.day() as u8,
            datetime.hour() as u8,
            datetime.minute() as u8,
        )
    }

    /// Year as given to [`UserFacingTime::new`]. For a parsed operand this
    /// is the year bytes read as a little-endian `u16`, which matches the
    /// original year for 256 through 4095.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// The two year bytes as sent on the wire.
    pub fn year_bytes(&self) -> [u8; 2] {
        self.year_bytes
    }

    /// Month (1-12).
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Day of the month.
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Hour.
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Minute.
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Encode the seven operand bytes.
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        [
            self.year_bytes[0],
            self.year_bytes[1],
            self.month,
            self.day,
            self.hour,
            self.minute,
            0,
        ]
    }

    fn read(reader: &mut FieldReader<'_>) -> Result<Self> {
        let low = reader.read_u8("year low")?;
        let high = reader.read_u8("year high")?;
        let time = Self {
            year: u16::from_le_bytes([low, high]),
            year_bytes: [low, high],
            month: reader.read_u8("month")?,
            day: reader.read_u8("day")?,
            hour: reader.read_u8("hour")?,
            minute: reader.read_u8("minute")?,
        };
        reader.skip(1, "second")?;
        Ok(time)
    }
}

impl PartialEq for UserFacingTime {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for UserFacingTime {}

/// Filter and operands of a RACP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RacpFilter {
    /// Sequence number operands.
    SequenceNumber(Vec<u16>),
    /// User facing time operands.
    UserFacingTime(Vec<UserFacingTime>),
}

impl RacpFilter {
    /// Maximum number of operands (minimum and maximum of a range).
    pub const MAX_OPERANDS: usize = 2;

    /// The filter type byte.
    pub fn filter_type(&self) -> FilterType {
        match self {
            Self::SequenceNumber(_) => FilterType::SequenceNumber,
            Self::UserFacingTime(_) => FilterType::UserFacingTime,
        }
    }

    /// Number of operands.
    pub fn operand_count(&self) -> usize {
        match self {
            Self::SequenceNumber(operands) => operands.len(),
            Self::UserFacingTime(operands) => operands.len(),
        }
    }

    fn encoded_len(&self) -> usize {
        match self {
            Self::SequenceNumber(operands) => operands.len() * 2,
            Self::UserFacingTime(operands) => operands.len() * UserFacingTime::SIZE,
        }
    }
}

/// A RACP request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RacpCommand {
    /// Op code.
    pub op_code: OpCode,
    /// Operator.
    pub operator: Operator,
    /// Optional filter. `None` writes no filter type byte.
    pub filter: Option<RacpFilter>,
}

impl RacpCommand {
    /// Create a command without operands.
    pub fn new(op_code: OpCode, operator: Operator) -> Self {
        Self {
            op_code,
            operator,
            filter: None,
        }
    }

    /// Create a command with a filter of one or two operands.
    ///
    /// Operands are written in the given order; callers pass the minimum first.
    pub fn with_filter(op_code: OpCode, operator: Operator, filter: RacpFilter) -> Result<Self> {
        let count = filter.operand_count();
        if count == 0 || count > RacpFilter::MAX_OPERANDS {
            return Err(Error::InvalidParameter {
                name: "operands".to_string(),
                value: count.to_string(),
            });
        }
        Ok(Self {
            op_code,
            operator,
            filter: Some(filter),
        })
    }

    /// Report all stored records.
    pub fn report_all() -> Self {
        Self::new(OpCode::ReportStoredRecords, Operator::AllRecords)
    }

    /// Report the oldest stored record.
    pub fn report_first() -> Self {
        Self::new(OpCode::ReportStoredRecords, Operator::First)
    }

    /// Report the most recent stored record.
    pub fn report_last() -> Self {
        Self::new(OpCode::ReportStoredRecords, Operator::Last)
    }

    /// Report the number of stored records.
    pub fn report_number_of_records() -> Self {
        Self::new(OpCode::ReportNumberOfRecords, Operator::AllRecords)
    }

    /// Delete all stored records.
    pub fn delete_all() -> Self {
        Self::new(OpCode::DeleteStoredRecords, Operator::AllRecords)
    }

    /// Abort the running operation.
    pub fn abort() -> Self {
        Self::new(OpCode::Abort, Operator::Null)
    }

    /// Report records with a sequence number `>=` or `<=` the given one.
    pub fn report_by_sequence(sequence_number: u16, greater_or_equal: bool) -> Self {
        Self {
            op_code: OpCode::ReportStoredRecords,
            operator: Operator::comparison(greater_or_equal),
            filter: Some(RacpFilter::SequenceNumber(vec![sequence_number])),
        }
    }

    /// Report records whose sequence number lies in `min..=max`.
    pub fn report_in_range(min: u16, max: u16) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidParameter {
                name: "range".to_string(),
                value: format!("{}..={}", min, max),
            });
        }
        Self::with_filter(
            OpCode::ReportStoredRecords,
            Operator::WithinRange,
            RacpFilter::SequenceNumber(vec![min, max]),
        )
    }

    /// Report records with a user facing time `>=` or `<=` the given one.
    pub fn report_by_time(time: UserFacingTime, greater_or_equal: bool) -> Self {
        Self {
            op_code: OpCode::ReportStoredRecords,
            operator: Operator::comparison(greater_or_equal),
            filter: Some(RacpFilter::UserFacingTime(vec![time])),
        }
    }

    /// Serialize the request.
    pub fn to_bytes(&self) -> Vec<u8> {
        let operands_len = self
            .filter
            .as_ref()
            .map(|f| 1 + f.encoded_len())
            .unwrap_or(0);

        let mut buf = BytesMut::with_capacity(2 + operands_len);
        buf.put_u8(self.op_code.to_raw());
        buf.put_u8(self.operator.to_raw());

        match &self.filter {
            Some(RacpFilter::SequenceNumber(operands)) if !operands.is_empty() => {
                buf.put_u8(FilterType::SequenceNumber.to_raw());
                for operand in operands {
                    buf.put_u16_le(*operand);
                }
            }
            Some(RacpFilter::UserFacingTime(operands)) if !operands.is_empty() => {
                buf.put_u8(FilterType::UserFacingTime.to_raw());
                for operand in operands {
                    buf.put_slice(&operand.to_bytes());
                }
            }
            _ => {}
        }

        buf.to_vec()
    }

    /// Parse a request frame.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = FieldReader::new(data, "RACP request");

        let raw_op = reader.read_u8("op code")?;
        let op_code = OpCode::from_raw(raw_op)
            .ok_or_else(|| Error::malformed(format!("unknown RACP op code {:#04x}", raw_op)))?;

        let raw_operator = reader.read_u8("operator")?;
        let operator = Operator::from_raw(raw_operator).ok_or_else(|| {
            Error::malformed(format!("unknown RACP operator {:#04x}", raw_operator))
        })?;

        if reader.remaining() == 0 {
            return Ok(Self::new(op_code, operator));
        }

        let raw_filter = reader.read_u8("filter type")?;
        let filter = match FilterType::from_raw(raw_filter) {
            Some(FilterType::SequenceNumber) => {
                let mut operands = Vec::new();
                while reader.remaining() > 0 {
                    operands.push(reader.read_u16("sequence number")?);
                }
                RacpFilter::SequenceNumber(operands)
            }
            Some(FilterType::UserFacingTime) => {
                let mut operands = Vec::new();
                while reader.remaining() > 0 {
                    operands.push(UserFacingTime::read(&mut reader)?);
                }
                RacpFilter::UserFacingTime(operands)
            }
            None => {
                return Err(Error::malformed(format!(
                    "unknown RACP filter type {:#04x}",
                    raw_filter
                )))
            }
        };

        Self::with_filter(op_code, operator, filter).map_err(|_| {
            Error::malformed(format!("RACP request carries {} bytes of operands", data.len() - 3))
        })
    }
}

/// RACP response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    /// Success (0x01).
    Success,
    /// Op code not supported (0x02).
    OpCodeNotSupported,
    /// Invalid operator (0x03).
    InvalidOperator,
    /// Operator not supported (0x04).
    OperatorNotSupported,
    /// Invalid operand (0x05).
    InvalidOperand,
    /// No records found (0x06).
    NoRecordsFound,
    /// Abort unsuccessful (0x07).
    AbortUnsuccessful,
    /// Procedure not completed (0x08).
    ProcedureNotCompleted,
    /// Operand not supported (0x09).
    OperandNotSupported,
    /// Any value outside 0x01-0x09. Always treated as a failure.
    Reserved(u8),
}

impl ResponseCode {
    /// Create from raw byte value.
    pub fn from_raw(value: u8) -> Self {
        match value {
            0x01 => Self::Success,
            0x02 => Self::OpCodeNotSupported,
            0x03 => Self::InvalidOperator,
            0x04 => Self::OperatorNotSupported,
            0x05 => Self::InvalidOperand,
            0x06 => Self::NoRecordsFound,
            0x07 => Self::AbortUnsuccessful,
            0x08 => Self::ProcedureNotCompleted,
            0x09 => Self::OperandNotSupported,
            other => Self::Reserved(other),
        }
    }

    /// Convert to raw byte value.
    pub fn to_raw(&self) -> u8 {
        match self {
            Self::Success => 0x01,
            Self::OpCodeNotSupported => 0x02,
            Self::InvalidOperator => 0x03,
            Self::OperatorNotSupported => 0x04,
            Self::InvalidOperand => 0x05,
            Self::NoRecordsFound => 0x06,
            Self::AbortUnsuccessful => 0x07,
            Self::ProcedureNotCompleted => 0x08,
            Self::OperandNotSupported => 0x09,
            Self::Reserved(value) => *value,
        }
    }

    /// Map the response for `op_code` onto the crate error taxonomy.
    ///
    /// `Success` and `NoRecordsFound` are not errors.
    pub fn to_result(&self, op_code: u8) -> Result<()> {
        match self {
            Self::Success | Self::NoRecordsFound => Ok(()),
            Self::OpCodeNotSupported => Err(Error::UnsupportedOperation { op_code }),
            other => Err(Error::OperationFailed {
                op_code,
                response_code: other.to_raw(),
            }),
        }
    }
}

/// A RACP indication from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RacpResponse {
    /// Answer to `ReportNumberOfRecords`.
    NumberOfRecords(u16),
    /// Final result of a request.
    OperationResult {
        /// Raw op code of the request being answered.
        requested_op_code: u8,
        /// Result of the request.
        response_code: ResponseCode,
    },
}

impl RacpResponse {
    /// Parse a response indication.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = FieldReader::new(data, "RACP response");

        let raw_op = reader.read_u8("op code")?;
        reader.skip(1, "operator")?;

        match OpCode::from_raw(raw_op) {
            Some(OpCode::NumberOfRecordsResponse) => {
                Ok(Self::NumberOfRecords(reader.read_u16("number of records")?))
            }
            Some(OpCode::ResponseCode) => Ok(Self::OperationResult {
                requested_op_code: reader.read_u8("request op code")?,
                response_code: ResponseCode::from_raw(reader.read_u8("response code")?),
            }),
            _ => Err(Error::malformed(format!(
                "unexpected RACP response op code {:#04x}",
                raw_op
            ))),
        }
    }

    /// Serialize the response.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Self::NumberOfRecords(count) => {
                let [low, high] = count.to_le_bytes();
                vec![
                    OpCode::NumberOfRecordsResponse.to_raw(),
                    Operator::Null.to_raw(),
                    low,
                    high,
                ]
            }
            Self::OperationResult {
                requested_op_code,
                response_code,
            } => vec![
                OpCode::ResponseCode.to_raw(),
                Operator::Null.to_raw(),
                *requested_op_code,
                response_code.to_raw(),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_simple_commands() {
        assert_eq!(RacpCommand::report_all().to_bytes(), vec![0x01, 0x01]);
        assert_eq!(RacpCommand::report_first().to_bytes(), vec![0x01, 0x05]);
        assert_eq!(RacpCommand::report_last().to_bytes(), vec![0x01, 0x06]);
        assert_eq!(RacpCommand::delete_all().to_bytes(), vec![0x02, 0x01]);
        assert_eq!(
            RacpCommand::report_number_of_records().to_bytes(),
            vec![0x04, 0x01]
        );
        // The operator byte is written even when it is Null.
        assert_eq!(RacpCommand::abort().to_bytes(), vec![0x03, 0x00]);
    }

    #[test]
    fn test_sequence_range_encoding() {
        let command = RacpCommand::report_in_range(10, 20).unwrap();
        assert_eq!(
            command.to_bytes(),
            vec![0x01, 0x04, 0x01, 0x0A, 0x00, 0x14, 0x00]
        );
    }

    #[test]
    fn test_sequence_filter_keeps_caller_order() {
        let command = RacpCommand::with_filter(
            OpCode::ReportStoredRecords,
            Operator::WithinRange,
            RacpFilter::SequenceNumber(vec![20, 10]),
        )
        .unwrap();
        assert_eq!(
            command.to_bytes(),
            vec![0x01, 0x04, 0x01, 0x14, 0x00, 0x0A, 0x00]
        );
        assert!(RacpCommand::report_in_range(20, 10).is_err());
    }

    #[test]
    fn test_report_by_sequence() {
        assert_eq!(
            RacpCommand::report_by_sequence(0x0102, true).to_bytes(),
            vec![0x01, 0x03, 0x01, 0x02, 0x01]
        );
        assert_eq!(
            RacpCommand::report_by_sequence(5, false).to_bytes(),
            vec![0x01, 0x02, 0x01, 0x05, 0x00]
        );
    }

    #[test]
    fn test_user_facing_time_uses_single_byte_fields() {
        let datetime = NaiveDate::from_ymd_opt(2024, 3, 15)
            .unwrap()
            .and_hms_opt(10, 30, 59)
            .unwrap();
        let time = UserFacingTime::from_datetime(&datetime).unwrap();
        let command = RacpCommand::report_by_time(time, true);

        assert_eq!(
            command.to_bytes(),
            vec![0x01, 0x03, 0x02, 0xE8, 0x07, 0x03, 0x0F, 0x0A, 0x1E, 0x00]
        );
    }

    #[test]
    fn test_operand_count_is_validated() {
        let err = RacpCommand::with_filter(
            OpCode::ReportStoredRecords,
            Operator::WithinRange,
            RacpFilter::SequenceNumber(vec![1, 2, 3]),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { .. }));

        assert!(RacpCommand::with_filter(
            OpCode::ReportStoredRecords,
            Operator::GreaterOrEqual,
            RacpFilter::SequenceNumber(vec![]),
        )
        .is_err());
    }

    #[test]
    fn test_parse_time_filter_command() {
        let time = UserFacingTime::new(2024, 3, 15, 10, 30).unwrap();
        let command = RacpCommand::report_by_time(time, false);
        let parsed = RacpCommand::parse(&command.to_bytes()).unwrap();

        assert_eq!(parsed, command);
        match parsed.filter {
            Some(RacpFilter::UserFacingTime(operands)) => {
                assert_eq!(operands[0].year(), 2024);
                assert_eq!(operands[0].minute(), 30);
            }
            other => panic!("unexpected filter: {:?}", other),
        }
    }

    #[test]
    fn test_parse_time_filter_keeps_quirk_year_bytes() {
        for (year, bytes) in [(100, [0x04, 0x06]), (4096, [0x00, 0x01]), (255, [0x0F, 0x0F])] {
            let time = UserFacingTime::new(year, 3, 15, 10, 30).unwrap();
            assert_eq!(time.year_bytes(), bytes);

            let command = RacpCommand::report_by_time(time, true);
            let parsed = RacpCommand::parse(&command.to_bytes()).unwrap();
            assert_eq!(parsed, command);
            assert_eq!(parsed.to_bytes(), command.to_bytes());
        }
    }

    #[test]
    fn test_time_operands_compare_by_wire_bytes() {
        let a = UserFacingTime::new(256, 1, 2, 3, 4).unwrap();
        let b = UserFacingTime::new(4096, 1, 2, 3, 4).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, UserFacingTime::new(256, 1, 2, 3, 5).unwrap());
    }

    #[test]
    fn test_parse_rejects_bad_requests() {
        assert!(RacpCommand::parse(&[0x09, 0x01]).is_err());
        assert!(RacpCommand::parse(&[0x01, 0x07]).is_err());
        assert!(RacpCommand::parse(&[0x01, 0x03, 0x03, 0x01, 0x00]).is_err());
        // Odd number of operand bytes for a sequence filter.
        assert!(RacpCommand::parse(&[0x01, 0x03, 0x01, 0x01]).is_err());
        // Filter type with no operands.
        assert!(RacpCommand::parse(&[0x01, 0x03, 0x01]).is_err());
    }

    #[test]
    fn test_parse_number_of_records() {
        let response = RacpResponse::parse(&[0x05, 0x00, 0x2C, 0x01]).unwrap();
        assert_eq!(response, RacpResponse::NumberOfRecords(300));
    }

    #[test]
    fn test_parse_response_code() {
        let response = RacpResponse::parse(&[0x06, 0x00, 0x01, 0x06]).unwrap();
        assert_eq!(
            response,
            RacpResponse::OperationResult {
                requested_op_code: 0x01,
                response_code: ResponseCode::NoRecordsFound,
            }
        );
    }

    #[test]
    fn test_parse_response_ignores_operator() {
        let response = RacpResponse::parse(&[0x06, 0x7F, 0x03, 0x01]).unwrap();
        assert_eq!(
            response,
            RacpResponse::OperationResult {
                requested_op_code: 0x03,
                response_code: ResponseCode::Success,
            }
        );
    }

    #[test]
    fn test_parse_response_errors() {
        assert!(RacpResponse::parse(&[0x05, 0x00, 0x01]).is_err());
        assert!(RacpResponse::parse(&[0x06, 0x00, 0x01]).is_err());
        assert!(RacpResponse::parse(&[0x01, 0x00, 0x01, 0x01]).is_err());
        assert!(RacpResponse::parse(&[0x05]).is_err());
    }

    #[test]
    fn test_unmapped_response_codes_fail() {
        for raw in [0x00u8, 0x0A, 0xFF] {
            let code = ResponseCode::from_raw(raw);
            assert_eq!(code, ResponseCode::Reserved(raw));
            assert_eq!(code.to_raw(), raw);
            assert!(matches!(
                code.to_result(0x01),
                Err(Error::OperationFailed { .. })
            ));
        }
    }

    #[test]
    fn test_response_code_to_result() {
        assert!(ResponseCode::Success.to_result(0x01).is_ok());
        assert!(ResponseCode::NoRecordsFound.to_result(0x01).is_ok());
        assert!(matches!(
            ResponseCode::OpCodeNotSupported.to_result(0x02),
            Err(Error::UnsupportedOperation { op_code: 0x02 })
        ));
        assert!(matches!(
            ResponseCode::ProcedureNotCompleted.to_result(0x01),
            Err(Error::OperationFailed {
                op_code: 0x01,
                response_code: 0x08
            })
        ));
    }

    #[test]
    fn test_response_to_bytes() {
        assert_eq!(
            RacpResponse::NumberOfRecords(0x0102).to_bytes(),
            vec![0x05, 0x00, 0x02, 0x01]
        );
    }

    fn operator_strategy() -> impl Strategy<Value = Operator> {
        (0u8..=6).prop_map(|raw| Operator::from_raw(raw).unwrap())
    }

    fn op_code_strategy() -> impl Strategy<Value = OpCode> {
        (1u8..=4).prop_map(|raw| OpCode::from_raw(raw).unwrap())
    }

    fn time_operand_strategy() -> impl Strategy<Value = UserFacingTime> {
        (16u16..=u16::MAX, 1u8..=12, 1u8..=31, 0u8..=23, 0u8..=59).prop_map(
            |(year, month, day, hour, minute)| {
                UserFacingTime::new(year, month, day, hour, minute).unwrap()
            },
        )
    }

    proptest! {
        #[test]
        fn prop_time_command_parses_back(
            op_code in op_code_strategy(),
            operator in operator_strategy(),
            operands in proptest::collection::vec(time_operand_strategy(), 1..=2),
        ) {
            let command = RacpCommand::with_filter(
                op_code,
                operator,
                RacpFilter::UserFacingTime(operands.clone()),
            )
            .unwrap();

            let parsed = RacpCommand::parse(&command.to_bytes()).unwrap();
            prop_assert_eq!(parsed.filter.as_ref().map(|f| f.filter_type()), Some(FilterType::UserFacingTime));
            match &parsed.filter {
                Some(RacpFilter::UserFacingTime(times)) => {
                    for (time, operand) in times.iter().zip(&operands) {
                        prop_assert_eq!(time.year_bytes(), operand.year_bytes());
                        prop_assert_eq!(time.minute(), operand.minute());
                    }
                }
                other => prop_assert!(false, "unexpected filter {:?}", other),
            }
            prop_assert_eq!(parsed, command);
        }

        #[test]
        fn prop_sequence_command_parses_back(
            op_code in op_code_strategy(),
            operator in operator_strategy(),
            operands in proptest::collection::vec(any::<u16>(), 0..=2),
        ) {
            let command = if operands.is_empty() {
                RacpCommand::new(op_code, operator)
            } else {
                RacpCommand::with_filter(op_code, operator, RacpFilter::SequenceNumber(operands.clone())).unwrap()
            };

            let parsed = RacpCommand::parse(&command.to_bytes()).unwrap();
            prop_assert_eq!(parsed.op_code, op_code);
            prop_assert_eq!(parsed.operator, operator);
            prop_assert_eq!(
                parsed.filter.as_ref().map(|f| f.filter_type()),
                command.filter.as_ref().map(|f| f.filter_type())
            );
            prop_assert_eq!(parsed, command);
        }
    }
}
