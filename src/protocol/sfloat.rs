//! IEEE-11073 16-bit SFLOAT conversion.
//!
//! An SFLOAT packs a 12-bit two's complement mantissa in the low bits and a
//! 4-bit two's complement base-10 exponent in the high nibble:
//! `value = mantissa * 10^exponent`.

/// Not a Number.
pub const NAN: u16 = 0x07FF;
/// Not at this resolution.
pub const NRES: u16 = 0x0800;
/// Positive infinity.
pub const POSITIVE_INFINITY: u16 = 0x07FE;
/// Negative infinity.
pub const NEGATIVE_INFINITY: u16 = 0x0802;
/// Reserved for future use.
pub const RESERVED: u16 = 0x0801;

/// Largest mantissa magnitude that is not a special value.
const MANTISSA_MAX: i32 = 0x07FD;

/// Decode a raw SFLOAT.
///
/// # Example
///
/// ```
/// use health_profiles_ble::protocol::sfloat;
///
/// // mantissa 725, exponent -1
/// assert_eq!(sfloat::decode(0xF2D5), 72.5);
/// ```
pub fn decode(raw: u16) -> f32 {
    match raw {
        NAN | NRES | RESERVED => return f32::NAN,
        POSITIVE_INFINITY => return f32::INFINITY,
        NEGATIVE_INFINITY => return f32::NEG_INFINITY,
        _ => {}
    }

    let mut mantissa = (raw & 0x0FFF) as i32;
    if mantissa >= 0x0800 {
        mantissa -= 0x1000;
    }
    let mut exponent = (raw >> 12) as i32;
    if exponent >= 0x08 {
        exponent -= 0x10;
    }

    // Dividing by an exact power of ten keeps 1200e-1 == 120.0.
    if exponent >= 0 {
        (mantissa as f64 * 10f64.powi(exponent)) as f32
    } else {
        (mantissa as f64 / 10f64.powi(-exponent)) as f32
    }
}

/// Encode a value as an SFLOAT, choosing the exponent that keeps the most
/// precision while the mantissa stays in range.
pub fn encode(value: f32) -> u16 {
    if value.is_nan() {
        return NAN;
    }
    if value.is_infinite() {
        return if value > 0.0 {
            POSITIVE_INFINITY
        } else {
            NEGATIVE_INFINITY
        };
    }

    let mut scaled = value as f64;
    let mut exponent: i32 = 0;

    while scaled.abs() > MANTISSA_MAX as f64 && exponent < 7 {
        scaled /= 10.0;
        exponent += 1;
    }
    while exponent > -8
        && (scaled - scaled.round()).abs() > 1e-6
        && (scaled * 10.0).abs() <= MANTISSA_MAX as f64
    {
        scaled *= 10.0;
        exponent -= 1;
    }

    let mantissa = scaled.round() as i32;
    if mantissa > MANTISSA_MAX {
        return POSITIVE_INFINITY;
    }
    if mantissa < -MANTISSA_MAX {
        return NEGATIVE_INFINITY;
    }

    (((exponent as u16) & 0x0F) << 12) | ((mantissa as u16) & 0x0FFF)
}
