// src/gps/field.rs
//! Numeric decoding of raw NMEA fields

/// Most digits accepted on either side of the decimal point
const MAX_DIGITS: u32 = 9;

/// Convert a fixed-point field such as `4807.038` to a float
///
/// Digits before the `.` and digits after it are accumulated separately and
/// combined as `integer + decimal / 10^count`. A field without a `.` is a
/// plain integer. Empty fields, stray bytes and runs longer than nine digits
/// give `None`.
pub fn parse_fixed_point(field: &[u8]) -> Option<f64> {
    let (integer_part, decimal_part) = match field.iter().position(|&b| b == b'.') {
        Some(dot) => (&field[..dot], Some(&field[dot + 1..])),
        None => (field, None),
    };

    if integer_part.is_empty() && decimal_part.map_or(true, <[u8]>::is_empty) {
        return None;
    }

    let (integer, _) = accumulate(integer_part)?;
    let (decimal, count) = match decimal_part {
        Some(digits) => accumulate(digits)?,
        None => (0, 0),
    };

    Some(integer as f64 + decimal as f64 / 10f64.powi(count as i32))
}

/// [`parse_fixed_point`] with an optional leading `-`, for altitudes
pub fn parse_signed_fixed_point(field: &[u8]) -> Option<f64> {
    match field.split_first() {
        Some((&b'-', magnitude)) => parse_fixed_point(magnitude).map(|v| -v),
        _ => parse_fixed_point(field),
    }
}

/// Decode the two ASCII digits at `offset`, e.g. the `mm` of `hhmmss`
pub fn parse_two_digits(field: &[u8], offset: usize) -> Option<u8> {
    let pair = field.get(offset..offset + 2)?;
    let tens = digit(pair[0])?;
    let ones = digit(pair[1])?;
    Some(tens * 10 + ones)
}

/// Single-letter field such as a status or hemisphere
pub fn parse_letter(field: &[u8]) -> Option<char> {
    match field {
        [b] if b.is_ascii_alphabetic() => Some(*b as char),
        _ => None,
    }
}

/// Plain unsigned integer field such as a satellite count
pub fn parse_unsigned(field: &[u8]) -> Option<u32> {
    if field.is_empty() {
        return None;
    }
    accumulate(field).map(|(value, _)| value)
}

fn accumulate(digits: &[u8]) -> Option<(u32, u32)> {
    let mut value: u32 = 0;
    let mut count: u32 = 0;
    for &b in digits {
        if count == MAX_DIGITS {
            return None;
        }
        value = value * 10 + u32::from(digit(b)?);
        count += 1;
    }
    Some((value, count))
}

fn digit(b: u8) -> Option<u8> {
    b.is_ascii_digit().then(|| b - b'0')
}
