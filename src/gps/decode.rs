// src/gps/decode.rs
//! Field decoding for captured GPRMC and GPGGA sentences

use super::{
    field::{
        parse_fixed_point, parse_letter, parse_signed_fixed_point, parse_two_digits, parse_unsigned,
    },
    fix::{GpggaFix, GprmcFix},
    sentence::RawSentence,
};
use chrono::{Datelike, NaiveDate};
use std::fmt;

// GPRMC body fields, counted from the first field after `$GPRMC,`
const RMC_TIME: usize = 0;
const RMC_STATUS: usize = 1;
const RMC_LATITUDE: usize = 2;
const RMC_LATITUDE_HEMISPHERE: usize = 3;
const RMC_LONGITUDE: usize = 4;
const RMC_LONGITUDE_HEMISPHERE: usize = 5;
const RMC_SPEED: usize = 6;
const RMC_COURSE: usize = 7;
const RMC_DATE: usize = 8;

// GPGGA body fields
const GGA_FIX_QUALITY: usize = 5;
const GGA_SATELLITES: usize = 6;
const GGA_HDOP: usize = 7;
const GGA_ALTITUDE: usize = 8;

/// Why a captured sentence could not be decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    /// The terminator was never stored
    Incomplete,
    MissingField(&'static str),
    InvalidField(&'static str),
    /// Day, month and year do not name a calendar date
    InvalidDate,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Incomplete => write!(f, "sentence is incomplete"),
            DecodeError::MissingField(name) => write!(f, "missing {} field", name),
            DecodeError::InvalidField(name) => write!(f, "invalid {} field", name),
            DecodeError::InvalidDate => write!(f, "invalid date"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Result of decoding a GPRMC sentence
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RmcDecode {
    /// Status `A`: every field decoded and timezone-corrected
    Valid(GprmcFix),
    /// Status `V`: the receiver has no fix, nothing else is trusted
    NoFix,
}

fn field<'a>(raw: &'a RawSentence, index: usize, name: &'static str) -> Result<&'a [u8], DecodeError> {
    match raw.field(index) {
        Some(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(DecodeError::MissingField(name)),
    }
}

fn number(raw: &RawSentence, index: usize, name: &'static str) -> Result<f64, DecodeError> {
    parse_fixed_point(field(raw, index, name)?).ok_or(DecodeError::InvalidField(name))
}

fn hemisphere(raw: &RawSentence, index: usize, name: &'static str, allowed: [char; 2]) -> Result<char, DecodeError> {
    parse_letter(field(raw, index, name)?)
        .filter(|c| allowed.contains(c))
        .ok_or(DecodeError::InvalidField(name))
}

/// Split `ddmm.mmmm` into whole degrees and decimal minutes
fn split_degrees(value: f64, name: &'static str) -> Result<(u8, f64), DecodeError> {
    let degrees = (value / 100.0).floor();
    if degrees > 180.0 {
        return Err(DecodeError::InvalidField(name));
    }
    Ok((degrees as u8, value - degrees * 100.0))
}

/// Decode a GPRMC body, shifting the time by `timezone_offset_hours`
///
/// The corrected hour is `utc_hour - timezone_offset_hours`; when that
/// leaves 0..24 the date moves by the same number of days.
pub fn decode_gprmc(raw: &RawSentence, timezone_offset_hours: i8) -> Result<RmcDecode, DecodeError> {
    if !raw.is_complete() {
        return Err(DecodeError::Incomplete);
    }

    match parse_letter(field(raw, RMC_STATUS, "status")?) {
        Some('A') => {}
        Some('V') => return Ok(RmcDecode::NoFix),
        _ => return Err(DecodeError::InvalidField("status")),
    }

    let time = field(raw, RMC_TIME, "time")?;
    let hour = parse_two_digits(time, 0).filter(|h| *h < 24);
    let minute = parse_two_digits(time, 2).filter(|m| *m < 60);
    // 60 is a leap second
    let second = parse_two_digits(time, 4).filter(|s| *s <= 60);
    let (hour, minute, second) = match (hour, minute, second) {
        (Some(h), Some(m), Some(s)) => (h, m, s),
        _ => return Err(DecodeError::InvalidField("time")),
    };

    let date = field(raw, RMC_DATE, "date")?;
    let (day, month, year) = match (
        parse_two_digits(date, 0),
        parse_two_digits(date, 2),
        parse_two_digits(date, 4),
    ) {
        (Some(d), Some(m), Some(y)) if date.len() == 6 => (d, m, y),
        _ => return Err(DecodeError::InvalidField("date")),
    };

    let (latitude_degrees, latitude_minutes) =
        split_degrees(number(raw, RMC_LATITUDE, "latitude")?, "latitude")?;
    let latitude_hemisphere = hemisphere(raw, RMC_LATITUDE_HEMISPHERE, "latitude hemisphere", ['N', 'S'])?;
    let (longitude_degrees, longitude_minutes) =
        split_degrees(number(raw, RMC_LONGITUDE, "longitude")?, "longitude")?;
    let longitude_hemisphere = hemisphere(raw, RMC_LONGITUDE_HEMISPHERE, "longitude hemisphere", ['E', 'W'])?;
    let speed_over_ground = number(raw, RMC_SPEED, "speed")?;
    let course = number(raw, RMC_COURSE, "course")?;

    let local = apply_timezone(hour, day, month, year, timezone_offset_hours)?;

    Ok(RmcDecode::Valid(GprmcFix {
        rtc_hour: local.hour,
        rtc_minute: minute,
        rtc_second: second,
        rtc_day: local.day,
        rtc_month: local.month,
        rtc_year: local.year,
        latitude_degrees,
        latitude_minutes,
        latitude_hemisphere,
        longitude_degrees,
        longitude_minutes,
        longitude_hemisphere,
        speed_over_ground,
        course,
        is_valid: true,
        was_read: false,
    }))
}

struct LocalTime {
    hour: u8,
    day: u8,
    month: u8,
    year: u8,
}

/// Shift a UTC hour and two-digit date by a whole-hour offset
fn apply_timezone(hour: u8, day: u8, month: u8, year: u8, offset: i8) -> Result<LocalTime, DecodeError> {
    let date = NaiveDate::from_ymd_opt(2000 + i32::from(year), u32::from(month), u32::from(day))
        .ok_or(DecodeError::InvalidDate)?;

    let shifted = i32::from(hour) - i32::from(offset);
    let days = shifted.div_euclid(24);
    let date = date
        .checked_add_signed(chrono::Duration::days(i64::from(days)))
        .ok_or(DecodeError::InvalidDate)?;

    Ok(LocalTime {
        hour: shifted.rem_euclid(24) as u8,
        day: date.day() as u8,
        month: date.month() as u8,
        year: date.year().rem_euclid(100) as u8,
    })
}

/// Decode the quality fields of a GPGGA body
pub fn decode_gpgga(raw: &RawSentence) -> Result<GpggaFix, DecodeError> {
    if !raw.is_complete() {
        return Err(DecodeError::Incomplete);
    }

    let fix_quality = parse_unsigned(field(raw, GGA_FIX_QUALITY, "fix quality")?)
        .and_then(|q| u8::try_from(q).ok())
        .ok_or(DecodeError::InvalidField("fix quality"))?;

    let satellites = match raw.field(GGA_SATELLITES) {
        Some(b) if !b.is_empty() => parse_unsigned(b)
            .and_then(|n| u8::try_from(n).ok())
            .ok_or(DecodeError::InvalidField("satellites"))?,
        _ => 0,
    };

    Ok(GpggaFix {
        fix_quality,
        satellites,
        hdop: raw.field(GGA_HDOP).and_then(parse_fixed_point),
        altitude: raw.field(GGA_ALTITUDE).and_then(parse_signed_fixed_point),
    })
}
