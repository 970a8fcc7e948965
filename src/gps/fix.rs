// src/gps/fix.rs
//! Decoded fix records handed to the application

use serde::Serialize;

/// Knots to kilometres per hour
const KNOTS_TO_KMH: f64 = 1.852;

/// The consumer-facing GPRMC record
///
/// `is_valid` and `was_read` form a single-slot mailbox: a fix is fresh
/// only while `is_valid && !was_read`. Fields keep their previous values
/// when a sentence reports no fix, so check [`GprmcFix::is_valid`] first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GprmcFix {
    /// Local hour, already corrected by the timezone offset
    pub rtc_hour: u8,
    pub rtc_minute: u8,
    pub rtc_second: u8,
    pub rtc_day: u8,
    pub rtc_month: u8,
    /// Two-digit year
    pub rtc_year: u8,
    pub latitude_degrees: u8,
    pub latitude_minutes: f64,
    /// `N` or `S`, as received
    pub latitude_hemisphere: char,
    pub longitude_degrees: u8,
    pub longitude_minutes: f64,
    /// `E` or `W`, as received
    pub longitude_hemisphere: char,
    /// Knots
    pub speed_over_ground: f64,
    /// Degrees true
    pub course: f64,
    pub is_valid: bool,
    pub was_read: bool,
}

impl GprmcFix {
    pub const fn new() -> Self {
        Self {
            rtc_hour: 0,
            rtc_minute: 0,
            rtc_second: 0,
            rtc_day: 0,
            rtc_month: 0,
            rtc_year: 0,
            latitude_degrees: 0,
            latitude_minutes: 0.0,
            latitude_hemisphere: 'N',
            longitude_degrees: 0,
            longitude_minutes: 0.0,
            longitude_hemisphere: 'E',
            speed_over_ground: 0.0,
            course: 0.0,
            is_valid: false,
            was_read: false,
        }
    }

    /// A valid fix the consumer has not acknowledged yet
    pub fn is_fresh(&self) -> bool {
        self.is_valid && !self.was_read
    }

    /// Signed decimal latitude, south negative
    pub fn latitude(&self) -> f64 {
        let value = f64::from(self.latitude_degrees) + self.latitude_minutes / 60.0;
        if self.latitude_hemisphere == 'S' {
            -value
        } else {
            value
        }
    }

    /// Signed decimal longitude, west negative
    pub fn longitude(&self) -> f64 {
        let value = f64::from(self.longitude_degrees) + self.longitude_minutes / 60.0;
        if self.longitude_hemisphere == 'W' {
            -value
        } else {
            value
        }
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_over_ground * KNOTS_TO_KMH
    }

    /// Geodesic distance in metres to another fix
    pub fn distance_to(&self, other: &GprmcFix) -> Option<f64> {
        super::geodesy::vincenty_distance(
            (self.latitude(), self.longitude()),
            (other.latitude(), other.longitude()),
        )
    }

    /// `HH:MM:SS` of the corrected time
    pub fn format_time(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.rtc_hour, self.rtc_minute, self.rtc_second)
    }

    /// `DD/MM/YY` of the corrected date
    pub fn format_date(&self) -> String {
        format!("{:02}/{:02}/{:02}", self.rtc_day, self.rtc_month, self.rtc_year)
    }

    /// Copy the decoded fields of `other`, leaving the flags untouched
    pub(crate) fn set_fields(&mut self, other: &GprmcFix) {
        let (is_valid, was_read) = (self.is_valid, self.was_read);
        *self = *other;
        self.is_valid = is_valid;
        self.was_read = was_read;
    }
}

impl Default for GprmcFix {
    fn default() -> Self {
        Self::new()
    }
}

/// Position quality from the most recent GPGGA sentence
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GpggaFix {
    pub fix_quality: u8,
    pub satellites: u8,
    pub hdop: Option<f64>,
    /// Metres above mean sea level
    pub altitude: Option<f64>,
}

impl GpggaFix {
    pub fn has_fix(&self) -> bool {
        self.fix_quality != 0
    }

    /// Get fix type description
    pub fn fix_description(&self) -> String {
        match self.fix_quality {
            0 => "No fix".to_string(),
            1 => "GPS".to_string(),
            2 => "DGPS".to_string(),
            3 => "PPS".to_string(),
            4 => "RTK".to_string(),
            5 => "Float RTK".to_string(),
            6 => "Estimated".to_string(),
            7 => "Manual".to_string(),
            8 => "Simulation".to_string(),
            quality => format!("Unknown ({})", quality),
        }
    }
}
