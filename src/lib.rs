// src/lib.rs
//! GPS NMEA Reader Library
//!
//! Captures `$GPGGA`, `$GPGSA` and `$GPRMC` sentences one byte at a time and
//! decodes GPRMC into a local-time fix record that the application polls.

pub mod config;
pub mod display;
pub mod error;
pub mod gps;
pub mod monitor;

// Re-export main types for convenience
pub use config::ReaderConfig;
pub use error::{GpsError, Result};
pub use gps::{ByteFeeder, FixPoller, GprmcFix, NmeaReader};
pub use monitor::{GpsMonitor, GpsSource};
