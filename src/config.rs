// src/config.rs
//! Configuration management with file storage

use crate::{
    error::{GpsError, Result},
    gps::ChecksumMode,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Largest accepted timezone offset, in hours either side of UTC
pub const MAX_TIMEZONE_OFFSET: i8 = 23;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    pub source_type: String, // "serial", "file"
    pub serial_port: Option<String>,
    pub serial_baudrate: Option<u32>,
    pub replay_file: Option<PathBuf>,
    /// Pause between replayed bytes, to mimic a live receiver
    pub replay_byte_delay_us: Option<u64>,
    /// Subtracted from the UTC hour of every fix
    pub timezone_offset_hours: i8,
    pub checksum: ChecksumMode,
    pub poll_interval_ms: u64,
    pub output: String, // "terminal", "json"
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            source_type: "serial".to_string(),
            serial_port: None,
            serial_baudrate: Some(4800),
            replay_file: None,
            replay_byte_delay_us: None,
            timezone_offset_hours: 0,
            checksum: ChecksumMode::Ignore,
            poll_interval_ms: 200,
            output: "terminal".to_string(),
        }
    }
}

impl ReaderConfig {
    /// Load configuration from the config file, falling back to defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GpsError::Config(format!("Failed to read config file: {}", e)))?;

        let config: Self = serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the config file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        self.validate()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| GpsError::Config(format!("Failed to create config directory: {}", e)))?;
        }

        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(path, contents)
            .map_err(|e| GpsError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(home).join(".config").join("gps-nmea-reader").join("config.json"))
    }

    /// Reject settings the reader cannot run with
    pub fn validate(&self) -> Result<()> {
        match self.source_type.as_str() {
            "serial" | "file" => {}
            other => return Err(GpsError::Config(format!("Unknown source type '{}'", other))),
        }

        match self.output.as_str() {
            "terminal" | "json" => {}
            other => return Err(GpsError::Config(format!("Unknown output '{}'", other))),
        }

        if self.timezone_offset_hours.unsigned_abs() > MAX_TIMEZONE_OFFSET.unsigned_abs() {
            return Err(GpsError::Config(format!(
                "Timezone offset {} is outside -{}..={}",
                self.timezone_offset_hours, MAX_TIMEZONE_OFFSET, MAX_TIMEZONE_OFFSET
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(GpsError::Config("Poll interval must be at least 1 ms".to_string()));
        }

        Ok(())
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baudrate: u32) {
        self.source_type = "serial".to_string();
        self.serial_port = Some(port);
        self.serial_baudrate = Some(baudrate);
    }

    /// Update replay file settings
    pub fn update_replay(&mut self, path: PathBuf, byte_delay_us: Option<u64>) {
        self.source_type = "file".to_string();
        self.replay_file = Some(path);
        self.replay_byte_delay_us = byte_delay_us;
    }

    pub fn update_timezone(&mut self, offset_hours: i8) {
        self.timezone_offset_hours = offset_hours;
    }
}
