// src/display/mod.rs
//! Output modes for decoded fixes

pub mod json;
pub mod terminal;

use crate::{
    config::ReaderConfig,
    error::{GpsError, Result},
    gps::{CaptureStats, FixPoller, GpggaFix, GprmcFix, SentenceId},
};
use log::warn;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// How fresh fixes are presented
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Full-screen page, redrawn every poll
    Terminal,
    /// One JSON object per fresh fix on stdout
    Json,
}

impl OutputMode {
    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        match config.output.as_str() {
            "terminal" => Ok(OutputMode::Terminal),
            "json" => Ok(OutputMode::Json),
            other => Err(GpsError::Config(format!("Unknown output '{}'", other))),
        }
    }
}

/// Everything shown for one fresh fix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixReport {
    pub time: String,
    pub date: String,
    pub latitude: f64,
    pub longitude: f64,
    pub speed_kmh: f64,
    pub course: f64,
    /// Metres from the previous reported fix
    pub distance_m: Option<f64>,
    pub fix: GprmcFix,
    pub gga: Option<GpggaFix>,
    pub stats: CaptureStats,
    pub raw: Option<String>,
}

impl FixReport {
    /// Gather the fix together with the latest side data from the poller
    pub fn collect(poller: &FixPoller, fix: GprmcFix, previous: Option<&GprmcFix>) -> Self {
        Self {
            time: fix.format_time(),
            date: fix.format_date(),
            latitude: fix.latitude(),
            longitude: fix.longitude(),
            speed_kmh: fix.speed_kmh(),
            course: fix.course,
            distance_m: previous.and_then(|p| p.distance_to(&fix)),
            fix,
            gga: poller.gga(),
            stats: poller.stats(),
            raw: poller
                .latest(SentenceId::Rmc)
                .map(|raw| raw.to_wire_string(SentenceId::Rmc)),
        }
    }
}

/// Clear `running` when Ctrl+C is pressed
pub fn stop_on_ctrl_c(running: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("unable to listen for Ctrl+C: {}", e);
            return;
        }
        running.store(false, Ordering::Relaxed);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::NmeaReader;

    #[test]
    fn test_output_mode_from_config() {
        let mut config = ReaderConfig::default();
        assert_eq!(OutputMode::from_config(&config).unwrap(), OutputMode::Terminal);

        config.output = "json".to_string();
        assert_eq!(OutputMode::from_config(&config).unwrap(), OutputMode::Json);

        config.output = "gui".to_string();
        assert!(OutputMode::from_config(&config).is_err());
    }

    #[test]
    fn test_report_collects_side_data() {
        let mut reader = NmeaReader::default();
        reader.feed_all(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n");
        reader.feed_all(b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n");

        let fix = reader.take_fresh(0).unwrap();
        let report = FixReport::collect(&reader.poller(), fix, Some(&fix));

        assert_eq!(report.time, "12:35:19");
        assert_eq!(report.date, "23/03/94");
        assert_eq!(report.gga.map(|g| g.satellites), Some(8));
        assert_eq!(report.distance_m, Some(0.0));
        assert_eq!(
            report.raw.as_deref(),
            Some("$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A")
        );
        assert_eq!(report.stats.committed, 2);
    }
}
