// src/main.rs
//! GPS NMEA Reader - decode GPRMC fixes from a serial receiver or a captured log

use anyhow::Context;
use clap::Parser;
use gps_nmea_reader::{
    config::ReaderConfig,
    gps::{ChecksumMode, ReaderOptions},
    monitor::{list_serial_ports, GpsMonitor, GpsSource},
};
use log::{info, warn};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "gps-nmea-reader", version, about)]
struct Args {
    /// Serial port of the receiver, e.g. /dev/ttyUSB0 or COM3
    #[arg(short, long, conflicts_with = "file")]
    port: Option<String>,

    #[arg(short, long)]
    baud: Option<u32>,

    /// Replay a captured NMEA log instead of reading a port
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Pause between replayed bytes, in microseconds
    #[arg(long, requires = "file")]
    byte_delay_us: Option<u64>,

    /// Hours subtracted from UTC to get local time
    #[arg(long, allow_hyphen_values = true)]
    tz: Option<i8>,

    /// Checksum handling: ignore or required
    #[arg(long)]
    checksum: Option<ChecksumMode>,

    /// Print one JSON object per fix instead of the terminal page
    #[arg(long)]
    json: bool,

    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// List available serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Store the effective settings as the new defaults
    #[arg(long)]
    save_config: bool,
}

impl Args {
    fn apply(&self, config: &mut ReaderConfig) {
        if let Some(port) = &self.port {
            let baudrate = self.baud.or(config.serial_baudrate).unwrap_or(4800);
            config.update_serial(port.clone(), baudrate);
        } else if let Some(baud) = self.baud {
            config.serial_baudrate = Some(baud);
        }
        if let Some(file) = &self.file {
            config.update_replay(file.clone(), self.byte_delay_us);
        }
        if let Some(tz) = self.tz {
            config.update_timezone(tz);
        }
        if let Some(mode) = self.checksum {
            config.checksum = mode;
        }
        if self.json {
            config.output = "json".to_string();
        }
        if let Some(interval) = self.poll_interval_ms {
            config.poll_interval_ms = interval;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();
    let args = Args::parse();

    if args.list_ports {
        list_serial_ports().await?;
        return Ok(());
    }

    let mut config = ReaderConfig::load().unwrap_or_else(|e| {
        warn!("{}; using defaults", e);
        ReaderConfig::default()
    });
    args.apply(&mut config);
    config.validate()?;

    if args.save_config {
        config.save().context("saving configuration")?;
        info!("configuration saved");
    }

    let source = GpsSource::from_config(&config)
        .context("no input selected, pass --port or --file")?;

    let mut monitor = GpsMonitor::new(ReaderOptions {
        checksum: config.checksum,
    });
    let pump = monitor.start(source).await?;

    let shown = monitor.run_display(&config).await;
    monitor.stop();

    match pump.await {
        Ok(Err(e)) => warn!("input stopped: {}", e),
        Err(e) => warn!("input task failed: {}", e),
        Ok(Ok(())) => {}
    }

    let stats = monitor.poller().stats();
    info!(
        "{} sentences, {} ignored, {} dropped, {} bad fixes",
        stats.committed,
        stats.unrecognized,
        stats.dropped(),
        stats.decode_failures
    );

    shown?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_override_config() {
        let args = Args::parse_from([
            "gps-nmea-reader",
            "--port",
            "/dev/ttyUSB1",
            "--tz",
            "-3",
            "--checksum",
            "required",
            "--json",
        ]);
        let mut config = ReaderConfig::default();
        args.apply(&mut config);

        assert_eq!(config.serial_port.as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(config.serial_baudrate, Some(4800));
        assert_eq!(config.timezone_offset_hours, -3);
        assert_eq!(config.checksum, ChecksumMode::Required);
        assert_eq!(config.output, "json");
    }

    #[test]
    fn test_replay_args() {
        let args = Args::parse_from(["gps-nmea-reader", "--file", "drive.nmea", "--byte-delay-us", "2083"]);
        let mut config = ReaderConfig::default();
        args.apply(&mut config);

        assert_eq!(config.source_type, "file");
        assert_eq!(config.replay_byte_delay_us, Some(2083));
    }

    #[test]
    fn test_port_and_file_conflict() {
        assert!(Args::try_parse_from(["gps-nmea-reader", "--port", "COM3", "--file", "a.nmea"]).is_err());
    }
}
