// src/monitor.rs
//! Byte pump and polling loop around the NMEA reader

use crate::{
    config::ReaderConfig,
    display::{json::JsonDisplay, terminal::TerminalDisplay, OutputMode},
    error::{GpsError, Result},
    gps::{ByteFeeder, FixPoller, NmeaReader, ReaderOptions},
};
use log::{info, warn};
use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    task::JoinHandle,
    time::sleep,
};
use tokio_serial::SerialPortBuilderExt;

/// Where received bytes come from
#[derive(Debug, Clone, PartialEq)]
pub enum GpsSource {
    Serial { port: String, baudrate: u32 },
    /// Captured NMEA log replayed byte by byte
    File { path: PathBuf, byte_delay: Option<Duration> },
}

impl GpsSource {
    /// Build the source described by a configuration
    pub fn from_config(config: &ReaderConfig) -> Result<Self> {
        match config.source_type.as_str() {
            "serial" => {
                let port = config
                    .serial_port
                    .clone()
                    .ok_or_else(|| GpsError::Config("No serial port configured".to_string()))?;
                Ok(GpsSource::Serial {
                    port,
                    baudrate: config.serial_baudrate.unwrap_or(4800),
                })
            }
            "file" => {
                let path = config
                    .replay_file
                    .clone()
                    .ok_or_else(|| GpsError::Config("No replay file configured".to_string()))?;
                Ok(GpsSource::File {
                    path,
                    byte_delay: config.replay_byte_delay_us.map(Duration::from_micros),
                })
            }
            other => Err(GpsError::Config(format!("Unknown source type '{}'", other))),
        }
    }
}

/// Owns the reader halves and the shared running flag
pub struct GpsMonitor {
    feeder: Option<ByteFeeder>,
    poller: FixPoller,
    running: Arc<AtomicBool>,
}

impl GpsMonitor {
    pub fn new(options: ReaderOptions) -> Self {
        let (feeder, poller) = NmeaReader::new(options).split();
        Self {
            feeder: Some(feeder),
            poller,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Open the source and start feeding its bytes to the reader
    ///
    /// The returned task ends at end of input, on a read error, or once
    /// [`GpsMonitor::stop`] is called; it clears the running flag on exit.
    pub async fn start(&mut self, source: GpsSource) -> Result<JoinHandle<Result<()>>> {
        let feeder = self
            .feeder
            .take()
            .ok_or_else(|| GpsError::Other("Monitor already started".to_string()))?;
        let running = Arc::clone(&self.running);

        match source {
            GpsSource::Serial { port, baudrate } => {
                println!("Connecting to GPS on {} at {} baud...", port, baudrate);
                let serial = tokio_serial::new(&port, baudrate)
                    .timeout(Duration::from_millis(1000))
                    .open_native_async()
                    .map_err(|e| GpsError::Connection(format!("Failed to open serial port {}: {}", port, e)))?;
                println!("Connected successfully!");
                Ok(tokio::spawn(pump(serial, feeder, running, None)))
            }
            GpsSource::File { path, byte_delay } => {
                println!("Replaying {}...", path.display());
                let file = tokio::fs::File::open(&path)
                    .await
                    .map_err(|e| GpsError::Connection(format!("Failed to open {}: {}", path.display(), e)))?;
                Ok(tokio::spawn(pump(file, feeder, running, byte_delay)))
            }
        }
    }

    /// Poll the reader and render fixes until the monitor stops
    pub async fn run_display(&self, config: &ReaderConfig) -> Result<()> {
        let interval = Duration::from_millis(config.poll_interval_ms);
        let offset = config.timezone_offset_hours;

        match OutputMode::from_config(config)? {
            OutputMode::Terminal => {
                TerminalDisplay::new()
                    .run(self.poller.clone(), Arc::clone(&self.running), offset, interval)
                    .await
            }
            OutputMode::Json => {
                JsonDisplay::new()
                    .run(self.poller.clone(), Arc::clone(&self.running), offset, interval)
                    .await
            }
        }
    }

    pub fn poller(&self) -> FixPoller {
        self.poller.clone()
    }

    /// Stop the monitor
    pub fn stop(&self) {
        self.running.store(false, Ordering::Relaxed);
    }

    /// Check if the monitor is running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }
}

/// Deliver every byte of `source` to the feeder, in order, one at a time
pub async fn pump<R>(
    mut source: R,
    mut feeder: ByteFeeder,
    running: Arc<AtomicBool>,
    byte_delay: Option<Duration>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; 256];
    let mut result = Ok(());

    while running.load(Ordering::Relaxed) {
        let n = match source.read(&mut buf).await {
            Ok(0) => {
                info!("end of input");
                break;
            }
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => continue,
            Err(e) => {
                warn!("read failed: {}", e);
                result = Err(GpsError::Io(e));
                break;
            }
        };

        for &byte in &buf[..n] {
            feeder.feed(byte);
            if let Some(delay) = byte_delay {
                sleep(delay).await;
            }
        }
    }

    running.store(false, Ordering::Relaxed);
    result
}

/// List available serial ports
pub async fn list_serial_ports() -> Result<()> {
    let ports = tokio_serial::available_ports()
        .map_err(|e| GpsError::Other(format!("Failed to list serial ports: {}", e)))?;

    if ports.is_empty() {
        println!("No serial ports found.");
    } else {
        println!("Available serial ports:");
        for port in ports {
            println!("  {} - {:?}", port.port_name, port.port_type);
        }
    }

    Ok(())
}
