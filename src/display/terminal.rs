// src/display/terminal.rs
//! Terminal-based display implementation

use super::{stop_on_ctrl_c, FixReport};
use crate::{
    error::{GpsError, Result},
    gps::{CaptureStats, FixPoller, GprmcFix},
};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType, DisableLineWrap, EnableLineWrap},
};
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

pub struct TerminalDisplay {
    last: Option<FixReport>,
    previous_fix: Option<GprmcFix>,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            last: None,
            previous_fix: None,
        }
    }

    /// Start the terminal display loop
    pub async fn run(
        mut self,
        poller: FixPoller,
        running: Arc<AtomicBool>,
        timezone_offset_hours: i8,
        poll_interval: Duration,
    ) -> Result<()> {
        let mut stdout = io::stdout();
        execute!(stdout, Hide, DisableLineWrap).map_err(GpsError::Io)?;

        stop_on_ctrl_c(Arc::clone(&running));

        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            // Read the flag before polling so the last bytes fed are decoded.
            let keep_going = running.load(Ordering::Relaxed);

            self.poll(&poller, timezone_offset_hours);
            let stats = poller.stats();

            execute!(stdout, Clear(ClearType::All), MoveTo(0, 0)).map_err(GpsError::Io)?;
            self.render_display(&mut stdout, &stats)?;
            stdout.flush().map_err(GpsError::Io)?;

            if !keep_going {
                break;
            }
        }

        execute!(stdout, Show, EnableLineWrap).map_err(GpsError::Io)?;
        println!("\nShutting down...");
        Ok(())
    }

    /// Pick up a fresh fix, if one arrived since the last poll
    fn poll(&mut self, poller: &FixPoller, timezone_offset_hours: i8) {
        if let Some(fix) = poller.take_fresh(timezone_offset_hours) {
            self.last = Some(FixReport::collect(poller, fix, self.previous_fix.as_ref()));
            self.previous_fix = Some(fix);
        }
    }

    /// Render the current state to the terminal
    fn render_display(&self, stdout: &mut impl Write, stats: &CaptureStats) -> Result<()> {
        // Header
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("GPS NMEA Reader - GPRMC fix monitor"),
            Print("\n"),
            Print("=".repeat(60)),
            Print("\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;

        match &self.last {
            Some(report) => {
                execute!(
                    stdout,
                    Print(format!("Last Fix: {} {} (local)\n\n", report.date, report.time))
                )
                .map_err(GpsError::Io)?;

                self.render_position_section(stdout, report)?;
                self.render_movement_section(stdout, report)?;

                if report.gga.is_some() {
                    self.render_quality_section(stdout, report)?;
                }

                self.render_raw_data_section(stdout, report)?;
            }
            None => {
                execute!(stdout, Print("Waiting for a valid GPRMC fix...\n\n")).map_err(GpsError::Io)?;
            }
        }

        self.render_capture_section(stdout, stats)?;

        // Footer
        execute!(
            stdout,
            SetForegroundColor(Color::Green),
            Print("=".repeat(60)),
            Print("\n"),
            Print("Press Ctrl+C to exit"),
            Print("\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;

        Ok(())
    }

    fn render_position_section(&self, stdout: &mut impl Write, report: &FixReport) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Yellow),
            Print("POSITION:\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;

        let fix = &report.fix;
        execute!(
            stdout,
            Print(format!(
                "  Latitude:  {:>3}° {:>9.4}' {}  ({:.6})\n",
                fix.latitude_degrees, fix.latitude_minutes, fix.latitude_hemisphere, report.latitude
            )),
            Print(format!(
                "  Longitude: {:>3}° {:>9.4}' {}  ({:.6})\n",
                fix.longitude_degrees, fix.longitude_minutes, fix.longitude_hemisphere, report.longitude
            ))
        )
        .map_err(GpsError::Io)?;

        if let Some(alt) = report.gga.and_then(|g| g.altitude) {
            execute!(stdout, Print(format!("  Altitude:  {:>12.1} m\n", alt))).map_err(GpsError::Io)?;
        }

        execute!(stdout, Print("\n")).map_err(GpsError::Io)?;
        Ok(())
    }

    fn render_movement_section(&self, stdout: &mut impl Write, report: &FixReport) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Cyan),
            Print("MOVEMENT:\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;

        execute!(
            stdout,
            Print(format!(
                "  Speed:     {:>12.1} km/h ({:.1} kn)\n",
                report.speed_kmh, report.fix.speed_over_ground
            )),
            Print(format!("  Course:    {:>12.1}°\n", report.course))
        )
        .map_err(GpsError::Io)?;

        if let Some(distance) = report.distance_m {
            execute!(stdout, Print(format!("  Moved:     {:>12.1} m\n", distance))).map_err(GpsError::Io)?;
        }

        execute!(stdout, Print("\n")).map_err(GpsError::Io)?;
        Ok(())
    }

    fn render_quality_section(&self, stdout: &mut impl Write, report: &FixReport) -> Result<()> {
        let Some(gga) = report.gga else {
            return Ok(());
        };

        execute!(
            stdout,
            SetForegroundColor(Color::Magenta),
            Print("QUALITY:\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;

        let hdop = gga
            .hdop
            .map(|h| format!("{:.1}", h))
            .unwrap_or_else(|| "N/A".to_string());
        execute!(
            stdout,
            Print(format!("  Satellites: {:>11}\n", gga.satellites)),
            Print(format!("  HDOP:       {:>11}\n", hdop)),
            Print(format!("  Fix Type:   {:>11}\n\n", gga.fix_description()))
        )
        .map_err(GpsError::Io)?;

        Ok(())
    }

    fn render_raw_data_section(&self, stdout: &mut impl Write, report: &FixReport) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::Blue),
            Print("RAW DATA:\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;

        let raw_display = report.raw.as_deref().unwrap_or("No data");
        execute!(stdout, Print(format!("  {}\n\n", raw_display))).map_err(GpsError::Io)?;

        Ok(())
    }

    fn render_capture_section(&self, stdout: &mut impl Write, stats: &CaptureStats) -> Result<()> {
        execute!(
            stdout,
            SetForegroundColor(Color::DarkGrey),
            Print("CAPTURE:\n"),
            ResetColor
        )
        .map_err(GpsError::Io)?;

        execute!(
            stdout,
            Print(format!("  Sentences:  {:>11}\n", stats.committed)),
            Print(format!("  Ignored:    {:>11}\n", stats.unrecognized)),
            Print(format!("  Dropped:    {:>11}\n", stats.dropped())),
            Print(format!("  Bad fixes:  {:>11}\n\n", stats.decode_failures))
        )
        .map_err(GpsError::Io)?;

        Ok(())
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}
