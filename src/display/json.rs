// src/display/json.rs
//! JSON-lines output, one object per fresh fix

use super::{stop_on_ctrl_c, FixReport};
use crate::{
    error::{GpsError, Result},
    gps::{FixPoller, GprmcFix},
};
use std::{
    io::{self, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

#[derive(Default)]
pub struct JsonDisplay {
    previous_fix: Option<GprmcFix>,
}

impl JsonDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn run(
        mut self,
        poller: FixPoller,
        running: Arc<AtomicBool>,
        timezone_offset_hours: i8,
        poll_interval: Duration,
    ) -> Result<()> {
        stop_on_ctrl_c(Arc::clone(&running));

        let mut stdout = io::stdout();
        let mut ticker = tokio::time::interval(poll_interval);
        loop {
            ticker.tick().await;
            let keep_going = running.load(Ordering::Relaxed);

            self.emit(&mut stdout, &poller, timezone_offset_hours)?;

            if !keep_going {
                break;
            }
        }

        Ok(())
    }

    /// Write a line if a fresh fix is available; returns whether one was
    fn emit(&mut self, out: &mut impl Write, poller: &FixPoller, timezone_offset_hours: i8) -> Result<bool> {
        let Some(fix) = poller.take_fresh(timezone_offset_hours) else {
            return Ok(false);
        };

        let report = FixReport::collect(poller, fix, self.previous_fix.as_ref());
        self.previous_fix = Some(fix);

        serde_json::to_writer(&mut *out, &report)?;
        writeln!(out).map_err(GpsError::Io)?;
        out.flush().map_err(GpsError::Io)?;
        Ok(true)
    }
}
