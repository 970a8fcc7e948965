// src/gps/reader.rs
//! The NMEA reader: a byte feeder for the receive path and a fix poller
//! for the application loop

use super::{
    capture::{CaptureEvent, SentenceCapture},
    checksum::ChecksumMode,
    decode::{decode_gpgga, decode_gprmc, RmcDecode},
    fix::{GpggaFix, GprmcFix},
    mailbox::{CaptureStats, Mailbox},
    sentence::{RawSentence, SentenceId},
};
use log::{debug, trace};
use std::sync::Arc;

/// Reader construction options
#[derive(Debug, Clone, Copy, Default)]
pub struct ReaderOptions {
    pub checksum: ChecksumMode,
}

/// Producer half, driven once per received byte
///
/// Owns the capture state, so only one feeder exists per reader. Move it
/// into whatever context receives bytes.
pub struct ByteFeeder {
    capture: SentenceCapture,
    mailbox: Arc<Mailbox>,
}

impl ByteFeeder {
    /// Feed one received byte; never blocks beyond a short critical section
    /// when a sentence completes
    pub fn feed(&mut self, byte: u8) {
        match self.capture.feed(byte) {
            Some(CaptureEvent::Completed(id)) => {
                trace!("captured {} ({} bytes)", id, self.capture.completed().len());
                self.mailbox.publish(id, self.capture.completed());
            }
            Some(CaptureEvent::Aborted(reason)) => {
                trace!("sentence dropped: {}", reason);
                self.mailbox.record_abort(reason);
            }
            None => {}
        }
    }

    pub fn feed_all(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.feed(b);
        }
    }
}

/// Consumer half, polled from the application loop
#[derive(Clone)]
pub struct FixPoller {
    mailbox: Arc<Mailbox>,
}

impl FixPoller {
    /// Decode the pending GPRMC sentence, if any, and return the shared fix
    ///
    /// Repeated calls without a new sentence in between return the same
    /// fix without decoding again.
    pub fn decode(&self, timezone_offset_hours: i8) -> GprmcFix {
        if let Some((generation, raw)) = self.mailbox.take_pending_rmc() {
            let outcome = decode_gprmc(&raw, timezone_offset_hours);
            match &outcome {
                Ok(RmcDecode::Valid(fix)) => {
                    debug!("GPRMC fix {} {}", fix.format_date(), fix.format_time())
                }
                Ok(RmcDecode::NoFix) => debug!("GPRMC reports no fix"),
                Err(e) => debug!("GPRMC decode failed: {}", e),
            }
            if !self.mailbox.commit(generation, &outcome) {
                debug!("GPRMC decode superseded by a newer sentence");
            }
        }
        self.mailbox.fix()
    }

    /// Mark the current fix as consumed, releasing the slot
    ///
    /// Returns whether the fix was fresh when acknowledged.
    pub fn acknowledge(&self) -> bool {
        self.mailbox.acknowledge()
    }

    /// Decode, then return and acknowledge the fix if it is fresh
    pub fn take_fresh(&self, timezone_offset_hours: i8) -> Option<GprmcFix> {
        self.decode(timezone_offset_hours);
        self.mailbox.take_fresh()
    }

    /// Copy of the shared fix without decoding
    pub fn fix(&self) -> GprmcFix {
        self.mailbox.fix()
    }

    /// Most recent complete sentence of a tracked type
    pub fn latest(&self, id: SentenceId) -> Option<RawSentence> {
        self.mailbox.latest(id)
    }

    /// Quality fields of the most recent GPGGA sentence
    pub fn gga(&self) -> Option<GpggaFix> {
        let raw = self.latest(SentenceId::Gga)?;
        decode_gpgga(&raw)
            .map_err(|e| debug!("GPGGA decode failed: {}", e))
            .ok()
    }

    pub fn stats(&self) -> CaptureStats {
        self.mailbox.stats()
    }
}

/// Single-owner reader, for when feeding and polling happen in one place
///
/// [`NmeaReader::split`] hands the two halves to separate contexts.
pub struct NmeaReader {
    feeder: ByteFeeder,
    poller: FixPoller,
}

impl NmeaReader {
    pub fn new(options: ReaderOptions) -> Self {
        let mailbox = Arc::new(Mailbox::new());
        Self {
            feeder: ByteFeeder {
                capture: SentenceCapture::new(options.checksum),
                mailbox: Arc::clone(&mailbox),
            },
            poller: FixPoller { mailbox },
        }
    }

    pub fn split(self) -> (ByteFeeder, FixPoller) {
        (self.feeder, self.poller)
    }

    /// Another handle on the consumer side
    pub fn poller(&self) -> FixPoller {
        self.poller.clone()
    }

    pub fn feed(&mut self, byte: u8) {
        self.feeder.feed(byte);
    }

    pub fn feed_all(&mut self, bytes: &[u8]) {
        self.feeder.feed_all(bytes);
    }

    pub fn decode(&self, timezone_offset_hours: i8) -> GprmcFix {
        self.poller.decode(timezone_offset_hours)
    }

    pub fn acknowledge(&self) -> bool {
        self.poller.acknowledge()
    }

    pub fn take_fresh(&self, timezone_offset_hours: i8) -> Option<GprmcFix> {
        self.poller.take_fresh(timezone_offset_hours)
    }

    pub fn latest(&self, id: SentenceId) -> Option<RawSentence> {
        self.poller.latest(id)
    }

    pub fn gga(&self) -> Option<GpggaFix> {
        self.poller.gga()
    }

    pub fn stats(&self) -> CaptureStats {
        self.poller.stats()
    }
}

impl Default for NmeaReader {
    fn default() -> Self {
        Self::new(ReaderOptions::default())
    }
}
