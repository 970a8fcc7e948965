// src/gps/mailbox.rs
//! Hand-off between the byte feeder and the polling loop
//!
//! The feeder owns its capture buffer outright and only enters a critical
//! section to copy a finished sentence into its published slot. The poller
//! enters one to take a copy of a pending GPRMC sentence, to commit the
//! decoded fix, and to acknowledge it. Decoding runs outside, so a sentence
//! completed mid-decode can never be observed half written.

use super::{
    capture::AbortReason,
    decode::{DecodeError, RmcDecode},
    fix::GprmcFix,
    sentence::{RawSentence, SentenceId},
};
use critical_section::Mutex;
use serde::Serialize;
use std::{
    cell::RefCell,
    sync::atomic::{AtomicU32, Ordering},
};

struct Published {
    sentences: [RawSentence; SentenceId::COUNT],
    /// A GPRMC sentence arrived that has not been decoded yet
    rmc_pending: bool,
    /// Bumped on every published GPRMC sentence
    rmc_generation: u32,
    fix: GprmcFix,
}

/// Snapshot of the diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CaptureStats {
    pub committed: u32,
    pub unrecognized: u32,
    pub malformed: u32,
    pub overruns: u32,
    pub checksum_failures: u32,
    pub restarts: u32,
    pub decode_failures: u32,
}

impl CaptureStats {
    /// Sentences dropped for any reason other than being an untracked type
    pub fn dropped(&self) -> u32 {
        self.malformed + self.overruns + self.checksum_failures + self.restarts
    }
}

struct Counters {
    committed: AtomicU32,
    unrecognized: AtomicU32,
    malformed: AtomicU32,
    overruns: AtomicU32,
    checksum_failures: AtomicU32,
    restarts: AtomicU32,
    decode_failures: AtomicU32,
}

impl Counters {
    const fn new() -> Self {
        Self {
            committed: AtomicU32::new(0),
            unrecognized: AtomicU32::new(0),
            malformed: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
            checksum_failures: AtomicU32::new(0),
            restarts: AtomicU32::new(0),
            decode_failures: AtomicU32::new(0),
        }
    }
}

fn bump(counter: &AtomicU32) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Published sentences, the single shared fix, and diagnostic counters
pub struct Mailbox {
    published: Mutex<RefCell<Published>>,
    counters: Counters,
}

impl Mailbox {
    pub const fn new() -> Self {
        Self {
            published: Mutex::new(RefCell::new(Published {
                sentences: [RawSentence::new(), RawSentence::new(), RawSentence::new()],
                rmc_pending: false,
                rmc_generation: 0,
                fix: GprmcFix::new(),
            })),
            counters: Counters::new(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Published) -> R) -> R {
        critical_section::with(|cs| f(&mut self.published.borrow_ref_mut(cs)))
    }

    /// Producer side: make a completed sentence visible to the poller
    ///
    /// A new GPRMC sentence resets the fix flags to "nothing to read" until
    /// it has been decoded.
    pub(crate) fn publish(&self, id: SentenceId, raw: &RawSentence) {
        self.with(|p| {
            p.sentences[id.index()] = *raw;
            if id == SentenceId::Rmc {
                p.rmc_pending = true;
                p.rmc_generation = p.rmc_generation.wrapping_add(1);
                p.fix.is_valid = false;
                p.fix.was_read = false;
            }
        });
        bump(&self.counters.committed);
    }

    pub(crate) fn record_abort(&self, reason: AbortReason) {
        let counter = match reason {
            AbortReason::Restarted => &self.counters.restarts,
            AbortReason::Unrecognized => &self.counters.unrecognized,
            AbortReason::MalformedHeader | AbortReason::MalformedBody => &self.counters.malformed,
            AbortReason::Overrun => &self.counters.overruns,
            AbortReason::ChecksumMismatch => &self.counters.checksum_failures,
        };
        bump(counter);
    }

    /// Consumer side: copy out the GPRMC sentence awaiting decode, if any
    ///
    /// Nothing is returned once the current fix has been acknowledged.
    pub(crate) fn take_pending_rmc(&self) -> Option<(u32, RawSentence)> {
        self.with(|p| {
            if !p.rmc_pending || p.fix.was_read {
                return None;
            }
            p.rmc_pending = false;
            Some((p.rmc_generation, p.sentences[SentenceId::Rmc.index()]))
        })
    }

    /// Consumer side: store a decode result unless a newer sentence arrived
    pub(crate) fn commit(&self, generation: u32, outcome: &Result<RmcDecode, DecodeError>) -> bool {
        if outcome.is_err() {
            bump(&self.counters.decode_failures);
        }
        self.with(|p| {
            if p.rmc_generation != generation {
                return false;
            }
            match outcome {
                Ok(RmcDecode::Valid(decoded)) => {
                    p.fix.set_fields(decoded);
                    p.fix.is_valid = true;
                    p.fix.was_read = false;
                }
                Ok(RmcDecode::NoFix) | Err(_) => {
                    p.fix.is_valid = false;
                    p.fix.was_read = false;
                }
            }
            true
        })
    }

    /// Copy of the shared fix
    pub fn fix(&self) -> GprmcFix {
        self.with(|p| p.fix)
    }

    /// Mark the current fix as consumed; returns whether it was fresh
    ///
    /// Does nothing unless the slot holds a fresh fix, so an acknowledge
    /// that races a newly published GPRMC sentence cannot hide it.
    pub fn acknowledge(&self) -> bool {
        self.with(|p| {
            let fresh = p.fix.is_fresh();
            if fresh {
                p.fix.was_read = true;
            }
            fresh
        })
    }

    /// Check-and-acknowledge in one step
    pub fn take_fresh(&self) -> Option<GprmcFix> {
        self.with(|p| {
            if !p.fix.is_fresh() {
                return None;
            }
            let fix = p.fix;
            p.fix.was_read = true;
            Some(fix)
        })
    }

    /// Most recent complete sentence of a type
    pub fn latest(&self, id: SentenceId) -> Option<RawSentence> {
        self.with(|p| {
            let raw = p.sentences[id.index()];
            raw.is_complete().then_some(raw)
        })
    }

    pub fn stats(&self) -> CaptureStats {
        let load = |c: &AtomicU32| c.load(Ordering::Relaxed);
        CaptureStats {
            committed: load(&self.counters.committed),
            unrecognized: load(&self.counters.unrecognized),
            malformed: load(&self.counters.malformed),
            overruns: load(&self.counters.overruns),
            checksum_failures: load(&self.counters.checksum_failures),
            restarts: load(&self.counters.restarts),
            decode_failures: load(&self.counters.decode_failures),
        }
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gps::sentence::SENTENCE_END;

    fn complete(body: &[u8]) -> RawSentence {
        let mut raw = RawSentence::new();
        for &b in body {
            raw.push(b).unwrap();
        }
        raw.push(SENTENCE_END).unwrap();
        raw
    }

    fn decoded() -> Result<RmcDecode, DecodeError> {
        let mut fix = GprmcFix::new();
        fix.rtc_hour = 12;
        fix.is_valid = true;
        Ok(RmcDecode::Valid(fix))
    }

    #[test]
    fn test_publish_resets_flags() {
        let mailbox = Mailbox::new();
        mailbox.publish(SentenceId::Rmc, &complete(b"x"));
        let (generation, _) = mailbox.take_pending_rmc().unwrap();
        assert!(mailbox.commit(generation, &decoded()));
        assert!(mailbox.fix().is_fresh());

        mailbox.publish(SentenceId::Rmc, &complete(b"y"));
        let fix = mailbox.fix();
        assert!(!fix.is_valid);
        assert!(!fix.was_read);
        assert_eq!(fix.rtc_hour, 12);
    }

    #[test]
    fn test_pending_taken_once() {
        let mailbox = Mailbox::new();
        assert!(mailbox.take_pending_rmc().is_none());
        mailbox.publish(SentenceId::Rmc, &complete(b"x"));
        assert!(mailbox.take_pending_rmc().is_some());
        assert!(mailbox.take_pending_rmc().is_none());
    }

    #[test]
    fn test_stale_commit_is_discarded() {
        let mailbox = Mailbox::new();
        mailbox.publish(SentenceId::Rmc, &complete(b"old"));
        let (generation, _) = mailbox.take_pending_rmc().unwrap();

        // A newer sentence lands while the old one is being decoded.
        mailbox.publish(SentenceId::Rmc, &complete(b"new"));
        assert!(!mailbox.commit(generation, &decoded()));
        assert!(!mailbox.fix().is_valid);

        let (generation, raw) = mailbox.take_pending_rmc().unwrap();
        assert_eq!(raw.field(0), Some(&b"new"[..]));
        assert!(mailbox.commit(generation, &decoded()));
        assert!(mailbox.fix().is_fresh());
    }

    #[test]
    fn test_take_fresh_acknowledges() {
        let mailbox = Mailbox::new();
        mailbox.publish(SentenceId::Rmc, &complete(b"x"));
        let (generation, _) = mailbox.take_pending_rmc().unwrap();
        mailbox.commit(generation, &decoded());

        assert_eq!(mailbox.take_fresh().map(|f| f.rtc_hour), Some(12));
        assert!(mailbox.take_fresh().is_none());
        assert!(mailbox.fix().was_read);
        assert!(!mailbox.acknowledge());
    }

    #[test]
    fn test_late_acknowledge_keeps_new_sentence() {
        let mailbox = Mailbox::new();
        mailbox.publish(SentenceId::Rmc, &complete(b"a"));
        let (generation, _) = mailbox.take_pending_rmc().unwrap();
        mailbox.commit(generation, &decoded());

        // The next sentence lands before the consumer acknowledges the first.
        mailbox.publish(SentenceId::Rmc, &complete(b"b"));
        assert!(!mailbox.acknowledge());
        assert!(!mailbox.fix().was_read);

        let (_, raw) = mailbox.take_pending_rmc().unwrap();
        assert_eq!(raw.field(0), Some(&b"b"[..]));
    }

    #[test]
    fn test_other_types_leave_fix_alone() {
        let mailbox = Mailbox::new();
        mailbox.publish(SentenceId::Gga, &complete(b"1"));
        assert!(mailbox.take_pending_rmc().is_none());
        assert!(mailbox.latest(SentenceId::Gga).is_some());
        assert!(mailbox.latest(SentenceId::Gsa).is_none());
        assert_eq!(mailbox.stats().committed, 1);
    }

    #[test]
    fn test_counters() {
        let mailbox = Mailbox::new();
        mailbox.record_abort(AbortReason::Overrun);
        mailbox.record_abort(AbortReason::Unrecognized);
        mailbox.record_abort(AbortReason::MalformedBody);
        let generation = 0;
        mailbox.commit(generation, &Err(DecodeError::InvalidDate));

        let stats = mailbox.stats();
        assert_eq!(stats.overruns, 1);
        assert_eq!(stats.unrecognized, 1);
        assert_eq!(stats.malformed, 1);
        assert_eq!(stats.decode_failures, 1);
        assert_eq!(stats.dropped(), 2);
    }
}
