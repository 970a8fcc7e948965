// src/gps/capture.rs
//! Byte-at-a-time NMEA sentence capture
//!
//! [`SentenceCapture::feed`] runs in the receive path, so it never allocates
//! and does a bounded amount of work per byte.

use super::{
    checksum::{ChecksumMode, NmeaChecksum},
    sentence::{
        Overrun, RawSentence, SentenceId, BODY_CAPACITY, FIELD_SEPARATOR, HEADER_LEN,
        SENTENCE_END,
    },
};
use std::fmt;

const START: u8 = b'$';
const SEPARATOR: u8 = b',';
const TERMINATOR: u8 = 0x0D;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    /// `pos` bytes of the header, `$` included, have been received
    Header { pos: usize },
    Body { id: SentenceId },
}

/// Why a sentence in progress was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// A `$` arrived before the terminator
    Restarted,
    /// Well-formed header naming a type that is not tracked
    Unrecognized,
    /// No `,` after the identifier, or a terminator inside the header
    MalformedHeader,
    /// A raw line feed inside the body
    MalformedBody,
    /// The sentence did not fit its buffer
    Overrun,
    /// Checksum missing or wrong while checksums are required
    ChecksumMismatch,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            AbortReason::Restarted => "restarted by '$'",
            AbortReason::Unrecognized => "unrecognized sentence type",
            AbortReason::MalformedHeader => "malformed header",
            AbortReason::MalformedBody => "malformed body",
            AbortReason::Overrun => "buffer overrun",
            AbortReason::ChecksumMismatch => "checksum mismatch",
        };
        f.write_str(text)
    }
}

/// Outcome of a byte that ended a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureEvent {
    /// The sentence is complete; [`SentenceCapture::completed`] holds it
    Completed(SentenceId),
    Aborted(AbortReason),
}

/// Capture state for the one sentence that can be in progress
pub struct SentenceCapture {
    phase: Phase,
    match_counts: [u8; SentenceId::COUNT],
    field_index: usize,
    field_pos: usize,
    work: RawSentence,
    checksum: NmeaChecksum,
    mode: ChecksumMode,
}

impl SentenceCapture {
    pub fn new(mode: ChecksumMode) -> Self {
        Self {
            phase: Phase::Idle,
            match_counts: [0; SentenceId::COUNT],
            field_index: 0,
            field_pos: 0,
            work: RawSentence::new(),
            checksum: NmeaChecksum::new(),
            mode,
        }
    }

    pub fn checksum_mode(&self) -> ChecksumMode {
        self.mode
    }

    /// Whether a sentence is being received
    pub fn in_progress(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// Field and byte-within-field of the next body byte
    pub fn position(&self) -> (usize, usize) {
        (self.field_index, self.field_pos)
    }

    /// The last sentence reported as [`CaptureEvent::Completed`]
    ///
    /// Only meaningful until the next call to [`SentenceCapture::feed`].
    pub fn completed(&self) -> &RawSentence {
        &self.work
    }

    /// Process one received byte
    pub fn feed(&mut self, byte: u8) -> Option<CaptureEvent> {
        if byte == START {
            let interrupted = self.in_progress();
            self.restart();
            return interrupted.then_some(CaptureEvent::Aborted(AbortReason::Restarted));
        }

        match self.phase {
            Phase::Idle => None,
            Phase::Header { pos } => self.header_byte(pos, byte),
            Phase::Body { id } => self.body_byte(id, byte),
        }
    }

    fn restart(&mut self) {
        self.phase = Phase::Header { pos: 1 };
        self.match_counts = [0; SentenceId::COUNT];
        self.field_index = 0;
        self.field_pos = 0;
        self.work.clear();
        self.checksum = NmeaChecksum::new();
    }

    fn abort(&mut self, reason: AbortReason) -> Option<CaptureEvent> {
        self.phase = Phase::Idle;
        self.work.clear();
        Some(CaptureEvent::Aborted(reason))
    }

    fn header_byte(&mut self, pos: usize, byte: u8) -> Option<CaptureEvent> {
        self.checksum.update(byte);

        if pos < HEADER_LEN {
            if byte == TERMINATOR {
                return self.abort(AbortReason::MalformedHeader);
            }
            // A counter only advances while every earlier character matched.
            for id in SentenceId::ALL {
                let count = &mut self.match_counts[id.index()];
                if usize::from(*count) == pos - 1 && id.prefix()[pos] == byte {
                    *count += 1;
                }
            }
            self.phase = Phase::Header { pos: pos + 1 };
            return None;
        }

        if byte != SEPARATOR {
            return self.abort(AbortReason::MalformedHeader);
        }

        let mut confirmed = SentenceId::ALL
            .into_iter()
            .filter(|id| usize::from(self.match_counts[id.index()]) == HEADER_LEN - 1);
        match (confirmed.next(), confirmed.next()) {
            (Some(id), None) => {
                self.phase = Phase::Body { id };
                None
            }
            (None, _) => self.abort(AbortReason::Unrecognized),
            (Some(_), Some(_)) => self.abort(AbortReason::MalformedHeader),
        }
    }

    fn body_byte(&mut self, id: SentenceId, byte: u8) -> Option<CaptureEvent> {
        match byte {
            TERMINATOR => {
                if self.store(SENTENCE_END).is_err() {
                    return self.abort(AbortReason::Overrun);
                }
                if self.mode == ChecksumMode::Required && !self.checksum.matches() {
                    return self.abort(AbortReason::ChecksumMismatch);
                }
                self.phase = Phase::Idle;
                Some(CaptureEvent::Completed(id))
            }
            SEPARATOR => {
                self.checksum.update(byte);
                if self.store(FIELD_SEPARATOR).is_err() {
                    return self.abort(AbortReason::Overrun);
                }
                self.field_index += 1;
                self.field_pos = 0;
                None
            }
            FIELD_SEPARATOR => self.abort(AbortReason::MalformedBody),
            _ => {
                self.checksum.update(byte);
                if self.store(byte).is_err() {
                    return self.abort(AbortReason::Overrun);
                }
                self.field_pos += 1;
                None
            }
        }
    }

    fn store(&mut self, byte: u8) -> Result<(), Overrun> {
        if self.work.len() >= BODY_CAPACITY {
            return Err(Overrun);
        }
        self.work.push(byte)
    }
}

impl Default for SentenceCapture {
    fn default() -> Self {
        Self::new(ChecksumMode::Ignore)
    }
}
