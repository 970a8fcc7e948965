// src/gps/sentence.rs
//! Tracked sentence types and their fixed-capacity raw buffers

use std::fmt;

/// Maximum length of an NMEA 0183 sentence, `$` through `<CR><LF>`
pub const SENTENCE_CAPACITY: usize = 82;

/// Marker stored in place of every `,` between two fields
pub const FIELD_SEPARATOR: u8 = b'\n';

/// Marker stored when the sentence terminator has been received
pub const SENTENCE_END: u8 = b'\r';

/// Length of a sentence header, `$` plus the five identifier characters
pub const HEADER_LEN: usize = 6;

/// Room left for the stored body once the header, its `,` and the trailing
/// `<LF>` are taken out of a maximum-length sentence
pub const BODY_CAPACITY: usize = SENTENCE_CAPACITY - HEADER_LEN - 2;

/// Sentence types the reader keeps a buffer for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentenceId {
    Gga,
    Gsa,
    Rmc,
}

impl SentenceId {
    /// Every tracked type, in buffer order
    pub const ALL: [SentenceId; 3] = [SentenceId::Gga, SentenceId::Gsa, SentenceId::Rmc];

    pub const COUNT: usize = Self::ALL.len();

    /// The literal header used to recognize this sentence
    pub const fn prefix(self) -> &'static [u8; HEADER_LEN] {
        match self {
            SentenceId::Gga => b"$GPGGA",
            SentenceId::Gsa => b"$GPGSA",
            SentenceId::Rmc => b"$GPRMC",
        }
    }

    /// Slot of this type in per-type arrays
    pub const fn index(self) -> usize {
        match self {
            SentenceId::Gga => 0,
            SentenceId::Gsa => 1,
            SentenceId::Rmc => 2,
        }
    }
}

impl fmt::Display for SentenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The prefix is pure ASCII.
        let name = std::str::from_utf8(&self.prefix()[1..]).unwrap_or("?");
        f.write_str(name)
    }
}

/// A write would have gone past [`SENTENCE_CAPACITY`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overrun;

/// Body of one received sentence, fields split by [`FIELD_SEPARATOR`]
///
/// The header (`$GPRMC,`) is not stored. A completed sentence ends with
/// [`SENTENCE_END`]; any `*hh` checksum suffix stays inside the last field
/// and is stripped by [`RawSentence::field`].
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawSentence {
    bytes: [u8; SENTENCE_CAPACITY],
    len: usize,
}

impl RawSentence {
    pub const fn new() -> Self {
        Self {
            bytes: [0; SENTENCE_CAPACITY],
            len: 0,
        }
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Append one byte, refusing to go past the buffer
    pub fn push(&mut self, byte: u8) -> Result<(), Overrun> {
        let slot = self.bytes.get_mut(self.len).ok_or(Overrun)?;
        *slot = byte;
        self.len += 1;
        Ok(())
    }

    /// Whether the terminator has been stored
    pub fn is_complete(&self) -> bool {
        self.as_bytes().last() == Some(&SENTENCE_END)
    }

    /// Body bytes without the terminator and without the checksum suffix
    fn payload(&self) -> &[u8] {
        let body = match self.as_bytes().split_last() {
            Some((&SENTENCE_END, rest)) => rest,
            _ => self.as_bytes(),
        };
        match body.iter().position(|&b| b == b'*') {
            Some(star) => &body[..star],
            None => body,
        }
    }

    /// Iterate the body fields, first field after the identifier first
    pub fn fields(&self) -> impl Iterator<Item = &[u8]> {
        self.payload().split(|&b| b == FIELD_SEPARATOR)
    }

    /// Bytes of body field `index`, `None` if the sentence is shorter
    pub fn field(&self, index: usize) -> Option<&[u8]> {
        self.fields().nth(index)
    }

    /// Number of body fields
    pub fn field_count(&self) -> usize {
        self.fields().count()
    }

    /// The sentence rendered back into its comma-separated wire form
    pub fn to_wire_string(&self, id: SentenceId) -> String {
        let mut line = String::with_capacity(HEADER_LEN + 1 + self.len);
        line.push_str(&String::from_utf8_lossy(id.prefix()));
        line.push(',');
        for &b in self.as_bytes() {
            match b {
                FIELD_SEPARATOR => line.push(','),
                SENTENCE_END => {}
                other => line.push(other as char),
            }
        }
        line
    }
}

impl Default for RawSentence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RawSentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawSentence")
            .field("bytes", &String::from_utf8_lossy(self.as_bytes()))
            .field("complete", &self.is_complete())
            .finish()
    }
}
