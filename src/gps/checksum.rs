// src/gps/checksum.rs
//! NMEA `*hh` checksum tracking

use serde::{Deserialize, Serialize};

/// Whether completed sentences must carry a matching `*hh` suffix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumMode {
    /// Accept sentences regardless of their checksum
    #[default]
    Ignore,
    /// Drop sentences whose checksum is missing or wrong
    Required,
}

impl std::str::FromStr for ChecksumMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ignore" => Ok(ChecksumMode::Ignore),
            "required" => Ok(ChecksumMode::Required),
            other => Err(format!("unknown checksum mode '{}'", other)),
        }
    }
}

/// Running checksum of one sentence, fed every byte after the `$`
///
/// Bytes up to the `*` are XORed together; the two hex digits after it are
/// collected as the transmitted value.
#[derive(Debug, Clone, Copy, Default)]
pub struct NmeaChecksum {
    computed: u8,
    in_suffix: bool,
    transmitted: u8,
    digits: u8,
    malformed: bool,
}

impl NmeaChecksum {
    pub const fn new() -> Self {
        Self {
            computed: 0,
            in_suffix: false,
            transmitted: 0,
            digits: 0,
            malformed: false,
        }
    }

    pub fn update(&mut self, byte: u8) {
        if !self.in_suffix {
            if byte == b'*' {
                self.in_suffix = true;
            } else {
                self.computed ^= byte;
            }
            return;
        }

        match hex_value(byte) {
            Some(nibble) if self.digits < 2 => {
                self.transmitted = (self.transmitted << 4) | nibble;
                self.digits += 1;
            }
            _ => self.malformed = true,
        }
    }

    /// XOR of the bytes seen so far, excluding the suffix
    pub fn computed(&self) -> u8 {
        self.computed
    }

    /// The transmitted value, once exactly two hex digits followed the `*`
    pub fn transmitted(&self) -> Option<u8> {
        if self.in_suffix && self.digits == 2 && !self.malformed {
            Some(self.transmitted)
        } else {
            None
        }
    }

    pub fn matches(&self) -> bool {
        self.transmitted() == Some(self.computed)
    }
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        _ => None,
    }
}

/// Checksum of a full `$...*hh` line, used to build test and replay data
pub fn checksum_of(sentence: &str) -> u8 {
    let body = sentence.strip_prefix('$').unwrap_or(sentence);
    let body = body.split('*').next().unwrap_or(body);
    body.bytes().fold(0, |acc, b| acc ^ b)
}
