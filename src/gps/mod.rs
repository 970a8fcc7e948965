// src/gps/mod.rs
//! NMEA sentence capture and GPRMC fix decoding

pub mod capture;
pub mod checksum;
pub mod decode;
pub mod field;
pub mod fix;
pub mod geodesy;
pub mod mailbox;
pub mod reader;
pub mod sentence;

pub use checksum::ChecksumMode;
pub use fix::{GpggaFix, GprmcFix};
pub use mailbox::CaptureStats;
pub use reader::{ByteFeeder, FixPoller, NmeaReader, ReaderOptions};
pub use sentence::{RawSentence, SentenceId};
