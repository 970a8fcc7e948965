use gps_nmea_reader::gps::{ChecksumMode, NmeaReader, ReaderOptions, SentenceId};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

const RMC: &str = "$GPRMC,181611.863,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A";
const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47";

fn feed_bytes(reader: &mut NmeaReader, bytes: &[u8]) {
    for &b in bytes {
        reader.feed(b);
    }
}

fn feed_sentence(reader: &mut NmeaReader, sentence: &str) {
    feed_bytes(reader, sentence.as_bytes());
    reader.feed(0x0D);
}

#[test]
fn test_end_to_end_fix() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, RMC);

    let fix = reader.decode(0);
    assert!(fix.is_valid);
    assert!(!fix.was_read);
    assert_eq!((fix.rtc_hour, fix.rtc_minute, fix.rtc_second), (18, 16, 11));
    assert_eq!((fix.rtc_day, fix.rtc_month, fix.rtc_year), (23, 3, 94));
    assert_eq!(fix.latitude_degrees, 48);
    assert!((fix.latitude_minutes - 7.038).abs() < 1e-9);
    assert_eq!(fix.latitude_hemisphere, 'N');
    assert_eq!(fix.longitude_degrees, 11);
    assert!((fix.longitude_minutes - 31.0).abs() < 1e-9);
    assert_eq!(fix.longitude_hemisphere, 'E');
    assert!((fix.speed_over_ground - 22.4).abs() < 1e-9);
    assert!((fix.course - 84.4).abs() < 1e-9);
}

#[test]
fn test_decode_is_idempotent() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, RMC);

    let first = reader.decode(0);
    let second = reader.decode(0);
    assert_eq!(first, second);

    // A different offset does not re-decode the same sentence.
    let third = reader.decode(5);
    assert_eq!(first, third);
}

#[test]
fn test_fix_is_consumed_once_per_sentence() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, RMC);

    assert!(reader.decode(0).is_fresh());
    assert!(reader.acknowledge());
    assert!(reader.decode(0).was_read);
    assert!(!reader.acknowledge());
    assert!(reader.take_fresh(0).is_none());

    feed_sentence(&mut reader, RMC);
    let fix = reader.decode(0);
    assert!(fix.is_valid && !fix.was_read);
    assert_eq!(reader.stats().committed, 2);
}

#[test]
fn test_acknowledge_after_new_sentence_keeps_it() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, RMC);
    let first = reader.decode(0);
    assert!(first.is_fresh());
    assert_eq!(first.rtc_second, 11);

    // The consumer read the first fix, but the next sentence lands before
    // it acknowledges.
    feed_sentence(&mut reader, &RMC.replace("181611.863", "181612.863"));
    assert!(!reader.acknowledge());

    let second = reader.decode(0);
    assert!(second.is_fresh());
    assert_eq!(second.rtc_second, 12);
    assert!(reader.acknowledge());
}

#[test]
fn test_aborted_sentences_keep_published_buffers() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, RMC);
    feed_sentence(&mut reader, GGA);

    let fix_before = reader.decode(0);
    let rmc_before = reader.latest(SentenceId::Rmc);
    let gga_before = reader.latest(SentenceId::Gga);
    assert!(fix_before.is_fresh());
    assert!(rmc_before.is_some() && gga_before.is_some());

    // Truncated GPRMC cut short by the `$` of an over-long GPRMC
    feed_bytes(&mut reader, &RMC.as_bytes()[..7 + 20]);
    feed_sentence(&mut reader, &format!("$GPRMC,{}", "1".repeat(120)));
    // GPGGA with a raw line feed in its body
    feed_sentence(&mut reader, "$GPGGA,123520,4807.038\n,N*00");

    let stats = reader.stats();
    assert_eq!(stats.restarts, 1);
    assert_eq!(stats.overruns, 1);
    assert_eq!(stats.malformed, 1);
    assert_eq!(stats.committed, 2);

    assert_eq!(reader.latest(SentenceId::Rmc), rmc_before);
    assert_eq!(reader.latest(SentenceId::Gga), gga_before);
    assert_eq!(reader.decode(0), fix_before);
}

#[test]
fn test_other_sentence_types_leave_fix_alone() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, RMC);
    let before = reader.decode(0);
    let raw_before = reader.latest(SentenceId::Rmc);

    feed_sentence(&mut reader, GGA);
    feed_sentence(&mut reader, "$GPGSA,A,3,04,05,,09,12,,,24,,,,,2.5,1.3,2.1*39");

    assert_eq!(reader.decode(0), before);
    assert_eq!(reader.latest(SentenceId::Rmc), raw_before);
    assert!(reader.latest(SentenceId::Gga).is_some());
    assert!(reader.latest(SentenceId::Gsa).is_some());
}

#[test]
fn test_dollar_discards_partial_sentence() {
    let mut reader = NmeaReader::default();
    let header_and_body = RMC.as_bytes();
    // Header, comma, then 40 bytes of body
    feed_bytes(&mut reader, &header_and_body[..7 + 40]);
    feed_sentence(&mut reader, GGA);

    let fix = reader.decode(0);
    assert!(!fix.is_valid);
    assert!(reader.latest(SentenceId::Rmc).is_none());
    assert_eq!(reader.stats().restarts, 1);

    // Capture recovers for the next sentence.
    feed_sentence(&mut reader, RMC);
    assert!(reader.decode(0).is_valid);
}

#[test]
fn test_timezone_wraps_to_previous_day() {
    let mut reader = NmeaReader::default();
    feed_sentence(
        &mut reader,
        "$GPRMC,001500.000,A,4807.038,N,01131.000,E,0.0,0.0,030813,,,A*00",
    );

    let fix = reader.decode(5);
    assert!(fix.is_valid);
    assert_eq!(fix.rtc_hour, 19);
    assert_eq!(fix.rtc_minute, 15);
    assert_eq!((fix.rtc_day, fix.rtc_month, fix.rtc_year), (2, 8, 13));
}

#[test]
fn test_zero_coordinates_decode() {
    let mut reader = NmeaReader::default();
    feed_sentence(
        &mut reader,
        "$GPRMC,120000,A,0000.0000,N,00000.0000,E,0.0,0.0,010100,,*00",
    );

    let fix = reader.decode(0);
    assert!(fix.is_valid);
    assert_eq!(fix.latitude_degrees, 0);
    assert_eq!(fix.latitude_minutes, 0.0);
    assert_eq!(fix.longitude_degrees, 0);
    assert_eq!(fix.longitude_minutes, 0.0);
}

#[test]
fn test_unknown_sentence_is_ignored() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, "$GPZZZ,1,2,3*00");

    for id in SentenceId::ALL {
        assert!(reader.latest(id).is_none());
    }
    let fix = reader.decode(0);
    assert!(!fix.is_valid && !fix.was_read);
    assert_eq!(reader.stats().unrecognized, 1);

    feed_sentence(&mut reader, RMC);
    assert_eq!(reader.decode(0).rtc_hour, 18);
}

#[test]
fn test_void_status_clears_validity() {
    let mut reader = NmeaReader::default();
    feed_sentence(&mut reader, RMC);
    assert!(reader.decode(0).is_valid);

    feed_sentence(&mut reader, "$GPRMC,181612.000,V,,,,,,,230394,,*00");
    let fix = reader.decode(0);
    assert!(!fix.is_valid);
    // Previous field values stay in place.
    assert_eq!(fix.rtc_second, 11);
}

#[test]
fn test_oversized_sentence_is_dropped() {
    let mut reader = NmeaReader::default();
    let long = format!("$GPRMC,{}", "9".repeat(120));
    feed_sentence(&mut reader, &long);

    assert!(reader.latest(SentenceId::Rmc).is_none());
    assert_eq!(reader.stats().overruns, 1);

    feed_sentence(&mut reader, RMC);
    assert!(reader.decode(0).is_valid);
}

#[test]
fn test_required_checksum_rejects_corruption() {
    let mut reader = NmeaReader::new(ReaderOptions {
        checksum: ChecksumMode::Required,
    });
    feed_sentence(&mut reader, &RMC.replace("4807.038", "4807.039"));
    assert!(!reader.decode(0).is_valid);
    assert_eq!(reader.stats().checksum_failures, 1);

    feed_sentence(&mut reader, RMC);
    assert!(reader.decode(0).is_valid);
}

/// Bytes arrive on one thread while another polls, as with a receive
/// interrupt and a main loop
#[test]
fn test_concurrent_feed_and_poll() {
    const COUNT: u32 = 300;

    let (mut feeder, poller) = NmeaReader::default().split();
    let done = Arc::new(AtomicBool::new(false));

    let producer = {
        let done = Arc::clone(&done);
        std::thread::spawn(move || {
            for i in 0..COUNT {
                let (minute, second) = (i / 60, i % 60);
                // The latitude minutes mirror the seconds so torn fixes show up.
                let sentence = format!(
                    "$GPRMC,10{:02}{:02},A,48{:02}.000,N,01131.000,E,1.0,90.0,230394,,*00\r\n",
                    minute, second, second
                );
                feeder.feed_all(sentence.as_bytes());
                if i % 16 == 0 {
                    std::thread::yield_now();
                }
            }
            done.store(true, Ordering::Release);
        })
    };

    let mut last_seen: Option<(u8, u8)> = None;
    let mut fresh = 0;
    loop {
        let finished = done.load(Ordering::Acquire);
        if let Some(fix) = poller.take_fresh(0) {
            assert_eq!(fix.latitude_minutes, f64::from(fix.rtc_second));
            let stamp = (fix.rtc_minute, fix.rtc_second);
            if let Some(prev) = last_seen {
                assert!(stamp > prev, "{:?} after {:?}", stamp, prev);
            }
            last_seen = Some(stamp);
            fresh += 1;
        }
        if finished {
            break;
        }
    }
    producer.join().unwrap();

    // The final poll ran after the producer finished, so the last sentence
    // was decoded.
    let last = COUNT - 1;
    assert_eq!(last_seen, Some(((last / 60) as u8, (last % 60) as u8)));
    assert!(fresh >= 1);
    assert_eq!(poller.stats().committed, COUNT);
    assert_eq!(poller.stats().dropped(), 0);
}
