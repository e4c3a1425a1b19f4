//! Tests for bit-level channels.

use std::fs;
use std::io::SeekFrom;

use page_stream::{BitChannel, Channel, Options};
use tempfile::TempDir;

#[test]
fn test_four_bits_padded_to_word() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("four.bits");

    let mut bits = BitChannel::open(&path, "w").expect("open for writing");
    for bit in [true, false, true, true] {
        assert!(!bits.write_bit(bit).expect("write bit"));
    }
    bits.close().expect("close");

    assert_eq!(
        fs::read(&path).expect("read file"),
        [0xB0, 0, 0, 0, 0, 0, 0, 0]
    );

    let mut bits = BitChannel::open(&path, "r").expect("open for reading");
    for expected in [true, false, true, true] {
        assert_eq!(bits.read_bit().expect("read bit"), Some(expected));
    }
    for _ in 0..60 {
        assert_eq!(bits.read_bit().expect("read padding"), Some(false));
    }
    assert_eq!(bits.read_bit().expect("read past end"), None);
}

#[test]
fn test_word_completes_on_sixty_fourth_bit() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("word.bits");

    let mut bits = BitChannel::open(&path, "w").expect("open");
    for _ in 0..63 {
        assert!(!bits.write_bit(true).expect("write bit"));
    }
    assert!(bits.write_bit(true).expect("write bit"));
    assert_eq!(bits.channel().tell(), 8);
    bits.close().expect("close");

    assert_eq!(fs::read(&path).expect("read file"), [0xFF; 8]);
}

#[test]
fn test_write_bits_is_big_endian() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("beef.bits");

    let mut bits = BitChannel::open(&path, "w").expect("open");
    assert_eq!(bits.write_bits(0xDEAD_BEEF, 32).expect("write bits"), 0);
    assert_eq!(bits.write_bits(0xDEAD_BEEF, 32).expect("write bits"), 1);
    bits.close().expect("close");

    assert_eq!(
        fs::read(&path).expect("read file"),
        [0xDE, 0xAD, 0xBE, 0xEF, 0xDE, 0xAD, 0xBE, 0xEF]
    );
}

#[test]
fn test_many_words_round_trip() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("many.bits");
    let options = Options::default().with_page_size(16).with_alloc_size(64);
    let pattern = |index: usize| index % 3 == 0 || index % 7 == 1;

    let mut bits = BitChannel::with_options(&path, "w", options).expect("open");
    for index in 0..1000 {
        bits.write_bit(pattern(index)).expect("write bit");
    }
    bits.close().expect("close");
    assert_eq!(fs::metadata(&path).expect("stat").len(), 128);

    let mut bits = BitChannel::with_options(&path, "r", options).expect("open");
    for index in 0..1000 {
        assert_eq!(
            bits.read_bit().expect("read bit"),
            Some(pattern(index)),
            "bit {index}"
        );
    }
    assert_eq!(bits.read_bits(24).expect("read padding"), Some(0));
    assert_eq!(bits.read_bit().expect("read past end"), None);
}

#[test]
fn test_short_trailing_word_reads_as_padded() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("short.bits");
    fs::write(&path, [0xFF, 0x00, 0x80]).expect("write file");

    let mut bits = BitChannel::open(&path, "r").expect("open");
    assert_eq!(bits.read_bits(24).expect("read bits"), Some(0x00FF_0080));
    assert_eq!(bits.read_bits(40).expect("read padding"), Some(0));
    assert_eq!(bits.read_bit().expect("read past end"), None);
}

#[test]
fn test_read_bits_past_end() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("one_word.bits");
    fs::write(&path, 0x0123_4567_89AB_CDEF_u64.to_be_bytes()).expect("write file");

    let mut bits = BitChannel::open(&path, "r").expect("open");
    assert_eq!(bits.read_bits(8).expect("read bits"), Some(0x01));
    assert_eq!(bits.read_bits(56).expect("read bits"), Some(0x23_4567_89AB_CDEF));
    assert_eq!(bits.read_bits(1).expect("read past end"), None);
}

#[test]
fn test_bits_from_positioned_channel() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("offset.bits");
    let mut bytes = vec![0; 8];
    bytes.extend_from_slice(&[0xA5; 8]);
    fs::write(&path, &bytes).expect("write file");

    let mut channel = Channel::open(&path, "r").expect("open");
    channel.seek(SeekFrom::Start(8)).expect("seek");

    let mut bits = BitChannel::new(channel);
    assert_eq!(bits.read_bits(8).expect("read bits"), Some(0xA5));
}

#[test]
fn test_drop_pads_partial_word() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("dropped.bits");

    {
        let mut bits = BitChannel::open(&path, "w").expect("open");
        bits.write_bits(0b101, 3).expect("write bits");
    }

    assert_eq!(
        fs::read(&path).expect("read file"),
        [0xA0, 0, 0, 0, 0, 0, 0, 0]
    );
}

#[test]
fn test_close_twice_is_harmless() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("twice.bits");

    let mut bits = BitChannel::open(&path, "w").expect("open");
    bits.write_bit(true).expect("write bit");
    bits.close().expect("first close");
    bits.close().expect("second close");

    assert!(bits.channel().is_closed());
    assert_eq!(fs::metadata(&path).expect("stat").len(), 8);
}

#[test]
fn test_empty_stream_writes_nothing() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("empty.bits");

    let mut bits = BitChannel::open(&path, "w").expect("open");
    bits.close().expect("close");

    assert_eq!(fs::metadata(&path).expect("stat").len(), 0);
}
