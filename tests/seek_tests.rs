//! Tests for seek, rewind and tell.

use std::fs::{self, OpenOptions};
use std::io::{SeekFrom, Write};
use std::path::PathBuf;

use fake::{Fake, Faker};
use page_stream::{Channel, Error, Options};
use tempfile::TempDir;

fn small_options() -> Options {
    Options::default().with_page_size(16).with_alloc_size(64)
}

fn fixture(dir: &TempDir, len: usize) -> (PathBuf, Vec<u8>) {
    let path = dir.path().join("fixture.bin");
    let data: Vec<u8> = (0..len).map(|_| Faker.fake::<u8>()).collect();
    fs::write(&path, &data).expect("write fixture");
    (path, data)
}

#[test]
fn test_seek_within_window_skips_refill() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 100);

    let mut channel = Channel::open(&path, "r").expect("open");
    channel.read(10).expect("read").expect("data");
    assert_eq!(channel.stats().refills, 1);

    assert_eq!(channel.seek(SeekFrom::Start(3)).expect("seek"), 3);
    assert_eq!(channel.read(2).expect("read"), Some(&data[3..5]));
    assert_eq!(channel.stats().refills, 1);
    assert_eq!(channel.stats().seeks, 1);
}

#[test]
fn test_seek_to_aligned_target_defers_refill() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 200);

    let mut channel = Channel::with_options(&path, "r", small_options()).expect("open");
    channel.seek(SeekFrom::Start(32)).expect("seek");
    assert_eq!(channel.anchor(), 32);
    assert_eq!(channel.tell(), 32);
    assert_eq!(channel.stats().refills, 0);

    assert_eq!(channel.read(4).expect("read"), Some(&data[32..36]));
}

#[test]
fn test_seek_to_unaligned_target_loads_page() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 200);

    let mut channel = Channel::with_options(&path, "r", small_options()).expect("open");
    channel.seek(SeekFrom::Start(100)).expect("seek");
    assert_eq!(channel.tell(), 100);
    assert_eq!(channel.anchor(), 160);
    assert_eq!(channel.stats().refills, 1);

    assert_eq!(channel.read(5).expect("read"), Some(&data[100..105]));
    assert_eq!(channel.stats().refills, 1);
}

#[test]
fn test_seek_relative_to_cursor() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 50);

    let mut channel = Channel::open(&path, "r").expect("open");
    channel.read(10).expect("read").expect("data");
    assert_eq!(channel.seek(SeekFrom::Current(-5)).expect("seek"), 5);
    assert_eq!(channel.read(3).expect("read"), Some(&data[5..8]));
    assert_eq!(channel.seek(SeekFrom::Current(7)).expect("seek"), 15);
    assert_eq!(channel.read(1).expect("read"), Some(&data[15..16]));
}

#[test]
fn test_seek_relative_to_end() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 50);

    let mut channel = Channel::open(&path, "r").expect("open");
    assert_eq!(channel.seek(SeekFrom::End(-4)).expect("seek"), 46);
    assert_eq!(channel.read(10).expect("read"), Some(&data[46..]));

    assert_eq!(channel.seek(SeekFrom::End(0)).expect("seek"), 50);
    assert_eq!(channel.tell(), channel.file_size());
    assert_eq!(channel.read(1).expect("read"), None);
}

#[test]
fn test_seek_past_end_reads_nothing() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, _) = fixture(&dir, 20);

    let mut channel = Channel::open(&path, "r").expect("open");
    assert_eq!(channel.seek(SeekFrom::Start(500)).expect("seek"), 500);
    assert_eq!(channel.tell(), 500);
    assert_eq!(channel.read(1).expect("read"), None);
}

#[test]
fn test_seek_negative_fails() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, _) = fixture(&dir, 20);

    let mut channel = Channel::open(&path, "r").expect("open");
    channel.read(4).expect("read").expect("data");

    let err = channel
        .seek(SeekFrom::Current(-10))
        .expect_err("negative target");
    assert!(matches!(err, Error::Seek(_)));
    assert_eq!(channel.tell(), 4);
}

#[test]
fn test_seek_end_refreshes_file_size() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("growing.txt");
    fs::write(&path, b"hello").expect("write file");

    let mut channel = Channel::open(&path, "r").expect("open");
    assert_eq!(channel.file_size(), 5);

    OpenOptions::new()
        .append(true)
        .open(&path)
        .expect("open for append")
        .write_all(b"world")
        .expect("append");

    assert_eq!(channel.file_size(), 5);
    assert_eq!(channel.seek(SeekFrom::End(0)).expect("seek"), 10);
    assert_eq!(channel.file_size(), 10);

    channel.seek(SeekFrom::Start(5)).expect("seek");
    assert_eq!(channel.read(5).expect("read"), Some(&b"world"[..]));
}

#[test]
fn test_rewind_resets_window() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 300);

    let mut channel = Channel::with_options(&path, "r", small_options()).expect("open");
    let first = channel.read(100).expect("read").expect("data").to_vec();
    channel.read(100).expect("read").expect("data");

    channel.rewind().expect("rewind");
    assert_eq!(channel.tell(), 0);
    assert_eq!(channel.anchor(), 0);

    let again = channel.read(100).expect("read").expect("data");
    assert_eq!(again, first.as_slice());
    assert_eq!(again, &data[..100]);
}

#[test]
fn test_seek_flushes_pending_writes() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("pending.bin");

    let mut channel = Channel::open(&path, "w").expect("open");
    channel.write_all(b"buffered").expect("write");
    channel.seek(SeekFrom::Start(3)).expect("seek");

    assert_eq!(fs::read(&path).expect("read file"), b"buffered");
}

#[test]
fn test_overwrite_at_aligned_offset() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("aligned.bin");

    let mut channel = Channel::with_options(&path, "w", small_options()).expect("open");
    channel.write(40).expect("write").fill(b'.');
    channel.seek(SeekFrom::Start(16)).expect("seek");
    channel.write_all(b"QQ").expect("write");
    channel.close().expect("close");

    let mut expected = vec![b'.'; 40];
    expected[16..18].copy_from_slice(b"QQ");
    assert_eq!(fs::read(&path).expect("read file"), expected);
}

#[test]
fn test_overwrite_at_unaligned_offset_keeps_page_head() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("unaligned.bin");
    let data: Vec<u8> = (0..40).map(|_| Faker.fake::<u8>()).collect();

    let mut channel = Channel::with_options(&path, "w", small_options()).expect("open");
    channel.write_all(&data).expect("write");
    channel.seek(SeekFrom::Start(10)).expect("seek");
    channel.write_all(b"QQ").expect("write");
    channel.close().expect("close");

    let mut expected = data;
    expected[10..12].copy_from_slice(b"QQ");
    assert_eq!(fs::read(&path).expect("read file"), expected);
}

#[test]
fn test_write_plus_overwrite_then_read_back() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("overwrite.bin");
    let data: Vec<u8> = (0..100).map(|_| Faker.fake::<u8>()).collect();

    let mut channel = Channel::with_options(&path, "w+", small_options()).expect("open");
    channel.write_all(&data).expect("write");
    channel.seek(SeekFrom::Start(10)).expect("seek");
    channel.write_all(b"ZZZZZ").expect("write");
    channel.rewind().expect("rewind");

    let mut expected = data;
    expected[10..15].copy_from_slice(b"ZZZZZ");
    assert_eq!(channel.read(100).expect("read"), Some(expected.as_slice()));
}

#[test]
fn test_write_past_end_leaves_zeroed_hole() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("hole.bin");

    let mut channel = Channel::open(&path, "w+").expect("open");
    channel.seek(SeekFrom::Start(20)).expect("seek");
    channel.write_all(b"A").expect("write");
    channel.close().expect("close");

    let mut expected = vec![0; 20];
    expected.push(b'A');
    assert_eq!(fs::read(&path).expect("read file"), expected);
}

#[test]
fn test_append_ignores_seek_for_writes() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("log.txt");
    fs::write(&path, b"first\n").expect("write file");

    let mut channel = Channel::open(&path, "a+").expect("open");
    channel.rewind().expect("rewind");
    channel.write_all(b"second\n").expect("write");
    channel.close().expect("close");

    assert_eq!(fs::read(&path).expect("read file"), b"first\nsecond\n");
}

#[test]
fn test_seek_past_end_alone_keeps_length() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("no_growth.bin");

    let mut channel = Channel::open(&path, "w").expect("open");
    channel.write_all(b"0123456789").expect("write");
    assert_eq!(channel.seek(SeekFrom::Start(100)).expect("seek"), 100);
    channel.close().expect("close");

    assert_eq!(fs::read(&path).expect("read file"), b"0123456789");
}

#[test]
fn test_unaligned_seeks_without_writes_leave_file_unchanged() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 40);

    let mut channel = Channel::with_options(&path, "r+", small_options()).expect("open");
    channel.write_all(&data[..1]).expect("write");
    for target in [50, 37, 1, 90] {
        channel.seek(SeekFrom::Start(target)).expect("seek");
    }
    channel.close().expect("close");

    assert_eq!(fs::read(&path).expect("read file"), data);
}

#[test]
fn test_read_write_seek_only_keeps_contents() {
    let dir = TempDir::new().expect("create temp dir");
    let path = dir.path().join("abc.txt");
    fs::write(&path, b"abc").expect("write file");

    let mut channel = Channel::open(&path, "r+").expect("open");
    channel.write_all(b"X").expect("write");
    channel.seek(SeekFrom::Start(50)).expect("seek");
    channel.seek(SeekFrom::Start(1)).expect("seek");
    channel.close().expect("close");

    assert_eq!(fs::read(&path).expect("read file"), b"Xbc");
}

#[test]
fn test_large_write_after_unaligned_seek_keeps_page_head() {
    let dir = TempDir::new().expect("create temp dir");
    let (path, data) = fixture(&dir, 40);
    let patch: Vec<u8> = (0..100).map(|_| Faker.fake::<u8>()).collect();

    let mut channel = Channel::with_options(&path, "r+", small_options()).expect("open");
    channel.write_all(&data[..1]).expect("write");
    channel.seek(SeekFrom::Start(21)).expect("seek");
    channel.write_all(&patch).expect("write");
    channel.close().expect("close");

    let mut expected = data[..21].to_vec();
    expected.extend_from_slice(&patch);
    assert_eq!(fs::read(&path).expect("read file"), expected);
}
