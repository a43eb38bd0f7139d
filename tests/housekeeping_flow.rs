//! End-to-end housekeeping flow against a temporary SD card directory

use std::io;
use std::path::Path;

use qube_housekeeping::clock::FixedClock;
use qube_housekeeping::dataset::{Record, Value};
use qube_housekeeping::downlink::{self, Packet, FRAME_MARKER};
use qube_housekeeping::files::{FileManager, Session};
use qube_housekeeping::radio::Transport;
use qube_housekeeping::status::{HostProvider, RawStatus};
use qube_housekeeping::storage::{LocalStorage, Storage};
use qube_housekeeping::error::HousekeepingError;

/// Transport that keeps every frame and can refuse sends after a limit
#[derive(Default)]
struct RecordingTransport {
    frames: Vec<Vec<u8>>,
    limit: Option<usize>,
}

impl Transport for RecordingTransport {
    fn send_frame(&mut self, frame: &[u8]) -> io::Result<()> {
        if self.limit.is_some_and(|limit| self.frames.len() >= limit) {
            return Err(io::Error::new(io::ErrorKind::TimedOut, "radio busy"));
        }
        self.frames.push(frame.to_vec());
        Ok(())
    }
}

fn manager(root: &Path) -> FileManager<LocalStorage, HostProvider> {
    FileManager::new(LocalStorage::new(root), HostProvider::new(1234, 5))
        .with_clock(FixedClock(42.0))
}

#[test]
fn log_rotate_and_downlink() {
    let root = tempfile::tempdir().unwrap();
    let manager = manager(root.path()).with_max_log_bytes(64);
    let mut session = Session::new();

    for i in 0..10 {
        manager.append_log(&mut session, &format!("event {}", i)).unwrap();
    }

    let log = session.log_file().unwrap().to_path_buf();
    assert_ne!(log, Path::new("logs/log001.txt"));
    assert!(manager.storage().exists(Path::new("logs/log001.txt")));
    assert!(manager.storage().exists(Path::new("logs/info.txt")));

    let mut transport = RecordingTransport::default();
    let sent = downlink::send_file(manager.storage(), &mut transport, &log, 16).unwrap();
    assert_eq!(sent, transport.frames.len());

    let mut reassembled = Vec::new();
    for (i, frame) in transport.frames.iter().enumerate() {
        assert_eq!(frame[0] as usize, i);
        assert_eq!(frame[1], FRAME_MARKER);
        let packet = Packet::decode(frame).unwrap();
        reassembled.extend_from_slice(&packet.payload);
    }

    let on_disk = std::fs::read(root.path().join(&log)).unwrap();
    assert_eq!(reassembled, on_disk);
}

#[test]
fn new_file_header_carries_status() {
    let root = tempfile::tempdir().unwrap();
    let manager = manager(root.path());

    let first = manager.new_file("data/DATA_").unwrap();
    let second = manager.new_file("data/DATA_").unwrap();
    assert_eq!(first, Path::new("data/DATA_001.txt"));
    assert_eq!(second, Path::new("data/DATA_002.txt"));

    let contents = std::fs::read_to_string(root.path().join(&first)).unwrap();
    let mut lines = contents.split("\r\n");
    assert_eq!(lines.next(), Some("# Created: 42"));
    let status_line = lines.next().unwrap();
    assert!(status_line.starts_with("# Status: {"));
    assert!(status_line.contains("\"boot-count\":5"));

    let raw = manager.status().encode().unwrap();
    let decoded = RawStatus::decode(&raw).unwrap();
    assert_eq!(decoded.boot_time, 1234);
}

#[test]
fn save_dataset_to_session_file() {
    let root = tempfile::tempdir().unwrap();
    let manager = manager(root.path());
    let mut session = Session::new();

    let target = manager.new_data_file(&mut session, "data/DATA_").unwrap();
    let data = vec![
        Record::from(vec![Value::from(1.23456789), Value::from("x")]),
        Record::from(vec![Value::from(42)]),
    ];
    manager.save(&session, &data, None).unwrap();

    let contents = std::fs::read_to_string(root.path().join(&target)).unwrap();
    assert!(contents.ends_with("1.23456789,x,\n42,\n"));
}

#[test]
fn absent_card_drops_log_lines() {
    let root = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(root.path()).with_card_present(false);
    let manager = FileManager::new(storage, HostProvider::new(0, 0));
    let mut session = Session::new();

    manager.append_log(&mut session, "lost").unwrap();
    assert!(session.log_file().is_none());
    assert!(!root.path().join("logs").exists());

    #[cfg(unix)]
    assert_eq!(manager.storage_stats().unwrap().sd_percent, 0);
}

#[test]
fn downlink_aborts_on_first_failure() {
    let root = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(root.path());
    storage.write(Path::new("payload.bin"), &[0x5A; 40]).unwrap();

    let mut transport = RecordingTransport {
        limit: Some(1),
        ..Default::default()
    };
    let result = downlink::send_file(&storage, &mut transport, Path::new("payload.bin"), 10);

    assert!(matches!(result, Err(HousekeepingError::Transport(_))));
    assert_eq!(transport.frames.len(), 1);
}
