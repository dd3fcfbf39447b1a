//! End-to-end exercises against a pseudo-terminal pair. The slave side of
//! the pty stands in for real hardware, so everything here runs without a
//! physical serial adapter.

#![cfg(unix)]

use std::fs::File;
use std::io::{Read, Write};
use std::os::fd::{FromRawFd, IntoRawFd, OwnedFd};
use std::thread;
use std::time::{Duration, Instant};

use nix::fcntl::OFlag;
use nix::pty::{grantpt, posix_openpt, ptsname_r, unlockpt};
use pretty_assertions::assert_eq;
use serial_test::serial;

use ttyport::{timeout, PortError, SerialPort, TimeoutPolicy};

/// Allocate a pty and hand back the master as a `File` plus the slave path.
fn open_pty() -> (File, String) {
    let master = posix_openpt(OFlag::O_RDWR | OFlag::O_NOCTTY).expect("posix_openpt");
    grantpt(&master).expect("grantpt");
    unlockpt(&master).expect("unlockpt");
    let path = ptsname_r(&master).expect("ptsname_r");
    let owned = unsafe { OwnedFd::from_raw_fd(master.into_raw_fd()) };
    (File::from(owned), path)
}

fn semi_blocking(timeout_ms: u32) -> TimeoutPolicy {
    TimeoutPolicy {
        mode: timeout::READ_SEMI_BLOCKING,
        read_timeout_ms: timeout_ms,
        ..TimeoutPolicy::default()
    }
}

fn blocking(timeout_ms: u32) -> TimeoutPolicy {
    TimeoutPolicy {
        mode: timeout::READ_BLOCKING,
        read_timeout_ms: timeout_ms,
        ..TimeoutPolicy::default()
    }
}

#[test]
fn loopback_round_trip() {
    let (mut master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open slave");
    port.set_timeouts(semi_blocking(1000)).expect("timeouts");

    // Host -> port.
    master.write_all(b"marco").expect("master write");
    let mut buf = [0u8; 16];
    let n = port.read(&mut buf).expect("port read");
    assert_eq!(&buf[..n], b"marco");

    // Port -> host.
    let written = port.write(b"polo").expect("port write");
    assert_eq!(written, 4);
    let mut echo = [0u8; 4];
    master.read_exact(&mut echo).expect("master read");
    assert_eq!(&echo, b"polo");

    assert!(port.close());
}

#[test]
fn zero_length_operations_are_noops() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open slave");

    let mut empty = [0u8; 0];
    assert_eq!(port.read(&mut empty).expect("read"), 0);
    assert_eq!(port.write(&[]).expect("write"), 0);
}

#[test]
fn blocking_read_accumulates_across_chunks() {
    let (mut master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open slave");
    port.set_timeouts(blocking(5000)).expect("timeouts");

    let payload: Vec<u8> = (0..4096u32).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();
    let writer = thread::spawn(move || {
        for chunk in payload.chunks(512) {
            master.write_all(chunk).expect("master write");
            thread::sleep(Duration::from_millis(5));
        }
        master
    });

    let mut buf = vec![0u8; 4096];
    let n = port.read(&mut buf).expect("port read");
    assert_eq!(n, 4096);
    assert_eq!(buf, expected);
    writer.join().expect("writer thread");
}

#[test]
fn combined_mode_read_still_accumulates_until_full() {
    let (mut master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open slave");
    // Both read bits set: the blocking accumulation loop must win over the
    // single-read path.
    port.set_timeouts(TimeoutPolicy {
        mode: timeout::READ_BLOCKING | timeout::READ_SEMI_BLOCKING,
        read_timeout_ms: 0,
        ..TimeoutPolicy::default()
    })
    .expect("timeouts");

    master.write_all(b"abc").expect("first chunk");
    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        master.write_all(b"defgh").expect("second chunk");
        master
    });

    let mut buf = [0u8; 8];
    let n = port.read(&mut buf).expect("port read");
    assert_eq!(n, 8, "read must not return the first partial chunk");
    assert_eq!(&buf, b"abcdefgh");
    writer.join().expect("writer thread");
}

#[test]
fn write_blocking_round_trip_drains_output() {
    let (mut master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open slave");
    port.set_timeouts(TimeoutPolicy {
        mode: timeout::READ_SEMI_BLOCKING | timeout::WRITE_BLOCKING,
        read_timeout_ms: 1000,
        ..TimeoutPolicy::default()
    })
    .expect("timeouts");

    // The write drains the output queue before returning.
    let written = port.write(b"hello").expect("port write");
    assert_eq!(written, 5);
    assert_eq!(port.bytes_awaiting_write(), Some(0));

    let mut echo = [0u8; 5];
    master.read_exact(&mut echo).expect("master read");
    assert_eq!(&echo, b"hello");

    master.write_all(b"olleh").expect("master write");
    let mut buf = [0u8; 16];
    let n = port.read(&mut buf).expect("port read");
    assert_eq!(&buf[..n], b"olleh");
}

#[test]
fn second_open_of_same_device_is_rejected() {
    let (_master, path) = open_pty();
    let first = SerialPort::new(&path);
    first.open().expect("first open");

    let second = SerialPort::new(&path);
    let err = second.open().expect_err("second open must fail");
    assert!(
        matches!(err, PortError::Busy(_) | PortError::Open { .. }),
        "unexpected error: {err}"
    );
    assert!(!second.is_open());
    assert!(first.is_open());
}

#[test]
fn close_is_idempotent() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open");
    assert!(port.close());
    assert!(port.close());
    assert!(!port.is_open());

    let mut buf = [0u8; 8];
    assert!(matches!(port.read(&mut buf), Err(PortError::NotOpen)));
    assert!(matches!(port.write(b"x"), Err(PortError::NotOpen)));
}

#[test]
fn reopen_cycles_do_not_leak() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    for _ in 0..20 {
        port.open().expect("open");
        assert!(port.is_open());
        assert!(port.close());
        assert!(!port.is_open());
    }
}

#[test]
fn open_while_open_is_a_noop() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open");
    port.open().expect("reopen while open");
    assert!(port.is_open());
}

#[test]
fn settings_persist_while_closed() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    let mut settings = port.settings();
    settings.baud_rate = 19200;
    port.set_settings(settings).expect("set while closed");
    assert_eq!(port.settings().baud_rate, 19200);

    port.open().expect("open applies stored settings");
    assert_eq!(port.settings().baud_rate, 19200);
}

#[test]
#[serial]
fn bounded_read_returns_partial_at_deadline() {
    let (mut master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open");
    port.set_timeouts(blocking(500)).expect("timeouts");

    master.write_all(b"abc").expect("master write");
    let start = Instant::now();
    let mut buf = [0u8; 64];
    let n = port.read(&mut buf).expect("bounded read");
    let elapsed = start.elapsed();

    assert_eq!(&buf[..n], b"abc");
    assert!(elapsed >= Duration::from_millis(400), "returned too early: {elapsed:?}");
    assert!(elapsed < Duration::from_millis(2500), "returned too late: {elapsed:?}");
}

#[test]
#[serial]
fn bounded_read_with_no_data_times_out_empty() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open");
    port.set_timeouts(blocking(500)).expect("timeouts");

    let start = Instant::now();
    let mut buf = [0u8; 8];
    let n = port.read(&mut buf).expect("bounded read");
    assert_eq!(n, 0);
    assert!(start.elapsed() >= Duration::from_millis(400));
}

#[test]
#[serial]
fn close_wakes_a_blocked_reader() {
    let (_master, path) = open_pty();
    let port = std::sync::Arc::new(SerialPort::new(&path));
    port.open().expect("open");
    port.set_timeouts(blocking(0)).expect("timeouts");

    let reader = std::sync::Arc::clone(&port);
    let handle = thread::spawn(move || {
        let mut buf = [0u8; 8];
        reader.read(&mut buf)
    });

    thread::sleep(Duration::from_millis(200));
    let start = Instant::now();
    assert!(port.close());
    let result = handle.join().expect("reader thread");
    assert!(result.is_err(), "read must not succeed after close: {result:?}");
    assert!(
        start.elapsed() < Duration::from_secs(3),
        "reader did not wake promptly"
    );
}

#[test]
fn semi_blocking_read_without_data_is_empty() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open");
    port.set_timeouts(semi_blocking(100)).expect("timeouts");

    let mut buf = [0u8; 8];
    assert_eq!(port.read(&mut buf).expect("read"), 0);
}

#[test]
fn queue_depth_reports_pending_input() {
    let (mut master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open");
    port.set_timeouts(semi_blocking(1000)).expect("timeouts");

    master.write_all(b"pending").expect("master write");
    // Give the line discipline a moment to move the bytes across.
    thread::sleep(Duration::from_millis(50));
    assert_eq!(port.bytes_available(), Some(7));

    let mut buf = [0u8; 16];
    port.read(&mut buf).expect("drain");
    assert_eq!(port.bytes_available(), Some(0));
}

#[test]
fn event_wait_sees_incoming_data() {
    let (mut master, path) = open_pty();
    let port = SerialPort::new(&path);
    port.open().expect("open");

    assert_eq!(port.wait_for_event_timeout(Duration::from_millis(50)), 0);

    master.write_all(b"!").expect("master write");
    let fired = port.wait_for_event_timeout(Duration::from_secs(2));
    assert_eq!(fired, ttyport::event::DATA_AVAILABLE);
}

#[test]
fn control_lines_require_an_open_port() {
    let (_master, path) = open_pty();
    let port = SerialPort::new(&path);
    assert!(matches!(port.set_rts(), Err(PortError::NotOpen)));
    assert!(matches!(port.set_break(), Err(PortError::NotOpen)));
    assert!(!port.cts());
    assert!(!port.dsr());
    assert!(!port.dcd());

    port.open().expect("open");
    // ptys have no modem lines; sensing must still degrade to `false`
    // rather than failing.
    let _ = port.cts();
    port.close();
    assert!(matches!(port.set_dtr(), Err(PortError::NotOpen)));
}

#[test]
fn master_fd_outlives_port_handle() {
    let (master, path) = open_pty();
    {
        let port = SerialPort::new(&path);
        port.open().expect("open");
        // Dropping the handle must release the device.
    }
    let port = SerialPort::new(&path);
    port.open().expect("reopen after drop");
    drop(master);
}

#[test]
fn enumeration_is_stable_across_calls() {
    let first = ttyport::list_ports();
    let second = ttyport::list_ports();
    assert_eq!(first, second);
}
