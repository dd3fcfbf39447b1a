//! Fallback driver for POSIX systems without a dedicated implementation.
//! Enumeration falls back to conventional `/dev` names; custom baud rates,
//! queue sizing, and RS-485 are unavailable.

use std::os::unix::io::RawFd;
use std::path::Path;

use tracing::warn;

use super::PlatformDriver;
use crate::config::Rs485Settings;
use crate::enumerate::{self, PortDescriptor};

pub(crate) struct GenericPosixDriver;

impl PlatformDriver for GenericPosixDriver {
    fn name(&self) -> &'static str {
        "posix"
    }

    fn enumerate(&self) -> Vec<PortDescriptor> {
        enumerate::scan_linux(Path::new("/sys/class/tty"), Path::new("/dev"))
    }

    fn set_custom_baud_rate(&self, _fd: RawFd, baud_rate: u32) -> bool {
        warn!(baud_rate, "custom baud rates are not supported on this platform");
        false
    }

    fn set_transmit_queue_size(&self, _fd: RawFd, _bytes: u32) {}

    fn apply_rs485(&self, _fd: RawFd, _settings: &Rs485Settings) {}
}
