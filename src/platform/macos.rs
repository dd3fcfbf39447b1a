//! macOS driver: `/dev` call-out/dial-in enumeration and the IOKit
//! `IOSSIOSPEED` ioctl for non-table baud rates. Queue sizing and RS-485
//! are not exposed by the platform.

use std::os::unix::io::RawFd;
use std::path::Path;

use tracing::warn;

use super::PlatformDriver;
use crate::config::Rs485Settings;
use crate::enumerate::{self, PortDescriptor};

// From <IOKit/serial/ioss.h>: _IOW('T', 2, speed_t). speed_t is an
// unsigned long on Darwin, so the encoded payload size is 8 bytes.
const IOSSIOSPEED: libc::c_ulong = 0x8008_5402;

pub(crate) struct MacosDriver;

impl PlatformDriver for MacosDriver {
    fn name(&self) -> &'static str {
        "macos"
    }

    fn enumerate(&self) -> Vec<PortDescriptor> {
        enumerate::scan_darwin(Path::new("/dev"))
    }

    fn set_custom_baud_rate(&self, fd: RawFd, baud_rate: u32) -> bool {
        let speed = baud_rate as libc::speed_t;
        let ok = unsafe { libc::ioctl(fd, IOSSIOSPEED, &speed) == 0 };
        if !ok {
            warn!(baud_rate, "IOSSIOSPEED rejected custom baud rate");
        }
        ok
    }

    fn set_transmit_queue_size(&self, _fd: RawFd, _bytes: u32) {}

    fn apply_rs485(&self, _fd: RawFd, _settings: &Rs485Settings) {}
}
