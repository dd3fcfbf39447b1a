//! Per-OS capabilities behind a single driver interface.
//!
//! Everything a POSIX serial port needs beyond plain termios lives here:
//! device enumeration strategy, custom (non-table) baud rate programming,
//! transmit queue sizing, and RS-485 mode. One implementation per OS family,
//! selected at build time.

use std::os::unix::io::RawFd;

use crate::config::Rs485Settings;
use crate::enumerate::PortDescriptor;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
#[cfg(not(any(target_os = "linux", target_os = "macos")))]
mod generic;

pub(crate) trait PlatformDriver: Send + Sync {
    fn name(&self) -> &'static str;

    /// Scan the platform device registry for serial ports.
    fn enumerate(&self) -> Vec<PortDescriptor>;

    /// Program a baud rate that has no standard speed code. Returns whether
    /// the platform accepted the exact requested rate.
    fn set_custom_baud_rate(&self, fd: RawFd, baud_rate: u32) -> bool;

    /// Request a transmit queue size, where the platform supports it.
    /// Best-effort; absence of support is not an error.
    fn set_transmit_queue_size(&self, fd: RawFd, bytes: u32);

    /// Program RS-485 mode and turnaround delays, where supported.
    /// Best-effort; absence of support is not an error.
    fn apply_rs485(&self, fd: RawFd, settings: &Rs485Settings);
}

/// The driver for the OS this crate was built for.
pub(crate) fn current() -> &'static dyn PlatformDriver {
    #[cfg(target_os = "linux")]
    {
        &linux::LinuxDriver
    }
    #[cfg(target_os = "macos")]
    {
        &macos::MacosDriver
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        &generic::GenericPosixDriver
    }
}
