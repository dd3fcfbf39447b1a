//! Port handle lifecycle: open, close, and failure teardown.

use std::ffi::CString;
use std::io;
use std::os::unix::io::RawFd;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

use parking_lot::RwLock;
use tracing::{debug, warn};

use crate::config::{PortSettings, TimeoutPolicy};
use crate::enumerate::PortDescriptor;
use crate::error::PortError;
use crate::port::{settings, termio, timeouts};

const CLOSED_FD: i32 = -1;

/// A handle to one serial device.
///
/// The handle starts closed; [`open`](SerialPort::open) acquires the device
/// file and an exclusive advisory lock, [`close`](SerialPort::close) releases
/// both. All operations take `&self` so a handle wrapped in `Arc` can be
/// shared: the design supports one thread blocked in
/// [`read`](SerialPort::read) while another calls `close`, which forces the
/// read to return promptly. Writes and control-line calls are not safe to
/// race against `close`; serialize those externally.
#[derive(Debug)]
pub struct SerialPort {
    path: String,
    fd: AtomicI32,
    open: AtomicBool,
    pub(crate) settings: RwLock<PortSettings>,
    pub(crate) timeouts: RwLock<TimeoutPolicy>,
}

impl SerialPort {
    /// Create a closed handle for a device path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fd: AtomicI32::new(CLOSED_FD),
            open: AtomicBool::new(false),
            settings: RwLock::new(PortSettings::default()),
            timeouts: RwLock::new(TimeoutPolicy::default()),
        }
    }

    /// Create a closed handle from an enumeration result.
    pub fn from_descriptor(descriptor: &PortDescriptor) -> Self {
        Self::new(descriptor.system_path.clone())
    }

    /// The device path this handle refers to.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the device is currently open. Flips to `false` when a hard
    /// I/O failure tears the handle down.
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// A snapshot of the current settings.
    pub fn settings(&self) -> PortSettings {
        self.settings.read().clone()
    }

    /// A snapshot of the current timeout policy.
    pub fn timeouts(&self) -> TimeoutPolicy {
        *self.timeouts.read()
    }

    /// Replace the settings. On an open port the new line discipline is
    /// applied immediately; on a closed port it takes effect at `open`.
    pub fn set_settings(&self, new: PortSettings) -> Result<(), PortError> {
        *self.settings.write() = new;
        match self.fd() {
            Some(fd) => {
                let s = self.settings.read().clone();
                let t = *self.timeouts.read();
                settings::apply(fd, &s, &t)
            }
            None => Ok(()),
        }
    }

    /// Replace the timeout policy. Applied immediately when open.
    pub fn set_timeouts(&self, new: TimeoutPolicy) -> Result<(), PortError> {
        *self.timeouts.write() = new;
        match self.fd() {
            Some(fd) => {
                let s = self.settings.read().clone();
                let t = *self.timeouts.read();
                timeouts::apply(fd, &t, &s)
            }
            None => Ok(()),
        }
    }

    pub(crate) fn fd(&self) -> Option<RawFd> {
        let fd = self.fd.load(Ordering::SeqCst);
        (fd >= 0).then_some(fd)
    }

    /// Open the device, lock it, and program the configured line discipline
    /// and timeouts.
    ///
    /// Failure modes: [`PortError::Open`] when the device cannot be opened,
    /// [`PortError::Busy`] when another handle holds the advisory lock, and
    /// [`PortError::Config`] when programming fails — in every case the
    /// handle is left closed with nothing leaked. Opening an already-open
    /// handle is a no-op.
    pub fn open(&self) -> Result<(), PortError> {
        if self.is_open() {
            return Ok(());
        }
        let current = self.settings.read().clone();
        let policy = *self.timeouts.read();

        let c_path = CString::new(self.path.as_str()).map_err(|_| PortError::Open {
            path: self.path.clone(),
            source: io::Error::from(io::ErrorKind::InvalidInput),
        })?;

        // Open without becoming the controlling terminal, non-blocking until
        // the timeout policy decides otherwise.
        let fd = unsafe {
            libc::open(
                c_path.as_ptr(),
                libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK,
            )
        };
        if fd < 0 {
            return Err(PortError::open_failure(&self.path));
        }

        // Exclusive advisory lock; a contended lock means someone else owns
        // the port right now.
        if unsafe { libc::flock(fd, libc::LOCK_EX | libc::LOCK_NB) } != 0 {
            termio::close_retrying(fd);
            return Err(PortError::Busy(self.path.clone()));
        }

        if let Err(e) = configure_raw(fd, &current, &policy) {
            // Undo everything the partial open did before reporting failure.
            termio::clear_exclusive(fd);
            let _ = termio::drain(fd);
            termio::close_retrying(fd);
            return Err(e);
        }

        self.fd.store(fd, Ordering::SeqCst);
        self.open.store(true, Ordering::SeqCst);
        debug!(path = %self.path, fd, "serial port opened");
        Ok(())
    }

    /// Close the device. Idempotent and best-effort: pending output is
    /// drained, a concurrently blocked read is forced to return by flipping
    /// the descriptor to non-blocking with a zero minimum-character count,
    /// then the advisory lock and descriptor are released.
    pub fn close(&self) -> bool {
        let fd = self.fd.swap(CLOSED_FD, Ordering::SeqCst);
        if fd < 0 {
            return true;
        }

        termio::clear_exclusive(fd);
        let _ = termio::drain(fd);
        self.open.store(false, Ordering::SeqCst);

        // Wake any reader blocked on this descriptor before closing it.
        if let Ok(flags) = termio::status_flags(fd) {
            let _ = termio::set_status_flags(fd, flags | libc::O_NONBLOCK);
        }
        if let Ok(mut tio) = termio::attrs(fd) {
            tio.c_cc[libc::VMIN] = 0;
            tio.c_cc[libc::VTIME] = 0;
            let _ = termio::set_attrs(fd, &tio);
        }

        unsafe {
            libc::flock(fd, libc::LOCK_UN);
        }
        termio::close_retrying(fd);
        debug!(path = %self.path, "serial port closed");
        true
    }

    /// Tear the handle down after a hard I/O failure so the caller never
    /// holds a half-broken port. The advisory lock dies with the descriptor.
    pub(crate) fn fault_teardown(&self) {
        let fd = self.fd.swap(CLOSED_FD, Ordering::SeqCst);
        self.open.store(false, Ordering::SeqCst);
        if fd < 0 {
            return;
        }
        warn!(path = %self.path, "I/O failure, closing serial port");
        termio::clear_exclusive(fd);
        let _ = termio::drain(fd);
        termio::close_retrying(fd);
    }
}

impl Drop for SerialPort {
    fn drop(&mut self) {
        self.close();
    }
}

/// Reset the freshly opened descriptor to a raw line discipline and program
/// the configured parameters and timeouts.
fn configure_raw(
    fd: RawFd,
    current: &PortSettings,
    policy: &TimeoutPolicy,
) -> Result<(), PortError> {
    termio::set_status_flags(fd, 0)
        .map_err(|e| PortError::Config(format!("clearing status flags failed: {e}")))?;

    let mut tio = termio::attrs(fd)
        .map_err(|e| PortError::Config(format!("reading line discipline failed: {e}")))?;
    unsafe {
        libc::cfmakeraw(&mut tio);
    }
    if !current.dtr_on_open || !current.rts_on_open {
        // Keep the modem lines steady when the port is released.
        tio.c_cflag &= !libc::HUPCL;
    }
    tio.c_iflag |= libc::BRKINT;
    termio::set_attrs(fd, &tio)
        .map_err(|e| PortError::Config(format!("raw line discipline rejected: {e}")))?;

    settings::apply(fd, current, policy)
}
