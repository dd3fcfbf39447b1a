//! Data transfer with retry-on-interrupt and failure-triggered teardown.
//!
//! Reads run in one of three regimes chosen by the timeout policy:
//! indefinite accumulation, wall-clock-bounded accumulation, or a single
//! immediate read. A hard I/O failure in any regime tears the handle down
//! and discards bytes collected so far; the caller observes `Err` plus
//! `is_open() == false`.

use std::io;
use std::os::unix::io::RawFd;
use std::time::{Duration, Instant};

use crate::config::timeout;
use crate::error::PortError;
use crate::port::termio;
use crate::port::SerialPort;

/// One read(2) call, retried transparently across signal interruptions.
fn raw_read(fd: RawFd, buf: &mut [u8]) -> io::Result<usize> {
    loop {
        let n = unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) };
        if n >= 0 {
            return Ok(n as usize);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}

/// One write(2) call, retried transparently across signal interruptions.
fn raw_write(fd: RawFd, buf: &[u8]) -> io::Result<usize> {
    loop {
        let n = unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) };
        if n >= 0 {
            return Ok(n as usize);
        }
        let err = io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::EINTR) {
            return Err(err);
        }
    }
}

fn would_block(err: &io::Error) -> bool {
    let code = err.raw_os_error();
    code == Some(libc::EAGAIN) || code == Some(libc::EWOULDBLOCK)
}

impl SerialPort {
    /// Read up to `buf.len()` bytes according to the configured timeout
    /// policy.
    ///
    /// - Blocking mode without a timeout accumulates until the buffer is
    ///   full, waiting as long as it takes.
    /// - Blocking mode with a timeout accumulates until the buffer is full
    ///   or the wall-clock deadline passes; a short count at the deadline is
    ///   a partial read, not an error.
    /// - Semi-blocking and non-blocking modes issue a single read and return
    ///   whatever is available, possibly nothing.
    ///
    /// A hard I/O failure closes the port and returns `Err`; bytes collected
    /// before the failure are not reported.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        let policy = *self.timeouts.read();
        // The blocking loops win whenever READ_BLOCKING is set, even when
        // READ_SEMI_BLOCKING is also present.
        let blocking = policy.mode & timeout::READ_BLOCKING != 0;

        if blocking && policy.read_timeout_ms == 0 {
            self.read_until_full(fd, buf)
        } else if blocking {
            self.read_until_deadline(fd, buf, policy.read_timeout_ms)
        } else {
            self.read_available(fd, buf)
        }
    }

    /// Indefinite blocking: don't return until the read has completely
    /// finished or the handle dies.
    fn read_until_full(&self, fd: RawFd, buf: &mut [u8]) -> Result<usize, PortError> {
        let mut total = 0;
        while total < buf.len() {
            match raw_read(fd, &mut buf[total..]) {
                Ok(0) => {
                    if !self.is_open() {
                        // close() flipped the descriptor out from under us.
                        return Err(PortError::NotOpen);
                    }
                    // EOF from the device side means it is gone.
                    self.fault_teardown();
                    return Err(PortError::Io(io::ErrorKind::UnexpectedEof.into()));
                }
                Ok(n) => total += n,
                Err(e) => {
                    if !self.is_open() && would_block(&e) {
                        return Err(PortError::NotOpen);
                    }
                    self.fault_teardown();
                    return Err(PortError::Io(e));
                }
            }
        }
        Ok(total)
    }

    /// Bounded blocking: accumulate until the buffer is full or the deadline
    /// computed at call entry passes.
    fn read_until_deadline(
        &self,
        fd: RawFd,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize, PortError> {
        let deadline = Instant::now() + Duration::from_millis(u64::from(timeout_ms));
        let mut total = 0;
        loop {
            match raw_read(fd, &mut buf[total..]) {
                Ok(n) => total += n,
                Err(e) => {
                    if !self.is_open() && would_block(&e) {
                        return Err(PortError::NotOpen);
                    }
                    self.fault_teardown();
                    return Err(PortError::Io(e));
                }
            }
            if total >= buf.len() || Instant::now() >= deadline {
                return Ok(total);
            }
        }
    }

    /// Semi-blocking or non-blocking: one read, returning whatever arrived.
    fn read_available(&self, fd: RawFd, buf: &mut [u8]) -> Result<usize, PortError> {
        match raw_read(fd, buf) {
            Ok(n) => Ok(n),
            Err(ref e) if would_block(e) => Ok(0),
            Err(e) => {
                self.fault_teardown();
                Err(PortError::Io(e))
            }
        }
    }

    /// Write `data`, returning the raw count accepted by the kernel, which
    /// may be less than `data.len()`. With `WRITE_BLOCKING` set the call
    /// additionally drains the output queue before returning, so the bytes
    /// have physically left the device.
    ///
    /// A hard I/O failure closes the port and returns `Err`.
    pub fn write(&self, data: &[u8]) -> Result<usize, PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        let mode = self.timeouts.read().mode;

        let written = match raw_write(fd, data) {
            Ok(n) => n,
            Err(ref e) if would_block(e) => 0,
            Err(e) => {
                self.fault_teardown();
                return Err(PortError::Io(e));
            }
        };

        if mode & timeout::WRITE_BLOCKING != 0 {
            let _ = termio::drain(fd);
        }
        Ok(written)
    }

    /// Bytes waiting in the input queue, or `None` when the port is closed
    /// or the kernel cannot say.
    pub fn bytes_available(&self) -> Option<usize> {
        let fd = self.fd()?;
        let mut count: libc::c_int = -1;
        let ok = unsafe { libc::ioctl(fd, libc::FIONREAD, &mut count) } == 0;
        (ok && count >= 0).then_some(count as usize)
    }

    /// Bytes still queued for transmission, or `None` when unavailable.
    pub fn bytes_awaiting_write(&self) -> Option<usize> {
        let fd = self.fd()?;
        let mut count: libc::c_int = -1;
        let ok = unsafe { libc::ioctl(fd, libc::TIOCOUTQ, &mut count) } == 0;
        (ok && count >= 0).then_some(count as usize)
    }
}
