//! Modem control lines, break signalling, and pre-open line presets.

use std::ffi::CString;
use std::io;
use std::process::Command;

use tracing::debug;

use crate::error::PortError;
use crate::port::termio;
use crate::port::SerialPort;

fn modem_bits(fd: i32) -> Option<libc::c_int> {
    let mut bits: libc::c_int = 0;
    let ok = unsafe { libc::ioctl(fd, libc::TIOCMGET, &mut bits) } == 0;
    ok.then_some(bits)
}

fn set_modem_bit(fd: i32, bit: libc::c_int, asserted: bool) -> Result<(), PortError> {
    let req = if asserted { libc::TIOCMBIS } else { libc::TIOCMBIC };
    if unsafe { libc::ioctl(fd, req, &bit) } != 0 {
        return Err(PortError::Io(io::Error::last_os_error()));
    }
    Ok(())
}

impl SerialPort {
    /// Start transmitting a break condition. The line stays in break until
    /// [`clear_break`](Self::clear_break).
    pub fn set_break(&self) -> Result<(), PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        if unsafe { libc::ioctl(fd, libc::TIOCSBRK) } != 0 {
            return Err(PortError::Io(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Stop transmitting a break condition.
    pub fn clear_break(&self) -> Result<(), PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        if unsafe { libc::ioctl(fd, libc::TIOCCBRK) } != 0 {
            return Err(PortError::Io(io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Assert the RTS output line.
    pub fn set_rts(&self) -> Result<(), PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        set_modem_bit(fd, libc::TIOCM_RTS, true)
    }

    /// Deassert the RTS output line.
    pub fn clear_rts(&self) -> Result<(), PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        set_modem_bit(fd, libc::TIOCM_RTS, false)
    }

    /// Assert the DTR output line.
    pub fn set_dtr(&self) -> Result<(), PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        set_modem_bit(fd, libc::TIOCM_DTR, true)
    }

    /// Deassert the DTR output line.
    pub fn clear_dtr(&self) -> Result<(), PortError> {
        let fd = self.fd().ok_or(PortError::NotOpen)?;
        set_modem_bit(fd, libc::TIOCM_DTR, false)
    }

    /// Current state of the CTS input line. Returns `false` when the port is
    /// closed or the state cannot be read.
    pub fn cts(&self) -> bool {
        self.fd()
            .and_then(modem_bits)
            .map_or(false, |b| b & libc::TIOCM_CTS != 0)
    }

    /// Current state of the DSR input line. Returns `false` when the port is
    /// closed or the state cannot be read.
    pub fn dsr(&self) -> bool {
        self.fd()
            .and_then(modem_bits)
            .map_or(false, |b| b & libc::TIOCM_DSR != 0)
    }

    /// Current state of the carrier-detect input line. Returns `false` when
    /// the port is closed or the state cannot be read.
    pub fn dcd(&self) -> bool {
        self.fd()
            .and_then(modem_bits)
            .map_or(false, |b| b & libc::TIOCM_CAR != 0)
    }

    /// Choose whether RTS is asserted when this handle is next opened.
    /// On an open port the line changes immediately; on a closed one the
    /// device node is preconditioned so the line does not glitch at open.
    pub fn preset_rts(&self, asserted: bool) -> Result<(), PortError> {
        self.settings.write().rts_on_open = asserted;
        if let Some(fd) = self.fd() {
            return set_modem_bit(fd, libc::TIOCM_RTS, asserted);
        }
        precondition_hangup_on_close(self.path(), self.lines_asserted_on_open())
    }

    /// Choose whether DTR is asserted when this handle is next opened.
    /// On an open port the line changes immediately; on a closed one the
    /// device node is preconditioned so the line does not glitch at open.
    pub fn preset_dtr(&self, asserted: bool) -> Result<(), PortError> {
        self.settings.write().dtr_on_open = asserted;
        if let Some(fd) = self.fd() {
            return set_modem_bit(fd, libc::TIOCM_DTR, asserted);
        }
        precondition_hangup_on_close(self.path(), self.lines_asserted_on_open())
    }

    fn lines_asserted_on_open(&self) -> bool {
        let s = self.settings.read();
        s.dtr_on_open && s.rts_on_open
    }
}

/// Set whether the kernel drops DTR and RTS when the device is closed.
///
/// Disabling hang-up-on-close keeps the lines deasserted across the next
/// open, which some hardware (notably Arduino-style auto-reset circuits)
/// requires. The tty is touched through a transient descriptor so this works
/// without an open handle; if that fails, `stty` is tried as a fallback.
pub fn precondition_hangup_on_close(path: &str, enabled: bool) -> Result<(), PortError> {
    let c_path = CString::new(path)
        .map_err(|_| PortError::Io(io::ErrorKind::InvalidInput.into()))?;
    let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY | libc::O_NONBLOCK) };
    if fd >= 0 {
        let result = toggle_hupcl(fd, enabled);
        termio::close_retrying(fd);
        if result.is_ok() {
            return Ok(());
        }
    }
    debug!(path, "falling back to stty for hang-up-on-close");
    stty_hupcl(path, enabled)
}

fn toggle_hupcl(fd: i32, enabled: bool) -> io::Result<()> {
    let mut tio = termio::attrs(fd)?;
    if enabled {
        tio.c_cflag |= libc::HUPCL;
    } else {
        tio.c_cflag &= !libc::HUPCL;
    }
    termio::set_attrs(fd, &tio)
}

fn stty_hupcl(path: &str, enabled: bool) -> Result<(), PortError> {
    #[cfg(target_os = "macos")]
    let device_flag = "-f";
    #[cfg(not(target_os = "macos"))]
    let device_flag = "-F";

    let arg = if enabled { "hupcl" } else { "-hupcl" };
    let status = Command::new("stty")
        .args([device_flag, path, arg])
        .status()
        .map_err(PortError::Io)?;
    if status.success() {
        Ok(())
    } else {
        Err(PortError::config(format!(
            "stty failed to adjust hang-up-on-close for {path}"
        )))
    }
}
