//! Thin safe wrappers over the termios and tty ioctl calls the rest of the
//! port module shares.

use std::io;
use std::mem;
use std::os::unix::io::RawFd;

/// Convert a -1/0 style syscall return into an `io::Result`.
fn cvt(ret: libc::c_int) -> io::Result<libc::c_int> {
    if ret < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret)
    }
}

pub(crate) fn attrs(fd: RawFd) -> io::Result<libc::termios> {
    let mut tio: libc::termios = unsafe { mem::zeroed() };
    cvt(unsafe { libc::tcgetattr(fd, &mut tio) })?;
    Ok(tio)
}

pub(crate) fn set_attrs(fd: RawFd, tio: &libc::termios) -> io::Result<()> {
    cvt(unsafe { libc::tcsetattr(fd, libc::TCSANOW, tio) })?;
    Ok(())
}

/// Block until the output queue has physically drained.
pub(crate) fn drain(fd: RawFd) -> io::Result<()> {
    cvt(unsafe { libc::tcdrain(fd) })?;
    Ok(())
}

pub(crate) fn status_flags(fd: RawFd) -> io::Result<libc::c_int> {
    cvt(unsafe { libc::fcntl(fd, libc::F_GETFL) })
}

pub(crate) fn set_status_flags(fd: RawFd, flags: libc::c_int) -> io::Result<()> {
    cvt(unsafe { libc::fcntl(fd, libc::F_SETFL, flags) })?;
    Ok(())
}

/// Mark the tty exclusive so non-root opens by other processes fail.
/// Best-effort; ptys and some drivers reject it.
pub(crate) fn set_exclusive(fd: RawFd) {
    unsafe {
        libc::ioctl(fd, libc::TIOCEXCL);
    }
}

/// Drop the exclusive tty marking so others may open the device again.
pub(crate) fn clear_exclusive(fd: RawFd) {
    unsafe {
        libc::ioctl(fd, libc::TIOCNXCL);
    }
}

/// Close a descriptor, retrying until the kernel reports it gone.
pub(crate) fn close_retrying(fd: RawFd) {
    loop {
        if unsafe { libc::close(fd) } == 0 {
            break;
        }
        if io::Error::last_os_error().raw_os_error() == Some(libc::EBADF) {
            break;
        }
    }
}
