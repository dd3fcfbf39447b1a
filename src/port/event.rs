//! Readiness notification via poll(2).

use std::time::Duration;

use crate::config::event;
use crate::port::SerialPort;

const DEFAULT_WAIT: Duration = Duration::from_millis(1000);

impl SerialPort {
    /// Block until data is available to read, up to the default one-second
    /// window. Returns the event bits that fired, or `0` on timeout, error,
    /// or a closed port.
    pub fn wait_for_event(&self) -> u32 {
        self.wait_for_event_timeout(DEFAULT_WAIT)
    }

    /// Block until data is available to read, up to `timeout`. Returns the
    /// event bits that fired, or `0` on timeout, error, or a closed port.
    pub fn wait_for_event_timeout(&self, timeout: Duration) -> u32 {
        let Some(fd) = self.fd() else {
            return 0;
        };
        let mut pollfd = libc::pollfd {
            fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let millis = timeout.as_millis().min(libc::c_int::MAX as u128) as libc::c_int;
        let n = unsafe { libc::poll(&mut pollfd, 1, millis) };
        if n > 0 && pollfd.revents & libc::POLLIN != 0 {
            event::DATA_AVAILABLE
        } else {
            0
        }
    }
}
