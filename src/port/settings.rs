//! Translation of logical port settings into line-discipline state.
//!
//! The mapping is deterministic and keeps no hidden state: the control-flag
//! word is rebuilt from scratch on every apply, input flags are masked and
//! re-derived, and the baud rate is either taken from the standard table or
//! routed through the platform's custom-rate path.

use std::os::unix::io::RawFd;

use tracing::warn;

use crate::baud;
use crate::config::{flow, DataBits, Parity, PortSettings, StopBits, TimeoutPolicy};
use crate::error::PortError;
use crate::port::{termio, timeouts};
use crate::registry;

#[cfg(target_os = "linux")]
const CMSPAR: libc::tcflag_t = libc::CMSPAR;
// Stick parity has no portable flag; this is the conventional bit value on
// platforms whose headers omit it.
#[cfg(not(target_os = "linux"))]
const CMSPAR: libc::tcflag_t = 0o10_000_000_000;

/// Build the control-mode word for a settings value.
pub(crate) fn control_flags(s: &PortSettings) -> libc::tcflag_t {
    let char_size = match s.data_bits {
        DataBits::Five => libc::CS5,
        DataBits::Six => libc::CS6,
        DataBits::Seven => libc::CS7,
        DataBits::Eight => libc::CS8,
    };
    let stop = match s.stop_bits {
        // One-and-a-half stop bits degrade to one on POSIX.
        StopBits::One | StopBits::OnePointFive => 0,
        StopBits::Two => libc::CSTOPB,
    };
    let parity = match s.parity {
        Parity::None => 0,
        Parity::Odd => libc::PARENB | libc::PARODD,
        Parity::Even => libc::PARENB,
        Parity::Mark => libc::PARENB | CMSPAR | libc::PARODD,
        Parity::Space => libc::PARENB | CMSPAR | libc::PARODD,
    };
    let hardware_flow = if s.flow_control & (flow::CTS_ENABLED | flow::RTS_ENABLED) != 0 {
        libc::CRTSCTS
    } else {
        0
    };

    let mut cflag =
        char_size | stop | parity | libc::CLOCAL | libc::CREAD | libc::HUPCL | hardware_flow;
    // Space parity is odd-with-stick with the odd bit cleared afterwards.
    if s.parity == Parity::Space {
        cflag &= !libc::PARODD;
    }
    if !s.dtr_on_open || !s.rts_on_open {
        cflag &= !libc::HUPCL;
    }
    cflag
}

/// Re-derive the input-mode word from an existing one.
pub(crate) fn input_flags(existing: libc::tcflag_t, s: &PortSettings) -> libc::tcflag_t {
    let mut iflag =
        existing & !(libc::INPCK | libc::IGNPAR | libc::PARMRK | libc::ISTRIP);
    if s.data_bits.bits() < 8 {
        iflag |= libc::ISTRIP;
    }
    if s.parity != Parity::None {
        // Check parity and mark bad bytes instead of discarding silently.
        iflag |= libc::INPCK | libc::IGNPAR;
    }
    if s.flow_control & flow::XONXOFF_IN_ENABLED != 0 {
        iflag |= libc::IXOFF;
    }
    if s.flow_control & flow::XONXOFF_OUT_ENABLED != 0 {
        iflag |= libc::IXON;
    }
    iflag
}

/// Program the line discipline, exclusivity, platform extras, and the
/// event-flag/timeout configuration for an open descriptor.
///
/// Succeeds only when both the line-discipline apply and the subsequent
/// timeout configuration succeed.
pub(crate) fn apply(
    fd: RawFd,
    s: &PortSettings,
    policy: &TimeoutPolicy,
) -> Result<(), PortError> {
    let mut tio = termio::attrs(fd)
        .map_err(|e| PortError::Config(format!("reading line discipline failed: {e}")))?;

    tio.c_cflag = control_flags(s);
    tio.c_iflag = input_flags(tio.c_iflag, s);

    let standard = baud::standard_code(s.baud_rate);
    let programmed = standard.unwrap_or(baud::PLACEHOLDER_CODE);
    unsafe {
        libc::cfsetispeed(&mut tio, programmed);
        libc::cfsetospeed(&mut tio, programmed);
    }

    // Probe mode skips the apply but still reserves the device below.
    let applied = if s.disable_config {
        Ok(())
    } else {
        termio::set_attrs(fd, &tio)
    };
    termio::set_exclusive(fd);

    let driver = registry::driver();
    driver.set_transmit_queue_size(fd, s.send_queue_size);
    if standard.is_none() && !driver.set_custom_baud_rate(fd, s.baud_rate) {
        warn!(
            baud_rate = s.baud_rate,
            "platform could not program non-standard baud rate"
        );
    }
    driver.apply_rs485(fd, &s.rs485);

    applied.map_err(|e| PortError::Config(format!("line discipline rejected: {e}")))?;
    timeouts::apply(fd, policy, s)
}
