//! Derivation of blocking behavior from the timeout policy.
//!
//! The policy is translated into three kernel-level knobs: the descriptor's
//! `O_NONBLOCK` flag and the line discipline's minimum-character (`VMIN`) and
//! character-timer (`VTIME`) values. The highest-priority matching branch
//! wins; semi-blocking beats blocking beats scanner beats non-blocking.

use std::os::unix::io::RawFd;

use crate::baud;
use crate::config::{event, timeout, PortSettings, TimeoutPolicy};
use crate::error::PortError;
use crate::port::termio;
use crate::registry;

/// The computed kernel-level read plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ReadPlan {
    pub nonblocking: bool,
    pub vmin: u8,
    pub vtime: u8,
}

/// Derive the read plan for a timeout mode and read timeout.
pub(crate) fn plan(mode: u32, read_timeout_ms: u32) -> ReadPlan {
    let deciseconds = (read_timeout_ms / 100).min(u8::MAX as u32) as u8;
    if mode & timeout::READ_SEMI_BLOCKING != 0 && read_timeout_ms > 0 {
        ReadPlan { nonblocking: false, vmin: 0, vtime: deciseconds }
    } else if mode & timeout::READ_SEMI_BLOCKING != 0 {
        ReadPlan { nonblocking: false, vmin: 1, vtime: 0 }
    } else if mode & timeout::READ_BLOCKING != 0 && read_timeout_ms > 0 {
        ReadPlan { nonblocking: false, vmin: 0, vtime: deciseconds }
    } else if mode & timeout::READ_BLOCKING != 0 {
        ReadPlan { nonblocking: false, vmin: 1, vtime: 0 }
    } else if mode & timeout::SCANNER != 0 {
        // Short inter-byte timer for interactive scanning devices.
        ReadPlan { nonblocking: false, vmin: 1, vtime: 1 }
    } else {
        ReadPlan { nonblocking: true, vmin: 0, vtime: 0 }
    }
}

/// Program a read plan onto a descriptor.
fn apply_plan(fd: RawFd, p: ReadPlan) -> Result<(), PortError> {
    let flags = termio::status_flags(fd)
        .map_err(|e| PortError::Config(format!("reading status flags failed: {e}")))?;
    let flags = if p.nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };
    termio::set_status_flags(fd, flags)
        .map_err(|e| PortError::Config(format!("setting status flags failed: {e}")))?;

    let mut tio = termio::attrs(fd)
        .map_err(|e| PortError::Config(format!("reading line discipline failed: {e}")))?;
    tio.c_cc[libc::VMIN] = p.vmin;
    tio.c_cc[libc::VTIME] = p.vtime;
    termio::set_attrs(fd, &tio)
        .map_err(|e| PortError::Config(format!("timeout configuration rejected: {e}")))
}

/// Apply the timeout policy to an open descriptor.
///
/// Monitoring `DATA_RECEIVED` overrides the computed plan with a one-second
/// character timer. Either way, a configured non-standard baud rate is
/// re-programmed afterwards: timeout changes reset it on some platforms.
pub(crate) fn apply(
    fd: RawFd,
    policy: &TimeoutPolicy,
    settings: &PortSettings,
) -> Result<(), PortError> {
    let selected = if policy.event_flags & event::DATA_RECEIVED != 0 {
        ReadPlan { nonblocking: false, vmin: 0, vtime: 10 }
    } else {
        plan(policy.mode, policy.read_timeout_ms)
    };
    apply_plan(fd, selected)?;

    if baud::standard_code(settings.baud_rate).is_none() {
        registry::driver().set_custom_baud_rate(fd, settings.baud_rate);
    }
    Ok(())
}
