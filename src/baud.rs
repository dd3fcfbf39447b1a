//! Standard baud rate table.
//!
//! Maps requested integer baud rates to the POSIX `Bxxx` speed codes the
//! line discipline understands. Rates with no entry here are programmed
//! through the platform's custom-rate path, with `B38400` left in the
//! termios structure as a placeholder.

use libc::speed_t;

/// Speed code programmed for rates that have no standard code, before the
/// platform custom-rate path overrides it.
pub(crate) const PLACEHOLDER_CODE: speed_t = libc::B38400;

/// Look up the standard POSIX speed code for a baud rate, if one exists.
pub(crate) fn standard_code(baud_rate: u32) -> Option<speed_t> {
    match baud_rate {
        0 => Some(libc::B0),
        50 => Some(libc::B50),
        75 => Some(libc::B75),
        110 => Some(libc::B110),
        134 => Some(libc::B134),
        150 => Some(libc::B150),
        200 => Some(libc::B200),
        300 => Some(libc::B300),
        600 => Some(libc::B600),
        1200 => Some(libc::B1200),
        1800 => Some(libc::B1800),
        2400 => Some(libc::B2400),
        4800 => Some(libc::B4800),
        9600 => Some(libc::B9600),
        19200 => Some(libc::B19200),
        38400 => Some(libc::B38400),
        57600 => Some(libc::B57600),
        115200 => Some(libc::B115200),
        230400 => Some(libc::B230400),
        #[cfg(target_os = "linux")]
        460800 => Some(libc::B460800),
        #[cfg(target_os = "linux")]
        500000 => Some(libc::B500000),
        #[cfg(target_os = "linux")]
        576000 => Some(libc::B576000),
        #[cfg(target_os = "linux")]
        921600 => Some(libc::B921600),
        #[cfg(target_os = "linux")]
        1000000 => Some(libc::B1000000),
        #[cfg(target_os = "linux")]
        1152000 => Some(libc::B1152000),
        #[cfg(target_os = "linux")]
        1500000 => Some(libc::B1500000),
        #[cfg(target_os = "linux")]
        2000000 => Some(libc::B2000000),
        #[cfg(target_os = "linux")]
        2500000 => Some(libc::B2500000),
        #[cfg(target_os = "linux")]
        3000000 => Some(libc::B3000000),
        #[cfg(target_os = "linux")]
        3500000 => Some(libc::B3500000),
        #[cfg(target_os = "linux")]
        4000000 => Some(libc::B4000000),
        _ => None,
    }
}

/// Whether a baud rate can be programmed without the custom-rate fallback.
pub fn is_standard(baud_rate: u32) -> bool {
    standard_code(baud_rate).is_some()
}
