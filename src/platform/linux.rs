//! Linux driver: sysfs enumeration, `termios2` custom baud rates, and the
//! serial ioctl family for queue sizing and RS-485.

use std::mem;
use std::os::unix::io::RawFd;
use std::path::Path;

use tracing::warn;

use super::PlatformDriver;
use crate::config::Rs485Settings;
use crate::enumerate::{self, PortDescriptor};

// From <linux/serial.h>; not exported by the libc crate.
const TIOCGSERIAL: libc::c_ulong = 0x541E;
const TIOCSSERIAL: libc::c_ulong = 0x541F;
const TIOCGRS485: libc::c_ulong = 0x542E;
const TIOCSRS485: libc::c_ulong = 0x542F;
const SER_RS485_ENABLED: u32 = 1;

/// `struct serial_struct` from <linux/serial.h>.
#[repr(C)]
#[derive(Clone, Copy)]
struct SerialStruct {
    type_: libc::c_int,
    line: libc::c_int,
    port: libc::c_uint,
    irq: libc::c_int,
    flags: libc::c_int,
    xmit_fifo_size: libc::c_int,
    custom_divisor: libc::c_int,
    baud_base: libc::c_int,
    close_delay: libc::c_ushort,
    io_type: libc::c_char,
    reserved_char: [libc::c_char; 1],
    hub6: libc::c_int,
    closing_wait: libc::c_ushort,
    closing_wait2: libc::c_ushort,
    iomem_base: *mut libc::c_uchar,
    iomem_reg_shift: libc::c_ushort,
    port_high: libc::c_uint,
    iomap_base: libc::c_ulong,
}

/// `struct serial_rs485` from <linux/serial.h>.
#[repr(C)]
#[derive(Clone, Copy, Default)]
struct SerialRs485 {
    flags: u32,
    delay_rts_before_send: u32,
    delay_rts_after_send: u32,
    padding: [u32; 5],
}

pub(crate) struct LinuxDriver;

impl PlatformDriver for LinuxDriver {
    fn name(&self) -> &'static str {
        "linux"
    }

    fn enumerate(&self) -> Vec<PortDescriptor> {
        enumerate::scan_linux(Path::new("/sys/class/tty"), Path::new("/dev"))
    }

    fn set_custom_baud_rate(&self, fd: RawFd, baud_rate: u32) -> bool {
        // termios2 with BOTHER programs arbitrary rates on drivers that
        // support it.
        unsafe {
            let mut tio2: libc::termios2 = mem::zeroed();
            if libc::ioctl(fd, libc::TCGETS2, &mut tio2) != 0 {
                warn!(baud_rate, "TCGETS2 failed; custom baud rate not applied");
                return false;
            }
            tio2.c_cflag &= !libc::CBAUD;
            tio2.c_cflag |= libc::BOTHER;
            tio2.c_ispeed = baud_rate;
            tio2.c_ospeed = baud_rate;
            if libc::ioctl(fd, libc::TCSETS2, &tio2) != 0 {
                warn!(baud_rate, "TCSETS2 rejected custom baud rate");
                return false;
            }
        }
        true
    }

    fn set_transmit_queue_size(&self, fd: RawFd, bytes: u32) {
        unsafe {
            let mut info: SerialStruct = mem::zeroed();
            if libc::ioctl(fd, TIOCGSERIAL, &mut info) == 0 {
                info.xmit_fifo_size = bytes as libc::c_int;
                libc::ioctl(fd, TIOCSSERIAL, &info);
            }
        }
    }

    fn apply_rs485(&self, fd: RawFd, settings: &Rs485Settings) {
        unsafe {
            let mut conf = SerialRs485::default();
            if libc::ioctl(fd, TIOCGRS485, &mut conf) == 0 {
                if settings.enabled {
                    conf.flags |= SER_RS485_ENABLED;
                } else {
                    conf.flags &= !SER_RS485_ENABLED;
                }
                conf.delay_rts_before_send = settings.delay_before_send_us;
                conf.delay_rts_after_send = settings.delay_after_send_us;
                libc::ioctl(fd, TIOCSRS485, &conf);
            }
        }
    }
}
