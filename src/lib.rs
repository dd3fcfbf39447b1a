//! Native POSIX serial port access.
//!
//! This library talks to serial devices directly through the operating
//! system: `termios` for line-discipline configuration, `ioctl` for modem
//! control lines, `flock` for exclusive port ownership, and `poll` for
//! readiness waits. It does not wrap another serial crate.
//!
//! # Modules
//!
//! - `enumerate`: discovery of candidate serial devices
//! - `config`: port settings, timeout policy, and the wire-compatible
//!   numeric encodings for flow control, timeout modes, and events
//! - `baud`: standard baud rate table
//! - `port`: the [`SerialPort`] handle and its I/O, control-line, and
//!   event-wait operations
//! - `registry`: explicit library lifecycle for process-wide state
//!
//! # Example
//!
//! ```no_run
//! use ttyport::{PortSettings, SerialPort, TimeoutPolicy, timeout};
//!
//! let port = SerialPort::new("/dev/ttyUSB0");
//! port.set_settings(PortSettings { baud_rate: 115_200, ..Default::default() })?;
//! port.set_timeouts(TimeoutPolicy {
//!     mode: timeout::READ_BLOCKING,
//!     read_timeout_ms: 500,
//!     ..Default::default()
//! })?;
//! port.open()?;
//! let mut buf = [0u8; 64];
//! let n = port.read(&mut buf)?; // partial result after ~500 ms is Ok(n)
//! port.close();
//! # Ok::<(), ttyport::PortError>(())
//! ```

pub mod baud;
pub mod config;
pub mod enumerate;
pub mod error;
pub mod port;
pub mod registry;

pub(crate) mod platform;

// Re-export commonly used types for convenience
pub use config::{
    event, flow, timeout, DataBits, Parity, PortSettings, Rs485Settings, StopBits, TimeoutPolicy,
};
pub use enumerate::{list_ports, PortDescriptor};
pub use error::PortError;
pub use port::control::precondition_hangup_on_close;
pub use port::SerialPort;
pub use registry::{initialize, is_initialized, uninitialize};
