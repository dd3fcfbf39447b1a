//! The serial port handle and its operations.
//!
//! [`SerialPort`] owns the device file descriptor and the advisory lock for
//! one open port. Its operations are spread across this module's files:
//! lifecycle in `handle`, line-discipline translation in `settings`, blocking
//! behavior in `timeouts`, data transfer in `io`, modem lines in `control`,
//! and readiness waits in `event`.

pub mod control;
pub mod event;
pub mod handle;
pub mod io;

pub(crate) mod settings;
pub(crate) mod termio;
pub(crate) mod timeouts;

pub use handle::SerialPort;
