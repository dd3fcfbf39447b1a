//! Error types for serial port operations.

use thiserror::Error;

/// Errors that can occur while enumerating, opening, configuring, or using
/// a serial port.
#[derive(Debug, Error)]
pub enum PortError {
    /// Another process (or another handle in this process) holds the
    /// exclusive advisory lock on the device.
    #[error("Serial port {0} is busy")]
    Busy(String),

    /// The device could not be opened (missing, permission denied, ...).
    #[error("Failed to open serial port {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Programming the line discipline or timeouts failed. The port is left
    /// closed when this is returned from `open`.
    #[error("Failed to configure serial port: {0}")]
    Config(String),

    /// A hard I/O failure during read or write. The handle has already been
    /// torn down; `is_open()` reports `false` afterwards.
    #[error("I/O failure on serial port: {0}")]
    Io(#[from] std::io::Error),

    /// The operation requires an open port.
    #[error("Serial port is not open")]
    NotOpen,
}

impl PortError {
    /// Create a `Config` error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn open_failure(path: impl Into<String>) -> Self {
        Self::Open {
            path: path.into(),
            source: std::io::Error::last_os_error(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::Busy("/dev/ttyUSB0".into());
        assert_eq!(err.to_string(), "Serial port /dev/ttyUSB0 is busy");

        let err = PortError::config("tcsetattr failed");
        assert_eq!(
            err.to_string(),
            "Failed to configure serial port: tcsetattr failed"
        );

        let err = PortError::NotOpen;
        assert_eq!(err.to_string(), "Serial port is not open");
    }

    #[test]
    fn test_open_error_carries_path() {
        let err = PortError::Open {
            path: "/dev/ttyS9".into(),
            source: std::io::Error::from_raw_os_error(libc::ENOENT),
        };
        assert!(err.to_string().contains("/dev/ttyS9"));
    }
}
