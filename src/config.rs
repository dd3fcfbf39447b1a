//! Port settings, timeout policy, and wire-compatible numeric encodings.
//!
//! The bitset constants in [`flow`], [`timeout`], and [`event`] are part of
//! the external binding contract and must keep their exact values.

use serde::{Deserialize, Serialize};

/// Flow control bitset members. Combine with `|`; `0` disables flow control.
pub mod flow {
    pub const DISABLED: u32 = 0x0000_0000;
    pub const RTS_ENABLED: u32 = 0x0000_0001;
    pub const CTS_ENABLED: u32 = 0x0000_0010;
    pub const DSR_ENABLED: u32 = 0x0000_0100;
    pub const DTR_ENABLED: u32 = 0x0000_1000;
    pub const XONXOFF_IN_ENABLED: u32 = 0x0001_0000;
    pub const XONXOFF_OUT_ENABLED: u32 = 0x0010_0000;
}

/// Timeout mode bitset members. `NONBLOCKING` is the empty set.
pub mod timeout {
    pub const NONBLOCKING: u32 = 0x0000_0000;
    pub const READ_SEMI_BLOCKING: u32 = 0x0000_0001;
    pub const READ_BLOCKING: u32 = 0x0000_0010;
    pub const WRITE_BLOCKING: u32 = 0x0000_0100;
    pub const SCANNER: u32 = 0x0000_1000;
}

/// Readiness / listening event bits.
pub mod event {
    pub const DATA_AVAILABLE: u32 = 0x0000_0001;
    pub const DATA_RECEIVED: u32 = 0x0000_0010;
    pub const DATA_WRITTEN: u32 = 0x0000_0100;
}

/// Number of data bits per character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum DataBits {
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
}

impl DataBits {
    /// The character width as a plain integer.
    pub fn bits(self) -> u8 {
        self as u8
    }
}

/// Parity checking modes, numerically compatible with the binding contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum Parity {
    None = 0,
    Odd = 1,
    Even = 2,
    Mark = 3,
    Space = 4,
}

/// Stop bit configuration. `OnePointFive` is accepted for compatibility and
/// programmed as a single stop bit on POSIX systems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum StopBits {
    One = 1,
    OnePointFive = 2,
    Two = 3,
}

/// RS-485 transceiver settings, programmed best-effort where the platform
/// supports them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rs485Settings {
    pub enabled: bool,
    /// Delay between asserting RTS and starting transmission, in microseconds.
    pub delay_before_send_us: u32,
    /// Delay between the end of transmission and releasing RTS, in microseconds.
    pub delay_after_send_us: u32,
}

/// Logical configuration for one serial port.
///
/// Mutated by the owning caller before or while the port is open; translated
/// into line-discipline state when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSettings {
    /// Baud rate in bits per second. Rates without a standard POSIX code are
    /// programmed through the platform's custom-rate path.
    pub baud_rate: u32,
    pub data_bits: DataBits,
    pub stop_bits: StopBits,
    pub parity: Parity,
    /// Bitset of [`flow`] members.
    pub flow_control: u32,
    /// Requested transmit queue size in bytes (best-effort).
    pub send_queue_size: u32,
    /// Requested receive queue size in bytes (best-effort).
    pub receive_queue_size: u32,
    pub rs485: Rs485Settings,
    /// When false (together with `rts_on_open`), hang-up-on-close is
    /// suppressed so the line does not toggle when the port is released.
    pub dtr_on_open: bool,
    pub rts_on_open: bool,
    /// Skip line-discipline programming entirely. Used to probe a device's
    /// post-configuration behavior without mutating it; exclusivity is still
    /// enforced.
    pub disable_config: bool,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            baud_rate: 9600,
            data_bits: DataBits::Eight,
            stop_bits: StopBits::One,
            parity: Parity::None,
            flow_control: flow::DISABLED,
            send_queue_size: 4096,
            receive_queue_size: 4096,
            rs485: Rs485Settings::default(),
            dtr_on_open: true,
            rts_on_open: true,
            disable_config: false,
        }
    }
}

/// Read/write blocking behavior for one serial port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    /// Bitset of [`timeout`] members.
    pub mode: u32,
    pub read_timeout_ms: u32,
    pub write_timeout_ms: u32,
    /// Bitset of [`event`] members the caller intends to monitor; monitoring
    /// `DATA_RECEIVED` overrides the read timeout plan.
    pub event_flags: u32,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            mode: timeout::NONBLOCKING,
            read_timeout_ms: 0,
            write_timeout_ms: 0,
            event_flags: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = PortSettings::default();
        assert_eq!(s.baud_rate, 9600);
        assert_eq!(s.data_bits, DataBits::Eight);
        assert_eq!(s.stop_bits, StopBits::One);
        assert_eq!(s.parity, Parity::None);
        assert_eq!(s.flow_control, flow::DISABLED);
        assert!(s.dtr_on_open);
        assert!(s.rts_on_open);
        assert!(!s.disable_config);
    }

    #[test]
    fn test_binding_contract_encodings() {
        // These values are fixed by the external binding contract.
        assert_eq!(Parity::None as u32, 0);
        assert_eq!(Parity::Odd as u32, 1);
        assert_eq!(Parity::Even as u32, 2);
        assert_eq!(Parity::Mark as u32, 3);
        assert_eq!(Parity::Space as u32, 4);

        assert_eq!(StopBits::One as u32, 1);
        assert_eq!(StopBits::OnePointFive as u32, 2);
        assert_eq!(StopBits::Two as u32, 3);

        assert_eq!(flow::RTS_ENABLED, 0x0001);
        assert_eq!(flow::CTS_ENABLED, 0x0010);
        assert_eq!(flow::XONXOFF_IN_ENABLED, 0x1_0000);
        assert_eq!(flow::XONXOFF_OUT_ENABLED, 0x10_0000);

        assert_eq!(timeout::NONBLOCKING, 0);
        assert_eq!(timeout::READ_SEMI_BLOCKING, 0x0001);
        assert_eq!(timeout::READ_BLOCKING, 0x0010);
        assert_eq!(timeout::WRITE_BLOCKING, 0x0100);
        assert_eq!(timeout::SCANNER, 0x1000);

        assert_eq!(event::DATA_AVAILABLE, 0x001);
        assert_eq!(event::DATA_RECEIVED, 0x010);
        assert_eq!(event::DATA_WRITTEN, 0x100);
    }

    #[test]
    fn test_timeout_mode_bits_are_independent() {
        let combined = timeout::READ_BLOCKING | timeout::WRITE_BLOCKING;
        assert_ne!(combined & timeout::READ_BLOCKING, 0);
        assert_ne!(combined & timeout::WRITE_BLOCKING, 0);
        assert_eq!(combined & timeout::READ_SEMI_BLOCKING, 0);
        assert_eq!(combined & timeout::SCANNER, 0);
    }

    #[test]
    fn test_settings_serde_roundtrip() {
        let s = PortSettings {
            baud_rate: 250_000,
            parity: Parity::Mark,
            flow_control: flow::XONXOFF_IN_ENABLED | flow::XONXOFF_OUT_ENABLED,
            ..Default::default()
        };
        let json = serde_json::to_string(&s).expect("serialize");
        let back: PortSettings = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, s);
    }
}
