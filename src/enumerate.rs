//! Discovery of candidate serial devices.
//!
//! Each scan walks the platform's device registry (sysfs on Linux, `/dev`
//! naming conventions on macOS), merges a fallback list of conventional
//! device names, and deduplicates by system path. Scans are restartable and
//! never fail; an empty list is returned when nothing is found.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::registry;

/// One candidate serial port produced by enumeration.
///
/// Descriptors are plain values; they are not tied to any open handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortDescriptor {
    /// Device node path, e.g. `/dev/ttyUSB0`.
    pub system_path: String,
    /// Short human-readable name.
    pub friendly_name: String,
    /// Longer description (USB product string where available).
    pub description: String,
}

/// Enumerate the serial ports currently present on this machine.
///
/// Results are returned in discovery order, one descriptor per device node
/// (macOS yields a call-out and a dial-in descriptor per physical port).
pub fn list_ports() -> Vec<PortDescriptor> {
    let ports = registry::driver().enumerate();
    debug!(count = ports.len(), "enumerated serial ports");
    ports
}

/// Conventional Linux device-name prefixes, with the label used when no
/// richer description is available from sysfs.
const LINUX_FALLBACK_PREFIXES: &[(&str, &str)] = &[
    ("ttyS", "Physical Serial Port"),
    ("ttyUSB", "USB-Based Serial Port"),
    ("ttyACM", "USB-Based Serial Port"),
    ("ttyAMA", "Physical Serial Port"),
    ("rfcomm", "Bluetooth-Based Serial Port"),
];

/// Scan a sysfs tty class directory plus a `/dev` directory for serial
/// devices. Split out from [`list_ports`] so tests can point it at fixture
/// trees.
#[allow(dead_code)] // selected per target OS by the platform driver
pub(crate) fn scan_linux(sysfs_tty: &Path, dev: &Path) -> Vec<PortDescriptor> {
    let mut ports = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    // Primary scan: tty class entries backed by a real device.
    let mut entries: Vec<_> = match fs::read_dir(sysfs_tty) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => Vec::new(),
    };
    entries.sort_by_key(|e| e.file_name());
    for entry in entries {
        let name = match entry.file_name().into_string() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let device_link = entry.path().join("device");
        if !device_link.exists() {
            continue; // virtual console, not a physical port
        }
        let system_path = dev.join(&name).to_string_lossy().into_owned();
        if !seen.insert(system_path.clone()) {
            continue;
        }
        let (friendly_name, description) = describe_sysfs_device(&device_link, &name);
        ports.push(PortDescriptor {
            system_path,
            friendly_name,
            description,
        });
    }

    // Last-ditch scan: conventional names the class walk may have missed.
    let mut dev_entries: Vec<_> = match fs::read_dir(dev) {
        Ok(rd) => rd.filter_map(|e| e.ok()).collect(),
        Err(_) => Vec::new(),
    };
    dev_entries.sort_by_key(|e| e.file_name());
    for entry in dev_entries {
        let name = match entry.file_name().into_string() {
            Ok(n) => n,
            Err(_) => continue,
        };
        let Some((_, label)) = LINUX_FALLBACK_PREFIXES
            .iter()
            .find(|(prefix, _)| is_numbered_device(&name, prefix))
        else {
            continue;
        };
        let system_path = entry.path().to_string_lossy().into_owned();
        if !seen.insert(system_path.clone()) {
            continue;
        }
        ports.push(PortDescriptor {
            system_path,
            friendly_name: format!("{label} ({name})"),
            description: (*label).to_string(),
        });
    }

    ports
}

/// A device name matching `<prefix><digits>`.
fn is_numbered_device(name: &str, prefix: &str) -> bool {
    name.strip_prefix(prefix)
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

/// Derive a friendly name and description for a sysfs-backed tty.
///
/// USB serial adapters carry a `product` string one or two levels up the
/// device tree; platform UARTs fall back to a generic label.
fn describe_sysfs_device(device_link: &Path, tty_name: &str) -> (String, String) {
    for product in [
        device_link.join("../product"),
        device_link.join("../../product"),
    ] {
        if let Ok(text) = fs::read_to_string(&product) {
            let text = text.trim();
            if !text.is_empty() {
                return (text.to_string(), text.to_string());
            }
        }
    }
    (
        format!("Physical Port {tty_name}"),
        "Physical Serial Port".to_string(),
    )
}

/// Scan a `/dev` directory for macOS call-out (`cu.*`) devices, pairing each
/// with its dial-in (`tty.*`) twin when present.
#[allow(dead_code)] // selected per target OS by the platform driver
pub(crate) fn scan_darwin(dev: &Path) -> Vec<PortDescriptor> {
    let mut ports = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    let mut names: Vec<String> = match fs::read_dir(dev) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();

    for name in names.iter().filter(|n| n.starts_with("cu.")) {
        let suffix = &name["cu.".len()..];
        let callout_path = dev.join(name).to_string_lossy().into_owned();
        if seen.insert(callout_path.clone()) {
            ports.push(PortDescriptor {
                system_path: callout_path,
                friendly_name: suffix.to_string(),
                description: suffix.to_string(),
            });
        }

        let dialin = format!("tty.{suffix}");
        if names.binary_search(&dialin).is_ok() {
            let dialin_path = dev.join(&dialin).to_string_lossy().into_owned();
            if seen.insert(dialin_path.clone()) {
                ports.push(PortDescriptor {
                    system_path: dialin_path,
                    friendly_name: format!("{suffix} (Dial-In)"),
                    description: format!("{suffix} (Dial-In)"),
                });
            }
        }
    }

    ports
}
