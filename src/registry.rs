//! Process-wide library state with an explicit lifecycle.
//!
//! The only process-wide state this library keeps is the selected platform
//! driver. It lives in a single registry with `initialize`/`uninitialize`
//! calls rather than ambient globals; lookups auto-initialize so embedding
//! code that never calls [`initialize`] still works.

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use tracing::debug;

use crate::platform::{self, PlatformDriver};

struct Registry {
    driver: &'static dyn PlatformDriver,
}

static REGISTRY: Lazy<RwLock<Option<Registry>>> = Lazy::new(|| RwLock::new(None));

/// Initialize process-wide state. Idempotent.
pub fn initialize() {
    let mut slot = REGISTRY.write();
    if slot.is_none() {
        let driver = platform::current();
        debug!(driver = driver.name(), "library initialized");
        *slot = Some(Registry { driver });
    }
}

/// Tear down process-wide state. Idempotent; a later lookup re-initializes.
pub fn uninitialize() {
    let mut slot = REGISTRY.write();
    if slot.take().is_some() {
        debug!("library uninitialized");
    }
}

/// Whether [`initialize`] has run (explicitly or implicitly).
pub fn is_initialized() -> bool {
    REGISTRY.read().is_some()
}

/// The active platform driver, initializing the registry if needed.
pub(crate) fn driver() -> &'static dyn PlatformDriver {
    if let Some(reg) = REGISTRY.read().as_ref() {
        return reg.driver;
    }
    initialize();
    REGISTRY
        .read()
        .as_ref()
        .map(|reg| reg.driver)
        .unwrap_or_else(platform::current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[serial_test::serial]
    fn test_lifecycle_is_idempotent() {
        initialize();
        initialize();
        assert!(is_initialized());
        uninitialize();
        uninitialize();
        assert!(!is_initialized());
    }

    #[test]
    #[serial_test::serial]
    fn test_lookup_auto_initializes() {
        uninitialize();
        let name = driver().name();
        assert!(!name.is_empty());
        assert!(is_initialized());
    }
}
