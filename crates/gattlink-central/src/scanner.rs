//! Peripheral discovery and the device registry.
//!
//! The scanner owns the [`DeviceRegistry`] exclusively: it is cleared
//! every time scanning begins, deduplicates peripherals by address in
//! first-seen order, and drops peripherals that advertise no resolvable
//! name. Not every discoverable device is a candidate: an unnamed
//! advertisement is policy-filtered, not an error.
//!
//! Platform scan failures are recorded as diagnostics only; the host
//! observes "no devices found" through the registry rather than through a
//! typed failure.

use gattlink_core::{DeviceAddress, PeripheralDevice};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Insertion-ordered set of observed peripherals, keyed by address.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Vec<PeripheralDevice>,
    seen: HashSet<DeviceAddress>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.devices.clear();
        self.seen.clear();
    }

    /// Whether a peripheral with this address has been observed.
    #[must_use]
    pub fn contains(&self, address: &DeviceAddress) -> bool {
        self.seen.contains(address)
    }

    /// Insert a peripheral, returning `false` if its address is already
    /// present. First-seen order is preserved.
    pub fn insert(&mut self, device: PeripheralDevice) -> bool {
        if !self.seen.insert(device.address.clone()) {
            return false;
        }
        self.devices.push(device);
        true
    }

    /// Number of distinct peripherals observed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Read-only snapshot of the registry, in first-seen order.
    ///
    /// Returns a clone, never the live container.
    #[must_use]
    pub fn snapshot(&self) -> Vec<PeripheralDevice> {
        self.devices.clone()
    }
}

/// Discovery policy layer over the registry.
#[derive(Debug, Default)]
pub struct Scanner {
    registry: DeviceRegistry,
    scanning: bool,
    last_failure: Option<i32>,
}

impl Scanner {
    /// Create a scanner with an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a scan pass: clears the registry and the failure diagnostic.
    pub fn begin(&mut self) {
        self.registry.clear();
        self.last_failure = None;
        self.scanning = true;
    }

    /// End the scan pass.
    pub fn end(&mut self) {
        self.scanning = false;
    }

    /// Whether a scan pass is active.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Apply the observation policy to one advertisement.
    ///
    /// Unnamed peripherals are filtered out; duplicates (by address) are
    /// ignored. Returns `true` if the device entered the registry.
    pub fn observe(&mut self, device: PeripheralDevice) -> bool {
        if !device.has_name() {
            debug!(address = %device.address, "ignoring unnamed peripheral");
            return false;
        }
        if !self.registry.insert(device.clone()) {
            debug!(address = %device.address, "duplicate observation ignored");
            return false;
        }
        debug!(
            address = %device.address,
            name = device.name.as_deref().unwrap_or_default(),
            rssi = device.rssi,
            "device observed"
        );
        true
    }

    /// Apply the per-device policy to a batch, preserving its order.
    ///
    /// Returns how many devices entered the registry.
    pub fn observe_batch(&mut self, devices: Vec<PeripheralDevice>) -> usize {
        devices.into_iter().filter(|d| self.observe(d.clone())).count()
    }

    /// Record a platform scan failure.
    ///
    /// Diagnostic only: the failure is logged and retained, never raised
    /// to the host as a typed error.
    pub fn record_failure(&mut self, code: i32) {
        warn!(code, "BLE scan failed");
        self.last_failure = Some(code);
    }

    /// Last recorded scan-failure code, if any.
    #[must_use]
    pub fn last_failure(&self) -> Option<i32> {
        self.last_failure
    }

    /// Snapshot of the observed device list.
    #[must_use]
    pub fn devices(&self) -> Vec<PeripheralDevice> {
        self.registry.snapshot()
    }

    /// Number of distinct peripherals observed this pass.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.registry.len()
    }
}
