//! Adapter capability trait definitions.
//!
//! This module defines the abstract surface the central manager drives:
//! every platform BLE stack (or mock) is wrapped in a [`BleAdapter`] that
//! accepts fire-and-forget commands and feeds completions back as
//! [`TransportEvent`]s over a single serialized event stream.
//!
//! The trait uses native `async fn` methods (Edition 2024 RPITIT), so no
//! `async_trait` macro is needed.

#![allow(async_fn_in_trait)]

use crate::types::{GattService, ScanFilter, ScanPowerMode};
use gattlink_core::{DeviceAddress, PeripheralDevice, Result};
use uuid::Uuid;

/// Physical link state reported by a connection-state callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    /// The GATT link came up.
    Connected,

    /// The GATT link went down (gracefully or not).
    Disconnected,
}

/// Asynchronous completion delivered by the transport.
///
/// The transport delivers all events on one serialized callback context:
/// events never race each other, only the host's commands. Status words
/// are raw GATT codes; `GATT_SUCCESS` (0) means success.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A peripheral advertisement was observed during scanning.
    DeviceObserved(PeripheralDevice),

    /// A batch of advertisements, in observation order.
    BatchObserved(Vec<PeripheralDevice>),

    /// Platform-level scan failure (diagnostic only).
    ScanFailed(i32),

    /// The link to the peripheral changed state.
    LinkStateChanged {
        /// Raw GATT status for the transition.
        status: u16,
        /// New physical link state.
        link: LinkEvent,
    },

    /// Result of the MTU request issued at connect time.
    MtuChanged {
        /// Negotiated ATT MTU.
        mtu: u16,
        /// Raw GATT status; on failure the previous MTU stays in effect.
        status: u16,
    },

    /// Result of service discovery.
    ServicesDiscovered {
        /// Raw GATT status.
        status: u16,
        /// Discovered topology; empty on failure.
        services: Vec<GattService>,
    },

    /// Completion of the most recently issued characteristic write.
    WriteCompleted {
        /// Raw GATT status, mapped to a `WriteOutcome` by the channel.
        status: u16,
    },
}

/// Platform BLE adapter capability (central role).
///
/// Commands return as soon as the transport has accepted the request;
/// outcomes arrive later as [`TransportEvent`]s. Implementations must
/// deliver events in the order the underlying stack produced them.
///
/// # Object Safety and Dynamic Dispatch
///
/// **NOTE**: This trait is NOT object-safe because `async fn` methods
/// return `impl Future` (Edition 2024 RPITIT). Use generic type
/// parameters, as `CentralManager<A: BleAdapter>` does.
pub trait BleAdapter: Send + Sync {
    /// Whether a usable adapter is present and powered.
    fn is_available(&self) -> bool;

    /// Begin platform-level discovery.
    ///
    /// Observed advertisements arrive as `DeviceObserved` /
    /// `BatchObserved` events; platform failures as `ScanFailed`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn start_scan(&mut self, filters: &[ScanFilter], mode: ScanPowerMode) -> Result<()>;

    /// Stop platform-level discovery and release the scan callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn stop_scan(&mut self) -> Result<()>;

    /// Open a GATT link to the peripheral at `address`.
    ///
    /// Non-auto-reconnect semantics: a dropped link is reported via
    /// `LinkStateChanged` and never silently retried.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn connect(&mut self, address: &DeviceAddress) -> Result<()>;

    /// Request an ATT MTU for the pending or open link.
    ///
    /// The result arrives as `MtuChanged` and never gates the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn request_mtu(&mut self, mtu: u16) -> Result<()>;

    /// Start service discovery on the open link.
    ///
    /// The result arrives as `ServicesDiscovered`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn discover_services(&mut self) -> Result<()>;

    /// Subscribe to notifications on a characteristic.
    ///
    /// Returns the transport's accepted flag: `false` means the stack
    /// declined the subscription request.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn enable_notifications(&mut self, service: Uuid, characteristic: Uuid) -> Result<bool>;

    /// Stage `value` and request a characteristic write.
    ///
    /// Returns the transport's accepted flag ("request accepted", not
    /// "delivered"); the authoritative outcome arrives as
    /// `WriteCompleted`.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn write_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<bool>;

    /// Request link disconnect and release the session resource.
    ///
    /// Best-effort: one in-flight event may still arrive afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the transport could not accept the request.
    async fn disconnect(&mut self) -> Result<()>;

    /// Wait for the next transport event.
    ///
    /// Returns `None` once the transport is gone for good.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Take the next transport event without waiting, if one is queued.
    fn try_next_event(&mut self) -> Option<TransportEvent>;
}
