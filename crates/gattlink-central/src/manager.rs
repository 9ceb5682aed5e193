//! Central-role connection manager.
//!
//! This module provides the `CentralManager`, which coordinates the
//! scanner, the single GATT session, and the characteristic channel on
//! top of an abstract [`BleAdapter`], and fans lifecycle signals out to
//! host observers.
//!
//! # Architecture
//!
//! ```text
//!  host commands                     transport callbacks
//!  (return immediately)             (one serialized stream)
//!        │                                   │
//!        ▼                                   ▼
//! ┌──────────────────────────────────────────────────┐
//! │                  CentralManager                  │
//! │  Scanner ── DeviceRegistry                       │
//! │  ConnectionHandle ── LinkState machine           │──► EventBus ──► observers
//! │  IoChannel ── write gating / outcome mapping     │
//! └───────────────────────┬──────────────────────────┘
//!                         │ commands
//!                         ▼
//!                    BleAdapter
//! ```
//!
//! # Lifecycle
//!
//! 1. `start_scan` resets the registry and begins discovery.
//! 2. The host picks a device and calls `connect`; the manager requests
//!    the link and an MTU (fire-and-forget) and enters `Connecting`.
//! 3. The link-connected callback advances the state machine and issues
//!    service discovery; discovery success makes the session `Ready` and
//!    emits `ServicesDiscovered`.
//! 4. `configure` binds the channel to one characteristic and emits
//!    `CharacteristicReady`; `send` stages writes, whose completions
//!    emit `WriteSucceeded` on success.
//! 5. `teardown` (or any disconnect) releases the session; stale
//!    callbacks from a superseded session are discarded.
//!
//! # Thread Safety
//!
//! The manager owns all mutable state and must be driven from one task;
//! transport callbacks arrive strictly serialized with respect to each
//! other but asynchronously with respect to host commands.

use crate::channel::{IoChannel, WriteOutcome};
use crate::connection::{ConnectionHandle, LinkState};
use crate::events::{EventBus, LifecycleEvent};
use crate::scanner::Scanner;
use crate::traits::{BleAdapter, LinkEvent, TransportEvent};
use crate::types::{
    GattService, OutboundMessage, ScanFilter, ScanPowerMode, ServiceDescriptor,
};
use gattlink_core::constants::{EVENT_BUS_CAPACITY, GATT_SUCCESS, REQUESTED_MTU};
use gattlink_core::{Error, PeripheralDevice, Result};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Configuration for the central manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralConfig {
    /// ATT MTU requested immediately after each link request.
    pub requested_mtu: u16,

    /// Capacity of the lifecycle event bus.
    pub event_capacity: usize,
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            requested_mtu: REQUESTED_MTU,
            event_capacity: EVENT_BUS_CAPACITY,
        }
    }
}

/// Manages discovery and at most one GATT session at a time.
///
/// Host commands return as soon as the transport accepts them; outcomes
/// arrive through [`TransportEvent`]s handled by
/// [`handle_transport_event`](CentralManager::handle_transport_event)
/// (directly, or via [`pump`](CentralManager::pump) /
/// [`run`](CentralManager::run)).
///
/// All state accessors return read-only snapshots, never live
/// containers.
pub struct CentralManager<A: BleAdapter> {
    adapter: A,
    config: CentralConfig,
    scanner: Scanner,
    connection: Option<ConnectionHandle>,
    channel: IoChannel,
    events: EventBus,
}

impl<A: BleAdapter> CentralManager<A> {
    /// Create a manager with the default configuration.
    pub fn new(adapter: A) -> Self {
        Self::with_config(adapter, CentralConfig::default())
    }

    /// Create a manager with an explicit configuration.
    pub fn with_config(adapter: A, config: CentralConfig) -> Self {
        let events = EventBus::with_capacity(config.event_capacity);
        Self {
            adapter,
            config,
            scanner: Scanner::new(),
            connection: None,
            channel: IoChannel::new(),
            events,
        }
    }

    // ------------------------------------------------------------------
    // Host commands
    // ------------------------------------------------------------------

    /// Begin peripheral discovery.
    ///
    /// Resets the device registry; subsequent observation callbacks
    /// repopulate it.
    ///
    /// # Errors
    ///
    /// Returns `Error::AdapterUnavailable` if no usable adapter
    /// capability is held, or the adapter's error if the transport
    /// rejected the request.
    pub async fn start_scan(&mut self, filters: &[ScanFilter], mode: ScanPowerMode) -> Result<()> {
        if !self.adapter.is_available() {
            return Err(Error::AdapterUnavailable);
        }
        self.scanner.begin();
        self.adapter.start_scan(filters, mode).await?;
        info!(?mode, filter_count = filters.len(), "scan started");
        Ok(())
    }

    /// Stop peripheral discovery.
    ///
    /// Idempotent: a no-op when not scanning or when the adapter is
    /// unavailable.
    ///
    /// # Errors
    ///
    /// Returns the adapter's error if the transport rejected the stop
    /// request.
    pub async fn stop_scan(&mut self) -> Result<()> {
        if !self.adapter.is_available() || !self.scanner.is_scanning() {
            return Ok(());
        }
        self.adapter.stop_scan().await?;
        self.scanner.end();
        debug!("scan stopped");
        Ok(())
    }

    /// Open a GATT session to `device`.
    ///
    /// Requests the link (non-auto-reconnect) and immediately requests
    /// the configured MTU; the MTU result never gates the session.
    ///
    /// # Errors
    ///
    /// Returns `Error::AlreadyConnected` if a session exists in any
    /// state other than `Idle`; an active session is never silently
    /// replaced.
    pub async fn connect(&mut self, device: &PeripheralDevice) -> Result<()> {
        if let Some(handle) = &self.connection {
            warn!(
                address = %device.address,
                state = %handle.state(),
                "connect rejected, session already active"
            );
            return Err(Error::AlreadyConnected {
                state: handle.state().to_string(),
            });
        }

        let mut handle = ConnectionHandle::new(device.clone());
        handle.transition_to(LinkState::Connecting)?;

        self.adapter.connect(&device.address).await?;
        self.adapter.request_mtu(self.config.requested_mtu).await?;

        info!(
            address = %device.address,
            requested_mtu = self.config.requested_mtu,
            "connecting"
        );
        self.connection = Some(handle);
        Ok(())
    }

    /// Tear the session down and release its resources.
    ///
    /// Valid from any state, idempotent, and always ends in `Idle`. The
    /// disconnect request is best-effort; one in-flight transport
    /// callback may still arrive afterwards and will be discarded.
    pub async fn teardown(&mut self) {
        let Some(mut handle) = self.connection.take() else {
            debug!("teardown with no active session");
            return;
        };

        handle.transition_to(LinkState::Disconnecting).ok();
        self.channel.reset();

        if let Err(e) = self.adapter.disconnect().await {
            warn!(error = %e, "disconnect request failed");
        }

        info!(
            address = %handle.device().address,
            uptime_ms = handle.uptime().num_milliseconds(),
            "session closed"
        );
    }

    /// Bind the characteristic channel to a service/characteristic pair.
    ///
    /// Resolves both UUIDs against the discovered topology, keeps the
    /// platform-default write mode, and enables notifications. On
    /// success the channel is initialized and `CharacteristicReady` is
    /// emitted; returns `Ok(false)` (uninitialized, no event) when the
    /// transport declines the notification subscription.
    ///
    /// # Errors
    ///
    /// Returns `Error::LinkNotReady` unless the session is `Ready`,
    /// `Error::CharacteristicNotFound` if either UUID is absent from the
    /// topology, or the adapter's error if the transport rejected the
    /// request.
    pub async fn configure(&mut self, service: Uuid, characteristic: Uuid) -> Result<bool> {
        {
            let Some(handle) = self.connection.as_ref() else {
                return Err(Error::LinkNotReady {
                    state: LinkState::Idle.to_string(),
                });
            };
            if handle.state() != LinkState::Ready {
                return Err(Error::LinkNotReady {
                    state: handle.state().to_string(),
                });
            }
            if !handle.has_characteristic(service, characteristic) {
                return Err(Error::CharacteristicNotFound {
                    service: service.to_string(),
                    characteristic: characteristic.to_string(),
                });
            }
        }

        if self.channel.is_initialized() {
            debug!("channel already configured, keeping existing descriptor");
            return Ok(true);
        }

        let accepted = self
            .adapter
            .enable_notifications(service, characteristic)
            .await?;
        if !accepted {
            warn!(
                service = %service,
                characteristic = %characteristic,
                "notification enable declined by transport"
            );
            return Ok(false);
        }

        let descriptor =
            ServiceDescriptor::new(service, characteristic).with_notifications_enabled();
        self.channel.initialize(descriptor);
        info!(
            service = %service,
            characteristic = %characteristic,
            "characteristic channel initialized"
        );
        self.events.emit(LifecycleEvent::CharacteristicReady);
        Ok(true)
    }

    /// Stage `message` and request a characteristic write.
    ///
    /// Returns the transport's accepted flag synchronously ("request
    /// accepted", not "delivered"); the authoritative outcome arrives
    /// via the write-completion callback and, on success, is broadcast
    /// as `WriteSucceeded`.
    ///
    /// # Errors
    ///
    /// Returns `Error::ChannelNotInitialized` before a successful
    /// `configure`, `Error::WriteInProgress` while a write is
    /// outstanding, or the adapter's error if the transport rejected
    /// the request.
    pub async fn send(&mut self, message: OutboundMessage) -> Result<bool> {
        let descriptor = self.channel.ensure_can_send()?.clone();

        let accepted = self
            .adapter
            .write_characteristic(descriptor.service, descriptor.characteristic, message.payload())
            .await?;
        if accepted {
            self.channel.mark_write_issued();
        }

        debug!(accepted, payload = %message.hex(), "write requested");
        Ok(accepted)
    }

    // ------------------------------------------------------------------
    // Accessors (read-only snapshots)
    // ------------------------------------------------------------------

    /// Snapshot of the observed device list, in first-seen order.
    pub fn devices(&self) -> Vec<PeripheralDevice> {
        self.scanner.devices()
    }

    /// Whether a scan pass is active.
    pub fn is_scanning(&self) -> bool {
        self.scanner.is_scanning()
    }

    /// Last platform scan-failure code, if any (diagnostic only).
    pub fn last_scan_failure(&self) -> Option<i32> {
        self.scanner.last_failure()
    }

    /// Current session state (`Idle` when no session exists).
    pub fn link_state(&self) -> LinkState {
        self.connection
            .as_ref()
            .map_or(LinkState::Idle, ConnectionHandle::state)
    }

    /// The peripheral of the current session, if one exists.
    pub fn connected_device(&self) -> Option<PeripheralDevice> {
        self.connection.as_ref().map(|h| h.device().clone())
    }

    /// Negotiated MTU of the current session.
    pub fn mtu(&self) -> Option<u16> {
        self.connection.as_ref().map(ConnectionHandle::mtu)
    }

    /// Whether the characteristic channel finished configuring.
    pub fn is_initialized(&self) -> bool {
        self.channel.is_initialized()
    }

    /// Descriptor the channel is bound to, once configured.
    pub fn descriptor(&self) -> Option<ServiceDescriptor> {
        self.channel.descriptor().cloned()
    }

    /// Outcome of the most recently completed write, if any.
    pub fn last_write_outcome(&self) -> Option<WriteOutcome> {
        self.channel.last_outcome()
    }

    /// Register a lifecycle-event observer.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.events.subscribe()
    }

    // ------------------------------------------------------------------
    // Transport event handling
    // ------------------------------------------------------------------

    /// Handle one transport callback.
    ///
    /// This is the single serialization point: all callbacks must be
    /// funneled through here (or through `pump`/`run`, which do so) in
    /// the order the transport delivered them. Stale callbacks
    /// referencing a superseded session are discarded, never
    /// misapplied.
    pub async fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::DeviceObserved(device) => self.on_device_observed(device),
            TransportEvent::BatchObserved(devices) => {
                for device in devices {
                    self.on_device_observed(device);
                }
            }
            TransportEvent::ScanFailed(code) => self.scanner.record_failure(code),
            TransportEvent::LinkStateChanged { status, link } => {
                self.on_link_state_changed(status, link).await;
            }
            TransportEvent::MtuChanged { mtu, status } => self.on_mtu_changed(mtu, status),
            TransportEvent::ServicesDiscovered { status, services } => {
                self.on_services_discovered(status, services);
            }
            TransportEvent::WriteCompleted { status } => self.on_write_completed(status),
        }
    }

    /// Drain and handle every queued transport event without waiting.
    ///
    /// Returns the number of events handled. Useful for hosts (and
    /// tests) that drive the manager by polling.
    pub async fn pump(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.adapter.try_next_event() {
            self.handle_transport_event(event).await;
            handled += 1;
        }
        handled
    }

    /// Handle transport events until the transport is gone for good.
    pub async fn run(&mut self) {
        while let Some(event) = self.adapter.next_event().await {
            self.handle_transport_event(event).await;
        }
        debug!("transport event stream closed");
    }

    fn on_device_observed(&mut self, device: PeripheralDevice) {
        if !self.scanner.is_scanning() {
            debug!(address = %device.address, "discarding observation after scan stop");
            return;
        }
        if self.scanner.observe(device) {
            self.events.emit(LifecycleEvent::DeviceListUpdated);
        }
    }

    async fn on_link_state_changed(&mut self, status: u16, link: LinkEvent) {
        if self.connection.is_none() {
            debug!(status, ?link, "discarding link event with no active session");
            return;
        }

        if status != GATT_SUCCESS {
            warn!(status, "link failure, tearing down");
            if let Some(handle) = self.connection.as_mut() {
                // Failed is unreachable from Ready; teardown covers it.
                handle.transition_to(LinkState::Failed).ok();
            }
            self.teardown().await;
            return;
        }

        match link {
            LinkEvent::Connected => {
                {
                    let Some(handle) = self.connection.as_mut() else {
                        return;
                    };
                    let advanced = handle
                        .transition_to(LinkState::MtuNegotiating)
                        .and_then(|_| handle.transition_to(LinkState::DiscoveringServices));
                    if let Err(e) = advanced {
                        warn!(error = %e, "discarding unexpected link-connected callback");
                        return;
                    }
                }
                if let Err(e) = self.adapter.discover_services().await {
                    warn!(error = %e, "service discovery request failed");
                }
                debug!("link connected, discovering services");
            }
            LinkEvent::Disconnected => {
                info!("link disconnected");
                self.teardown().await;
            }
        }
    }

    fn on_mtu_changed(&mut self, mtu: u16, status: u16) {
        let Some(handle) = self.connection.as_mut() else {
            debug!(mtu, status, "discarding MTU result with no active session");
            return;
        };
        if status == GATT_SUCCESS {
            handle.set_mtu(mtu);
            debug!(mtu, "ATT MTU changed");
        } else {
            warn!(status, mtu = handle.mtu(), "MTU negotiation failed, keeping current value");
        }
    }

    fn on_services_discovered(&mut self, status: u16, services: Vec<GattService>) {
        let Some(handle) = self.connection.as_mut() else {
            debug!(status, "discarding discovery result with no active session");
            return;
        };

        if status != GATT_SUCCESS {
            // Soft failure: state stays put, the host may reconnect to retry.
            warn!(status, "service discovery failed");
            return;
        }
        if handle.state() != LinkState::DiscoveringServices {
            debug!(state = %handle.state(), "discarding duplicate discovery result");
            return;
        }

        let service_count = services.len();
        handle.set_topology(services);
        if handle.transition_to(LinkState::Ready).is_ok() {
            info!(service_count, "services discovered, session ready");
            self.events.emit(LifecycleEvent::ServicesDiscovered);
        }
    }

    fn on_write_completed(&mut self, status: u16) {
        if self.connection.is_none() || !self.channel.is_initialized() {
            debug!(status, "discarding write completion with no active channel");
            return;
        }
        if !self.channel.has_outstanding_write() {
            debug!(status, "discarding unmatched write completion");
            return;
        }

        let outcome = self.channel.complete_write(status);
        match outcome {
            WriteOutcome::Success => {
                info!("characteristic write acknowledged");
                self.events.emit(LifecycleEvent::WriteSucceeded);
            }
            WriteOutcome::AttributeLengthExceeded => {
                error!("write exceeded connection ATT MTU");
            }
            WriteOutcome::WriteNotPermitted => {
                error!("write not permitted");
            }
            WriteOutcome::OtherTransportError(code) => {
                error!(code, "characteristic write failed");
            }
        }
    }
}
