//! Mock BLE adapter for testing and development.
//!
//! The adapter half implements [`BleAdapter`] and records every command
//! it is asked to perform; the handle half injects transport events and
//! inspects the recorded commands. Together they let tests script a
//! peripheral's behavior deterministically, without hardware.

use crate::traits::{BleAdapter, LinkEvent, TransportEvent};
use crate::types::{GattService, ScanFilter, ScanPowerMode};
use gattlink_core::constants::GATT_SUCCESS;
use gattlink_core::{DeviceAddress, Error, PeripheralDevice, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use uuid::Uuid;

/// A command the manager issued to the transport, as recorded by the
/// mock. Tests assert on these to verify which requests were (not)
/// made.
#[derive(Debug, Clone, PartialEq)]
pub enum AdapterCommand {
    /// `start_scan` was requested.
    StartScan {
        /// Filters passed by the host.
        filters: Vec<ScanFilter>,
        /// Requested duty cycle.
        mode: ScanPowerMode,
    },

    /// `stop_scan` was requested.
    StopScan,

    /// `connect` was requested.
    Connect {
        /// Target address.
        address: DeviceAddress,
    },

    /// `request_mtu` was requested.
    RequestMtu(u16),

    /// `discover_services` was requested.
    DiscoverServices,

    /// `enable_notifications` was requested.
    EnableNotifications {
        /// Service UUID.
        service: Uuid,
        /// Characteristic UUID.
        characteristic: Uuid,
    },

    /// `write_characteristic` was requested.
    WriteCharacteristic {
        /// Service UUID.
        service: Uuid,
        /// Characteristic UUID.
        characteristic: Uuid,
        /// Staged payload.
        value: Vec<u8>,
    },

    /// `disconnect` was requested.
    Disconnect,
}

/// Mock BLE adapter.
///
/// Created together with its [`MockAdapterHandle`]; the handle injects
/// events and drains the command log.
///
/// # Examples
///
/// ```
/// use gattlink_central::mock::{AdapterCommand, MockAdapter};
/// use gattlink_central::traits::BleAdapter;
/// use gattlink_core::DeviceAddress;
///
/// #[tokio::main]
/// async fn main() -> gattlink_core::Result<()> {
///     let (mut adapter, mut handle) = MockAdapter::new();
///
///     let address = DeviceAddress::new("AA:BB:CC:DD:EE:FF")?;
///     adapter.connect(&address).await?;
///
///     assert_eq!(
///         handle.try_next_command(),
///         Some(AdapterCommand::Connect { address })
///     );
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockAdapter {
    event_rx: mpsc::Receiver<TransportEvent>,
    command_tx: mpsc::UnboundedSender<AdapterCommand>,
    available: Arc<AtomicBool>,
    accept_writes: Arc<AtomicBool>,
    accept_notifications: Arc<AtomicBool>,
}

impl MockAdapter {
    /// Create a mock adapter together with its control handle.
    pub fn new() -> (Self, MockAdapterHandle) {
        let (event_tx, event_rx) = mpsc::channel(32);
        let (command_tx, command_rx) = mpsc::unbounded_channel();

        let available = Arc::new(AtomicBool::new(true));
        let accept_writes = Arc::new(AtomicBool::new(true));
        let accept_notifications = Arc::new(AtomicBool::new(true));

        let adapter = Self {
            event_rx,
            command_tx,
            available: available.clone(),
            accept_writes: accept_writes.clone(),
            accept_notifications: accept_notifications.clone(),
        };

        let handle = MockAdapterHandle {
            event_tx,
            command_rx,
            available,
            accept_writes,
            accept_notifications,
        };

        (adapter, handle)
    }

    fn record(&self, command: AdapterCommand) {
        // The handle may already be gone in teardown-order tests.
        let _ = self.command_tx.send(command);
    }
}

impl BleAdapter for MockAdapter {
    fn is_available(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn start_scan(&mut self, filters: &[ScanFilter], mode: ScanPowerMode) -> Result<()> {
        self.record(AdapterCommand::StartScan {
            filters: filters.to_vec(),
            mode,
        });
        Ok(())
    }

    async fn stop_scan(&mut self) -> Result<()> {
        self.record(AdapterCommand::StopScan);
        Ok(())
    }

    async fn connect(&mut self, address: &DeviceAddress) -> Result<()> {
        self.record(AdapterCommand::Connect {
            address: address.clone(),
        });
        Ok(())
    }

    async fn request_mtu(&mut self, mtu: u16) -> Result<()> {
        self.record(AdapterCommand::RequestMtu(mtu));
        Ok(())
    }

    async fn discover_services(&mut self) -> Result<()> {
        self.record(AdapterCommand::DiscoverServices);
        Ok(())
    }

    async fn enable_notifications(&mut self, service: Uuid, characteristic: Uuid) -> Result<bool> {
        self.record(AdapterCommand::EnableNotifications {
            service,
            characteristic,
        });
        Ok(self.accept_notifications.load(Ordering::SeqCst))
    }

    async fn write_characteristic(
        &mut self,
        service: Uuid,
        characteristic: Uuid,
        value: &[u8],
    ) -> Result<bool> {
        self.record(AdapterCommand::WriteCharacteristic {
            service,
            characteristic,
            value: value.to_vec(),
        });
        Ok(self.accept_writes.load(Ordering::SeqCst))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.record(AdapterCommand::Disconnect);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        self.event_rx.recv().await
    }

    fn try_next_event(&mut self) -> Option<TransportEvent> {
        self.event_rx.try_recv().ok()
    }
}

/// Handle for scripting a [`MockAdapter`].
///
/// Injection methods mirror the transport callbacks one-to-one; each
/// queues one event for the adapter's event stream.
#[derive(Debug)]
pub struct MockAdapterHandle {
    event_tx: mpsc::Sender<TransportEvent>,
    command_rx: mpsc::UnboundedReceiver<AdapterCommand>,
    available: Arc<AtomicBool>,
    accept_writes: Arc<AtomicBool>,
    accept_notifications: Arc<AtomicBool>,
}

impl MockAdapterHandle {
    /// Toggle adapter availability.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Control whether `write_characteristic` reports the request as
    /// accepted.
    pub fn set_write_accepted(&self, accepted: bool) {
        self.accept_writes.store(accepted, Ordering::SeqCst);
    }

    /// Control whether `enable_notifications` reports the subscription
    /// as accepted.
    pub fn set_notifications_accepted(&self, accepted: bool) {
        self.accept_notifications.store(accepted, Ordering::SeqCst);
    }

    async fn emit(&self, event: TransportEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| Error::AdapterUnavailable)
    }

    /// Deliver a single scan observation.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn observe_device(&self, device: PeripheralDevice) -> Result<()> {
        self.emit(TransportEvent::DeviceObserved(device)).await
    }

    /// Deliver a batch of scan observations, preserving order.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn observe_batch(&self, devices: Vec<PeripheralDevice>) -> Result<()> {
        self.emit(TransportEvent::BatchObserved(devices)).await
    }

    /// Deliver a platform scan failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn scan_failed(&self, code: i32) -> Result<()> {
        self.emit(TransportEvent::ScanFailed(code)).await
    }

    /// Deliver a successful link-connected callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn link_connected(&self) -> Result<()> {
        self.emit(TransportEvent::LinkStateChanged {
            status: GATT_SUCCESS,
            link: LinkEvent::Connected,
        })
        .await
    }

    /// Deliver a graceful link-disconnected callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn link_disconnected(&self) -> Result<()> {
        self.emit(TransportEvent::LinkStateChanged {
            status: GATT_SUCCESS,
            link: LinkEvent::Disconnected,
        })
        .await
    }

    /// Deliver a link failure with the given status word.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn link_failed(&self, status: u16) -> Result<()> {
        self.emit(TransportEvent::LinkStateChanged {
            status,
            link: LinkEvent::Disconnected,
        })
        .await
    }

    /// Deliver an MTU negotiation result.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn mtu_changed(&self, mtu: u16, status: u16) -> Result<()> {
        self.emit(TransportEvent::MtuChanged { mtu, status }).await
    }

    /// Deliver a successful service-discovery result with the given
    /// topology.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn services_discovered(&self, services: Vec<GattService>) -> Result<()> {
        self.emit(TransportEvent::ServicesDiscovered {
            status: GATT_SUCCESS,
            services,
        })
        .await
    }

    /// Deliver a failed service-discovery result.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn services_discovery_failed(&self, status: u16) -> Result<()> {
        self.emit(TransportEvent::ServicesDiscovered {
            status,
            services: Vec::new(),
        })
        .await
    }

    /// Deliver a write-completion callback.
    ///
    /// # Errors
    ///
    /// Returns an error if the adapter half has been dropped.
    pub async fn write_completed(&self, status: u16) -> Result<()> {
        self.emit(TransportEvent::WriteCompleted { status }).await
    }

    /// Take the next recorded command, if any.
    pub fn try_next_command(&mut self) -> Option<AdapterCommand> {
        self.command_rx.try_recv().ok()
    }

    /// Drain every recorded command.
    pub fn drain_commands(&mut self) -> Vec<AdapterCommand> {
        let mut commands = Vec::new();
        while let Some(command) = self.try_next_command() {
            commands.push(command);
        }
        commands
    }
}
