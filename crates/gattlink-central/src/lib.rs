//! BLE central-role connection manager.
//!
//! This crate drives peripheral discovery and a single GATT session on
//! top of an abstract platform adapter: scan, connect, fire-and-forget
//! MTU negotiation, service discovery, and a reliable write/notify
//! exchange over one characteristic. Everything around it (UI,
//! permission prompts, persistence of known devices, bonding) belongs
//! to the host.
//!
//! # Design Philosophy
//!
//! - **Async-first**: all transport I/O is asynchronous using native
//!   `async fn` in traits (Edition 2024 RPITIT).
//! - **One session**: at most one peripheral connection exists at a
//!   time; `connect` while a session is active is rejected, never a
//!   silent replacement.
//! - **One serialization point**: every transport callback funnels
//!   through `CentralManager::handle_transport_event`, so no state is
//!   ever mutated from two call sites.
//! - **State over exceptions**: transport failures surface through
//!   state and the absence of lifecycle events; only contract
//!   violations are typed, synchronous errors. The core never invents a
//!   timeout policy.
//!
//! # Components
//!
//! - [`traits::BleAdapter`]: the platform capability, commands plus a
//!   serialized [`traits::TransportEvent`] stream.
//! - [`scanner::Scanner`]: discovery policy over the insertion-ordered,
//!   deduplicated [`scanner::DeviceRegistry`].
//! - [`connection`]: the `Idle → Connecting → MtuNegotiating →
//!   DiscoveringServices → Ready` state machine with teardown and an
//!   absorbing `Failed` state.
//! - [`channel`]: single-characteristic write gating and write-outcome
//!   mapping.
//! - [`events::EventBus`]: payload-free lifecycle fan-out
//!   (`DeviceListUpdated`, `ServicesDiscovered`, `CharacteristicReady`,
//!   `WriteSucceeded`).
//! - [`manager::CentralManager`]: ties the above together behind host
//!   commands and read-only snapshot accessors.
//! - [`mock`]: a scripted adapter for tests and development.
//!
//! # Example
//!
//! ```no_run
//! use gattlink_central::manager::CentralManager;
//! use gattlink_central::mock::MockAdapter;
//! use gattlink_central::types::ScanPowerMode;
//!
//! # async fn example() -> gattlink_core::Result<()> {
//! let (adapter, _handle) = MockAdapter::new();
//! let mut central = CentralManager::new(adapter);
//! let _events = central.subscribe();
//!
//! central.start_scan(&[], ScanPowerMode::LowPower).await?;
//! // ... pump transport events, pick a device, connect, configure, send.
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod connection;
pub mod events;
pub mod manager;
pub mod mock;
pub mod scanner;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use channel::{IoChannel, WriteOutcome};
pub use connection::{ConnectionHandle, LinkState, LinkTransition};
pub use events::{EventBus, LifecycleEvent};
pub use manager::{CentralConfig, CentralManager};
pub use scanner::{DeviceRegistry, Scanner};
pub use traits::{BleAdapter, LinkEvent, TransportEvent};
pub use types::{
    GattService, OutboundMessage, ScanFilter, ScanPowerMode, ServiceDescriptor, WriteMode,
};
