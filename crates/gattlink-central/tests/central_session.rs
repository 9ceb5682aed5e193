//! Integration tests for the end-to-end central session flow.
//!
//! These tests drive the complete lifecycle through the mock transport:
//! 1. Scan → observe → registry population and dedup
//! 2. Connect → link up → service discovery → Ready
//! 3. Configure → send → write completion
//! and the failure/teardown paths around it.

use gattlink_central::channel::WriteOutcome;
use gattlink_central::connection::LinkState;
use gattlink_central::events::LifecycleEvent;
use gattlink_central::manager::CentralManager;
use gattlink_central::mock::{AdapterCommand, MockAdapter, MockAdapterHandle};
use gattlink_central::types::{GattService, OutboundMessage, ScanPowerMode};
use gattlink_core::constants::{GATT_SUCCESS, MIN_ATT_MTU, REQUESTED_MTU};
use gattlink_core::{DeviceAddress, Error, PeripheralDevice};
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// Test Data
// ============================================================================

/// Common test data used across multiple tests
mod test_data {
    /// Address of the peripheral under test
    pub const WIDGET_ADDRESS: &str = "AA:BB:CC:DD:EE:FF";

    /// Advertised name of the peripheral under test
    pub const WIDGET_NAME: &str = "Widget";

    /// Service UUID the channel binds to
    pub const SERVICE: u128 = 0x1812;

    /// Characteristic UUID the channel binds to
    pub const CHARACTERISTIC: u128 = 0x2A4D;

    /// A status word no mapping recognizes
    pub const STATUS_FAILURE: u16 = 0x0085;
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn widget() -> PeripheralDevice {
    PeripheralDevice::new(DeviceAddress::new(test_data::WIDGET_ADDRESS).unwrap())
        .with_name(test_data::WIDGET_NAME)
        .with_rssi(-58)
}

fn service_uuid() -> Uuid {
    Uuid::from_u128(test_data::SERVICE)
}

fn characteristic_uuid() -> Uuid {
    Uuid::from_u128(test_data::CHARACTERISTIC)
}

fn topology() -> Vec<GattService> {
    vec![GattService::new(service_uuid(), vec![characteristic_uuid()])]
}

/// Collect every lifecycle event currently queued on the receiver.
fn drain_events(rx: &mut broadcast::Receiver<LifecycleEvent>) -> Vec<LifecycleEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Drive a manager to the Ready state with the widget connected.
///
/// The returned event receiver is drained of the setup-phase events, so
/// tests only observe what they trigger themselves.
async fn ready_manager() -> (
    CentralManager<MockAdapter>,
    MockAdapterHandle,
    broadcast::Receiver<LifecycleEvent>,
) {
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);
    let mut events = central.subscribe();

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    handle.observe_device(widget()).await.unwrap();
    central.pump().await;

    central.connect(&widget()).await.unwrap();
    handle.link_connected().await.unwrap();
    handle.services_discovered(topology()).await.unwrap();
    central.pump().await;

    assert_eq!(central.link_state(), LinkState::Ready);
    drain_events(&mut events);
    (central, handle, events)
}

// ============================================================================
// End-to-End Flow
// ============================================================================

#[tokio::test]
async fn end_to_end_session_flow() {
    init_tracing();
    let (adapter, mut handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);
    let mut events = central.subscribe();

    // Scan and observe the same peripheral twice.
    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    handle.observe_device(widget()).await.unwrap();
    handle.observe_device(widget()).await.unwrap();
    central.pump().await;

    let devices = central.devices();
    assert_eq!(devices.len(), 1);
    assert_eq!(devices[0].name.as_deref(), Some(test_data::WIDGET_NAME));
    assert_eq!(drain_events(&mut events), vec![LifecycleEvent::DeviceListUpdated]);

    // Connect: link + MTU request go out immediately.
    central.connect(&devices[0]).await.unwrap();
    assert_eq!(central.link_state(), LinkState::Connecting);
    assert_eq!(central.mtu(), Some(MIN_ATT_MTU));

    let commands = handle.drain_commands();
    assert!(commands.contains(&AdapterCommand::Connect {
        address: devices[0].address.clone()
    }));
    assert!(commands.contains(&AdapterCommand::RequestMtu(REQUESTED_MTU)));

    // Link comes up; discovery is issued and completes.
    handle.link_connected().await.unwrap();
    handle.services_discovered(topology()).await.unwrap();
    central.pump().await;

    assert_eq!(central.link_state(), LinkState::Ready);
    assert_eq!(drain_events(&mut events), vec![LifecycleEvent::ServicesDiscovered]);
    assert!(
        handle
            .drain_commands()
            .contains(&AdapterCommand::DiscoverServices)
    );

    // Configure the channel.
    let initialized = central
        .configure(service_uuid(), characteristic_uuid())
        .await
        .unwrap();
    assert!(initialized);
    assert!(central.is_initialized());
    assert_eq!(
        drain_events(&mut events),
        vec![LifecycleEvent::CharacteristicReady]
    );

    // Send and complete a write.
    let accepted = central
        .send(OutboundMessage::new(vec![0x01, 0x02]))
        .await
        .unwrap();
    assert!(accepted);

    handle.write_completed(GATT_SUCCESS).await.unwrap();
    central.pump().await;

    assert_eq!(central.last_write_outcome(), Some(WriteOutcome::Success));
    assert_eq!(drain_events(&mut events), vec![LifecycleEvent::WriteSucceeded]);

    // A duplicate completion must not re-emit WriteSucceeded.
    handle.write_completed(GATT_SUCCESS).await.unwrap();
    central.pump().await;
    assert!(drain_events(&mut events).is_empty());
}

// ============================================================================
// Scanner Behavior
// ============================================================================

#[tokio::test]
async fn scan_requires_available_adapter() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    handle.set_available(false);
    let result = central.start_scan(&[], ScanPowerMode::LowPower).await;
    assert!(matches!(result, Err(Error::AdapterUnavailable)));
    assert!(!central.is_scanning());
}

#[tokio::test]
async fn stop_scan_is_idempotent() {
    init_tracing();
    let (adapter, mut handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    // Not scanning: no transport request goes out.
    central.stop_scan().await.unwrap();
    assert!(handle.drain_commands().is_empty());

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    central.stop_scan().await.unwrap();
    central.stop_scan().await.unwrap();

    let stops = handle
        .drain_commands()
        .into_iter()
        .filter(|c| *c == AdapterCommand::StopScan)
        .count();
    assert_eq!(stops, 1);
}

#[tokio::test]
async fn scan_restart_resets_registry() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    handle.observe_device(widget()).await.unwrap();
    central.pump().await;
    assert_eq!(central.devices().len(), 1);

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    assert!(central.devices().is_empty());
}

#[tokio::test]
async fn unnamed_devices_are_filtered_without_events() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);
    let mut events = central.subscribe();

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    let unnamed = PeripheralDevice::new(DeviceAddress::new("11:22:33:44:55:66").unwrap());
    handle.observe_device(unnamed).await.unwrap();
    central.pump().await;

    assert!(central.devices().is_empty());
    assert!(drain_events(&mut events).is_empty());
}

#[tokio::test]
async fn batch_observation_preserves_order_and_dedups() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);
    let mut events = central.subscribe();

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();

    let second = PeripheralDevice::new(DeviceAddress::new("11:22:33:44:55:66").unwrap())
        .with_name("Gadget");
    handle
        .observe_batch(vec![widget(), second.clone(), widget()])
        .await
        .unwrap();
    central.pump().await;

    let names: Vec<_> = central
        .devices()
        .into_iter()
        .map(|d| d.name.unwrap())
        .collect();
    assert_eq!(names, vec!["Widget", "Gadget"]);
    assert_eq!(
        drain_events(&mut events),
        vec![
            LifecycleEvent::DeviceListUpdated,
            LifecycleEvent::DeviceListUpdated
        ]
    );
}

#[tokio::test]
async fn scan_failure_is_diagnostic_only() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    handle.scan_failed(2).await.unwrap();
    central.pump().await;

    assert_eq!(central.last_scan_failure(), Some(2));
    assert!(central.is_scanning());
    assert!(central.devices().is_empty());
}

// ============================================================================
// Session Lifecycle
// ============================================================================

#[tokio::test]
async fn second_connect_is_rejected_and_first_session_untouched() {
    init_tracing();
    let (adapter, _handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    central.connect(&widget()).await.unwrap();
    assert_eq!(central.link_state(), LinkState::Connecting);

    let other = PeripheralDevice::new(DeviceAddress::new("11:22:33:44:55:66").unwrap())
        .with_name("Gadget");
    let result = central.connect(&other).await;

    assert!(matches!(result, Err(Error::AlreadyConnected { .. })));
    assert_eq!(central.link_state(), LinkState::Connecting);
    assert_eq!(
        central.connected_device().unwrap().address,
        widget().address
    );
}

#[tokio::test]
async fn disconnect_resets_from_any_state() {
    init_tracing();
    // Mid-handshake disconnect: state DiscoveringServices.
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    central.connect(&widget()).await.unwrap();
    handle.link_connected().await.unwrap();
    central.pump().await;
    assert_eq!(central.link_state(), LinkState::DiscoveringServices);

    handle.link_disconnected().await.unwrap();
    central.pump().await;

    assert_eq!(central.link_state(), LinkState::Idle);
    assert!(central.connected_device().is_none());
    assert_eq!(central.mtu(), None);
}

#[tokio::test]
async fn link_failure_status_tears_down() {
    init_tracing();
    let (adapter, mut handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    central.connect(&widget()).await.unwrap();
    handle.link_failed(test_data::STATUS_FAILURE).await.unwrap();
    central.pump().await;

    assert_eq!(central.link_state(), LinkState::Idle);
    assert!(
        handle
            .drain_commands()
            .contains(&AdapterCommand::Disconnect)
    );
}

#[tokio::test]
async fn discovery_failure_is_soft() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);
    let mut events = central.subscribe();

    central.connect(&widget()).await.unwrap();
    handle.link_connected().await.unwrap();
    handle
        .services_discovery_failed(test_data::STATUS_FAILURE)
        .await
        .unwrap();
    central.pump().await;

    // State stays put; no ServicesDiscovered; host may reconnect to retry.
    assert_eq!(central.link_state(), LinkState::DiscoveringServices);
    assert!(drain_events(&mut events).is_empty());
}

#[tokio::test]
async fn mtu_result_never_gates_the_session() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    central.connect(&widget()).await.unwrap();
    handle.link_connected().await.unwrap();
    // MTU failure arrives after discovery was already issued.
    handle
        .mtu_changed(0, test_data::STATUS_FAILURE)
        .await
        .unwrap();
    handle.services_discovered(topology()).await.unwrap();
    central.pump().await;

    assert_eq!(central.link_state(), LinkState::Ready);
    assert_eq!(central.mtu(), Some(MIN_ATT_MTU));
}

#[tokio::test]
async fn successful_mtu_result_is_recorded() {
    init_tracing();
    let (mut central, handle, _events) = ready_manager().await;

    handle.mtu_changed(185, GATT_SUCCESS).await.unwrap();
    central.pump().await;
    assert_eq!(central.mtu(), Some(185));
}

#[tokio::test]
async fn teardown_is_idempotent() {
    init_tracing();
    let (mut central, mut handle, _events) = ready_manager().await;

    central.teardown().await;
    assert_eq!(central.link_state(), LinkState::Idle);

    // Second teardown: no session, no second disconnect request.
    handle.drain_commands();
    central.teardown().await;
    assert!(handle.drain_commands().is_empty());
}

// ============================================================================
// Characteristic Channel
// ============================================================================

#[tokio::test]
async fn configure_before_ready_is_rejected() {
    init_tracing();
    let (adapter, _handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    // No session at all.
    let result = central
        .configure(service_uuid(), characteristic_uuid())
        .await;
    assert!(matches!(result, Err(Error::LinkNotReady { .. })));

    // Session exists but is still connecting.
    central.connect(&widget()).await.unwrap();
    let result = central
        .configure(service_uuid(), characteristic_uuid())
        .await;
    assert!(matches!(result, Err(Error::LinkNotReady { .. })));
}

#[tokio::test]
async fn configure_with_unknown_uuids_is_rejected() {
    init_tracing();
    let (mut central, mut handle, mut events) = ready_manager().await;
    handle.drain_commands();

    let unknown = Uuid::from_u128(0xDEAD);
    let result = central.configure(unknown, characteristic_uuid()).await;
    assert!(matches!(result, Err(Error::CharacteristicNotFound { .. })));

    let result = central.configure(service_uuid(), unknown).await;
    assert!(matches!(result, Err(Error::CharacteristicNotFound { .. })));

    // No subscription request went out and nothing was emitted.
    assert!(handle.drain_commands().is_empty());
    assert!(drain_events(&mut events).is_empty());
    assert!(!central.is_initialized());
}

#[tokio::test]
async fn declined_notification_enable_leaves_channel_uninitialized() {
    init_tracing();
    let (mut central, handle, mut events) = ready_manager().await;

    handle.set_notifications_accepted(false);
    let initialized = central
        .configure(service_uuid(), characteristic_uuid())
        .await
        .unwrap();

    assert!(!initialized);
    assert!(!central.is_initialized());
    assert!(drain_events(&mut events).is_empty());

    // And send stays gated.
    let result = central.send(OutboundMessage::new(vec![0x01])).await;
    assert!(matches!(result, Err(Error::ChannelNotInitialized)));
}

#[tokio::test]
async fn send_before_configure_issues_no_write_request() {
    init_tracing();
    let (mut central, mut handle, _events) = ready_manager().await;
    handle.drain_commands();

    let result = central.send(OutboundMessage::new(vec![0x01, 0x02])).await;
    assert!(matches!(result, Err(Error::ChannelNotInitialized)));
    assert!(handle.drain_commands().is_empty());
}

#[tokio::test]
async fn second_send_while_outstanding_is_rejected() {
    init_tracing();
    let (mut central, mut handle, _events) = ready_manager().await;
    central
        .configure(service_uuid(), characteristic_uuid())
        .await
        .unwrap();
    handle.drain_commands();

    assert!(central.send(OutboundMessage::new(vec![0x01])).await.unwrap());
    let result = central.send(OutboundMessage::new(vec![0x02])).await;
    assert!(matches!(result, Err(Error::WriteInProgress)));

    // Exactly one write request reached the transport.
    let writes = handle
        .drain_commands()
        .into_iter()
        .filter(|c| matches!(c, AdapterCommand::WriteCharacteristic { .. }))
        .count();
    assert_eq!(writes, 1);

    // Completion unblocks the channel.
    handle.write_completed(GATT_SUCCESS).await.unwrap();
    central.pump().await;
    assert!(central.send(OutboundMessage::new(vec![0x03])).await.unwrap());
}

#[tokio::test]
async fn failed_write_outcome_is_recorded_without_event() {
    init_tracing();
    let (mut central, handle, mut events) = ready_manager().await;
    central
        .configure(service_uuid(), characteristic_uuid())
        .await
        .unwrap();
    drain_events(&mut events);

    central.send(OutboundMessage::new(vec![0x01])).await.unwrap();
    handle.write_completed(0x0003).await.unwrap();
    central.pump().await;

    assert_eq!(
        central.last_write_outcome(),
        Some(WriteOutcome::WriteNotPermitted)
    );
    assert!(drain_events(&mut events).is_empty());
}

// ============================================================================
// Stale Callbacks
// ============================================================================

#[tokio::test]
async fn stale_write_completion_after_teardown_is_ignored() {
    init_tracing();
    let (mut central, handle, mut events) = ready_manager().await;
    central
        .configure(service_uuid(), characteristic_uuid())
        .await
        .unwrap();
    central.send(OutboundMessage::new(vec![0x01])).await.unwrap();
    drain_events(&mut events);

    central.teardown().await;
    assert_eq!(central.link_state(), LinkState::Idle);

    // The completion for the torn-down session arrives late.
    handle.write_completed(GATT_SUCCESS).await.unwrap();
    central.pump().await;

    assert!(drain_events(&mut events).is_empty());
    assert!(central.connected_device().is_none());
    assert!(!central.is_initialized());
    assert_eq!(central.last_write_outcome(), None);
}

#[tokio::test]
async fn stale_link_event_without_session_is_ignored() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    handle.link_connected().await.unwrap();
    handle.mtu_changed(185, GATT_SUCCESS).await.unwrap();
    central.pump().await;

    assert_eq!(central.link_state(), LinkState::Idle);
    assert!(central.connected_device().is_none());
}

#[tokio::test]
async fn observation_after_stop_scan_is_discarded() {
    init_tracing();
    let (adapter, handle) = MockAdapter::new();
    let mut central = CentralManager::new(adapter);

    central
        .start_scan(&[], ScanPowerMode::LowPower)
        .await
        .unwrap();
    central.stop_scan().await.unwrap();

    // One in-flight observation may still arrive after the stop.
    handle.observe_device(widget()).await.unwrap();
    central.pump().await;

    assert!(central.devices().is_empty());
}
