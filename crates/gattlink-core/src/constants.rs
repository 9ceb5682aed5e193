//! Core constants for the GATT central implementation.
//!
//! This module centralizes the transport status codes and protocol-level
//! defaults shared by the scanner, connection manager, and characteristic
//! channel. Status values follow the Bluetooth ATT error codes as surfaced
//! by platform GATT stacks; changing them breaks the write-outcome mapping.

// ============================================================================
// GATT Status Codes
// ============================================================================

/// Operation completed successfully.
///
/// Every transport callback carries a status word; anything other than
/// `GATT_SUCCESS` on a connection-state change is fatal to the session.
///
/// # Examples
///
/// ```
/// use gattlink_core::constants::GATT_SUCCESS;
///
/// assert_eq!(GATT_SUCCESS, 0x0000);
/// ```
pub const GATT_SUCCESS: u16 = 0x0000;

/// The peripheral rejected a write to this characteristic (ATT 0x03).
pub const GATT_WRITE_NOT_PERMITTED: u16 = 0x0003;

/// The staged value exceeded the negotiated ATT payload size (ATT 0x0D).
pub const GATT_INVALID_ATTRIBUTE_LENGTH: u16 = 0x000D;

// ============================================================================
// MTU Defaults
// ============================================================================

/// MTU requested immediately after opening a link.
///
/// The request is fire-and-forget: the session proceeds with
/// [`MIN_ATT_MTU`] until (and unless) the peripheral answers.
pub const REQUESTED_MTU: u16 = 20;

/// Minimum ATT MTU every BLE link supports before negotiation.
///
/// # Examples
///
/// ```
/// use gattlink_core::constants::{MIN_ATT_MTU, REQUESTED_MTU};
///
/// // A session that never hears back about MTU stays at the ATT minimum.
/// assert_eq!(MIN_ATT_MTU, 23);
/// assert!(REQUESTED_MTU < MIN_ATT_MTU);
/// ```
pub const MIN_ATT_MTU: u16 = 23;

// ============================================================================
// Bookkeeping Limits
// ============================================================================

/// Number of link-state transitions retained per session for diagnostics.
///
/// A full connect/configure/write/teardown cycle is under ten transitions,
/// so this keeps several cycles of history without unbounded growth.
pub const MAX_TRANSITION_HISTORY: usize = 32;

/// Capacity of the lifecycle event bus.
///
/// Lifecycle events are payload-free edge signals; a subscriber that lags
/// more than this many events behind only needs to re-query state anyway.
pub const EVENT_BUS_CAPACITY: usize = 16;

/// Number of colon-separated octets in a device address.
pub const ADDRESS_OCTETS: usize = 6;
