//! Common types shared across the central-role components.
//!
//! This module defines the value objects exchanged between the scanner,
//! connection manager, and characteristic channel: scan parameters, the
//! discovered GATT topology, the configured service descriptor, and
//! outbound message payloads.

use bytes::Bytes;
use gattlink_core::hex;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Platform scan duty cycle.
///
/// Maps onto the platform scanner's power/latency trade-off. `LowPower`
/// is the default used when the host does not ask for anything faster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPowerMode {
    /// Long scan intervals; the default for background discovery.
    #[default]
    LowPower,

    /// Balanced interval/window trade-off.
    Balanced,

    /// Aggressive duty cycle for foreground discovery.
    LowLatency,
}

/// Advertisement filter applied by the platform scanner.
///
/// An empty filter list scans for everything; name and service filters
/// may be combined.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanFilter {
    /// Match peripherals advertising this service UUID.
    pub service: Option<Uuid>,

    /// Match peripherals advertising this exact name.
    pub name: Option<String>,
}

impl ScanFilter {
    /// Filter on an advertised service UUID.
    pub fn for_service(service: Uuid) -> Self {
        Self {
            service: Some(service),
            ..Self::default()
        }
    }

    /// Filter on an advertised device name.
    pub fn for_name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Characteristic write acknowledgement mode.
///
/// The channel always configures `Default` (acknowledged or not per the
/// platform's own default for the characteristic); it never switches a
/// characteristic to `WithoutResponse`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteMode {
    /// Platform-default write type for the characteristic.
    #[default]
    Default,

    /// Unacknowledged write.
    WithoutResponse,
}

/// One service in the discovered GATT topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GattService {
    /// Service UUID.
    pub uuid: Uuid,

    /// UUIDs of the characteristics the service exposes.
    pub characteristics: Vec<Uuid>,
}

impl GattService {
    /// Create a service entry.
    pub fn new(uuid: Uuid, characteristics: Vec<Uuid>) -> Self {
        Self {
            uuid,
            characteristics,
        }
    }

    /// Whether the service exposes the given characteristic.
    #[must_use]
    pub fn has_characteristic(&self, characteristic: Uuid) -> bool {
        self.characteristics.contains(&characteristic)
    }
}

/// The service/characteristic pair the channel is bound to.
///
/// Resolved from the discovered topology by `configure`; immutable for
/// the rest of the session and re-derived on every new connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service UUID of interest.
    pub service: Uuid,

    /// Characteristic UUID of interest.
    pub characteristic: Uuid,

    /// Negotiated write mode.
    pub write_mode: WriteMode,

    /// Whether notifications were successfully enabled.
    pub notifications_enabled: bool,
}

impl ServiceDescriptor {
    /// Create a descriptor with the default write mode and notifications
    /// not yet enabled.
    pub fn new(service: Uuid, characteristic: Uuid) -> Self {
        Self {
            service,
            characteristic,
            write_mode: WriteMode::default(),
            notifications_enabled: false,
        }
    }

    /// Mark notifications as enabled.
    pub fn with_notifications_enabled(mut self) -> Self {
        self.notifications_enabled = true;
        self
    }
}

/// An opaque payload staged for a characteristic write.
///
/// Carries its diagnostic hex rendering so log lines and transcripts show
/// the same `XX-XX` form the codec produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    payload: Bytes,
}

impl OutboundMessage {
    /// Create a message from any byte source.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the payload is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Diagnostic hex rendering (`"1A-2B"`).
    #[must_use]
    pub fn hex(&self) -> String {
        hex::encode(&self.payload)
    }
}

impl From<Vec<u8>> for OutboundMessage {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.hex())
    }
}
