//! Lifecycle event fan-out.
//!
//! Payload-free signals broadcast to any number of observers at emit
//! time. There is no queue and no delivery guarantee beyond "delivered
//! to currently registered observers"; consumers re-query state through
//! the manager's accessors after receiving a signal.

use gattlink_core::constants::EVENT_BUS_CAPACITY;
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// Named lifecycle signal. No payload; each is emitted at most once per
/// underlying state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    /// A new peripheral entered the device registry.
    DeviceListUpdated,

    /// Service discovery completed; the session is `Ready`.
    ServicesDiscovered,

    /// The characteristic channel finished configuring.
    CharacteristicReady,

    /// The most recent characteristic write was acknowledged.
    WriteSucceeded,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::DeviceListUpdated => "DeviceListUpdated",
            LifecycleEvent::ServicesDiscovered => "ServicesDiscovered",
            LifecycleEvent::CharacteristicReady => "CharacteristicReady",
            LifecycleEvent::WriteSucceeded => "WriteSucceeded",
        };
        write!(f, "{}", name)
    }
}

/// Process-wide, fire-and-forget event publisher.
///
/// Observers register and unregister freely; the bus holds no state
/// beyond the registration set.
///
/// # Examples
///
/// ```
/// use gattlink_central::events::{EventBus, LifecycleEvent};
///
/// let bus = EventBus::new();
/// let mut rx = bus.subscribe();
///
/// bus.emit(LifecycleEvent::DeviceListUpdated);
/// assert_eq!(rx.try_recv().unwrap(), LifecycleEvent::DeviceListUpdated);
/// ```
#[derive(Debug)]
pub struct EventBus {
    tx: broadcast::Sender<LifecycleEvent>,
}

impl EventBus {
    /// Create a bus with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(EVENT_BUS_CAPACITY)
    }

    /// Create a bus with an explicit channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Register a new observer.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
        self.tx.subscribe()
    }

    /// Deliver `event` to every currently registered observer.
    ///
    /// Fire-and-forget: emitting with no observers is a no-op.
    pub fn emit(&self, event: LifecycleEvent) {
        trace!(event = %event, "lifecycle event");
        let _ = self.tx.send(event);
    }

    /// Number of currently registered observers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
