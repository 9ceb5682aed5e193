//! GATT session state machine.
//!
//! This module provides the link-state machine for the single GATT
//! session, from connect request through MTU negotiation and service
//! discovery to teardown.
//!
//! # States
//!
//! - `Idle`: no session.
//! - `Connecting`: link requested, MTU request already in flight.
//! - `MtuNegotiating`: link up; MTU result is fire-and-forget.
//! - `DiscoveringServices`: service discovery issued.
//! - `Ready`: topology known, channel may be configured.
//! - `Disconnecting`: teardown requested.
//! - `Failed`: absorbing failure state; immediately torn down.
//!
//! # Valid Transitions
//!
//! - Idle → Connecting → MtuNegotiating → DiscoveringServices → Ready
//! - Connecting/MtuNegotiating/DiscoveringServices → Failed → Disconnecting
//! - any active state → Disconnecting → Idle
//!
//! A `Disconnected` link callback tears the session down from any state;
//! a failed discovery leaves the state untouched so the host may retry by
//! reconnecting.

use crate::types::GattService;
use chrono::{DateTime, Utc};
use gattlink_core::constants::{MAX_TRANSITION_HISTORY, MIN_ATT_MTU};
use gattlink_core::{Error, PeripheralDevice, Result};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Lifecycle state of the (single) GATT session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    /// No session exists.
    Idle,

    /// Link requested; waiting for the connection-state callback.
    Connecting,

    /// Link up, MTU negotiation in flight (never gates progress).
    MtuNegotiating,

    /// Service discovery issued; waiting for its result.
    DiscoveringServices,

    /// Topology discovered; the characteristic channel may be configured.
    Ready,

    /// Teardown requested.
    Disconnecting,

    /// Absorbing failure state; teardown follows immediately.
    Failed,
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            LinkState::Idle => "Idle",
            LinkState::Connecting => "Connecting",
            LinkState::MtuNegotiating => "MtuNegotiating",
            LinkState::DiscoveringServices => "DiscoveringServices",
            LinkState::Ready => "Ready",
            LinkState::Disconnecting => "Disconnecting",
            LinkState::Failed => "Failed",
        };
        write!(f, "{}", state_str)
    }
}

impl LinkState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use gattlink_central::connection::LinkState;
    ///
    /// assert!(LinkState::Idle.can_transition_to(&LinkState::Connecting));
    /// assert!(!LinkState::Idle.can_transition_to(&LinkState::Ready));
    /// assert!(LinkState::DiscoveringServices.can_transition_to(&LinkState::Failed));
    /// ```
    pub fn can_transition_to(&self, target: &LinkState) -> bool {
        matches!(
            (self, target),
            // From Idle
            (LinkState::Idle, LinkState::Connecting)
            // From Connecting
            | (
                LinkState::Connecting,
                LinkState::MtuNegotiating | LinkState::Disconnecting | LinkState::Failed
            )
            // From MtuNegotiating
            | (
                LinkState::MtuNegotiating,
                LinkState::DiscoveringServices | LinkState::Disconnecting | LinkState::Failed
            )
            // From DiscoveringServices
            | (
                LinkState::DiscoveringServices,
                LinkState::Ready | LinkState::Disconnecting | LinkState::Failed
            )
            // From Ready
            | (LinkState::Ready, LinkState::Disconnecting)
            // From Failed
            | (LinkState::Failed, LinkState::Disconnecting)
            // From Disconnecting
            | (LinkState::Disconnecting, LinkState::Idle)
        )
    }

    /// Whether a session exists in this state.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, LinkState::Idle)
    }
}

/// A single recorded state transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkTransition {
    /// The state transitioned from.
    pub from: LinkState,

    /// The state transitioned to.
    pub to: LinkState,

    /// When the transition occurred.
    ///
    /// Not serialized; `Instant` is process-specific. Deserialized
    /// records carry the time of deserialization instead.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl LinkTransition {
    /// Create a transition record stamped with the current time.
    pub fn new(from: LinkState, to: LinkState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    /// Time elapsed since this transition occurred.
    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// The single live (or pending) GATT session.
///
/// At most one handle exists at a time; it is owned by the central
/// manager and carries everything the session accumulates: current
/// state, negotiated MTU (ATT minimum until the MTU callback lands),
/// the discovered topology, and a bounded transition history for
/// diagnostics.
#[derive(Debug)]
pub struct ConnectionHandle {
    device: PeripheralDevice,
    state: LinkState,
    mtu: u16,
    topology: Vec<GattService>,
    opened_at: DateTime<Utc>,
    history: VecDeque<LinkTransition>,
}

impl ConnectionHandle {
    /// Create a handle for `device`, in `Idle`, awaiting its first
    /// transition.
    pub fn new(device: PeripheralDevice) -> Self {
        Self {
            device,
            state: LinkState::Idle,
            mtu: MIN_ATT_MTU,
            topology: Vec::new(),
            opened_at: Utc::now(),
            history: VecDeque::with_capacity(MAX_TRANSITION_HISTORY),
        }
    }

    /// The target peripheral.
    pub fn device(&self) -> &PeripheralDevice {
        &self.device
    }

    /// Current session state.
    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Negotiated ATT MTU (the ATT minimum until negotiated).
    pub fn mtu(&self) -> u16 {
        self.mtu
    }

    /// Record a negotiated MTU.
    pub fn set_mtu(&mut self, mtu: u16) {
        self.mtu = mtu;
    }

    /// Discovered service topology (empty before discovery completes).
    pub fn topology(&self) -> &[GattService] {
        &self.topology
    }

    /// Store the discovered topology.
    pub fn set_topology(&mut self, services: Vec<GattService>) {
        self.topology = services;
    }

    /// Whether the discovered topology contains the given
    /// service/characteristic pair.
    #[must_use]
    pub fn has_characteristic(&self, service: Uuid, characteristic: Uuid) -> bool {
        self.topology
            .iter()
            .any(|s| s.uuid == service && s.has_characteristic(characteristic))
    }

    /// When this session was opened.
    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    /// How long this session has existed.
    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.opened_at
    }

    /// Recorded transitions, oldest first.
    pub fn transitions(&self) -> &VecDeque<LinkTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not
    /// legal from the current state; the state is left untouched.
    pub fn transition_to(&mut self, new_state: LinkState) -> Result<LinkTransition> {
        if !self.state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = LinkTransition::new(self.state, new_state);
        self.state = new_state;
        self.push_history(transition.clone());
        Ok(transition)
    }

    fn push_history(&mut self, transition: LinkTransition) {
        self.history.push_back(transition);
        if self.history.len() > MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }
    }
}
