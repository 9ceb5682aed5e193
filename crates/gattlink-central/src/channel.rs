//! Characteristic I/O channel state.
//!
//! Tracks the one configured service/characteristic pair per session and
//! gates writes: a write is rejected before the channel is initialized
//! and while a previous write is still outstanding (only one write may be
//! in flight at a time, so a completion always corresponds to the most
//! recently issued send).

use crate::types::ServiceDescriptor;
use gattlink_core::constants::{
    GATT_INVALID_ATTRIBUTE_LENGTH, GATT_SUCCESS, GATT_WRITE_NOT_PERMITTED,
};
use gattlink_core::{Error, Result};
use std::fmt;

/// Outcome of a characteristic write, mapped from the raw GATT status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The peripheral acknowledged the write.
    Success,

    /// The staged value exceeded the negotiated ATT payload size.
    AttributeLengthExceeded,

    /// The peripheral rejected writes to this characteristic.
    WriteNotPermitted,

    /// Any other transport-level failure, with its raw status code.
    OtherTransportError(u16),
}

impl WriteOutcome {
    /// Map a raw GATT status word to an outcome.
    ///
    /// # Examples
    ///
    /// ```
    /// use gattlink_central::channel::WriteOutcome;
    ///
    /// assert_eq!(WriteOutcome::from_status(0x0000), WriteOutcome::Success);
    /// assert_eq!(
    ///     WriteOutcome::from_status(0x0003),
    ///     WriteOutcome::WriteNotPermitted
    /// );
    /// assert_eq!(
    ///     WriteOutcome::from_status(0x0085),
    ///     WriteOutcome::OtherTransportError(0x0085)
    /// );
    /// ```
    pub fn from_status(status: u16) -> Self {
        match status {
            GATT_SUCCESS => Self::Success,
            GATT_INVALID_ATTRIBUTE_LENGTH => Self::AttributeLengthExceeded,
            GATT_WRITE_NOT_PERMITTED => Self::WriteNotPermitted,
            code => Self::OtherTransportError(code),
        }
    }

    /// Whether the write was acknowledged.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "Success"),
            Self::AttributeLengthExceeded => write!(f, "AttributeLengthExceeded"),
            Self::WriteNotPermitted => write!(f, "WriteNotPermitted"),
            Self::OtherTransportError(code) => write!(f, "OtherTransportError({code:#06x})"),
        }
    }
}

/// Runtime state of the single characteristic channel.
///
/// Reset wholesale on teardown; a fresh connection re-derives everything.
#[derive(Debug, Default)]
pub struct IoChannel {
    descriptor: Option<ServiceDescriptor>,
    write_outstanding: bool,
    last_outcome: Option<WriteOutcome>,
}

impl IoChannel {
    /// Create an unconfigured channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `configure` has completed successfully this session.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.descriptor.is_some()
    }

    /// The configured descriptor, once initialized.
    pub fn descriptor(&self) -> Option<&ServiceDescriptor> {
        self.descriptor.as_ref()
    }

    /// Bind the channel to its resolved descriptor.
    pub fn initialize(&mut self, descriptor: ServiceDescriptor) {
        self.descriptor = Some(descriptor);
    }

    /// Check the write gates and return the descriptor to write to.
    ///
    /// # Errors
    ///
    /// Returns `Error::ChannelNotInitialized` before a successful
    /// `configure`, or `Error::WriteInProgress` while a previous write
    /// has not completed.
    pub fn ensure_can_send(&self) -> Result<&ServiceDescriptor> {
        let descriptor = self
            .descriptor
            .as_ref()
            .ok_or(Error::ChannelNotInitialized)?;
        if self.write_outstanding {
            return Err(Error::WriteInProgress);
        }
        Ok(descriptor)
    }

    /// Record that the transport accepted a write request.
    pub fn mark_write_issued(&mut self) {
        self.write_outstanding = true;
    }

    /// Whether a write is currently in flight.
    #[must_use]
    pub fn has_outstanding_write(&self) -> bool {
        self.write_outstanding
    }

    /// Consume a write completion: clears the outstanding flag and
    /// records the mapped outcome.
    pub fn complete_write(&mut self, status: u16) -> WriteOutcome {
        self.write_outstanding = false;
        let outcome = WriteOutcome::from_status(status);
        self.last_outcome = Some(outcome);
        outcome
    }

    /// Outcome of the most recently completed write, if any.
    #[must_use]
    pub fn last_outcome(&self) -> Option<WriteOutcome> {
        self.last_outcome
    }

    /// Drop all channel state (descriptor, gates, diagnostics).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
