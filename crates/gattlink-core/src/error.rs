use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Addressing errors
    #[error("Invalid device address: {0}")]
    InvalidAddress(String),

    // Scanner errors
    #[error("Bluetooth adapter unavailable")]
    AdapterUnavailable,

    // Session lifecycle errors
    #[error("Session already active in state {state}")]
    AlreadyConnected { state: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Link not ready in state {state}")]
    LinkNotReady { state: String },

    // Characteristic channel errors
    #[error("Characteristic {characteristic} not found in service {service}")]
    CharacteristicNotFound {
        service: String,
        characteristic: String,
    },

    #[error("Characteristic channel not initialized")]
    ChannelNotInitialized,

    #[error("Characteristic write already in flight")]
    WriteInProgress,

    // Codec errors
    #[error("Invalid hex input: {0}")]
    InvalidHex(String),
}

pub type Result<T> = std::result::Result<T, Error>;
