//! Transport-level error types covering device adapter failures.
//!
//! Adapter send/receive failures are deliberately kept out of the protocol
//! error taxonomy: a frame that fails classification is a
//! [`crate::protocol::Error`], a frame that could not be handed to the
//! hardware is a [`TransportError`]. The two only meet in [`SendError`],
//! the result of the encode-then-transmit convenience path.

use thiserror::Error;

/// Device adapter failures.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The device went away (unplugged, port closed).
    #[error("device detached")]
    Detached,

    /// The adapter rejected the outgoing bytes.
    #[error("send failed: {0}")]
    Send(String),

    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure of the encode-then-transmit path.
#[derive(Error, Debug)]
pub enum SendError {
    /// The message could not be encoded; nothing was transmitted.
    #[error(transparent)]
    Protocol(#[from] crate::protocol::Error),

    /// The encoded bytes could not be handed to the device.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
