//! Protocol error types
//!
//! Classification and codec failures form a closed set and are always
//! returned as values, never panics. Every classification variant carries a
//! clone of the offending frame for diagnostics; [`bytes::Bytes`] keeps that
//! clone cheap.

use bytes::Bytes;
use thiserror::Error;

/// PW-4 protocol errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Structurally invalid framing (missing markers or impossibly short)
    #[error("malformed message: {} bytes, bad framing", .buffer.len())]
    MalformedMessage {
        /// Offending frame
        buffer: Bytes,
    },

    /// Frame ends before the checksum byte its type declares
    #[error("incomplete message: {} bytes, need {needed}", .buffer.len())]
    IncompleteMessage {
        /// Offending frame
        buffer: Bytes,
        /// Bytes required to reach the declared checksum
        needed: usize,
    },

    /// Command byte not in the known set
    #[error("unknown command byte {command:#04x}")]
    UnknownCommandByte {
        /// Offending frame
        buffer: Bytes,
        /// Unrecognized command byte
        command: u8,
    },

    /// Manufacturer ID byte does not match the expected constant
    #[error("wrong manufacturer id: expected {:#04x}, got {found:#04x}", crate::protocol::MANUFACTURER_ID)]
    WrongManufacturerId {
        /// Offending frame
        buffer: Bytes,
        /// Manufacturer byte found on the wire
        found: u8,
    },

    /// Machine ID byte does not match the expected constant
    #[error("wrong machine id: expected {:#04x}, got {found:#04x}", crate::protocol::MACHINE_ID)]
    WrongMachineId {
        /// Offending frame
        buffer: Bytes,
        /// Machine byte found on the wire
        found: u8,
    },

    /// Stored checksum does not match the recomputed window sum
    #[error("checksum mismatch: expected {expected:#04x}, got {found:#04x}")]
    InvalidChecksum {
        /// Offending frame
        buffer: Bytes,
        /// Checksum recomputed over the window
        expected: u8,
        /// Checksum byte found on the wire
        found: u8,
    },

    /// Program index outside the module's storage on encode
    #[error("program number {program} out of range (max {max})")]
    InvalidProgramNumber {
        /// Rejected program number
        program: u8,
        /// Highest valid program number
        max: u8,
    },

    /// Parameter or global value outside its declared range on encode
    #[error("{field} value {value} out of range (max {max})")]
    ValueOutOfRange {
        /// Name of the rejected field
        field: &'static str,
        /// Rejected value
        value: u8,
        /// Highest valid value
        max: u8,
    },
}

impl Error {
    /// The offending frame attached to a classification failure, if any.
    #[must_use]
    pub fn buffer(&self) -> Option<&Bytes> {
        match self {
            Self::MalformedMessage { buffer }
            | Self::IncompleteMessage { buffer, .. }
            | Self::UnknownCommandByte { buffer, .. }
            | Self::WrongManufacturerId { buffer, .. }
            | Self::WrongMachineId { buffer, .. }
            | Self::InvalidChecksum { buffer, .. } => Some(buffer),
            Self::InvalidProgramNumber { .. } | Self::ValueOutOfRange { .. } => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
