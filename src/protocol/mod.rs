//! PW-4 protocol core implementation
//!
//! This module provides the wire format, message types, and codec for the
//! module's System Exclusive dumps. Everything here is pure and stateless;
//! the streaming path lives in [`crate::transport`].

pub mod checksum;
mod codec;
mod error;
mod message;
pub(crate) mod metrics;
mod params;
mod types;

pub use codec::{MemoryDump, SysexMessage, decode, encode};
pub(crate) use codec::decode_raw;
pub use error::{Error, Result};
pub use message::RawMessage;
pub use metrics::MetricsSnapshot;
pub use params::{GLOBAL_BLOCK_LEN, PARAM_COUNT, PROGRAM_COUNT, ParamTag, ParameterSet};
pub use types::MessageType;

/// Snapshot the crate-wide protocol counters.
#[must_use]
pub fn metrics() -> MetricsSnapshot {
    metrics::Metrics::totals()
}

/// SysEx start-of-exclusive marker
pub const SOX: u8 = 0xF0;

/// SysEx end-of-exclusive marker
pub const EOX: u8 = 0xF7;

/// Manufacturer ID byte carried by every PW-4 frame
pub const MANUFACTURER_ID: u8 = 0x3E;

/// Machine ID byte identifying the PW-4 model
pub const MACHINE_ID: u8 = 0x04;

/// Header size in bytes: `F0` + manufacturer + machine + device ID + command
pub const HEADER_SIZE: usize = 5;

/// Minimum size of a classifiable frame
pub const MIN_MESSAGE_SIZE: usize = 6;

/// Mask reducing a byte to the MIDI data range (0..=127)
pub const DATA_MASK: u8 = 0x7F;
