//! `patchwire` - SysEx wire protocol and patch codec for the PW-4 sound module
//!
//! This library implements the protocol layer the PW-4 editor uses to exchange
//! patch data with the hardware: classifying and validating System Exclusive
//! frames, checksum arithmetic, mapping parameter sets to and from dump
//! payloads, reassembling frames from arbitrarily fragmented MIDI packets, and
//! fanning decoded events out to per-category bounded queues.
//!
//! # Quick Start
//!
//! ```rust
//! use patchwire::{MessageType, ParamTag, ParameterSet, SysexMessage};
//!
//! // Build a patch and wrap it in an edit-buffer dump
//! let mut params = ParameterSet::default();
//! params.set(ParamTag::FilterCutoff, 96)?;
//!
//! let msg = SysexMessage::program_dump(0x00, params);
//!
//! // Encode to wire bytes
//! let bytes = msg.encode()?;
//!
//! // Decode the reverse
//! let decoded = SysexMessage::decode(&bytes)?;
//! assert_eq!(decoded, msg);
//! assert_eq!(decoded.message_type(), MessageType::ProgramDump { is_request: false });
//! # Ok::<(), patchwire::Error>(())
//! ```
//!
//! # Layering
//!
//! - [`protocol`] is the pure wire format: no I/O, no state, usable on its own
//!   for file-based patch import and export.
//! - [`transport`] is the streaming path: a [`Connection`](transport::Connection)
//!   funnels raw transport packets through reassembly and classification and
//!   delivers events on subscribable category queues.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod protocol;
pub mod transport;

pub use protocol::{
    EOX, Error, MACHINE_ID, MANUFACTURER_ID, MemoryDump, MessageType, ParamTag, ParameterSet,
    RawMessage, Result, SOX, SysexMessage,
};
pub use transport::{
    Connection, ControlChangeEvent, DeviceIo, NoteEvent, Subscription, SysexEvent, TransportError,
};
