//! Streaming transport path
//!
//! Everything between the raw MIDI byte stream and the editor's consumers:
//! per-connection packet reassembly, classification, and fan-out to bounded
//! per-category delivery queues. The physical transport itself (CoreMIDI,
//! ALSA, a test harness) stays behind the [`DeviceIo`] seam.

mod connection;
mod error;
mod queue;
mod reassembly;
mod router;
mod voice;

pub use connection::{Connection, DeviceIo};
pub use error::{SendError, TransportError};
pub use queue::Subscription;
pub use reassembly::{InboundEvent, Reassembler};
pub use router::{CONTROL_QUEUE_DEPTH, NOTE_QUEUE_DEPTH, Router, SYSEX_QUEUE_DEPTH, SysexEvent};
pub use voice::{ChannelVoice, ControlChangeEvent, NoteEvent, NoteKind};
