//! Packet reassembly
//!
//! The MIDI transport delivers bytes in arbitrarily sized chunks: a SysEx
//! frame may span dozens of packets, and a packet may carry the tail of one
//! message plus the head of the next. [`Reassembler`] is the per-connection
//! state machine that stitches chunks back into complete frames and short
//! channel-voice messages.
//!
//! Reassembly is deliberately tolerant: malformed fragments are dropped
//! without surfacing an error, and an unexpected start marker mid-frame
//! discards the partial buffer and restarts. Semantic validation is the
//! classifier's job, once a complete frame exists.

use tracing::{trace, warn};

use crate::protocol::metrics::Metrics;
use crate::protocol::{EOX, RawMessage, SOX};

use super::voice::ChannelVoice;

/// First of the system real-time status bytes (`0xF8..=0xFF`). These may be
/// interleaved anywhere in the stream, including inside a SysEx frame.
const REAL_TIME_START: u8 = 0xF8;

/// One reassembled unit handed up to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A complete SysEx frame, markers included, not yet classified
    Sysex(RawMessage),
    /// A short channel-voice message
    Voice(ChannelVoice),
}

#[derive(Debug)]
enum State {
    /// No partial message
    Idle,
    /// Collecting the data bytes of a channel-voice message
    Voice {
        status: u8,
        data: [u8; 2],
        have: usize,
        needed: usize,
    },
    /// Accumulating a SysEx frame; exists only between `0xF0` and `0xF7`
    Sysex { buffer: Vec<u8> },
}

/// Per-connection packet reassembler.
#[derive(Debug)]
pub struct Reassembler {
    state: State,
    running_status: Option<u8>,
}

impl Reassembler {
    /// A reassembler in its idle state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Idle,
            running_status: None,
        }
    }

    /// Feed one transport chunk, returning every message it completed.
    ///
    /// Chunk boundaries carry no meaning: feeding a byte sequence in 1, 2,
    /// or N arbitrary slices produces the same events.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<InboundEvent> {
        trace!(len = chunk.len(), "feeding chunk");
        let mut events = Vec::new();
        for &byte in chunk {
            self.accept(byte, &mut events);
        }
        events
    }

    /// Drop all partial state, e.g. on a stream discontinuity or reconnect.
    pub fn reset(&mut self) {
        if let State::Sysex { buffer } = &self.state {
            warn!(discarded = buffer.len(), "reassembly reset mid-frame");
        }
        self.state = State::Idle;
        self.running_status = None;
    }

    /// Whether a SysEx frame is currently being accumulated.
    #[must_use]
    pub const fn is_accumulating(&self) -> bool {
        matches!(self.state, State::Sysex { .. })
    }

    fn accept(&mut self, byte: u8, events: &mut Vec<InboundEvent>) {
        // System real-time may interleave anywhere, even mid-frame.
        if byte >= REAL_TIME_START {
            return;
        }

        let state = std::mem::replace(&mut self.state, State::Idle);
        let next = match state {
            State::Sysex { mut buffer } => {
                if byte == SOX {
                    // Protocol violation: a new frame started before the old
                    // one ended. Recoverable - keep the new one.
                    warn!(discarded = buffer.len(), "unexpected 0xF0 mid-frame");
                    Metrics::record_reassembly_restart();
                    buffer.clear();
                    buffer.push(SOX);
                    State::Sysex { buffer }
                } else if byte == EOX {
                    buffer.push(EOX);
                    trace!(len = buffer.len(), "sysex frame complete");
                    events.push(InboundEvent::Sysex(RawMessage::new(buffer)));
                    State::Idle
                } else {
                    buffer.push(byte);
                    State::Sysex { buffer }
                }
            }
            State::Voice {
                status,
                mut data,
                mut have,
                needed,
            } => {
                if byte & 0x80 != 0 {
                    // Interrupted mid-message; drop the partial bytes and
                    // let the interrupting status start over.
                    trace!(status, "voice message interrupted");
                    self.running_status = None;
                    self.accept(byte, events);
                    return;
                }
                data[have] = byte;
                have += 1;
                if have < needed {
                    State::Voice {
                        status,
                        data,
                        have,
                        needed,
                    }
                } else {
                    if let Some(message) = ChannelVoice::from_bytes(status, &data[..needed]) {
                        events.push(InboundEvent::Voice(message));
                    }
                    self.running_status = Some(status);
                    State::Idle
                }
            }
            State::Idle => match byte {
                SOX => State::Sysex {
                    buffer: vec![SOX],
                },
                EOX => {
                    // Stray terminator with nothing accumulated
                    trace!("stray 0xF7 while idle");
                    State::Idle
                }
                0x80..=0xEF => {
                    let needed =
                        ChannelVoice::data_len(byte).expect("voice status has a data length");
                    State::Voice {
                        status: byte,
                        data: [0; 2],
                        have: 0,
                        needed,
                    }
                }
                0xF1..=0xF6 => {
                    // System common: not the module's traffic, and it cancels
                    // running status. Its data bytes fall out as noise below.
                    self.running_status = None;
                    State::Idle
                }
                data_byte => {
                    if let Some(status) = self.running_status {
                        // Running status: the data byte continues the last
                        // voice message.
                        let needed =
                            ChannelVoice::data_len(status).expect("voice status has a data length");
                        self.state = State::Voice {
                            status,
                            data: [0; 2],
                            have: 0,
                            needed,
                        };
                        self.accept(data_byte, events);
                        return;
                    }
                    // Line noise while idle; dropped silently.
                    State::Idle
                }
            },
        };
        self.state = next;
    }
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new()
    }
}
