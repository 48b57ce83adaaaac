//! Channel-voice messages
//!
//! The short, fixed-length MIDI 1.0 messages that arrive outside SysEx
//! framing. They are parsed positionally from the status nibble: the high
//! nibble selects the kind, the low nibble is the channel, and one or two
//! data bytes follow.

use std::fmt;

/// Decoded channel-voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelVoice {
    /// `0x8n` - key released
    NoteOff {
        /// MIDI channel (0-based)
        channel: u8,
        /// Key number
        key: u8,
        /// Release velocity
        velocity: u8,
    },
    /// `0x9n` - key pressed
    NoteOn {
        /// MIDI channel (0-based)
        channel: u8,
        /// Key number
        key: u8,
        /// Strike velocity (nonzero; zero parses as `NoteOff`)
        velocity: u8,
    },
    /// `0xAn` - per-key aftertouch
    PolyPressure {
        /// MIDI channel (0-based)
        channel: u8,
        /// Key number
        key: u8,
        /// Pressure amount
        pressure: u8,
    },
    /// `0xBn` - controller moved
    ControlChange {
        /// MIDI channel (0-based)
        channel: u8,
        /// Controller number
        controller: u8,
        /// Controller value
        value: u8,
    },
    /// `0xCn` - program select
    ProgramChange {
        /// MIDI channel (0-based)
        channel: u8,
        /// Program number
        program: u8,
    },
    /// `0xDn` - channel aftertouch
    ChannelPressure {
        /// MIDI channel (0-based)
        channel: u8,
        /// Pressure amount
        pressure: u8,
    },
    /// `0xEn` - pitch wheel, 14-bit value centered at 0x2000
    PitchBend {
        /// MIDI channel (0-based)
        channel: u8,
        /// Combined 14-bit bend value
        value: u16,
    },
}

impl ChannelVoice {
    /// Number of data bytes following `status`, or `None` if `status` is not
    /// a channel-voice status byte.
    #[must_use]
    pub const fn data_len(status: u8) -> Option<usize> {
        match status & 0xF0 {
            0x80 | 0x90 | 0xA0 | 0xB0 | 0xE0 => Some(2),
            0xC0 | 0xD0 => Some(1),
            _ => None,
        }
    }

    /// Assemble a message from its status byte and data bytes.
    ///
    /// A note-on with velocity 0 is a note-off in MIDI 1.0 and is normalized
    /// here. Returns `None` for non-voice statuses or short data.
    #[must_use]
    pub fn from_bytes(status: u8, data: &[u8]) -> Option<Self> {
        let channel = status & 0x0F;
        match status & 0xF0 {
            0x80 => Some(Self::NoteOff {
                channel,
                key: *data.first()?,
                velocity: *data.get(1)?,
            }),
            0x90 => {
                let key = *data.first()?;
                let velocity = *data.get(1)?;
                if velocity == 0 {
                    Some(Self::NoteOff {
                        channel,
                        key,
                        velocity,
                    })
                } else {
                    Some(Self::NoteOn {
                        channel,
                        key,
                        velocity,
                    })
                }
            }
            0xA0 => Some(Self::PolyPressure {
                channel,
                key: *data.first()?,
                pressure: *data.get(1)?,
            }),
            0xB0 => Some(Self::ControlChange {
                channel,
                controller: *data.first()?,
                value: *data.get(1)?,
            }),
            0xC0 => Some(Self::ProgramChange {
                channel,
                program: *data.first()?,
            }),
            0xD0 => Some(Self::ChannelPressure {
                channel,
                pressure: *data.first()?,
            }),
            0xE0 => {
                let lsb = u16::from(*data.first()?);
                let msb = u16::from(*data.get(1)?);
                Some(Self::PitchBend {
                    channel,
                    value: (msb << 7) | lsb,
                })
            }
            _ => None,
        }
    }

    /// The message's status byte.
    #[must_use]
    pub const fn status(&self) -> u8 {
        match self {
            Self::NoteOff { channel, .. } => 0x80 | *channel,
            Self::NoteOn { channel, .. } => 0x90 | *channel,
            Self::PolyPressure { channel, .. } => 0xA0 | *channel,
            Self::ControlChange { channel, .. } => 0xB0 | *channel,
            Self::ProgramChange { channel, .. } => 0xC0 | *channel,
            Self::ChannelPressure { channel, .. } => 0xD0 | *channel,
            Self::PitchBend { channel, .. } => 0xE0 | *channel,
        }
    }

    /// The MIDI channel the message addresses.
    #[must_use]
    pub const fn channel(&self) -> u8 {
        self.status() & 0x0F
    }
}

/// Whether a note event opens or closes a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteKind {
    /// Key pressed
    On,
    /// Key released
    Off,
}

/// A note event as delivered on the note queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    /// On or off
    pub kind: NoteKind,
    /// MIDI channel (0-based)
    pub channel: u8,
    /// Key number
    pub key: u8,
    /// Velocity
    pub velocity: u8,
}

impl NoteEvent {
    /// The (channel, key) pair identifying the sounding note.
    #[must_use]
    pub const fn note_id(&self) -> (u8, u8) {
        (self.channel, self.key)
    }
}

impl fmt::Display for NoteEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            NoteKind::On => "on",
            NoteKind::Off => "off",
        };
        write!(
            f,
            "note {kind} ch{} key{} vel{}",
            self.channel, self.key, self.velocity
        )
    }
}

/// A controller move as delivered on the control-change queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlChangeEvent {
    /// MIDI channel (0-based)
    pub channel: u8,
    /// Controller number
    pub controller: u8,
    /// Controller value
    pub value: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_note_on() {
        let message = ChannelVoice::from_bytes(0x93, &[60, 100]).unwrap();
        assert_eq!(
            message,
            ChannelVoice::NoteOn {
                channel: 3,
                key: 60,
                velocity: 100
            }
        );
        assert_eq!(message.status(), 0x93);
    }

    #[test]
    fn note_on_velocity_zero_is_note_off() {
        let message = ChannelVoice::from_bytes(0x90, &[64, 0]).unwrap();
        assert_eq!(
            message,
            ChannelVoice::NoteOff {
                channel: 0,
                key: 64,
                velocity: 0
            }
        );
    }

    #[test]
    fn data_lengths_follow_status_nibble() {
        assert_eq!(ChannelVoice::data_len(0x85), Some(2));
        assert_eq!(ChannelVoice::data_len(0xB0), Some(2));
        assert_eq!(ChannelVoice::data_len(0xC7), Some(1));
        assert_eq!(ChannelVoice::data_len(0xDF), Some(1));
        assert_eq!(ChannelVoice::data_len(0xE1), Some(2));
        assert_eq!(ChannelVoice::data_len(0xF0), None);
        assert_eq!(ChannelVoice::data_len(0x7F), None);
    }

    #[test]
    fn pitch_bend_combines_fourteen_bits() {
        let message = ChannelVoice::from_bytes(0xE0, &[0x00, 0x40]).unwrap();
        assert_eq!(
            message,
            ChannelVoice::PitchBend {
                channel: 0,
                value: 0x2000
            }
        );
    }

    #[test]
    fn short_data_rejected() {
        assert_eq!(ChannelVoice::from_bytes(0x90, &[60]), None);
        assert_eq!(ChannelVoice::from_bytes(0xC0, &[]), None);
    }
}
