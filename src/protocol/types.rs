//! Dump message types
//!
//! The PW-4 speaks three dump kinds, each in a request and a response
//! flavor. Requests ask the module to transmit; responses carry data (and are
//! also what the editor sends to write data back). Checksum geometry is fixed
//! per kind and exposed as `const` accessors so the classifier, checksum
//! engine, and codec all read from one table.

use std::fmt;

use super::HEADER_SIZE;

/// Command bytes for the three response/request pairs. Responses carry data;
/// a request is its response command with bit 6 set. The explicit table below
/// is authoritative - nothing in this crate tests "multiple of 0x40".
const CMD_PROGRAM_DUMP: u8 = 0x00;
const CMD_PROGRAM_BULK_DUMP: u8 = 0x01;
const CMD_ALL_DUMP: u8 = 0x08;
const CMD_REQUEST_BIT: u8 = 0x40;

/// PW-4 dump message types
///
/// Polarity is part of the type: a `ProgramDump { is_request: true }` is the
/// editor asking for the edit buffer, `is_request: false` is the dump itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageType {
    /// Edit-buffer dump: the 30 parameters of the sound currently being edited
    ProgramDump {
        /// Request polarity
        is_request: bool,
    },
    /// Stored-program dump: one of the module's program slots
    ProgramBulkDump {
        /// Request polarity
        is_request: bool,
    },
    /// Full memory dump: global settings plus every program slot
    AllDump {
        /// Request polarity
        is_request: bool,
    },
}

impl MessageType {
    /// Resolve a command byte to its message type, or `None` if unassigned.
    #[must_use]
    pub fn from_command(command: u8) -> Option<Self> {
        match command {
            CMD_PROGRAM_DUMP => Some(Self::ProgramDump { is_request: false }),
            CMD_PROGRAM_BULK_DUMP => Some(Self::ProgramBulkDump { is_request: false }),
            CMD_ALL_DUMP => Some(Self::AllDump { is_request: false }),
            _ if command == CMD_PROGRAM_DUMP | CMD_REQUEST_BIT => {
                Some(Self::ProgramDump { is_request: true })
            }
            _ if command == CMD_PROGRAM_BULK_DUMP | CMD_REQUEST_BIT => {
                Some(Self::ProgramBulkDump { is_request: true })
            }
            _ if command == CMD_ALL_DUMP | CMD_REQUEST_BIT => {
                Some(Self::AllDump { is_request: true })
            }
            _ => None,
        }
    }

    /// The command byte for this type and polarity.
    #[must_use]
    pub const fn command(self) -> u8 {
        let (base, is_request) = match self {
            Self::ProgramDump { is_request } => (CMD_PROGRAM_DUMP, is_request),
            Self::ProgramBulkDump { is_request } => (CMD_PROGRAM_BULK_DUMP, is_request),
            Self::AllDump { is_request } => (CMD_ALL_DUMP, is_request),
        };
        if is_request { base | CMD_REQUEST_BIT } else { base }
    }

    /// Request/response polarity.
    #[must_use]
    pub const fn is_request(self) -> bool {
        match self {
            Self::ProgramDump { is_request }
            | Self::ProgramBulkDump { is_request }
            | Self::AllDump { is_request } => is_request,
        }
    }

    /// The same type with the opposite polarity.
    #[must_use]
    pub const fn with_polarity(self, is_request: bool) -> Self {
        match self {
            Self::ProgramDump { .. } => Self::ProgramDump { is_request },
            Self::ProgramBulkDump { .. } => Self::ProgramBulkDump { is_request },
            Self::AllDump { .. } => Self::AllDump { is_request },
        }
    }

    /// First byte of the checksum window.
    #[must_use]
    pub const fn checksum_start(self) -> usize {
        match self {
            Self::ProgramDump { .. } | Self::ProgramBulkDump { .. } => 4,
            Self::AllDump { .. } => 5,
        }
    }

    /// One past the last byte of the checksum window.
    #[must_use]
    pub const fn checksum_end(self) -> usize {
        match self {
            Self::ProgramDump { .. } | Self::ProgramBulkDump { .. } => 34,
            Self::AllDump { .. } => 590,
        }
    }

    /// Index of the stored checksum byte.
    #[must_use]
    pub const fn checksum_index(self) -> usize {
        match self {
            Self::ProgramDump { .. } | Self::ProgramBulkDump { .. } => 35,
            Self::AllDump { .. } => 591,
        }
    }

    /// First byte of the payload region.
    #[must_use]
    pub const fn payload_start(self) -> usize {
        HEADER_SIZE
    }

    /// One past the last byte of the payload region. The payload runs from
    /// the header to the checksum byte.
    #[must_use]
    pub const fn payload_end(self) -> usize {
        self.checksum_index()
    }

    /// Payload length in bytes.
    #[must_use]
    pub const fn payload_len(self) -> usize {
        self.payload_end() - self.payload_start()
    }

    /// Total frame length including both markers.
    #[must_use]
    pub const fn frame_len(self) -> usize {
        // checksum byte, then EOX
        self.checksum_index() + 2
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ProgramDump { .. } => "ProgramDump",
            Self::ProgramBulkDump { .. } => "ProgramBulkDump",
            Self::AllDump { .. } => "AllDump",
        };
        let polarity = if self.is_request() {
            "request"
        } else {
            "response"
        };
        write!(f, "{name}/{polarity}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_byte_roundtrip() {
        for command in [0x00u8, 0x01, 0x08, 0x40, 0x41, 0x48] {
            let message_type = MessageType::from_command(command).unwrap();
            assert_eq!(message_type.command(), command);
        }
    }

    #[test]
    fn polarity_follows_explicit_table() {
        assert!(!MessageType::from_command(0x00).unwrap().is_request());
        assert!(MessageType::from_command(0x40).unwrap().is_request());
        assert!(MessageType::from_command(0x48).unwrap().is_request());
        // 0x80 is a multiple of 0x40 but not an assigned command
        assert_eq!(MessageType::from_command(0x80), None);
        assert_eq!(MessageType::from_command(0xC0), None);
    }

    #[test]
    fn unassigned_commands_rejected() {
        for command in [0x02u8, 0x07, 0x09, 0x3F, 0x42, 0x49, 0x7F] {
            assert_eq!(MessageType::from_command(command), None, "{command:#04x}");
        }
    }

    #[test]
    fn program_dump_geometry() {
        let message_type = MessageType::ProgramDump { is_request: false };
        assert_eq!(message_type.checksum_start(), 4);
        assert_eq!(message_type.checksum_end(), 34);
        assert_eq!(message_type.checksum_index(), 35);
        assert_eq!(message_type.payload_len(), 30);
        assert_eq!(message_type.frame_len(), 37);
    }

    #[test]
    fn all_dump_geometry() {
        let message_type = MessageType::AllDump { is_request: false };
        assert_eq!(message_type.checksum_start(), 5);
        assert_eq!(message_type.checksum_end(), 590);
        assert_eq!(message_type.checksum_index(), 591);
        assert_eq!(message_type.payload_len(), 586);
        assert_eq!(message_type.frame_len(), 593);
    }
}
