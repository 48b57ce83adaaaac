//! Raw framed messages and classification
//!
//! A [`RawMessage`] is one complete frame as it arrived off the wire,
//! `0xF0..0xF7` inclusive, immutable from the moment the reassembler emits
//! it. Classification is the fixed-order validation ladder: framing,
//! manufacturer, machine, command, checksum bounds, checksum value - first
//! failure wins, and every failure carries the offending frame.

use bytes::Bytes;

use super::{
    EOX, Error, MACHINE_ID, MANUFACTURER_ID, MIN_MESSAGE_SIZE, MessageType, Result, SOX, checksum,
};

/// One complete System Exclusive frame, start and end markers included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    bytes: Bytes,
}

impl RawMessage {
    /// Wrap a byte sequence as a frame. No validation happens here; call
    /// [`classify`](Self::classify) to find out what the bytes are.
    pub fn new(bytes: impl Into<Bytes>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    /// The frame bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// The frame bytes as a shared buffer.
    #[must_use]
    pub const fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    /// Frame length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the frame is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The device ID byte, when the frame is long enough to carry one.
    #[must_use]
    pub fn device_id(&self) -> Option<u8> {
        self.bytes.get(3).copied()
    }

    /// The command byte, when the frame is long enough to carry one.
    #[must_use]
    pub fn command(&self) -> Option<u8> {
        self.bytes.get(4).copied()
    }

    /// The payload region for an already-classified frame.
    #[must_use]
    pub fn payload(&self, message_type: MessageType) -> &[u8] {
        &self.bytes[message_type.payload_start()..message_type.payload_end()]
    }

    /// Classify the frame.
    ///
    /// Validation order is fixed and the first failure wins:
    ///
    /// 1. length and `0xF0`/`0xF7` markers, else [`Error::MalformedMessage`]
    /// 2. manufacturer ID, else [`Error::WrongManufacturerId`]
    /// 3. machine ID, else [`Error::WrongMachineId`]
    /// 4. command byte known, else [`Error::UnknownCommandByte`]
    /// 5. declared checksum index in bounds, else [`Error::IncompleteMessage`]
    /// 6. checksum matches, else [`Error::InvalidChecksum`]
    ///
    /// On success returns the resolved [`MessageType`], polarity included.
    pub fn classify(&self) -> Result<MessageType> {
        let buf = self.as_slice();

        if buf.len() < MIN_MESSAGE_SIZE || buf[0] != SOX || buf[buf.len() - 1] != EOX {
            return Err(Error::MalformedMessage {
                buffer: self.bytes.clone(),
            });
        }
        if buf[1] != MANUFACTURER_ID {
            return Err(Error::WrongManufacturerId {
                buffer: self.bytes.clone(),
                found: buf[1],
            });
        }
        if buf[2] != MACHINE_ID {
            return Err(Error::WrongMachineId {
                buffer: self.bytes.clone(),
                found: buf[2],
            });
        }
        let command = buf[4];
        let Some(message_type) = MessageType::from_command(command) else {
            return Err(Error::UnknownCommandByte {
                buffer: self.bytes.clone(),
                command,
            });
        };
        if message_type.checksum_index() >= buf.len() {
            return Err(Error::IncompleteMessage {
                buffer: self.bytes.clone(),
                needed: message_type.frame_len(),
            });
        }
        let expected = checksum::compute(
            buf,
            message_type.checksum_start(),
            message_type.checksum_end(),
        );
        let found = buf[message_type.checksum_index()];
        if expected != found {
            return Err(Error::InvalidChecksum {
                buffer: self.bytes.clone(),
                expected,
                found,
            });
        }
        Ok(message_type)
    }
}

impl From<Vec<u8>> for RawMessage {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl AsRef<[u8]> for RawMessage {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
