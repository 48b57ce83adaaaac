//! Dump message codec (encode/decode)
//!
//! [`SysexMessage`] pairs a classified message type with its decoded payload;
//! [`encode`] and [`decode`] are inverse pure functions between it and wire
//! bytes. Both are usable outside the streaming path, e.g. for file-based
//! patch import and export.

use bytes::Bytes;

use super::{
    EOX, Error, GLOBAL_BLOCK_LEN, MACHINE_ID, MANUFACTURER_ID, MessageType, PARAM_COUNT,
    PROGRAM_COUNT, ParamTag, ParameterSet, RawMessage, Result, SOX, checksum,
};

/// An all-dump payload: the global-settings block followed by every program
/// slot in the module's storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryDump {
    globals: [u8; GLOBAL_BLOCK_LEN],
    programs: [ParameterSet; PROGRAM_COUNT],
}

impl MemoryDump {
    /// An empty memory image.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            globals: [0; GLOBAL_BLOCK_LEN],
            programs: [ParameterSet::new(); PROGRAM_COUNT],
        }
    }

    /// The raw global-settings block.
    #[must_use]
    pub const fn globals(&self) -> &[u8; GLOBAL_BLOCK_LEN] {
        &self.globals
    }

    /// Write one byte of the global-settings block.
    ///
    /// # Panics
    ///
    /// Panics if `index >= GLOBAL_BLOCK_LEN`.
    pub fn set_global(&mut self, index: usize, value: u8) -> Result<()> {
        assert!(index < GLOBAL_BLOCK_LEN, "global index out of bounds");
        if value > 0x7F {
            return Err(Error::ValueOutOfRange {
                field: "GlobalBlock",
                value,
                max: 0x7F,
            });
        }
        self.globals[index] = value;
        Ok(())
    }

    /// A stored program, or `None` for a slot the module doesn't have.
    #[must_use]
    pub fn program(&self, number: u8) -> Option<&ParameterSet> {
        self.programs.get(usize::from(number))
    }

    /// Mutable access to a stored program.
    pub fn program_mut(&mut self, number: u8) -> Option<&mut ParameterSet> {
        self.programs.get_mut(usize::from(number))
    }

    /// All program slots in storage order.
    #[must_use]
    pub const fn programs(&self) -> &[ParameterSet; PROGRAM_COUNT] {
        &self.programs
    }

    /// Build a memory image from an all-dump payload, preserving raw bytes.
    #[must_use]
    pub fn from_payload(payload: &[u8]) -> Self {
        debug_assert_eq!(payload.len(), GLOBAL_BLOCK_LEN + PROGRAM_COUNT * PARAM_COUNT);
        let mut globals = [0u8; GLOBAL_BLOCK_LEN];
        globals.copy_from_slice(&payload[..GLOBAL_BLOCK_LEN]);
        let programs = std::array::from_fn(|slot| {
            let start = GLOBAL_BLOCK_LEN + slot * PARAM_COUNT;
            ParameterSet::from_payload(&payload[start..start + PARAM_COUNT])
        });
        Self { globals, programs }
    }

    /// The all-dump payload, after validating every stored value.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        for &value in &self.globals {
            if value > 0x7F {
                return Err(Error::ValueOutOfRange {
                    field: "GlobalBlock",
                    value,
                    max: 0x7F,
                });
            }
        }
        for program in &self.programs {
            program.validate()?;
        }
        let mut payload = Vec::with_capacity(GLOBAL_BLOCK_LEN + PROGRAM_COUNT * PARAM_COUNT);
        payload.extend_from_slice(&self.globals);
        for program in &self.programs {
            payload.extend_from_slice(&program.to_payload()?);
        }
        Ok(payload)
    }
}

/// One decoded (or to-be-encoded) PW-4 dump message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SysexMessage {
    /// Edit-buffer dump, or the request for one
    ProgramDump {
        /// Target device ID
        device_id: u8,
        /// Request polarity
        is_request: bool,
        /// Parameter block
        params: ParameterSet,
    },
    /// Stored-program dump, or the request for one
    ProgramBulkDump {
        /// Target device ID
        device_id: u8,
        /// Request polarity
        is_request: bool,
        /// Parameter block; slot 0 addresses the program
        params: ParameterSet,
    },
    /// Full memory dump, or the request for one
    AllDump {
        /// Target device ID
        device_id: u8,
        /// Request polarity
        is_request: bool,
        /// Global block plus all program slots
        memory: Box<MemoryDump>,
    },
}

impl SysexMessage {
    /// An edit-buffer dump carrying `params`.
    #[must_use]
    pub const fn program_dump(device_id: u8, params: ParameterSet) -> Self {
        Self::ProgramDump {
            device_id,
            is_request: false,
            params,
        }
    }

    /// A stored-program dump carrying `params` (slot 0 addresses the program).
    #[must_use]
    pub const fn program_bulk_dump(device_id: u8, params: ParameterSet) -> Self {
        Self::ProgramBulkDump {
            device_id,
            is_request: false,
            params,
        }
    }

    /// A full memory dump carrying `memory`.
    #[must_use]
    pub fn all_dump(device_id: u8, memory: MemoryDump) -> Self {
        Self::AllDump {
            device_id,
            is_request: false,
            memory: Box::new(memory),
        }
    }

    /// A request for the edit buffer.
    #[must_use]
    pub const fn program_request(device_id: u8) -> Self {
        Self::ProgramDump {
            device_id,
            is_request: true,
            params: ParameterSet::new(),
        }
    }

    /// A request for stored program `program`.
    pub fn program_bulk_request(device_id: u8, program: u8) -> Result<Self> {
        let mut params = ParameterSet::new();
        params.set(ParamTag::ProgramNumber, program)?;
        Ok(Self::ProgramBulkDump {
            device_id,
            is_request: true,
            params,
        })
    }

    /// A request for the full memory image.
    #[must_use]
    pub fn all_request(device_id: u8) -> Self {
        Self::AllDump {
            device_id,
            is_request: true,
            memory: Box::new(MemoryDump::new()),
        }
    }

    /// The message type, polarity included.
    #[must_use]
    pub const fn message_type(&self) -> MessageType {
        match self {
            Self::ProgramDump { is_request, .. } => MessageType::ProgramDump {
                is_request: *is_request,
            },
            Self::ProgramBulkDump { is_request, .. } => MessageType::ProgramBulkDump {
                is_request: *is_request,
            },
            Self::AllDump { is_request, .. } => MessageType::AllDump {
                is_request: *is_request,
            },
        }
    }

    /// Target device ID.
    #[must_use]
    pub const fn device_id(&self) -> u8 {
        match self {
            Self::ProgramDump { device_id, .. }
            | Self::ProgramBulkDump { device_id, .. }
            | Self::AllDump { device_id, .. } => *device_id,
        }
    }

    /// Request/response polarity.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        self.message_type().is_request()
    }

    /// Encode to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        encode(self)
    }

    /// Decode from wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        decode(bytes)
    }
}

/// Encode a message to wire bytes
///
/// # Format
///
/// ```text
/// [F0] [3E] [04] [DEVICE] [COMMAND] [PAYLOAD...] [CHECKSUM] [F7]
/// ```
///
/// Every payload value is validated against its declared range before any
/// byte is produced.
pub fn encode(message: &SysexMessage) -> Result<Vec<u8>> {
    let message_type = message.message_type();
    let device_id = message.device_id();
    if device_id > 0x7F {
        return Err(Error::ValueOutOfRange {
            field: "DeviceId",
            value: device_id,
            max: 0x7F,
        });
    }

    // Validate before emitting anything
    let payload = match message {
        SysexMessage::ProgramDump { params, .. } | SysexMessage::ProgramBulkDump { params, .. } => {
            params.to_payload()?.to_vec()
        }
        SysexMessage::AllDump { memory, .. } => memory.to_payload()?,
    };

    let mut bytes = Vec::with_capacity(message_type.frame_len());
    bytes.push(SOX);
    bytes.push(MANUFACTURER_ID);
    bytes.push(MACHINE_ID);
    bytes.push(device_id);
    bytes.push(message_type.command());
    bytes.extend_from_slice(&payload);

    let sum = checksum::compute(
        &bytes,
        message_type.checksum_start(),
        message_type.checksum_end(),
    );
    bytes.push(sum);
    bytes.push(EOX);

    debug_assert_eq!(bytes.len(), message_type.frame_len());
    Ok(bytes)
}

/// Decode a message from wire bytes
///
/// Classifies the frame (see [`RawMessage::classify`]) and maps the payload
/// region to its parameter representation. Out-of-range parameter values do
/// not fail the decode; they are preserved raw and clamped on read.
pub fn decode(bytes: &[u8]) -> Result<SysexMessage> {
    decode_raw(&RawMessage::new(Bytes::copy_from_slice(bytes)))
}

/// Decode an already-framed message without copying it again.
pub(crate) fn decode_raw(message: &RawMessage) -> Result<SysexMessage> {
    let message_type = message.classify()?;
    // classification guarantees the header is present
    let device_id = message.as_slice()[3];
    let payload = message.payload(message_type);

    Ok(match message_type {
        MessageType::ProgramDump { is_request } => SysexMessage::ProgramDump {
            device_id,
            is_request,
            params: ParameterSet::from_payload(payload),
        },
        MessageType::ProgramBulkDump { is_request } => SysexMessage::ProgramBulkDump {
            device_id,
            is_request,
            params: ParameterSet::from_payload(payload),
        },
        MessageType::AllDump { is_request } => SysexMessage::AllDump {
            device_id,
            is_request,
            memory: Box::new(MemoryDump::from_payload(payload)),
        },
    })
}
