//! Program parameters
//!
//! A PW-4 program is a flat block of 30 single-byte parameters, transmitted
//! in tag order as the payload of a program dump. Slot 0 addresses the
//! program; the rest are the sound itself. Every slot declares a legal range,
//! `0..=127` unless the hardware narrows it.
//!
//! A [`ParameterSet`] stores the raw payload bytes and clamps on read, so a
//! dump received off the wire re-encodes byte-identical; writes through
//! [`set`](ParameterSet::set) are range-checked up front.

use std::fmt;

use super::{Error, Result};

/// Number of parameters in one program block
pub const PARAM_COUNT: usize = 30;

/// Number of program slots in the module's storage
pub const PROGRAM_COUNT: usize = 19;

/// Length of the global-settings block in an all-dump payload
pub const GLOBAL_BLOCK_LEN: usize = 16;

/// Program parameter slots, in payload order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum ParamTag {
    /// Program slot this block belongs to
    ProgramNumber = 0,
    /// Oscillator 1 pitch in semitones
    Osc1Semitone = 1,
    /// Oscillator 1 fine detune
    Osc1Detune = 2,
    /// Oscillator 1 waveform select
    Osc1Shape = 3,
    /// Oscillator 1 pulse width
    Osc1PulseWidth = 4,
    /// Oscillator 2 pitch in semitones
    Osc2Semitone = 5,
    /// Oscillator 2 fine detune
    Osc2Detune = 6,
    /// Oscillator 2 waveform select
    Osc2Shape = 7,
    /// Balance between the two oscillators
    OscMix = 8,
    /// Noise generator level
    NoiseLevel = 9,
    /// Filter cutoff frequency
    FilterCutoff = 10,
    /// Filter resonance
    FilterResonance = 11,
    /// Filter envelope modulation depth
    FilterEnvAmount = 12,
    /// Filter keyboard tracking
    FilterKeytrack = 13,
    /// Filter envelope attack time
    FilterAttack = 14,
    /// Filter envelope decay time
    FilterDecay = 15,
    /// Filter envelope sustain level
    FilterSustain = 16,
    /// Filter envelope release time
    FilterRelease = 17,
    /// Program volume
    AmpVolume = 18,
    /// Amplifier envelope attack time
    AmpAttack = 19,
    /// Amplifier envelope decay time
    AmpDecay = 20,
    /// Amplifier envelope sustain level
    AmpSustain = 21,
    /// Amplifier envelope release time
    AmpRelease = 22,
    /// LFO 1 rate
    Lfo1Speed = 23,
    /// LFO 1 waveform select
    Lfo1Shape = 24,
    /// LFO 1 modulation depth
    Lfo1Amount = 25,
    /// LFO 2 rate
    Lfo2Speed = 26,
    /// LFO 2 routing target
    Lfo2Target = 27,
    /// Pitch-bend range in semitones
    BendRange = 28,
    /// MIDI receive channel (0 = omni, 1..=16 = fixed)
    MidiChannel = 29,
}

impl ParamTag {
    /// All parameter tags, in payload order.
    pub const ALL: [Self; PARAM_COUNT] = [
        Self::ProgramNumber,
        Self::Osc1Semitone,
        Self::Osc1Detune,
        Self::Osc1Shape,
        Self::Osc1PulseWidth,
        Self::Osc2Semitone,
        Self::Osc2Detune,
        Self::Osc2Shape,
        Self::OscMix,
        Self::NoiseLevel,
        Self::FilterCutoff,
        Self::FilterResonance,
        Self::FilterEnvAmount,
        Self::FilterKeytrack,
        Self::FilterAttack,
        Self::FilterDecay,
        Self::FilterSustain,
        Self::FilterRelease,
        Self::AmpVolume,
        Self::AmpAttack,
        Self::AmpDecay,
        Self::AmpSustain,
        Self::AmpRelease,
        Self::Lfo1Speed,
        Self::Lfo1Shape,
        Self::Lfo1Amount,
        Self::Lfo2Speed,
        Self::Lfo2Target,
        Self::BendRange,
        Self::MidiChannel,
    ];

    /// Byte offset of this parameter within the program payload.
    #[must_use]
    pub const fn offset(self) -> usize {
        self as usize
    }

    /// Resolve a payload offset back to its tag.
    #[must_use]
    pub fn from_offset(offset: usize) -> Option<Self> {
        Self::ALL.get(offset).copied()
    }

    /// Highest legal value for this parameter. The lower bound is always 0.
    #[must_use]
    pub const fn max(self) -> u8 {
        match self {
            Self::ProgramNumber => (PROGRAM_COUNT - 1) as u8,
            Self::Osc1Shape | Self::Osc2Shape | Self::Lfo2Target => 3,
            Self::Lfo1Shape => 4,
            Self::BendRange => 24,
            Self::MidiChannel => 16,
            _ => 127,
        }
    }

    /// Clamp a raw byte to this parameter's legal range.
    #[must_use]
    pub const fn clamp(self, value: u8) -> u8 {
        let max = self.max();
        if value > max { max } else { value }
    }

    /// Stable name, used in range-error diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ProgramNumber => "ProgramNumber",
            Self::Osc1Semitone => "Osc1Semitone",
            Self::Osc1Detune => "Osc1Detune",
            Self::Osc1Shape => "Osc1Shape",
            Self::Osc1PulseWidth => "Osc1PulseWidth",
            Self::Osc2Semitone => "Osc2Semitone",
            Self::Osc2Detune => "Osc2Detune",
            Self::Osc2Shape => "Osc2Shape",
            Self::OscMix => "OscMix",
            Self::NoiseLevel => "NoiseLevel",
            Self::FilterCutoff => "FilterCutoff",
            Self::FilterResonance => "FilterResonance",
            Self::FilterEnvAmount => "FilterEnvAmount",
            Self::FilterKeytrack => "FilterKeytrack",
            Self::FilterAttack => "FilterAttack",
            Self::FilterDecay => "FilterDecay",
            Self::FilterSustain => "FilterSustain",
            Self::FilterRelease => "FilterRelease",
            Self::AmpVolume => "AmpVolume",
            Self::AmpAttack => "AmpAttack",
            Self::AmpDecay => "AmpDecay",
            Self::AmpSustain => "AmpSustain",
            Self::AmpRelease => "AmpRelease",
            Self::Lfo1Speed => "Lfo1Speed",
            Self::Lfo1Shape => "Lfo1Shape",
            Self::Lfo1Amount => "Lfo1Amount",
            Self::Lfo2Speed => "Lfo2Speed",
            Self::Lfo2Target => "Lfo2Target",
            Self::BendRange => "BendRange",
            Self::MidiChannel => "MidiChannel",
        }
    }
}

impl fmt::Display for ParamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One program's worth of parameter values, keyed by [`ParamTag`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParameterSet {
    values: [u8; PARAM_COUNT],
}

impl ParameterSet {
    /// A zeroed parameter set.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            values: [0; PARAM_COUNT],
        }
    }

    /// Read a parameter, clamped to its declared range.
    #[must_use]
    pub const fn get(&self, tag: ParamTag) -> u8 {
        tag.clamp(self.values[tag.offset()])
    }

    /// Read a parameter's raw stored byte, unclamped. Useful for diagnostics
    /// on sets decoded from a misbehaving device.
    #[must_use]
    pub const fn raw(&self, tag: ParamTag) -> u8 {
        self.values[tag.offset()]
    }

    /// Write a parameter, rejecting values outside the declared range.
    pub fn set(&mut self, tag: ParamTag, value: u8) -> Result<()> {
        let max = tag.max();
        if value > max {
            return Err(if tag == ParamTag::ProgramNumber {
                Error::InvalidProgramNumber {
                    program: value,
                    max,
                }
            } else {
                Error::ValueOutOfRange {
                    field: tag.name(),
                    value,
                    max,
                }
            });
        }
        self.values[tag.offset()] = value;
        Ok(())
    }

    /// The program slot this set addresses.
    #[must_use]
    pub const fn program_number(&self) -> u8 {
        self.get(ParamTag::ProgramNumber)
    }

    /// Build a set from a payload block, preserving raw bytes.
    #[must_use]
    pub fn from_payload(payload: &[u8]) -> Self {
        debug_assert_eq!(payload.len(), PARAM_COUNT);
        let mut values = [0u8; PARAM_COUNT];
        values.copy_from_slice(&payload[..PARAM_COUNT]);
        Self { values }
    }

    /// The payload block, after validating every value against its range.
    ///
    /// Fails before any byte is produced: [`Error::InvalidProgramNumber`]
    /// for slot 0, [`Error::ValueOutOfRange`] for the rest.
    pub fn to_payload(&self) -> Result<[u8; PARAM_COUNT]> {
        self.validate()?;
        Ok(self.values)
    }

    /// Check every stored value against its declared range.
    pub fn validate(&self) -> Result<()> {
        for tag in ParamTag::ALL {
            let value = self.values[tag.offset()];
            if value > tag.max() {
                return Err(if tag == ParamTag::ProgramNumber {
                    Error::InvalidProgramNumber {
                        program: value,
                        max: tag.max(),
                    }
                } else {
                    Error::ValueOutOfRange {
                        field: tag.name(),
                        value,
                        max: tag.max(),
                    }
                });
            }
        }
        Ok(())
    }

    /// Iterate over `(tag, clamped value)` pairs in payload order.
    pub fn iter(&self) -> impl Iterator<Item = (ParamTag, u8)> + '_ {
        ParamTag::ALL.into_iter().map(|tag| (tag, self.get(tag)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_cover_payload_offsets_in_order() {
        for (index, tag) in ParamTag::ALL.iter().enumerate() {
            assert_eq!(tag.offset(), index);
            assert_eq!(ParamTag::from_offset(index), Some(*tag));
        }
        assert_eq!(ParamTag::from_offset(PARAM_COUNT), None);
    }

    #[test]
    fn set_rejects_out_of_range() {
        let mut params = ParameterSet::new();
        let err = params.set(ParamTag::MidiChannel, 17).unwrap_err();
        assert!(matches!(
            err,
            Error::ValueOutOfRange {
                field: "MidiChannel",
                value: 17,
                max: 16,
            }
        ));
        params.set(ParamTag::MidiChannel, 16).unwrap();
        assert_eq!(params.get(ParamTag::MidiChannel), 16);
    }

    #[test]
    fn program_number_gets_its_own_error() {
        let mut params = ParameterSet::new();
        let err = params
            .set(ParamTag::ProgramNumber, PROGRAM_COUNT as u8)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidProgramNumber { max: 18, .. }));
    }

    #[test]
    fn get_clamps_raw_storage() {
        let mut payload = [0u8; PARAM_COUNT];
        payload[ParamTag::Lfo1Shape.offset()] = 9;
        let params = ParameterSet::from_payload(&payload);
        assert_eq!(params.raw(ParamTag::Lfo1Shape), 9);
        assert_eq!(params.get(ParamTag::Lfo1Shape), ParamTag::Lfo1Shape.max());
    }

    #[test]
    fn to_payload_refuses_out_of_range_storage() {
        let mut payload = [0u8; PARAM_COUNT];
        payload[ParamTag::BendRange.offset()] = 60;
        let params = ParameterSet::from_payload(&payload);
        assert!(params.to_payload().is_err());
    }

    #[test]
    fn payload_roundtrip_preserves_raw_bytes() {
        let payload: [u8; PARAM_COUNT] = std::array::from_fn(|i| (i as u8) % 4);
        let params = ParameterSet::from_payload(&payload);
        assert_eq!(params.to_payload().unwrap(), payload);
    }
}
