//! Dump checksum arithmetic
//!
//! The PW-4 protects its dump frames with an additive checksum: the byte sum
//! over a half-open window of the frame, reduced to the MIDI data range by
//! keeping the low seven bits. The window and the index of the stored
//! checksum byte depend on the message type and are defined on
//! [`MessageType`].

use super::{DATA_MASK, MessageType};

/// Compute the checksum over `buffer[start..end]`.
///
/// Additive sum masked to 7 bits, byte-compatible with the module's firmware.
/// Callers must uphold `start <= end <= buffer.len()`.
#[must_use]
pub fn compute(buffer: &[u8], start: usize, end: usize) -> u8 {
    debug_assert!(start <= end && end <= buffer.len());
    buffer[start..end]
        .iter()
        .fold(0u8, |sum, &byte| sum.wrapping_add(byte))
        & DATA_MASK
}

/// Recompute the checksum for `message_type`'s window and compare it against
/// the stored checksum byte.
///
/// Returns `false` for buffers too short to contain the window; pure and
/// idempotent otherwise.
#[must_use]
pub fn validate(buffer: &[u8], message_type: MessageType) -> bool {
    let index = message_type.checksum_index();
    if index >= buffer.len() {
        return false;
    }
    compute(
        buffer,
        message_type.checksum_start(),
        message_type.checksum_end(),
    ) == buffer[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compute_masks_to_seven_bits() {
        let buffer = [0x7F, 0x7F, 0x7F];
        // 3 * 127 = 381 = 0x17D; low 7 bits = 0x7D
        assert_eq!(compute(&buffer, 0, 3), 0x7D);
    }

    #[test]
    fn compute_empty_window_is_zero() {
        let buffer = [0xAA, 0xBB];
        assert_eq!(compute(&buffer, 1, 1), 0);
    }

    #[test]
    fn compute_matches_manual_sum() {
        let buffer: Vec<u8> = (0..40).collect();
        let expected = buffer[4..34].iter().map(|&b| u32::from(b)).sum::<u32>() % 128;
        assert_eq!(u32::from(compute(&buffer, 4, 34)), expected);
    }

    #[test]
    fn validate_rejects_short_buffer() {
        let message_type = MessageType::ProgramDump { is_request: false };
        assert!(!validate(&[0u8; 10], message_type));
    }

    #[test]
    fn validate_detects_single_byte_corruption() {
        let message_type = MessageType::ProgramDump { is_request: false };
        let mut frame = vec![0u8; message_type.frame_len()];
        frame[message_type.checksum_index()] = compute(
            &frame,
            message_type.checksum_start(),
            message_type.checksum_end(),
        );
        assert!(validate(&frame, message_type));

        for index in message_type.checksum_start()..message_type.checksum_end() {
            let mut corrupted = frame.clone();
            corrupted[index] ^= 0x01;
            assert!(
                !validate(&corrupted, message_type),
                "corruption at {index} not detected"
            );
        }
    }
}
