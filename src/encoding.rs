//! Frame encoding for the RD-03D wire format
//!
//! The radar only ever transmits, so this side exists to synthesize
//! wire-exact frames for replay, emulation and tests.

use crate::wire::{
    HEADER, MULTI_BLOCK_OFFSETS, MULTI_FRAME_LEN, MULTI_TRAILER_OFFSET, SINGLE_BLOCK_OFFSET,
    SINGLE_FRAME_LEN, SINGLE_TRAILER_OFFSET, TRAILER,
};

/// Largest magnitude a sign-magnitude field can carry
pub const MAX_MAGNITUDE: i32 = 0x7FFF;

/// Encode a signed device value into the radar's sign-magnitude word
///
/// Non-negative values set bit 15. Magnitudes beyond 15 bits saturate.
pub fn encode_signed(value: i32) -> u16 {
    let magnitude = value.unsigned_abs().min(MAX_MAGNITUDE as u32) as u16;
    if value >= 0 {
        0x8000 | magnitude
    } else {
        magnitude
    }
}

/// Raw target values in device units: x and y in mm, speed in cm/s
pub type RawTarget = (i32, i32, i32);

/// Encoder for RD-03D frames
pub struct FrameEncoder;

impl FrameEncoder {
    /// Write one x/y/speed block at `offset`
    fn write_block(frame: &mut [u8], offset: usize, (x_mm, y_mm, speed_cm_s): RawTarget) {
        let fields = [
            encode_signed(x_mm),
            encode_signed(y_mm),
            encode_signed(speed_cm_s),
        ];
        for (i, field) in fields.iter().enumerate() {
            let at = offset + i * 2;
            frame[at..at + 2].copy_from_slice(&field.to_le_bytes());
        }
    }

    /// Encode a 30-byte three-target frame
    ///
    /// `None` leaves the block all-zero, which the decoder reads as an
    /// empty slot.
    pub fn encode_multi(targets: [Option<RawTarget>; 3]) -> [u8; MULTI_FRAME_LEN] {
        let mut frame = [0u8; MULTI_FRAME_LEN];
        frame[..HEADER.len()].copy_from_slice(&HEADER);

        for (offset, target) in MULTI_BLOCK_OFFSETS.iter().zip(targets) {
            if let Some(target) = target {
                Self::write_block(&mut frame, *offset, target);
            }
        }

        frame[MULTI_TRAILER_OFFSET..].copy_from_slice(&TRAILER);
        frame
    }

    /// Encode a 14-byte single-target frame
    pub fn encode_single(x_mm: i32, y_mm: i32, speed_cm_s: i32) -> [u8; SINGLE_FRAME_LEN] {
        let mut frame = [0u8; SINGLE_FRAME_LEN];
        frame[..HEADER.len()].copy_from_slice(&HEADER);
        Self::write_block(&mut frame, SINGLE_BLOCK_OFFSET, (x_mm, y_mm, speed_cm_s));
        frame[SINGLE_TRAILER_OFFSET..].copy_from_slice(&TRAILER);
        frame
    }

    /// Encode a 14-byte frame with an all-zero block (no target)
    pub fn encode_single_empty() -> [u8; SINGLE_FRAME_LEN] {
        let mut frame = [0u8; SINGLE_FRAME_LEN];
        frame[..HEADER.len()].copy_from_slice(&HEADER);
        frame[SINGLE_TRAILER_OFFSET..].copy_from_slice(&TRAILER);
        frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::decode_signed;

    #[test]
    fn test_encode_signed_polarity() {
        assert_eq!(encode_signed(50), 0x8032);
        assert_eq!(encode_signed(-50), 0x0032);
        assert_eq!(encode_signed(0), 0x8000);
    }

    #[test]
    fn test_encode_signed_saturates() {
        assert_eq!(encode_signed(100_000), 0xFFFF);
        assert_eq!(encode_signed(-100_000), 0x7FFF);
        assert_eq!(encode_signed(i32::MIN), 0x7FFF);
    }

    #[test]
    fn test_encode_signed_inverts_decode() {
        for value in [-32767, -1234, -1, 0, 1, 500, 32767] {
            assert_eq!(decode_signed(encode_signed(value)), value);
        }
    }

    #[test]
    fn test_encode_single_layout() {
        let frame = FrameEncoder::encode_single(1234, -500, 200);
        assert_eq!(&frame[..4], &HEADER);
        assert_eq!(&frame[4..6], &[0xD2, 0x84]); // 0x84D2
        assert_eq!(&frame[6..8], &[0xF4, 0x01]); // 0x01F4, negative
        assert_eq!(&frame[8..10], &[0xC8, 0x80]); // 0x80C8
        assert_eq!(&frame[10..12], &[0x00, 0x00]);
        assert_eq!(&frame[12..], &TRAILER);
    }

    #[test]
    fn test_encode_multi_layout() {
        let frame = FrameEncoder::encode_multi([Some((1, 2, 3)), None, Some((-4, -5, -6))]);
        assert_eq!(&frame[..4], &HEADER);
        assert_eq!(&frame[4..10], &[0x01, 0x80, 0x02, 0x80, 0x03, 0x80]);
        assert!(frame[12..20].iter().all(|&b| b == 0));
        assert_eq!(&frame[20..26], &[0x04, 0x00, 0x05, 0x00, 0x06, 0x00]);
        assert_eq!(&frame[28..], &TRAILER);
    }

    #[test]
    fn test_encode_single_empty() {
        let frame = FrameEncoder::encode_single_empty();
        assert!(frame[4..12].iter().all(|&b| b == 0));
        assert_eq!(&frame[12..], &TRAILER);
    }
}
