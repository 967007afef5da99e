//! Frame and target types for the RD-03D protocol

use crate::core::{cm_per_s_to_m_per_s, decode_signed, mm_to_m, read_u16_le, TargetSlot};
use crate::error::{DecodeError, Result};
use crate::wire::{
    HEADER, MULTI_BLOCK_OFFSETS, MULTI_FRAME_LEN, MULTI_TRAILER_OFFSET, SINGLE_BLOCK_OFFSET,
    SINGLE_FRAME_LEN, SINGLE_TRAILER_OFFSET, TARGET_BLOCK_LEN, TRAILER,
};

/// The two frame layouts the radar emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameKind {
    /// 30 bytes, three target blocks
    Multi,
    /// 14 bytes, one target block
    Single,
}

impl FrameKind {
    /// Total frame length on the wire
    pub fn frame_len(&self) -> usize {
        match self {
            FrameKind::Multi => MULTI_FRAME_LEN,
            FrameKind::Single => SINGLE_FRAME_LEN,
        }
    }

    /// Offset of the trailer magic
    pub fn trailer_offset(&self) -> usize {
        match self {
            FrameKind::Multi => MULTI_TRAILER_OFFSET,
            FrameKind::Single => SINGLE_TRAILER_OFFSET,
        }
    }

    /// Check whether `window` carries this kind's trailer at the right offset
    pub fn has_trailer(&self, window: &[u8]) -> bool {
        let at = self.trailer_offset();
        window.get(at..at + TRAILER.len()) == Some(&TRAILER[..])
    }
}

impl std::fmt::Display for FrameKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameKind::Multi => write!(f, "multi-target ({} bytes)", MULTI_FRAME_LEN),
            FrameKind::Single => write!(f, "single-target ({} bytes)", SINGLE_FRAME_LEN),
        }
    }
}

/// An owned copy of one validated frame
///
/// Frames are copied out of the stream buffer before the cursor moves, so a
/// `Frame` never aliases bytes that compaction or eviction may shift.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Three-target frame
    Multi([u8; MULTI_FRAME_LEN]),
    /// Single-target frame
    Single([u8; SINGLE_FRAME_LEN]),
}

impl Frame {
    /// Copy a frame of `kind` from the front of `window`
    ///
    /// Validates header and trailer; bytes past the frame length are ignored.
    pub fn from_window(kind: FrameKind, window: &[u8]) -> Result<Self> {
        let bytes = window.get(..kind.frame_len()).ok_or_else(|| {
            DecodeError::invalid_length(format!(
                "Expected {} bytes for a {} frame, got {}",
                kind.frame_len(),
                kind,
                window.len()
            ))
        })?;

        if bytes[..HEADER.len()] != HEADER {
            return Err(DecodeError::invalid_header(format!(
                "Expected {:02X?}, got {:02X?}",
                HEADER,
                &bytes[..HEADER.len()]
            )));
        }
        if !kind.has_trailer(bytes) {
            return Err(DecodeError::invalid_trailer(format!(
                "No {:02X?} at offset {}",
                TRAILER,
                kind.trailer_offset()
            )));
        }

        match kind {
            FrameKind::Multi => {
                let mut frame = [0u8; MULTI_FRAME_LEN];
                frame.copy_from_slice(bytes);
                Ok(Frame::Multi(frame))
            }
            FrameKind::Single => {
                let mut frame = [0u8; SINGLE_FRAME_LEN];
                frame.copy_from_slice(bytes);
                Ok(Frame::Single(frame))
            }
        }
    }

    /// Get the frame kind
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Multi(_) => FrameKind::Multi,
            Frame::Single(_) => FrameKind::Single,
        }
    }

    /// Get the raw frame bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Frame::Multi(bytes) => &bytes[..],
            Frame::Single(bytes) => &bytes[..],
        }
    }

    /// Decode the target slots carried by this frame
    ///
    /// A multi-target frame fills all three slots and ignores the install
    /// angle. A single-target frame fills slot one and leaves the rest empty.
    pub fn targets(&self, install_offset_deg: f32) -> [TargetRecord; 3] {
        match self {
            Frame::Multi(payload) => extract_multi(payload),
            Frame::Single(payload) => [
                extract_single(payload, install_offset_deg),
                TargetRecord::default(),
                TargetRecord::default(),
            ],
        }
    }
}

/// Latest decoded state of one target slot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TargetRecord {
    /// Whether the slot holds a detection
    pub present: bool,
    /// Lateral position in metres
    pub x_m: f32,
    /// Forward position in metres
    pub y_m: f32,
    /// Radial speed in metres per second
    pub speed_mps: f32,
    /// Distance from the sensor in metres
    pub range_m: f32,
    /// Bearing in degrees, in (-180, 180]
    pub bearing_deg: f32,
}

impl TargetRecord {
    /// Build a present record from decoded device values
    fn from_device_units(x_mm: i32, y_mm: i32, speed_cm_s: i32) -> Self {
        let x_m = mm_to_m(x_mm);
        let y_m = mm_to_m(y_mm);
        TargetRecord {
            present: true,
            x_m,
            y_m,
            speed_mps: cm_per_s_to_m_per_s(speed_cm_s),
            range_m: x_m.hypot(y_m),
            bearing_deg: normalize_bearing(y_m.atan2(x_m).to_degrees()),
        }
    }
}

impl std::fmt::Display for TargetRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.present {
            return write!(f, "Target(none)");
        }
        write!(
            f,
            "Target(x={:.3}m, y={:.3}m, v={:.2}m/s, r={:.3}m, bearing={:.1}°)",
            self.x_m, self.y_m, self.speed_mps, self.range_m, self.bearing_deg
        )
    }
}

/// Decode one x/y/speed block starting at `offset`
///
/// Returns `Ok(None)` for the all-zero block that marks an empty slot.
pub fn decode_target_block(bytes: &[u8], offset: usize) -> Result<Option<TargetRecord>> {
    if bytes.len() < offset.saturating_add(TARGET_BLOCK_LEN) {
        return Err(DecodeError::insufficient_data(format!(
            "Target block at offset {} needs {} bytes, buffer holds {}",
            offset,
            TARGET_BLOCK_LEN,
            bytes.len()
        )));
    }

    let x_mm = decode_signed(read_u16_le(bytes, offset)?);
    let y_mm = decode_signed(read_u16_le(bytes, offset + 2)?);
    let speed_cm_s = decode_signed(read_u16_le(bytes, offset + 4)?);

    if x_mm == 0 && y_mm == 0 && speed_cm_s == 0 {
        return Ok(None);
    }
    Ok(Some(TargetRecord::from_device_units(x_mm, y_mm, speed_cm_s)))
}

/// Decode the three target slots of a multi-target frame
pub fn extract_multi(payload: &[u8; MULTI_FRAME_LEN]) -> [TargetRecord; 3] {
    let mut targets = [TargetRecord::default(); 3];
    for slot in TargetSlot::ALL {
        let offset = MULTI_BLOCK_OFFSETS[slot.index()];
        if let Ok(Some(target)) = decode_target_block(payload, offset) {
            targets[slot.index()] = target;
        }
    }
    targets
}

/// Decode the target of a single-target frame, applying the install angle
pub fn extract_single(payload: &[u8; SINGLE_FRAME_LEN], install_offset_deg: f32) -> TargetRecord {
    match decode_target_block(payload, SINGLE_BLOCK_OFFSET) {
        Ok(Some(mut target)) => {
            target.bearing_deg = normalize_bearing(target.bearing_deg + install_offset_deg);
            target
        }
        _ => TargetRecord::default(),
    }
}

/// Wrap a bearing in degrees into (-180, 180]
pub fn normalize_bearing(bearing_deg: f32) -> f32 {
    let wrapped = (bearing_deg + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        wrapped + 360.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::FrameEncoder;

    const EPS: f32 = 1e-3;

    #[test]
    fn test_frame_kind_lengths() {
        assert_eq!(FrameKind::Multi.frame_len(), 30);
        assert_eq!(FrameKind::Single.frame_len(), 14);
        assert_eq!(FrameKind::Multi.trailer_offset(), 28);
        assert_eq!(FrameKind::Single.trailer_offset(), 12);
    }

    #[test]
    fn test_decode_target_block() -> Result<()> {
        let frame = FrameEncoder::encode_single(1234, -500, 200);
        let target = decode_target_block(&frame, 4)?.expect("target present");

        assert!(target.present);
        assert!((target.x_m - 1.234).abs() < EPS);
        assert!((target.y_m + 0.5).abs() < EPS);
        assert!((target.speed_mps - 2.0).abs() < EPS);
        let expected_range = (1.234f32 * 1.234 + 0.5 * 0.5).sqrt();
        assert!((target.range_m - expected_range).abs() < EPS);
        let expected_bearing = (-0.5f32).atan2(1.234).to_degrees();
        assert!((target.bearing_deg - expected_bearing).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_decode_target_block_all_zero() -> Result<()> {
        let frame = FrameEncoder::encode_single_empty();
        assert_eq!(decode_target_block(&frame, 4)?, None);
        Ok(())
    }

    #[test]
    fn test_decode_target_block_negative_zero_is_empty() -> Result<()> {
        // 0x8000 decodes to zero just like 0x0000
        let block = [0x00, 0x80, 0x00, 0x80, 0x00, 0x80];
        assert_eq!(decode_target_block(&block, 0)?, None);
        Ok(())
    }

    #[test]
    fn test_decode_target_block_speed_only() -> Result<()> {
        let block = [0x00, 0x00, 0x00, 0x00, 0x0A, 0x80];
        let target = decode_target_block(&block, 0)?.expect("speed alone marks presence");
        assert_eq!(target.range_m, 0.0);
        assert!((target.speed_mps - 0.1).abs() < EPS);
        Ok(())
    }

    #[test]
    fn test_decode_target_block_short_buffer() {
        let frame = FrameEncoder::encode_single(1, 1, 1);
        assert!(decode_target_block(&frame, 10).is_err());
        assert!(decode_target_block(&frame[..9], 4).is_err());
    }

    #[test]
    fn test_extract_multi() {
        let frame = FrameEncoder::encode_multi([
            Some((1000, 0, 10)),
            None,
            Some((0, -2000, -50)),
        ]);
        let targets = extract_multi(&frame);

        assert!(targets[0].present);
        assert!((targets[0].range_m - 1.0).abs() < EPS);
        assert!(targets[0].bearing_deg.abs() < EPS);

        assert!(!targets[1].present);
        assert_eq!(targets[1], TargetRecord::default());

        assert!(targets[2].present);
        assert!((targets[2].range_m - 2.0).abs() < EPS);
        assert!((targets[2].bearing_deg + 90.0).abs() < EPS);
        assert!((targets[2].speed_mps + 0.5).abs() < EPS);
    }

    #[test]
    fn test_extract_single_applies_install_angle() {
        let frame = FrameEncoder::encode_single(1000, 1000, 0);
        let target = extract_single(&frame, 30.0);
        assert!((target.bearing_deg - 75.0).abs() < EPS);

        let target = extract_single(&frame, 0.0);
        assert!((target.bearing_deg - 45.0).abs() < EPS);
    }

    #[test]
    fn test_extract_single_wraps_bearing() {
        // raw bearing close to 170 degrees
        let frame = FrameEncoder::encode_single(-9848, 1736, 0);
        let target = extract_single(&frame, 170.0);
        assert!((target.bearing_deg + 20.0).abs() < 0.05);
    }

    #[test]
    fn test_extract_single_empty() {
        let frame = FrameEncoder::encode_single_empty();
        assert!(!extract_single(&frame, 45.0).present);
    }

    #[test]
    fn test_normalize_bearing() {
        assert!((normalize_bearing(340.0) + 20.0).abs() < EPS);
        assert!((normalize_bearing(-200.0) - 160.0).abs() < EPS);
        assert!((normalize_bearing(180.0) - 180.0).abs() < EPS);
        assert!((normalize_bearing(-180.0) - 180.0).abs() < EPS);
        assert!((normalize_bearing(725.0) - 5.0).abs() < EPS);
        assert!((normalize_bearing(-45.0) + 45.0).abs() < EPS);
    }

    #[test]
    fn test_frame_from_window() -> Result<()> {
        let bytes = FrameEncoder::encode_single(100, 200, 0);
        let frame = Frame::from_window(FrameKind::Single, &bytes)?;
        assert_eq!(frame.kind(), FrameKind::Single);
        assert_eq!(frame.as_bytes(), &bytes[..]);

        assert!(matches!(
            Frame::from_window(FrameKind::Multi, &bytes),
            Err(DecodeError::InvalidLength(_))
        ));
        Ok(())
    }

    #[test]
    fn test_frame_from_window_rejects_bad_magic() {
        let mut bytes = FrameEncoder::encode_single(100, 200, 0);
        bytes[13] = 0x00;
        assert!(matches!(
            Frame::from_window(FrameKind::Single, &bytes),
            Err(DecodeError::InvalidTrailer(_))
        ));

        let mut bytes = FrameEncoder::encode_single(100, 200, 0);
        bytes[0] = 0xAB;
        assert!(matches!(
            Frame::from_window(FrameKind::Single, &bytes),
            Err(DecodeError::InvalidHeader(_))
        ));
    }

    #[test]
    fn test_frame_targets_single_clears_other_slots() -> Result<()> {
        let bytes = FrameEncoder::encode_single(100, 200, 0);
        let frame = Frame::from_window(FrameKind::Single, &bytes)?;
        let targets = frame.targets(0.0);
        assert!(targets[0].present);
        assert!(!targets[1].present);
        assert!(!targets[2].present);
        Ok(())
    }
}
