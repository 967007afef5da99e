//! Fixed-point field codec for the RD-03D wire format

use crate::error::{DecodeError, Result};
use bitfield::bitfield;

/// Millimetres per metre, for the x/y position fields
pub const MM_PER_M: f32 = 1000.0;

/// Centimetres per metre, for the speed field
pub const CM_PER_M: f32 = 100.0;

bitfield! {
    /// A 16-bit sign-magnitude field as transmitted by the radar
    ///
    /// Format:
    /// - Bit 15: sign, SET for non-negative and CLEAR for negative
    /// - Bits 14-0: magnitude
    ///
    /// The polarity is the inverse of the usual MSB-as-minus convention.
    #[derive(Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RawField(u16);
    impl Debug;
    u16;
    /// Whether the sign bit marks a non-negative value
    pub non_negative, _: 15;
    /// Absolute value in device units
    pub magnitude, _: 14, 0;
}

impl RawField {
    /// Wrap a raw little-endian word read from the wire
    pub fn new(raw: u16) -> Self {
        RawField(raw)
    }

    /// Get the raw 16-bit value
    pub fn raw(&self) -> u16 {
        self.0
    }

    /// Decode to a signed value in device units (mm or cm/s)
    pub fn value(&self) -> i32 {
        let magnitude = i32::from(self.magnitude());
        if self.non_negative() {
            magnitude
        } else {
            -magnitude
        }
    }
}

impl std::fmt::Display for RawField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RawField(0x{:04X} = {})", self.0, self.value())
    }
}

/// Read a little-endian u16 at `offset`
pub fn read_u16_le(buf: &[u8], offset: usize) -> Result<u16> {
    match buf.get(offset..offset.saturating_add(2)) {
        Some(&[lo, hi]) => Ok(u16::from_le_bytes([lo, hi])),
        _ => Err(DecodeError::insufficient_data(format!(
            "Expected 2 bytes at offset {}, buffer holds {}",
            offset,
            buf.len()
        ))),
    }
}

/// Decode a sign-magnitude word into a signed integer
///
/// `0x0032` is -50, `0x8032` is 50; both `0x0000` and `0x8000` are zero.
pub fn decode_signed(raw: u16) -> i32 {
    RawField::new(raw).value()
}

/// Convert a position in millimetres to metres
pub fn mm_to_m(mm: i32) -> f32 {
    mm as f32 / MM_PER_M
}

/// Convert a speed in centimetres per second to metres per second
pub fn cm_per_s_to_m_per_s(cm_per_s: i32) -> f32 {
    cm_per_s as f32 / CM_PER_M
}

/// One of the three target slots reported by the radar
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TargetSlot {
    /// First target block; also the only slot of a single-target frame
    One,
    /// Second target block
    Two,
    /// Third target block
    Three,
}

impl TargetSlot {
    /// All slots in wire order
    pub const ALL: [TargetSlot; 3] = [TargetSlot::One, TargetSlot::Two, TargetSlot::Three];

    /// Zero-based index into slot arrays
    pub fn index(&self) -> usize {
        match self {
            TargetSlot::One => 0,
            TargetSlot::Two => 1,
            TargetSlot::Three => 2,
        }
    }

    /// Slot for a zero-based index
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl std::fmt::Display for TargetSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "T{}", self.index() + 1)
    }
}
