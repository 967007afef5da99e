//! # RD-03D Frame Decoder
//!
//! A Rust library for decoding the binary target-report stream of the RD-03D
//! multi-target presence and ranging radar.
//!
//! The module sends fixed-length frames over a plain UART. Each frame is
//! delimited by a 4-byte header and a 2-byte trailer and carries either three
//! target blocks (30-byte frame) or a single target block (14-byte frame).
//! This library provides:
//!
//! - Fixed-point decoding of the module's sign-magnitude fields
//! - Frame synchronization over an arbitrary, possibly corrupted byte stream
//! - Target extraction (position, speed, range, bearing)
//! - A polled decode session with bounded buffering and diagnostics
//!
//! Nothing in the streaming path panics or returns a fatal error: garbage,
//! truncated frames and overruns are absorbed and reported through counters.
//!
//! ## Features
//!
//! - `serde`: Enable serialization/deserialization support
//!
//! ## Example
//!
//! ```
//! use rd03d_parser::{DecodeSession, FrameEncoder, TargetSlot};
//!
//! // A single-target frame: x = 1.2 m, y = 0.5 m, speed = 0.25 m/s
//! let frame = FrameEncoder::encode_single(1200, 500, 25);
//!
//! let mut session = DecodeSession::new();
//! session.feed(&frame, 0.0);
//!
//! let target = session.target(TargetSlot::One);
//! assert!(target.present);
//! assert!((target.range_m - 1.3).abs() < 1e-3);
//! assert_eq!(session.stats().frames_parsed, 1);
//! ```

pub mod buffer;
pub mod core;
pub mod encoding;
pub mod error;
pub mod message;
pub mod parser;
pub mod protocol;

pub use buffer::StreamBuffer;
pub use crate::core::{decode_signed, read_u16_le, RawField, TargetSlot};
pub use encoding::{encode_signed, FrameEncoder};
pub use error::{DecodeError, Result};
pub use message::{
    decode_target_block, extract_multi, extract_single, normalize_bearing, Frame, FrameKind,
    TargetRecord,
};
pub use parser::{classify, parse_frame, FrameSynchronizer, SyncCounters, SyncState};
pub use protocol::{
    ByteSource, CycleReport, DecodeSession, DecoderConfig, SessionBuilder, SessionSnapshot,
    SessionStats,
};

/// RD-03D wire format constants
pub mod wire {
    /// Frame header magic
    pub const HEADER: [u8; 4] = [0xAA, 0xFF, 0x03, 0x00];

    /// Frame trailer magic
    pub const TRAILER: [u8; 2] = [0x55, 0xCC];

    /// Length of a three-target frame
    pub const MULTI_FRAME_LEN: usize = 30;

    /// Length of a single-target frame
    pub const SINGLE_FRAME_LEN: usize = 14;

    /// Trailer offset inside a three-target frame
    pub const MULTI_TRAILER_OFFSET: usize = MULTI_FRAME_LEN - TRAILER.len();

    /// Trailer offset inside a single-target frame
    pub const SINGLE_TRAILER_OFFSET: usize = SINGLE_FRAME_LEN - TRAILER.len();

    /// Start of each target block inside a three-target frame
    pub const MULTI_BLOCK_OFFSETS: [usize; 3] = [4, 12, 20];

    /// Start of the target block inside a single-target frame
    pub const SINGLE_BLOCK_OFFSET: usize = 4;

    /// Bytes read from a target block: x, y and speed as u16 LE
    pub const TARGET_BLOCK_LEN: usize = 6;

    /// Stride between target blocks in a three-target frame
    pub const TARGET_BLOCK_STRIDE: usize = 8;

    /// Default hard ceiling on the accumulation buffer
    pub const DEFAULT_MAX_BUFFER_LEN: usize = 512;
}
