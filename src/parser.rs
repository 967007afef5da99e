//! Frame synchronization over the RD-03D byte stream

use crate::buffer::StreamBuffer;
use crate::error::{DecodeError, Result};
use crate::message::{Frame, FrameKind};
use crate::wire::{HEADER, MULTI_FRAME_LEN, SINGLE_FRAME_LEN, TRAILER};
use log::{trace, warn};

/// Outcome of inspecting the unread region of the stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// Fewer than 14 unread bytes
    NeedMore,
    /// Sliding over bytes that do not start a frame
    Scanning,
    /// Header matched, but not enough bytes yet to confirm or reject a trailer
    HeaderFound,
    /// A complete frame of the given kind starts at the cursor
    FrameReady(FrameKind),
    /// No header at the cursor
    Garbage,
    /// Header matched and 30 bytes are available, yet neither trailer is present
    Corrupt,
}

/// Classify the window starting at the cursor
///
/// The 30-byte interpretation is always tried before the 14-byte one, so a
/// window that satisfies both is a multi-target frame.
pub fn classify(window: &[u8]) -> SyncState {
    if window.len() < SINGLE_FRAME_LEN {
        return SyncState::NeedMore;
    }
    if window[..HEADER.len()] != HEADER {
        return SyncState::Garbage;
    }

    if FrameKind::Multi.has_trailer(window) {
        return SyncState::FrameReady(FrameKind::Multi);
    }
    if FrameKind::Single.has_trailer(window) {
        return SyncState::FrameReady(FrameKind::Single);
    }

    if window.len() >= MULTI_FRAME_LEN {
        SyncState::Corrupt
    } else {
        SyncState::HeaderFound
    }
}

/// Parse one frame from the front of `bytes`
///
/// For callers that already hold an aligned frame. Bytes past the frame are
/// ignored.
pub fn parse_frame(bytes: &[u8]) -> Result<Frame> {
    match classify(bytes) {
        SyncState::FrameReady(kind) => Frame::from_window(kind, bytes),
        SyncState::NeedMore => Err(DecodeError::insufficient_data(format!(
            "Expected at least {} bytes, got {}",
            SINGLE_FRAME_LEN,
            bytes.len()
        ))),
        SyncState::Garbage | SyncState::Scanning => Err(DecodeError::invalid_header(format!(
            "Expected {:02X?} at offset 0",
            HEADER
        ))),
        SyncState::HeaderFound => Err(DecodeError::insufficient_data(format!(
            "Header found but no {:02X?} trailer within {} bytes",
            TRAILER,
            bytes.len()
        ))),
        SyncState::Corrupt => Err(DecodeError::invalid_trailer(format!(
            "No {:02X?} at offset 12 or 28",
            TRAILER
        ))),
    }
}

/// Counters the synchronizer updates while sliding over the stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncCounters {
    /// Bytes skipped because no header started there
    pub bytes_skipped: u32,
    /// Header matches rejected because neither trailer was present
    pub trailer_failures: u32,
}

/// Stateful frame synchronizer
///
/// Walks the unread region of a [`StreamBuffer`] one byte at a time until a
/// frame is found or more bytes are needed.
#[derive(Debug, Clone)]
pub struct FrameSynchronizer {
    state: SyncState,
}

impl FrameSynchronizer {
    /// Create a new synchronizer
    pub fn new() -> Self {
        FrameSynchronizer {
            state: SyncState::Scanning,
        }
    }

    /// State reached by the last step
    pub fn state(&self) -> SyncState {
        self.state
    }

    /// Find the next complete frame, consuming it from `buffer`
    ///
    /// Returns `None` once the unread region holds no complete frame. Bytes
    /// that may still belong to a pending frame are left unread.
    pub fn next_frame(
        &mut self,
        buffer: &mut StreamBuffer,
        counters: &mut SyncCounters,
    ) -> Option<Frame> {
        loop {
            self.state = classify(buffer.unread());
            match self.state {
                SyncState::NeedMore | SyncState::HeaderFound => return None,
                SyncState::Garbage | SyncState::Scanning => {
                    trace!("no header at cursor {}, sliding one byte", buffer.cursor());
                    buffer.advance(1);
                    counters.bytes_skipped = counters.bytes_skipped.saturating_add(1);
                    self.state = SyncState::Scanning;
                }
                SyncState::Corrupt => {
                    warn!(
                        "header at cursor {} has no trailer at offset 12 or 28",
                        buffer.cursor()
                    );
                    buffer.advance(1);
                    counters.trailer_failures = counters.trailer_failures.saturating_add(1);
                    self.state = SyncState::Scanning;
                }
                SyncState::FrameReady(kind) => {
                    let frame = Frame::from_window(kind, buffer.unread()).ok();
                    buffer.advance(kind.frame_len());
                    return frame;
                }
            }
        }
    }
}

impl Default for FrameSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}
