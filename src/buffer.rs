//! Accumulation buffer for the incoming UART byte stream

use crate::protocol::ByteSource;
use crate::wire::DEFAULT_MAX_BUFFER_LEN;
use log::{debug, warn};

/// Byte accumulator with a read cursor and a soft capacity ceiling.
///
/// Bytes before `cursor` are consumed; bytes from `cursor` on are still
/// unread. The consumed prefix is reclaimed lazily by [`compact`], and the
/// ceiling is enforced by [`enforce_capacity`], which only ever evicts
/// consumed bytes.
///
/// [`compact`]: StreamBuffer::compact
/// [`enforce_capacity`]: StreamBuffer::enforce_capacity
#[derive(Debug, Clone)]
pub struct StreamBuffer {
    bytes: Vec<u8>,
    cursor: usize,
    max_len: usize,
}

impl StreamBuffer {
    /// Create a buffer with the default 512-byte ceiling
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_BUFFER_LEN)
    }

    /// Create a buffer with a custom ceiling
    pub fn with_max_len(max_len: usize) -> Self {
        StreamBuffer {
            bytes: Vec::with_capacity(max_len),
            cursor: 0,
            max_len,
        }
    }

    /// Append newly arrived bytes
    pub fn ingest(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Append everything `source` currently has available
    ///
    /// Returns the number of bytes moved.
    pub fn ingest_from<S: ByteSource + ?Sized>(&mut self, source: &mut S) -> usize {
        source.drain_into(&mut self.bytes)
    }

    /// Unread byte count, saturated to `u16`
    pub fn pending_unread(&self) -> u16 {
        u16::try_from(self.unread_len()).unwrap_or(u16::MAX)
    }

    /// Unread byte count
    pub fn unread_len(&self) -> usize {
        self.bytes.len().saturating_sub(self.cursor)
    }

    /// Read-only view of the unread region
    pub fn unread(&self) -> &[u8] {
        self.bytes.get(self.cursor..).unwrap_or(&[])
    }

    /// Mark `count` unread bytes as consumed
    pub fn advance(&mut self, count: usize) {
        self.cursor = self.cursor.saturating_add(count).min(self.bytes.len());
    }

    /// Evict consumed bytes from the front when over the ceiling
    ///
    /// Returns `None` when the buffer is within its ceiling, otherwise the
    /// number of bytes evicted. That number can be zero: unread bytes are
    /// never dropped, so a buffer that is over the ceiling with nothing
    /// consumed stays as it is.
    pub fn enforce_capacity(&mut self) -> Option<usize> {
        if self.bytes.len() <= self.max_len {
            return None;
        }

        let drop = (self.bytes.len() - self.max_len).min(self.cursor);
        if drop > 0 {
            self.bytes.drain(..drop);
            self.cursor -= drop;
        }
        warn!(
            "stream buffer over capacity ({} > {}), evicted {} consumed bytes",
            self.bytes.len() + drop,
            self.max_len,
            drop
        );
        Some(drop)
    }

    /// Reclaim the consumed prefix once it outweighs the unread remainder
    ///
    /// Returns the number of bytes removed.
    pub fn compact(&mut self) -> usize {
        if self.cursor == 0 || self.cursor <= self.bytes.len() / 2 {
            return 0;
        }

        let removed = self.cursor;
        self.bytes.drain(..removed);
        self.cursor = 0;
        debug!(
            "compacted stream buffer: removed {} bytes, {} remain",
            removed,
            self.bytes.len()
        );
        removed
    }

    /// Total bytes held, consumed and unread
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Check if the buffer holds no bytes at all
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Offset of the next unread byte
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Configured ceiling
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Drop all buffered bytes
    pub fn clear(&mut self) {
        self.bytes.clear();
        self.cursor = 0;
    }
}

impl Default for StreamBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn test_ingest_and_pending() {
        let mut buffer = StreamBuffer::new();
        buffer.ingest(&[1, 2, 3, 4, 5]);
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.pending_unread(), 5);

        buffer.advance(2);
        assert_eq!(buffer.cursor(), 2);
        assert_eq!(buffer.pending_unread(), 3);
        assert_eq!(buffer.unread(), &[3, 4, 5]);
    }

    #[test]
    fn test_advance_clamps_to_length() {
        let mut buffer = StreamBuffer::new();
        buffer.ingest(&[1, 2, 3]);
        buffer.advance(10);
        assert_eq!(buffer.cursor(), 3);
        assert_eq!(buffer.pending_unread(), 0);
        assert!(buffer.unread().is_empty());
    }

    #[test]
    fn test_pending_saturates() {
        let mut buffer = StreamBuffer::with_max_len(1 << 20);
        buffer.ingest(&vec![0u8; 70_000]);
        assert_eq!(buffer.pending_unread(), u16::MAX);
        assert_eq!(buffer.unread_len(), 70_000);
    }

    #[test]
    fn test_ingest_from_source() {
        let mut source: VecDeque<u8> = (0..10).collect();
        let mut buffer = StreamBuffer::new();
        assert_eq!(buffer.ingest_from(&mut source), 10);
        assert!(source.is_empty());
        assert_eq!(buffer.len(), 10);
    }

    #[test]
    fn test_enforce_capacity_within_limit() {
        let mut buffer = StreamBuffer::with_max_len(16);
        buffer.ingest(&[0u8; 16]);
        assert_eq!(buffer.enforce_capacity(), None);
        assert_eq!(buffer.len(), 16);
    }

    #[test]
    fn test_enforce_capacity_evicts_consumed_only() {
        let mut buffer = StreamBuffer::with_max_len(16);
        buffer.ingest(&(0u8..24).collect::<Vec<_>>());
        buffer.advance(5);

        // 8 over the ceiling, but only 5 bytes are consumed
        assert_eq!(buffer.enforce_capacity(), Some(5));
        assert_eq!(buffer.len(), 19);
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.unread()[0], 5);
    }

    #[test]
    fn test_enforce_capacity_full_drop() {
        let mut buffer = StreamBuffer::with_max_len(16);
        buffer.ingest(&(0u8..24).collect::<Vec<_>>());
        buffer.advance(20);

        assert_eq!(buffer.enforce_capacity(), Some(8));
        assert_eq!(buffer.len(), 16);
        assert_eq!(buffer.cursor(), 12);
        assert_eq!(buffer.unread(), &[20, 21, 22, 23]);
    }

    #[test]
    fn test_enforce_capacity_nothing_consumed() {
        let mut buffer = StreamBuffer::with_max_len(16);
        buffer.ingest(&[7u8; 40]);
        assert_eq!(buffer.enforce_capacity(), Some(0));
        assert_eq!(buffer.len(), 40);
        assert_eq!(buffer.pending_unread(), 40);
    }

    #[test]
    fn test_compact_threshold() {
        let mut buffer = StreamBuffer::new();
        buffer.ingest(&[0u8; 10]);

        buffer.advance(5);
        assert_eq!(buffer.compact(), 0);
        assert_eq!(buffer.cursor(), 5);

        buffer.advance(1);
        assert_eq!(buffer.compact(), 6);
        assert_eq!(buffer.cursor(), 0);
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_compact_noop_at_zero_cursor() {
        let mut buffer = StreamBuffer::new();
        assert_eq!(buffer.compact(), 0);
        buffer.ingest(&[1, 2]);
        assert_eq!(buffer.compact(), 0);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_compact_fully_consumed() {
        let mut buffer = StreamBuffer::new();
        buffer.ingest(&[1, 2, 3]);
        buffer.advance(3);
        assert_eq!(buffer.compact(), 3);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut buffer = StreamBuffer::new();
        buffer.ingest(&[1, 2, 3]);
        buffer.advance(1);
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.cursor(), 0);
    }
}
