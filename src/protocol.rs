//! Polled decode session for the RD-03D stream

use crate::buffer::StreamBuffer;
use crate::core::TargetSlot;
use crate::error::{DecodeError, Result};
use crate::message::{Frame, TargetRecord};
use crate::parser::{FrameSynchronizer, SyncCounters};
use crate::wire::{DEFAULT_MAX_BUFFER_LEN, MULTI_FRAME_LEN};
use log::debug;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Non-blocking pull source of raw UART bytes
pub trait ByteSource {
    /// Bytes that can be read right now without blocking
    fn bytes_available(&self) -> usize;

    /// Read one byte, or `None` if nothing is available
    fn read_byte(&mut self) -> Option<u8>;

    /// Move every available byte into `sink`, returning the count
    fn drain_into(&mut self, sink: &mut Vec<u8>) -> usize {
        let mut moved = 0;
        while self.bytes_available() > 0 {
            match self.read_byte() {
                Some(byte) => {
                    sink.push(byte);
                    moved += 1;
                }
                None => break,
            }
        }
        moved
    }
}

impl ByteSource for VecDeque<u8> {
    fn bytes_available(&self) -> usize {
        self.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }

    fn drain_into(&mut self, sink: &mut Vec<u8>) -> usize {
        let moved = self.len();
        sink.extend(self.drain(..));
        moved
    }
}

impl<'a> ByteSource for &'a [u8] {
    fn bytes_available(&self) -> usize {
        self.len()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let slice: &'a [u8] = *self;
        let (&first, rest) = slice.split_first()?;
        *self = rest;
        Some(first)
    }

    fn drain_into(&mut self, sink: &mut Vec<u8>) -> usize {
        let moved = self.len();
        sink.extend_from_slice(self);
        *self = &[];
        moved
    }
}

/// Decoder configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DecoderConfig {
    /// Ceiling on the accumulation buffer, in bytes
    pub max_buffer_len: usize,
}

impl DecoderConfig {
    /// Check that the configuration can hold at least one complete frame
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_len < MULTI_FRAME_LEN {
            return Err(DecodeError::invalid_config(format!(
                "max_buffer_len {} is smaller than a {}-byte frame",
                self.max_buffer_len, MULTI_FRAME_LEN
            )));
        }
        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        DecoderConfig {
            max_buffer_len: DEFAULT_MAX_BUFFER_LEN,
        }
    }
}

/// Process-lifetime diagnostic counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionStats {
    /// Unread bytes right after the last ingest
    pub bytes_pending: u16,
    /// Frames decoded successfully
    pub frames_parsed: u32,
    /// Overflow events plus trailer failures
    pub frames_bad: u32,
    /// Wall-clock duration of the last cycle, in milliseconds
    pub loop_duration_ms: u16,
    /// Cycles that found the buffer over its ceiling
    pub overflow_events: u32,
    /// Header matches rejected for a missing trailer
    pub trailer_failures: u32,
    /// Consumed bytes evicted by capacity enforcement
    pub bytes_evicted: u32,
    /// Bytes skipped while resynchronizing
    pub bytes_skipped: u32,
}

impl SessionStats {
    fn record_overflow(&mut self, evicted: usize) {
        self.overflow_events = self.overflow_events.saturating_add(1);
        self.frames_bad = self.frames_bad.saturating_add(1);
        let evicted = u32::try_from(evicted).unwrap_or(u32::MAX);
        self.bytes_evicted = self.bytes_evicted.saturating_add(evicted);
    }

    fn record_sync(&mut self, counters: SyncCounters) {
        self.trailer_failures = self
            .trailer_failures
            .saturating_add(counters.trailer_failures);
        self.frames_bad = self.frames_bad.saturating_add(counters.trailer_failures);
        self.bytes_skipped = self.bytes_skipped.saturating_add(counters.bytes_skipped);
    }

    /// Share of bad frames among all frame outcomes (0.0 to 1.0)
    pub fn error_rate(&self) -> f32 {
        let total = self.frames_parsed as f32 + self.frames_bad as f32;
        if total > 0.0 {
            self.frames_bad as f32 / total
        } else {
            0.0
        }
    }
}

/// Summary of one decode cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Bytes pulled from the source
    pub bytes_ingested: usize,
    /// Frames decoded during the cycle
    pub frames_decoded: usize,
    /// Wall-clock time spent in the cycle
    pub elapsed: Duration,
}

/// Read-only copy of the session outputs
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionSnapshot {
    /// Target slots in wire order
    pub targets: [TargetRecord; 3],
    /// Number of present slots
    pub target_count: usize,
    /// Closest present target seen during the last cycle, in metres
    pub nearest_range_m: Option<f32>,
    /// Milliseconds since a target was last seen
    pub last_seen_age_ms: Option<u64>,
    /// Diagnostic counters
    pub stats: SessionStats,
}

impl SessionSnapshot {
    /// Serialize the snapshot as JSON
    #[cfg(feature = "serde")]
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Decode session: owns the stream buffer, target slots and counters
///
/// Each call to [`run_cycle`](DecodeSession::run_cycle) ingests whatever the
/// source has, drains every complete frame and leaves partial frames for the
/// next call. The session is not reentrant; share it behind one owner or a
/// mutex.
#[derive(Debug, Clone)]
pub struct DecodeSession {
    buffer: StreamBuffer,
    sync: FrameSynchronizer,
    targets: [TargetRecord; 3],
    nearest_range_m: Option<f32>,
    last_seen: Option<Instant>,
    stats: SessionStats,
}

impl DecodeSession {
    /// Create a session with the default configuration
    pub fn new() -> Self {
        Self::with_config_unchecked(DecoderConfig::default())
    }

    fn with_config_unchecked(config: DecoderConfig) -> Self {
        DecodeSession {
            buffer: StreamBuffer::with_max_len(config.max_buffer_len),
            sync: FrameSynchronizer::new(),
            targets: [TargetRecord::default(); 3],
            nearest_range_m: None,
            last_seen: None,
            stats: SessionStats::default(),
        }
    }

    /// Run one decode cycle against a byte source
    ///
    /// `install_angle_deg` is applied to single-target frames only.
    pub fn run_cycle<S: ByteSource + ?Sized>(
        &mut self,
        source: &mut S,
        install_angle_deg: f32,
    ) -> CycleReport {
        let started = Instant::now();
        self.clear_targets();

        let bytes_ingested = self.buffer.ingest_from(source);
        self.stats.bytes_pending = self.buffer.pending_unread();

        if let Some(evicted) = self.buffer.enforce_capacity() {
            self.stats.record_overflow(evicted);
        }

        let mut counters = SyncCounters::default();
        let mut frames_decoded = 0;
        while let Some(frame) = self.sync.next_frame(&mut self.buffer, &mut counters) {
            self.apply_frame(&frame, install_angle_deg);
            frames_decoded += 1;
        }
        self.stats.record_sync(counters);

        self.buffer.compact();

        let elapsed = started.elapsed();
        self.stats.loop_duration_ms = u16::try_from(elapsed.as_millis()).unwrap_or(u16::MAX);

        CycleReport {
            bytes_ingested,
            frames_decoded,
            elapsed,
        }
    }

    /// Run one decode cycle over bytes already in hand
    pub fn feed(&mut self, bytes: &[u8], install_angle_deg: f32) -> CycleReport {
        let mut source = bytes;
        self.run_cycle(&mut source, install_angle_deg)
    }

    fn clear_targets(&mut self) {
        self.targets = [TargetRecord::default(); 3];
        self.nearest_range_m = None;
    }

    fn apply_frame(&mut self, frame: &Frame, install_angle_deg: f32) {
        self.targets = frame.targets(install_angle_deg);

        let mut seen = false;
        for target in self.targets.iter().filter(|t| t.present) {
            seen = true;
            self.nearest_range_m = match self.nearest_range_m {
                Some(nearest) if nearest <= target.range_m => Some(nearest),
                _ => Some(target.range_m),
            };
        }
        if seen {
            self.last_seen = Some(Instant::now());
        }

        self.stats.frames_parsed = self.stats.frames_parsed.saturating_add(1);
        debug!(
            "decoded {} frame, {} target(s)",
            frame.kind(),
            self.target_count()
        );
    }

    /// All three target slots in wire order
    pub fn targets(&self) -> &[TargetRecord; 3] {
        &self.targets
    }

    /// One target slot
    pub fn target(&self, slot: TargetSlot) -> &TargetRecord {
        &self.targets[slot.index()]
    }

    /// Number of present slots
    pub fn target_count(&self) -> usize {
        self.targets.iter().filter(|t| t.present).count()
    }

    /// Closest present target decoded during the last cycle
    pub fn nearest_range_m(&self) -> Option<f32> {
        self.nearest_range_m
    }

    /// When a frame last carried a present target
    pub fn last_seen(&self) -> Option<Instant> {
        self.last_seen
    }

    /// Check if a target was seen within `timeout`
    pub fn is_target_recent(&self, timeout: Duration) -> bool {
        match self.last_seen {
            Some(instant) => instant.elapsed() < timeout,
            None => false,
        }
    }

    /// Diagnostic counters
    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// The underlying stream buffer
    pub fn buffer(&self) -> &StreamBuffer {
        &self.buffer
    }

    /// Copy the current outputs
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            targets: self.targets,
            target_count: self.target_count(),
            nearest_range_m: self.nearest_range_m,
            last_seen_age_ms: self
                .last_seen
                .map(|instant| u64::try_from(instant.elapsed().as_millis()).unwrap_or(u64::MAX)),
            stats: self.stats,
        }
    }
}

impl Default for DecodeSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for decode sessions
pub struct SessionBuilder {
    config: DecoderConfig,
}

impl SessionBuilder {
    /// Create a new session builder
    pub fn new() -> Self {
        SessionBuilder {
            config: DecoderConfig::default(),
        }
    }

    /// Set the buffer ceiling
    pub fn with_max_buffer_len(mut self, max_buffer_len: usize) -> Self {
        self.config.max_buffer_len = max_buffer_len;
        self
    }

    /// Replace the whole configuration
    pub fn with_config(mut self, config: DecoderConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the session
    pub fn build(self) -> Result<DecodeSession> {
        self.config.validate()?;
        Ok(DecodeSession::with_config_unchecked(self.config))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
