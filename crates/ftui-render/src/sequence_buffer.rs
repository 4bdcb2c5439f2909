#![forbid(unsafe_code)]

//! Append-only byte accumulator for one frame's worth of terminal output.

use crate::cell::CellStyle;
use crate::sgr::SgrEncoder;

/// Accumulated statistics for a [`SequenceBuffer`]'s lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SequenceBufferStats {
    /// Total bytes ever appended, including auto-flushed payloads.
    pub total_bytes: u64,
    /// Number of times `append` triggered an auto-flush.
    pub flush_count: u64,
}

/// Accumulates output bytes for one render tick, auto-flushing once
/// `threshold` bytes have queued up, and owns the [`SgrEncoder`] so style
/// changes are deduplicated across the whole buffered stream.
#[derive(Debug)]
pub struct SequenceBuffer {
    pending: Vec<u8>,
    threshold: usize,
    stats: SequenceBufferStats,
    encoder: SgrEncoder,
}

/// Default auto-flush threshold in bytes.
pub const DEFAULT_THRESHOLD: usize = 4096;

impl SequenceBuffer {
    /// A new buffer with the default 4096-byte threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::with_threshold(DEFAULT_THRESHOLD)
    }

    /// A new buffer with a caller-supplied auto-flush threshold.
    #[must_use]
    pub fn with_threshold(threshold: usize) -> Self {
        Self {
            pending: Vec::with_capacity(threshold.min(1 << 20)),
            threshold,
            stats: SequenceBufferStats::default(),
            encoder: SgrEncoder::new(),
        }
    }

    /// Append literal bytes. Returns an auto-flushed payload if the
    /// threshold was crossed.
    pub fn append(&mut self, data: &[u8]) -> Option<Vec<u8>> {
        self.pending.extend_from_slice(data);
        if self.pending.len() >= self.threshold {
            Some(self.flush().0)
        } else {
            None
        }
    }

    /// Encode `style` through the delta encoder and append the resulting
    /// SGR sequence, if any bytes changed.
    pub fn append_style(&mut self, style: CellStyle) -> Option<Vec<u8>> {
        let seq = self.encoder.encode(style);
        if seq.is_empty() {
            None
        } else {
            self.append(seq.as_bytes())
        }
    }

    /// Append `ESC[0m` and forget the active style, without touching the
    /// accumulated byte count beyond the reset sequence itself.
    pub fn append_reset(&mut self) -> Option<Vec<u8>> {
        let seq = self.encoder.reset();
        self.append(seq.as_bytes())
    }

    /// Drain the accumulated bytes in order, updating stats. Does not reset
    /// the SGR encoder's notion of the active style.
    pub fn flush(&mut self) -> (Vec<u8>, SequenceBufferStats) {
        let payload = std::mem::take(&mut self.pending);
        self.stats.total_bytes += payload.len() as u64;
        self.stats.flush_count += 1;
        (payload, self.stats)
    }

    /// Forget the active style so the next `append_style` call emits a full
    /// SGR prefix rather than a delta.
    pub fn reset_style(&mut self) {
        self.encoder.reset();
    }

    /// Current statistics.
    #[must_use]
    pub fn stats(&self) -> SequenceBufferStats {
        self.stats
    }

    /// Bytes currently queued but not yet flushed.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Default for SequenceBuffer {
    fn default() -> Self {
        Self::new()
    }
}
