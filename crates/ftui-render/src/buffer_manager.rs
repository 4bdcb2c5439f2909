#![forbid(unsafe_code)]

//! Owns the current/previous double-buffer pair the Runtime diffs each tick.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::buffer::Buffer;
use crate::errors::RenderError;

/// Holds the two [`Buffer`]s a render tick diffs against each other, plus a
/// lock-free dirty flag any thread may set.
#[derive(Debug)]
pub struct BufferManager {
    current: Buffer,
    previous: Buffer,
    dirty: AtomicU64,
}

impl BufferManager {
    /// Allocate both buffers at `rows` x `cols`.
    pub fn new(rows: usize, cols: usize) -> Result<Self, RenderError> {
        Ok(Self {
            current: Buffer::new(rows, cols)?,
            previous: Buffer::new(rows, cols)?,
            dirty: AtomicU64::new(0),
        })
    }

    /// Exchange `current` and `previous`. Callers must ensure all writers
    /// have quiesced before calling this; holding a buffer reference across
    /// a swap is a programming error, since the two buffers trade places.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.current, &mut self.previous);
    }

    /// Set the dirty flag. Lock-free; any thread may call this.
    pub fn mark_dirty(&self) {
        self.dirty.store(1, Ordering::Release);
    }

    /// Clear the dirty flag.
    pub fn clear_dirty(&self) {
        self.dirty.store(0, Ordering::Release);
    }

    /// Read the dirty flag.
    #[must_use]
    pub fn dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire) != 0
    }

    /// Resize both buffers in lockstep, preserving overlapping content.
    pub fn resize(&mut self, rows: usize, cols: usize) -> Result<(), RenderError> {
        self.current = self.current.resize(rows, cols)?;
        self.previous = self.previous.resize(rows, cols)?;
        Ok(())
    }

    /// The buffer the next frame writes into.
    #[must_use]
    pub fn current(&self) -> &Buffer {
        &self.current
    }

    /// Mutable access to the current buffer, for rasterizing a new frame.
    pub fn current_mut(&mut self) -> &mut Buffer {
        &mut self.current
    }

    /// The buffer representing the terminal's last-known state.
    #[must_use]
    pub fn previous(&self) -> &Buffer {
        &self.previous
    }
}
