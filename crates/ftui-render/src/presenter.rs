#![forbid(unsafe_code)]

//! Presenter: turns a [`crate::diff::diff`] operation stream into terminal
//! output.
//!
//! The Presenter owns a [`SequenceBuffer`] (which in turn owns the
//! [`crate::sgr::SgrEncoder`]), runs each [`Operation`] through the cursor
//! optimizer and the style delta encoder, and flushes the accumulated bytes
//! to a [`CountingWriter`]-wrapped writer once per frame.
//!
//! # Usage
//!
//! ```ignore
//! use ftui_render::presenter::Presenter;
//! use ftui_render::buffer::Buffer;
//!
//! let mut presenter = Presenter::new(std::io::stdout());
//! let current = Buffer::new(24, 80)?;
//! let previous = Buffer::new(24, 80)?;
//! // ... rasterize into `current` ...
//! let stats = presenter.present(&current, &previous)?;
//! ```

use std::io::{self, BufWriter, Write};

use crate::ansi;
use crate::buffer::Buffer;
use crate::counting_writer::{CountingWriter, PresentStats, StatsCollector};
use crate::diff::{self, Operation};
use crate::sequence_buffer::SequenceBuffer;

/// Size of the internal write buffer (64KB).
const BUFFER_CAPACITY: usize = 64 * 1024;

/// Turns an [`Operation`] stream into terminal bytes, tracking cursor
/// position across the whole frame so [`crate::cursor_optimizer::move_cursor`]
/// always sees the true "from" position.
pub struct Presenter<W: Write> {
    writer: CountingWriter<BufWriter<W>>,
    sequence: SequenceBuffer,
    cursor: Option<(u16, u16)>,
    sync_output: bool,
}

impl<W: Write> Presenter<W> {
    /// A new presenter with synchronized output (DEC 2026) disabled.
    pub fn new(writer: W) -> Self {
        Self {
            writer: CountingWriter::new(BufWriter::with_capacity(BUFFER_CAPACITY, writer)),
            sequence: SequenceBuffer::new(),
            cursor: None,
            sync_output: false,
        }
    }

    /// Enable or disable wrapping each frame in DEC 2026 synchronized
    /// output, for terminals that advertise support.
    pub fn set_sync_output(&mut self, enabled: bool) {
        self.sync_output = enabled;
    }

    /// Diff `current` against `previous` and present the result.
    pub fn present(&mut self, current: &Buffer, previous: &Buffer) -> io::Result<PresentStats> {
        let ops = diff::diff(current, previous);
        self.present_ops(&ops)
    }

    /// Present a pre-computed operation stream directly.
    pub fn present_ops(&mut self, ops: &[Operation]) -> io::Result<PresentStats> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("present", ops = ops.len());
        #[cfg(feature = "tracing")]
        let _guard = _span.enter();

        self.writer.reset_counter();
        let cells_changed = ops.iter().filter(|op| matches!(op, Operation::Text(_))).count();
        let run_count = ops.iter().filter(|op| matches!(op, Operation::Move(_, _))).count();
        let collector = StatsCollector::start(cells_changed, run_count);

        if self.sync_output {
            self.drain(ansi::SYNC_BEGIN.to_vec())?;
        }

        for op in ops {
            self.apply(op)?;
        }

        let reset = self.sequence.append_reset();
        self.cursor = None;
        if let Some(payload) = reset {
            self.drain(payload)?;
        }

        if self.sync_output {
            self.drain(ansi::SYNC_END.to_vec())?;
        }

        let (payload, _stats) = self.sequence.flush();
        self.drain(payload)?;
        self.writer.flush()?;

        let stats = collector.finish(self.writer.bytes_written());
        #[cfg(feature = "tracing")]
        stats.log();
        Ok(stats)
    }

    fn apply(&mut self, op: &Operation) -> io::Result<()> {
        match op {
            Operation::Move(row, col) => {
                let to = (*row as u16, *col as u16);
                let from = self.cursor.unwrap_or((1, 1));
                if from != to {
                    let (bytes, _saved) = crate::cursor_optimizer::move_cursor(from, to);
                    self.drain(bytes)?;
                }
                self.cursor = Some(to);
            }
            Operation::SetStyle(style) => {
                if let Some(payload) = self.sequence.append_style(*style) {
                    self.drain(payload)?;
                }
            }
            Operation::Text(text) => {
                if let Some(payload) = self.sequence.append(text.as_bytes()) {
                    self.drain(payload)?;
                }
                if let Some((row, col)) = self.cursor {
                    let advance = crate::display_width(text) as u16;
                    self.cursor = Some((row, col.saturating_add(advance)));
                }
            }
            Operation::Reset => {
                if let Some(payload) = self.sequence.append_reset() {
                    self.drain(payload)?;
                }
            }
        }
        Ok(())
    }

    fn drain(&mut self, bytes: Vec<u8>) -> io::Result<()> {
        if !bytes.is_empty() {
            self.writer.write_all(&bytes)?;
        }
        Ok(())
    }

    /// Clear the entire screen and home the cursor.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        ansi::erase_display(&mut self.writer, ansi::EraseDisplayMode::All)?;
        ansi::cup(&mut self.writer, 0, 0)?;
        self.cursor = Some((1, 1));
        self.writer.flush()
    }

    /// Hide the cursor.
    pub fn hide_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_hide(&mut self.writer)?;
        self.writer.flush()
    }

    /// Show the cursor.
    pub fn show_cursor(&mut self) -> io::Result<()> {
        ansi::cursor_show(&mut self.writer)?;
        self.writer.flush()
    }

    /// Enter the alternate screen buffer.
    pub fn enter_alt_screen(&mut self) -> io::Result<()> {
        ansi::alt_screen_enter(&mut self.writer)?;
        self.writer.flush()
    }

    /// Leave the alternate screen buffer.
    pub fn leave_alt_screen(&mut self) -> io::Result<()> {
        ansi::alt_screen_leave(&mut self.writer)?;
        self.writer.flush()
    }

    /// Forget tracked cursor and style state. Call after a resize or when
    /// the terminal's actual state is otherwise unknown, so the next frame
    /// emits a full prefix instead of a (possibly wrong) delta.
    pub fn reset(&mut self) {
        self.cursor = None;
        self.sequence.reset_style();
    }

    /// Flush any buffered output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the presenter, flushing buffered data and returning the
    /// inner writer.
    pub fn into_inner(self) -> Result<W, io::Error> {
        self.writer
            .into_inner()
            .into_inner()
            .map_err(|e| e.into_error())
    }
}
