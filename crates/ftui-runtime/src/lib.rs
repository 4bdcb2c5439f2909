#![forbid(unsafe_code)]

//! FrankenTUI Runtime
//!
//! Ties the core, render, and style crates into a complete event → message →
//! update → frame application loop.
//!
//! # Key Components
//!
//! - [`program::Program`] — the event/message/update/render loop.
//! - [`program::Model`] / [`program::Cmd`] — the Elm-architecture vocabulary
//!   applications implement.
//! - [`framerate_limiter::FramerateLimiter`] — render-tick pacing.
//! - [`subscription::Subscription`] — declarative background event sources.
//! - [`ProgramConfig`] — immutable startup configuration for a `Program`.

pub mod debug_trace;
pub mod errors;
pub mod framerate_limiter;
pub mod logging;
pub mod program;
pub mod subscription;

#[cfg(feature = "tracing")]
pub use logging::{
    debug, debug_span, error, error_span, info, info_span, trace, trace_span, warn, warn_span,
};

pub use errors::RuntimeError;
pub use framerate_limiter::{FramerateLimiter, FramerateLimiterStats, SUPPORTED_FPS};
pub use program::{Cmd, EventOutcome, Model, Program};
pub use subscription::{Every, Subscription, SubId};

use ftui_style::ColorProfile;

/// Immutable startup configuration for a [`Program`].
///
/// Constructed with [`Default`] and adjusted with `with_*` builder methods;
/// once a `Program` is built from it there is no way to mutate it in place —
/// runtime-adjustable behavior (frame rate, color profile) goes through the
/// typed operations [`FramerateLimiter::set_fps`] names, not by re-reading
/// this struct.
#[derive(Debug, Clone)]
pub struct ProgramConfig {
    /// Target frame rate. Expected to be one of [`SUPPORTED_FPS`], though
    /// this is not enforced at construction.
    pub target_fps: u32,
    /// Byte threshold at which `SequenceBuffer::append` auto-flushes.
    pub sequence_flush_threshold: usize,
    /// Whether the program uses the terminal's alternate screen buffer.
    pub alternate_screen: bool,
    /// Whether mouse tracking is enabled at startup.
    pub mouse_capture: bool,
    /// Whether bracketed paste is enabled at startup.
    pub bracketed_paste: bool,
    /// Maximum number of queued, undrained messages. `None` means unbounded;
    /// when bounded, the newest message is dropped on overflow.
    pub max_queue_size: Option<usize>,
    /// Fixed color profile, overriding auto-detection from
    /// `TerminalCapabilities`. `None` means auto-detect.
    pub color_profile: Option<ColorProfile>,
}

impl Default for ProgramConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            sequence_flush_threshold: 4096,
            alternate_screen: true,
            mouse_capture: false,
            bracketed_paste: false,
            max_queue_size: None,
            color_profile: None,
        }
    }
}

impl ProgramConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target frame rate.
    #[must_use]
    pub fn with_target_fps(mut self, fps: u32) -> Self {
        self.target_fps = fps;
        self
    }

    /// Set the `SequenceBuffer` auto-flush threshold.
    #[must_use]
    pub fn with_sequence_flush_threshold(mut self, threshold: usize) -> Self {
        self.sequence_flush_threshold = threshold;
        self
    }

    /// Toggle the alternate screen buffer.
    #[must_use]
    pub fn with_alternate_screen(mut self, enabled: bool) -> Self {
        self.alternate_screen = enabled;
        self
    }

    /// Toggle mouse tracking at startup.
    #[must_use]
    pub fn with_mouse_capture(mut self, enabled: bool) -> Self {
        self.mouse_capture = enabled;
        self
    }

    /// Toggle bracketed paste at startup.
    #[must_use]
    pub fn with_bracketed_paste(mut self, enabled: bool) -> Self {
        self.bracketed_paste = enabled;
        self
    }

    /// Bound the message queue, dropping newest messages on overflow.
    #[must_use]
    pub fn with_max_queue_size(mut self, max_size: usize) -> Self {
        self.max_queue_size = Some(max_size);
        self
    }

    /// Force a specific color profile instead of auto-detecting.
    #[must_use]
    pub fn with_color_profile(mut self, profile: ColorProfile) -> Self {
        self.color_profile = Some(profile);
        self
    }
}
