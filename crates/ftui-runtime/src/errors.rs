#![forbid(unsafe_code)]

//! Error types for the runtime crate.

/// Errors returned by [`crate::program::Program`]'s fallible entry points.
///
/// Component-local failures (panics inside `event_to_msg`/`update`/`view`)
/// are caught at the call site with `catch_unwind` and never surface here;
/// this enum covers failures the Runtime itself cannot recover from locally.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// A terminal session or I/O operation failed (raw mode, resize query,
    /// event read).
    #[error("terminal I/O failed: {0}")]
    Terminal(#[source] std::io::Error),
    /// Writing or flushing a rendered frame failed.
    #[error("frame I/O failed: {0}")]
    Io(#[source] std::io::Error),
    /// The render kernel rejected a buffer operation (oversized resize).
    #[error("render error: {0}")]
    Render(#[source] ftui_render::errors::RenderError),
    /// A background command's channel was closed while a result was still
    /// pending, which only happens during shutdown races.
    #[error("command channel closed during shutdown")]
    ChannelClosed,
}
