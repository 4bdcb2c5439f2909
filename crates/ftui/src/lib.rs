#![forbid(unsafe_code)]

//! FrankenTUI public facade crate.
//!
//! # Role in FrankenTUI
//! This crate is the user-facing entry point for the ecosystem. It re-exports
//! the most commonly used types from the internal crates (core/render/style/
//! runtime) so application code does not need to wire each crate
//! individually.
//!
//! # What belongs here
//! - Stable public surface area (re-exports).
//! - Minimal glue and convenience APIs.
//! - A lightweight prelude for day-to-day use.
//!
//! # How it fits in the system
//! - Input and terminal lifecycle: provided by `ftui-core`
//! - Render kernel (buffers, diffing, ANSI presentation): provided by `ftui-render`
//! - Color and style vocabulary: provided by `ftui-style`
//! - The event/message/update/frame loop: provided by `ftui-runtime`
//! - This crate ties them together for application authors.
//!
//! If you only depend on one crate in your application, it should be `ftui`.

use std::fmt;

// --- Core re-exports -------------------------------------------------------

pub use ftui_core::cursor::{CursorManager, CursorSaveStrategy};
pub use ftui_core::event::{
    ClipboardEvent, ClipboardSource, Event, KeyCode, KeyEvent, KeyEventKind, Modifiers,
    MouseButton, MouseEvent, MouseEventKind, PasteEvent,
};
pub use ftui_core::geometry::{Rect, Sides, Size};
pub use ftui_core::terminal_capabilities::TerminalCapabilities;
#[cfg(not(target_arch = "wasm32"))]
pub use ftui_core::terminal_session::{SessionOptions, TerminalSession};

// --- Render re-exports -----------------------------------------------------

pub use ftui_render::buffer::Buffer;
pub use ftui_render::buffer_manager::BufferManager;
pub use ftui_render::cell::{Cell, CellAttrs, CellStyle};
pub use ftui_render::diff::{diff, Operation};
pub use ftui_render::errors::RenderError;
pub use ftui_render::presenter::Presenter;
pub use ftui_render::render_node::{rasterize, RenderNode};

// --- Style re-exports ------------------------------------------------------

pub use ftui_style::{Ansi16, Color, ColorCache, ColorProfile, MonoColor, Rgb, Style};

// --- Runtime re-exports ------------------------------------------------------

#[cfg(feature = "runtime")]
pub use ftui_runtime::{
    Cmd, Every, EventOutcome, FramerateLimiter, FramerateLimiterStats, Model, Program,
    ProgramConfig, RuntimeError, SubId, Subscription, SUPPORTED_FPS,
};

// --- Errors ---------------------------------------------------------------

/// Top-level error type for ftui apps.
#[derive(Debug)]
pub enum Error {
    /// I/O failure during terminal operations.
    Io(std::io::Error),
    /// Terminal or runtime error with message.
    Terminal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::Terminal(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

/// Standard result type for ftui APIs.
pub type Result<T> = std::result::Result<T, Error>;

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    #[cfg(not(target_arch = "wasm32"))]
    pub use crate::TerminalSession;
    pub use crate::{Buffer, Error, Event, KeyCode, KeyEvent, Modifiers, Result, Style};

    #[cfg(feature = "runtime")]
    pub use crate::{Cmd, Model, Program, ProgramConfig};

    pub use crate::{core, render, style};

    #[cfg(feature = "runtime")]
    pub use crate::runtime;
}

pub use ftui_core as core;
pub use ftui_render as render;
#[cfg(feature = "runtime")]
pub use ftui_runtime as runtime;
pub use ftui_style as style;
