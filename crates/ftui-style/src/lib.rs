#![forbid(unsafe_code)]

//! Color negotiation and the `Style` vocabulary layered on top of the
//! render kernel's glyph-less [`ftui_render::cell::CellStyle`].

pub mod color;
pub mod style;

pub use color::{Ansi16, CacheStats, Color, ColorCache, ColorProfile, MonoColor, Rgb};
pub use style::Style;
