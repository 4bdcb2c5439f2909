//! `Style`: the fg/bg/attrs vocabulary widgets and the SGR encoder share.

use ftui_render::cell::{CellColor, CellStyle, StyleFlags};

use crate::color::{Color, ColorProfile};

/// A cell's visual style at the `ftui-style` fidelity level: colors that
/// haven't yet been downgraded to a terminal's negotiated [`ColorProfile`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Style {
    /// Foreground color, or `None` to inherit the terminal default.
    pub fg: Option<Color>,
    /// Background color, or `None` to inherit the terminal default.
    pub bg: Option<Color>,
    /// Active attribute flags.
    pub attrs: StyleFlags,
}

impl Style {
    /// The empty style: default colors, no attributes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy with the given foreground color.
    #[must_use]
    pub fn fg(mut self, color: Color) -> Self {
        self.fg = Some(color);
        self
    }

    /// Return a copy with the given background color.
    #[must_use]
    pub fn bg(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    /// Return a copy with `flags` added to the active attribute set.
    #[must_use]
    pub fn with_flags(mut self, flags: StyleFlags) -> Self {
        self.attrs |= flags;
        self
    }

    /// Downgrade both colors to `profile` and pack into the render kernel's
    /// [`CellStyle`]. This is the only place a `Color` becomes a `CellColor`
    /// for cells that will reach the terminal, since `ftui-render` cannot
    /// depend on `ftui-style` to do this downgrade itself.
    #[must_use]
    pub fn to_cell_style(self, profile: ColorProfile) -> CellStyle {
        CellStyle {
            fg: self
                .fg
                .map(|c| CellColor::from(c.downgrade(profile)))
                .unwrap_or(CellColor::DEFAULT),
            bg: self
                .bg
                .map(|c| CellColor::from(c.downgrade(profile)))
                .unwrap_or(CellColor::DEFAULT),
            flags: self.attrs,
        }
    }
}
