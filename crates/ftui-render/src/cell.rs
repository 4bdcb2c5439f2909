#![forbid(unsafe_code)]

//! The terminal grid's atomic unit of content.
//!
//! A [`Cell`] is an immutable, 16-byte value: one grapheme plus foreground
//! color, background color, and attribute set. Sixteen bytes keeps a row of
//! cells cache-line friendly and lets equality be a single bitwise compare
//! (see [`Cell::bits_eq`]) instead of four separate field comparisons.
//!
//! Glyphs that fit in a single `char` are stored inline in [`CellContent`];
//! multi-codepoint grapheme clusters (flags, ZWJ emoji sequences, combining
//! marks) are interned in a [`crate::grapheme_pool::GraphemePool`] and
//! referenced by [`GraphemeId`].

use std::cell::RefCell;
use unicode_segmentation::UnicodeSegmentation;

thread_local! {
    /// Backing pool for [`Cell::new`], which has no pool parameter of its
    /// own. Entries are never released, so this constructor is meant for
    /// tests and one-off cells; long-lived grid content goes through
    /// [`Cell::from_grapheme`] with a caller-owned pool instead.
    static FALLBACK_POOL: RefCell<crate::grapheme_pool::GraphemePool> =
        RefCell::new(crate::grapheme_pool::GraphemePool::new());
}

/// A compact reference into a [`crate::grapheme_pool::GraphemePool`].
///
/// Packs a 24-bit pool slot and an 8-bit cached display width into one
/// `u32`, so a grapheme reference is exactly as wide as an inline `char`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GraphemeId(u32);

impl GraphemeId {
    /// Largest representable pool slot (24 bits).
    pub const MAX_SLOT: u32 = 0x00FF_FFFF;
    /// Largest representable cached width (8 bits, though cells only use 0-2).
    pub const MAX_WIDTH: u8 = 127;

    /// Pack a slot index and width into a `GraphemeId`.
    ///
    /// Panics in debug mode if `slot > MAX_SLOT` or `width > MAX_WIDTH`.
    #[must_use]
    pub fn new(slot: u32, width: u8) -> Self {
        debug_assert!(slot <= Self::MAX_SLOT, "slot overflow");
        debug_assert!(width <= Self::MAX_WIDTH, "width overflow");
        Self((slot & Self::MAX_SLOT) | ((width as u32) << 24))
    }

    /// The pool slot this id references.
    #[must_use]
    pub fn slot(self) -> usize {
        (self.0 & Self::MAX_SLOT) as usize
    }

    /// The cached display width.
    #[must_use]
    pub fn width(self) -> u8 {
        (self.0 >> 24) as u8
    }
}

/// Packed glyph content: either an inline `char` or a grapheme-pool reference.
///
/// Bit 31 discriminates the two cases. Inline chars use bits 0..=20 (a `char`
/// always fits in 21 bits); pool references use bits 0..=23 as a
/// [`GraphemeId`] slot (width is tracked separately on [`Cell`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellContent(u32);

const POOL_REF_BIT: u32 = 1 << 31;
/// Out-of-range inline value reserved for the wide-placeholder sentinel.
const CONTINUATION_BITS: u32 = 0x001F_FFFF;

impl CellContent {
    /// The default cell content: a single space.
    pub const EMPTY: Self = Self(0x20);
    /// Sentinel for the right half of a wide character pair. Carries no
    /// glyph of its own; the primary cell to its left owns the text.
    pub const CONTINUATION: Self = Self(CONTINUATION_BITS);

    /// Encode a single `char` inline.
    #[must_use]
    pub fn from_char(c: char) -> Self {
        Self(c as u32 & 0x1FFFFF)
    }

    /// Encode a grapheme-pool reference.
    #[must_use]
    pub fn from_pool_slot(slot: u32) -> Self {
        debug_assert!(slot <= GraphemeId::MAX_SLOT);
        Self(POOL_REF_BIT | (slot & GraphemeId::MAX_SLOT))
    }

    /// True if this content is a grapheme-pool reference.
    #[must_use]
    pub fn is_pool_ref(self) -> bool {
        self.0 & POOL_REF_BIT != 0
    }

    /// The referenced pool slot, if this is a pool reference.
    #[must_use]
    pub fn pool_slot(self) -> Option<u32> {
        self.is_pool_ref().then_some(self.0 & GraphemeId::MAX_SLOT)
    }

    /// The inline `char`, if this content is neither a pool reference nor
    /// the continuation sentinel.
    #[must_use]
    pub fn as_char(self) -> Option<char> {
        if self.is_pool_ref() || self == Self::CONTINUATION {
            return None;
        }
        char::from_u32(self.0 & 0x1FFFFF)
    }
}

/// A color attached to a [`Cell`]'s foreground or background.
///
/// Packs the same four-variant vocabulary `ftui_style::Color` exposes
/// (default / 16-color / 256-color / truecolor) into one `u32` so `Cell`
/// keeps its 16-byte layout. `ftui-render` does not depend on `ftui-style`;
/// the style crate converts to and from this type instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellColor(u32);

const COLOR_TAG_SHIFT: u32 = 30;
const COLOR_TAG_MASK: u32 = 0b11 << COLOR_TAG_SHIFT;
const COLOR_TAG_DEFAULT: u32 = 0 << COLOR_TAG_SHIFT;
const COLOR_TAG_NAMED16: u32 = 1 << COLOR_TAG_SHIFT;
const COLOR_TAG_PALETTE: u32 = 2 << COLOR_TAG_SHIFT;
const COLOR_TAG_RGB: u32 = 3 << COLOR_TAG_SHIFT;

impl CellColor {
    /// The "not set, inherit terminal default" color.
    pub const DEFAULT: Self = Self(COLOR_TAG_DEFAULT);

    /// A standard or bright 16-color index (0-15).
    #[must_use]
    pub fn named16(index: u8) -> Self {
        Self(COLOR_TAG_NAMED16 | (index as u32 & 0x0F))
    }

    /// A 256-color palette index.
    #[must_use]
    pub fn palette(index: u8) -> Self {
        Self(COLOR_TAG_PALETTE | (index as u32))
    }

    /// A 24-bit truecolor value.
    #[must_use]
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(COLOR_TAG_RGB | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32))
    }

    /// True if this is the default (inherit) color.
    #[must_use]
    pub fn is_default(self) -> bool {
        self.0 & COLOR_TAG_MASK == COLOR_TAG_DEFAULT
    }

    /// Decompose into a tagged enum for encoders that need to branch on the
    /// color kind without reaching into `ftui-style`.
    #[must_use]
    pub fn decompose(self) -> CellColorKind {
        match self.0 & COLOR_TAG_MASK {
            COLOR_TAG_DEFAULT => CellColorKind::Default,
            COLOR_TAG_NAMED16 => CellColorKind::Named16((self.0 & 0x0F) as u8),
            COLOR_TAG_PALETTE => CellColorKind::Palette((self.0 & 0xFF) as u8),
            _ => CellColorKind::Rgb(
                ((self.0 >> 16) & 0xFF) as u8,
                ((self.0 >> 8) & 0xFF) as u8,
                (self.0 & 0xFF) as u8,
            ),
        }
    }
}

impl Default for CellColor {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// The decoded form of a [`CellColor`], used by encoders and by
/// `ftui-style::Color` conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellColorKind {
    /// Inherit the terminal's default color.
    Default,
    /// Standard or bright 16-color index.
    Named16(u8),
    /// 256-color palette index.
    Palette(u8),
    /// 24-bit truecolor value.
    Rgb(u8, u8, u8),
}

bitflags::bitflags! {
    /// Text attribute flags, matching the SGR codes the style delta encoder emits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StyleFlags: u8 {
        /// Bold / increased intensity (SGR 1).
        const BOLD = 0b0000_0001;
        /// Dim / decreased intensity (SGR 2).
        const DIM = 0b0000_0010;
        /// Italic (SGR 3).
        const ITALIC = 0b0000_0100;
        /// Underline (SGR 4).
        const UNDERLINE = 0b0000_1000;
        /// Blink (SGR 5).
        const BLINK = 0b0001_0000;
        /// Reverse video (SGR 7).
        const REVERSE = 0b0010_0000;
        /// Strikethrough (SGR 9).
        const STRIKETHROUGH = 0b0100_0000;
        /// Hidden / conceal (SGR 8).
        const HIDDEN = 0b1000_0000;
    }
}

/// Packed cell attributes: style flags plus display width and the
/// wide-placeholder discriminator.
///
/// `width == 0` is definitionally the wide-placeholder case, so this type
/// stores width once rather than two redundant fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellAttrs(u32);

impl CellAttrs {
    /// Build attrs from a flag set and a display width (0, 1, or 2).
    #[must_use]
    pub fn new(flags: StyleFlags, width: u8) -> Self {
        debug_assert!(width <= 2, "cell width must be 0, 1, or 2");
        Self((flags.bits() as u32) | ((width as u32) << 8))
    }

    /// The style flag set.
    #[must_use]
    pub fn flags(self) -> StyleFlags {
        StyleFlags::from_bits_truncate(self.0 as u8)
    }

    /// The display width (0, 1, or 2).
    #[must_use]
    pub fn width(self) -> u8 {
        ((self.0 >> 8) & 0x3) as u8
    }

    /// True if this is a wide-placeholder (`width == 0`).
    #[must_use]
    pub fn is_wide_placeholder(self) -> bool {
        self.width() == 0
    }

    /// Return a copy with a different flag set, same width.
    #[must_use]
    pub fn with_flags(self, flags: StyleFlags) -> Self {
        Self::new(flags, self.width())
    }

    /// Return a copy with a different width, same flags.
    #[must_use]
    pub fn with_width(self, width: u8) -> Self {
        Self::new(self.flags(), width)
    }

    /// True if `flag` is set.
    #[must_use]
    pub fn has_flag(self, flag: StyleFlags) -> bool {
        self.flags().contains(flag)
    }
}

/// One position in the terminal grid: a grapheme plus its style.
///
/// `#[repr(C, align(16))]` pins the layout to exactly four `u32` words
/// (content, fg, bg, attrs) so a row of cells is contiguous and
/// vector-friendly, and so [`Cell::bits_eq`] can compare a whole cell with
/// one bitwise OR-of-XORs instead of four field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C, align(16))]
pub struct Cell {
    content: CellContent,
    fg: CellColor,
    bg: CellColor,
    attrs: CellAttrs,
}

const _: () = assert!(std::mem::size_of::<Cell>() == 16);

impl Cell {
    /// Strip CSI/OSC/ESC sequences and non-printable control code points
    /// from caller-supplied text, keeping `0x20..=0x7E` and `>= 0xA0`.
    ///
    /// This is the glyph-sanitization security invariant: no caller-supplied
    /// string can reach the terminal encoder as a literal escape sequence,
    /// because the only place a `Cell`'s glyph is ever set is here.
    fn sanitize_glyph(glyph: &str) -> String {
        let mut out = String::with_capacity(glyph.len());
        let mut chars = glyph.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '\u{1B}' => match chars.peek() {
                    Some('[') => {
                        chars.next();
                        for d in chars.by_ref() {
                            if d.is_ascii_alphabetic() || d == '~' {
                                break;
                            }
                        }
                    }
                    Some(']') => {
                        chars.next();
                        let mut prev = '\0';
                        for d in chars.by_ref() {
                            if d == '\u{07}' || (prev == '\u{1B}' && d == '\\') {
                                break;
                            }
                            prev = d;
                        }
                    }
                    _ => {}
                },
                c if (c as u32) < 0x20 || (0x7F..=0x9F).contains(&(c as u32)) => {}
                c => out.push(c),
            }
        }
        if out.is_empty() {
            out.push(' ');
        }
        out
    }

    /// Construct a cell from a (possibly multi-codepoint, multi-grapheme)
    /// glyph, colors, and attributes. Sanitizes the glyph and computes width
    /// once.
    ///
    /// Content that fits a single `char` is stored inline. Anything wider
    /// than that (a multi-codepoint grapheme cluster, or more than one
    /// grapheme cluster) is interned in a thread-local fallback pool that
    /// nothing ever releases from; use [`Cell::from_grapheme`] with a
    /// caller-owned [`crate::grapheme_pool::GraphemePool`] for grid content
    /// that needs proper reference-count cleanup.
    #[must_use]
    pub fn new(glyph: &str, fg: CellColor, bg: CellColor, flags: StyleFlags) -> Self {
        let clean = Self::sanitize_glyph(glyph);
        let width = crate::display_width(&clean).min(2) as u8;
        let content = Self::pack_content(&clean, width);
        Self {
            content,
            fg,
            bg,
            attrs: CellAttrs::new(flags, width),
        }
    }

    fn pack_content(clean: &str, width: u8) -> CellContent {
        let mut graphemes = clean.graphemes(true);
        match (graphemes.next(), graphemes.next()) {
            (Some(g), None) => {
                let mut it = g.chars();
                match (it.next(), it.next()) {
                    (Some(c), None) => CellContent::from_char(c),
                    _ => Self::intern_fallback(g, width),
                }
            }
            (Some(_), Some(_)) => Self::intern_fallback(clean, width),
            (None, _) => CellContent::EMPTY,
        }
    }

    /// Intern `text` into the thread-local fallback pool used by
    /// [`Cell::new`] for content that doesn't fit inline.
    fn intern_fallback(text: &str, width: u8) -> CellContent {
        FALLBACK_POOL.with(|pool| {
            let slot = pool.borrow_mut().intern(text, width).slot() as u32;
            CellContent::from_pool_slot(slot)
        })
    }

    /// Construct a cell from one grapheme cluster, interning it in `pool`
    /// when it doesn't fit inline (multi-codepoint emoji, ZWJ sequences,
    /// combining marks). This is the path [`crate::buffer::Buffer::write_string`]
    /// uses; unlike [`Cell::new`]'s thread-local fallback pool, `pool` here
    /// is caller-owned and can actually be released from.
    #[must_use]
    pub fn from_grapheme(
        pool: &mut crate::grapheme_pool::GraphemePool,
        grapheme: &str,
        fg: CellColor,
        bg: CellColor,
        flags: StyleFlags,
    ) -> Self {
        let clean = Self::sanitize_glyph(grapheme);
        let width = crate::display_width(&clean).min(2) as u8;
        let mut chars = clean.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Self {
                content: CellContent::from_char(c),
                fg,
                bg,
                attrs: CellAttrs::new(flags, width),
            },
            _ => {
                let slot = pool.intern(&clean, width).slot() as u32;
                Self::with_pool_content(slot, width, fg, bg, flags)
            }
        }
    }

    /// The empty cell: a single space, default colors, no attributes.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            content: CellContent::EMPTY,
            fg: CellColor::DEFAULT,
            bg: CellColor::DEFAULT,
            attrs: CellAttrs::new(StyleFlags::empty(), 1),
        }
    }

    /// The wide-placeholder cell: no glyph of its own, inheriting style
    /// from `primary`.
    #[must_use]
    pub fn placeholder(primary: &Cell) -> Self {
        Self {
            content: CellContent::CONTINUATION,
            fg: primary.fg,
            bg: primary.bg,
            attrs: CellAttrs::new(primary.attrs.flags(), 0),
        }
    }

    /// Build a cell whose glyph is already interned in a grapheme pool.
    #[must_use]
    pub fn with_pool_content(
        pool_slot: u32,
        width: u8,
        fg: CellColor,
        bg: CellColor,
        flags: StyleFlags,
    ) -> Self {
        Self {
            content: CellContent::from_pool_slot(pool_slot),
            fg,
            bg,
            attrs: CellAttrs::new(flags, width.min(2)),
        }
    }

    /// The raw packed content (inline char or pool reference).
    #[must_use]
    pub fn content(self) -> CellContent {
        self.content
    }

    /// The foreground color.
    #[must_use]
    pub fn fg(self) -> CellColor {
        self.fg
    }

    /// The background color.
    #[must_use]
    pub fn bg(self) -> CellColor {
        self.bg
    }

    /// The packed attribute set (flags + width).
    #[must_use]
    pub fn attrs(self) -> CellAttrs {
        self.attrs
    }

    /// Display width: 0 (placeholder), 1, or 2.
    #[must_use]
    pub fn width(self) -> u8 {
        self.attrs.width()
    }

    /// True if this cell is the right half of a wide character pair.
    #[must_use]
    pub fn is_wide_placeholder(self) -> bool {
        self.attrs.is_wide_placeholder()
    }

    /// Return a copy with a new foreground color.
    #[must_use]
    pub fn with_fg(self, fg: CellColor) -> Self {
        Self { fg, ..self }
    }

    /// Return a copy with a new background color.
    #[must_use]
    pub fn with_bg(self, bg: CellColor) -> Self {
        Self { bg, ..self }
    }

    /// Return a copy with a new attribute flag set (width unchanged).
    #[must_use]
    pub fn with_flags(self, flags: StyleFlags) -> Self {
        Self {
            attrs: self.attrs.with_flags(flags),
            ..self
        }
    }

    /// Compare two cells with a single bitwise reduction instead of four
    /// field comparisons. Semantically identical to `==`, just cheaper to
    /// vectorize across a row of cells.
    #[must_use]
    #[inline]
    pub fn bits_eq(&self, other: &Self) -> bool {
        let a = (self.content.0, self.fg.0, self.bg.0, self.attrs.0);
        let b = (other.content.0, other.fg.0, other.bg.0, other.attrs.0);
        (a.0 ^ b.0) | (a.1 ^ b.1) | (a.2 ^ b.2) | (a.3 ^ b.3) == 0
    }

    /// Resolve this cell's glyph to an owned string, given the pool it may
    /// reference. Empty for wide placeholders.
    #[must_use]
    pub fn glyph<'a>(
        &self,
        pool: &'a crate::grapheme_pool::GraphemePool,
    ) -> std::borrow::Cow<'a, str> {
        if let Some(c) = self.content.as_char() {
            std::borrow::Cow::Owned(c.to_string())
        } else if let Some(slot) = self.content.pool_slot() {
            std::borrow::Cow::Borrowed(
                pool.get(GraphemeId::new(slot, self.width())).unwrap_or(""),
            )
        } else {
            std::borrow::Cow::Borrowed("")
        }
    }
}

/// A cell's visual style, decoupled from its glyph: what [`crate::diff`] groups
/// runs by and what the SGR encoder consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CellStyle {
    /// Foreground color.
    pub fg: CellColor,
    /// Background color.
    pub bg: CellColor,
    /// Active attribute flags.
    pub flags: StyleFlags,
}

impl CellStyle {
    /// Extract the style of a cell, discarding its glyph.
    #[must_use]
    pub fn of(cell: Cell) -> Self {
        Self {
            fg: cell.fg(),
            bg: cell.bg(),
            flags: cell.attrs().flags(),
        }
    }
}
