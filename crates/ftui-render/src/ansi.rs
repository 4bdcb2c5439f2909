#![forbid(unsafe_code)]

//! ANSI escape sequence generation helpers.
//!
//! This module provides pure byte-generation functions for ANSI/VT control sequences.
//! It handles the encoding details so the Presenter can focus on state tracking and diffing.
//!
//! # Design Principles
//!
//! - **Pure functions**: No state tracking, just byte generation
//! - **Zero allocation**: Use stack buffers for common sequences
//! - **Explicit**: Readable helpers over clever formatting
//!
//! # Sequence Reference
//!
//! | Category | Sequence | Description |
//! |----------|----------|-------------|
//! | CSI | `ESC [ n m` | SGR (Select Graphic Rendition) |
//! | CSI | `ESC [ row ; col H` | CUP (Cursor Position, 1-indexed) |
//! | CSI | `ESC [ n K` | EL (Erase Line) |
//! | CSI | `ESC [ n J` | ED (Erase Display) |
//! | CSI | `ESC [ top ; bottom r` | DECSTBM (Set Scroll Region) |
//! | CSI | `ESC [ ? 2026 h/l` | Synchronized Output (DEC) |
//! | OSC | `ESC ] 52 ; c|p ; base64 ST` | Clipboard (OSC 52) |
//! | DEC | `ESC 7` / `ESC 8` | Cursor save/restore (DECSC/DECRC) |

use std::io::{self, Write};

use crate::cell::{CellColor, CellColorKind, StyleFlags};

// =============================================================================
// SGR (Select Graphic Rendition)
// =============================================================================

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &[u8] = b"\x1b[0m";

/// Write SGR reset sequence.
#[inline]
pub fn sgr_reset<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

/// SGR attribute codes for style flags.
#[derive(Debug, Clone, Copy)]
pub struct SgrCodes {
    /// Enable code
    pub on: u8,
    /// Disable code
    pub off: u8,
}

/// Map StyleFlags to SGR codes.
pub const SGR_BOLD: SgrCodes = SgrCodes { on: 1, off: 22 };
pub const SGR_DIM: SgrCodes = SgrCodes { on: 2, off: 22 };
pub const SGR_ITALIC: SgrCodes = SgrCodes { on: 3, off: 23 };
pub const SGR_UNDERLINE: SgrCodes = SgrCodes { on: 4, off: 24 };
pub const SGR_BLINK: SgrCodes = SgrCodes { on: 5, off: 25 };
pub const SGR_REVERSE: SgrCodes = SgrCodes { on: 7, off: 27 };
pub const SGR_HIDDEN: SgrCodes = SgrCodes { on: 8, off: 28 };
pub const SGR_STRIKETHROUGH: SgrCodes = SgrCodes { on: 9, off: 29 };

/// Get SGR codes for a style flag.
#[must_use]
pub const fn sgr_codes_for_flag(flag: StyleFlags) -> Option<SgrCodes> {
    match flag.bits() {
        0b0000_0001 => Some(SGR_BOLD),
        0b0000_0010 => Some(SGR_DIM),
        0b0000_0100 => Some(SGR_ITALIC),
        0b0000_1000 => Some(SGR_UNDERLINE),
        0b0001_0000 => Some(SGR_BLINK),
        0b0010_0000 => Some(SGR_REVERSE),
        0b1000_0000 => Some(SGR_HIDDEN),
        0b0100_0000 => Some(SGR_STRIKETHROUGH),
        _ => None,
    }
}

/// The "on" SGR code for a single style flag, for encoders that build one
/// combined parameter list rather than a standalone `CSI ... m` sequence.
#[must_use]
pub const fn attr_on_code(flag: StyleFlags) -> Option<u8> {
    match sgr_codes_for_flag(flag) {
        Some(codes) => Some(codes.on),
        None => None,
    }
}

/// The "off" SGR code for a single style flag.
#[must_use]
pub const fn attr_off_code(flag: StyleFlags) -> Option<u8> {
    match sgr_codes_for_flag(flag) {
        Some(codes) => Some(codes.off),
        None => None,
    }
}

/// Write SGR sequence for style flags (all set flags).
///
/// Emits `CSI n ; n ; ... m` for each enabled flag.
/// Does not emit reset first - caller is responsible for state management.
pub fn sgr_flags<W: Write>(w: &mut W, flags: StyleFlags) -> io::Result<()> {
    if flags.is_empty() {
        return Ok(());
    }

    w.write_all(b"\x1b[")?;
    let mut first = true;

    for (flag, codes) in [
        (StyleFlags::BOLD, SGR_BOLD),
        (StyleFlags::DIM, SGR_DIM),
        (StyleFlags::ITALIC, SGR_ITALIC),
        (StyleFlags::UNDERLINE, SGR_UNDERLINE),
        (StyleFlags::BLINK, SGR_BLINK),
        (StyleFlags::REVERSE, SGR_REVERSE),
        (StyleFlags::HIDDEN, SGR_HIDDEN),
        (StyleFlags::STRIKETHROUGH, SGR_STRIKETHROUGH),
    ] {
        if flags.contains(flag) {
            if !first {
                w.write_all(b";")?;
            }
            write!(w, "{}", codes.on)?;
            first = false;
        }
    }

    w.write_all(b"m")
}

/// Write SGR sequence for true color foreground: `CSI 38;2;r;g;b m`
pub fn sgr_fg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[38;2;{r};{g};{b}m")
}

/// Write SGR sequence for true color background: `CSI 48;2;r;g;b m`
pub fn sgr_bg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[48;2;{r};{g};{b}m")
}

/// Write SGR sequence for 256-color foreground: `CSI 38;5;n m`
pub fn sgr_fg_256<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    write!(w, "\x1b[38;5;{index}m")
}

/// Write SGR sequence for 256-color background: `CSI 48;5;n m`
pub fn sgr_bg_256<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    write!(w, "\x1b[48;5;{index}m")
}

/// Write SGR sequence for 16-color foreground.
///
/// Uses codes 30-37 for normal colors, 90-97 for bright colors.
pub fn sgr_fg_16<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    let code = if index < 8 {
        30 + index
    } else {
        90 + index - 8
    };
    write!(w, "\x1b[{code}m")
}

/// Write SGR sequence for 16-color background.
///
/// Uses codes 40-47 for normal colors, 100-107 for bright colors.
pub fn sgr_bg_16<W: Write>(w: &mut W, index: u8) -> io::Result<()> {
    let code = if index < 8 {
        40 + index
    } else {
        100 + index - 8
    };
    write!(w, "\x1b[{code}m")
}

/// Write SGR default foreground: `CSI 39 m`
pub fn sgr_fg_default<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[39m")
}

/// Write SGR default background: `CSI 49 m`
pub fn sgr_bg_default<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[49m")
}

/// The bare SGR parameter code(s) for a foreground [`CellColor`], without the
/// enclosing `CSI ... m`. Used by [`crate::sgr`] to build one combined
/// sequence from several changed parameters.
#[must_use]
pub fn sgr_fg_param(color: CellColor) -> String {
    match color.decompose() {
        CellColorKind::Default => "39".to_string(),
        CellColorKind::Named16(index) => fg_16_code(index).to_string(),
        CellColorKind::Palette(index) => format!("38;5;{index}"),
        CellColorKind::Rgb(r, g, b) => format!("38;2;{r};{g};{b}"),
    }
}

/// The bare SGR parameter code(s) for a background [`CellColor`].
#[must_use]
pub fn sgr_bg_param(color: CellColor) -> String {
    match color.decompose() {
        CellColorKind::Default => "49".to_string(),
        CellColorKind::Named16(index) => bg_16_code(index).to_string(),
        CellColorKind::Palette(index) => format!("48;5;{index}"),
        CellColorKind::Rgb(r, g, b) => format!("48;2;{r};{g};{b}"),
    }
}

fn fg_16_code(index: u8) -> u16 {
    if index < 8 { 30 + index as u16 } else { 90 + (index as u16 - 8) }
}

fn bg_16_code(index: u8) -> u16 {
    if index < 8 { 40 + index as u16 } else { 100 + (index as u16 - 8) }
}

/// Write SGR foreground for a [`CellColor`], dispatching on its kind.
pub fn sgr_fg_cell_color<W: Write>(w: &mut W, color: CellColor) -> io::Result<()> {
    match color.decompose() {
        CellColorKind::Default => sgr_fg_default(w),
        CellColorKind::Named16(index) => sgr_fg_16(w, index),
        CellColorKind::Palette(index) => sgr_fg_256(w, index),
        CellColorKind::Rgb(r, g, b) => sgr_fg_rgb(w, r, g, b),
    }
}

/// Write SGR background for a [`CellColor`], dispatching on its kind.
pub fn sgr_bg_cell_color<W: Write>(w: &mut W, color: CellColor) -> io::Result<()> {
    match color.decompose() {
        CellColorKind::Default => sgr_bg_default(w),
        CellColorKind::Named16(index) => sgr_bg_16(w, index),
        CellColorKind::Palette(index) => sgr_bg_256(w, index),
        CellColorKind::Rgb(r, g, b) => sgr_bg_rgb(w, r, g, b),
    }
}

// =============================================================================
// Cursor Positioning
// =============================================================================

/// CUP (Cursor Position): `CSI row ; col H` (1-indexed)
///
/// Moves cursor to absolute position. Row and col are 0-indexed input,
/// converted to 1-indexed for ANSI.
pub fn cup<W: Write>(w: &mut W, row: u16, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}H", row + 1, col + 1)
}

/// CUP to column only: `CSI col G` (1-indexed)
///
/// Moves cursor to column on current row.
pub fn cha<W: Write>(w: &mut W, col: u16) -> io::Result<()> {
    write!(w, "\x1b[{}G", col + 1)
}

/// Move cursor up: `CSI n A`
pub fn cuu<W: Write>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    if n == 1 {
        w.write_all(b"\x1b[A")
    } else {
        write!(w, "\x1b[{n}A")
    }
}

/// Move cursor down: `CSI n B`
pub fn cud<W: Write>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    if n == 1 {
        w.write_all(b"\x1b[B")
    } else {
        write!(w, "\x1b[{n}B")
    }
}

/// Move cursor forward (right): `CSI n C`
pub fn cuf<W: Write>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    if n == 1 {
        w.write_all(b"\x1b[C")
    } else {
        write!(w, "\x1b[{n}C")
    }
}

/// Move cursor back (left): `CSI n D`
pub fn cub<W: Write>(w: &mut W, n: u16) -> io::Result<()> {
    if n == 0 {
        return Ok(());
    }
    if n == 1 {
        w.write_all(b"\x1b[D")
    } else {
        write!(w, "\x1b[{n}D")
    }
}

/// DEC cursor save: `ESC 7` (DECSC)
pub const CURSOR_SAVE: &[u8] = b"\x1b7";

/// DEC cursor restore: `ESC 8` (DECRC)
pub const CURSOR_RESTORE: &[u8] = b"\x1b8";

/// Write cursor save (DECSC).
#[inline]
pub fn cursor_save<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_SAVE)
}

/// Write cursor restore (DECRC).
#[inline]
pub fn cursor_restore<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_RESTORE)
}

/// Hide cursor: `CSI ? 25 l`
pub const CURSOR_HIDE: &[u8] = b"\x1b[?25l";

/// Show cursor: `CSI ? 25 h`
pub const CURSOR_SHOW: &[u8] = b"\x1b[?25h";

/// Write hide cursor.
#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_HIDE)
}

/// Write show cursor.
#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(CURSOR_SHOW)
}

// =============================================================================
// Erase Operations
// =============================================================================

/// EL (Erase Line) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseLineMode {
    /// Erase from cursor to end of line.
    ToEnd = 0,
    /// Erase from start of line to cursor.
    ToStart = 1,
    /// Erase entire line.
    All = 2,
}

/// EL (Erase Line): `CSI n K`
pub fn erase_line<W: Write>(w: &mut W, mode: EraseLineMode) -> io::Result<()> {
    match mode {
        EraseLineMode::ToEnd => w.write_all(b"\x1b[K"),
        EraseLineMode::ToStart => w.write_all(b"\x1b[1K"),
        EraseLineMode::All => w.write_all(b"\x1b[2K"),
    }
}

/// ED (Erase Display) mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraseDisplayMode {
    /// Erase from cursor to end of screen.
    ToEnd = 0,
    /// Erase from start of screen to cursor.
    ToStart = 1,
    /// Erase entire screen.
    All = 2,
    /// Erase scrollback buffer (xterm extension).
    Scrollback = 3,
}

/// ED (Erase Display): `CSI n J`
pub fn erase_display<W: Write>(w: &mut W, mode: EraseDisplayMode) -> io::Result<()> {
    match mode {
        EraseDisplayMode::ToEnd => w.write_all(b"\x1b[J"),
        EraseDisplayMode::ToStart => w.write_all(b"\x1b[1J"),
        EraseDisplayMode::All => w.write_all(b"\x1b[2J"),
        EraseDisplayMode::Scrollback => w.write_all(b"\x1b[3J"),
    }
}

// =============================================================================
// Scroll Region
// =============================================================================

/// DECSTBM (Set Top and Bottom Margins): `CSI top ; bottom r`
///
/// Sets the scroll region. Top and bottom are 0-indexed, converted to 1-indexed.
pub fn set_scroll_region<W: Write>(w: &mut W, top: u16, bottom: u16) -> io::Result<()> {
    write!(w, "\x1b[{};{}r", top + 1, bottom + 1)
}

/// Reset scroll region to full screen: `CSI r`
pub const RESET_SCROLL_REGION: &[u8] = b"\x1b[r";

/// Write reset scroll region.
#[inline]
pub fn reset_scroll_region<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(RESET_SCROLL_REGION)
}

// =============================================================================
// Synchronized Output (DEC 2026)
// =============================================================================

/// Begin synchronized output: `CSI ? 2026 h`
pub const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";

/// End synchronized output: `CSI ? 2026 l`
pub const SYNC_END: &[u8] = b"\x1b[?2026l";

/// Write synchronized output begin.
#[inline]
pub fn sync_begin<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_BEGIN)
}

/// Write synchronized output end.
#[inline]
pub fn sync_end<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_END)
}

// =============================================================================
// OSC 52 Clipboard
// =============================================================================

/// Target clipboard selection for an OSC 52 request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardSelection {
    /// System clipboard (`c`).
    Clipboard,
    /// Primary selection (`p`).
    Primary,
}

impl ClipboardSelection {
    fn code(self) -> &'static str {
        match self {
            ClipboardSelection::Clipboard => "c",
            ClipboardSelection::Primary => "p",
        }
    }
}

/// Write an OSC 52 clipboard-set request: `OSC 52 ; c|p ; base64 ST`.
///
/// `payload` must already be base64-encoded; this function only frames it.
pub fn osc52_set_clipboard<W: Write>(
    w: &mut W,
    selection: ClipboardSelection,
    base64_payload: &str,
) -> io::Result<()> {
    write!(w, "\x1b]52;{};{}\x1b\\", selection.code(), base64_payload)
}

/// Write an OSC 52 clipboard-query request: `OSC 52 ; c|p ; ? ST`.
pub fn osc52_query_clipboard<W: Write>(w: &mut W, selection: ClipboardSelection) -> io::Result<()> {
    write!(w, "\x1b]52;{};?\x1b\\", selection.code())
}

// =============================================================================
// Mode Control
// =============================================================================

/// Enable alternate screen: `CSI ? 1049 h`
pub const ALT_SCREEN_ENTER: &[u8] = b"\x1b[?1049h";

/// Disable alternate screen: `CSI ? 1049 l`
pub const ALT_SCREEN_LEAVE: &[u8] = b"\x1b[?1049l";

/// Enable bracketed paste: `CSI ? 2004 h`
pub const BRACKETED_PASTE_ENABLE: &[u8] = b"\x1b[?2004h";

/// Disable bracketed paste: `CSI ? 2004 l`
pub const BRACKETED_PASTE_DISABLE: &[u8] = b"\x1b[?2004l";

/// Enable SGR mouse reporting: `CSI ? 1000;1002;1006 h`
///
/// Enables:
/// - 1000: Normal mouse tracking
/// - 1002: Button event tracking (motion while pressed)
/// - 1006: SGR extended coordinates (supports > 223)
pub const MOUSE_ENABLE: &[u8] = b"\x1b[?1000;1002;1006h";

/// Disable mouse reporting: `CSI ? 1000;1002;1006 l`
pub const MOUSE_DISABLE: &[u8] = b"\x1b[?1000;1002;1006l";

/// Enable focus reporting: `CSI ? 1004 h`
pub const FOCUS_ENABLE: &[u8] = b"\x1b[?1004h";

/// Disable focus reporting: `CSI ? 1004 l`
pub const FOCUS_DISABLE: &[u8] = b"\x1b[?1004l";

/// Write alternate screen enter.
#[inline]
pub fn alt_screen_enter<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ALT_SCREEN_ENTER)
}

/// Write alternate screen leave.
#[inline]
pub fn alt_screen_leave<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(ALT_SCREEN_LEAVE)
}

/// Write bracketed paste enable.
#[inline]
pub fn bracketed_paste_enable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(BRACKETED_PASTE_ENABLE)
}

/// Write bracketed paste disable.
#[inline]
pub fn bracketed_paste_disable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(BRACKETED_PASTE_DISABLE)
}

/// Write mouse enable.
#[inline]
pub fn mouse_enable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(MOUSE_ENABLE)
}

/// Write mouse disable.
#[inline]
pub fn mouse_disable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(MOUSE_DISABLE)
}

/// Write focus enable.
#[inline]
pub fn focus_enable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(FOCUS_ENABLE)
}

/// Write focus disable.
#[inline]
pub fn focus_disable<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(FOCUS_DISABLE)
}

// =============================================================================
// Tests
// =============================================================================
