//! Color types, profiles, and downgrade utilities.

use std::collections::HashMap;

use ftui_render::cell::{CellColor, CellColorKind};

/// Terminal color profile used for downgrade decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorProfile {
    /// No color output.
    Mono,
    /// Standard 16 ANSI colors.
    Ansi16,
    /// Extended 256-color palette.
    Ansi256,
    /// Full 24-bit RGB color.
    TrueColor,
}

impl ColorProfile {
    /// Choose the best available profile from detection flags.
    ///
    /// `no_color` should reflect explicit user intent (e.g. NO_COLOR).
    #[must_use]
    pub const fn from_flags(true_color: bool, colors_256: bool, no_color: bool) -> Self {
        if no_color {
            Self::Mono
        } else if true_color {
            Self::TrueColor
        } else if colors_256 {
            Self::Ansi256
        } else {
            Self::Ansi16
        }
    }

    /// Check if this profile supports 24-bit true color.
    #[must_use]
    pub const fn supports_true_color(self) -> bool {
        matches!(self, Self::TrueColor)
    }
}

/// RGB color (opaque).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    /// Red channel (0–255).
    pub r: u8,
    /// Green channel (0–255).
    pub g: u8,
    /// Blue channel (0–255).
    pub b: u8,
}

impl Rgb {
    /// Create a new RGB color.
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack into a `u32` key for use in hash maps.
    #[must_use]
    pub const fn as_key(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | (self.b as u32)
    }

    /// Compute perceived luminance (BT.709) as a `u8` (0 = black, 255 = white).
    #[must_use]
    pub fn luminance_u8(self) -> u8 {
        // ITU-R BT.709 luma: 0.2126 R + 0.7152 G + 0.0722 B
        let r = self.r as u32;
        let g = self.g as u32;
        let b = self.b as u32;
        let luma = 2126 * r + 7152 * g + 722 * b;
        ((luma + 5000) / 10_000) as u8
    }
}

impl From<CellColorKind> for Rgb {
    /// Resolve any cell-color kind to an RGB triplet for distance math.
    /// `Default` has no canonical color; callers needing a fallback should
    /// branch on `CellColorKind::Default` before reaching here.
    fn from(kind: CellColorKind) -> Self {
        match kind {
            CellColorKind::Default => Self::new(0, 0, 0),
            CellColorKind::Named16(idx) => {
                ansi16_to_rgb(Ansi16::from_u8(idx).unwrap_or(Ansi16::Black))
            }
            CellColorKind::Palette(idx) => ansi256_to_rgb(idx),
            CellColorKind::Rgb(r, g, b) => Self::new(r, g, b),
        }
    }
}

/// ANSI 16-color indices (0-15).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Ansi16 {
    /// Black (index 0).
    Black = 0,
    /// Red (index 1).
    Red = 1,
    /// Green (index 2).
    Green = 2,
    /// Yellow (index 3).
    Yellow = 3,
    /// Blue (index 4).
    Blue = 4,
    /// Magenta (index 5).
    Magenta = 5,
    /// Cyan (index 6).
    Cyan = 6,
    /// White (index 7).
    White = 7,
    /// Bright black (index 8).
    BrightBlack = 8,
    /// Bright red (index 9).
    BrightRed = 9,
    /// Bright green (index 10).
    BrightGreen = 10,
    /// Bright yellow (index 11).
    BrightYellow = 11,
    /// Bright blue (index 12).
    BrightBlue = 12,
    /// Bright magenta (index 13).
    BrightMagenta = 13,
    /// Bright cyan (index 14).
    BrightCyan = 14,
    /// Bright white (index 15).
    BrightWhite = 15,
}

impl Ansi16 {
    /// Return the raw ANSI index (0–15).
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Convert a `u8` index to an `Ansi16` variant, returning `None` if out of range.
    #[must_use]
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Black),
            1 => Some(Self::Red),
            2 => Some(Self::Green),
            3 => Some(Self::Yellow),
            4 => Some(Self::Blue),
            5 => Some(Self::Magenta),
            6 => Some(Self::Cyan),
            7 => Some(Self::White),
            8 => Some(Self::BrightBlack),
            9 => Some(Self::BrightRed),
            10 => Some(Self::BrightGreen),
            11 => Some(Self::BrightYellow),
            12 => Some(Self::BrightBlue),
            13 => Some(Self::BrightMagenta),
            14 => Some(Self::BrightCyan),
            15 => Some(Self::BrightWhite),
            _ => None,
        }
    }
}

/// Monochrome output selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MonoColor {
    /// Black (dark).
    Black,
    /// White (light).
    White,
}

/// A color value at varying fidelity levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    /// True-color RGB value.
    Rgb(Rgb),
    /// 256-color palette index.
    Ansi256(u8),
    /// Standard 16-color ANSI value.
    Ansi16(Ansi16),
    /// Monochrome (black or white).
    Mono(MonoColor),
}

impl Color {
    /// Create a true-color RGB value.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::Rgb(Rgb::new(r, g, b))
    }

    /// Convert this color to an RGB triplet regardless of its fidelity level.
    #[must_use]
    pub fn to_rgb(self) -> Rgb {
        match self {
            Self::Rgb(rgb) => rgb,
            Self::Ansi256(idx) => ansi256_to_rgb(idx),
            Self::Ansi16(color) => ansi16_to_rgb(color),
            Self::Mono(MonoColor::Black) => Rgb::new(0, 0, 0),
            Self::Mono(MonoColor::White) => Rgb::new(255, 255, 255),
        }
    }

    /// Downgrade this color to fit the given color profile.
    #[must_use]
    pub fn downgrade(self, profile: ColorProfile) -> Self {
        match profile {
            ColorProfile::TrueColor => self,
            ColorProfile::Ansi256 => match self {
                Self::Rgb(rgb) => Self::Ansi256(rgb_to_256(rgb.r, rgb.g, rgb.b)),
                _ => self,
            },
            ColorProfile::Ansi16 => match self {
                Self::Rgb(rgb) => Self::Ansi16(rgb_to_ansi16(rgb.r, rgb.g, rgb.b)),
                Self::Ansi256(idx) => Self::Ansi16(rgb_to_ansi16_from_ansi256(idx)),
                _ => self,
            },
            ColorProfile::Mono => match self {
                Self::Rgb(rgb) => Self::Mono(rgb_to_mono(rgb.r, rgb.g, rgb.b)),
                Self::Ansi256(idx) => {
                    let rgb = ansi256_to_rgb(idx);
                    Self::Mono(rgb_to_mono(rgb.r, rgb.g, rgb.b))
                }
                Self::Ansi16(color) => {
                    let rgb = ansi16_to_rgb(color);
                    Self::Mono(rgb_to_mono(rgb.r, rgb.g, rgb.b))
                }
                Self::Mono(_) => self,
            },
        }
    }
}

impl From<CellColor> for Color {
    fn from(color: CellColor) -> Self {
        match color.decompose() {
            CellColorKind::Default => Self::Mono(MonoColor::White),
            kind => Self::Rgb(Rgb::from(kind)),
        }
    }
}

impl From<Color> for CellColor {
    /// Encode a `Color` as a [`CellColor`] without downgrading; callers that
    /// need profile-aware downgrade should call [`Color::downgrade`] first.
    fn from(color: Color) -> Self {
        match color {
            Color::Rgb(rgb) => CellColor::rgb(rgb.r, rgb.g, rgb.b),
            Color::Ansi256(idx) => CellColor::palette(idx),
            Color::Ansi16(ansi) => CellColor::named16(ansi.as_u8()),
            Color::Mono(MonoColor::Black) => CellColor::rgb(0, 0, 0),
            Color::Mono(MonoColor::White) => CellColor::rgb(255, 255, 255),
        }
    }
}

/// Statistics for a [`ColorCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries before eviction.
    pub capacity: usize,
}

/// Simple hash cache for downgrade results (bounded; clears on overflow).
#[derive(Debug)]
pub struct ColorCache {
    profile: ColorProfile,
    max_entries: usize,
    map: HashMap<u32, Color>,
    hits: u64,
    misses: u64,
}

impl ColorCache {
    /// Create a new cache with default capacity (4096 entries).
    #[must_use]
    pub fn new(profile: ColorProfile) -> Self {
        Self::with_capacity(profile, 4096)
    }

    /// Create a new cache with the given maximum entry count.
    #[must_use]
    pub fn with_capacity(profile: ColorProfile, max_entries: usize) -> Self {
        let max_entries = max_entries.max(1);
        Self {
            profile,
            max_entries,
            map: HashMap::with_capacity(max_entries.min(2048)),
            hits: 0,
            misses: 0,
        }
    }

    /// Downgrade an RGB color through the cache, returning the cached result.
    #[must_use]
    pub fn downgrade_rgb(&mut self, rgb: Rgb) -> Color {
        let key = rgb.as_key();
        if let Some(cached) = self.map.get(&key) {
            self.hits += 1;
            return *cached;
        }
        self.misses += 1;
        let downgraded = Color::Rgb(rgb).downgrade(self.profile);
        if self.map.len() >= self.max_entries {
            self.map.clear();
        }
        self.map.insert(key, downgraded);
        downgraded
    }

    /// Downgrade a [`CellColor`] through the cache.
    #[must_use]
    pub fn downgrade_cell_color(&mut self, color: CellColor) -> Color {
        match color.decompose() {
            CellColorKind::Default => Color::Mono(MonoColor::White),
            kind => self.downgrade_rgb(Rgb::from(kind)),
        }
    }

    /// Return current cache statistics.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            size: self.map.len(),
            capacity: self.max_entries,
        }
    }
}

const ANSI16_PALETTE: [Rgb; 16] = [
    Rgb::new(0, 0, 0),       // Black
    Rgb::new(205, 0, 0),     // Red
    Rgb::new(0, 205, 0),     // Green
    Rgb::new(205, 205, 0),   // Yellow
    Rgb::new(0, 0, 238),     // Blue
    Rgb::new(205, 0, 205),   // Magenta
    Rgb::new(0, 205, 205),   // Cyan
    Rgb::new(229, 229, 229), // White
    Rgb::new(127, 127, 127), // Bright Black
    Rgb::new(255, 0, 0),     // Bright Red
    Rgb::new(0, 255, 0),     // Bright Green
    Rgb::new(255, 255, 0),   // Bright Yellow
    Rgb::new(92, 92, 255),   // Bright Blue
    Rgb::new(255, 0, 255),   // Bright Magenta
    Rgb::new(0, 255, 255),   // Bright Cyan
    Rgb::new(255, 255, 255), // Bright White
];

/// Convert an ANSI 16-color value to its canonical RGB representation.
#[must_use]
pub fn ansi16_to_rgb(color: Ansi16) -> Rgb {
    ANSI16_PALETTE[color.as_u8() as usize]
}

/// Convert an RGB color to the nearest ANSI 256-color index.
#[must_use]
pub fn rgb_to_256(r: u8, g: u8, b: u8) -> u8 {
    if r == g && g == b {
        if r < 8 {
            return 16;
        }
        if r > 248 {
            return 231;
        }
        let idx = ((r - 8) / 10).min(23);
        return 232 + idx;
    }

    16 + 36 * cube_index(r) + 6 * cube_index(g) + cube_index(b)
}

/// Map an 8-bit channel value to the nearest ANSI 256-color 6×6×6 cube index.
///
/// The cube levels are `[0, 95, 135, 175, 215, 255]`, which are **not**
/// uniformly spaced.  This function uses the midpoints between adjacent
/// levels (48, 115, 155, 195, 235) so each channel maps to the closest
/// cube entry rather than an equal-width bin.
fn cube_index(v: u8) -> u8 {
    if v < 48 {
        0
    } else if v < 115 {
        1
    } else {
        (v - 35) / 40
    }
}

/// Convert an ANSI 256-color index to its RGB representation.
#[must_use]
pub fn ansi256_to_rgb(index: u8) -> Rgb {
    if index < 16 {
        return ANSI16_PALETTE[index as usize];
    }
    if index >= 232 {
        let gray = 8 + 10 * (index - 232);
        return Rgb::new(gray, gray, gray);
    }
    let idx = index - 16;
    let r = idx / 36;
    let g = (idx / 6) % 6;
    let b = idx % 6;
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];
    Rgb::new(LEVELS[r as usize], LEVELS[g as usize], LEVELS[b as usize])
}

/// Convert an RGB color to the nearest ANSI 16-color value.
#[must_use]
pub fn rgb_to_ansi16(r: u8, g: u8, b: u8) -> Ansi16 {
    let target = Rgb::new(r, g, b);
    let mut best = Ansi16::Black;
    let mut best_dist = u64::MAX;

    for (idx, candidate) in ANSI16_PALETTE.iter().enumerate() {
        let dist = weighted_distance(target, *candidate);
        if dist < best_dist {
            best = Ansi16::from_u8(idx as u8).unwrap_or(Ansi16::Black);
            best_dist = dist;
        }
    }

    best
}

/// Convert an ANSI 256-color index to the nearest ANSI 16-color value.
#[must_use]
pub fn rgb_to_ansi16_from_ansi256(index: u8) -> Ansi16 {
    let rgb = ansi256_to_rgb(index);
    rgb_to_ansi16(rgb.r, rgb.g, rgb.b)
}

/// Convert an RGB color to monochrome (black or white) based on luminance.
#[must_use]
pub fn rgb_to_mono(r: u8, g: u8, b: u8) -> MonoColor {
    let luma = Rgb::new(r, g, b).luminance_u8();
    if luma >= 128 {
        MonoColor::White
    } else {
        MonoColor::Black
    }
}

fn weighted_distance(a: Rgb, b: Rgb) -> u64 {
    let dr = a.r as i32 - b.r as i32;
    let dg = a.g as i32 - b.g as i32;
    let db = a.b as i32 - b.b as i32;
    let dr2 = (dr * dr) as u64;
    let dg2 = (dg * dg) as u64;
    let db2 = (db * db) as u64;
    2126 * dr2 + 7152 * dg2 + 722 * db2
}
