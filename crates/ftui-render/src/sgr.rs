#![forbid(unsafe_code)]

//! Style/SGR delta encoder: emits only the graphic parameters that changed
//! since the last emitted style.

use crate::ansi::{sgr_bg_param, sgr_fg_param};
use crate::ansi::{attr_off_code, attr_on_code};
use crate::cell::{CellStyle, StyleFlags};

/// Stateful SGR delta encoder. Tracks the last style it emitted so
/// consecutive identical [`CellStyle`]s cost zero bytes.
#[derive(Debug, Default)]
pub struct SgrEncoder {
    last_style: Option<CellStyle>,
}

impl SgrEncoder {
    /// A fresh encoder with no active style.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Encode the transition into `style`, returning the SGR sequence to
    /// emit (empty if nothing changed).
    pub fn encode(&mut self, style: CellStyle) -> String {
        if self.last_style == Some(style) {
            return String::new();
        }

        let mut params: Vec<String> = Vec::new();
        let last = self.last_style.unwrap_or_default();

        if style.fg != last.fg {
            params.push(sgr_fg_param(style.fg));
        }
        if style.bg != last.bg {
            params.push(sgr_bg_param(style.bg));
        }

        let turned_on = style.flags & !last.flags;
        let turned_off = last.flags & !style.flags;
        for flag in FLAG_ORDER {
            if turned_on.contains(flag) {
                if let Some(code) = attr_on_code(flag) {
                    params.push(code.to_string());
                }
            }
        }
        for flag in FLAG_ORDER {
            if turned_off.contains(flag) {
                if let Some(code) = attr_off_code(flag) {
                    params.push(code.to_string());
                }
            }
        }

        self.last_style = Some(style);

        if params.is_empty() {
            return String::new();
        }
        format!("\x1b[{}m", params.join(";"))
    }

    /// Reset all graphic attributes (`ESC[0m`) and forget the active style,
    /// so the next [`SgrEncoder::encode`] call emits a full prefix.
    pub fn reset(&mut self) -> &'static str {
        self.last_style = None;
        "\x1b[0m"
    }
}

const FLAG_ORDER: [StyleFlags; 8] = [
    StyleFlags::BOLD,
    StyleFlags::DIM,
    StyleFlags::ITALIC,
    StyleFlags::UNDERLINE,
    StyleFlags::BLINK,
    StyleFlags::REVERSE,
    StyleFlags::STRIKETHROUGH,
    StyleFlags::HIDDEN,
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellColor;

    fn style(fg: CellColor, flags: StyleFlags) -> CellStyle {
        CellStyle {
            fg,
            bg: CellColor::DEFAULT,
            flags,
        }
    }

    #[test]
    fn first_emission_sets_fg_and_bold() {
        // Scenario C.
        let mut enc = SgrEncoder::new();
        let seq = enc.encode(style(CellColor::named16(1), StyleFlags::BOLD));
        assert_eq!(seq, "\x1b[31;1m");
    }

    #[test]
    fn repeated_identical_style_emits_nothing() {
        let mut enc = SgrEncoder::new();
        let s = style(CellColor::named16(1), StyleFlags::BOLD);
        enc.encode(s);
        assert_eq!(enc.encode(s), "");
    }

    #[test]
    fn only_changed_attribute_is_emitted() {
        let mut enc = SgrEncoder::new();
        enc.encode(style(CellColor::named16(2), StyleFlags::BOLD));
        let seq = enc.encode(style(CellColor::named16(2), StyleFlags::BOLD | StyleFlags::ITALIC));
        assert_eq!(seq, "\x1b[3m");
    }

    #[test]
    fn turning_off_attribute_emits_off_code() {
        let mut enc = SgrEncoder::new();
        enc.encode(style(CellColor::DEFAULT, StyleFlags::BOLD));
        let seq = enc.encode(style(CellColor::DEFAULT, StyleFlags::empty()));
        assert_eq!(seq, "\x1b[22m");
    }

    #[test]
    fn reset_forgets_last_style() {
        let mut enc = SgrEncoder::new();
        enc.encode(style(CellColor::named16(1), StyleFlags::BOLD));
        assert_eq!(enc.reset(), "\x1b[0m");
        let seq = enc.encode(style(CellColor::named16(1), StyleFlags::BOLD));
        assert_ne!(seq, "");
    }
}
