// SPDX-License-Identifier: MIT
//
// Terminal colors.
//
// A table cell only ever needs a resolved terminal color: one of the 16
// named ANSI colors, a 256-palette index, or 24-bit RGB. Style files name
// colors as text, so the interesting part of this module is parsing:
//
//   "red", "bright_blue"    → ANSI palette 0–15
//   "#ff8800", "#f80"       → RGB
//   "208"                   → 256-color palette index
//   "default"               → terminal default
//
// Names are case-insensitive and accept `-` or `_` as word separator.

use std::fmt;
use std::str::FromStr;

// ─── CellColor ───────────────────────────────────────────────────────────────

/// A color the terminal can display directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellColor {
    /// 24-bit `TrueColor`.
    Rgb(u8, u8, u8),

    /// ANSI 256-color palette index. 0–7 are the standard colors and 8–15
    /// their bright variants.
    Ansi256(u8),

    /// Terminal default color.
    #[default]
    Default,
}

/// The eight standard ANSI color names, in palette order.
const NAMES: [&str; 8] = [
    "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
];

impl CellColor {
    pub const BLACK: Self = Self::Ansi256(0);
    pub const RED: Self = Self::Ansi256(1);
    pub const GREEN: Self = Self::Ansi256(2);
    pub const YELLOW: Self = Self::Ansi256(3);
    pub const BLUE: Self = Self::Ansi256(4);
    pub const MAGENTA: Self = Self::Ansi256(5);
    pub const CYAN: Self = Self::Ansi256(6);
    pub const WHITE: Self = Self::Ansi256(7);

    /// Whether this is the terminal default color.
    #[inline]
    #[must_use]
    pub const fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }

    /// Look up a color by name (`"green"`, `"bright_red"`, `"default"`).
    #[must_use]
    pub fn named(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase().replace('-', "_");
        if name == "default" {
            return Some(Self::Default);
        }
        let (base, offset) = match name.strip_prefix("bright_") {
            Some(rest) => (rest, 8),
            None => (name.as_str(), 0),
        };
        let base = if base == "grey" || base == "gray" { "white" } else { base };
        NAMES
            .iter()
            .position(|n| *n == base)
            .and_then(|idx| u8::try_from(idx + offset).ok())
            .map(Self::Ansi256)
    }
}

impl fmt::Debug for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb(r, g, b) => write!(f, "#{r:02x}{g:02x}{b:02x}"),
            Self::Ansi256(idx) => write!(f, "ansi({idx})"),
            Self::Default => write!(f, "default"),
        }
    }
}

impl fmt::Display for CellColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

// ─── Parsing ─────────────────────────────────────────────────────────────────

/// A color string that names no known color.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown color `{0}`")]
pub struct ColorError(pub String);

impl FromStr for CellColor {
    type Err = ColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with('#') {
            return parse_hex(trimmed).ok_or_else(|| ColorError(s.to_owned()));
        }
        if let Ok(idx) = trimmed.parse::<u8>() {
            return Ok(Self::Ansi256(idx));
        }
        Self::named(trimmed).ok_or_else(|| ColorError(s.to_owned()))
    }
}

/// Parse `#rgb` or `#rrggbb`.
fn parse_hex(s: &str) -> Option<CellColor> {
    let s = s.strip_prefix('#').unwrap_or(s).as_bytes();

    match s.len() {
        3 => {
            let r = parse_hex_digit(s[0])?;
            let g = parse_hex_digit(s[1])?;
            let b = parse_hex_digit(s[2])?;
            Some(CellColor::Rgb(r << 4 | r, g << 4 | g, b << 4 | b))
        }
        6 => {
            let r = parse_hex_byte(&s[0..2])?;
            let g = parse_hex_byte(&s[2..4])?;
            let b = parse_hex_byte(&s[4..6])?;
            Some(CellColor::Rgb(r, g, b))
        }
        _ => None,
    }
}

#[inline]
const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
