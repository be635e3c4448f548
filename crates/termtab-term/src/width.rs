// SPDX-License-Identifier: MIT
//
// Display width: measuring, truncating, and padding text by terminal
// columns rather than bytes or chars.
//
// Widths come from `unicode-width` (East Asian Wide characters count two
// columns, combining marks zero). Truncation walks grapheme clusters so a
// cut never splits an emoji sequence or strips a combining accent from its
// base letter.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

/// Horizontal alignment of text inside a fixed-width field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Align {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" | "<" => Ok(Self::Left),
            "center" | "centre" | "^" => Ok(Self::Center),
            "right" | ">" => Ok(Self::Right),
            other => Err(format!("unknown alignment `{other}`")),
        }
    }
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        })
    }
}

/// Number of terminal columns `s` occupies.
#[inline]
#[must_use]
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Take whole grapheme clusters from the front of `s` while they fit in
/// `budget` columns.
fn take_columns(s: &str, budget: usize) -> &str {
    let mut used = 0;
    let mut end = 0;
    for (idx, g) in s.grapheme_indices(true) {
        let w = display_width(g);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + g.len();
    }
    &s[..end]
}

/// Cut `s` to at most `width` columns.
///
/// When `s` is too wide and `marker` is given, the marker replaces the tail
/// so the result still fits in `width`. A marker that is itself wider than
/// `width` is cut instead. Without a marker the text is simply cut.
///
/// ```
/// use termtab_term::width::truncate;
///
/// assert_eq!(truncate("abcdefghij", 8, Some("...")), "abcde...");
/// assert_eq!(truncate("abcdefghij", 4, None), "abcd");
/// assert_eq!(truncate("abc", 8, Some("...")), "abc");
/// ```
#[must_use]
pub fn truncate<'a>(s: &'a str, width: usize, marker: Option<&str>) -> Cow<'a, str> {
    if display_width(s) <= width {
        return Cow::Borrowed(s);
    }
    match marker {
        Some(m) if !m.is_empty() => {
            let mw = display_width(m);
            if mw >= width {
                Cow::Owned(take_columns(m, width).to_owned())
            } else {
                let mut out = take_columns(s, width - mw).to_owned();
                out.push_str(m);
                Cow::Owned(out)
            }
        }
        _ => Cow::Borrowed(take_columns(s, width)),
    }
}

/// Split the padding needed to bring `s` up to `width` columns into
/// `(left, right)` space counts.
#[must_use]
pub fn padding(s: &str, width: usize, align: Align) -> (usize, usize) {
    let diff = width.saturating_sub(display_width(s));
    match align {
        Align::Left => (0, diff),
        Align::Right => (diff, 0),
        Align::Center => {
            let left = diff / 2;
            (left, diff - left)
        }
    }
}

/// Pad `s` with spaces to `width` columns. Text already at least `width`
/// wide is returned unchanged.
#[must_use]
pub fn pad(s: &str, width: usize, align: Align) -> String {
    let (left, right) = padding(s, width, align);
    let mut out = String::with_capacity(s.len() + left + right);
    out.extend(std::iter::repeat_n(' ', left));
    out.push_str(s);
    out.extend(std::iter::repeat_n(' ', right));
    out
}

// ─── Tests ───────────────────────────────────────────────────────────────────
