// SPDX-License-Identifier: MIT
//
// Text attributes and the style of a single span of text.
//
// A table line is a sequence of spans: the text of each cell, the
// separator between cells, and the padding around the text. Only cell text
// is ever styled; padding and separators are written plain so that
// underlines and reverse video hug the value instead of the column.

use crate::color::CellColor;

// ─── Text Attributes ─────────────────────────────────────────────────────────

bitflags::bitflags! {
    /// Text attributes stored as a compact bitfield.
    ///
    /// These map directly to SGR (Select Graphic Rendition) parameters.
    /// Combine with bitwise OR:
    ///
    /// ```
    /// use termtab_term::attr::Attr;
    ///
    /// let style = Attr::BOLD | Attr::UNDERLINE;
    /// assert!(style.contains(Attr::BOLD));
    /// assert!(!style.contains(Attr::DIM));
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct Attr: u8 {
        /// SGR 1 — increased intensity.
        const BOLD          = 1 << 0;
        /// SGR 2 — decreased intensity (faint).
        const DIM           = 1 << 1;
        /// SGR 3 — italic or oblique.
        const ITALIC        = 1 << 2;
        /// SGR 4 — single underline.
        const UNDERLINE     = 1 << 3;
        /// SGR 5 — slow blink.
        const BLINK         = 1 << 4;
        /// SGR 7 — swap foreground and background.
        const INVERSE       = 1 << 5;
        /// SGR 9 — crossed-out text.
        const STRIKETHROUGH = 1 << 6;
    }
}

// ─── SpanStyle ───────────────────────────────────────────────────────────────

/// Fully resolved style for a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct SpanStyle {
    pub fg: CellColor,
    pub bg: CellColor,
    pub attrs: Attr,
}

impl SpanStyle {
    /// No colors, no attributes.
    pub const PLAIN: Self = Self {
        fg: CellColor::Default,
        bg: CellColor::Default,
        attrs: Attr::empty(),
    };

    #[inline]
    #[must_use]
    pub const fn with_fg(mut self, fg: CellColor) -> Self {
        self.fg = fg;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_bg(mut self, bg: CellColor) -> Self {
        self.bg = bg;
        self
    }

    #[inline]
    #[must_use]
    pub const fn with_attrs(mut self, attrs: Attr) -> Self {
        self.attrs = attrs;
        self
    }

    /// Whether rendering with this style would emit no escape codes.
    #[inline]
    #[must_use]
    pub const fn is_plain(&self) -> bool {
        self.fg.is_default() && self.bg.is_default() && self.attrs.is_empty()
    }
}
