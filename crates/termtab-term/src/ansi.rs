// SPDX-License-Identifier: MIT
//
// ANSI escape sequence generation.
//
// Pure functions that write escape sequences to any `impl Write`. No state,
// no decisions about when to emit. The table writer decides that; this
// module only knows the byte-level encoding.
//
// Line redraws only need relative cursor motion: the writer never knows
// where on the screen its first line landed, only how many lines it has
// written since. So there is no absolute positioning here, just up, down,
// and the two erase commands.

use std::io::{self, Write};

use crate::attr::{Attr, SpanStyle};
use crate::color::CellColor;

// ─── Cursor ──────────────────────────────────────────────────────────────────

/// Move the cursor up `n` lines (CUU). Writes nothing for `n == 0`.
#[inline]
pub fn cursor_up(w: &mut impl Write, n: usize) -> io::Result<()> {
    match n {
        0 => Ok(()),
        1 => w.write_all(b"\x1b[A"),
        n => write!(w, "\x1b[{n}A"),
    }
}

/// Move the cursor down `n` lines (CUD). Writes nothing for `n == 0`.
///
/// CUD does not scroll, so it is only used to return over lines that were
/// already written.
#[inline]
pub fn cursor_down(w: &mut impl Write, n: usize) -> io::Result<()> {
    match n {
        0 => Ok(()),
        1 => w.write_all(b"\x1b[B"),
        n => write!(w, "\x1b[{n}B"),
    }
}

// ─── Erase ───────────────────────────────────────────────────────────────────

/// Return to column 0 and erase the whole line (CR + EL 2).
#[inline]
pub fn clear_line(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\r\x1b[2K")
}

/// Erase from the cursor to the end of the screen (ED 0).
#[inline]
pub fn clear_to_end(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[J")
}

/// Reset all SGR attributes to terminal defaults (SGR 0).
#[inline]
pub fn reset(w: &mut impl Write) -> io::Result<()> {
    w.write_all(b"\x1b[0m")
}

// ─── Foreground Color ────────────────────────────────────────────────────────

/// Set the foreground (text) color.
///
/// Uses compact SGR codes for standard colors (30-37, 90-97), the 256-color
/// extended format for palette indices 16-255, and 24-bit `TrueColor` for RGB.
pub fn fg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[39m"),
        CellColor::Ansi256(idx) => {
            if idx < 8 {
                write!(w, "\x1b[{}m", 30 + u16::from(idx))
            } else if idx < 16 {
                write!(w, "\x1b[{}m", 82 + u16::from(idx))
            } else {
                write!(w, "\x1b[38;5;{idx}m")
            }
        }
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[38;2;{r};{g};{b}m"),
    }
}

// ─── Background Color ────────────────────────────────────────────────────────

/// Set the background color.
///
/// Same encoding strategy as [`fg`] but with BG-specific SGR codes
/// (40–47, 100–107, 48;5;N, 48;2;R;G;B).
pub fn bg(w: &mut impl Write, color: CellColor) -> io::Result<()> {
    match color {
        CellColor::Default => w.write_all(b"\x1b[49m"),
        CellColor::Ansi256(idx) => {
            if idx < 8 {
                write!(w, "\x1b[{}m", 40 + u16::from(idx))
            } else if idx < 16 {
                write!(w, "\x1b[{}m", 92 + u16::from(idx))
            } else {
                write!(w, "\x1b[48;5;{idx}m")
            }
        }
        CellColor::Rgb(r, g, b) => write!(w, "\x1b[48;2;{r};{g};{b}m"),
    }
}

// ─── Text Attributes ─────────────────────────────────────────────────────────

/// Emit SGR codes for text attributes as a single CSI sequence.
///
/// Multiple attributes are semicolon-separated: `\x1b[1;4m` for
/// bold + underline. Does nothing if no attributes are set.
pub fn attrs(w: &mut impl Write, attr: Attr) -> io::Result<()> {
    if attr.is_empty() {
        return Ok(());
    }

    w.write_all(b"\x1b[")?;
    let mut first = true;

    macro_rules! emit {
        ($flag:expr, $code:expr) => {
            if attr.contains($flag) {
                if !first {
                    w.write_all(b";")?;
                }
                w.write_all($code)?;
                first = false;
            }
        };
    }

    emit!(Attr::BOLD, b"1");
    emit!(Attr::DIM, b"2");
    emit!(Attr::ITALIC, b"3");
    emit!(Attr::UNDERLINE, b"4");
    emit!(Attr::BLINK, b"5");
    emit!(Attr::INVERSE, b"7");
    emit!(Attr::STRIKETHROUGH, b"9");
    let _ = first; // Last expansion sets first; suppress dead-write warning.

    w.write_all(b"m")
}

/// Emit everything needed to switch from default rendition to `style`.
///
/// Default colors are skipped: the caller starts from a reset state.
pub fn style(w: &mut impl Write, style: &SpanStyle) -> io::Result<()> {
    attrs(w, style.attrs)?;
    if !style.fg.is_default() {
        fg(w, style.fg)?;
    }
    if !style.bg.is_default() {
        bg(w, style.bg)?;
    }
    Ok(())
}

// ─── Tests ───────────────────────────────────────────────────────────────────
