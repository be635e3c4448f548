// SPDX-License-Identifier: MIT
//
// termtab-term — terminal primitives for termtab.
//
// Everything the table writer needs to talk to a terminal, and nothing
// more: SGR encoding for colors and attributes, the handful of cursor and
// erase sequences used to redraw lines in place, styled span output,
// display-width measurement, and tty/size queries.
//
// Like the rest of the workspace this crate speaks ANSI directly instead of
// going through terminfo. The sequences used here are understood by every
// terminal emulator in common use.

pub mod ansi;
pub mod attr;
pub mod color;
pub mod output;
pub mod terminal;
pub mod width;

pub use attr::{Attr, SpanStyle};
pub use color::{CellColor, ColorError};
pub use output::{CaptureBuffer, OutputBuffer};
pub use width::Align;
