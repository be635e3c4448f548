// SPDX-License-Identifier: MIT
//
// Terminal queries — is stdout a terminal, and how big is it.
//
// Safety: the queries use `isatty` and `ioctl(TIOCGWINSZ)`, the standard
// POSIX interfaces for this. Each unsafe block is a single libc call on a
// well-known file descriptor.
#![allow(unsafe_code)]
//
// The table writer asks these two questions once, when it is built: a tty
// gets colors and in-place updates, anything else gets plain text written
// once at the end. The height bounds how far up the cursor may travel to
// redraw a line; rows that have scrolled out of view cannot be reached.

// ─── Queries ────────────────────────────────────────────────────────────────

/// Number of rows in the terminal on stdout, via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or the query fails.
#[cfg(unix)]
#[must_use]
pub fn height() -> Option<u16> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };
    (result == 0 && ws.ws_row > 0).then_some(ws.ws_row)
}

#[cfg(not(unix))]
#[must_use]
pub fn height() -> Option<u16> {
    None
}

/// Check whether stdout is connected to a terminal (TTY).
#[cfg(unix)]
#[must_use]
pub fn stdout_is_tty() -> bool {
    unsafe { libc::isatty(libc::STDOUT_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn stdout_is_tty() -> bool {
    false
}

// ─── Tests ───────────────────────────────────────────────────────────────────
