// SPDX-License-Identifier: MIT
//
// Output buffering and styled span output.
//
//   OutputBuffer — accumulates the bytes of one redraw (cursor motion,
//   erase, styled lines) so the whole update reaches the terminal in a
//   single write. A half-written redraw is visible as flicker.
//
//   CaptureBuffer — a clonable in-memory sink. The table writer owns its
//   destination as `Box<dyn Write + Send>`; a clone of the capture kept by
//   the caller reads back what was written.
//
//   paint — one span of text in one style, always closed by a reset so the
//   style never leaks into padding or separators.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use crate::ansi;
use crate::attr::SpanStyle;

// ─── OutputBuffer ────────────────────────────────────────────────────────────

/// A byte buffer that accumulates ANSI output for a single `write()` call.
pub struct OutputBuffer {
    buf: Vec<u8>,
}

const DEFAULT_CAPACITY: usize = 4096;

impl OutputBuffer {
    /// Create an empty buffer with default capacity (4 KB).
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(DEFAULT_CAPACITY),
        }
    }

    /// Number of bytes accumulated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Whether the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// The accumulated bytes (for testing and debugging).
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Append a string verbatim.
    #[inline]
    pub fn push_str(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
    }

    /// Clear the buffer for reuse (keeps allocated capacity).
    #[inline]
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Write accumulated output to `w`, flush it, and clear the buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to `w` fails.
    pub fn flush_to(&mut self, w: &mut (impl Write + ?Sized)) -> io::Result<()> {
        if !self.buf.is_empty() {
            w.write_all(&self.buf)?;
            w.flush()?;
            self.buf.clear();
        }
        Ok(())
    }
}

impl Write for OutputBuffer {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        // Intentionally a no-op. Real flushing via flush_to().
        Ok(())
    }
}

impl Default for OutputBuffer {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Styled spans ────────────────────────────────────────────────────────────

/// Write `text` in `style`, followed by a reset.
///
/// Plain styles and empty text are written without any escape codes.
pub fn paint(out: &mut impl Write, text: &str, style: &SpanStyle) -> io::Result<()> {
    if text.is_empty() || style.is_plain() {
        return out.write_all(text.as_bytes());
    }
    ansi::style(out, style)?;
    out.write_all(text.as_bytes())?;
    ansi::reset(out)
}

/// [`paint`] into a new `String`.
#[must_use]
pub fn painted(text: &str, style: &SpanStyle) -> String {
    let mut buf = Vec::with_capacity(text.len() + 16);
    // Writing into a Vec cannot fail.
    let _ = paint(&mut buf, text, style);
    String::from_utf8(buf).unwrap_or_default()
}

// ─── CaptureBuffer ───────────────────────────────────────────────────────────

/// Thread-safe in-memory writer whose clones share one buffer.
///
/// ```
/// use std::io::Write;
/// use termtab_term::output::CaptureBuffer;
///
/// let capture = CaptureBuffer::new();
/// let mut sink = capture.clone();
/// write!(sink, "hello").unwrap();
/// assert_eq!(capture.contents(), "hello");
/// ```
#[derive(Clone, Default)]
pub struct CaptureBuffer {
    inner: Arc<Mutex<Vec<u8>>>,
}

impl CaptureBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&guard).into_owned()
    }

    /// Discard everything written so far.
    pub fn clear(&self) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
