//! Fields — turning one value into one padded, styled cell.
//!
//! Rendering happens in two steps. [`cell_text`] produces the display text
//! (transform applied, missing values replaced) and is cached per row so
//! widths can be computed without re-running transforms. [`write_cell`]
//! then fits that text to the column width and paints it. Only the text is
//! painted; padding stays outside the escape codes.

use std::io::{self, Write};

use serde_json::Value;
use termtab_style::Resolved;
use termtab_term::output::paint;
use termtab_term::width::{padding, truncate};
use termtab_term::SpanStyle;

use crate::error::{Result, TabularError};

/// Display text of a value.
///
/// Strings are shown verbatim, numbers and booleans in their JSON form,
/// arrays as `[a, b]` with nested strings quoted, objects as compact JSON.
/// `null` renders empty.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(nested_text).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(_) => value.to_string(),
    }
}

fn nested_text(value: &Value) -> String {
    match value {
        Value::String(_) | Value::Null => value.to_string(),
        _ => value_text(value),
    }
}

/// A present value, treating JSON `null` as missing.
#[inline]
#[must_use]
pub fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// The text shown for `value` in `column`: the column's `missing` text when
/// absent, otherwise the transformed value's text.
///
/// # Errors
///
/// [`TabularError::StyleFunction`] when the transform fails.
pub fn cell_text(column: &str, style: &Resolved, value: Option<&Value>) -> Result<String> {
    let Some(value) = present(value) else {
        return Ok(style.missing.clone());
    };
    match &style.transform {
        None => Ok(value_text(value)),
        Some(t) => t
            .apply(value)
            .map(|v| value_text(&v))
            .map_err(|source| TabularError::StyleFunction {
                column: column.to_owned(),
                source,
            }),
    }
}

/// Write `text` fitted to `width` columns: cut with the column's marker,
/// padded by its alignment, the text itself painted in `span`.
pub fn write_cell(
    out: &mut impl Write,
    text: &str,
    width: usize,
    style: &Resolved,
    span: &SpanStyle,
) -> io::Result<()> {
    let text = truncate(text, width, style.marker.as_deref());
    let (left, right) = padding(&text, width, style.align);
    write!(out, "{:left$}", "")?;
    paint(out, &text, span)?;
    write!(out, "{:right$}", "")
}
