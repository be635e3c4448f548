//! Table-wide style: the header, the separator, column defaults, and the
//! per-column entries.
//!
//! Table-level keys carry a trailing underscore so they never collide with
//! a column name. Every other key is a column:
//!
//! ```toml
//! separator_ = " | "
//! width_ = 80
//!
//! [header_]
//! bold = true
//!
//! [default_]
//! missing = "-"
//!
//! [name]
//! width = { max = 20 }
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::column::{ColumnStyle, Resolved};
use crate::error::{Result, StyleError};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TableStyle {
    /// Present when a header line is wanted.
    #[serde(rename = "header_", default)]
    pub header: Option<ColumnStyle>,
    #[serde(rename = "separator_", default)]
    pub separator: Option<String>,
    /// Applied under every column's own style.
    #[serde(rename = "default_", default)]
    pub default: Option<ColumnStyle>,
    /// Maximum total width.
    #[serde(rename = "width_", default)]
    pub width: Option<usize>,
    #[serde(flatten)]
    pub columns: BTreeMap<String, ColumnStyle>,
}

impl TableStyle {
    pub const DEFAULT_SEPARATOR: &'static str = " ";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn has_header(&self) -> bool {
        self.header.is_some()
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        self.separator.as_deref().unwrap_or(Self::DEFAULT_SEPARATOR)
    }

    /// The declared style of `name`, if any.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnStyle> {
        self.columns.get(name)
    }

    // ── Builder ─────────────────────────────────────────────────────────

    #[must_use]
    pub fn with_header(mut self, header: ColumnStyle) -> Self {
        self.header = Some(header);
        self
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: ColumnStyle) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub const fn with_width(mut self, width: usize) -> Self {
        self.width = Some(width);
        self
    }

    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, style: ColumnStyle) -> Self {
        self.columns.insert(name.into(), style);
        self
    }

    // ── Merging ─────────────────────────────────────────────────────────

    /// `over` layered on top of `self`. Column entries merge field by field;
    /// table-level scalars are replaced when `over` sets them.
    #[must_use]
    pub fn merged(&self, over: &Self) -> Self {
        let mut columns = self.columns.clone();
        for (name, style) in &over.columns {
            columns
                .entry(name.clone())
                .and_modify(|base| *base = base.merged(style))
                .or_insert_with(|| style.clone());
        }
        Self {
            header: merge_opt(self.header.as_ref(), over.header.as_ref()),
            separator: over.separator.clone().or_else(|| self.separator.clone()),
            default: merge_opt(self.default.as_ref(), over.default.as_ref()),
            width: over.width.or(self.width),
            columns,
        }
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// The effective declaration of `name`: `default_` under the column's
    /// own entry.
    #[must_use]
    pub fn effective(&self, name: &str) -> ColumnStyle {
        let base = self.default.clone().unwrap_or_default();
        match self.columns.get(name) {
            Some(own) => base.merged(own),
            None => base,
        }
    }

    /// Resolve the style of column `name`.
    ///
    /// # Errors
    ///
    /// See [`ColumnStyle::resolve`].
    pub fn resolve_column(&self, name: &str) -> Result<Resolved> {
        self.effective(name).resolve(name)
    }

    /// Resolve the header style, or `None` when there is no header.
    ///
    /// # Errors
    ///
    /// See [`ColumnStyle::resolve`].
    pub fn resolve_header(&self) -> Result<Option<Resolved>> {
        self.header
            .as_ref()
            .map(|h| h.resolve("header_"))
            .transpose()
    }

    // ── Loading ─────────────────────────────────────────────────────────

    /// # Errors
    ///
    /// [`StyleError::Toml`] on malformed input.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// # Errors
    ///
    /// [`StyleError::Json`] on malformed input.
    pub fn from_json_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Load a style file. `.json` files are read as JSON, anything else as
    /// TOML.
    ///
    /// # Errors
    ///
    /// [`StyleError::Io`] if the file cannot be read, otherwise a parse
    /// error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| StyleError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&text)
        } else {
            Self::from_toml_str(&text)
        }
    }
}

fn merge_opt(base: Option<&ColumnStyle>, over: Option<&ColumnStyle>) -> Option<ColumnStyle> {
    match (base, over) {
        (Some(b), Some(o)) => Some(b.merged(o)),
        (b, o) => o.or(b).cloned(),
    }
}
