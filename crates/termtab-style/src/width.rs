//! Column width declarations.
//!
//! ```toml
//! width = 10                                  # fixed
//! width = "auto"                              # grow to fit content
//! width = { auto = true, min = 2, max = 8 }   # grow, within bounds
//! width = { max = 5, marker = "…" }           # auto is implied without `width`
//! width = { auto = false, width = 6 }         # fixed, table form
//! ```
//!
//! The truncation marker may be given here or as the column's `marker`;
//! the one inside the width table wins.

use serde::Deserialize;

use crate::error::{Result, StyleError};

/// Marker used when text is cut to fit its column.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Marker {
    /// `true` → `"..."`, `false` → hard cut.
    Flag(bool),
    Text(String),
}

impl Marker {
    pub const DEFAULT_TEXT: &'static str = "...";

    /// The text to append when cutting, or `None` for a hard cut.
    #[must_use]
    pub fn text(&self) -> Option<String> {
        match self {
            Self::Flag(true) => Some(Self::DEFAULT_TEXT.to_owned()),
            Self::Flag(false) => None,
            Self::Text(s) => Some(s.clone()),
        }
    }
}

impl Default for Marker {
    fn default() -> Self {
        Self::Flag(true)
    }
}

impl From<bool> for Marker {
    fn from(b: bool) -> Self {
        Self::Flag(b)
    }
}

impl From<&str> for Marker {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Width as declared in a style.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum WidthSpec {
    Fixed(usize),
    /// Only `"auto"` is accepted.
    Keyword(String),
    Table {
        #[serde(default)]
        auto: Option<bool>,
        #[serde(default)]
        min: Option<usize>,
        #[serde(default)]
        max: Option<usize>,
        #[serde(default)]
        width: Option<usize>,
        #[serde(default)]
        marker: Option<Marker>,
    },
}

impl WidthSpec {
    /// `"auto"`.
    #[must_use]
    pub fn auto() -> Self {
        Self::Keyword("auto".to_owned())
    }

    /// Auto width bounded by `min` and `max`.
    #[must_use]
    pub const fn bounded(min: Option<usize>, max: Option<usize>) -> Self {
        Self::Table {
            auto: Some(true),
            min,
            max,
            width: None,
            marker: None,
        }
    }

    /// Marker declared inside the width table, if any.
    #[must_use]
    pub const fn marker(&self) -> Option<&Marker> {
        match self {
            Self::Table { marker, .. } => marker.as_ref(),
            _ => None,
        }
    }

    /// Validate and resolve into a [`Width`].
    ///
    /// # Errors
    ///
    /// [`StyleError::InvalidWidth`] for an unknown keyword, `auto = false`
    /// without `width`, or `min > max`.
    pub fn resolve(&self, column: &str) -> Result<Width> {
        let invalid = |reason: &str| StyleError::InvalidWidth {
            column: column.to_owned(),
            reason: reason.to_owned(),
        };
        match self {
            Self::Fixed(n) => Ok(Width::Fixed(*n)),
            Self::Keyword(k) if k.eq_ignore_ascii_case("auto") => Ok(Width::Auto { min: 0, max: None }),
            Self::Keyword(k) => Err(invalid(&format!("expected a number or \"auto\", got \"{k}\""))),
            Self::Table {
                auto,
                min,
                max,
                width,
                ..
            } => match (auto, width) {
                (Some(false), None) => Err(invalid("auto is false but no width is given")),
                (Some(false) | None, Some(w)) => Ok(Width::Fixed(*w)),
                (Some(true) | None, w) => {
                    let min = min.or(*w).unwrap_or(0);
                    if max.is_some_and(|max| min > max) {
                        return Err(invalid("min is larger than max"));
                    }
                    Ok(Width::Auto { min, max: *max })
                }
            },
        }
    }
}

impl Default for WidthSpec {
    fn default() -> Self {
        Self::auto()
    }
}

impl From<usize> for WidthSpec {
    fn from(n: usize) -> Self {
        Self::Fixed(n)
    }
}

/// Resolved width rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Fixed(usize),
    Auto { min: usize, max: Option<usize> },
}

impl Width {
    #[must_use]
    pub const fn is_auto(self) -> bool {
        matches!(self, Self::Auto { .. })
    }

    /// The width for content whose widest entry is `natural` columns.
    #[must_use]
    pub fn fit(self, natural: usize) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Auto { min, max } => {
                let w = natural.max(min);
                max.map_or(w, |max| w.min(max))
            }
        }
    }

    /// The narrowest this column may be squeezed to.
    #[must_use]
    pub const fn floor(self) -> usize {
        match self {
            Self::Fixed(n) => n,
            Self::Auto { min, .. } => {
                if min > 1 { min } else { 1 }
            }
        }
    }
}
