//! Per-column style: declaration, merging, and resolution.
//!
//! [`ColumnStyle`] is what a style file or builder declares. Every field is
//! optional so that `default_`, the column's own entry and a per-write
//! override can be layered field by field. [`ColumnStyle::resolve`] fills
//! the gaps with built-in defaults, validates, and compiles the value rules
//! into a [`Resolved`] that the table writer keeps per column.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use termtab_term::{Align, Attr, CellColor, SpanStyle};

use crate::aggregate::Aggregate;
use crate::error::{BoxError, Result};
use crate::value::{Rule, StyleValue};
use crate::width::{Marker, Width, WidthSpec};

// ─── Transform ───────────────────────────────────────────────────────────────

/// A function applied to a cell's value before it is displayed.
#[derive(Clone)]
pub struct Transform(Arc<dyn Fn(&Value) -> std::result::Result<Value, BoxError> + Send + Sync>);

impl Transform {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// # Errors
    ///
    /// Whatever the wrapped function returns.
    pub fn apply(&self, value: &Value) -> std::result::Result<Value, BoxError> {
        (self.0)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Transform(..)")
    }
}

// ─── Delayed ─────────────────────────────────────────────────────────────────

/// Asynchronous delivery of a column's values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Delayed {
    /// `true`: the column is delivered on its own.
    Flag(bool),
    /// Columns naming the same group are delivered together.
    Group(String),
}

impl Delayed {
    /// The delivery group, or `None` if the column is not delayed.
    /// A column delayed on its own forms a group named after itself.
    #[must_use]
    pub fn group(&self, column: &str) -> Option<String> {
        match self {
            Self::Flag(false) => None,
            Self::Flag(true) => Some(format!("\0{column}")),
            Self::Group(g) => Some(g.clone()),
        }
    }
}

// ─── Declaration ─────────────────────────────────────────────────────────────

/// Declared style of one column. Unset fields inherit.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColumnStyle {
    #[serde(default, deserialize_with = "de_align")]
    pub align: Option<Align>,
    #[serde(default)]
    pub width: Option<WidthSpec>,
    #[serde(default)]
    pub marker: Option<Marker>,
    #[serde(default)]
    pub color: Option<StyleValue<String>>,
    #[serde(default)]
    pub bg: Option<StyleValue<String>>,
    #[serde(default)]
    pub bold: Option<StyleValue<bool>>,
    #[serde(default)]
    pub underline: Option<StyleValue<bool>>,
    #[serde(default)]
    pub italic: Option<StyleValue<bool>>,
    #[serde(default)]
    pub dim: Option<StyleValue<bool>>,
    #[serde(default)]
    pub reverse: Option<StyleValue<bool>>,
    #[serde(default)]
    pub missing: Option<String>,
    #[serde(skip)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub aggregate: Option<Aggregate>,
    #[serde(default)]
    pub delayed: Option<Delayed>,
}

fn de_align<'de, D: Deserializer<'de>>(d: D) -> std::result::Result<Option<Align>, D::Error> {
    Option::<String>::deserialize(d)?
        .map(|s| s.parse().map_err(serde::de::Error::custom))
        .transpose()
}

/// Field-wise `over.field.or(base.field)`.
macro_rules! layer {
    ($base:expr, $over:expr; $($field:ident),+ $(,)?) => {
        ColumnStyle {
            $($field: $over.$field.clone().or_else(|| $base.$field.clone()),)+
        }
    };
}

impl ColumnStyle {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `over` layered on top of `self`: every field set in `over` wins.
    #[must_use]
    pub fn merged(&self, over: &Self) -> Self {
        layer!(self, over;
            align, width, marker, color, bg, bold, underline, italic, dim,
            reverse, missing, transform, aggregate, delayed)
    }

    // ── Builder ─────────────────────────────────────────────────────────

    #[must_use]
    pub const fn align(mut self, align: Align) -> Self {
        self.align = Some(align);
        self
    }

    #[must_use]
    pub fn width(mut self, width: impl Into<WidthSpec>) -> Self {
        self.width = Some(width.into());
        self
    }

    #[must_use]
    pub fn marker(mut self, marker: impl Into<Marker>) -> Self {
        self.marker = Some(marker.into());
        self
    }

    #[must_use]
    pub fn color(mut self, color: impl Into<StyleValue<String>>) -> Self {
        self.color = Some(color.into());
        self
    }

    #[must_use]
    pub fn bg(mut self, color: impl Into<StyleValue<String>>) -> Self {
        self.bg = Some(color.into());
        self
    }

    #[must_use]
    pub fn bold(mut self, on: impl Into<StyleValue<bool>>) -> Self {
        self.bold = Some(on.into());
        self
    }

    #[must_use]
    pub fn underline(mut self, on: impl Into<StyleValue<bool>>) -> Self {
        self.underline = Some(on.into());
        self
    }

    #[must_use]
    pub fn italic(mut self, on: impl Into<StyleValue<bool>>) -> Self {
        self.italic = Some(on.into());
        self
    }

    #[must_use]
    pub fn dim(mut self, on: impl Into<StyleValue<bool>>) -> Self {
        self.dim = Some(on.into());
        self
    }

    #[must_use]
    pub fn reverse(mut self, on: impl Into<StyleValue<bool>>) -> Self {
        self.reverse = Some(on.into());
        self
    }

    #[must_use]
    pub fn missing(mut self, text: impl Into<String>) -> Self {
        self.missing = Some(text.into());
        self
    }

    #[must_use]
    pub fn transform<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.transform = Some(Transform::new(f));
        self
    }

    #[must_use]
    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    #[must_use]
    pub fn delayed(mut self, delayed: Delayed) -> Self {
        self.delayed = Some(delayed);
        self
    }

    // ── Resolution ──────────────────────────────────────────────────────

    /// Apply built-in defaults, validate, and compile value rules.
    ///
    /// # Errors
    ///
    /// Invalid widths, unknown colors, and bad regex patterns.
    pub fn resolve(&self, column: &str) -> Result<Resolved> {
        let width_spec = self.width.clone().unwrap_or_default();
        let width = width_spec.resolve(column)?;
        let marker = width_spec
            .marker()
            .or(self.marker.as_ref())
            .cloned()
            .unwrap_or_default()
            .text();

        let color_rule = |v: &Option<StyleValue<String>>| {
            v.as_ref()
                .map(|sv| sv.compile(|name| Ok(name.parse::<CellColor>()?)))
                .transpose()
        };

        let mut attrs = Vec::new();
        for (flag, decl) in [
            (Attr::BOLD, &self.bold),
            (Attr::UNDERLINE, &self.underline),
            (Attr::ITALIC, &self.italic),
            (Attr::DIM, &self.dim),
            (Attr::INVERSE, &self.reverse),
        ] {
            if let Some(sv) = decl {
                attrs.push((flag, sv.compile(|b| Ok(*b))?));
            }
        }

        Ok(Resolved {
            align: self.align.unwrap_or_default(),
            width,
            marker,
            missing: self.missing.clone().unwrap_or_default(),
            transform: self.transform.clone(),
            aggregate: self.aggregate.clone(),
            delay_group: self.delayed.as_ref().and_then(|d| d.group(column)),
            fg: color_rule(&self.color)?,
            bg: color_rule(&self.bg)?,
            attrs,
        })
    }
}

// ─── Resolved ────────────────────────────────────────────────────────────────

/// A column style with every default applied and every rule compiled.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub align: Align,
    pub width: Width,
    /// Truncation marker; `None` cuts hard.
    pub marker: Option<String>,
    /// Text shown for a missing value.
    pub missing: String,
    pub transform: Option<Transform>,
    pub aggregate: Option<Aggregate>,
    /// Delivery group for delayed columns.
    pub delay_group: Option<String>,
    fg: Option<Rule<CellColor>>,
    bg: Option<Rule<CellColor>>,
    attrs: Vec<(Attr, Rule<bool>)>,
}

impl Resolved {
    /// The span style for a cell holding `value` (`None` when missing).
    #[must_use]
    pub fn span_style(&self, value: Option<&Value>) -> SpanStyle {
        let mut style = SpanStyle::PLAIN;
        if let Some(c) = self.fg.as_ref().and_then(|r| r.eval(value)) {
            style.fg = *c;
        }
        if let Some(c) = self.bg.as_ref().and_then(|r| r.eval(value)) {
            style.bg = *c;
        }
        for (flag, rule) in &self.attrs {
            if rule.eval(value).copied().unwrap_or(false) {
                style.attrs |= *flag;
            }
        }
        style
    }

    /// Whether the column is delivered asynchronously.
    #[must_use]
    pub const fn is_delayed(&self) -> bool {
        self.delay_group.is_some()
    }
}

impl Default for Resolved {
    fn default() -> Self {
        Self {
            align: Align::Left,
            width: Width::Auto { min: 0, max: None },
            marker: Marker::default().text(),
            missing: String::new(),
            transform: None,
            aggregate: None,
            delay_group: None,
            fg: None,
            bg: None,
            attrs: Vec::new(),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
