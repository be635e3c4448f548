//! Value-dependent style entries.
//!
//! A style entry such as `color` or `bold` is either a constant or a rule
//! keyed on the cell's raw value:
//!
//! ```toml
//! color = "green"                                 # constant
//! color = { lookup = { BAD = "red" } }            # exact match on the value's text
//! color = { re_lookup = [["^err", "red"]] }       # first matching regex
//! bold  = { interval = [[50, 80, true]] }         # numeric [lo, hi)
//! ```
//!
//! Lookups only consider scalar values. Lists, objects and missing values
//! never match a rule and fall back to the column's plain rendition.

use std::collections::BTreeMap;
use std::collections::HashMap;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, StyleError};

// ─── Declarations ────────────────────────────────────────────────────────────

/// A numeric interval `[lo, hi)` mapped to a style value.
///
/// Either bound may be absent for an open end. Accepts the array form
/// `[lo, hi, value]` (JSON `null` for an open bound) and the table form
/// `{ from = lo, to = hi, value = … }` for TOML, which has no null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Interval<T> {
    Bounds(Option<f64>, Option<f64>, T),
    Table {
        #[serde(default)]
        from: Option<f64>,
        #[serde(default)]
        to: Option<f64>,
        value: T,
    },
}

impl<T> Interval<T> {
    #[must_use]
    pub const fn new(from: Option<f64>, to: Option<f64>, value: T) -> Self {
        Self::Bounds(from, to, value)
    }

    fn into_parts(self) -> (Option<f64>, Option<f64>, T) {
        match self {
            Self::Bounds(from, to, value) | Self::Table { from, to, value } => (from, to, value),
        }
    }
}

/// A style entry: constant, or chosen by the cell's value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StyleValue<T> {
    Const(T),
    Lookup { lookup: BTreeMap<String, T> },
    ReLookup { re_lookup: Vec<(String, T)> },
    Interval { interval: Vec<Interval<T>> },
}

impl<T> StyleValue<T> {
    /// Exact-match lookup table.
    pub fn lookup<K: Into<String>>(pairs: impl IntoIterator<Item = (K, T)>) -> Self {
        Self::Lookup {
            lookup: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Ordered regex lookup; the first matching pattern wins.
    pub fn re_lookup<K: Into<String>>(pairs: impl IntoIterator<Item = (K, T)>) -> Self {
        Self::ReLookup {
            re_lookup: pairs.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    /// Ordered numeric intervals; the first containing interval wins.
    pub fn intervals(items: impl IntoIterator<Item = (Option<f64>, Option<f64>, T)>) -> Self {
        Self::Interval {
            interval: items
                .into_iter()
                .map(|(from, to, value)| Interval::new(from, to, value))
                .collect(),
        }
    }
}

impl From<&str> for StyleValue<String> {
    fn from(s: &str) -> Self {
        Self::Const(s.to_owned())
    }
}

impl From<String> for StyleValue<String> {
    fn from(s: String) -> Self {
        Self::Const(s)
    }
}

impl From<bool> for StyleValue<bool> {
    fn from(b: bool) -> Self {
        Self::Const(b)
    }
}

// ─── Compiled rules ──────────────────────────────────────────────────────────

/// A [`StyleValue`] with its regexes compiled and its values converted to
/// their terminal form.
#[derive(Debug, Clone)]
pub enum Rule<T> {
    Const(T),
    Lookup(HashMap<String, T>),
    ReLookup(Vec<(Regex, T)>),
    Interval(Vec<(Option<f64>, Option<f64>, T)>),
}

impl<T: Clone> StyleValue<T> {
    /// Compile into a [`Rule`], converting each value with `convert`.
    ///
    /// # Errors
    ///
    /// Returns the first conversion error, or [`StyleError::Regex`] for a
    /// pattern that does not compile.
    pub fn compile<U, F>(&self, mut convert: F) -> Result<Rule<U>>
    where
        F: FnMut(&T) -> Result<U>,
    {
        Ok(match self {
            Self::Const(v) => Rule::Const(convert(v)?),
            Self::Lookup { lookup } => Rule::Lookup(
                lookup
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), convert(v)?)))
                    .collect::<Result<_>>()?,
            ),
            Self::ReLookup { re_lookup } => Rule::ReLookup(
                re_lookup
                    .iter()
                    .map(|(pattern, v)| {
                        let re = Regex::new(pattern).map_err(|source| StyleError::Regex {
                            pattern: pattern.clone(),
                            source,
                        })?;
                        Ok((re, convert(v)?))
                    })
                    .collect::<Result<_>>()?,
            ),
            Self::Interval { interval } => Rule::Interval(
                interval
                    .iter()
                    .cloned()
                    .map(|i| {
                        let (from, to, v) = i.into_parts();
                        Ok((from, to, convert(&v)?))
                    })
                    .collect::<Result<_>>()?,
            ),
        })
    }
}

impl<T> Rule<T> {
    /// The style value selected by `value`, if any.
    #[must_use]
    pub fn eval(&self, value: Option<&Value>) -> Option<&T> {
        match self {
            Self::Const(v) => Some(v),
            Self::Lookup(map) => key_text(value?).and_then(|k| map.get(&k)),
            Self::ReLookup(rules) => {
                let text = key_text(value?)?;
                rules
                    .iter()
                    .find(|(re, _)| re.is_match(&text))
                    .map(|(_, v)| v)
            }
            Self::Interval(intervals) => {
                let n = value?.as_f64()?;
                intervals
                    .iter()
                    .find(|(from, to, _)| {
                        from.is_none_or(|lo| n >= lo) && to.is_none_or(|hi| n < hi)
                    })
                    .map(|(_, _, v)| v)
            }
        }
    }
}

/// Text used to key lookups: scalars only.
#[must_use]
pub fn key_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
