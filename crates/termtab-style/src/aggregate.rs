//! Column aggregates for the summary lines beneath a table.
//!
//! An aggregate sees the current value of its column in every row (missing
//! values excluded) and returns one value, or a list of values to spread
//! over several summary lines.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use crate::error::{BoxError, StyleError};
use crate::value::key_text;

/// User-supplied aggregate function.
pub type AggregateFn = Arc<dyn Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync>;

#[derive(Clone)]
pub enum Aggregate {
    /// Numeric sum; stays integral when every number is an integer.
    Sum,
    Min,
    Max,
    /// Number of values present.
    Count,
    /// One `"value: n"` line per distinct value, sorted by value.
    Counts,
    Custom(AggregateFn),
}

impl Aggregate {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Aggregate `values`.
    ///
    /// # Errors
    ///
    /// Only custom aggregates fail; their error is passed through.
    pub fn apply(&self, values: &[Value]) -> Result<Value, BoxError> {
        match self {
            Self::Sum => Ok(sum(values)),
            Self::Min => Ok(extreme(values, |a, b| a < b)),
            Self::Max => Ok(extreme(values, |a, b| a > b)),
            Self::Count => Ok(Value::from(values.len())),
            Self::Counts => Ok(counts(values)),
            Self::Custom(f) => f(values),
        }
    }
}

fn sum(values: &[Value]) -> Value {
    let numbers: Vec<&Number> = values.iter().filter_map(Value::as_number).collect();
    if numbers.iter().all(|n| n.is_i64()) {
        // Integer totals that overflow fall through to the float sum.
        let total = numbers
            .iter()
            .filter_map(|n| n.as_i64())
            .try_fold(0_i64, i64::checked_add);
        if let Some(total) = total {
            return Value::from(total);
        }
    }
    let total: f64 = numbers.iter().filter_map(|n| n.as_f64()).sum();
    Number::from_f64(total).map_or(Value::Null, Value::Number)
}

fn extreme(values: &[Value], better: fn(f64, f64) -> bool) -> Value {
    values
        .iter()
        .filter_map(|v| v.as_f64().map(|f| (f, v)))
        .reduce(|best, cur| if better(cur.0, best.0) { cur } else { best })
        .map_or(Value::Null, |(_, v)| v.clone())
}

fn counts(values: &[Value]) -> Value {
    let mut tally: BTreeMap<String, usize> = BTreeMap::new();
    for v in values {
        let key = key_text(v).unwrap_or_else(|| v.to_string());
        *tally.entry(key).or_default() += 1;
    }
    Value::Array(
        tally
            .into_iter()
            .map(|(k, n)| Value::String(format!("{k}: {n}")))
            .collect(),
    )
}

impl FromStr for Aggregate {
    type Err = StyleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Self::Sum),
            "min" => Ok(Self::Min),
            "max" => Ok(Self::Max),
            "count" => Ok(Self::Count),
            "counts" => Ok(Self::Counts),
            _ => Err(StyleError::UnknownAggregate(s.to_owned())),
        }
    }
}

impl<'de> Deserialize<'de> for Aggregate {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let name = String::deserialize(d)?;
        name.parse().map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sum => "sum",
            Self::Min => "min",
            Self::Max => "max",
            Self::Count => "count",
            Self::Counts => "counts",
            Self::Custom(_) => "custom",
        })
    }
}
