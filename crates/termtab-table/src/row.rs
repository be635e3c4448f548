//! Rows — the data layer.
//!
//! A [`Row`] is either a mapping of [`Key`]s to [`Input`]s or a sequence of
//! inputs matched positionally to the table's columns. An input is a
//! concrete JSON value or a [`Deferred`] value that a worker thread fills in
//! later.
//!
//! A key usually names one column. A tuple key names several, so that a
//! single deferred producer can fill them together. Values assigned to a
//! tuple key are spread over its columns:
//!
//! | Value   | Effect                                         |
//! |---------|------------------------------------------------|
//! | object  | each named column present in the key is set    |
//! | array   | columns are set positionally                   |
//! | scalar  | every column in the key gets the same value    |

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use termtab_style::BoxError;

use crate::error::{Result, TabularError};

// ─── Key ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Column(String),
    Columns(Vec<String>),
}

impl Key {
    /// The columns this key covers, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        match self {
            Self::Column(c) => std::slice::from_ref(c),
            Self::Columns(cs) => cs,
        }
    }

    /// Assignments for `value` written to this key.
    ///
    /// # Errors
    ///
    /// [`TabularError::Content`] for an array longer than the key, or an
    /// object naming a column outside the key.
    pub fn spread(&self, value: Value) -> Result<Vec<(String, Value)>> {
        let cols = match self {
            Self::Column(c) => return Ok(vec![(c.clone(), value)]),
            Self::Columns(cols) => cols,
        };
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| {
                    if cols.contains(&k) {
                        Ok((k, v))
                    } else {
                        Err(TabularError::Content(format!(
                            "update names `{k}`, which is not part of key {self}"
                        )))
                    }
                })
                .collect(),
            Value::Array(items) => {
                if items.len() > cols.len() {
                    return Err(TabularError::Content(format!(
                        "{} values for key {self}",
                        items.len()
                    )));
                }
                Ok(cols.iter().cloned().zip(items).collect())
            }
            scalar => Ok(cols.iter().map(|c| (c.clone(), scalar.clone())).collect()),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Column(c) => f.write_str(c),
            Self::Columns(cs) => write!(f, "({})", cs.join(", ")),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self::Column(s.to_owned())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self::Column(s)
    }
}

impl<const N: usize> From<[&str; N]> for Key {
    fn from(cols: [&str; N]) -> Self {
        Self::Columns(cols.iter().map(|&c| c.to_owned()).collect())
    }
}

impl From<Vec<String>> for Key {
    fn from(cols: Vec<String>) -> Self {
        Self::Columns(cols)
    }
}

// ─── Deferred ────────────────────────────────────────────────────────────────

type Once = Box<dyn FnOnce() -> std::result::Result<Value, BoxError> + Send>;
type Updates = Box<dyn Iterator<Item = std::result::Result<Value, BoxError>>>;
type Generate = Box<dyn FnOnce() -> Updates + Send>;

/// Where a deferred value's updates come from.
pub(crate) enum Producer {
    /// One call, one update.
    Once(Once),
    /// Every item is an update. Built inside the worker thread.
    Generate(Generate),
}

/// A value that arrives later, produced on a worker thread.
///
/// ```
/// use serde_json::json;
/// use termtab_table::Deferred;
///
/// // Shown as "waiting" until the closure returns.
/// let d = Deferred::call(|| Ok(json!("done"))).initial("waiting");
/// # drop(d);
/// ```
pub struct Deferred {
    initial: Option<Value>,
    producer: Producer,
}

impl Deferred {
    /// A single update computed by `f`.
    pub fn call<F>(f: F) -> Self
    where
        F: FnOnce() -> std::result::Result<Value, BoxError> + Send + 'static,
    {
        Self {
            initial: None,
            producer: Producer::Once(Box::new(f)),
        }
    }

    /// One update per item of `updates`.
    pub fn iter<I>(updates: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: Send + 'static,
    {
        let it = updates.into_iter();
        Self::generate(move || it)
    }

    /// One update per item of the iterator `f` returns. `f` runs on the
    /// worker thread, so the iterator itself need not be `Send`.
    pub fn generate<F, I>(f: F) -> Self
    where
        F: FnOnce() -> I + Send + 'static,
        I: IntoIterator<Item = Value>,
        I::IntoIter: 'static,
    {
        Self::try_generate(move || f().into_iter().map(Ok))
    }

    /// Like [`generate`](Self::generate), but items may fail. The first
    /// failure ends the updates.
    pub fn try_generate<F, I>(f: F) -> Self
    where
        F: FnOnce() -> I + Send + 'static,
        I: IntoIterator<Item = std::result::Result<Value, BoxError>>,
        I::IntoIter: 'static,
    {
        Self {
            initial: None,
            producer: Producer::Generate(Box::new(move || -> Updates {
                Box::new(f().into_iter())
            })),
        }
    }

    /// Value shown until the first update arrives.
    #[must_use]
    pub fn initial(mut self, value: impl Into<Value>) -> Self {
        self.initial = Some(value.into());
        self
    }

    pub(crate) fn into_parts(self) -> (Option<Value>, Producer) {
        (self.initial, self.producer)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.producer {
            Producer::Once(_) => "call",
            Producer::Generate(_) => "generate",
        };
        f.debug_struct("Deferred")
            .field("initial", &self.initial)
            .field("producer", &kind)
            .finish()
    }
}

// ─── Input ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Input {
    Value(Value),
    Deferred(Deferred),
}

impl From<Value> for Input {
    fn from(v: Value) -> Self {
        Self::Value(v)
    }
}

impl From<Deferred> for Input {
    fn from(d: Deferred) -> Self {
        Self::Deferred(d)
    }
}

// ─── Row ─────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum Row {
    Mapping(Vec<(Key, Input)>),
    Sequence(Vec<Input>),
}

impl Row {
    /// An empty mapping row, filled with [`set`](Self::set) and
    /// [`defer`](Self::defer).
    #[must_use]
    pub const fn map() -> Self {
        Self::Mapping(Vec::new())
    }

    /// A positional row of plain values.
    pub fn seq<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Sequence(values.into_iter().map(|v| Input::Value(v.into())).collect())
    }

    /// Add an input. On a mapping the key is required; on a sequence it is
    /// ignored and the input is appended.
    #[must_use]
    pub fn with(mut self, key: impl Into<Key>, input: impl Into<Input>) -> Self {
        match &mut self {
            Self::Mapping(pairs) => pairs.push((key.into(), input.into())),
            Self::Sequence(items) => items.push(input.into()),
        }
        self
    }

    #[must_use]
    pub fn set(self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.with(key, Input::Value(value.into()))
    }

    #[must_use]
    pub fn defer(self, key: impl Into<Key>, deferred: Deferred) -> Self {
        self.with(key, Input::Deferred(deferred))
    }

    /// A row from a JSON object (mapping) or array (sequence).
    ///
    /// # Errors
    ///
    /// [`TabularError::Content`] for any other JSON value.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(map.into()),
            Value::Array(items) => Ok(Self::seq(items)),
            other => Err(TabularError::Content(format!(
                "a row must be a JSON object or array, got `{other}`"
            ))),
        }
    }

    /// A mapping row from any value that serializes to a JSON object,
    /// keeping field order.
    ///
    /// # Errors
    ///
    /// [`TabularError::Content`] if serialization fails or does not yield
    /// an object.
    pub fn from_serialize<T: Serialize + ?Sized>(record: &T) -> Result<Self> {
        match serde_json::to_value(record) {
            Ok(Value::Object(map)) => Ok(map.into()),
            Ok(other) => Err(TabularError::Content(format!(
                "record serialized to `{other}`, not an object"
            ))),
            Err(e) => Err(TabularError::Content(e.to_string())),
        }
    }

    /// Keys in order, tuple keys flattened. Used to infer columns.
    pub(crate) fn key_columns(&self) -> Vec<String> {
        match self {
            Self::Mapping(pairs) => pairs
                .iter()
                .flat_map(|(k, _)| k.columns().iter().cloned())
                .collect(),
            Self::Sequence(_) => Vec::new(),
        }
    }

    /// Pair every input with its key, matching sequences to `columns`.
    pub(crate) fn into_pairs(self, columns: &[String]) -> Result<Vec<(Key, Input)>> {
        match self {
            Self::Mapping(pairs) => Ok(pairs),
            Self::Sequence(items) => {
                if columns.is_empty() {
                    return Err(TabularError::MissingColumns);
                }
                if items.len() > columns.len() {
                    return Err(TabularError::TooManyValues {
                        expected: columns.len(),
                        got: items.len(),
                    });
                }
                Ok(columns
                    .iter()
                    .map(|c| Key::Column(c.clone()))
                    .zip(items)
                    .collect())
            }
        }
    }
}

impl From<Map<String, Value>> for Row {
    fn from(map: Map<String, Value>) -> Self {
        Self::Mapping(
            map.into_iter()
                .map(|(k, v)| (Key::Column(k), Input::Value(v)))
                .collect(),
        )
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
