//! Stored rows, indexed by id.
//!
//! Every row written to a table is kept here: its raw values (for styles,
//! aggregates and later merges) and its cell texts (for widths and
//! redraws). Writing a row whose id matches a stored one merges into it
//! instead of appending.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};
use termtab_style::Resolved;

use crate::error::{Result, TabularError};
use crate::field::cell_text;

/// The id of a row: one JSON-encoded scalar per id column.
pub type RowId = Vec<String>;

#[derive(Debug, Clone, Default)]
pub struct Record {
    pub values: Map<String, Value>,
    /// One display text per column, in column order.
    pub texts: Vec<String>,
    /// Column styles for this row alone, from a write with a style
    /// override.
    pub styles: Option<Arc<[Resolved]>>,
}

impl Record {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    /// The styles this row is drawn with.
    pub fn styles<'a>(&'a self, table: &'a [Resolved]) -> &'a [Resolved] {
        self.styles.as_deref().unwrap_or(table)
    }

    /// Recompute the cached cell texts.
    pub fn render(&mut self, columns: &[String], table: &[Resolved]) -> Result<()> {
        let texts = columns
            .iter()
            .zip(self.styles(table))
            .map(|(c, s)| cell_text(c, s, self.values.get(c)))
            .collect::<Result<_>>()?;
        self.texts = texts;
        Ok(())
    }
}

/// Which styles a written row is drawn with.
#[derive(Debug, Clone, Default)]
pub enum RowStyle {
    /// Whatever the stored row has; the table's styles for a new row.
    #[default]
    Keep,
    /// The table's styles.
    Table,
    /// Styles for this row only.
    Own(Arc<[Resolved]>),
}

/// Whether an upsert added a row or changed an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted(usize),
    Updated(usize),
}

impl Upsert {
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Inserted(i) | Self::Updated(i) => i,
        }
    }
}

/// A rendered row waiting to be stored. Nothing in [`Content`] changes
/// until it is committed.
#[derive(Debug)]
pub struct Staged {
    id: RowId,
    upsert: Upsert,
    record: Record,
}

impl Staged {
    #[must_use]
    pub const fn upsert(&self) -> Upsert {
        self.upsert
    }

    #[must_use]
    pub const fn record(&self) -> &Record {
        &self.record
    }
}

#[derive(Debug, Default)]
pub struct Content {
    records: Vec<Record>,
    index: HashMap<RowId, usize>,
}

impl Content {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> impl Iterator<Item = &Record> + Clone {
        self.records.iter()
    }

    /// The stored rows as they would be after committing `staged`.
    pub fn records_with<'a>(
        &'a self,
        staged: &'a Staged,
    ) -> impl Iterator<Item = &'a Record> + Clone {
        let (replaced, appended) = match staged.upsert {
            Upsert::Updated(idx) => (Some(idx), None),
            Upsert::Inserted(_) => (None, Some(&staged.record)),
        };
        self.records
            .iter()
            .enumerate()
            .map(move |(i, r)| if Some(i) == replaced { &staged.record } else { r })
            .chain(appended)
    }

    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&Record> {
        self.records.get(idx)
    }

    /// Index of the row with `id`.
    #[must_use]
    pub fn find(&self, id: &RowId) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Merge `values` into a copy of the row with the same id, or start a
    /// new row, and render its cell texts.
    ///
    /// # Errors
    ///
    /// [`TabularError::Content`] for a non-scalar id value, or a transform
    /// failure while rendering.
    pub fn stage(
        &self,
        ids: &[String],
        values: Map<String, Value>,
        style: RowStyle,
        columns: &[String],
        table: &[Resolved],
    ) -> Result<Staged> {
        let id = row_id(ids, &values)?;
        let (upsert, mut record) = match self.find(&id) {
            Some(idx) => {
                let mut record = self.records[idx].clone();
                record.values.extend(values);
                (Upsert::Updated(idx), record)
            }
            None => (
                Upsert::Inserted(self.records.len()),
                Record {
                    values,
                    ..Record::default()
                },
            ),
        };
        match style {
            RowStyle::Keep => {}
            RowStyle::Table => record.styles = None,
            RowStyle::Own(styles) => record.styles = Some(styles),
        }
        record.render(columns, table)?;
        Ok(Staged { id, upsert, record })
    }

    /// Store a staged row.
    pub fn commit(&mut self, staged: Staged) -> Upsert {
        let Staged { id, upsert, record } = staged;
        match upsert {
            Upsert::Updated(idx) => self.records[idx] = record,
            Upsert::Inserted(idx) => {
                self.records.push(record);
                self.index.insert(id, idx);
            }
        }
        upsert
    }

    /// Rebuild the id index for a new set of id columns. Rows whose new ids
    /// collide keep the first index.
    ///
    /// # Errors
    ///
    /// [`TabularError::Content`] if a stored row has a non-scalar id value.
    pub fn reindex(&mut self, ids: &[String]) -> Result<()> {
        let mut index = HashMap::with_capacity(self.records.len());
        for (i, record) in self.records.iter().enumerate() {
            index.entry(row_id(ids, &record.values)?).or_insert(i);
        }
        self.index = index;
        Ok(())
    }
}

/// The id of a row from its values. Missing id columns count as `null`.
///
/// # Errors
///
/// [`TabularError::Content`] when an id value is a list or an object; those
/// cannot identify a row.
pub fn row_id(ids: &[String], values: &Map<String, Value>) -> Result<RowId> {
    ids.iter()
        .map(|c| match values.get(c) {
            None => Ok("null".to_owned()),
            Some(v @ (Value::Array(_) | Value::Object(_))) => Err(TabularError::Content(format!(
                "id column `{c}` holds `{v}`, which cannot identify a row"
            ))),
            Some(v) => Ok(v.to_string()),
        })
        .collect()
}
