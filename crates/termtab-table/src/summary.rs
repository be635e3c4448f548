//! Summary lines beneath the table.
//!
//! Each column with an `aggregate` contributes one value per summary line.
//! An aggregate that returns a list spreads over that many lines; columns
//! without an aggregate, or whose list ran out, are blank on a line.

use serde_json::Value;
use termtab_style::Resolved;

use crate::content::Record;
use crate::error::{Result, TabularError};
use crate::field::{present, value_text};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Summary {
    /// `lines[i][col]`: the value of column `col` on summary line `i`.
    lines: Vec<Vec<Option<Value>>>,
}

impl Summary {
    /// Run every column's aggregate over `records`.
    ///
    /// # Errors
    ///
    /// [`TabularError::Aggregate`] naming the first column whose aggregate
    /// failed.
    pub fn compute<'a, I>(columns: &[String], styles: &[Resolved], records: I) -> Result<Self>
    where
        I: Iterator<Item = &'a Record> + Clone,
    {
        let mut per_column: Vec<Vec<Value>> = Vec::with_capacity(columns.len());
        for (column, style) in columns.iter().zip(styles) {
            let Some(aggregate) = &style.aggregate else {
                per_column.push(Vec::new());
                continue;
            };
            let values: Vec<Value> = records
                .clone()
                .filter_map(|r| present(r.get(column)).cloned())
                .collect();
            let result = aggregate
                .apply(&values)
                .map_err(|source| TabularError::Aggregate {
                    column: column.clone(),
                    source,
                })?;
            per_column.push(match result {
                Value::Array(items) => items,
                other => vec![other],
            });
        }

        let height = per_column.iter().map(Vec::len).max().unwrap_or(0);
        let lines = (0..height)
            .map(|i| per_column.iter().map(|vals| vals.get(i).cloned()).collect())
            .collect();
        Ok(Self { lines })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &[Option<Value>]> {
        self.lines.iter().map(Vec::as_slice)
    }

    /// Display texts, line by line. Summary values are not transformed.
    #[must_use]
    pub fn texts(&self) -> Vec<Vec<String>> {
        self.lines
            .iter()
            .map(|line| {
                line.iter()
                    .map(|v| v.as_ref().map(value_text).unwrap_or_default())
                    .collect()
            })
            .collect()
    }
}
