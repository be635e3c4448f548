//! Errors raised while writing rows.

use std::io;

use termtab_style::{BoxError, StyleError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("no columns are known yet; give columns or write a mapping row first")]
    MissingColumns,

    #[error("row has {got} values but the table has {expected} columns")]
    TooManyValues { expected: usize, got: usize },

    #[error("unknown column `{0}`")]
    UnknownColumn(String),

    #[error("invalid row content: {0}")]
    Content(String),

    #[error("id column `{0}` cannot be deferred or delayed")]
    DeferredId(String),

    #[error("style function for column `{column}` failed: {source}")]
    StyleFunction {
        column: String,
        #[source]
        source: BoxError,
    },

    #[error("aggregate for column `{column}` failed: {source}")]
    Aggregate {
        column: String,
        #[source]
        source: BoxError,
    },

    #[error("deferred value failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Style(#[from] StyleError),

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("table state lock poisoned by a panicking writer")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, TabularError>;
