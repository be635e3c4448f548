//! Errors raised while loading and resolving styles.

use std::path::PathBuf;

use termtab_term::ColorError;
use thiserror::Error;

/// Error type for user-supplied functions (transforms, aggregates, deferred
/// producers).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum StyleError {
    #[error(transparent)]
    UnknownColor(#[from] ColorError),

    #[error("invalid pattern `{pattern}` in re_lookup: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("unknown aggregate `{0}` (expected sum, min, max, count or counts)")]
    UnknownAggregate(String),

    #[error("invalid width for column `{column}`: {reason}")]
    InvalidWidth { column: String, reason: String },

    #[error("failed to parse TOML style: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON style: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read style file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StyleError>;
