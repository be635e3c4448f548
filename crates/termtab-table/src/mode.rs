//! Behavior modes and styling choice.

use std::fmt;
use std::str::FromStr;

/// When rows reach the output, and whether they are redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Mode {
    /// [`Update`](Self::Update) on a terminal, [`Final`](Self::Final)
    /// otherwise.
    #[default]
    Auto,
    /// Rows stream as they are written; changed rows are redrawn in place.
    Update,
    /// Rows stream; a changed row is written again on a new line.
    Incremental,
    /// Nothing is written until the table is finished.
    Final,
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "update" => Ok(Self::Update),
            "incremental" => Ok(Self::Incremental),
            "final" => Ok(Self::Final),
            other => Err(format!(
                "unknown mode `{other}` (expected auto, update, incremental or final)"
            )),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Update => "update",
            Self::Incremental => "incremental",
            Self::Final => "final",
        })
    }
}

/// Whether escape codes for colors and attributes are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Styling {
    /// Only when writing to a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl FromStr for Styling {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            other => Err(format!(
                "unknown color choice `{other}` (expected auto, always or never)"
            )),
        }
    }
}

impl Mode {
    /// The concrete mode for an output that is (or is not) a terminal.
    #[must_use]
    pub const fn resolve(self, tty: bool) -> Self {
        match self {
            Self::Auto if tty => Self::Update,
            Self::Auto => Self::Final,
            other => other,
        }
    }
}

impl Styling {
    #[must_use]
    pub const fn enabled(self, tty: bool) -> bool {
        match self {
            Self::Auto => tty,
            Self::Always => true,
            Self::Never => false,
        }
    }
}
