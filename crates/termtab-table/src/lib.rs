//! # termtab-table — data and behavior layers
//!
//! Streams structured records to a terminal as a table that can change
//! after it is drawn: rows are updated by id, values arrive late from
//! worker threads, and column widths grow to fit what has been seen.
//!
//! # Architecture
//!
//! ```text
//! Row ──write──▶ State (behind Arc<Mutex>)
//!                  ├── Content   stored rows, id index, cached cell texts
//!                  ├── Summary   aggregate lines beneath the rows
//!                  ├── layout    widths from header, rows, and summary
//!                  └── Screen    what update mode has drawn, for redraws
//!
//! Deferred ──worker thread──▶ State::apply_update ──▶ redraw
//! ```
//!
//! The style layer lives in `termtab-style`; this crate only asks it for a
//! [`Resolved`](termtab_style::Resolved) style per column.
//!
//! # Modes
//!
//! | Mode          | Rows appear | A changed row             | Summary          |
//! |---------------|-------------|---------------------------|------------------|
//! | `Update`      | immediately | redrawn in place          | after each write |
//! | `Incremental` | immediately | written again below       | at finish        |
//! | `Final`       | at finish   | only its last state shows | at finish        |

pub mod content;
pub mod error;
pub mod field;
pub mod layout;
pub mod mode;
pub mod row;
mod state;
pub mod summary;
pub mod tabular;
mod worker;

pub use error::{Result, TabularError};
pub use mode::{Mode, Styling};
pub use row::{Deferred, Input, Key, Row};
pub use tabular::{Tabular, TabularBuilder};
