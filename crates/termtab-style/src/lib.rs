//! # termtab-style — the style layer
//!
//! Declares how each column of a table looks, independently of the data
//! that fills it and of when that data arrives.
//!
//! # Model
//!
//! ```text
//! TableStyle
//!   ├── header_     ColumnStyle   (attributes + transform for the header line)
//!   ├── separator_  String        (between cells, default " ")
//!   ├── default_    ColumnStyle   (under every column's own style)
//!   ├── width_      usize         (maximum total width)
//!   └── <column>    ColumnStyle   (one per column name)
//!
//! ColumnStyle ──resolve──▶ Resolved ──span_style(value)──▶ SpanStyle
//! ```
//!
//! Attribute and color entries are [`StyleValue`]s: a constant, or a rule
//! that picks the style from the cell's value (exact lookup, regex lookup,
//! numeric interval). Rules are compiled once by [`ColumnStyle::resolve`]
//! so evaluating them per cell is cheap.
//!
//! Styles load from TOML or JSON:
//!
//! ```
//! use termtab_style::TableStyle;
//!
//! let style = TableStyle::from_toml_str(r#"
//!     separator_ = " | "
//!
//!     [header_]
//!     underline = true
//!
//!     [status]
//!     width = 9
//!     color = { lookup = { ok = "green", failed = "red" } }
//! "#).unwrap();
//!
//! assert!(style.has_header());
//! assert_eq!(style.separator(), " | ");
//! ```

pub mod aggregate;
pub mod column;
pub mod error;
pub mod table;
pub mod value;
pub mod width;

pub use aggregate::{Aggregate, AggregateFn};
pub use column::{ColumnStyle, Delayed, Resolved, Transform};
pub use error::{BoxError, StyleError};
pub use table::TableStyle;
pub use value::{Interval, StyleValue};
pub use width::{Marker, Width, WidthSpec};
