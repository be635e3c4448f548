//! The table writer.
//!
//! [`Tabular`] ties the layers together: rows come in through
//! [`write`](Tabular::write), the style decides how they look, and the mode
//! decides when they reach the output. Deferred values run on worker
//! threads that share the writer's state behind a mutex.
//!
//! ```
//! use serde_json::json;
//! use termtab_table::{Mode, Row, Tabular};
//! use termtab_term::CaptureBuffer;
//!
//! let capture = CaptureBuffer::new();
//! let mut table = Tabular::builder()
//!     .columns(["name", "status"])
//!     .mode(Mode::Final)
//!     .writer(capture.clone())
//!     .build();
//! table.write(Row::from_json(json!({"name": "foo", "status": "ok"})).unwrap()).unwrap();
//! table.write(Row::seq(["bar", "failed"])).unwrap();
//! table.finish().unwrap();
//!
//! assert_eq!(capture.contents(), "foo ok    \nbar failed\n");
//! ```

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use serde_json::{Map, Value};
use termtab_style::TableStyle;
use termtab_term::terminal;
use tracing::warn;

use crate::error::{Result, TabularError};
use crate::mode::{Mode, Styling};
use crate::row::Row;
use crate::state::State;
use crate::worker::{self, Worker};

pub struct Tabular {
    state: Arc<Mutex<State>>,
    workers: Vec<Worker>,
    finished: bool,
}

impl Tabular {
    #[must_use]
    pub fn builder() -> TabularBuilder {
        TabularBuilder::default()
    }

    /// A table writing to stdout with the given columns and defaults
    /// everywhere else.
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder().columns(columns).build()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| TabularError::Poisoned)
    }

    /// Write a row: append it, or update the stored row with the same id.
    ///
    /// # Errors
    ///
    /// Row shape errors ([`TabularError::MissingColumns`],
    /// [`TabularError::TooManyValues`], [`TabularError::UnknownColumn`]),
    /// bad ids, style errors, transform and aggregate failures, and output
    /// errors.
    pub fn write(&mut self, row: impl Into<Row>) -> Result<()> {
        self.write_inner(row.into(), None)
    }

    /// Write a row with a style override. The override is merged into the
    /// table's style and stays in effect for later rows.
    ///
    /// # Errors
    ///
    /// As [`write`](Self::write).
    pub fn write_with_style(&mut self, row: impl Into<Row>, style: &TableStyle) -> Result<()> {
        self.write_inner(row.into(), Some(style))
    }

    /// Write any record that serializes to a JSON object.
    ///
    /// # Errors
    ///
    /// [`TabularError::Content`] if the record is not an object, otherwise
    /// as [`write`](Self::write).
    pub fn write_record<T: Serialize + ?Sized>(&mut self, record: &T) -> Result<()> {
        self.write_inner(Row::from_serialize(record)?, None)
    }

    fn write_inner(&mut self, row: Row, style: Option<&TableStyle>) -> Result<()> {
        let jobs = self.lock()?.write(row, style)?;
        for job in jobs {
            let handle = worker::spawn(&self.state, job)?;
            self.workers.push(handle);
        }
        Ok(())
    }

    /// Identify rows by `ids` instead of the first column.
    ///
    /// # Errors
    ///
    /// [`TabularError::UnknownColumn`] for a column the table does not
    /// have, [`TabularError::Content`] if a stored row has a list or object
    /// in one of the new id columns.
    pub fn set_ids<I, S>(&mut self, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock()?.set_ids(ids.into_iter().map(Into::into).collect())
    }

    /// Wait for every deferred value to arrive.
    ///
    /// # Errors
    ///
    /// The first worker failure. Every failure is logged.
    pub fn wait(&mut self) -> Result<()> {
        let mut first = None;
        for handle in self.workers.drain(..) {
            if let Err(e) = worker::join(handle) {
                warn!(error = %e, "deferred value failed");
                first.get_or_insert(e);
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Wait for the workers, then write whatever the mode held back.
    /// Later calls do nothing.
    ///
    /// # Errors
    ///
    /// A worker failure or an output error. The table is finished either
    /// way.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let waited = self.wait();
        self.lock()?.finish()?;
        waited
    }

    /// A snapshot of the stored row values, in display order.
    ///
    /// # Errors
    ///
    /// [`TabularError::Poisoned`] if a worker panicked while drawing.
    pub fn rows(&self) -> Result<Vec<Map<String, Value>>> {
        Ok(self.lock()?.rows())
    }

    /// The table's columns (empty until given or inferred).
    ///
    /// # Errors
    ///
    /// [`TabularError::Poisoned`] if a worker panicked while drawing.
    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(self.lock()?.columns().to_vec())
    }
}

impl Drop for Tabular {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!(error = %e, "table finished with an error");
        }
    }
}

// ─── Builder ─────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct TabularBuilder {
    columns: Vec<String>,
    labels: HashMap<String, String>,
    style: TableStyle,
    ids: Option<Vec<String>>,
    mode: Mode,
    styling: Styling,
    writer: Option<Box<dyn Write + Send>>,
    terminal_height: Option<usize>,
}

impl TabularBuilder {
    /// Column names, in display order. Without them, columns are taken
    /// from the first mapping row.
    #[must_use]
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Columns with header labels: `(name, label)` pairs.
    #[must_use]
    pub fn labeled_columns<I, N, L>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = (N, L)>,
        N: Into<String>,
        L: Into<String>,
    {
        self.columns.clear();
        for (name, label) in columns {
            let name = name.into();
            self.labels.insert(name.clone(), label.into());
            self.columns.push(name);
        }
        self
    }

    #[must_use]
    pub fn style(mut self, style: TableStyle) -> Self {
        self.style = style;
        self
    }

    /// Id columns. Defaults to the first column.
    #[must_use]
    pub fn ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ids = Some(ids.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub const fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub const fn styling(mut self, styling: Styling) -> Self {
        self.styling = styling;
        self
    }

    /// Write somewhere other than stdout. Such an output is never treated
    /// as a terminal: [`Mode::Auto`] means [`Mode::Final`] and
    /// [`Styling::Auto`] means no styling.
    #[must_use]
    pub fn writer(mut self, writer: impl Write + Send + 'static) -> Self {
        self.writer = Some(Box::new(writer));
        self
    }

    /// Lines the cursor can travel up in update mode. Taken from the
    /// terminal when writing to a tty; unlimited otherwise.
    #[must_use]
    pub const fn terminal_height(mut self, lines: usize) -> Self {
        self.terminal_height = Some(lines);
        self
    }

    #[must_use]
    pub fn build(self) -> Tabular {
        let tty = self.writer.is_none() && terminal::stdout_is_tty();
        let height = self
            .terminal_height
            .or_else(|| tty.then(terminal::height).flatten().map(usize::from));
        let out = self
            .writer
            .unwrap_or_else(|| Box::new(io::stdout()) as Box<dyn Write + Send>);
        let state = State::new(
            self.columns,
            self.labels,
            self.ids,
            self.style,
            self.mode.resolve(tty),
            self.styling.enabled(tty),
            height,
            out,
        );
        Tabular {
            state: Arc::new(Mutex::new(state)),
            workers: Vec::new(),
            finished: false,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Deferred;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::mpsc;
    use termtab_style::{Aggregate, ColumnStyle, Delayed, StyleError, StyleValue};
    use termtab_term::CaptureBuffer;

    fn table(mode: Mode) -> (TabularBuilder, CaptureBuffer) {
        let capture = CaptureBuffer::new();
        let builder = Tabular::builder().mode(mode).writer(capture.clone());
        (builder, capture)
    }

    fn row(v: Value) -> Row {
        Row::from_json(v).unwrap()
    }

    /// Output with escape sequences and carriage returns removed, by line.
    fn plain_lines(s: &str) -> Vec<String> {
        let mut out = String::new();
        let mut chars = s.chars();
        while let Some(c) = chars.next() {
            match c {
                '\x1b' => {
                    // CSI: '[' then parameters up to a final byte in @..~.
                    chars.next();
                    for c in chars.by_ref() {
                        if ('@'..='~').contains(&c) {
                            break;
                        }
                    }
                }
                '\r' => {}
                c => out.push(c),
            }
        }
        out.lines().map(str::to_owned).collect()
    }

    fn header_style() -> TableStyle {
        TableStyle::new().with_header(ColumnStyle::new())
    }

    // ── Final mode ──────────────────────────────────────────────────────

    #[test]
    fn final_mode_writes_on_finish() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.write(row(json!({"name": "foo", "status": "ok"}))).unwrap();
        assert_eq!(cap.contents(), "");
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo ok\n");
    }

    #[test]
    fn final_mode_shows_last_state_only() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.write(row(json!({"name": "foo", "status": "BAD"}))).unwrap();
        t.write(row(json!({"name": "bar", "status": "OK"}))).unwrap();
        t.write(row(json!({"name": "foo", "status": "OK"}))).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo OK \nbar OK \n");
    }

    #[test]
    fn finish_is_idempotent_and_drop_finishes() {
        let (b, cap) = table(Mode::Final);
        {
            let mut t = b.columns(["name"]).build();
            t.write(Row::seq(["foo"])).unwrap();
            t.finish().unwrap();
            t.finish().unwrap();
        }
        assert_eq!(cap.contents(), "foo\n");

        let (b, cap) = table(Mode::Final);
        {
            let mut t = b.columns(["name"]).build();
            t.write(Row::seq(["bar"])).unwrap();
        }
        assert_eq!(cap.contents(), "bar\n");
    }

    #[test]
    fn custom_writer_defaults_to_final_and_plain() {
        let capture = CaptureBuffer::new();
        let style = TableStyle::new().with_column("status", ColumnStyle::new().color("green"));
        let mut t = Tabular::builder()
            .columns(["name", "status"])
            .style(style)
            .writer(capture.clone())
            .build();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        assert_eq!(capture.contents(), "");
        t.finish().unwrap();
        assert_eq!(capture.contents(), "foo ok\n");
    }

    // ── Rows ────────────────────────────────────────────────────────────

    #[test]
    fn sequence_and_record_forms() {
        #[derive(Serialize)]
        struct Record {
            name: String,
            status: String,
        }

        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        t.write_record(&Record {
            name: "bar".into(),
            status: "failed".into(),
        })
        .unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo ok    \nbar failed\n");
    }

    #[test]
    fn columns_inferred_from_first_mapping() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.build();
        t.write(row(json!({"name": "foo", "status": "ok", "n": 1}))).unwrap();
        assert_eq!(t.columns().unwrap(), vec!["name", "status", "n"]);
        t.write(Row::seq(["bar", "x"])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo ok 1\nbar x   \n");
    }

    #[test]
    fn missing_values_use_missing_text() {
        let style = TableStyle::new().with_default(ColumnStyle::new().missing("-"));
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).style(style).build();
        t.write(row(json!({"name": "foo"}))).unwrap();
        t.write(row(json!({"name": "bar", "status": null}))).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo -\nbar -\n");
    }

    #[test]
    fn list_values_render_as_lists() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "tags"]).build();
        t.write(row(json!({"name": "foo", "tags": ["a", "b"]}))).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo [\"a\", \"b\"]\n");
    }

    #[test]
    fn rows_snapshot() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.write(row(json!({"name": "foo", "status": "BAD"}))).unwrap();
        t.write(row(json!({"name": "foo", "status": "OK"}))).unwrap();
        let rows = t.rows().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("status"), Some(&json!("OK")));
    }

    // ── Errors ──────────────────────────────────────────────────────────

    #[test]
    fn sequence_without_columns_is_error() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.build();
        assert!(matches!(
            t.write(Row::seq(["foo"])),
            Err(TabularError::MissingColumns)
        ));
    }

    #[test]
    fn too_many_values_is_error() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name"]).build();
        assert!(matches!(
            t.write(Row::seq(["foo", "bar"])),
            Err(TabularError::TooManyValues { expected: 1, got: 2 })
        ));
    }

    #[test]
    fn unknown_column_is_error() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name"]).build();
        let err = t.write(row(json!({"name": "foo", "other": 1}))).unwrap_err();
        assert!(matches!(err, TabularError::UnknownColumn(ref c) if c == "other"));
    }

    #[test]
    fn list_id_is_content_error() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        let err = t.write(row(json!({"name": [0, 1], "status": "x"}))).unwrap_err();
        assert!(matches!(err, TabularError::Content(_)));
    }

    #[test]
    fn deferred_id_is_error() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        let err = t
            .write(Row::map().defer("name", Deferred::call(|| Ok(json!("foo")))))
            .unwrap_err();
        assert!(matches!(err, TabularError::DeferredId(ref c) if c == "name"));
    }

    #[test]
    fn auto_false_without_width_is_error() {
        let style: TableStyle = TableStyle::from_json_str(
            r#"{"header_": {}, "name": {"width": 4}, "status": {"width": {"auto": false}}}"#,
        )
        .unwrap();
        let (b, _cap) = table(Mode::Final);
        let mut t = b.style(style).build();
        let err = t.write(row(json!({"name": "foo", "status": "U"}))).unwrap_err();
        assert!(matches!(
            err,
            TabularError::Style(StyleError::InvalidWidth { .. })
        ));
    }

    #[test]
    fn failed_aggregate_keeps_previous_rows() {
        let one_only = Aggregate::custom(|xs| {
            if xs.len() > 1 {
                Err("too many".into())
            } else {
                Ok(json!(xs.len()))
            }
        });
        let style =
            TableStyle::new().with_column("status", ColumnStyle::new().aggregate(one_only));
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).style(style).build();
        t.write(Row::seq(["foo", "a"])).unwrap();
        let err = t.write(Row::seq(["bar", "b"])).unwrap_err();
        assert!(matches!(err, TabularError::Aggregate { ref column, .. } if column == "status"));
        assert_eq!(t.rows().unwrap().len(), 1);
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo a\n    1\n");
    }

    #[test]
    fn rejected_first_row_infers_no_columns() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.build();
        let err = t.write(row(json!({"name": [0, 1], "status": "x"}))).unwrap_err();
        assert!(matches!(err, TabularError::Content(_)));
        assert!(t.columns().unwrap().is_empty());
        assert!(matches!(
            t.write(Row::seq(["a"])),
            Err(TabularError::MissingColumns)
        ));
    }

    #[test]
    fn transform_failure_is_style_function_error() {
        let style = TableStyle::new().with_column(
            "n",
            ColumnStyle::new().transform(|v| Ok(json!(v.as_i64().ok_or("not a number")? * 2))),
        );
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "n"]).style(style).build();
        t.write(Row::seq([json!("foo"), json!(2)])).unwrap();
        let err = t.write(Row::seq([json!("bar"), json!("x")])).unwrap_err();
        assert!(matches!(err, TabularError::StyleFunction { ref column, .. } if column == "n"));
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo 4\n");
    }

    // ── Ids ─────────────────────────────────────────────────────────────

    #[test]
    fn multi_column_ids() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "kind", "n"]).ids(["name", "kind"]).build();
        t.write(Row::seq([json!("foo"), json!("a"), json!(1)])).unwrap();
        t.write(Row::seq([json!("foo"), json!("b"), json!(2)])).unwrap();
        t.write(Row::seq([json!("foo"), json!("a"), json!(3)])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo a 3\nfoo b 2\n");
    }

    #[test]
    fn set_ids_changes_identity() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.set_ids(["status"]).unwrap();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        t.write(Row::seq(["bar", "ok"])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "bar ok\n");
    }

    #[test]
    fn set_ids_rejects_unknown_column() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name"]).build();
        assert!(matches!(
            t.set_ids(["nope"]),
            Err(TabularError::UnknownColumn(_))
        ));
    }

    // ── Header and style ────────────────────────────────────────────────

    #[test]
    fn header_widens_columns() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).style(header_style()).build();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "name status\nfoo  ok    \n");
    }

    #[test]
    fn labeled_columns_and_header_transform() {
        let style = TableStyle::new().with_header(ColumnStyle::new().transform(|v| {
            Ok(json!(v.as_str().unwrap_or_default().to_uppercase()))
        }));
        let (b, cap) = table(Mode::Final);
        let mut t = b
            .labeled_columns([("name", "Name"), ("status", "State")])
            .style(style)
            .build();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "NAME STATE\nfoo  ok   \n");
    }

    #[test]
    fn styled_cells_and_header() {
        let style = TableStyle::new()
            .with_header(ColumnStyle::new().bold(true))
            .with_column(
                "status",
                ColumnStyle::new().color(StyleValue::lookup([("ok", "green".to_owned())])),
            );
        let (b, cap) = table(Mode::Final);
        let mut t = b
            .columns(["name", "status"])
            .style(style)
            .styling(Styling::Always)
            .build();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        t.write(Row::seq(["bar", "bad"])).unwrap();
        t.finish().unwrap();
        assert_eq!(
            cap.contents(),
            concat!(
                "\x1b[1mname\x1b[0m \x1b[1mstatus\x1b[0m\n",
                "foo  \x1b[32mok\x1b[0m    \n",
                "bar  bad   \n",
            )
        );
    }

    #[test]
    fn write_with_style_overrides() {
        let (b, cap) = table(Mode::Final);
        let mut t = b
            .columns(["name", "status"])
            .styling(Styling::Always)
            .build();
        let over = TableStyle::new().with_column("status", ColumnStyle::new().color("red"));
        t.write_with_style(Row::seq(["foo", "ok"]), &over).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo \x1b[31mok\x1b[0m\n");
    }

    #[test]
    fn style_override_applies_to_its_row_only() {
        let (b, cap) = table(Mode::Final);
        let mut t = b
            .columns(["name", "status"])
            .styling(Styling::Always)
            .build();
        let over = TableStyle::new().with_column("status", ColumnStyle::new().color("red"));
        t.write_with_style(Row::seq(["foo", "ok"]), &over).unwrap();
        t.write(Row::seq(["bar", "ok"])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo \x1b[31mok\x1b[0m\nbar ok\n");
    }

    #[test]
    fn style_override_survives_repaint_until_rewritten() {
        let (b, cap) = table(Mode::Update);
        let mut t = b
            .columns(["name", "status"])
            .styling(Styling::Always)
            .build();
        let over = TableStyle::new().with_column("status", ColumnStyle::new().color("red"));
        t.write_with_style(Row::seq(["foo", "ok"]), &over).unwrap();
        t.write(Row::seq(["bar", "failed"])).unwrap();
        assert_eq!(
            cap.contents(),
            "foo \x1b[31mok\x1b[0m\n\x1b[A\x1b[Jfoo \x1b[31mok\x1b[0m    \nbar failed\n"
        );
        cap.clear();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        assert_eq!(cap.contents(), "\x1b[2A\r\x1b[2Kfoo ok    \n\x1b[B");
    }

    #[test]
    fn width_limit_applies_to_header() {
        let style = header_style().with_width(10);
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).style(style).build();
        t.write(Row::seq(["foo", "a long status"])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "name st...\nfoo  a ...\n");
    }

    #[test]
    fn separator_and_alignment() {
        let style = TableStyle::new()
            .with_separator(" | ")
            .with_column("n", ColumnStyle::new().align(termtab_term::Align::Right));
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "n"]).style(style).build();
        t.write(Row::seq([json!("foo"), json!(5)])).unwrap();
        t.write(Row::seq([json!("bar"), json!(100)])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo |   5\nbar | 100\n");
    }

    #[test]
    fn total_width_limit_truncates() {
        let style = TableStyle::new().with_width(10);
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["a", "b"]).style(style).build();
        t.write(Row::seq(["abcdefghij", "xyz"])).unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "abc... xyz\n");
    }

    // ── Update mode ─────────────────────────────────────────────────────

    #[test]
    fn update_mode_streams_rows() {
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "status"]).build();
        t.write(Row::seq(["foo", "thinking"])).unwrap();
        assert_eq!(cap.contents(), "foo thinking\n");
        t.write(Row::seq(["bar", "ok"])).unwrap();
        assert_eq!(cap.contents(), "foo thinking\nbar ok      \n");
    }

    #[test]
    fn update_mode_rewrites_in_place() {
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "status"]).build();
        t.write(Row::seq(["foo", "BAD"])).unwrap();
        t.write(Row::seq(["bar", "OK"])).unwrap();
        t.write(Row::seq(["foo", "OK!"])).unwrap();
        assert_eq!(
            cap.contents(),
            "foo BAD\nbar OK \n\x1b[2A\r\x1b[2Kfoo OK!\n\x1b[B"
        );
    }

    #[test]
    fn update_mode_repaints_on_width_change() {
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "status"]).build();
        t.write(Row::seq(["foo", "ok"])).unwrap();
        t.write(Row::seq(["bar", "failed"])).unwrap();
        assert_eq!(
            cap.contents(),
            "foo ok\n\x1b[A\x1b[Jfoo ok    \nbar failed\n"
        );
    }

    #[test]
    fn update_mode_appends_rows_out_of_reach() {
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "n"]).terminal_height(3).build();
        for (name, n) in [("a", 1), ("b", 2), ("c", 3)] {
            t.write(Row::seq([json!(name), json!(n)])).unwrap();
        }
        t.write(Row::seq([json!("a"), json!(9)])).unwrap();
        assert_eq!(cap.contents(), "a 1\nb 2\nc 3\na 9\n");
        cap.clear();
        t.write(Row::seq([json!("c"), json!(7)])).unwrap();
        assert_eq!(cap.contents(), "\x1b[2A\r\x1b[2Kc 7\n\x1b[B");
    }

    #[test]
    fn update_mode_repaints_below_when_too_tall() {
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "n"]).terminal_height(2).build();
        t.write(Row::seq([json!("a"), json!(1)])).unwrap();
        t.write(Row::seq([json!("b"), json!(2)])).unwrap();
        t.write(Row::seq([json!("c"), json!("333")])).unwrap();
        assert_eq!(cap.contents(), "a 1\nb 2\na 1  \nb 2  \nc 333\n");
    }

    #[test]
    fn update_mode_summary() {
        let nbad = Aggregate::custom(|xs| {
            let n = xs.iter().filter(|x| x.as_str() == Some("BAD")).count();
            Ok(json!(format!("{n} failed")))
        });
        let style = header_style()
            .with_column("status", ColumnStyle::new().aggregate(nbad))
            .with_column("num", ColumnStyle::new().aggregate(Aggregate::Sum));
        let (b, cap) = table(Mode::Update);
        let mut t = b.style(style).build();
        t.write(row(json!({"name": "foo", "status": "BAD", "num": 2}))).unwrap();
        t.write(row(json!({"name": "bar", "status": "BAD", "num": 3}))).unwrap();
        t.write(row(json!({"name": "baz", "status": "BAD", "num": 4}))).unwrap();
        t.write(row(json!({"name": "foo", "status": "OK", "num": 10}))).unwrap();

        let lines = plain_lines(&cap.contents());
        for expected in [
            "     1 failed 2  ",
            "     2 failed 5  ",
            "     3 failed 9  ",
            "     2 failed 17 ",
            "foo  OK       10 ",
        ] {
            assert!(lines.iter().any(|l| l == expected), "missing {expected:?} in {lines:?}");
        }
    }

    #[test]
    fn update_mode_shrinking_summary() {
        let style = TableStyle::new()
            .with_column("status", ColumnStyle::new().aggregate(Aggregate::Counts));
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "status"]).style(style).build();
        t.write(Row::seq(["foo", "unknown"])).unwrap();
        t.write(Row::seq(["bar", "ok"])).unwrap();
        cap.clear();
        // Dropping the only "unknown" takes the summary from two lines to one.
        t.write(Row::seq(["foo", "ok"])).unwrap();
        assert_eq!(
            cap.contents(),
            concat!(
                "\x1b[4A\r\x1b[2Kfoo ok        \n\x1b[3B",
                "\x1b[2A\x1b[J",
                "    ok: 2     \n",
            )
        );
    }

    // ── Incremental mode ────────────────────────────────────────────────

    #[test]
    fn incremental_appends_updates() {
        let (b, cap) = table(Mode::Incremental);
        let mut t = b.columns(["name", "status"]).style(header_style()).build();
        t.write(Row::seq(["foo", "BAD"])).unwrap();
        t.write(Row::seq(["bar", "OK"])).unwrap();
        t.write(Row::seq(["foo", "OK"])).unwrap();
        assert_eq!(
            cap.contents(),
            "name status\nfoo  BAD   \nbar  OK    \nfoo  OK    \n"
        );
    }

    #[test]
    fn incremental_summary_at_finish() {
        let style = TableStyle::new().with_column("n", ColumnStyle::new().aggregate(Aggregate::Sum));
        let (b, cap) = table(Mode::Incremental);
        let mut t = b.columns(["name", "n"]).style(style).build();
        t.write(Row::seq([json!("a"), json!(1)])).unwrap();
        t.write(Row::seq([json!("b"), json!(2)])).unwrap();
        assert_eq!(cap.contents(), "a 1\nb 2\n");
        t.finish().unwrap();
        assert_eq!(cap.contents(), "a 1\nb 2\n  3\n");
    }

    // ── Deferred values ─────────────────────────────────────────────────

    #[test]
    fn wait_without_workers_is_noop() {
        let (b, _cap) = table(Mode::Update);
        let mut t = b.columns(["name"]).build();
        t.write(Row::seq(["foo"])).unwrap();
        t.wait().unwrap();
    }

    #[test]
    fn deferred_call_values() {
        let (tx0, rx0) = mpsc::channel::<()>();
        let (tx1, rx1) = mpsc::channel::<()>();
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "status"]).build();
        t.write(Row::map().set("name", "foo").defer(
            "status",
            Deferred::call(move || {
                rx0.recv()?;
                Ok(json!("done"))
            })
            .initial("thinking"),
        ))
        .unwrap();
        t.write(Row::seq(["bar", "ok"])).unwrap();
        t.write(Row::map().set("name", "baz").defer(
            "status",
            Deferred::call(move || {
                rx1.recv()?;
                Ok(json!("over"))
            }),
        ))
        .unwrap();
        assert_eq!(cap.contents(), "foo thinking\nbar ok      \nbaz         \n");

        tx0.send(()).unwrap();
        tx1.send(()).unwrap();
        t.wait().unwrap();
        let lines = plain_lines(&cap.contents());
        assert!(lines.iter().any(|l| l == "foo done    "));
        assert!(lines.iter().any(|l| l == "baz over    "));
    }

    #[test]
    fn transform_skips_missing_initial() {
        let style = TableStyle::new().with_column(
            "status",
            ColumnStyle::new().transform(|v| Ok(json!(v.as_i64().ok_or("not a number")? + 2))),
        );
        let (tx, rx) = mpsc::channel::<()>();
        let (b, cap) = table(Mode::Update);
        let mut t = b.columns(["name", "status"]).style(style).build();
        t.write(Row::map().set("name", "foo").defer(
            "status",
            Deferred::call(move || {
                rx.recv()?;
                Ok(json!(3))
            }),
        ))
        .unwrap();
        assert_eq!(cap.contents(), "foo \n");
        tx.send(()).unwrap();
        t.wait().unwrap();
        assert_eq!(plain_lines(&cap.contents()).last().unwrap(), "foo 5");
    }

    #[test]
    fn deferred_multi_column_key() {
        let (tx, rx) = mpsc::channel::<()>();
        let (b, cap) = table(Mode::Update);
        let mut t = b.build();
        t.write(Row::map().set("name", "foo").defer(
            ["status", "path"],
            Deferred::call(move || {
                rx.recv()?;
                Ok(json!(["done", "/tmp/a"]))
            })
            .initial("..."),
        ))
        .unwrap();
        t.write(row(json!({"name": "bar", "status": "ok", "path": "na"})))
            .unwrap();
        assert_eq!(cap.contents(), "foo ... ...\nbar ok  na \n");
        tx.send(()).unwrap();
        t.wait().unwrap();
        assert!(plain_lines(&cap.contents()).iter().any(|l| l == "foo done /tmp/a"));
    }

    #[test]
    fn deferred_generator_partial_updates() {
        let (tx, rx) = mpsc::channel::<Value>();
        let (b, cap) = table(Mode::Update);
        let mut t = b.build();
        t.write(Row::map().set("name", "foo").defer(
            ["status", "path"],
            Deferred::generate(move || rx.into_iter()).initial("..."),
        ))
        .unwrap();
        t.write(row(json!({"name": "bar", "status": "ok", "path": "na"})))
            .unwrap();
        assert_eq!(cap.contents(), "foo ... ...\nbar ok  na \n");

        tx.send(json!({"status": "working"})).unwrap();
        tx.send(json!({"path": "/tmp/a"})).unwrap();
        tx.send(json!({"path": "/tmp/b", "status": "done"})).unwrap();
        drop(tx);
        t.wait().unwrap();

        let lines = plain_lines(&cap.contents());
        for expected in ["foo working ...", "foo working /tmp/a", "foo done    /tmp/b"] {
            assert!(lines.iter().any(|l| l == expected), "missing {expected:?} in {lines:?}");
        }
    }

    #[test]
    fn deferred_iterator_values() {
        let (b, cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.write(Row::map().set("name", "foo").defer(
            "status",
            Deferred::iter([json!("update"), json!("finished")]).initial("waiting"),
        ))
        .unwrap();
        t.finish().unwrap();
        assert_eq!(cap.contents(), "foo finished\n");
    }

    #[test]
    fn delayed_columns_arrive_by_group() {
        let style = TableStyle::new()
            .with_column("paired0", ColumnStyle::new().delayed(Delayed::Group("pair".into())))
            .with_column("paired1", ColumnStyle::new().delayed(Delayed::Group("pair".into())))
            .with_column("solo", ColumnStyle::new().delayed(Delayed::Flag(true)));
        let (b, cap) = table(Mode::Update);
        let mut t = b
            .columns(["name", "paired0", "paired1", "solo"])
            .style(style)
            .build();
        t.write(Row::seq([json!("foo"), json!(1), json!(2), json!(3)]))
            .unwrap();
        t.wait().unwrap();

        let lines = plain_lines(&cap.contents());
        assert_eq!(lines.len(), 3, "{lines:?}");
        assert_eq!(lines[0], "foo   ");
        assert!(lines[1] == "foo 1 2 " || lines[1] == "foo   3", "{lines:?}");
        assert_eq!(lines[2], "foo 1 2 3");
    }

    #[test]
    fn delayed_id_is_error() {
        let style =
            TableStyle::new().with_column("name", ColumnStyle::new().delayed(Delayed::Flag(true)));
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name"]).style(style).build();
        assert!(matches!(
            t.write(Row::seq(["foo"])),
            Err(TabularError::DeferredId(_))
        ));
    }

    #[test]
    fn worker_failure_reported_by_wait() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.write(
            Row::map()
                .set("name", "foo")
                .defer("status", Deferred::call(|| Err("nope".into()))),
        )
        .unwrap();
        let err = t.wait().unwrap_err();
        assert_eq!(err.to_string(), "deferred value failed: status: nope");
        t.wait().unwrap();
    }

    #[test]
    fn worker_panic_reported_by_wait() {
        let (b, _cap) = table(Mode::Final);
        let mut t = b.columns(["name", "status"]).build();
        t.write(
            Row::map()
                .set("name", "foo")
                .defer("status", Deferred::call(|| panic!("kaput"))),
        )
        .unwrap();
        let err = t.wait().unwrap_err();
        assert!(matches!(err, TabularError::Worker(ref m) if m.contains("kaput")));
    }
}
