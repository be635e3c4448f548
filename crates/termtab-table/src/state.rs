//! Table state and drawing.
//!
//! [`State`] is everything behind the writer's lock: columns, styles, stored
//! rows, the current widths and summary, and what has been drawn so far.
//! Both the caller's writes and the deferred-value workers go through it.
//!
//! # Drawing in update mode
//!
//! The cursor always rests at the start of the line below the table. The
//! table occupies `header + body + summary` lines above it, and every row
//! remembers which body line shows it. From there:
//!
//! - a new row: clear the summary, write the row, write the summary;
//! - a changed row `n` lines up: cursor up `n`, clear the line, write it,
//!   cursor down `n - 1`, then redraw the summary;
//! - a width change: cursor up over the whole table, clear to the end of
//!   the screen, draw everything again.
//!
//! Lines above the top of the terminal cannot be reached. A changed row
//! that far up is written again below, and a repaint that tall starts
//! below the old table.

use std::collections::HashMap;
use std::io::{self, Write};
use std::sync::Arc;

use serde_json::{Map, Value};
use termtab_style::{BoxError, Resolved, TableStyle};
use termtab_term::output::OutputBuffer;
use termtab_term::width::display_width;
use termtab_term::{ansi, SpanStyle};
use tracing::debug;

use crate::content::{Content, RowStyle, Staged, Upsert};
use crate::error::{Result, TabularError};
use crate::field::{cell_text, present, value_text, write_cell};
use crate::layout;
use crate::mode::Mode;
use crate::row::{Input, Key, Producer, Row};
use crate::summary::Summary;

/// A deferred producer together with the row it fills.
pub struct Job {
    /// Id column values of the target row.
    pub id: Map<String, Value>,
    pub key: Key,
    pub producer: Producer,
}

/// What is currently on screen (update mode).
#[derive(Debug, Default)]
struct Screen {
    header: usize,
    body: usize,
    summary: usize,
    /// Body line of each stored row.
    lines: Vec<usize>,
}

impl Screen {
    const fn total(&self) -> usize {
        self.header + self.body + self.summary
    }
}

/// Column styles and header texts resolved for a set of columns.
struct Styles {
    columns: Vec<Resolved>,
    header: Option<Resolved>,
    header_texts: Option<Vec<String>>,
}

/// A write worked out against the current state but not yet applied.
struct Plan {
    /// Columns taken from the row, when the table had none.
    columns: Option<Vec<String>>,
    styles: Option<Styles>,
    staged: Staged,
    summary: Summary,
    jobs: Vec<Job>,
}

pub struct State {
    columns: Vec<String>,
    labels: HashMap<String, String>,
    ids: Option<Vec<String>>,
    style: TableStyle,
    styles: Vec<Resolved>,
    header: Option<Resolved>,
    header_texts: Option<Vec<String>>,
    content: Content,
    summary: Summary,
    /// Widths before the total-width limit; auto columns only grow.
    fitted: Vec<usize>,
    widths: Vec<usize>,
    mode: Mode,
    styled: bool,
    height: Option<usize>,
    out: Box<dyn Write + Send>,
    screen: Screen,
    /// Whether anything has been written (incremental and update modes).
    started: bool,
    finished: bool,
}

impl State {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        columns: Vec<String>,
        labels: HashMap<String, String>,
        ids: Option<Vec<String>>,
        style: TableStyle,
        mode: Mode,
        styled: bool,
        height: Option<usize>,
        out: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            columns,
            labels,
            ids,
            style,
            styles: Vec::new(),
            header: None,
            header_texts: None,
            content: Content::new(),
            summary: Summary::default(),
            fitted: Vec::new(),
            widths: Vec::new(),
            mode,
            styled,
            height,
            out,
            screen: Screen::default(),
            started: false,
            finished: false,
        }
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> Vec<Map<String, Value>> {
        self.content.records().map(|r| r.values.clone()).collect()
    }

    fn ids(&self) -> Vec<String> {
        self.ids_for(&self.columns)
    }

    fn ids_for(&self, columns: &[String]) -> Vec<String> {
        self.ids
            .clone()
            .unwrap_or_else(|| columns.first().cloned().into_iter().collect())
    }

    /// Switch the id columns and re-index the stored rows.
    pub fn set_ids(&mut self, ids: Vec<String>) -> Result<()> {
        if let Some(unknown) = ids
            .iter()
            .find(|c| !self.columns.is_empty() && !self.columns.contains(c))
        {
            return Err(TabularError::UnknownColumn(unknown.clone()));
        }
        self.ids = Some(ids);
        let ids = self.ids();
        self.content.reindex(&ids)
    }

    // ── Styles ──────────────────────────────────────────────────────────

    /// Resolve the column styles and header texts for `columns`.
    fn resolve_styles(&self, columns: &[String]) -> Result<Styles> {
        let resolved = columns
            .iter()
            .map(|c| self.style.resolve_column(c))
            .collect::<termtab_style::error::Result<_>>()?;
        let header = self.style.resolve_header()?;
        let header_texts = match &header {
            None => None,
            Some(h) => Some(
                columns
                    .iter()
                    .map(|c| {
                        let label = self.labels.get(c).unwrap_or(c);
                        cell_text("header_", h, Some(&Value::String(label.clone())))
                    })
                    .collect::<Result<_>>()?,
            ),
        };
        Ok(Styles {
            columns: resolved,
            header,
            header_texts,
        })
    }

    /// Column styles for a single row written with `over`.
    fn row_styles(&self, columns: &[String], over: &TableStyle) -> Result<Arc<[Resolved]>> {
        let style = self.style.merged(over);
        let resolved = columns
            .iter()
            .map(|c| style.resolve_column(c))
            .collect::<termtab_style::error::Result<Vec<_>>>()?;
        Ok(resolved.into())
    }

    // ── Writing ─────────────────────────────────────────────────────────

    /// Store `row`, draw it, and return the deferred jobs it carries.
    pub fn write(&mut self, row: Row, style: Option<&TableStyle>) -> Result<Vec<Job>> {
        let Plan {
            columns,
            styles,
            staged,
            summary,
            jobs,
        } = self.plan(row, style)?;
        if let Some(columns) = columns {
            debug!(columns = ?columns, "inferred columns");
            self.columns = columns;
        }
        if let Some(styles) = styles {
            self.styles = styles.columns;
            self.header = styles.header;
            self.header_texts = styles.header_texts;
        }
        let upsert = self.content.commit(staged);
        self.refresh(upsert, summary)?;
        Ok(jobs)
    }

    /// Everything writing `row` would change, worked out without changing
    /// anything.
    fn plan(&self, row: Row, style: Option<&TableStyle>) -> Result<Plan> {
        let inferred = self.columns.is_empty().then(|| row.key_columns());
        let columns = inferred.as_deref().unwrap_or(self.columns.as_slice());
        let fresh = if inferred.is_some() || self.styles.is_empty() {
            Some(self.resolve_styles(columns)?)
        } else {
            None
        };
        let styles = fresh
            .as_ref()
            .map_or(self.styles.as_slice(), |s| s.columns.as_slice());

        let ids = self.ids_for(columns);
        let mut values = Map::new();
        let mut deferred = Vec::new();
        for (key, input) in row.into_pairs(columns)? {
            if let Some(unknown) = key.columns().iter().find(|c| !columns.contains(c)) {
                return Err(TabularError::UnknownColumn(unknown.clone()));
            }
            match input {
                Input::Value(v) => values.extend(key.spread(v)?),
                Input::Deferred(d) => {
                    if let Some(id) = key.columns().iter().find(|c| ids.contains(c)) {
                        return Err(TabularError::DeferredId(id.clone()));
                    }
                    let (initial, producer) = d.into_parts();
                    if let Some(v) = initial {
                        values.extend(key.spread(v)?);
                    }
                    deferred.push((key, producer));
                }
            }
        }
        deferred.extend(withhold_delayed(columns, styles, &ids, &mut values)?);

        let id: Map<String, Value> = ids
            .iter()
            .filter_map(|c| values.get(c).map(|v| (c.clone(), v.clone())))
            .collect();
        let row_style = match style {
            Some(over) => RowStyle::Own(self.row_styles(columns, over)?),
            None => RowStyle::Table,
        };
        let staged = self
            .content
            .stage(&ids, values, row_style, columns, styles)?;
        let summary = Summary::compute(columns, styles, self.content.records_with(&staged))?;

        let jobs = deferred
            .into_iter()
            .map(|(key, producer)| Job {
                id: id.clone(),
                key,
                producer,
            })
            .collect();
        Ok(Plan {
            columns: inferred,
            styles: fresh,
            staged,
            summary,
            jobs,
        })
    }

    /// Apply one deferred update to the row identified by `id`.
    pub fn apply_update(&mut self, id: &Map<String, Value>, key: &Key, value: Value) -> Result<()> {
        let mut values = id.clone();
        values.extend(key.spread(value)?);
        let ids = self.ids();
        let staged = self
            .content
            .stage(&ids, values, RowStyle::Keep, &self.columns, &self.styles)?;
        let summary = Summary::compute(
            &self.columns,
            &self.styles,
            self.content.records_with(&staged),
        )?;
        let upsert = self.content.commit(staged);
        debug!(key = %key, row = upsert.index(), "deferred update");
        self.refresh(upsert, summary)
    }

    /// Take the new summary and widths after a row changed, and draw.
    fn refresh(&mut self, upsert: Upsert, summary: Summary) -> Result<()> {
        let widths = self.layout(&summary);
        let widths_changed = widths != self.widths;
        let old_summary = std::mem::replace(&mut self.summary, summary);
        self.widths = widths;

        let mut buf = OutputBuffer::new();
        match self.mode {
            Mode::Update => self.draw_update(&mut buf, upsert, widths_changed, old_summary.len())?,
            Mode::Incremental => {
                if !self.started {
                    self.write_header(&mut buf)?;
                    self.started = true;
                }
                self.write_row(&mut buf, upsert.index())?;
            }
            Mode::Final | Mode::Auto => {}
        }
        self.emit(&mut buf)
    }

    fn layout(&mut self, summary: &Summary) -> Vec<usize> {
        let summary_texts = summary.texts();
        let entries = self
            .header_texts
            .iter()
            .map(|h| h.iter().map(String::as_str).collect())
            .chain(
                self.content
                    .records()
                    .map(|r| r.texts.iter().map(String::as_str).collect()),
            )
            .chain(
                summary_texts
                    .iter()
                    .map(|l| l.iter().map(String::as_str).collect()),
            );
        let fitted = layout::fit(&self.styles, entries, &self.fitted);
        let mut widths = fitted.clone();
        if let Some(limit) = self.style.width {
            let separator = display_width(self.style.separator());
            layout::shrink(&mut widths, &self.styles, separator, limit);
        }
        self.fitted = fitted;
        widths
    }

    // ── Update mode ─────────────────────────────────────────────────────

    /// Whether the cursor can move up `lines` lines. It rests on the line
    /// below the table, so the terminal's other `height - 1` rows are in
    /// reach.
    fn fits(&self, lines: usize) -> bool {
        self.height.is_none_or(|h| lines < h)
    }

    fn draw_update(
        &mut self,
        buf: &mut OutputBuffer,
        upsert: Upsert,
        widths_changed: bool,
        old_summary: usize,
    ) -> io::Result<()> {
        if widths_changed || !self.started {
            self.started = true;
            return self.repaint(buf);
        }
        match upsert {
            Upsert::Inserted(idx) if idx == self.screen.lines.len() => {
                self.clear_summary(buf)?;
                self.write_row(buf, idx)?;
                self.screen.lines.push(self.screen.body);
                self.screen.body += 1;
                self.write_summary(buf)
            }
            Upsert::Updated(idx) if idx < self.screen.lines.len() => {
                let line = self.screen.header + self.screen.lines[idx];
                let n = self.screen.total() - line;
                if self.fits(n) {
                    debug!(row = idx, up = n, "rewriting row in place");
                    ansi::cursor_up(buf, n)?;
                    ansi::clear_line(buf)?;
                    self.write_row(buf, idx)?;
                    ansi::cursor_down(buf, n - 1)?;
                    self.redraw_summary(buf, old_summary)
                } else {
                    debug!(row = idx, up = n, "row out of reach; writing it again below");
                    self.clear_summary(buf)?;
                    self.write_row(buf, idx)?;
                    self.screen.lines[idx] = self.screen.body;
                    self.screen.body += 1;
                    self.write_summary(buf)
                }
            }
            // The screen lost track of a row (an earlier draw failed).
            _ => self.repaint(buf),
        }
    }

    /// Draw the whole table again over the old one.
    fn repaint(&mut self, buf: &mut OutputBuffer) -> io::Result<()> {
        let total = self.screen.total();
        if total > 0 {
            if self.fits(total) {
                debug!(lines = total, widths = ?self.widths, "repainting table");
                ansi::cursor_up(buf, total)?;
                ansi::clear_to_end(buf)?;
            } else {
                debug!(lines = total, "table taller than terminal; repainting below");
            }
        }
        self.screen = Screen::default();
        if self.write_header(buf)? {
            self.screen.header = 1;
        }
        for idx in 0..self.content.len() {
            self.write_row(buf, idx)?;
            self.screen.lines.push(idx);
        }
        self.screen.body = self.content.len();
        self.write_summary(buf)
    }

    /// Move above the drawn summary and erase it.
    fn clear_summary(&mut self, buf: &mut OutputBuffer) -> io::Result<()> {
        let n = self.screen.summary;
        if n > 0 && self.fits(n) {
            ansi::cursor_up(buf, n)?;
            ansi::clear_to_end(buf)?;
        }
        self.screen.summary = 0;
        Ok(())
    }

    /// Replace the drawn summary (`old` lines) with the current one.
    fn redraw_summary(&mut self, buf: &mut OutputBuffer, old: usize) -> io::Result<()> {
        let new = self.summary.len();
        if new == old {
            ansi::cursor_up(buf, new)?;
            for i in 0..new {
                ansi::clear_line(buf)?;
                self.write_summary_line(buf, i)?;
            }
            self.screen.summary = new;
            Ok(())
        } else {
            debug!(old, new, "summary changed height");
            self.clear_summary(buf)?;
            self.write_summary(buf)
        }
    }

    // ── Lines ───────────────────────────────────────────────────────────

    /// Write the header line if there is one.
    fn write_header(&self, buf: &mut OutputBuffer) -> io::Result<bool> {
        let (Some(header), Some(texts)) = (&self.header, &self.header_texts) else {
            return Ok(false);
        };
        let cells = self.columns.iter().zip(texts).map(|(c, text)| {
            let label = self.labels.get(c).unwrap_or(c);
            let span = header.span_style(Some(&Value::String(label.clone())));
            (text.as_str(), span)
        });
        self.write_line(buf, &self.styles, cells)?;
        Ok(true)
    }

    fn write_row(&self, buf: &mut OutputBuffer, idx: usize) -> io::Result<()> {
        let Some(record) = self.content.get(idx) else {
            return Ok(());
        };
        let styles = record.styles(&self.styles);
        let cells = self
            .columns
            .iter()
            .zip(styles)
            .zip(&record.texts)
            .map(|((c, style), text)| (text.as_str(), style.span_style(present(record.get(c)))));
        self.write_line(buf, styles, cells)
    }

    fn write_summary(&mut self, buf: &mut OutputBuffer) -> io::Result<()> {
        for i in 0..self.summary.len() {
            self.write_summary_line(buf, i)?;
        }
        self.screen.summary = self.summary.len();
        Ok(())
    }

    fn write_summary_line(&self, buf: &mut OutputBuffer, i: usize) -> io::Result<()> {
        let Some(values) = self.summary.lines().nth(i) else {
            return Ok(());
        };
        let texts: Vec<String> = values
            .iter()
            .map(|v| v.as_ref().map(value_text).unwrap_or_default())
            .collect();
        let cells = self
            .styles
            .iter()
            .zip(values)
            .zip(&texts)
            .map(|((style, value), text)| {
                (text.as_str(), style.span_style(present(value.as_ref())))
            });
        self.write_line(buf, &self.styles, cells)
    }

    /// Write one line: fitted cells joined by the separator, cut and
    /// aligned by `styles`.
    fn write_line<'a>(
        &self,
        buf: &mut OutputBuffer,
        styles: &[Resolved],
        cells: impl Iterator<Item = (&'a str, SpanStyle)>,
    ) -> io::Result<()> {
        for (i, ((text, span), style)) in cells.zip(styles).enumerate() {
            if i > 0 {
                buf.push_str(self.style.separator());
            }
            let span = if self.styled { span } else { SpanStyle::PLAIN };
            write_cell(buf, text, self.widths[i], style, &span)?;
        }
        buf.push_str("\n");
        Ok(())
    }

    fn emit(&mut self, buf: &mut OutputBuffer) -> Result<()> {
        if !buf.is_empty() {
            buf.flush_to(&mut *self.out)?;
            self.out.flush()?;
        }
        Ok(())
    }

    // ── Finishing ───────────────────────────────────────────────────────

    /// Write whatever the mode held back. Only the first call writes.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let mut buf = OutputBuffer::new();
        match self.mode {
            Mode::Final | Mode::Auto => {
                if !self.content.is_empty() {
                    self.write_header(&mut buf)?;
                    for idx in 0..self.content.len() {
                        self.write_row(&mut buf, idx)?;
                    }
                    self.write_summary(&mut buf)?;
                }
            }
            Mode::Incremental => self.write_summary(&mut buf)?,
            Mode::Update => {}
        }
        self.emit(&mut buf)
    }
}

/// Take the plain values of delayed columns out of `values`, one job per
/// delivery group.
fn withhold_delayed(
    columns: &[String],
    styles: &[Resolved],
    ids: &[String],
    values: &mut Map<String, Value>,
) -> Result<Vec<(Key, Producer)>> {
    let mut groups: Vec<(String, Map<String, Value>)> = Vec::new();
    for (column, style) in columns.iter().zip(styles) {
        let Some(group) = &style.delay_group else {
            continue;
        };
        if ids.contains(column) {
            return Err(TabularError::DeferredId(column.clone()));
        }
        let Some(value) = values.remove(column) else {
            continue;
        };
        match groups.iter_mut().find(|(g, _)| g == group) {
            Some((_, members)) => {
                members.insert(column.clone(), value);
            }
            None => groups.push((group.clone(), Map::from_iter([(column.clone(), value)]))),
        }
    }
    Ok(groups
        .into_iter()
        .map(|(_, members)| {
            let key = Key::Columns(members.keys().cloned().collect());
            let deliver = move || -> std::result::Result<Value, BoxError> {
                Ok(Value::Object(members))
            };
            (key, Producer::Once(Box::new(deliver)))
        })
        .collect())
}
