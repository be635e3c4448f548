// SPDX-License-Identifier: MIT
//
// termtab — render a stream of JSON records as a terminal table.
//
// Every input line is one record. An object becomes a mapping row, an
// array becomes a positional row matched to --columns. Rows with the same
// id update each other, so a producer can stream status changes and watch
// them redraw in place:
//
//   {"name": "build", "status": "running"}
//   {"name": "test", "status": "queued"}
//   {"name": "build", "status": "ok"}
//
// stdout carries only the table. Logs go to stderr (RUST_LOG, or -v for
// debug output).

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use termtab_style::{ColumnStyle, TableStyle};
use termtab_table::{Mode, Row, Styling, Tabular, TabularBuilder};
use tracing::debug;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

// ─── Arguments ───────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "termtab", version)]
#[command(about = "Render JSON lines as a styled, updatable terminal table", long_about = None)]
struct Cli {
    /// Column names in display order (default: keys of the first object).
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Columns that identify a row (default: the first column).
    #[arg(long, value_delimiter = ',')]
    ids: Vec<String>,

    /// Table style, TOML or JSON (by extension).
    #[arg(long, value_name = "FILE")]
    style: Option<PathBuf>,

    #[arg(long, value_enum, default_value = "auto")]
    mode: ModeArg,

    #[arg(long, value_enum, default_value = "auto")]
    color: ColorArg,

    /// Show a header line even if the style has none.
    #[arg(long)]
    header: bool,

    #[arg(long)]
    separator: Option<String>,

    #[arg(short, long)]
    verbose: bool,

    /// Input file (default: stdin).
    file: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ModeArg {
    Auto,
    Update,
    Incremental,
    Final,
}

impl From<ModeArg> for Mode {
    fn from(m: ModeArg) -> Self {
        match m {
            ModeArg::Auto => Self::Auto,
            ModeArg::Update => Self::Update,
            ModeArg::Incremental => Self::Incremental,
            ModeArg::Final => Self::Final,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ColorArg {
    Auto,
    Always,
    Never,
}

impl From<ColorArg> for Styling {
    fn from(c: ColorArg) -> Self {
        match c {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

// ─── Setup ───────────────────────────────────────────────────────────────────

fn init_logging(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(false)
                .compact(),
        )
        .init();
}

/// The style file (if any) with the command-line overrides on top.
fn table_style(cli: &Cli) -> Result<TableStyle> {
    let mut style = match &cli.style {
        Some(path) => TableStyle::load(path)
            .with_context(|| format!("invalid style file {}", path.display()))?,
        None => TableStyle::new(),
    };
    if cli.header && !style.has_header() {
        style = style.with_header(ColumnStyle::new().bold(true));
    }
    if let Some(sep) = &cli.separator {
        style = style.with_separator(sep.clone());
    }
    Ok(style)
}

fn table_builder(cli: &Cli, style: TableStyle) -> TabularBuilder {
    let mut builder = Tabular::builder()
        .style(style)
        .mode(cli.mode.into())
        .styling(cli.color.into());
    if !cli.columns.is_empty() {
        builder = builder.columns(cli.columns.iter().cloned());
    }
    if !cli.ids.is_empty() {
        builder = builder.ids(cli.ids.iter().cloned());
    }
    builder
}

// ─── Input ───────────────────────────────────────────────────────────────────

/// Parse one input line. Blank lines yield `None`.
fn parse_line(number: usize, line: &str) -> Result<Option<Row>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let value: Value =
        serde_json::from_str(line).with_context(|| format!("line {number}: invalid JSON"))?;
    let row = Row::from_json(value).with_context(|| format!("line {number}"))?;
    Ok(Some(row))
}

/// Write every record from `input` to `table`. Returns the number of rows
/// written.
fn render(table: &mut Tabular, input: impl BufRead) -> Result<usize> {
    let mut rows = 0;
    for (i, line) in input.lines().enumerate() {
        let number = i + 1;
        let line = line.with_context(|| format!("failed to read line {number}"))?;
        if let Some(row) = parse_line(number, &line)? {
            table.write(row).with_context(|| format!("line {number}"))?;
            rows += 1;
        }
    }
    Ok(rows)
}

fn run(cli: &Cli) -> Result<()> {
    let style = table_style(cli)?;
    let mut table = table_builder(cli, style).build();
    let rows = match &cli.file {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("cannot open {}", path.display()))?;
            render(&mut table, BufReader::new(file))?
        }
        None => render(&mut table, io::stdin().lock())?,
    };
    table.finish().context("failed to finish table")?;
    debug!(rows, "done");
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    if let Err(e) = run(&cli) {
        eprintln!("termtab: {e:#}");
        process::exit(1);
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use termtab_term::CaptureBuffer;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("termtab").chain(args.iter().copied())).unwrap()
    }

    fn final_table(cli: &Cli) -> (Tabular, CaptureBuffer) {
        let capture = CaptureBuffer::new();
        let table = table_builder(cli, table_style(cli).unwrap())
            .mode(Mode::Final)
            .writer(capture.clone())
            .build();
        (table, capture)
    }

    // ── Arguments ───────────────────────────────────────────────────────

    #[test]
    fn defaults() {
        let cli = parse(&[]);
        assert!(cli.columns.is_empty());
        assert!(cli.ids.is_empty());
        assert_eq!(cli.mode, ModeArg::Auto);
        assert_eq!(cli.color, ColorArg::Auto);
        assert!(!cli.header);
        assert!(cli.file.is_none());
    }

    #[test]
    fn full_command_line() {
        let cli = parse(&[
            "--columns",
            "name,status,n",
            "--ids",
            "name,status",
            "--mode",
            "incremental",
            "--color",
            "never",
            "--header",
            "--separator",
            " | ",
            "-v",
            "jobs.jsonl",
        ]);
        assert_eq!(cli.columns, vec!["name", "status", "n"]);
        assert_eq!(cli.ids, vec!["name", "status"]);
        assert_eq!(Mode::from(cli.mode), Mode::Incremental);
        assert_eq!(Styling::from(cli.color), Styling::Never);
        assert!(cli.header);
        assert_eq!(cli.separator.as_deref(), Some(" | "));
        assert!(cli.verbose);
        assert_eq!(cli.file, Some(PathBuf::from("jobs.jsonl")));
    }

    #[test]
    fn bad_mode_rejected() {
        assert!(Cli::try_parse_from(["termtab", "--mode", "live"]).is_err());
    }

    // ── Style ───────────────────────────────────────────────────────────

    #[test]
    fn header_flag_adds_header() {
        let style = table_style(&parse(&["--header", "--separator", "|"])).unwrap();
        assert!(style.has_header());
        assert_eq!(style.separator(), "|");
        assert!(!table_style(&parse(&[])).unwrap().has_header());
    }

    #[test]
    fn style_file_loaded() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[header_]\nbold = true\n\n[status]\nwidth = 6").unwrap();
        let path = file.path().to_str().unwrap().to_owned();
        let style = table_style(&parse(&["--style", &path])).unwrap();
        assert!(style.has_header());
        assert!(style.column("status").is_some());
    }

    #[test]
    fn missing_style_file_is_error() {
        let err = table_style(&parse(&["--style", "/nonexistent/style.toml"])).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/style.toml"));
    }

    // ── Input ───────────────────────────────────────────────────────────

    #[test]
    fn parse_line_forms() {
        assert!(parse_line(1, "   ").unwrap().is_none());
        assert!(matches!(
            parse_line(1, r#"{"name": "foo"}"#).unwrap(),
            Some(Row::Mapping(_))
        ));
        assert!(matches!(
            parse_line(1, r#"["foo", 1]"#).unwrap(),
            Some(Row::Sequence(_))
        ));
    }

    #[test]
    fn parse_errors_name_the_line() {
        let err = parse_line(7, "{nope").unwrap_err();
        assert!(format!("{err:#}").starts_with("line 7: invalid JSON"));
        let err = parse_line(3, "42").unwrap_err();
        assert!(format!("{err:#}").starts_with("line 3: "));
    }

    #[test]
    fn render_json_lines() {
        let cli = parse(&["--header"]);
        let (mut table, capture) = final_table(&cli);
        let input = concat!(
            "{\"name\": \"build\", \"status\": \"running\"}\n",
            "\n",
            "{\"name\": \"test\", \"status\": \"queued\"}\n",
            "{\"name\": \"build\", \"status\": \"ok\"}\n",
        );
        assert_eq!(render(&mut table, input.as_bytes()).unwrap(), 3);
        table.finish().unwrap();
        assert_eq!(
            capture.contents(),
            "name  status \nbuild ok     \ntest  queued \n"
        );
    }

    #[test]
    fn render_positional_rows() {
        let cli = parse(&["--columns", "name,n", "--separator", ","]);
        let (mut table, capture) = final_table(&cli);
        render(&mut table, "[\"a\", 1]\n[\"b\", 22]\n".as_bytes()).unwrap();
        table.finish().unwrap();
        assert_eq!(capture.contents(), "a,1 \nb,22\n");
    }

    #[test]
    fn render_stops_at_bad_line() {
        let cli = parse(&["--columns", "name"]);
        let (mut table, _capture) = final_table(&cli);
        let err = render(&mut table, "[\"a\"]\n[\"b\", \"c\"]\n".as_bytes()).unwrap_err();
        assert!(format!("{err:#}").starts_with("line 2: "));
    }
}
