use std::ops::Range;
use std::path::PathBuf;

use anyhow::{bail, Context};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use clap::{Parser as ClapParser, Subcommand};
use jsontree::{Config, Document, Error, NodeId, NodeKind};
use tracing::*;

mod logging;

#[derive(Debug, ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// A TOML configuration file, e.g. to set `max_depth` or `lenient_paths`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON on a single line instead of pretty-printing it.
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the node at PATH.
    Get { input: PathBuf, path: String },
    /// Delete the node at PATH and print the resulting document.
    Delete { input: PathBuf, path: String },
    /// Replace the content of the node at PATH with VALUE (a JSON literal) and print the
    /// resulting document.
    Set {
        input: PathBuf,
        path: String,
        value: String,
    },
    /// List the direct children of the node at PATH.
    Children { input: PathBuf, path: String },
}

impl Command {
    fn input(&self) -> &PathBuf {
        match self {
            Command::Get { input, .. }
            | Command::Delete { input, .. }
            | Command::Set { input, .. }
            | Command::Children { input, .. } => input,
        }
    }
}

fn main() -> anyhow::Result<()> {
    logging::setup_logging();

    let cli = Args::parse();

    debug!(?cli);

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load config `{}`", path.display()))?,
        None => Config::default(),
    };
    debug!(?config);

    let input = cli.command.input();
    let json_string = match std::fs::read_to_string(input) {
        Ok(file) => file,
        Err(e) => {
            error!(path = ?input, "failed to read input");
            return Err(e).with_context(|| format!("failed to read file `{}`", input.display()));
        }
    };
    let source_id = input.display().to_string();

    let mut doc = match Document::parse_with_config(json_string.as_bytes(), config) {
        Ok(doc) => doc,
        Err(Error::Decode(e)) => {
            report_decode_error(&source_id, &json_string, &e)?;
            bail!("failed to parse JSON input");
        }
        Err(e) => return Err(e).context("failed to build document"),
    };

    match &cli.command {
        Command::Get { path, .. } => {
            let id = resolve_or_report(&doc, path)?;
            print_node(&doc, id, cli.compact)?;
        }
        Command::Delete { path, .. } => {
            let id = resolve_or_report(&doc, path)?;
            doc.delete(id)?;
            print_node(&doc, doc.root(), cli.compact)?;
        }
        Command::Set { path, value, .. } => {
            let value: serde_json::Value = serde_json::from_str(value)
                .with_context(|| format!("replacement value `{value}` is not valid JSON"))?;
            let id = resolve_or_report(&doc, path)?;
            doc.set(id, &value)
                .with_context(|| format!("failed to set `{path}`"))?;
            print_node(&doc, doc.root(), cli.compact)?;
        }
        Command::Children { path, .. } => {
            let id = resolve_or_report(&doc, path)?;
            let node = doc.node(id).context("resolved node no longer exists")?;
            for (i, child) in node.children().enumerate() {
                let label = match node.kind() {
                    NodeKind::Array => format!("[{i}]"),
                    _ => child.name().to_owned(),
                };
                println!("{label}\t{}", child.kind());
            }
        }
    }

    Ok(())
}

fn print_node(doc: &Document, id: NodeId, compact: bool) -> anyhow::Result<()> {
    if compact {
        println!("{}", doc.to_json_string(id)?);
    } else {
        let node = doc.node(id).context("node no longer exists")?;
        println!("{node}");
    }
    Ok(())
}

fn resolve_or_report(doc: &Document, path: &str) -> anyhow::Result<NodeId> {
    let e = match doc.resolve(doc.root(), path) {
        Ok(id) => return Ok(id),
        Err(e) => e,
    };

    if let Some(span) = e.path_span() {
        let label = match &e {
            Error::PathNotFound { reason, .. } => reason.to_string(),
            Error::MalformedPath { reason, .. } => reason.clone(),
            _ => String::new(),
        };
        let source_id = "<path>".to_string();
        let range = char_range(path, span.into_range());
        Report::build(ReportKind::Error, &source_id, range.start)
            .with_message(format!("cannot resolve path \"{}\"", path.fg(Color::Blue)))
            .with_label(
                Label::new((&source_id, range))
                    .with_message(label)
                    .with_color(Color::Red),
            )
            .finish()
            .eprint((&source_id, Source::from(path)))?;
    }

    Err(e).with_context(|| format!("failed to resolve `{path}`"))
}

fn report_decode_error(
    source_id: &String,
    src: &str,
    err: &serde_json::Error,
) -> anyhow::Result<()> {
    let line_start: usize = src
        .split_inclusive('\n')
        .take(err.line().saturating_sub(1))
        .map(|line| line.chars().count())
        .sum();
    let total = src.chars().count();
    let start = (line_start + err.column().saturating_sub(1)).min(total);
    let end = (start + 1).min(total);

    Report::build(ReportKind::Error, source_id, start)
        .with_message(format!("invalid JSON: {err}"))
        .with_label(Label::new((source_id, start..end)).with_color(Color::Red))
        .finish()
        .eprint((source_id, Source::from(src)))?;
    Ok(())
}

/// Diagnostics count characters while paths are sliced by bytes.
fn char_range(src: &str, bytes: Range<usize>) -> Range<usize> {
    let to_chars = |byte: usize| src.get(..byte).map_or(byte, |s| s.chars().count());
    to_chars(bytes.start)..to_chars(bytes.end)
}
