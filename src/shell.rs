//! Line-oriented interactive shell over an open index.
//!
//! Lines starting with `:` are commands; anything else is a query.

use crate::index::build::index_folder;
use crate::index::engine::IndexEngine;
use crate::output::{write_hits, write_stats};
use anyhow::Result;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use termcolor::{Color, ColorSpec, WriteColor};

/// Target of a `:delete` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    Id(u64),
    Path(String),
}

/// One parsed shell line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Index(Option<PathBuf>),
    Stats,
    Merge,
    Delete(DeleteTarget),
    Gc,
    Quit,
    Search(String),
    Empty,
    Unknown(String),
}

/// Parse a single input line
pub fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    if line.is_empty() {
        return ShellCommand::Empty;
    }
    let Some(rest) = line.strip_prefix(':') else {
        return ShellCommand::Search(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "index" => ShellCommand::Index((!arg.is_empty()).then(|| PathBuf::from(arg))),
        "stats" => ShellCommand::Stats,
        "merge" => ShellCommand::Merge,
        "gc" => ShellCommand::Gc,
        "quit" | "q" | "exit" => ShellCommand::Quit,
        "delete" if !arg.is_empty() => ShellCommand::Delete(match arg.parse::<u64>() {
            Ok(id) => DeleteTarget::Id(id),
            Err(_) => DeleteTarget::Path(arg.to_string()),
        }),
        _ => ShellCommand::Unknown(line.to_string()),
    }
}

/// Read commands from `input` until `:quit` or end of input.
///
/// Command failures are reported on `out` and the loop continues.
pub fn run_shell<R, W>(engine: &mut IndexEngine, input: R, out: &mut W, docs_folder: &Path) -> Result<()>
where
    R: BufRead,
    W: WriteColor,
{
    write_prompt(out)?;
    for line in input.lines() {
        let command = parse_command(&line?);
        if command == ShellCommand::Quit {
            break;
        }
        if let Err(e) = execute(engine, command, out, docs_folder) {
            out.set_color(ColorSpec::new().set_fg(Some(Color::Red)))?;
            writeln!(out, "error: {e:#}")?;
            out.reset()?;
        }
        write_prompt(out)?;
    }
    Ok(())
}

fn write_prompt<W: WriteColor>(out: &mut W) -> Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(out, "> ")?;
    out.reset()?;
    out.flush()?;
    Ok(())
}

fn execute<W: WriteColor>(
    engine: &mut IndexEngine,
    command: ShellCommand,
    out: &mut W,
    docs_folder: &Path,
) -> Result<()> {
    match command {
        ShellCommand::Empty | ShellCommand::Quit => {}
        ShellCommand::Index(folder) => {
            let folder = folder.as_deref().unwrap_or(docs_folder);
            let added = index_folder(engine, folder, true)?;
            writeln!(out, "indexed {} new documents", added)?;
        }
        ShellCommand::Stats => write_stats(out, &engine.stats()?)?,
        ShellCommand::Merge => {
            if engine.segment_count() < 2 {
                writeln!(out, "nothing to merge")?;
            } else {
                let docs = engine.merge_smallest()?;
                writeln!(out, "merged into {} ({} docs)", last_segment(engine), docs)?;
            }
        }
        ShellCommand::Delete(target) => {
            let deleted = match &target {
                DeleteTarget::Id(id) => engine.delete_by_id(*id)?,
                DeleteTarget::Path(path) => engine.delete_by_path(path)?,
            };
            writeln!(out, "{}", if deleted { "deleted" } else { "not found" })?;
        }
        ShellCommand::Gc => {
            let reclaimed = engine.collect_garbage()?;
            writeln!(out, "reclaimed {} documents", reclaimed)?;
        }
        ShellCommand::Search(query) => {
            let k = engine.config().default_k;
            write_hits(out, &engine.search(&query, k)?)?;
        }
        ShellCommand::Unknown(line) => {
            writeln!(out, "unknown command: {line}")?;
            writeln!(out, "commands: :index [FOLDER] :stats :merge :delete <id|path> :gc :quit")?;
        }
    }
    Ok(())
}

fn last_segment(engine: &IndexEngine) -> String {
    engine.segment_names().pop().unwrap_or_default()
}
