use anyhow::{Context, Result, bail};
use clap::{ArgGroup, Parser, Subcommand};
use segsearch::config::EngineConfig;
use segsearch::index::build::index_folder;
use segsearch::output::{self, write_hits, write_stats};
use segsearch::shell::run_shell;
use segsearch::IndexEngine;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "segsearch")]
#[command(about = "Segmented full-text search over folders of text documents")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Index root directory
    #[arg(short, long, default_value = "segments", global = true)]
    root: PathBuf,

    /// Auto-merge threshold, overrides the config file
    #[arg(long, global = true)]
    max_segments: Option<usize>,

    /// Read engine configuration from this file instead of the user config dir
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest new .txt files from a folder
    Index {
        #[arg(default_value = "docs")]
        folder: PathBuf,

        /// Hide progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Rank documents against a query
    Search {
        #[arg(trailing_var_arg = true, required = true)]
        query: Vec<String>,

        /// Number of results
        #[arg(short)]
        k: Option<usize>,
    },
    /// Show index statistics
    Stats,
    /// Merge the two smallest segments
    Merge,
    /// Tombstone a document
    #[command(group(ArgGroup::new("target").required(true).args(["id", "path"])))]
    Delete {
        #[arg(long)]
        id: Option<u64>,

        #[arg(long)]
        path: Option<String>,
    },
    /// Merge everything and reclaim deleted documents
    Gc,
    /// Interactive shell
    Shell {
        /// Folder used by `:index` without an argument
        #[arg(long, default_value = "docs")]
        docs: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::load_from(path)?,
        None => EngineConfig::load()?,
    };
    if let Some(max_segments) = cli.max_segments {
        config.max_segments = max_segments;
    }

    let mut engine = IndexEngine::open_with_config(&cli.root, config)
        .with_context(|| format!("Failed to open index at {}", cli.root.display()))?;
    let mut stdout = output::stdout(!cli.no_color);

    match cli.command {
        Some(Commands::Index { folder, quiet }) => {
            let added = index_folder(&mut engine, &folder, quiet)
                .with_context(|| format!("Failed to index {}", folder.display()))?;
            writeln!(stdout, "Indexed {} new documents", added)?;
        }
        Some(Commands::Search { query, k }) => {
            let k = k.unwrap_or(engine.config().default_k);
            let hits = engine.search(&query.join(" "), k)?;
            write_hits(&mut stdout, &hits)?;
        }
        Some(Commands::Stats) => {
            write_stats(&mut stdout, &engine.stats()?)?;
        }
        Some(Commands::Merge) => {
            if engine.segment_count() < 2 {
                writeln!(stdout, "Nothing to merge")?;
            } else {
                let docs = engine.merge_smallest()?;
                writeln!(stdout, "Merged into a segment of {} documents", docs)?;
            }
        }
        Some(Commands::Delete { id, path }) => {
            let deleted = match (id, path) {
                (Some(id), _) => engine.delete_by_id(id)?,
                (None, Some(path)) => engine.delete_by_path(&path)?,
                (None, None) => bail!("either --id or --path is required"),
            };
            writeln!(stdout, "{}", if deleted { "Deleted" } else { "Not found" })?;
        }
        Some(Commands::Gc) => {
            let reclaimed = engine.collect_garbage()?;
            writeln!(stdout, "Reclaimed {} documents", reclaimed)?;
        }
        Some(Commands::Shell { docs }) => {
            run_shell(&mut engine, io::stdin().lock(), &mut stdout, &docs)?;
        }
        None => {
            run_shell(&mut engine, io::stdin().lock(), &mut stdout, &PathBuf::from("docs"))?;
        }
    }

    Ok(())
}
