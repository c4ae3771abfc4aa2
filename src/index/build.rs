use crate::error::{IndexError, Result};
use crate::index::engine::IndexEngine;
use crate::index::types::SourceDocument;
use crate::utils::progress::{read_bar, scan_spinner};
use crate::utils::{normalize_path, title_from_path};
use globset::{GlobBuilder, GlobMatcher};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Documents are plain `.txt` files, extension matched case-insensitively
const DOCUMENT_GLOB: &str = "*.txt";

fn document_matcher() -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(DOCUMENT_GLOB)
        .case_insensitive(true)
        .literal_separator(true)
        .build()
        .map_err(|e| IndexError::InvalidArgument(e.to_string()))?;
    Ok(glob.compile_matcher())
}

/// Read every top-level `.txt` file in `folder`, in file name order.
///
/// Paths for which `skip` returns true are left unread. Files that fail to
/// read are logged and skipped; invalid UTF-8 is replaced.
pub fn scan_folder<F>(folder: &Path, skip: F, silent: bool) -> Result<Vec<SourceDocument>>
where
    F: Fn(&str) -> bool,
{
    if !folder.is_dir() {
        return Err(IndexError::NotFound(format!("folder {}", folder.display())));
    }

    let matcher = document_matcher()?;
    let spinner = scan_spinner(silent);

    let walker = WalkBuilder::new(folder)
        .max_depth(Some(1))
        .standard_filters(false)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut pending: Vec<(PathBuf, String)> = Vec::new();
    let mut skipped = 0usize;
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "failed to read folder entry");
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        if !matcher.is_match(entry.file_name()) {
            continue;
        }

        let path = normalize_path(&entry.path().to_string_lossy());
        if skip(&path) {
            skipped += 1;
            continue;
        }
        pending.push((entry.into_path(), path));
    }

    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    debug!(folder = %folder.display(), pending = pending.len(), skipped, "scanned folder");

    let bar = read_bar(pending.len() as u64, silent);

    let docs: Vec<SourceDocument> = pending
        .par_iter()
        .filter_map(|(file, path)| {
            let result = fs::read(file);
            if let Some(bar) = &bar {
                bar.inc(1);
            }
            match result {
                Ok(bytes) => Some(SourceDocument::new(
                    title_from_path(file),
                    path.clone(),
                    String::from_utf8_lossy(&bytes).into_owned(),
                )),
                Err(e) => {
                    warn!(path = %path, error = %e, "failed to read document, skipping");
                    None
                }
            }
        })
        .collect();

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    Ok(docs)
}

/// Ingest every new `.txt` file in `folder` as one batch
pub fn index_folder(engine: &mut IndexEngine, folder: &Path, silent: bool) -> Result<usize> {
    let docs = scan_folder(folder, |path| engine.has_seen(path), silent)?;
    if docs.is_empty() {
        info!(folder = %folder.display(), "no new documents");
        return Ok(0);
    }

    let added = engine.ingest_batch(docs)?;
    info!(folder = %folder.display(), added, "indexed folder");
    Ok(added)
}
