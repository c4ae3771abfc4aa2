//! Shared helpers for engine integration tests

#![allow(dead_code)]

use segsearch::IndexEngine;
use segsearch::config::EngineConfig;
use segsearch::index::SourceDocument;
use std::path::Path;

/// Config with fsync off and the given auto-merge threshold
pub fn test_config(max_segments: usize) -> EngineConfig {
    EngineConfig {
        max_segments,
        sync_writes: false,
        ..EngineConfig::default()
    }
}

pub fn open(root: &Path) -> IndexEngine {
    open_with(root, usize::MAX)
}

pub fn open_with(root: &Path, max_segments: usize) -> IndexEngine {
    IndexEngine::open_with_config(root, test_config(max_segments)).expect("Failed to open index")
}

pub fn doc(path: &str, text: &str) -> SourceDocument {
    SourceDocument::new("", path, text)
}

/// Ingest one single-document batch per `(path, text)` pair
pub fn ingest_each(engine: &mut IndexEngine, docs: &[(&str, &str)]) {
    for (path, text) in docs {
        engine.ingest_batch(vec![doc(path, text)]).expect("Failed to ingest");
    }
}

/// `(id, score)` pairs of a search, for comparing result sets
pub fn ranked(engine: &IndexEngine, query: &str, k: usize) -> Vec<(u64, f64)> {
    engine
        .search(query, k)
        .expect("Search failed")
        .into_iter()
        .map(|hit| (hit.document.id, hit.score))
        .collect()
}
