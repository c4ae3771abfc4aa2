use crate::error::Result;
use crate::index::engine::IndexEngine;
use std::path::{Path, PathBuf};

/// Per-segment summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentInfo {
    pub name: String,
    /// Physical documents stored, tombstoned ones included
    pub doc_count: u64,
    /// Documents still searchable
    pub live_docs: u64,
    pub created_at_unix: u64,
}

/// Index-wide summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub root: PathBuf,
    pub total_docs: u64,
    pub live_docs: u64,
    pub tombstones: u64,
    pub next_id: u64,
    pub segments: Vec<SegmentInfo>,
    pub disk_bytes: u64,
}

impl IndexEngine {
    /// `(name, docCount)` for every open segment, in order
    pub fn list_segments(&self) -> Result<Vec<(String, u64)>> {
        self.segments
            .iter()
            .map(|segment| Ok((segment.name().to_string(), segment.meta()?.doc_count)))
            .collect()
    }

    /// Collect index statistics
    pub fn stats(&self) -> Result<IndexStats> {
        let mut live_per_segment = vec![0u64; self.segments.len()];
        for &index in self.doc_to_segment.values() {
            live_per_segment[index] += 1;
        }

        let mut segments = Vec::with_capacity(self.segments.len());
        for (segment, live_docs) in self.segments.iter().zip(live_per_segment) {
            let meta = segment.meta()?;
            segments.push(SegmentInfo {
                name: segment.name().to_string(),
                doc_count: meta.doc_count,
                live_docs,
                created_at_unix: meta.created_at_unix,
            });
        }

        Ok(IndexStats {
            root: self.root().to_path_buf(),
            total_docs: self.manifest.total_docs,
            live_docs: self.doc_to_segment.len() as u64,
            tombstones: self.manifest.deleted_doc_ids.len() as u64,
            next_id: self.manifest.next_id,
            segments,
            disk_bytes: dir_size(self.root()).unwrap_or(0),
        })
    }
}

/// Calculate directory size recursively
fn dir_size(path: &Path) -> std::io::Result<u64> {
    let mut size = 0;
    if path.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let entry = entry?;
            let path = entry.path();
            if path.is_file() {
                size += entry.metadata()?.len();
            } else if path.is_dir() {
                size += dir_size(&path)?;
            }
        }
    }
    Ok(size)
}
