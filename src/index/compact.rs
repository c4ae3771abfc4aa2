//! Merge policy and compaction.
//!
//! Deleted documents are only dropped from disk when their owning segment
//! is rewritten, either merged with another segment or compacted on its
//! own. Every rewrite flushes a fresh segment, swaps it into the manifest
//! atomically, then removes the source directories.

use crate::error::{IndexError, Result};
use crate::index::engine::{IndexEngine, build_doc_to_segment, remove_segment_dir};
use crate::index::segment::Segment;
use crate::index::types::DocId;
use crate::index::writer::SegmentBuilder;
use roaring::RoaringTreemap;
use std::path::PathBuf;
use tracing::info;

impl IndexEngine {
    /// Merge the two segments with the fewest stored documents.
    /// Returns the new segment's document count, or 0 with fewer than two segments.
    pub fn merge_smallest(&mut self) -> Result<u64> {
        if self.segments.len() < 2 {
            return Ok(0);
        }

        let mut sizes = Vec::with_capacity(self.segments.len());
        for (index, segment) in self.segments.iter().enumerate() {
            sizes.push((segment.meta()?.doc_count, index));
        }
        // Stable: equal counts keep list order
        sizes.sort_by_key(|&(doc_count, _)| doc_count);

        let a = self.segments[sizes[0].1].name().to_string();
        let b = self.segments[sizes[1].1].name().to_string();
        self.merge_segments(&a, &b)
    }

    /// Merge segments `a` and `b` into a new segment without their
    /// tombstoned documents. Returns the new segment's document count.
    pub fn merge_segments(&mut self, a: &str, b: &str) -> Result<u64> {
        let index_a = self.find_segment(a);
        let index_b = self.find_segment(b);
        let (Some(index_a), Some(index_b)) = (index_a, index_b) else {
            return Err(IndexError::NotFound(format!("could not find both segments: {a}, {b}")));
        };
        if index_a == index_b {
            return Err(IndexError::InvalidArgument(format!("cannot merge segment {a} with itself")));
        }

        self.rewrite_segments(&[index_a, index_b])
    }

    /// Merge smallest pairs while more than `max_segments` are open. Stops
    /// early when a merge produces an empty segment.
    /// Returns the number of merges performed.
    pub fn auto_merge(&mut self, max_segments: usize) -> Result<usize> {
        let mut merges = 0;
        while self.segments.len() > max_segments && self.segments.len() >= 2 {
            let merged = self.merge_smallest()?;
            merges += 1;
            if merged == 0 {
                break;
            }
        }
        Ok(merges)
    }

    /// Rewrite the only open segment without its tombstoned documents.
    /// No-op returning 0 unless exactly one segment is open.
    pub fn compact_one(&mut self) -> Result<u64> {
        if self.segments.len() != 1 {
            return Ok(0);
        }
        self.rewrite_segments(&[0])
    }

    /// Reclaim every tombstone: merge down to one segment, then compact it
    /// if deleted documents remain. Returns how many tombstones were reclaimed.
    pub fn collect_garbage(&mut self) -> Result<usize> {
        let before = self.manifest.deleted_doc_ids.len();

        while self.segments.len() > 1 {
            self.merge_smallest()?;
        }

        if let Some(segment) = self.segments.first() {
            let has_tombstones = segment.docs()?.keys().any(|&id| self.deleted.contains(id));
            if has_tombstones {
                self.compact_one()?;
            }
        }

        let reclaimed = before.saturating_sub(self.manifest.deleted_doc_ids.len());
        info!(reclaimed, segments = self.segments.len(), "garbage collection finished");
        Ok(reclaimed)
    }

    fn find_segment(&self, name: &str) -> Option<usize> {
        self.segments.iter().position(|s| s.name() == name)
    }

    /// Replace the segments at `sources` (later sources win on id collisions)
    /// with one new segment appended at the end of the list.
    fn rewrite_segments(&mut self, sources: &[usize]) -> Result<u64> {
        let mut builder = SegmentBuilder::new().with_sync(self.config().sync_writes);
        let mut reclaimed: Vec<DocId> = Vec::new();
        let mut source_names: Vec<String> = Vec::with_capacity(sources.len());

        for &index in sources {
            let segment = &self.segments[index];
            builder.absorb(segment, &self.deleted)?;
            reclaimed.extend(segment.docs()?.keys().copied().filter(|&id| self.deleted.contains(id)));
            source_names.push(segment.name().to_string());
        }

        let mut next = self.manifest.clone();
        let name = next.allocate_segment_name();
        let dir = self.root().join(&name);
        let meta = builder.flush(&dir)?;
        let merged = Segment::open(&dir)?;

        // Tombstones for documents that no longer exist on disk
        for id in &reclaimed {
            next.deleted_doc_ids.remove(id);
        }
        let deleted: RoaringTreemap = next.deleted_doc_ids.iter().copied().collect();

        let kept: Vec<&Segment> = self
            .segments
            .iter()
            .enumerate()
            .filter(|(index, _)| !sources.contains(index))
            .map(|(_, segment)| segment)
            .collect();
        let doc_to_segment = match build_doc_to_segment(kept.into_iter().chain(Some(&merged)), &deleted) {
            Ok(map) => map,
            Err(e) => {
                remove_segment_dir(&dir);
                return Err(e);
            }
        };

        next.segments.retain(|s| !source_names.contains(s));
        next.segments.push(name.clone());
        next.total_docs = doc_to_segment.len() as u64;

        if let Err(e) = next.write(self.root(), self.config().sync_writes) {
            remove_segment_dir(&dir);
            return Err(e);
        }

        // Manifest committed; swap in-memory state to match
        let mut index = 0;
        let mut old_dirs: Vec<PathBuf> = Vec::with_capacity(sources.len());
        self.segments.retain(|segment| {
            let keep = !sources.contains(&index);
            if !keep {
                old_dirs.push(segment.dir().to_path_buf());
            }
            index += 1;
            keep
        });
        self.segments.push(merged);
        self.manifest = next;
        self.rebuild_derived()?;

        for old in &old_dirs {
            remove_segment_dir(old);
        }

        info!(
            sources = ?source_names,
            segment = %name,
            docs = meta.doc_count,
            reclaimed = reclaimed.len(),
            "rewrote segments"
        );
        Ok(meta.doc_count)
    }
}
