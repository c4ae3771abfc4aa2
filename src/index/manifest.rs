//! Durable record of index structure.
//!
//! The manifest is the only mutable file in an index root and the sole
//! source of truth on recovery: segment list, id counters, tombstones and
//! the path mapping. It is always replaced atomically (write a temp file in
//! the same directory, then rename over `manifest.json`), so a reader sees
//! either the previous or the new manifest, never a torn one.

use crate::error::{IndexError, Result};
use crate::index::types::{DocId, MANIFEST_FILE, SegmentId, segment_name};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Current manifest format version
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: u32,
    /// Live segment names, in engine order
    pub segments: Vec<String>,
    /// Next document id to hand out
    pub next_id: DocId,
    /// Next segment sequence number
    #[serde(default = "default_next_segment_id")]
    pub next_segment_id: SegmentId,
    pub total_docs: u64,
    /// Source paths already ingested
    #[serde(default, rename = "seen")]
    pub seen_paths: BTreeSet<String>,
    /// Tombstoned doc ids not yet reclaimed by a merge
    #[serde(default)]
    pub deleted_doc_ids: BTreeSet<DocId>,
    #[serde(default)]
    pub path_to_doc_id: BTreeMap<String, DocId>,
}

fn default_next_segment_id() -> SegmentId {
    1
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            segments: Vec::new(),
            next_id: 1,
            next_segment_id: default_next_segment_id(),
            total_docs: 0,
            seen_paths: BTreeSet::new(),
            deleted_doc_ids: BTreeSet::new(),
            path_to_doc_id: BTreeMap::new(),
        }
    }
}

impl Manifest {
    /// Path of the manifest file inside an index root
    pub fn path(root: &Path) -> PathBuf {
        root.join(MANIFEST_FILE)
    }

    /// Load the manifest from `root`, or create and persist a fresh one.
    ///
    /// Fields added after version 1 (`pathToDocId`, `deletedDocIds`, `seen`,
    /// `nextSegmentId`) are backfilled with defaults when absent.
    pub fn load(root: &Path, sync: bool) -> Result<Self> {
        let path = Self::path(root);

        match fs::read(&path) {
            Ok(bytes) => {
                let mut manifest: Manifest = serde_json::from_slice(&bytes)
                    .map_err(|source| IndexError::CorruptManifest { path: path.clone(), source })?;
                manifest.reconcile_segment_counter();
                debug!(
                    path = %path.display(),
                    segments = manifest.segments.len(),
                    next_id = manifest.next_id,
                    "loaded manifest"
                );
                Ok(manifest)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let manifest = Manifest::default();
                manifest.write(root, sync)?;
                info!(root = %root.display(), "initialized new index");
                Ok(manifest)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Atomically replace the manifest in `root`
    pub fn write(&self, root: &Path, sync: bool) -> Result<()> {
        let final_path = Self::path(root);
        let temp_path = root.join(format!("{}.tmp", MANIFEST_FILE));

        let fail = |source: std::io::Error| IndexError::ManifestWrite {
            path: final_path.clone(),
            source,
        };

        let bytes = serde_json::to_vec_pretty(self).map_err(|e| fail(e.into()))?;

        let mut file = File::create(&temp_path).map_err(fail)?;
        file.write_all(&bytes).map_err(fail)?;
        if sync {
            file.sync_all().map_err(fail)?;
        }
        drop(file);

        if let Err(e) = fs::rename(&temp_path, &final_path) {
            let _ = fs::remove_file(&temp_path);
            return Err(fail(e));
        }

        if sync {
            File::open(root).and_then(|dir| dir.sync_all()).map_err(fail)?;
        }
        Ok(())
    }

    /// Keep the segment counter ahead of every listed `seg_NNNNNN` name, so
    /// a backfilled `nextSegmentId` never reuses a live directory
    fn reconcile_segment_counter(&mut self) {
        let highest = self
            .segments
            .iter()
            .filter_map(|name| name.strip_prefix("seg_")?.parse::<SegmentId>().ok())
            .max();
        if let Some(highest) = highest {
            self.next_segment_id = self.next_segment_id.max(highest + 1);
        }
    }

    /// Hand out the next document id
    pub fn allocate_doc_id(&mut self) -> DocId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Hand out the next segment directory name
    pub fn allocate_segment_name(&mut self) -> String {
        let id = self.next_segment_id;
        self.next_segment_id += 1;
        segment_name(id)
    }
}
