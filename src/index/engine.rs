use crate::config::EngineConfig;
use crate::error::{IndexError, Result};
use crate::index::manifest::Manifest;
use crate::index::segment::Segment;
use crate::index::types::*;
use crate::index::writer::SegmentBuilder;
use crate::query::executor::QueryExecutor;
use crate::utils::normalize_path;
use rayon::prelude::*;
use roaring::RoaringTreemap;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Segmented index over one root directory.
///
/// Owns the manifest and the open segments. `doc_to_segment`, the tombstone
/// bitmap and the reverse path map are projections of the manifest plus
/// segment contents; they are rebuilt after every structural change and
/// never persisted on their own.
pub struct IndexEngine {
    root: PathBuf,
    config: EngineConfig,
    pub(crate) manifest: Manifest,
    pub(crate) segments: Vec<Segment>,
    pub(crate) doc_to_segment: FxHashMap<DocId, usize>,
    pub(crate) deleted: RoaringTreemap,
    doc_to_path: FxHashMap<DocId, String>,
}

impl IndexEngine {
    /// Open (or create) the index at `root` with default configuration
    pub fn open(root: &Path) -> Result<Self> {
        Self::open_with_config(root, EngineConfig::default())
    }

    /// Open (or create) the index at `root`, reconstructing every segment
    /// from the manifest
    pub fn open_with_config(root: &Path, config: EngineConfig) -> Result<Self> {
        fs::create_dir_all(root)?;
        let manifest = Manifest::load(root, config.sync_writes)?;
        sweep_orphans(root, &manifest)?;

        let segments = manifest
            .segments
            .iter()
            .map(|name| Segment::open(&root.join(name)))
            .collect::<Result<Vec<_>>>()?;

        // Warm doc tables in parallel; the doc_to_segment rebuild needs all of them
        segments
            .par_iter()
            .map(|segment| segment.docs().map(|_| ()))
            .collect::<Result<Vec<_>>>()?;

        let mut engine = Self {
            root: root.to_path_buf(),
            config,
            manifest,
            segments,
            doc_to_segment: FxHashMap::default(),
            deleted: RoaringTreemap::new(),
            doc_to_path: FxHashMap::default(),
        };
        engine.rebuild_derived()?;

        info!(
            root = %engine.root.display(),
            segments = engine.segments.len(),
            live_docs = engine.doc_to_segment.len(),
            "opened index"
        );
        Ok(engine)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names of the open segments, in order
    pub fn segment_names(&self) -> Vec<String> {
        self.segments.iter().map(|s| s.name().to_string()).collect()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Document total recorded in the manifest (the N used for IDF)
    pub fn total_docs(&self) -> u64 {
        self.manifest.total_docs
    }

    /// Number of documents that are neither tombstoned nor reclaimed
    pub fn live_doc_count(&self) -> usize {
        self.doc_to_segment.len()
    }

    pub fn is_deleted(&self, doc_id: DocId) -> bool {
        self.deleted.contains(doc_id)
    }

    /// Whether a source path has already been ingested and not deleted since
    pub fn has_seen(&self, path: &str) -> bool {
        self.manifest.seen_paths.contains(&normalize_path(path))
    }

    /// Index of the segment holding a live document
    pub fn segment_of(&self, doc_id: DocId) -> Option<usize> {
        self.doc_to_segment.get(&doc_id).copied()
    }

    /// Fetch a live document by id
    pub fn get_document(&self, doc_id: DocId) -> Result<Option<Document>> {
        let Some(index) = self.segment_of(doc_id) else {
            return Ok(None);
        };
        Ok(self.segments[index].docs()?.get(&doc_id).cloned())
    }

    /// Ingest a batch of documents as one new segment.
    ///
    /// Paths already in the seen set are skipped. Returns how many documents
    /// were added; when none are, no segment is written.
    pub fn ingest_batch(&mut self, sources: Vec<SourceDocument>) -> Result<usize> {
        let mut next = self.manifest.clone();
        let mut batch = Vec::with_capacity(sources.len());

        for source in sources {
            let path = normalize_path(&source.path);
            if next.seen_paths.contains(&path) {
                continue;
            }

            let doc_id = next.allocate_doc_id();
            // A freshly allocated id belongs to a new live document
            next.deleted_doc_ids.remove(&doc_id);
            next.seen_paths.insert(path.clone());
            next.path_to_doc_id.insert(path.clone(), doc_id);

            batch.push(Document {
                id: doc_id,
                title: source.title,
                path,
                text: source.text,
            });
        }

        let added = batch.len();
        let mut builder = SegmentBuilder::new().with_sync(self.config.sync_writes);
        if self.config.parallel_ingest {
            builder.add_documents(batch);
        } else {
            for doc in batch {
                builder.add_document(doc);
            }
        }
        // Ingestion never flushes an empty segment
        if builder.is_empty() {
            return Ok(0);
        }

        let name = next.allocate_segment_name();
        let dir = self.root.join(&name);
        builder.flush(&dir)?;

        next.segments.push(name.clone());
        next.total_docs += added as u64;
        if let Err(e) = next.write(&self.root, self.config.sync_writes) {
            // Unreferenced by any manifest; drop it so the name can be reused
            remove_segment_dir(&dir);
            return Err(e);
        }

        self.manifest = next;
        self.segments.push(Segment::open(&dir)?);
        self.rebuild_derived()?;

        info!(segment = %name, added, total_docs = self.manifest.total_docs, "ingested batch");

        self.auto_merge(self.config.max_segments)?;
        Ok(added)
    }

    /// Tombstone a document. Returns false if the id is unknown or already
    /// deleted. Segment files are untouched; space comes back on the next
    /// merge or compaction that includes the owning segment.
    pub fn delete_by_id(&mut self, doc_id: DocId) -> Result<bool> {
        let Some(&index) = self.doc_to_segment.get(&doc_id) else {
            return Ok(false);
        };
        if self.deleted.contains(doc_id) {
            return Ok(false);
        }

        let stored_path = self.segments[index].docs()?.get(&doc_id).map(|d| d.path.clone());
        let path = self.doc_to_path.get(&doc_id).cloned().or(stored_path);

        let mut next = self.manifest.clone();
        next.deleted_doc_ids.insert(doc_id);
        if let Some(path) = &path {
            if next.path_to_doc_id.get(path) == Some(&doc_id) {
                next.path_to_doc_id.remove(path);
            }
            next.seen_paths.remove(path);
        }
        next.write(&self.root, self.config.sync_writes)?;

        self.manifest = next;
        self.rebuild_derived()?;

        info!(doc_id, path = path.as_deref().unwrap_or(""), "deleted document");
        Ok(true)
    }

    /// Resolve a source path to its live document and tombstone it
    pub fn delete_by_path(&mut self, path: &str) -> Result<bool> {
        let normalized = normalize_path(path);

        let doc_id = match self.manifest.path_to_doc_id.get(&normalized) {
            Some(&doc_id) => doc_id,
            // Manifests written before the path map existed
            None => self
                .find_live_by_path(&normalized)?
                .ok_or_else(|| IndexError::NotFound(format!("no document for path {normalized}")))?,
        };

        self.delete_by_id(doc_id)
    }

    fn find_live_by_path(&self, path: &str) -> Result<Option<DocId>> {
        for (&doc_id, &index) in &self.doc_to_segment {
            if let Some(doc) = self.segments[index].docs()?.get(&doc_id) {
                if doc.path == path {
                    return Ok(Some(doc_id));
                }
            }
        }
        Ok(None)
    }

    /// Rank live documents against `query` and return the best `k`
    pub fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
        QueryExecutor::new(self).execute(query, k)
    }

    /// Recompute every projection from the manifest and the open segments
    pub(crate) fn rebuild_derived(&mut self) -> Result<()> {
        self.deleted = self.manifest.deleted_doc_ids.iter().copied().collect();
        self.doc_to_path = self
            .manifest
            .path_to_doc_id
            .iter()
            .map(|(path, &doc_id)| (doc_id, path.clone()))
            .collect();
        self.doc_to_segment = build_doc_to_segment(self.segments.iter(), &self.deleted)?;
        Ok(())
    }
}

/// doc id -> position in `segments`, skipping tombstoned ids. A later
/// segment wins if two ever hold the same id.
pub(crate) fn build_doc_to_segment<'a, I>(segments: I, deleted: &RoaringTreemap) -> Result<FxHashMap<DocId, usize>>
where
    I: IntoIterator<Item = &'a Segment>,
{
    let mut map = FxHashMap::default();
    for (index, segment) in segments.into_iter().enumerate() {
        for &doc_id in segment.docs()?.keys() {
            if !deleted.contains(doc_id) {
                map.insert(doc_id, index);
            }
        }
    }
    Ok(map)
}

/// Best-effort removal of a segment directory no manifest refers to
pub(crate) fn remove_segment_dir(dir: &Path) {
    if let Err(e) = fs::remove_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "failed to remove orphaned segment directory");
    }
}

/// Remove segment directories the manifest does not list and staging
/// directories left by an interrupted flush. Either would otherwise collide
/// with a future segment name.
fn sweep_orphans(root: &Path, manifest: &Manifest) -> Result<()> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let orphan = name.starts_with("seg_") && !manifest.segments.contains(&name);
        let staging = name.starts_with(".seg_") && name.ends_with(".tmp");
        if orphan || staging {
            warn!(dir = %name, "removing segment directory not referenced by the manifest");
            remove_segment_dir(&entry.path());
        }
    }
    Ok(())
}
