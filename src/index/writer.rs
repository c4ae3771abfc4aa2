use crate::error::{IndexError, Result};
use crate::index::segment::Segment;
use crate::index::types::*;
use crate::utils::{delta_encode_pairs, encode_varint, encode_varint_u64, put_string, put_u32_le};
use rayon::prelude::*;
use roaring::RoaringTreemap;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, warn};

/// In-memory accumulator that flushes into a new immutable segment directory
#[derive(Debug, Default)]
pub struct SegmentBuilder {
    docs: DocTable,
    postings: Postings,
    doclen: DocLengths,
    sync: bool,
}

impl SegmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// fsync every segment file and the parent directory on flush
    pub fn with_sync(mut self, sync: bool) -> Self {
        self.sync = sync;
        self
    }

    /// Tokenize and record a document. A second document with the same id
    /// replaces the first.
    pub fn add_document(&mut self, doc: Document) {
        self.add_analyzed(AnalyzedDoc::analyze(doc));
    }

    /// Tokenize a batch on the rayon pool, then accumulate in input order.
    /// Produces the same builder state as calling `add_document` for each.
    pub fn add_documents(&mut self, docs: Vec<Document>) {
        let analyzed: Vec<AnalyzedDoc> = docs.into_par_iter().map(AnalyzedDoc::analyze).collect();
        for doc in analyzed {
            self.add_analyzed(doc);
        }
    }

    /// Record a pre-analysed document
    pub fn add_analyzed(&mut self, analyzed: AnalyzedDoc) {
        let AnalyzedDoc { doc, doclen, freqs } = analyzed;
        let doc_id = doc.id;

        if self.docs.contains_key(&doc_id) {
            self.remove_postings(doc_id);
        }

        for (term, freq) in freqs {
            self.postings.entry(term).or_default().insert(doc_id, freq);
        }
        self.doclen.insert(doc_id, doclen);
        self.docs.insert(doc_id, doc);
    }

    /// Copy every document of `segment` that is not in `deleted`, reusing the
    /// segment's stored doclen and postings instead of re-tokenizing.
    /// Returns the number of documents copied.
    pub fn absorb(&mut self, segment: &Segment, deleted: &RoaringTreemap) -> Result<usize> {
        let docs = segment.docs()?;
        let doclen = segment.doclen()?;
        let postings = segment.postings()?;

        let mut copied = 0;
        for (&doc_id, doc) in docs {
            if deleted.contains(doc_id) {
                continue;
            }
            if self.docs.contains_key(&doc_id) {
                self.remove_postings(doc_id);
            }
            self.docs.insert(doc_id, doc.clone());
            if let Some(&len) = doclen.get(&doc_id) {
                self.doclen.insert(doc_id, len);
            }
            copied += 1;
        }

        for (term, doc_map) in postings {
            for (&doc_id, &freq) in doc_map {
                if deleted.contains(doc_id) || freq == 0 {
                    continue;
                }
                self.postings.entry(term.clone()).or_default().insert(doc_id, freq);
            }
        }

        debug!(segment = segment.name(), copied, "absorbed segment");
        Ok(copied)
    }

    /// Drop every posting of a document (used when a later record replaces it)
    fn remove_postings(&mut self, doc_id: DocId) {
        self.postings.retain(|_, doc_map| {
            doc_map.remove(&doc_id);
            !doc_map.is_empty()
        });
    }

    /// Get current document count
    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Per-term document frequency: distinct docs with a nonzero count
    pub fn term_doc_freqs(&self) -> TermDocFreqs {
        self.postings
            .iter()
            .map(|(term, doc_map)| {
                let df = doc_map.values().filter(|&&freq| freq > 0).count() as u32;
                (term.clone(), df)
            })
            .filter(|(_, df)| *df > 0)
            .collect()
    }

    /// Write the segment into `target`, which must not exist yet.
    ///
    /// Files are written into a hidden staging directory next to the target
    /// and renamed into place once complete, so `target` is either absent or
    /// holds a full segment.
    pub fn flush(&self, target: &Path) -> Result<SegmentMeta> {
        if target.exists() {
            return Err(IndexError::AlreadyExists(target.to_path_buf()));
        }

        let parent = target
            .parent()
            .ok_or_else(|| IndexError::InvalidArgument(format!("no parent for {}", target.display())))?;
        let name = target
            .file_name()
            .ok_or_else(|| IndexError::InvalidArgument(format!("no name for {}", target.display())))?;
        let staging = parent.join(format!(".{}.tmp", name.to_string_lossy()));

        // Leftover from a crash mid-flush
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }
        fs::create_dir_all(&staging)?;

        let meta = SegmentMeta {
            doc_count: self.docs.len() as u64,
            created_at_unix: unix_now(),
        };

        self.write_file(&staging.join(DOCS_FILE), &encode_docs(&self.docs))?;
        self.write_file(&staging.join(POSTINGS_FILE), &encode_postings(&self.postings))?;
        self.write_file(&staging.join(DOCLEN_FILE), &encode_doclen(&self.doclen))?;
        self.write_file(&staging.join(TERMDF_FILE), &encode_termdf(&self.term_doc_freqs()))?;
        let meta_json = serde_json::to_vec_pretty(&meta).map_err(std::io::Error::other)?;
        self.write_file(&staging.join(META_FILE), &meta_json)?;

        if let Err(e) = fs::rename(&staging, target) {
            discard_staging(&staging);
            if target.exists() {
                return Err(IndexError::AlreadyExists(target.to_path_buf()));
            }
            return Err(e.into());
        }

        if self.sync {
            File::open(parent)?.sync_all()?;
        }

        debug!(
            segment = %target.display(),
            docs = meta.doc_count,
            terms = self.postings.len(),
            "flushed segment"
        );
        Ok(meta)
    }

    fn write_file(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(bytes)?;
        if self.sync {
            file.sync_all()?;
        }
        Ok(())
    }
}

/// Best-effort removal of a staging directory after a failed commit rename
fn discard_staging(staging: &Path) {
    if let Err(e) = fs::remove_dir_all(staging) {
        warn!(dir = %staging.display(), error = %e, "failed to remove staging directory");
    }
}

pub(crate) fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// docs: count, then per doc: varint id, title, path, text
pub(crate) fn encode_docs(docs: &DocTable) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32_le(&mut buf, docs.len() as u32);
    for (&doc_id, doc) in docs {
        encode_varint_u64(doc_id, &mut buf);
        put_string(&mut buf, &doc.title);
        put_string(&mut buf, &doc.path);
        put_string(&mut buf, &doc.text);
    }
    buf
}

/// postings: term count, then per term: term, entry count, delta-encoded (id, tf) pairs
pub(crate) fn encode_postings(postings: &Postings) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32_le(&mut buf, postings.len() as u32);
    for (term, doc_map) in postings {
        put_string(&mut buf, term);
        put_u32_le(&mut buf, doc_map.len() as u32);
        delta_encode_pairs(doc_map.iter().map(|(&id, &tf)| (id, tf)), &mut buf);
    }
    buf
}

/// doclen: count, then delta-encoded (id, length) pairs
pub(crate) fn encode_doclen(doclen: &DocLengths) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32_le(&mut buf, doclen.len() as u32);
    delta_encode_pairs(doclen.iter().map(|(&id, &len)| (id, len)), &mut buf);
    buf
}

/// termdf: count, then per term: term, varint df
pub(crate) fn encode_termdf(termdf: &TermDocFreqs) -> Vec<u8> {
    let mut buf = Vec::new();
    put_u32_le(&mut buf, termdf.len() as u32);
    for (term, &df) in termdf {
        put_string(&mut buf, term);
        encode_varint(df, &mut buf);
    }
    buf
}
