use crate::utils::tokenize;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Globally unique document identifier. Assigned from the manifest counter
/// and never reused, even after deletion.
pub type DocId = u64;

/// Segment sequence number, the numeric suffix of `seg_NNNNNN`
pub type SegmentId = u64;

/// Manifest file name inside the index root
pub const MANIFEST_FILE: &str = "manifest.json";

/// Files making up a flushed segment directory
pub const DOCS_FILE: &str = "docs";
pub const POSTINGS_FILE: &str = "postings";
pub const DOCLEN_FILE: &str = "doclen";
pub const TERMDF_FILE: &str = "termdf";
pub const META_FILE: &str = "meta.json";

/// Segment directory name for a sequence number
pub fn segment_name(id: SegmentId) -> String {
    format!("seg_{:06}", id)
}

/// doc id -> document body
pub type DocTable = BTreeMap<DocId, Document>;

/// term -> (doc id -> term frequency)
pub type Postings = BTreeMap<String, BTreeMap<DocId, u32>>;

/// doc id -> token count of title + text
pub type DocLengths = BTreeMap<DocId, u32>;

/// term -> number of documents in the segment containing it
pub type TermDocFreqs = BTreeMap<String, u32>;

/// The atomic indexed unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub path: String,
    pub text: String,
}

impl Document {
    /// Text that gets tokenized for this document
    pub fn indexed_text(&self) -> String {
        format!("{} {}", self.title, self.text)
    }
}

/// A document handed to the engine by an ingestion front end, before it has an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub title: String,
    pub path: String,
    pub text: String,
}

impl SourceDocument {
    pub fn new(title: impl Into<String>, path: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            path: path.into(),
            text: text.into(),
        }
    }
}

/// Segment header stored in meta.json
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentMeta {
    #[serde(rename = "docCount")]
    pub doc_count: u64,
    pub created_at_unix: u64,
}

/// Per-document term statistics, computed independently of any builder so
/// a batch can be analysed in parallel
#[derive(Debug, Clone)]
pub struct AnalyzedDoc {
    pub doc: Document,
    pub doclen: u32,
    pub freqs: FxHashMap<String, u32>,
}

impl AnalyzedDoc {
    pub fn analyze(doc: Document) -> Self {
        let tokens = tokenize(&doc.indexed_text());
        let doclen = tokens.len() as u32;

        let mut freqs: FxHashMap<String, u32> = FxHashMap::default();
        for token in tokens {
            *freqs.entry(token).or_insert(0) += 1;
        }

        Self { doc, doclen, freqs }
    }
}

/// A ranked search result
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub score: f64,
    pub document: Document,
}
