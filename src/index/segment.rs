use crate::error::{IndexError, Result};
use crate::index::types::*;
use crate::utils::ByteReader;
use memmap2::Mmap;
use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

/// Read-only view over a flushed segment directory.
///
/// Each file is decoded on first access and cached for the lifetime of the
/// `Segment`. A segment dropped from the engine's list after a merge is
/// stale and must not be queried again.
pub struct Segment {
    name: String,
    dir: PathBuf,
    docs: OnceLock<DocTable>,
    postings: OnceLock<Postings>,
    doclen: OnceLock<DocLengths>,
    termdf: OnceLock<TermDocFreqs>,
    meta: OnceLock<SegmentMeta>,
}

impl Segment {
    /// Open a segment directory without reading any of its files
    pub fn open(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(IndexError::corrupt(dir, "segment directory is missing"));
        }
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| IndexError::corrupt(dir, "segment directory has no name"))?;

        Ok(Self {
            name,
            dir: dir.to_path_buf(),
            docs: OnceLock::new(),
            postings: OnceLock::new(),
            doclen: OnceLock::new(),
            termdf: OnceLock::new(),
            meta: OnceLock::new(),
        })
    }

    /// Directory name, e.g. `seg_000003`
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn docs(&self) -> Result<&DocTable> {
        load_cached(&self.docs, || self.decode_file(DOCS_FILE, decode_docs))
    }

    pub fn postings(&self) -> Result<&Postings> {
        load_cached(&self.postings, || self.decode_file(POSTINGS_FILE, decode_postings))
    }

    pub fn doclen(&self) -> Result<&DocLengths> {
        load_cached(&self.doclen, || self.decode_file(DOCLEN_FILE, decode_doclen))
    }

    pub fn termdf(&self) -> Result<&TermDocFreqs> {
        load_cached(&self.termdf, || self.decode_file(TERMDF_FILE, decode_termdf))
    }

    pub fn meta(&self) -> Result<&SegmentMeta> {
        load_cached(&self.meta, || {
            let path = self.dir.join(META_FILE);
            let file = open_segment_file(&path)?;
            serde_json::from_reader(std::io::BufReader::new(file))
                .map_err(|e| IndexError::corrupt(&path, e.to_string()))
        })
    }

    /// Term frequency of `term` in `doc_id`, 0 if absent
    pub fn term_freq(&self, term: &str, doc_id: DocId) -> Result<u32> {
        Ok(self
            .postings()?
            .get(term)
            .and_then(|doc_map| doc_map.get(&doc_id))
            .copied()
            .unwrap_or(0))
    }

    /// Segment-local document frequency of `term`
    pub fn doc_freq(&self, term: &str) -> Result<u32> {
        Ok(self.termdf()?.get(term).copied().unwrap_or(0))
    }

    /// Map a file into memory and decode it
    fn decode_file<T>(&self, file_name: &str, decode: fn(&mut ByteReader<'_>) -> Option<T>) -> Result<T> {
        let path = self.dir.join(file_name);
        let file = open_segment_file(&path)?;

        if file.metadata()?.len() == 0 {
            return Err(IndexError::corrupt(&path, "file is empty"));
        }
        // SAFETY: segment files are immutable once the directory is renamed into place
        let mmap = unsafe { Mmap::map(&file)? };

        let mut reader = ByteReader::new(&mmap);
        let value = decode(&mut reader)
            .ok_or_else(|| IndexError::corrupt(&path, format!("malformed data near byte {}", reader.position())))?;
        if !reader.is_exhausted() {
            return Err(IndexError::corrupt(&path, "trailing bytes after last entry"));
        }

        debug!(segment = %self.name, file = file_name, "loaded segment file");
        Ok(value)
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Segment")
            .field("name", &self.name)
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

/// Memoized accessor for a fallible load. Errors are not cached, so a later
/// call retries the load.
fn load_cached<T, F>(cell: &OnceLock<T>, load: F) -> Result<&T>
where
    F: FnOnce() -> Result<T>,
{
    if let Some(value) = cell.get() {
        return Ok(value);
    }
    let value = load()?;
    Ok(cell.get_or_init(|| value))
}

fn open_segment_file(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => IndexError::corrupt(path, "required file is missing"),
        _ => IndexError::Io(e),
    })
}

fn decode_docs(reader: &mut ByteReader<'_>) -> Option<DocTable> {
    let count = reader.u32_le()?;
    let mut docs = DocTable::new();
    for _ in 0..count {
        let id = reader.varint_u64()?;
        let title = reader.string()?;
        let path = reader.string()?;
        let text = reader.string()?;
        docs.insert(id, Document { id, title, path, text });
    }
    Some(docs)
}

fn decode_postings(reader: &mut ByteReader<'_>) -> Option<Postings> {
    let count = reader.u32_le()?;
    let mut postings = Postings::new();
    for _ in 0..count {
        let term = reader.string()?;
        let entries = reader.u32_le()? as usize;
        let pairs = reader.delta_pairs(entries)?;
        postings.insert(term, pairs.into_iter().collect());
    }
    Some(postings)
}

fn decode_doclen(reader: &mut ByteReader<'_>) -> Option<DocLengths> {
    let count = reader.u32_le()? as usize;
    Some(reader.delta_pairs(count)?.into_iter().collect())
}

fn decode_termdf(reader: &mut ByteReader<'_>) -> Option<TermDocFreqs> {
    let count = reader.u32_le()?;
    let mut termdf = TermDocFreqs::new();
    for _ in 0..count {
        let term = reader.string()?;
        let df = reader.varint()?;
        termdf.insert(term, df);
    }
    Some(termdf)
}
