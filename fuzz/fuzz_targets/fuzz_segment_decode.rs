#![no_main]

use libfuzzer_sys::fuzz_target;
use segsearch::index::{DOCLEN_FILE, DOCS_FILE, META_FILE, POSTINGS_FILE, Segment, TERMDF_FILE};
use std::fs;

fuzz_target!(|data: &[u8]| {
    // Every segment file gets the same bytes; decoding must fail cleanly, never panic
    let Ok(dir) = tempfile::tempdir() else {
        return;
    };
    let seg_dir = dir.path().join("seg_000001");
    if fs::create_dir(&seg_dir).is_err() {
        return;
    }
    for name in [DOCS_FILE, POSTINGS_FILE, DOCLEN_FILE, TERMDF_FILE, META_FILE] {
        if fs::write(seg_dir.join(name), data).is_err() {
            return;
        }
    }

    let Ok(segment) = Segment::open(&seg_dir) else {
        return;
    };
    let _ = segment.docs();
    let _ = segment.postings();
    let _ = segment.doclen();
    let _ = segment.termdf();
    let _ = segment.meta();
    let _ = segment.term_freq("a", 1);
    let _ = segment.doc_freq("a");
});
