//! End-to-end tests driving the engine through its public API.

mod fixtures;

use fixtures::{doc, ingest_each, open, open_with, ranked};
use segsearch::IndexError;
use segsearch::index::build::index_folder;
use segsearch::index::{DOCS_FILE, Manifest, POSTINGS_FILE};
use std::fs;

#[test]
fn test_apple_banana_ranking() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open(dir.path());
    engine
        .ingest_batch(vec![doc("a.txt", "apple"), doc("b.txt", "apple banana")])
        .unwrap();

    let hits = ranked(&engine, "apple", 10);
    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].0, 1);
    assert!((hits[0].1 - 1.0).abs() < 1e-9);
    assert_eq!(hits[1].0, 2);
    assert!((hits[1].1 - 0.70710678).abs() < 1e-6);
}

#[test]
fn test_title_is_searchable() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open(dir.path());
    engine
        .ingest_batch(vec![segsearch::index::SourceDocument::new(
            "Quarterly Report",
            "docs/q3.txt",
            "numbers went up",
        )])
        .unwrap();

    let hits = engine.search("quarterly", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.title, "Quarterly Report");
}

#[test]
fn test_compact_one_drops_deleted_doc() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open(dir.path());
    engine
        .ingest_batch(vec![doc("a.txt", "apple"), doc("b.txt", "apple banana")])
        .unwrap();
    engine.delete_by_id(1).unwrap();

    assert_eq!(engine.compact_one().unwrap(), 1);

    let segment = &engine.segments()[0];
    let ids: Vec<u64> = segment.docs().unwrap().keys().copied().collect();
    assert_eq!(ids, vec![2]);
    assert_eq!(segment.meta().unwrap().doc_count, 1);
    assert!(engine.manifest().deleted_doc_ids.is_empty());
    assert_eq!(engine.total_docs(), 1);
}

#[test]
fn test_delete_then_reingest_gets_fresh_id() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open(dir.path());
    ingest_each(&mut engine, &[("docs/a.txt", "cherry tart")]);

    assert!(engine.delete_by_path("docs/a.txt").unwrap());
    assert!(engine.search("cherry", 10).unwrap().is_empty());

    ingest_each(&mut engine, &[("docs/a.txt", "cherry crumble")]);
    let hits = ranked(&engine, "cherry", 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].0, 2);

    // The old id stays dead after a full rewrite too
    engine.collect_garbage().unwrap();
    assert_eq!(engine.get_document(1).unwrap(), None);
    assert_eq!(ranked(&engine, "cherry", 10)[0].0, 2);
}

#[test]
fn test_merge_preserves_results() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open(dir.path());
    ingest_each(
        &mut engine,
        &[
            ("a.txt", "red apple green pear"),
            ("b.txt", "green grape"),
            ("c.txt", "red cherry red plum"),
        ],
    );
    let queries = ["red", "green", "apple plum", "grape pear cherry"];
    let before: Vec<_> = queries.iter().map(|q| ranked(&engine, q, 10)).collect();

    let names = engine.segment_names();
    engine.merge_segments(&names[0], &names[2]).unwrap();
    assert_eq!(engine.segment_count(), 2);

    let after: Vec<_> = queries.iter().map(|q| ranked(&engine, q, 10)).collect();
    assert_eq!(before, after);
}

#[test]
fn test_merge_errors() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open(dir.path());
    ingest_each(&mut engine, &[("a.txt", "one"), ("b.txt", "two")]);

    assert!(matches!(
        engine.merge_segments("seg_000001", "seg_000001"),
        Err(IndexError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.merge_segments("seg_000001", "seg_999999"),
        Err(IndexError::NotFound(_))
    ));
    assert_eq!(engine.segment_count(), 2);
}

#[test]
fn test_auto_merge_after_ingest() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open_with(dir.path(), 3);

    for i in 0..10 {
        let path = format!("doc_{i}.txt");
        engine.ingest_batch(vec![doc(&path, "lorem ipsum")]).unwrap();
        assert!(engine.segment_count() <= 3);
    }
    assert_eq!(engine.live_doc_count(), 10);
    assert_eq!(engine.search("lorem", 100).unwrap().len(), 10);
}

#[test]
fn test_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let before;
    {
        let mut engine = open(dir.path());
        ingest_each(
            &mut engine,
            &[("a.txt", "sun moon"), ("b.txt", "moon stars"), ("c.txt", "stars sun")],
        );
        engine.delete_by_path("b.txt").unwrap();
        engine.merge_smallest().unwrap();
        before = ranked(&engine, "sun moon stars", 10);
    }

    let engine = open(dir.path());
    assert_eq!(ranked(&engine, "sun moon stars", 10), before);
    assert!(!engine.has_seen("b.txt"));
    assert!(engine.has_seen("a.txt"));
}

#[test]
fn test_manifest_on_disk_matches_engine() {
    let dir = tempfile::tempdir().unwrap();
    let mut engine = open(dir.path());
    ingest_each(&mut engine, &[("a.txt", "x"), ("b.txt", "y")]);
    engine.delete_by_id(2).unwrap();

    let on_disk = Manifest::load(dir.path(), false).unwrap();
    assert_eq!(&on_disk, engine.manifest());
    assert_eq!(on_disk.deleted_doc_ids.iter().copied().collect::<Vec<_>>(), vec![2]);
}

#[test]
fn test_folder_ingestion() {
    let docs = tempfile::tempdir().unwrap();
    let index = tempfile::tempdir().unwrap();
    fs::write(docs.path().join("solar_system.txt"), "planets orbit the sun").unwrap();
    fs::write(docs.path().join("Ocean.TXT"), "waves and tides").unwrap();
    fs::write(docs.path().join("skip.md"), "planets").unwrap();

    let mut engine = open(index.path());
    assert_eq!(index_folder(&mut engine, docs.path(), true).unwrap(), 2);

    let hits = engine.search("planets", 10).unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].document.title, "solar system");
    assert_eq!(engine.search("tides", 10).unwrap()[0].document.title, "Ocean");
}

#[test]
fn test_missing_segment_file_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut engine = open(dir.path());
        ingest_each(&mut engine, &[("a.txt", "alpha")]);
    }
    fs::remove_file(dir.path().join("seg_000001").join(POSTINGS_FILE)).unwrap();

    // Doc tables load at open; postings only when a query needs them
    let engine = open(dir.path());
    assert!(matches!(
        engine.search("alpha", 10),
        Err(IndexError::CorruptSegment { .. })
    ));
}

#[test]
fn test_truncated_docs_fail_open() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut engine = open(dir.path());
        ingest_each(&mut engine, &[("a.txt", "alpha beta gamma")]);
    }
    let docs = dir.path().join("seg_000001").join(DOCS_FILE);
    let bytes = fs::read(&docs).unwrap();
    fs::write(&docs, &bytes[..bytes.len() / 2]).unwrap();

    let result = segsearch::IndexEngine::open_with_config(dir.path(), fixtures::test_config(10));
    assert!(matches!(result, Err(IndexError::CorruptSegment { .. })));
}

#[test]
fn test_corrupt_manifest_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("manifest.json"), "not json").unwrap();

    let result = segsearch::IndexEngine::open_with_config(dir.path(), fixtures::test_config(10));
    assert!(matches!(result, Err(IndexError::CorruptManifest { .. })));
}
