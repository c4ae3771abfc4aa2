//! Query-side benchmarks for segsearch
//!
//! Run with: cargo bench

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use segsearch::IndexEngine;
use segsearch::config::EngineConfig;
use segsearch::index::SourceDocument;
use tempfile::TempDir;

const WORDS: &[&str] = &[
    "apple", "banana", "cherry", "durian", "elder", "fig", "grape", "honeydew", "kiwi", "lemon",
    "mango", "nectarine", "orange", "papaya", "quince", "raspberry", "strawberry", "tangerine",
];

fn bench_config(max_segments: usize) -> EngineConfig {
    EngineConfig {
        max_segments,
        sync_writes: false,
        ..EngineConfig::default()
    }
}

/// Deterministic pseudo-random document text
fn document_text(seed: usize, len: usize) -> String {
    let mut state = seed.wrapping_mul(2654435761).wrapping_add(1);
    let mut words = Vec::with_capacity(len);
    for _ in 0..len {
        state ^= state << 13;
        state ^= state >> 7;
        state ^= state << 17;
        words.push(WORDS[state % WORDS.len()]);
    }
    words.join(" ")
}

/// Index of `segments` batches with `per_segment` documents each
fn create_benchmark_index(segments: usize, per_segment: usize) -> (TempDir, IndexEngine) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let mut engine = IndexEngine::open_with_config(temp_dir.path(), bench_config(usize::MAX))
        .expect("Failed to open index");

    for s in 0..segments {
        let batch = (0..per_segment)
            .map(|d| {
                let n = s * per_segment + d;
                SourceDocument::new(format!("doc {n}"), format!("docs/doc_{n}.txt"), document_text(n, 200))
            })
            .collect();
        engine.ingest_batch(batch).expect("Failed to ingest batch");
    }

    (temp_dir, engine)
}

fn bench_tokenize(c: &mut Criterion) {
    let text = document_text(7, 2_000);
    c.bench_function("tokenize_2k_words", |b| {
        b.iter(|| segsearch::utils::tokenize(black_box(&text)))
    });
}

fn bench_search(c: &mut Criterion) {
    let (_temp_dir, engine) = create_benchmark_index(8, 250);

    let mut group = c.benchmark_group("search");

    group.bench_function("single_term", |b| {
        b.iter(|| engine.search(black_box("mango"), 10))
    });

    group.bench_function("multi_term", |b| {
        b.iter(|| engine.search(black_box("apple kiwi quince"), 10))
    });

    group.bench_function("no_match", |b| {
        b.iter(|| engine.search(black_box("zucchini"), 10))
    });

    group.finish();
}

fn bench_search_by_segment_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_segments");

    for segments in [1usize, 4, 16] {
        let (_temp_dir, engine) = create_benchmark_index(segments, 1_600 / segments);
        group.bench_with_input(BenchmarkId::from_parameter(segments), &segments, |b, _| {
            b.iter(|| engine.search(black_box("grape lemon"), 10))
        });
    }

    group.finish();
}

fn bench_open(c: &mut Criterion) {
    let (temp_dir, engine) = create_benchmark_index(4, 250);
    drop(engine);

    c.bench_function("index_open", |b| {
        b.iter(|| IndexEngine::open_with_config(black_box(temp_dir.path()), bench_config(usize::MAX)))
    });
}

criterion_group!(
    benches,
    bench_tokenize,
    bench_search,
    bench_search_by_segment_count,
    bench_open,
);

criterion_main!(benches);
