//! # segsearch - Segmented Full-Text Search
//!
//! segsearch indexes plain-text documents into immutable on-disk segments
//! and ranks them against keyword queries with length-normalised tf-idf.
//!
//! ## Architecture
//!
//! The crate is organized into these main modules:
//!
//! - [`index`] - Segments, the manifest, the engine, merging and compaction
//! - [`query`] - Candidate collection and scoring across segments
//! - [`config`] - Engine configuration
//! - [`output`] - Terminal formatting for hits and stats
//! - [`shell`] - Interactive command loop
//! - [`utils`] - Tokenizer, binary encoding, path helpers
//!
//! ## Quick Start
//!
//! ```no_run
//! use segsearch::IndexEngine;
//! use segsearch::index::SourceDocument;
//! use std::path::Path;
//!
//! let mut engine = IndexEngine::open(Path::new("segments")).unwrap();
//! engine
//!     .ingest_batch(vec![SourceDocument::new("apple", "docs/apple.txt", "apple pie")])
//!     .unwrap();
//!
//! for hit in engine.search("apple", 10).unwrap() {
//!     println!("{:.3} {}", hit.score, hit.document.path);
//! }
//! ```
//!
//! ## Storage
//!
//! Each ingested batch becomes one `seg_NNNNNN` directory. `manifest.json`
//! names the live segments and carries tombstones, counters and the
//! path-to-id map; it is replaced atomically on every change. Deleted
//! documents stay on disk until their segment is merged or compacted.

pub mod config;
pub mod error;
pub mod index;
pub mod output;
pub mod query;
pub mod shell;
pub mod utils;

pub use error::{IndexError, Result};
pub use index::IndexEngine;
