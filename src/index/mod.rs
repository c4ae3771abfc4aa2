pub mod build;
pub mod compact;
pub mod engine;
pub mod manifest;
pub mod segment;
pub mod stats;
pub mod types;
pub mod writer;

pub use engine::IndexEngine;
pub use manifest::Manifest;
pub use segment::Segment;
pub use stats::{IndexStats, SegmentInfo};
pub use types::*;
pub use writer::SegmentBuilder;
