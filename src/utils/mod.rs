//! Utility functions shared by the index and query layers.
//!
//! ## Modules
//!
//! - [`tokenizer`] - Lowercase alphanumeric tokenization used by indexing and querying
//! - [`encoding`] - Varint and length-prefixed primitives for segment files
//! - [`paths`] - Source path normalisation and title derivation
//! - [`progress`] - Progress bars for folder ingestion
//!
//! ```
//! use segsearch::utils::tokenize;
//!
//! let tokens = tokenize("The Quick-Brown fox, 2024!");
//! assert_eq!(tokens, vec!["the", "quick", "brown", "fox", "2024"]);
//! ```

pub mod encoding;
pub mod paths;
pub mod progress;
pub mod tokenizer;

pub use encoding::*;
pub use paths::*;
pub use tokenizer::*;
