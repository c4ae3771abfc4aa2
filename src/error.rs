//! Error types for index operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the segment store, manifest and engine
#[derive(Debug, Error)]
pub enum IndexError {
    /// Unknown segment name, path or folder
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller passed arguments that can never succeed (e.g. merging a segment with itself)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Flush target already exists. Segment names come from a monotonic
    /// counter, so this points at a counter bug.
    #[error("Segment directory already exists: {0}")]
    AlreadyExists(PathBuf),

    /// Segment directory is missing files or holds undecodable content
    #[error("Corrupt segment at {path}: {reason}")]
    CorruptSegment {
        /// File or directory that failed to load
        path: PathBuf,
        /// What was wrong with it
        reason: String,
    },

    /// Manifest exists but is not valid JSON for the manifest schema
    #[error("Corrupt manifest at {path}: {source}")]
    CorruptManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the temporary manifest or renaming it into place failed.
    /// The previous manifest is still intact.
    #[error("Failed to write manifest {path}: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl IndexError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        IndexError::CorruptSegment {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, IndexError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        fn fails() -> Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"))?;
            Ok(())
        }
        assert!(matches!(fails(), Err(IndexError::Io(_))));
    }

    #[test]
    fn test_display_messages() {
        let err = IndexError::NotFound("seg_000007".to_string());
        assert_eq!(err.to_string(), "Not found: seg_000007");

        let err = IndexError::corrupt("/tmp/seg_000001/docs", "truncated");
        assert!(err.to_string().contains("truncated"));
    }
}
