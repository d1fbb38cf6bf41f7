//! Error types for manifest loading and persistence.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors that can occur while reading or writing `package.json`.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// No manifest exists at the expected path.
    #[error("package.json not found at {}", .path.display())]
    NotFound { path: PathBuf },

    /// The manifest exists but could not be read.
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    /// The manifest could not be decoded.
    #[error("failed to decode {}: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The in-memory manifest could not be serialized.
    #[error("failed to encode manifest: {0}")]
    Encode(#[source] serde_json::Error),

    /// Writing or replacing the manifest failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// A manifest already exists and overwriting was not requested.
    #[error("{} already exists", .path.display())]
    AlreadyExists { path: PathBuf },
}
