//! Error types for archive installation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for installer operations.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Errors that can occur while unpacking a package archive.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// A file or directory could not be created, written, or moved.
    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// The archive is corrupt, truncated, or contains unsafe entries.
    #[error("failed to unpack {package}: {reason}")]
    Unpack { package: String, reason: String },
}

impl InstallerError {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn unpack(package: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unpack {
            package: package.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unpack_display() {
        let err = InstallerError::unpack("lodash", "unexpected end of file");
        assert_eq!(
            err.to_string(),
            "failed to unpack lodash: unexpected end of file"
        );
    }
}
