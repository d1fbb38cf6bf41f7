//! Archive installation into the dependency root.
//!
//! An [`ArchiveInstaller`] turns downloaded archive bytes into a package
//! directory at `<dependency_root>/<name>` (scoped packages land at
//! `<dependency_root>/@scope/<name>`). Installation is blocking file work;
//! async callers run it on a blocking thread.

mod error;
mod extractor;
mod tarball;

use std::path::PathBuf;

use crate::package::PackageName;

pub use error::{InstallerError, InstallerResult};
pub use extractor::ExtractStats;
pub use tarball::TarballInstaller;

/// Result of a completed install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledArchive {
    /// Directory the package was installed into.
    pub path: PathBuf,
    /// Number of regular files written.
    pub files: usize,
}

/// Unpacks a package archive into its final location.
///
/// Implementations must leave `<root>/<name>` either fully replaced or
/// untouched, and must remove their scratch files before returning.
pub trait ArchiveInstaller: Send + Sync {
    /// Install `archive` as package `name`.
    fn install(&self, name: &PackageName, archive: &[u8]) -> InstallerResult<InstalledArchive>;
}
