//! Tarball installer that stages extraction next to its destination.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, info, warn};

use super::error::{InstallerError, InstallerResult};
use super::extractor::{extract_stripped, ExtractError};
use super::{ArchiveInstaller, InstalledArchive};
use crate::package::PackageName;

/// Prefix for every scratch entry in the dependency root.
///
/// Package names cannot start with `.`, so scratch entries never collide
/// with installed packages.
const SCRATCH_PREFIX: &str = ".gantry-";

/// Installs gzip-compressed tar archives under a dependency root.
///
/// Each install goes through three steps:
/// 1. The archive bytes are written to a scratch `.tgz` inside the root
/// 2. The archive is extracted into a scratch staging directory
/// 3. The staging directory is renamed to `<root>/<name>`
///
/// Keeping scratch files on the same filesystem as the destination makes
/// the final step a rename. A previous install of the same package is
/// replaced only after the new tree is fully extracted.
#[derive(Debug, Clone)]
pub struct TarballInstaller {
    root: PathBuf,
}

impl TarballInstaller {
    /// Create an installer that writes under `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The dependency root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn write_archive(&self, archive: &[u8]) -> InstallerResult<tempfile::NamedTempFile> {
        let mut file = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .suffix(".tgz")
            .tempfile_in(&self.root)
            .map_err(|e| InstallerError::write(&self.root, e))?;

        file.write_all(archive)
            .and_then(|_| file.flush())
            .map_err(|e| InstallerError::write(file.path(), e))?;
        Ok(file)
    }
}

impl ArchiveInstaller for TarballInstaller {
    fn install(&self, name: &PackageName, archive: &[u8]) -> InstallerResult<InstalledArchive> {
        fs::create_dir_all(&self.root).map_err(|e| InstallerError::write(&self.root, e))?;

        let archive_file = self.write_archive(archive)?;
        let staging = Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|e| InstallerError::write(&self.root, e))?;

        debug!(
            package = %name,
            archive = %archive_file.path().display(),
            staging = %staging.path().display(),
            "Extracting archive"
        );

        let stats = extract_stripped(archive_file.path(), staging.path()).map_err(|e| match e {
            ExtractError::Write { path, source } => InstallerError::write(path, source),
            other => InstallerError::unpack(name.as_str(), other.to_string()),
        })?;

        let target = self.root.join(name.relative_path());
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|e| InstallerError::write(parent, e))?;
        }
        replace_dir(staging.path(), &target)?;

        // The staging directory now lives at `target`; dropping the handle
        // finds nothing left to remove.
        drop(staging);
        if let Err(e) = archive_file.close() {
            warn!(package = %name, error = %e, "Failed to remove scratch archive");
        }

        info!(
            package = %name,
            path = %target.display(),
            files = stats.files,
            "Package extracted"
        );

        Ok(InstalledArchive {
            path: target,
            files: stats.files,
        })
    }
}

/// Move `staged` to `target`, replacing whatever `target` held.
///
/// The previous content is moved aside first and restored if the final
/// rename fails, so `target` is never left half-populated.
fn replace_dir(staged: &Path, target: &Path) -> InstallerResult<()> {
    let existing = fs::symlink_metadata(target).is_ok();
    if !existing {
        return fs::rename(staged, target).map_err(|e| InstallerError::write(target, e));
    }

    let backup = backup_path(target);
    if fs::symlink_metadata(&backup).is_ok() {
        // Left over from an interrupted run.
        remove_path(&backup).map_err(|e| InstallerError::write(&backup, e))?;
    }

    fs::rename(target, &backup).map_err(|e| InstallerError::write(target, e))?;

    if let Err(e) = fs::rename(staged, target) {
        if let Err(restore) = fs::rename(&backup, target) {
            warn!(
                path = %target.display(),
                error = %restore,
                "Failed to restore previous install"
            );
        }
        return Err(InstallerError::write(target, e));
    }

    if let Err(e) = remove_path(&backup) {
        warn!(path = %backup.display(), error = %e, "Failed to remove previous install");
    }
    Ok(())
}

fn backup_path(target: &Path) -> PathBuf {
    let basename = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!("{}{}.old", SCRATCH_PREFIX, basename))
}

fn remove_path(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path)?.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}
