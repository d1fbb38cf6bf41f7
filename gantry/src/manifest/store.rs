//! Loading and atomically persisting the project manifest.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::error::{ManifestError, ManifestResult};
use super::types::Manifest;

/// File name of the project manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// Reads and writes the manifest of one project directory.
#[derive(Debug, Clone)]
pub struct ManifestStore {
    project_dir: PathBuf,
}

impl ManifestStore {
    /// Create a store for the project rooted at `project_dir`.
    pub fn new(project_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_dir: project_dir.into(),
        }
    }

    /// The project directory.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Full path of the manifest file.
    pub fn path(&self) -> PathBuf {
        self.project_dir.join(MANIFEST_FILE)
    }

    /// Whether a manifest file is present.
    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Load and decode the manifest.
    pub fn load(&self) -> ManifestResult<Manifest> {
        let path = self.path();
        let content = match fs::read(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ManifestError::NotFound { path });
            }
            Err(source) => return Err(ManifestError::Read { path, source }),
        };

        serde_json::from_slice(&content).map_err(|source| ManifestError::Malformed { path, source })
    }

    /// Serialize `manifest` into a temporary file next to the manifest.
    ///
    /// Nothing visible changes until [`StagedManifest::persist`] is called.
    /// Dropping the returned value removes the temporary file.
    pub fn stage(&self, manifest: &Manifest) -> ManifestResult<StagedManifest> {
        let target = self.path();
        let write_err = |source: io::Error| ManifestError::Write {
            path: target.clone(),
            source,
        };

        let mut temp = tempfile::Builder::new()
            .prefix(".package.json.")
            .suffix(".tmp")
            .tempfile_in(&self.project_dir)
            .map_err(write_err)?;

        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            serde_json::to_writer_pretty(&mut writer, manifest).map_err(ManifestError::Encode)?;
            writer.write_all(b"\n").map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }
        temp.as_file().sync_all().map_err(write_err)?;
        match_permissions(&target, temp.path()).map_err(write_err)?;

        debug!(temp = %temp.path().display(), "Staged manifest");
        Ok(StagedManifest { temp, target })
    }

    /// Persist `manifest`, replacing the file atomically.
    pub fn commit(&self, manifest: &Manifest) -> ManifestResult<()> {
        self.stage(manifest)?.persist()
    }

    /// Write a brand new manifest.
    ///
    /// Fails with [`ManifestError::AlreadyExists`] if one is present and
    /// `overwrite` is false.
    pub fn create(&self, manifest: &Manifest, overwrite: bool) -> ManifestResult<()> {
        if !overwrite && self.exists() {
            return Err(ManifestError::AlreadyExists { path: self.path() });
        }
        self.commit(manifest)
    }
}

/// A serialized manifest waiting to replace the real one.
#[derive(Debug)]
pub struct StagedManifest {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedManifest {
    /// Path of the temporary file.
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Rename the temporary file over the manifest.
    pub fn persist(self) -> ManifestResult<()> {
        let target = self.target;
        self.temp
            .persist(&target)
            .map_err(|e| ManifestError::Write {
                path: target.clone(),
                source: e.error,
            })?;
        debug!(path = %target.display(), "Committed manifest");
        Ok(())
    }
}

/// Give the staged file the permissions of the file it replaces.
///
/// Temporary files are created owner-only; a manifest is normally world
/// readable.
#[cfg(unix)]
fn match_permissions(target: &Path, staged: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let permissions = match fs::metadata(target) {
        Ok(meta) => meta.permissions(),
        Err(_) => fs::Permissions::from_mode(0o644),
    };
    fs::set_permissions(staged, permissions)
}

#[cfg(not(unix))]
fn match_permissions(_target: &Path, _staged: &Path) -> io::Result<()> {
    Ok(())
}
