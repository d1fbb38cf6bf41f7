//! Native gzip + tar extraction.
//!
//! Registry archives wrap the package in a single top-level directory
//! (usually `package/`). Extraction drops that first path component so the
//! package's own tree lands directly in the destination, the same result as
//! `tar -xzf archive.tgz --strip-components=1 -C dest`.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};
use tracing::{debug, warn};

/// Summary of one extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractStats {
    /// Regular files written.
    pub files: usize,
    /// Directories created.
    pub directories: usize,
    /// Entries ignored (links, metadata records, the wrapper directory).
    pub skipped: usize,
}

/// Why an extraction failed.
#[derive(Debug)]
pub(crate) enum ExtractError {
    /// Reading the archive failed (corrupt or truncated data).
    Corrupt(String),
    /// An entry would escape the destination directory.
    UnsafePath(String),
    /// The archive has nothing to install.
    Empty,
    /// Writing to the destination failed.
    Write { path: PathBuf, source: std::io::Error },
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Corrupt(reason) => write!(f, "corrupt archive: {}", reason),
            Self::UnsafePath(path) => write!(f, "unsafe entry path '{}'", path),
            Self::Empty => write!(f, "archive contains no files"),
            Self::Write { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
        }
    }
}

/// Extract `archive` into `dest`, stripping the wrapper directory.
pub(crate) fn extract_stripped(archive: &Path, dest: &Path) -> Result<ExtractStats, ExtractError> {
    let file = File::open(archive).map_err(|e| ExtractError::Write {
        path: archive.to_path_buf(),
        source: e,
    })?;
    let mut archive = Archive::new(GzDecoder::new(BufReader::new(file)));
    let mut stats = ExtractStats::default();

    let entries = archive
        .entries()
        .map_err(|e| ExtractError::Corrupt(e.to_string()))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| ExtractError::Corrupt(e.to_string()))?;
        let raw_path = entry
            .path()
            .map_err(|e| ExtractError::Corrupt(e.to_string()))?
            .into_owned();

        let relative = match strip_wrapper(&raw_path)? {
            Some(relative) => relative,
            None => {
                stats.skipped += 1;
                continue;
            }
        };
        let target = dest.join(&relative);

        match entry.header().entry_type() {
            EntryType::Directory => {
                fs::create_dir_all(&target).map_err(|e| ExtractError::Write {
                    path: target.clone(),
                    source: e,
                })?;
                stats.directories += 1;
            }
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    fs::create_dir_all(parent).map_err(|e| ExtractError::Write {
                        path: parent.to_path_buf(),
                        source: e,
                    })?;
                }
                entry.unpack(&target).map_err(|e| {
                    // Short reads surface here as IO errors on the source.
                    ExtractError::Corrupt(format!("{}: {}", relative.display(), e))
                })?;
                stats.files += 1;
            }
            other => {
                warn!(
                    entry = %raw_path.display(),
                    kind = ?other,
                    "Skipping unsupported archive entry"
                );
                stats.skipped += 1;
            }
        }
    }

    if stats.files == 0 {
        return Err(ExtractError::Empty);
    }

    debug!(
        files = stats.files,
        directories = stats.directories,
        skipped = stats.skipped,
        "Archive extracted"
    );
    Ok(stats)
}

/// Drop the first component of an entry path.
///
/// Returns `None` for the wrapper directory itself. Any component that is
/// not a plain name (absolute roots, `..`) rejects the whole archive.
fn strip_wrapper(path: &Path) -> Result<Option<PathBuf>, ExtractError> {
    let mut components = path.components().filter(|c| *c != Component::CurDir);

    match components.next() {
        Some(Component::Normal(_)) => {}
        None => return Ok(None),
        Some(_) => return Err(ExtractError::UnsafePath(path.display().to_string())),
    }

    let mut relative = PathBuf::new();
    for component in components {
        match component {
            Component::Normal(part) => relative.push(part),
            _ => return Err(ExtractError::UnsafePath(path.display().to_string())),
        }
    }

    if relative.as_os_str().is_empty() {
        Ok(None)
    } else {
        Ok(Some(relative))
    }
}
