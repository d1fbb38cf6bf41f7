//! Error types for install batches.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use super::outcome::{InstalledPackage, TaskFailure};
use crate::manifest::ManifestError;

/// Errors returned by an install batch.
#[derive(Debug, Error)]
pub enum InstallError {
    /// The project has no `package.json`. Nothing was attempted.
    #[error("no package.json in {}; run `gantry init` first", .project_dir.display())]
    ManifestMissing { project_dir: PathBuf },

    /// `package.json` exists but could not be loaded.
    #[error(transparent)]
    Manifest(ManifestError),

    /// The dependency directory could not be created.
    #[error("failed to create dependency directory {}: {source}", .path.display())]
    DependencyRoot { path: PathBuf, source: io::Error },

    /// Packages were unpacked but `package.json` could not be updated.
    ///
    /// Unpacked files are left in place.
    #[error(
        "installed {} package(s) but failed to update package.json: {source}",
        .installed.len()
    )]
    Commit {
        installed: Vec<InstalledPackage>,
        source: ManifestError,
    },

    /// One or more packages failed. Packages listed in `installed` were
    /// committed to `package.json`. `failures` are in the order they
    /// happened; the message leads with the first.
    #[error("{}", batch_message(.failures))]
    Batch {
        installed: Vec<InstalledPackage>,
        failures: Vec<TaskFailure>,
    },
}

impl InstallError {
    /// Prepend packages installed by an earlier batch of the same run.
    pub(crate) fn with_earlier(mut self, earlier: Vec<InstalledPackage>) -> Self {
        if let Self::Commit { installed, .. } | Self::Batch { installed, .. } = &mut self {
            let mut merged = earlier;
            merged.append(installed);
            merged.sort_by(|a, b| a.name.cmp(&b.name));
            *installed = merged;
        }
        self
    }

    /// Packages installed before the batch failed.
    pub fn installed(&self) -> &[InstalledPackage] {
        match self {
            Self::Commit { installed, .. } | Self::Batch { installed, .. } => installed,
            _ => &[],
        }
    }

    /// Per-package failures, if any.
    pub fn failures(&self) -> &[TaskFailure] {
        match self {
            Self::Batch { failures, .. } => failures,
            _ => &[],
        }
    }
}

fn batch_message(failures: &[TaskFailure]) -> String {
    let Some(first) = failures.first() else {
        return "install failed".to_string();
    };
    if failures.len() == 1 {
        return format!("failed to install {}", first);
    }

    let names: Vec<&str> = failures.iter().map(|f| f.name.as_str()).collect();
    format!(
        "failed to install {} ({} packages failed: {})",
        first,
        failures.len(),
        names.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::outcome::FailureCause;
    use crate::orchestrator::task::TaskStage;

    fn failure(name: &str) -> TaskFailure {
        TaskFailure {
            name: name.to_string(),
            stage: TaskStage::Resolving,
            cause: FailureCause::Resolution("not found".to_string()),
        }
    }

    #[test]
    fn test_batch_single_failure_message() {
        let err = InstallError::Batch {
            installed: vec![],
            failures: vec![failure("nonexistent-pkg")],
        };
        assert_eq!(
            err.to_string(),
            "failed to install nonexistent-pkg: resolution failed: not found"
        );
    }

    #[test]
    fn test_batch_lists_every_failure() {
        let err = InstallError::Batch {
            installed: vec![],
            failures: vec![failure("a"), failure("b"), failure("c")],
        };
        let message = err.to_string();
        assert!(message.starts_with("failed to install a: "));
        assert!(message.ends_with("(3 packages failed: a, b, c)"));
        assert_eq!(err.failures().len(), 3);
    }

    #[test]
    fn test_batch_message_leads_with_first_failure() {
        let err = InstallError::Batch {
            installed: vec![],
            failures: vec![failure("zzz-first"), failure("aaa-second")],
        };
        assert!(err
            .to_string()
            .starts_with("failed to install zzz-first: resolution failed"));
        assert!(err.to_string().ends_with("(2 packages failed: zzz-first, aaa-second)"));
    }

    #[test]
    fn test_with_earlier_merges_installed() {
        use crate::manifest::DependencyKind;

        let package = |name: &str, kind| InstalledPackage {
            name: name.to_string(),
            version: "1.0.0".to_string(),
            kind,
            path: PathBuf::from("node_modules").join(name),
            files: 1,
        };
        let err = InstallError::Batch {
            installed: vec![package("vitest", DependencyKind::Dev)],
            failures: vec![failure("gone")],
        }
        .with_earlier(vec![package("react", DependencyKind::Runtime)]);

        let names: Vec<_> = err.installed().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["react", "vitest"]);

        let missing = InstallError::ManifestMissing {
            project_dir: PathBuf::from("/work/app"),
        }
        .with_earlier(vec![package("react", DependencyKind::Runtime)]);
        assert!(missing.installed().is_empty());
    }

    #[test]
    fn test_manifest_missing_message() {
        let err = InstallError::ManifestMissing {
            project_dir: PathBuf::from("/work/app"),
        };
        assert_eq!(
            err.to_string(),
            "no package.json in /work/app; run `gantry init` first"
        );
        assert!(err.installed().is_empty());
    }
}
