//! Results of an install batch.

use std::fmt;
use std::path::PathBuf;

use parking_lot::Mutex;
use thiserror::Error;

use super::task::TaskStage;
use crate::manifest::DependencyKind;

/// A package that was resolved, downloaded, and unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub name: String,
    pub version: String,
    pub kind: DependencyKind,
    /// Directory the package was unpacked into.
    pub path: PathBuf,
    /// Regular files written.
    pub files: usize,
}

/// Why a package failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureCause {
    /// The name is invalid, unknown, or has no usable `latest` version.
    #[error("{0}")]
    Resolution(String),

    /// The archive could not be downloaded.
    #[error("{0}")]
    Transfer(String),

    /// The archive could not be unpacked into the dependency root.
    #[error("{0}")]
    Install(String),

    /// The batch was cancelled or ran out of time.
    #[error("cancelled")]
    Cancelled,
}

impl FailureCause {
    /// Short category label.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Resolution(_) => "resolution",
            Self::Transfer(_) => "transfer",
            Self::Install(_) => "install",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A package that did not install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskFailure {
    pub name: String,
    /// Stage the task was in when it failed.
    pub stage: TaskStage,
    pub cause: FailureCause,
}

impl fmt::Display for TaskFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            FailureCause::Cancelled => write!(f, "{}: cancelled while {}", self.name, self.stage),
            cause => write!(f, "{}: {} failed: {}", self.name, cause.kind(), cause),
        }
    }
}

/// Result of a batch in which every package installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSummary {
    /// Installed packages, sorted by name.
    pub installed: Vec<InstalledPackage>,
    /// Whether `package.json` was rewritten.
    pub committed: bool,
}

impl InstallSummary {
    pub fn is_empty(&self) -> bool {
        self.installed.is_empty()
    }

    pub fn len(&self) -> usize {
        self.installed.len()
    }

    /// Fold another batch's results into this one.
    pub fn absorb(&mut self, other: InstallSummary) {
        self.installed.extend(other.installed);
        self.installed.sort_by(|a, b| a.name.cmp(&b.name));
        self.committed |= other.committed;
    }
}

#[derive(Debug, Default)]
struct Records {
    installed: Vec<InstalledPackage>,
    failures: Vec<TaskFailure>,
}

/// Shared collector for worker results.
///
/// The lock is held only to push one record.
#[derive(Debug, Default)]
pub(crate) struct Accumulator {
    records: Mutex<Records>,
}

impl Accumulator {
    pub(crate) fn record_success(&self, package: InstalledPackage) {
        self.records.lock().installed.push(package);
    }

    pub(crate) fn record_failure(&self, failure: TaskFailure) {
        self.records.lock().failures.push(failure);
    }

    /// Drain the records. Installed packages are sorted by name; failures
    /// stay in the order they were recorded.
    pub(crate) fn take(&self) -> (Vec<InstalledPackage>, Vec<TaskFailure>) {
        let records = std::mem::take(&mut *self.records.lock());
        let mut installed = records.installed;
        installed.sort_by(|a, b| a.name.cmp(&b.name));
        (installed, records.failures)
    }
}
