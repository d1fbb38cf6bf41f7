//! Configuration for the install orchestrator.

use std::path::PathBuf;
use std::time::Duration;

/// Default number of packages processed at once.
pub const DEFAULT_CONCURRENCY: usize = 20;

/// Default wall-clock budget for one batch.
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(60);

/// Default dependency directory, relative to the project.
pub const DEFAULT_DEPENDENCY_DIR: &str = "node_modules";

/// Configuration for the install orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Directory packages are installed into.
    pub dependency_root: PathBuf,

    /// Maximum number of packages in flight.
    pub concurrency: usize,

    /// Budget for a whole batch. `None` lets a batch run until every
    /// package finishes.
    pub batch_timeout: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            dependency_root: PathBuf::from(DEFAULT_DEPENDENCY_DIR),
            concurrency: DEFAULT_CONCURRENCY,
            batch_timeout: Some(DEFAULT_BATCH_TIMEOUT),
        }
    }
}

impl OrchestratorConfig {
    /// Create a configuration installing into `dependency_root`.
    pub fn new(dependency_root: impl Into<PathBuf>) -> Self {
        Self {
            dependency_root: dependency_root.into(),
            ..Default::default()
        }
    }

    /// Set the concurrency limit. Zero is treated as one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Set the batch budget.
    pub fn with_batch_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.batch_timeout = timeout;
        self
    }

    /// Number of workers allowed for a batch of `packages` names.
    pub fn effective_concurrency(&self, packages: usize) -> usize {
        self.concurrency.min(packages).max(1)
    }
}

/// Interpret a timeout in seconds where zero means "no timeout".
pub fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
