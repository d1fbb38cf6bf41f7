//! Install orchestrator.
//!
//! Drives a batch of package names through the install pipeline:
//!
//! ```text
//! name ──► resolve latest ──► fetch archive ──► unpack ──► accumulator
//!            (registry)         (registry)     (installer)      │
//!                                                               ▼
//!                                               merge + commit package.json
//! ```
//!
//! Packages run concurrently, bounded by [`OrchestratorConfig::concurrency`].
//! Within one package the stages run strictly in order. The manifest is
//! written once, after every worker has finished.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use gantry::installer::TarballInstaller;
//! use gantry::manifest::{DependencyKind, ManifestStore};
//! use gantry::orchestrator::{InstallOrchestrator, OrchestratorConfig};
//! use gantry::registry::{HttpRegistry, DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT};
//!
//! let registry = HttpRegistry::new(DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT)?;
//! let config = OrchestratorConfig::new("node_modules");
//! let orchestrator = InstallOrchestrator::new(
//!     Arc::new(registry),
//!     Arc::new(TarballInstaller::new(&config.dependency_root)),
//!     ManifestStore::new("."),
//!     config,
//! );
//!
//! let summary = orchestrator.run(&["lodash"], DependencyKind::Runtime).await?;
//! ```

mod config;
mod error;
mod outcome;
mod runner;
mod task;

pub use config::{
    timeout_from_secs, OrchestratorConfig, DEFAULT_BATCH_TIMEOUT, DEFAULT_CONCURRENCY,
    DEFAULT_DEPENDENCY_DIR,
};
pub use error::InstallError;
pub use outcome::{FailureCause, InstallSummary, InstalledPackage, TaskFailure};
pub use runner::{InstallOrchestrator, ProgressCallback};
pub use task::{InstallTask, TaskEvent, TaskStage};
