//! The install orchestrator.

use std::collections::HashSet;
use std::fs;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::OrchestratorConfig;
use super::error::InstallError;
use super::outcome::{Accumulator, FailureCause, InstallSummary, InstalledPackage, TaskFailure};
use super::task::{InstallTask, TaskEvent, TaskStage};
use crate::installer::ArchiveInstaller;
use crate::manifest::{DependencyKind, Manifest, ManifestError, ManifestStore};
use crate::package::PackageName;
use crate::registry::RegistryGateway;

/// Callback invoked on every task stage transition.
///
/// Called from worker tasks, possibly concurrently.
pub type ProgressCallback = Arc<dyn Fn(&TaskEvent) + Send + Sync>;

/// Runs install batches: resolve, fetch, and unpack every requested
/// package concurrently, then record the successes in `package.json`.
///
/// # Partial failure
///
/// Packages are independent. Successes are committed even when other
/// packages in the same batch fail; the failures are then reported through
/// [`InstallError::Batch`]. A batch with no success never touches
/// `package.json`.
pub struct InstallOrchestrator {
    registry: Arc<dyn RegistryGateway>,
    installer: Arc<dyn ArchiveInstaller>,
    store: ManifestStore,
    config: OrchestratorConfig,
    progress: Option<ProgressCallback>,
}

impl InstallOrchestrator {
    /// Create an orchestrator.
    pub fn new(
        registry: Arc<dyn RegistryGateway>,
        installer: Arc<dyn ArchiveInstaller>,
        store: ManifestStore,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            registry,
            installer,
            store,
            config,
            progress: None,
        }
    }

    /// Report stage transitions to `callback`.
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    pub fn store(&self) -> &ManifestStore {
        &self.store
    }

    /// Install `names` as `kind` dependencies.
    pub async fn run<S: AsRef<str>>(
        &self,
        names: &[S],
        kind: DependencyKind,
    ) -> Result<InstallSummary, InstallError> {
        self.run_with_cancel(names, kind, CancellationToken::new())
            .await
    }

    /// Install `names` as `kind` dependencies, stopping early when `cancel`
    /// fires.
    ///
    /// After cancellation no new package starts, in-flight registry calls
    /// are abandoned, and packages already unpacking finish. Whatever
    /// installed is still committed.
    pub async fn run_with_cancel<S: AsRef<str>>(
        &self,
        names: &[S],
        kind: DependencyKind,
        cancel: CancellationToken,
    ) -> Result<InstallSummary, InstallError> {
        let manifest = self.load_manifest()?;
        self.ensure_dependency_root()?;

        let names = dedupe(names);
        if names.is_empty() {
            debug!("Nothing to install");
            return Ok(InstallSummary::default());
        }

        let (installed, failures) = self.execute(names, kind, cancel).await;

        let committed = if installed.is_empty() {
            false
        } else {
            if let Err(source) = self.commit(manifest, kind, &installed) {
                return Err(InstallError::Commit { installed, source });
            }
            true
        };

        if !failures.is_empty() {
            warn!(
                installed = installed.len(),
                failed = failures.len(),
                "Install batch finished with failures"
            );
            return Err(InstallError::Batch {
                installed,
                failures,
            });
        }

        info!(installed = installed.len(), %kind, "Install batch complete");
        Ok(InstallSummary {
            installed,
            committed,
        })
    }

    /// Reinstall every dependency recorded in `package.json` at its latest
    /// version: runtime dependencies first, then dev dependencies.
    ///
    /// Stops at the first failing batch. The error's installed list also
    /// carries packages from batches that already completed.
    pub async fn install_from_manifest(&self) -> Result<InstallSummary, InstallError> {
        self.install_from_manifest_with_cancel(CancellationToken::new())
            .await
    }

    /// [`install_from_manifest`](Self::install_from_manifest) with a
    /// caller-supplied cancellation token.
    pub async fn install_from_manifest_with_cancel(
        &self,
        cancel: CancellationToken,
    ) -> Result<InstallSummary, InstallError> {
        let manifest = self.load_manifest()?;
        let mut summary = InstallSummary::default();

        for kind in [DependencyKind::Runtime, DependencyKind::Dev] {
            let names = manifest.dependency_names(kind);
            if names.is_empty() {
                continue;
            }
            info!(%kind, packages = names.len(), "Installing from package.json");
            match self.run_with_cancel(names.as_slice(), kind, cancel.clone()).await {
                Ok(batch) => summary.absorb(batch),
                Err(e) => return Err(e.with_earlier(summary.installed)),
            }
        }

        Ok(summary)
    }

    fn load_manifest(&self) -> Result<Manifest, InstallError> {
        match self.store.load() {
            Ok(manifest) => Ok(manifest),
            Err(ManifestError::NotFound { .. }) => Err(InstallError::ManifestMissing {
                project_dir: self.store.project_dir().to_path_buf(),
            }),
            Err(e) => Err(InstallError::Manifest(e)),
        }
    }

    fn ensure_dependency_root(&self) -> Result<(), InstallError> {
        let root = &self.config.dependency_root;
        fs::create_dir_all(root).map_err(|source| InstallError::DependencyRoot {
            path: root.clone(),
            source,
        })
    }

    fn commit(
        &self,
        mut manifest: Manifest,
        kind: DependencyKind,
        installed: &[InstalledPackage],
    ) -> Result<(), ManifestError> {
        let applied = manifest.merge(
            kind,
            installed
                .iter()
                .map(|p| (p.name.as_str(), p.version.as_str())),
        );
        self.store.commit(&manifest)?;
        info!(entries = applied, field = kind.field_name(), "Updated package.json");
        Ok(())
    }

    async fn execute(
        &self,
        names: Vec<String>,
        kind: DependencyKind,
        cancel: CancellationToken,
    ) -> (Vec<InstalledPackage>, Vec<TaskFailure>) {
        let workers = self.config.effective_concurrency(names.len());
        let semaphore = Arc::new(Semaphore::new(workers));
        let accumulator = Arc::new(Accumulator::default());

        // The deadline cancels only this batch, never the caller's token.
        let batch_cancel = cancel.child_token();
        let deadline = self.config.batch_timeout.map(|limit| {
            let token = batch_cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(limit).await;
                warn!(
                    timeout_secs = limit.as_secs(),
                    "Install batch timed out; cancelling remaining packages"
                );
                token.cancel();
            })
        });

        info!(
            packages = names.len(),
            workers,
            %kind,
            "Starting install batch"
        );

        let handles: Vec<(String, JoinHandle<()>)> = names
            .into_iter()
            .map(|name| {
                let worker = Worker {
                    registry: Arc::clone(&self.registry),
                    installer: Arc::clone(&self.installer),
                    semaphore: Arc::clone(&semaphore),
                    accumulator: Arc::clone(&accumulator),
                    cancel: batch_cancel.clone(),
                    progress: self.progress.clone(),
                    kind,
                };
                let handle = tokio::spawn(worker.run(name.clone()));
                (name, handle)
            })
            .collect();

        for (name, handle) in handles {
            if let Err(e) = handle.await {
                error!(package = %name, error = %e, "Install worker aborted");
                accumulator.record_failure(TaskFailure {
                    name,
                    stage: TaskStage::Pending,
                    cause: FailureCause::Install(format!("worker aborted: {}", e)),
                });
            }
        }

        if let Some(deadline) = deadline {
            deadline.abort();
        }

        accumulator.take()
    }
}

/// One package's trip through the pipeline.
struct Worker {
    registry: Arc<dyn RegistryGateway>,
    installer: Arc<dyn ArchiveInstaller>,
    semaphore: Arc<Semaphore>,
    accumulator: Arc<Accumulator>,
    cancel: CancellationToken,
    progress: Option<ProgressCallback>,
    kind: DependencyKind,
}

impl Worker {
    async fn run(self, name: String) {
        let mut task = InstallTask::new(name);
        self.emit(&task);

        let _permit = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                return self.fail(task, FailureCause::Cancelled);
            }
            permit = Arc::clone(&self.semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => return self.fail(task, FailureCause::Cancelled),
            },
        };
        if self.cancel.is_cancelled() {
            return self.fail(task, FailureCause::Cancelled);
        }

        self.advance(&mut task);
        let package = match PackageName::parse(task.name()) {
            Ok(package) => package,
            Err(e) => return self.fail(task, FailureCause::Resolution(e.to_string())),
        };
        let version = match self.until_cancelled(self.registry.resolve_latest(&package)).await {
            Some(Ok(version)) => version,
            Some(Err(e)) => return self.fail(task, FailureCause::Resolution(e.to_string())),
            None => return self.fail(task, FailureCause::Cancelled),
        };
        debug!(package = %package, version = %version, "Resolved");

        self.advance(&mut task);
        let archive = match self
            .until_cancelled(self.registry.fetch_archive(&package, &version))
            .await
        {
            Some(Ok(archive)) => archive,
            Some(Err(e)) => return self.fail(task, FailureCause::Transfer(e.to_string())),
            None => return self.fail(task, FailureCause::Cancelled),
        };

        // Unpacking is not interrupted once started.
        self.advance(&mut task);
        let installer = Arc::clone(&self.installer);
        let target = package.clone();
        let result =
            tokio::task::spawn_blocking(move || installer.install(&target, &archive)).await;
        let installed = match result {
            Ok(Ok(installed)) => installed,
            Ok(Err(e)) => return self.fail(task, FailureCause::Install(e.to_string())),
            Err(e) => {
                return self.fail(task, FailureCause::Install(format!("install task failed: {}", e)))
            }
        };

        self.advance(&mut task);
        info!(package = %package, version = %version, "Installed package");
        self.accumulator.record_success(InstalledPackage {
            name: package.to_string(),
            version,
            kind: self.kind,
            path: installed.path,
            files: installed.files,
        });
    }

    async fn until_cancelled<T>(&self, call: impl Future<Output = T>) -> Option<T> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = call => Some(result),
        }
    }

    fn advance(&self, task: &mut InstallTask) {
        task.advance();
        self.emit(task);
    }

    fn fail(&self, mut task: InstallTask, cause: FailureCause) {
        let stage = task.fail();
        match &cause {
            FailureCause::Cancelled => {
                debug!(package = task.name(), %stage, "Cancelled")
            }
            cause => warn!(package = task.name(), %stage, error = %cause, "Package failed"),
        }
        self.emit(&task);
        self.accumulator.record_failure(TaskFailure {
            name: task.name().to_string(),
            stage,
            cause,
        });
    }

    fn emit(&self, task: &InstallTask) {
        if let Some(progress) = &self.progress {
            progress(&task.event());
        }
    }
}

/// Trim names and drop repeats, keeping the first occurrence.
fn dedupe<S: AsRef<str>>(names: &[S]) -> Vec<String> {
    let mut seen: HashSet<&str> = HashSet::new();
    names
        .iter()
        .map(|name| name.as_ref().trim())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
