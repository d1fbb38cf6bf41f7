//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use gantry::installer::{ArchiveInstaller, InstalledArchive, InstallerResult, TarballInstaller};
use gantry::manifest::{Manifest, ManifestStore};
use gantry::orchestrator::{InstallOrchestrator, OrchestratorConfig};
use gantry::package::PackageName;
use gantry::registry::{BoxFuture, RegistryError, RegistryGateway, RegistryResult};

// ============================================================================
// Archives
// ============================================================================

/// Build a gzip-compressed tarball from `(path, content)` pairs.
pub fn tarball(entries: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);
    for (path, content) in entries {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        builder
            .append_data(&mut header, path, content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// A registry-style archive for `name`, wrapped in `package/`.
pub fn package_archive(name: &str, version: &str) -> Vec<u8> {
    let manifest = format!(r#"{{"name":"{}","version":"{}"}}"#, name, version);
    tarball(&[
        ("package/package.json", manifest.as_str()),
        ("package/index.js", "module.exports = {};\n"),
    ])
}

// ============================================================================
// Mock registry
// ============================================================================

/// In-memory registry with call accounting.
#[derive(Default)]
pub struct MockRegistry {
    packages: HashMap<String, (String, Bytes)>,
    missing_archives: HashSet<String>,
    hanging: HashSet<String>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    resolve_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish `name` at `version` with a generated archive.
    pub fn with_package(self, name: &str, version: &str) -> Self {
        let archive = package_archive(name, version);
        self.with_archive(name, version, archive)
    }

    /// Publish `name` at `version` with explicit archive bytes.
    pub fn with_archive(mut self, name: &str, version: &str, archive: Vec<u8>) -> Self {
        self.packages
            .insert(name.to_string(), (version.to_string(), Bytes::from(archive)));
        self
    }

    /// Resolve `name` but fail its archive download.
    pub fn with_missing_archive(mut self, name: &str, version: &str) -> Self {
        self.packages
            .insert(name.to_string(), (version.to_string(), Bytes::new()));
        self.missing_archives.insert(name.to_string());
        self
    }

    /// Make resolution of `name` never complete.
    pub fn with_hanging(mut self, name: &str) -> Self {
        self.hanging.insert(name.to_string());
        self
    }

    /// Delay every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn resolve_calls(&self) -> usize {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> InFlight<'_> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        InFlight(&self.in_flight)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RegistryGateway for MockRegistry {
    fn resolve_latest<'a>(&'a self, name: &'a PackageName) -> BoxFuture<'a, RegistryResult<String>> {
        Box::pin(async move {
            self.resolve_calls.fetch_add(1, Ordering::SeqCst);
            let _guard = self.enter();
            if self.hanging.contains(name.as_str()) {
                std::future::pending::<()>().await;
            }
            tokio::time::sleep(self.delay).await;

            self.packages
                .get(name.as_str())
                .map(|(version, _)| version.clone())
                .ok_or_else(|| RegistryError::NotFound {
                    url: format!("mock://{}", name),
                    status: 404,
                })
        })
    }

    fn fetch_archive<'a>(
        &'a self,
        name: &'a PackageName,
        version: &'a str,
    ) -> BoxFuture<'a, RegistryResult<Bytes>> {
        Box::pin(async move {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            let _guard = self.enter();
            tokio::time::sleep(self.delay).await;

            let url = format!("mock://{}/-/{}-{}.tgz", name, name.basename(), version);
            if self.missing_archives.contains(name.as_str()) {
                return Err(RegistryError::NotFound { url, status: 404 });
            }
            match self.packages.get(name.as_str()) {
                Some((published, archive)) if published == version => Ok(archive.clone()),
                _ => Err(RegistryError::NotFound { url, status: 404 }),
            }
        })
    }
}

// ============================================================================
// Concurrency accounting
// ============================================================================

/// Counts how many things are in progress at once and remembers the peak.
#[derive(Debug, Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    pub fn enter(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    pub fn leave(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Tarball installer that counts concurrent installs and holds each one
/// for `hold` so overlapping installs are observable.
pub struct CountingInstaller {
    inner: TarballInstaller,
    hold: Duration,
    pub gauge: Gauge,
}

impl CountingInstaller {
    pub fn new(root: impl Into<PathBuf>, hold: Duration) -> Self {
        Self {
            inner: TarballInstaller::new(root),
            hold,
            gauge: Gauge::default(),
        }
    }
}

impl ArchiveInstaller for CountingInstaller {
    fn install(&self, name: &PackageName, archive: &[u8]) -> InstallerResult<InstalledArchive> {
        self.gauge.enter();
        std::thread::sleep(self.hold);
        let result = self.inner.install(name, archive);
        self.gauge.leave();
        result
    }
}

// ============================================================================
// Projects
// ============================================================================

/// A temporary project directory.
pub struct Project {
    pub dir: TempDir,
}

impl Project {
    /// A project with a fresh `package.json`.
    pub fn new() -> Self {
        let project = Self::without_manifest();
        project
            .store()
            .create(&Manifest::new("demo"), false)
            .unwrap();
        project
    }

    /// A project directory with no `package.json`.
    pub fn without_manifest() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn store(&self) -> ManifestStore {
        ManifestStore::new(self.dir.path())
    }

    pub fn node_modules(&self) -> PathBuf {
        self.dir.path().join("node_modules")
    }

    pub fn manifest(&self) -> Manifest {
        self.store().load().unwrap()
    }

    pub fn manifest_bytes(&self) -> Vec<u8> {
        std::fs::read(self.store().path()).unwrap()
    }

    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(self.node_modules())
    }

    pub fn orchestrator(
        &self,
        registry: Arc<MockRegistry>,
        config: OrchestratorConfig,
    ) -> InstallOrchestrator {
        let installer = TarballInstaller::new(&config.dependency_root);
        self.orchestrator_with(registry, Arc::new(installer), config)
    }

    pub fn orchestrator_with(
        &self,
        registry: Arc<MockRegistry>,
        installer: Arc<dyn ArchiveInstaller>,
        config: OrchestratorConfig,
    ) -> InstallOrchestrator {
        InstallOrchestrator::new(registry, installer, self.store(), config)
    }
}
