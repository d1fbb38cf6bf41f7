//! `gantry add`: install packages and record them in package.json.

use clap::Args;
use gantry::orchestrator::{InstallError, InstallOrchestrator, InstallSummary};
use gantry::DependencyKind;
use tokio_util::sync::CancellationToken;

use super::output::Output;
use crate::error::CliError;

#[derive(Debug, Clone, Args)]
pub struct AddArgs {
    /// Packages to install, e.g. lodash @types/node
    #[arg(required = true, value_name = "PACKAGE")]
    pub packages: Vec<String>,

    /// Record as devDependencies
    #[arg(short = 'D', long)]
    pub dev: bool,
}

impl AddArgs {
    pub fn kind(&self) -> DependencyKind {
        if self.dev {
            DependencyKind::Dev
        } else {
            DependencyKind::Runtime
        }
    }
}

pub async fn run(
    args: &AddArgs,
    orchestrator: &InstallOrchestrator,
    output: &dyn Output,
    cancel: CancellationToken,
) -> Result<(), CliError> {
    let result = orchestrator
        .run_with_cancel(args.packages.as_slice(), args.kind(), cancel)
        .await;
    report(result, output)
}

/// Print what was installed and convert the outcome for `main`.
pub(crate) fn report(
    result: Result<InstallSummary, InstallError>,
    output: &dyn Output,
) -> Result<(), CliError> {
    match result {
        Ok(summary) if summary.is_empty() => {
            output.println("Nothing to install");
            Ok(())
        }
        Ok(summary) => {
            for package in &summary.installed {
                output.package(package);
            }
            output.newline();
            output.success(&format!(
                "Added {} {}",
                summary.len(),
                plural(summary.len())
            ));
            Ok(())
        }
        Err(e) => {
            for package in e.installed() {
                output.package(package);
            }
            if matches!(e, InstallError::Batch { .. }) && !e.installed().is_empty() {
                output.warning(&format!(
                    "{} {} installed and recorded, but some packages failed",
                    e.installed().len(),
                    plural(e.installed().len())
                ));
            }
            Err(CliError::Install(e))
        }
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "package"
    } else {
        "packages"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::output::RecordingOutput;
    use bytes::Bytes;
    use gantry::installer::{ArchiveInstaller, InstalledArchive, InstallerResult};
    use gantry::manifest::ManifestStore;
    use gantry::orchestrator::OrchestratorConfig;
    use gantry::package::PackageName;
    use gantry::registry::{BoxFuture, RegistryError, RegistryGateway, RegistryResult};
    use std::sync::Arc;
    use tempfile::TempDir;

    // ========================================================================
    // Fakes
    // ========================================================================

    /// Knows every package at 1.0.0 except names starting with `missing`.
    struct FakeRegistry;

    impl RegistryGateway for FakeRegistry {
        fn resolve_latest<'a>(
            &'a self,
            name: &'a PackageName,
        ) -> BoxFuture<'a, RegistryResult<String>> {
            Box::pin(async move {
                if name.as_str().starts_with("missing") {
                    Err(RegistryError::NotFound {
                        url: format!("http://registry.test/{}", name),
                        status: 404,
                    })
                } else {
                    Ok("1.0.0".to_string())
                }
            })
        }

        fn fetch_archive<'a>(
            &'a self,
            _name: &'a PackageName,
            _version: &'a str,
        ) -> BoxFuture<'a, RegistryResult<Bytes>> {
            Box::pin(async { Ok(Bytes::from_static(b"archive")) })
        }
    }

    struct FakeInstaller;

    impl ArchiveInstaller for FakeInstaller {
        fn install(&self, name: &PackageName, _archive: &[u8]) -> InstallerResult<InstalledArchive> {
            Ok(InstalledArchive {
                path: name.relative_path(),
                files: 1,
            })
        }
    }

    fn orchestrator(dir: &TempDir) -> InstallOrchestrator {
        let store = ManifestStore::new(dir.path());
        store.create(&gantry::manifest::Manifest::new("demo"), false).unwrap();
        InstallOrchestrator::new(
            Arc::new(FakeRegistry),
            Arc::new(FakeInstaller),
            store,
            OrchestratorConfig::new(dir.path().join("node_modules")),
        )
    }

    fn add_args(packages: &[&str], dev: bool) -> AddArgs {
        AddArgs {
            packages: packages.iter().map(|p| p.to_string()).collect(),
            dev,
        }
    }

    // ========================================================================
    // Tests
    // ========================================================================

    #[tokio::test]
    async fn test_add_reports_installed_packages() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir);
        let output = RecordingOutput::default();

        run(
            &add_args(&["lodash", "chalk"], true),
            &orchestrator,
            &output,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let lines = output.lines();
        assert_eq!(lines[0], "+ chalk@1.0.0 (dev)");
        assert_eq!(lines[1], "+ lodash@1.0.0 (dev)");
        assert_eq!(lines.last().unwrap(), "Success: Added 2 packages");

        let manifest = orchestrator.store().load().unwrap();
        assert_eq!(manifest.find("chalk"), Some((DependencyKind::Dev, "1.0.0")));
    }

    #[tokio::test]
    async fn test_add_partial_failure_still_lists_successes() {
        let dir = TempDir::new().unwrap();
        let orchestrator = orchestrator(&dir);
        let output = RecordingOutput::default();

        let err = run(
            &add_args(&["lodash", "missing-pkg"], false),
            &orchestrator,
            &output,
            CancellationToken::new(),
        )
        .await
        .unwrap_err();

        match err {
            CliError::Install(e) => {
                assert_eq!(e.failures().len(), 1);
                assert_eq!(e.failures()[0].name, "missing-pkg");
            }
            other => panic!("unexpected error: {other}"),
        }
        let lines = output.lines();
        assert_eq!(lines[0], "+ lodash@1.0.0");
        assert!(lines[1].starts_with("Warning: 1 package installed"));
    }

    #[test]
    fn test_report_empty_summary() {
        let output = RecordingOutput::default();
        report(Ok(InstallSummary::default()), &output).unwrap();
        assert_eq!(output.lines(), vec!["Nothing to install"]);
    }
}
