//! Common types and utilities shared across CLI commands.

use std::env;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{ArgAction, Args};
use gantry::config::ConfigFile;
use gantry::installer::TarballInstaller;
use gantry::manifest::ManifestStore;
use gantry::orchestrator::{timeout_from_secs, InstallOrchestrator, OrchestratorConfig};
use gantry::registry::HttpRegistry;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::output::InstallProgress;
use crate::error::CliError;

/// Options accepted by every command.
#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Project directory (default: current directory)
    #[arg(short = 'C', long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,

    /// Registry base URL (default: from config, or https://registry.npmjs.org)
    #[arg(long, global = true, value_name = "URL")]
    pub registry: Option<String>,

    /// Maximum number of packages installed at once (default: 20)
    #[arg(short = 'j', long, global = true, value_name = "N")]
    pub concurrency: Option<usize>,

    /// Deadline for the whole install in seconds, 0 disables (default: 60)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Deadline for each registry request in seconds (default: 15)
    #[arg(long, global = true, value_name = "SECS")]
    pub request_timeout: Option<u64>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Effective settings after applying CLI > config file > defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub project_dir: PathBuf,
    pub dependency_root: PathBuf,
    pub registry_url: String,
    pub request_timeout: Duration,
    pub concurrency: usize,
    pub batch_timeout: Option<Duration>,
}

impl Settings {
    /// Combine command-line options with the config file.
    pub fn resolve(args: &GlobalArgs, config: &ConfigFile) -> Result<Self, CliError> {
        let cwd = env::current_dir()
            .map_err(|e| CliError::Config(format!("cannot determine current directory: {}", e)))?;
        let project_dir = match &args.project_dir {
            Some(dir) => cwd.join(dir),
            None => cwd,
        };

        let dependency_root = project_dir.join(&config.install.dependency_dir);

        let concurrency = args.concurrency.unwrap_or(config.install.concurrency);
        if concurrency == 0 {
            return Err(CliError::Config(
                "--concurrency must be at least 1".to_string(),
            ));
        }

        let request_timeout = args
            .request_timeout
            .unwrap_or(config.registry.request_timeout);
        if request_timeout == 0 {
            return Err(CliError::Config(
                "--request-timeout must be at least 1 second".to_string(),
            ));
        }

        let batch_timeout = timeout_from_secs(args.timeout.unwrap_or(config.install.batch_timeout));

        Ok(Self {
            project_dir,
            dependency_root,
            registry_url: args
                .registry
                .clone()
                .unwrap_or_else(|| config.registry.url.clone()),
            request_timeout: Duration::from_secs(request_timeout),
            concurrency,
            batch_timeout,
        })
    }

    /// Manifest store for the project.
    pub fn store(&self) -> ManifestStore {
        ManifestStore::new(&self.project_dir)
    }

    /// Orchestrator configuration derived from these settings.
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(&self.dependency_root)
            .with_concurrency(self.concurrency)
            .with_batch_timeout(self.batch_timeout)
    }

    /// Build an orchestrator wired to the HTTP registry.
    pub fn orchestrator(&self) -> Result<InstallOrchestrator, CliError> {
        let registry = HttpRegistry::new(&self.registry_url, self.request_timeout)?;
        let installer = TarballInstaller::new(&self.dependency_root);
        Ok(InstallOrchestrator::new(
            Arc::new(registry),
            Arc::new(installer),
            self.store(),
            self.orchestrator_config(),
        ))
    }
}

/// Everything an install command needs: a runtime, an interrupt-aware
/// cancellation token, a progress line, and the orchestrator.
pub struct Session {
    runtime: Runtime,
    cancel: CancellationToken,
    progress: InstallProgress,
    pub orchestrator: InstallOrchestrator,
}

impl Session {
    /// Set up a session. Installs the Ctrl+C handler.
    pub fn start(settings: &Settings) -> Result<Self, CliError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|e| CliError::Runtime(format!("failed to create runtime: {}", e)))?;

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        ctrlc::set_handler(move || {
            eprintln!();
            eprintln!("Interrupted, finishing packages already unpacking...");
            interrupt.cancel();
        })
        .map_err(|e| CliError::Runtime(format!("failed to set signal handler: {}", e)))?;

        let progress = InstallProgress::new();
        let orchestrator = settings.orchestrator()?.with_progress(progress.callback());

        debug!(
            registry = %settings.registry_url,
            concurrency = settings.concurrency,
            project = %settings.project_dir.display(),
            "Session started"
        );

        Ok(Self {
            runtime,
            cancel,
            progress,
            orchestrator,
        })
    }

    /// Token cancelled on Ctrl+C.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Drive `future` to completion, then clear the progress line.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        let output = self.runtime.block_on(future);
        self.progress.finish();
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_config() {
        let settings = Settings::resolve(&GlobalArgs::default(), &ConfigFile::default()).unwrap();

        assert_eq!(settings.registry_url, "https://registry.npmjs.org");
        assert_eq!(settings.concurrency, 20);
        assert_eq!(settings.request_timeout, Duration::from_secs(15));
        assert_eq!(settings.batch_timeout, Some(Duration::from_secs(60)));
        assert!(settings.dependency_root.ends_with("node_modules"));
        assert!(settings.dependency_root.starts_with(&settings.project_dir));
    }

    #[test]
    fn test_cli_overrides_config() {
        let mut config = ConfigFile::default();
        config.install.concurrency = 8;
        config.registry.url = "http://mirror.local".to_string();

        let args = GlobalArgs {
            project_dir: Some(PathBuf::from("/work/app")),
            registry: Some("http://localhost:4873".to_string()),
            concurrency: Some(2),
            timeout: Some(0),
            request_timeout: Some(3),
            verbose: 0,
        };
        let settings = Settings::resolve(&args, &config).unwrap();

        assert_eq!(settings.project_dir, PathBuf::from("/work/app"));
        assert_eq!(
            settings.dependency_root,
            PathBuf::from("/work/app/node_modules")
        );
        assert_eq!(settings.registry_url, "http://localhost:4873");
        assert_eq!(settings.concurrency, 2);
        assert_eq!(settings.request_timeout, Duration::from_secs(3));
        assert!(settings.batch_timeout.is_none());
    }

    #[test]
    fn test_config_used_when_flag_absent() {
        let mut config = ConfigFile::default();
        config.install.concurrency = 8;
        config.install.dependency_dir = PathBuf::from("vendor/js");

        let args = GlobalArgs {
            project_dir: Some(PathBuf::from("/work/app")),
            ..Default::default()
        };
        let settings = Settings::resolve(&args, &config).unwrap();

        assert_eq!(settings.concurrency, 8);
        assert_eq!(settings.dependency_root, PathBuf::from("/work/app/vendor/js"));
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let args = GlobalArgs {
            concurrency: Some(0),
            ..Default::default()
        };
        let err = Settings::resolve(&args, &ConfigFile::default()).unwrap_err();
        assert!(matches!(err, CliError::Config(_)));
    }

    #[test]
    fn test_invalid_registry_url_fails_orchestrator() {
        let args = GlobalArgs {
            registry: Some("not a url".to_string()),
            ..Default::default()
        };
        let settings = Settings::resolve(&args, &ConfigFile::default()).unwrap();
        assert!(matches!(
            settings.orchestrator(),
            Err(CliError::Registry(_))
        ));
    }
}
