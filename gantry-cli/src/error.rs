//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::path::PathBuf;
use std::process;

use console::style;
use gantry::manifest::ManifestError;
use gantry::orchestrator::InstallError;
use gantry::registry::RegistryError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Configuration error
    Config(String),
    /// Failed to set up the registry client
    Registry(RegistryError),
    /// package.json could not be created or read
    Manifest(ManifestError),
    /// An install batch failed
    Install(InstallError),
    /// Failed to create a directory or file
    FileWrite { path: PathBuf, error: std::io::Error },
    /// Failed to start the async runtime or signal handler
    Runtime(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("{} {}", style("Error:").red().bold(), self);

        match self {
            CliError::Install(e) if e.failures().len() > 1 => {
                eprintln!();
                for failure in e.failures() {
                    eprintln!("  {} {}", style("✗").red(), failure);
                }
            }
            CliError::Install(InstallError::ManifestMissing { .. }) => {
                eprintln!();
                eprintln!("Create one with: gantry init");
            }
            CliError::Install(InstallError::Commit { installed, .. }) => {
                eprintln!();
                eprintln!("These packages were unpacked but not recorded:");
                for package in installed {
                    eprintln!("  {}@{}", package.name, package.version);
                }
            }
            CliError::Manifest(ManifestError::AlreadyExists { .. }) => {
                eprintln!();
                eprintln!("Use --force to overwrite it.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Registry(e) => write!(f, "Registry error: {}", e),
            CliError::Manifest(e) => write!(f, "{}", e),
            CliError::Install(e) => write!(f, "{}", e),
            CliError::FileWrite { path, error } => {
                write!(f, "Failed to write '{}': {}", path.display(), error)
            }
            CliError::Runtime(msg) => write!(f, "Failed to start: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Registry(e) => Some(e),
            CliError::Manifest(e) => Some(e),
            CliError::Install(e) => Some(e),
            CliError::FileWrite { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl From<InstallError> for CliError {
    fn from(e: InstallError) -> Self {
        CliError::Install(e)
    }
}

impl From<ManifestError> for CliError {
    fn from(e: ManifestError) -> Self {
        CliError::Manifest(e)
    }
}

impl From<RegistryError> for CliError {
    fn from(e: RegistryError) -> Self {
        CliError::Registry(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_config_error() {
        let err = CliError::Config("--concurrency must be at least 1".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: --concurrency must be at least 1"
        );
        assert!(err.source().is_none());
    }

    #[test]
    fn test_install_error_is_source() {
        let err = CliError::from(InstallError::ManifestMissing {
            project_dir: PathBuf::from("/work/app"),
        });
        assert!(err.to_string().contains("gantry init"));
        assert!(err.source().is_some());
    }
}
