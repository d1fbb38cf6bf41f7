//! Configuration file handling for ~/.gantry/config.ini.
//!
//! Missing files and missing keys fall back to defaults. Parsing lives in
//! [`super::parser`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::orchestrator::{
    timeout_from_secs, DEFAULT_BATCH_TIMEOUT, DEFAULT_CONCURRENCY, DEFAULT_DEPENDENCY_DIR,
};
use crate::registry::{DEFAULT_REGISTRY_URL, DEFAULT_REQUEST_TIMEOUT};

/// Configuration directory name under the home directory.
pub const CONFIG_DIR_NAME: &str = ".gantry";

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// `[registry]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySettings {
    /// Registry base URL.
    pub url: String,
    /// Per-call deadline in seconds.
    pub request_timeout: u64,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            url: DEFAULT_REGISTRY_URL.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT.as_secs(),
        }
    }
}

impl RegistrySettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}

/// `[install]` settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallSettings {
    /// Maximum packages in flight.
    pub concurrency: usize,
    /// Whole-batch budget in seconds; 0 disables it.
    pub batch_timeout: u64,
    /// Dependency directory, relative to the project unless absolute.
    pub dependency_dir: PathBuf,
}

impl Default for InstallSettings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            batch_timeout: DEFAULT_BATCH_TIMEOUT.as_secs(),
            dependency_dir: PathBuf::from(DEFAULT_DEPENDENCY_DIR),
        }
    }
}

impl InstallSettings {
    pub fn batch_timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.batch_timeout)
    }
}

/// Contents of `config.ini`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub registry: RegistrySettings,
    pub install: InstallSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.gantry/config.ini).
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.gantry/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        std::fs::write(path, self.to_config_string())
            .map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Commented INI representation.
    pub fn to_config_string(&self) -> String {
        format!(
            r#"[registry]
; Registry base URL
url = {}
; Deadline for each registry request, in seconds
request_timeout = {}

[install]
; Maximum number of packages installed at once
concurrency = {}
; Deadline for a whole install batch, in seconds (0 disables)
batch_timeout = {}
; Dependency directory, relative to the project directory
dependency_dir = {}
"#,
            self.registry.url,
            self.registry.request_timeout,
            self.install.concurrency,
            self.install.batch_timeout,
            self.install.dependency_dir.display(),
        )
    }
}

/// Get the path to the config directory (~/.gantry).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Get the path to the config file (~/.gantry/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join(CONFIG_FILE_NAME)
}
