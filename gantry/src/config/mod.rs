//! User configuration.
//!
//! Settings are read from `~/.gantry/config.ini`:
//!
//! ```ini
//! [registry]
//! url = https://registry.npmjs.org
//! request_timeout = 15
//!
//! [install]
//! concurrency = 20
//! batch_timeout = 60
//! dependency_dir = node_modules
//! ```
//!
//! Command-line flags take precedence over the file, which takes
//! precedence over built-in defaults.

mod file;
mod parser;

pub use file::{
    config_directory, config_file_path, ConfigFile, ConfigFileError, InstallSettings,
    RegistrySettings, CONFIG_DIR_NAME, CONFIG_FILE_NAME,
};
