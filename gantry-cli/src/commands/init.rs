//! `gantry init`: write a starter package.json.

use std::fs;
use std::path::Path;

use clap::Args;
use gantry::manifest::Manifest;
use tracing::info;

use super::common::Settings;
use super::output::Output;
use crate::error::CliError;

/// Name used when the project directory has no usable name.
const FALLBACK_PROJECT_NAME: &str = "my-project";

#[derive(Debug, Clone, Args)]
pub struct InitArgs {
    /// Project name (default: the directory name)
    pub name: Option<String>,

    /// Overwrite an existing package.json
    #[arg(short, long)]
    pub force: bool,
}

pub fn run(args: &InitArgs, settings: &Settings, output: &dyn Output) -> Result<(), CliError> {
    let store = settings.store();
    fs::create_dir_all(store.project_dir()).map_err(|error| CliError::FileWrite {
        path: store.project_dir().to_path_buf(),
        error,
    })?;

    let name = match &args.name {
        Some(name) if !name.trim().is_empty() => name.trim().to_string(),
        _ => project_name(store.project_dir()),
    };

    store.create(&Manifest::new(&name), args.force)?;
    info!(path = %store.path().display(), name = %name, "Created manifest");

    output.success(&format!("Created {}", store.path().display()));
    Ok(())
}

/// Derive a package name from a directory name.
fn project_name(dir: &Path) -> String {
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let name: String = dir
        .file_name()
        .map(|n| n.to_string_lossy().trim().to_lowercase())
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");

    if name.is_empty() {
        FALLBACK_PROJECT_NAME.to_string()
    } else {
        name
    }
}
