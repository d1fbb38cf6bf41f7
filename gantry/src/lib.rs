//! gantry - concurrent package installer for JavaScript and TypeScript
//! projects.
//!
//! The library resolves each requested package's latest version against a
//! registry, downloads and unpacks its archive into the project's
//! dependency directory, and records the result in `package.json`.
//!
//! # Modules
//!
//! - [`package`] - validated package names
//! - [`registry`] - version resolution and archive download
//! - [`installer`] - archive unpacking into the dependency directory
//! - [`manifest`] - `package.json` model and atomic persistence
//! - [`orchestrator`] - the concurrent install pipeline
//! - [`config`] - `~/.gantry/config.ini`
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod installer;
pub mod logging;
pub mod manifest;
pub mod orchestrator;
pub mod package;
pub mod registry;

pub use manifest::DependencyKind;
pub use orchestrator::{InstallError, InstallOrchestrator, InstallSummary, OrchestratorConfig};
pub use package::PackageName;
