//! Project manifest (`package.json`) model and store.
//!
//! The [`ManifestStore`] is the only component that touches the manifest on
//! disk. It offers three primitives:
//!
//! - [`ManifestStore::load`] - read and decode the current manifest
//! - [`Manifest::merge`] - fold resolved versions into one dependency mapping
//! - [`ManifestStore::commit`] - replace the file atomically
//!
//! Commits go through a sibling temporary file that is renamed over the
//! original, so a reader never observes a half-written manifest:
//!
//! ```text
//! package.json            (untouched until rename)
//! .package.json.XXXX.tmp  ── write + fsync ──► rename ──► package.json
//! ```

mod error;
mod store;
mod types;

pub use error::{ManifestError, ManifestResult};
pub use store::{ManifestStore, StagedManifest, MANIFEST_FILE};
pub use types::{
    DependencyKind, Manifest, DEFAULT_ENTRY_POINT, DEFAULT_PROJECT_VERSION, DEFAULT_TEST_SCRIPT,
};
