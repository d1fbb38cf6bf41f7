//! Registry gateway: version resolution and archive retrieval.
//!
//! The rest of the crate talks to the registry only through the
//! [`RegistryGateway`] trait, which keeps the install pipeline testable
//! without network access.
//!
//! # Dyn Compatibility
//!
//! Methods return a boxed future so the gateway can be shared as
//! `Arc<dyn RegistryGateway>` across spawned worker tasks.

mod error;
mod http;
mod record;

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;

use crate::package::PackageName;

pub use error::{RegistryError, RegistryResult};
pub use http::{HttpRegistry, DEFAULT_MAX_ARCHIVE_SIZE, DEFAULT_REQUEST_TIMEOUT};
pub use record::{RegistryRecord, RegistryUrls, DEFAULT_REGISTRY_URL, LATEST_TAG};

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote source of package versions and archives.
///
/// Implementations must bound every call with their own deadline so a
/// single slow package fails on its own instead of consuming the whole
/// batch's time budget.
pub trait RegistryGateway: Send + Sync {
    /// Resolve the version tagged `latest` for `name`.
    fn resolve_latest<'a>(&'a self, name: &'a PackageName)
        -> BoxFuture<'a, RegistryResult<String>>;

    /// Download the archive of `name` at `version`.
    fn fetch_archive<'a>(
        &'a self,
        name: &'a PackageName,
        version: &'a str,
    ) -> BoxFuture<'a, RegistryResult<Bytes>>;
}
