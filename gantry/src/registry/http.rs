//! HTTP registry client.
//!
//! One [`HttpRegistry`] is built per process and shared by every install
//! worker; the underlying `reqwest::Client` pools connections internally.

use std::future::Future;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use super::error::{RegistryError, RegistryResult};
use super::record::{RegistryRecord, RegistryUrls};
use super::{BoxFuture, RegistryGateway};
use crate::package::PackageName;

/// Default per-call deadline.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Abbreviated package documents are much smaller and still carry dist-tags.
const METADATA_ACCEPT: &str = "application/vnd.npm.install-v1+json; q=1.0, application/json; q=0.8";

const ARCHIVE_ACCEPT: &str = "application/octet-stream";

const USER_AGENT: &str = concat!("gantry/", env!("CARGO_PKG_VERSION"));

/// Default upper bound on a downloaded archive.
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 256 * 1024 * 1024;

/// Upper bound on the buffer reserved from a declared `Content-Length`.
const MAX_PREALLOC: u64 = 8 * 1024 * 1024;

/// Registry gateway backed by HTTP.
#[derive(Debug, Clone)]
pub struct HttpRegistry {
    client: Client,
    urls: RegistryUrls,
    timeout: Duration,
    max_archive_size: u64,
}

impl HttpRegistry {
    /// Create a client for the registry at `base_url`.
    ///
    /// `timeout` bounds every individual call, including reading the body.
    pub fn new(base_url: &str, timeout: Duration) -> RegistryResult<Self> {
        let urls = RegistryUrls::new(base_url)?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| RegistryError::Client(e.to_string()))?;

        Ok(Self {
            client,
            urls,
            timeout,
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
        })
    }

    /// Reject archives larger than `bytes`.
    pub fn with_max_archive_size(mut self, bytes: u64) -> Self {
        self.max_archive_size = bytes;
        self
    }

    /// URL layout used by this client.
    pub fn urls(&self) -> &RegistryUrls {
        &self.urls
    }

    /// Per-call deadline.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn max_archive_size(&self) -> u64 {
        self.max_archive_size
    }

    fn too_large(&self, url: &str) -> RegistryError {
        RegistryError::TooLarge {
            url: url.to_string(),
            limit: self.max_archive_size,
        }
    }

    async fn send(&self, url: &str, accept: &str) -> RegistryResult<Response> {
        self.client
            .get(url)
            .header(ACCEPT, accept)
            .send()
            .await
            .map_err(|e| self.request_error(url, e))
    }

    fn request_error(&self, url: &str, e: reqwest::Error) -> RegistryError {
        if e.is_timeout() {
            RegistryError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else {
            RegistryError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }

    async fn with_deadline<T, F>(&self, url: &str, call: F) -> RegistryResult<T>
    where
        F: Future<Output = RegistryResult<T>>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(RegistryError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }),
        }
    }

    async fn resolve(&self, name: &PackageName) -> RegistryResult<String> {
        let url = self.urls.metadata_url(name);
        debug!(package = %name, url = %url, "Resolving latest version");

        self.with_deadline(&url, async {
            let response = self.send(&url, METADATA_ACCEPT).await?;
            let status = response.status();
            if status == StatusCode::NOT_FOUND {
                return Err(RegistryError::NotFound {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            if !status.is_success() {
                return Err(RegistryError::Status {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }

            let body = response
                .bytes()
                .await
                .map_err(|e| self.request_error(&url, e))?;
            RegistryRecord::from_slice(&body, &url)?.latest_version(&url)
        })
        .await
    }

    async fn fetch(&self, name: &PackageName, version: &str) -> RegistryResult<Bytes> {
        let url = self.urls.tarball_url(name, version);
        debug!(package = %name, version, url = %url, "Fetching archive");

        self.with_deadline(&url, async {
            let response = self.send(&url, ARCHIVE_ACCEPT).await?;
            let status = response.status();
            if !status.is_success() {
                return Err(RegistryError::NotFound {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }

            let declared = response.content_length();
            if declared.is_some_and(|n| n > self.max_archive_size) {
                return Err(self.too_large(&url));
            }

            let capacity = declared.map_or(0, |n| n.min(MAX_PREALLOC) as usize);
            let mut buffer = BytesMut::with_capacity(capacity);
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk.map_err(|e| self.request_error(&url, e))?;
                if (buffer.len() + chunk.len()) as u64 > self.max_archive_size {
                    return Err(self.too_large(&url));
                }
                buffer.extend_from_slice(&chunk);
            }

            debug!(package = %name, bytes = buffer.len(), "Archive downloaded");
            Ok(buffer.freeze())
        })
        .await
    }
}

impl RegistryGateway for HttpRegistry {
    fn resolve_latest<'a>(&'a self, name: &'a PackageName) -> BoxFuture<'a, RegistryResult<String>> {
        Box::pin(self.resolve(name))
    }

    fn fetch_archive<'a>(
        &'a self,
        name: &'a PackageName,
        version: &'a str,
    ) -> BoxFuture<'a, RegistryResult<Bytes>> {
        Box::pin(self.fetch(name, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_normalizes_base() {
        let registry = HttpRegistry::new("https://registry.npmjs.org/", Duration::from_secs(5))
            .unwrap();
        assert_eq!(registry.urls().base(), "https://registry.npmjs.org");
        assert_eq!(registry.timeout(), Duration::from_secs(5));
        assert_eq!(registry.max_archive_size(), DEFAULT_MAX_ARCHIVE_SIZE);
    }

    #[test]
    fn test_new_rejects_invalid_base() {
        let result = HttpRegistry::new("registry", DEFAULT_REQUEST_TIMEOUT);
        assert!(matches!(result, Err(RegistryError::InvalidBaseUrl(_))));
    }

    #[tokio::test]
    async fn test_unreachable_registry_is_transport_error() {
        // Port 9 (discard) on localhost is almost never listening.
        let registry =
            HttpRegistry::new("http://127.0.0.1:9", Duration::from_secs(5)).unwrap();
        let name = PackageName::parse("lodash").unwrap();

        let err = registry.resolve_latest(&name).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Transport { .. } | RegistryError::Timeout { .. }
        ));
    }
}
