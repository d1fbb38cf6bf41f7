//! Error types for registry access.

use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur while talking to the package registry.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The registry has no such package or archive.
    #[error("{url} not found (HTTP {status})")]
    NotFound { url: String, status: u16 },

    /// The call did not complete within its deadline.
    #[error("request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The registry answered with a document we cannot use.
    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },

    /// The registry answered with an unexpected HTTP status.
    #[error("registry returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    /// The archive exceeds the download size limit.
    #[error("archive at {url} exceeds the {limit}-byte size limit")]
    TooLarge { url: String, limit: u64 },

    /// Connection or body transfer failed.
    #[error("request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    /// The configured registry base URL is not usable.
    #[error("invalid registry URL '{0}'")]
    InvalidBaseUrl(String),

    /// The HTTP client could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

impl RegistryError {
    /// Whether this error means the package or version does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether this error was caused by a deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}
