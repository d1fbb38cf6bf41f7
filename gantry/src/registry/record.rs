//! Registry documents and URL layout.

use std::collections::HashMap;

use reqwest::Url;
use serde::Deserialize;

use super::error::{RegistryError, RegistryResult};
use crate::package::PackageName;

/// Default public registry.
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// The dist-tag that names the newest stable release.
pub const LATEST_TAG: &str = "latest";

/// The registry's descriptor of one package.
///
/// Only the fields needed for resolution are decoded; the rest of the
/// (potentially large) document is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistryRecord {
    #[serde(default)]
    pub name: String,

    #[serde(rename = "dist-tags", default)]
    pub dist_tags: HashMap<String, String>,
}

impl RegistryRecord {
    /// Decode a registry document fetched from `url`.
    pub fn from_slice(body: &[u8], url: &str) -> RegistryResult<Self> {
        serde_json::from_slice(body).map_err(|e| RegistryError::Malformed {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// The raw `latest` tag, if present.
    pub fn latest(&self) -> Option<&str> {
        self.dist_tags.get(LATEST_TAG).map(String::as_str)
    }

    /// The `latest` tag, validated as a semantic version.
    pub fn latest_version(&self, url: &str) -> RegistryResult<String> {
        let latest = self.latest().ok_or_else(|| RegistryError::Malformed {
            url: url.to_string(),
            reason: "no 'latest' dist-tag".to_string(),
        })?;

        semver::Version::parse(latest).map_err(|e| RegistryError::Malformed {
            url: url.to_string(),
            reason: format!("'latest' tag '{}' is not a valid version: {}", latest, e),
        })?;

        Ok(latest.to_string())
    }
}

/// URL layout of a registry.
///
/// ```text
/// <base>/<name>                          package document
/// <base>/<name>/-/<basename>-<ver>.tgz   archive
/// ```
///
/// Scoped names are used as two path segments, unmodified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryUrls {
    base: String,
}

impl RegistryUrls {
    /// Validate and normalize a registry base URL.
    pub fn new(base: &str) -> RegistryResult<Self> {
        let trimmed = base.trim().trim_end_matches('/');
        let parsed =
            Url::parse(trimmed).map_err(|_| RegistryError::InvalidBaseUrl(base.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(RegistryError::InvalidBaseUrl(base.to_string()));
        }

        Ok(Self {
            base: trimmed.to_string(),
        })
    }

    /// The normalized base URL, without a trailing slash.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// URL of the package document.
    pub fn metadata_url(&self, name: &PackageName) -> String {
        format!("{}/{}", self.base, name)
    }

    /// URL of the archive for `name` at `version`.
    pub fn tarball_url(&self, name: &PackageName, version: &str) -> String {
        format!(
            "{}/{}/-/{}-{}.tgz",
            self.base,
            name,
            name.basename(),
            version
        )
    }
}

impl Default for RegistryUrls {
    fn default() -> Self {
        Self {
            base: DEFAULT_REGISTRY_URL.to_string(),
        }
    }
}
