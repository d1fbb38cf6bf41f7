//! Package name parsing and validation.
//!
//! Registry package names come in two shapes:
//!
//! - plain names such as `lodash`
//! - scoped names such as `@types/node`, where `@types` is the namespace
//!
//! A [`PackageName`] is validated once at the boundary so the registry,
//! installer, and manifest layers can rely on it being safe to use both in
//! URLs and as a relative filesystem path.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

/// Maximum length of a package name accepted by the public registry.
pub const MAX_NAME_LENGTH: usize = 214;

/// Errors produced when a string is not a valid package name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PackageNameError {
    /// The name was empty or whitespace.
    #[error("package name is empty")]
    Empty,

    /// The name exceeds [`MAX_NAME_LENGTH`].
    #[error("package name '{name}' is longer than {max} characters")]
    TooLong { name: String, max: usize },

    /// A scoped name was not of the form `@scope/name`.
    #[error("scoped package name '{0}' must look like @scope/name")]
    InvalidScope(String),

    /// The name contains characters that are not allowed.
    #[error("package name '{0}' contains invalid characters")]
    InvalidCharacters(String),

    /// The name starts with a character that is reserved.
    #[error("package name '{0}' cannot start with '.' or '_'")]
    ReservedPrefix(String),
}

fn segment_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z0-9][a-z0-9._~-]*$").expect("segment pattern is a valid regex")
    })
}

/// A validated registry package name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageName {
    full: String,
    /// Byte offset of the basename within `full` (0 for unscoped names).
    base_start: usize,
}

impl PackageName {
    /// Parse and validate a package name.
    pub fn parse(input: &str) -> Result<Self, PackageNameError> {
        let name = input.trim();
        if name.is_empty() {
            return Err(PackageNameError::Empty);
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(PackageNameError::TooLong {
                name: name.to_string(),
                max: MAX_NAME_LENGTH,
            });
        }

        let base_start = if let Some(rest) = name.strip_prefix('@') {
            let (scope, base) = rest
                .split_once('/')
                .ok_or_else(|| PackageNameError::InvalidScope(name.to_string()))?;
            if scope.is_empty() || base.is_empty() || base.contains('/') {
                return Err(PackageNameError::InvalidScope(name.to_string()));
            }
            validate_segment(scope, name)?;
            validate_segment(base, name)?;
            // '@' + scope + '/'
            scope.len() + 2
        } else {
            if name.contains('/') {
                return Err(PackageNameError::InvalidCharacters(name.to_string()));
            }
            validate_segment(name, name)?;
            0
        };

        Ok(Self {
            full: name.to_string(),
            base_start,
        })
    }

    /// The full name as written in manifests and registry URLs.
    pub fn as_str(&self) -> &str {
        &self.full
    }

    /// The namespace (including the leading `@`) for scoped names.
    pub fn scope(&self) -> Option<&str> {
        if self.base_start == 0 {
            None
        } else {
            Some(&self.full[..self.base_start - 1])
        }
    }

    /// The name without its namespace prefix.
    pub fn basename(&self) -> &str {
        &self.full[self.base_start..]
    }

    /// Whether this name has a namespace prefix.
    pub fn is_scoped(&self) -> bool {
        self.base_start != 0
    }

    /// Path of the package directory relative to the dependency root.
    ///
    /// Scoped packages live one level deeper, under their namespace directory.
    pub fn relative_path(&self) -> PathBuf {
        match self.scope() {
            Some(scope) => PathBuf::from(scope).join(self.basename()),
            None => PathBuf::from(self.basename()),
        }
    }
}

fn validate_segment(segment: &str, full: &str) -> Result<(), PackageNameError> {
    if segment.starts_with('.') || segment.starts_with('_') {
        return Err(PackageNameError::ReservedPrefix(full.to_string()));
    }
    if !segment_pattern().is_match(segment) {
        return Err(PackageNameError::InvalidCharacters(full.to_string()));
    }
    Ok(())
}

impl fmt::Display for PackageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full)
    }
}

impl FromStr for PackageName {
    type Err = PackageNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.full
    }
}
