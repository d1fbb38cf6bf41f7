//! The `package.json` data model.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Default version written by `init`.
pub const DEFAULT_PROJECT_VERSION: &str = "1.0.0";

/// Default entry point written by `init`.
pub const DEFAULT_ENTRY_POINT: &str = "index.js";

/// Default `test` script written by `init`.
pub const DEFAULT_TEST_SCRIPT: &str = "echo \"Error: no test specified\" && exit 1";

/// Which dependency mapping a package is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DependencyKind {
    /// `dependencies` - needed at runtime.
    #[default]
    Runtime,
    /// `devDependencies` - needed only for development.
    Dev,
}

impl DependencyKind {
    /// The manifest field holding this kind of dependency.
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Runtime => "dependencies",
            Self::Dev => "devDependencies",
        }
    }

    /// The other mapping.
    pub fn opposite(&self) -> Self {
        match self {
            Self::Runtime => Self::Dev,
            Self::Dev => Self::Runtime,
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Runtime => write!(f, "runtime"),
            Self::Dev => write!(f, "dev"),
        }
    }
}

impl FromStr for DependencyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "runtime" | "prod" | "dependencies" => Ok(Self::Runtime),
            "dev" | "devdependencies" => Ok(Self::Dev),
            other => Err(format!("unknown dependency kind '{}'", other)),
        }
    }
}

/// A project manifest (`package.json`).
///
/// Only the fields the installer works with are typed. Everything else in the
/// document is kept in [`Manifest::extra`] and written back unchanged, so a
/// load/merge/commit cycle never drops user data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Entry point.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,

    /// Script name to command. Kept as raw JSON so key order survives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<Map<String, Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    dependencies: Option<BTreeMap<String, String>>,

    #[serde(
        default,
        rename = "devDependencies",
        skip_serializing_if = "Option::is_none"
    )]
    dev_dependencies: Option<BTreeMap<String, String>>,

    /// Fields this crate does not model.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Manifest {
    /// Create the manifest written by `init` for a new project.
    pub fn new(name: impl Into<String>) -> Self {
        let mut scripts = Map::new();
        scripts.insert(
            "test".to_string(),
            Value::String(DEFAULT_TEST_SCRIPT.to_string()),
        );

        Self {
            name: Some(name.into().trim().to_string()),
            version: Some(DEFAULT_PROJECT_VERSION.to_string()),
            description: Some(String::new()),
            main: Some(DEFAULT_ENTRY_POINT.to_string()),
            scripts: Some(scripts),
            dependencies: Some(BTreeMap::new()),
            dev_dependencies: Some(BTreeMap::new()),
            extra: Map::new(),
        }
    }

    /// The dependency mapping for `kind`, if present in the document.
    pub fn dependencies(&self, kind: DependencyKind) -> Option<&BTreeMap<String, String>> {
        match kind {
            DependencyKind::Runtime => self.dependencies.as_ref(),
            DependencyKind::Dev => self.dev_dependencies.as_ref(),
        }
    }

    fn dependencies_mut(&mut self, kind: DependencyKind) -> &mut Option<BTreeMap<String, String>> {
        match kind {
            DependencyKind::Runtime => &mut self.dependencies,
            DependencyKind::Dev => &mut self.dev_dependencies,
        }
    }

    /// Names recorded under `kind`, sorted.
    pub fn dependency_names(&self, kind: DependencyKind) -> Vec<String> {
        self.dependencies(kind)
            .map(|deps| deps.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Look up where and at which version `name` is recorded.
    pub fn find(&self, name: &str) -> Option<(DependencyKind, &str)> {
        [DependencyKind::Runtime, DependencyKind::Dev]
            .into_iter()
            .find_map(|kind| {
                self.dependencies(kind)
                    .and_then(|deps| deps.get(name))
                    .map(|version| (kind, version.as_str()))
            })
    }

    /// The command for a named script.
    pub fn script(&self, name: &str) -> Option<&str> {
        self.scripts.as_ref()?.get(name)?.as_str()
    }

    /// Merge resolved `(name, version)` pairs into the `kind` mapping.
    ///
    /// Existing entries are overwritten. A name is removed from the other
    /// mapping so it is never recorded twice. Returns the number of pairs
    /// applied; an empty `additions` leaves the manifest untouched.
    pub fn merge<I, K, V>(&mut self, kind: DependencyKind, additions: I) -> usize
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut applied = 0;
        for (name, version) in additions {
            let name = name.into();
            if let Some(other) = self.dependencies_mut(kind.opposite()) {
                other.remove(&name);
            }
            self.dependencies_mut(kind)
                .get_or_insert_with(BTreeMap::new)
                .insert(name, version.into());
            applied += 1;
        }
        applied
    }
}
