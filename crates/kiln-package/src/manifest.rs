//! Project manifest parsing and types (kiln.toml)

use crate::validator::Validator;
use crate::{PackageError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// File name of the project manifest
pub const MANIFEST_FILE_NAME: &str = "kiln.toml";

/// Project manifest (kiln.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Project {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub license: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deps: Vec<Dependency>,
}

/// Dependency declared by a project
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Dependency {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Dependency {
    /// Dependency without a source URL
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: None,
        }
    }

    /// Set the source URL
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

impl Project {
    /// Manifest for a directory that ships none: no dependencies, unknown license
    pub fn anonymous(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            license: "unknown".to_string(),
            deps: Vec::new(),
        }
    }

    /// Parse and validate a manifest from TOML text
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load the manifest of the project rooted at `root_dir`
    pub fn from_root(root_dir: &Path) -> Result<Self> {
        let path = root_dir.join(MANIFEST_FILE_NAME);
        let content = std::fs::read_to_string(&path).map_err(|error| PackageError::IoError {
            path: path.clone(),
            error,
        })?;
        let project = Self::from_str(&content).map_err(|error| PackageError::ParseError {
            path: path.clone(),
            error,
        })?;
        Validator::validate(&project).map_err(|error| PackageError::Invalid { path, error })?;
        Ok(project)
    }

    /// Load the manifest under `root_dir` if the directory has one
    pub fn load(root_dir: &Path) -> Result<Option<Self>> {
        if root_dir.join(MANIFEST_FILE_NAME).is_file() {
            Self::from_root(root_dir).map(Some)
        } else {
            Ok(None)
        }
    }

    /// Serialize to TOML text
    pub fn to_toml(&self) -> std::result::Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Write the manifest into `root_dir`, replacing any existing one
    pub fn save(&self, root_dir: &Path) -> Result<()> {
        let path = root_dir.join(MANIFEST_FILE_NAME);
        let content = self.to_toml().map_err(|error| PackageError::SerializeError {
            path: path.clone(),
            error,
        })?;
        std::fs::write(&path, content).map_err(|error| PackageError::WriteError { path, error })
    }

    /// Look up a declared dependency; the first declaration of a name wins
    pub fn dependency(&self, name: &str) -> Option<&Dependency> {
        self.deps.iter().find(|dep| dep.name == name)
    }

    /// Names of the declared dependencies, in declaration order
    pub fn dependency_names(&self) -> impl Iterator<Item = &str> {
        self.deps.iter().map(|dep| dep.name.as_str())
    }
}

impl fmt::Display for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.title {
            Some(title) => write!(f, "{}: {}", self.name, title),
            None => write!(f, "{}", self.name),
        }
    }
}
