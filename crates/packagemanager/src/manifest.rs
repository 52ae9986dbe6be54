//! The subset of `package.json` needed to identify a package manager and its workspaces.

use crate::error::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

/// A parsed root `package.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageJson {
    /// Package name.
    #[serde(default)]
    pub name: Option<String>,

    /// Package version.
    #[serde(default)]
    pub version: Option<String>,

    /// The declared package manager, e.g. `pnpm@8.15.4`.
    #[serde(default)]
    pub package_manager: Option<String>,

    /// Workspace globs, in either of the two accepted shapes.
    #[serde(default)]
    pub workspaces: Option<Workspaces>,
}

/// The `workspaces` field of `package.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Workspaces {
    /// `"workspaces": ["packages/*"]`
    Array(Vec<String>),
    /// `"workspaces": { "packages": ["packages/*"], "nohoist": [...] }`
    Object {
        /// Workspace globs.
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl Workspaces {
    /// Returns the declared globs regardless of shape.
    #[must_use]
    pub fn globs(&self) -> &[String] {
        match self {
            Self::Array(globs) | Self::Object { packages: globs } => globs,
        }
    }
}

impl PackageJson {
    /// Reads and parses a `package.json` file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid JSON.
    pub fn load(path: &Path) -> Result<Self> {
        read_json_file(path)
    }

    /// Returns the `packageManager` declaration, treating blank values as absent.
    #[must_use]
    pub fn declared_package_manager(&self) -> Option<&str> {
        self.package_manager
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Returns the workspace globs, or an empty slice if none are declared.
    #[must_use]
    pub fn workspace_globs(&self) -> &[String] {
        self.workspaces
            .as_ref()
            .map(Workspaces::globs)
            .unwrap_or_default()
    }
}

/// Reads and parses a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed as valid JSON.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading json file"))?;

    serde_json::from_str(&content).map_err(|e| Error::Json {
        source: e,
        path: Some(path.to_path_buf()),
    })
}

/// Reads and parses a YAML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed as valid YAML.
pub fn read_yaml_file<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(e, path, "reading yaml file"))?;

    serde_yaml::from_str(&content).map_err(|e| Error::Yaml {
        source: e,
        path: Some(path.to_path_buf()),
    })
}
