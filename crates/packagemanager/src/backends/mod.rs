//! The package manager backend contract and the built-in JavaScript backends.
//!
//! Each backend is a unit type implementing [`Backend`]. A backend carries a
//! static [`BackendDescriptor`] plus five behaviors: workspace globs, workspace
//! ignores, argument separator, declaration matching and filesystem detection.
//! Backends are stateless; anything a backend learns about a particular project
//! is written to the [`PackageManager`] value passed to [`Backend::detect`].

use crate::error::{Error, Result};
use crate::manifest::PackageJson;
use crate::package_manager::PackageManager;
use serde::Serialize;
use std::fmt;
use std::path::Path;

mod npm;
mod pnpm;
mod yarn;

pub use npm::Npm;
pub use pnpm::Pnpm;
pub use yarn::{Berry, Yarn};

/// Built-in yarn classic (v1) backend.
pub static YARN: Yarn = Yarn;
/// Built-in yarn berry (v2+) backend.
pub static BERRY: Berry = Berry;
/// Built-in npm backend.
pub static NPM: Npm = Npm;
/// Built-in pnpm backend.
pub static PNPM: Pnpm = Pnpm;

/// Glob excluding installed dependencies from workspace discovery.
pub(crate) const NODE_MODULES_IGNORE: &str = "**/node_modules/**";

/// Static facts about a package manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendDescriptor {
    /// Descriptive name, e.g. `nodejs-pnpm`.
    pub name: &'static str,
    /// Unique identifier within a registry, e.g. `pnpm`.
    pub slug: &'static str,
    /// Executable used to invoke the manager.
    pub command: &'static str,
    /// Manifest file each package carries.
    pub specfile: &'static str,
    /// Lockfile written at the project root.
    pub lockfile: &'static str,
    /// Directory installed packages are placed in.
    pub package_dir: &'static str,
}

/// Behavior a package manager backend must provide.
///
/// Every method may fail with an I/O or parse error. Callers decide whether
/// that error is terminal; see [`Registry`](crate::Registry).
pub trait Backend: fmt::Debug + Send + Sync {
    /// Returns the static description of this backend.
    fn descriptor(&self) -> &BackendDescriptor;

    /// Returns globs for the directories that may contain workspace packages.
    ///
    /// # Errors
    ///
    /// Returns an error if the workspace configuration is missing, unreadable
    /// or declares no workspaces.
    fn workspace_globs(&self, root: &Path) -> Result<Vec<String>>;

    /// Returns globs for paths that must never be treated as workspaces.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration consulted for ignores is unreadable.
    fn workspace_ignores(&self, pm: &PackageManager, root: &Path) -> Result<Vec<String>>;

    /// Returns the tokens to insert before arguments forwarded to a script.
    fn cmd_arg_separator(&self, pm: &PackageManager, root: &Path) -> Vec<String>;

    /// Reports whether a `packageManager` declaration names this backend.
    ///
    /// # Errors
    ///
    /// Returns an error if `version` cannot be interpreted.
    fn matches(&self, manager: &str, version: &str) -> Result<bool>;

    /// Reports whether the project at `root` is managed by this backend.
    ///
    /// Implementations may record what they discover, such as a version, on `pm`.
    ///
    /// # Errors
    ///
    /// Returns an error if the project directory cannot be inspected.
    fn detect(&self, root: &Path, pm: &mut PackageManager) -> Result<bool>;
}

/// Checks for `name` under `root`, surfacing permission problems instead of hiding them.
pub(crate) fn file_exists(root: &Path, name: &str) -> Result<bool> {
    let path = root.join(name);
    path.try_exists()
        .map_err(|e| Error::io(e, path, format!("checking for {name}")))
}

/// Reads workspace globs from the root `package.json`, as npm and yarn do.
pub(crate) fn package_json_workspace_globs(
    descriptor: &BackendDescriptor,
    root: &Path,
) -> Result<Vec<String>> {
    let path = root.join(descriptor.specfile);
    let pkg = PackageJson::load(&path)?;
    let globs = pkg.workspace_globs();

    if globs.is_empty() {
        return Err(Error::NoWorkspaces {
            manager: descriptor.name.to_string(),
            path,
        });
    }

    Ok(globs.to_vec())
}

/// Parses a declared or detected manager version.
pub(crate) fn parse_version(
    descriptor: &BackendDescriptor,
    version: &str,
) -> Result<semver::Version> {
    semver::Version::parse(version).map_err(|source| Error::InvalidVersion {
        manager: descriptor.name.to_string(),
        version: version.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_slugs_are_unique() {
        let slugs = [
            YARN.descriptor().slug,
            BERRY.descriptor().slug,
            NPM.descriptor().slug,
            PNPM.descriptor().slug,
        ];
        let unique: std::collections::HashSet<_> = slugs.iter().collect();
        assert_eq!(unique.len(), slugs.len());
    }

    #[test]
    fn test_file_exists() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("yarn.lock"), "").unwrap();

        assert!(file_exists(temp_dir.path(), "yarn.lock").unwrap());
        assert!(!file_exists(temp_dir.path(), "pnpm-lock.yaml").unwrap());
    }

    #[test]
    fn test_package_json_workspace_globs_missing_field() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("package.json"), r#"{"name": "root"}"#).unwrap();

        let result = package_json_workspace_globs(NPM.descriptor(), temp_dir.path());
        assert!(matches!(result, Err(Error::NoWorkspaces { .. })));
    }

    #[test]
    fn test_parse_version_invalid() {
        let result = parse_version(YARN.descriptor(), "one.two");
        assert!(matches!(
            result,
            Err(Error::InvalidVersion { version, .. }) if version == "one.two"
        ));
    }
}
