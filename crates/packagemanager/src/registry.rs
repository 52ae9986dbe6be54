//! The ordered set of known backends and the identification protocol built on it.
//!
//! Identification runs in two stages:
//!
//! 1. [`Registry::read_package_manager`] honours an explicit `packageManager`
//!    declaration in the root manifest.
//! 2. [`Registry::detect_package_manager`] probes the project directory, asking
//!    each backend in registration order. The first backend to claim the
//!    project wins, so registration order doubles as a priority list when stale
//!    lockfiles from several managers are present.
//!
//! [`Registry::get_package_manager`] falls back from the first stage to the
//! second when nothing is declared or no backend accepts the declaration. A
//! declaration that is present but malformed is reported as-is.

use crate::backends::{BERRY, Backend, NPM, PNPM, YARN};
use crate::error::{Error, Result};
use crate::manifest::PackageJson;
use crate::package_manager::PackageManager;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static BUILTIN: LazyLock<Registry> = LazyLock::new(|| {
    Registry::new(vec![&YARN, &BERRY, &NPM, &PNPM]).expect("built-in backends have unique slugs")
});

/// An ordered, immutable list of backends.
#[derive(Debug)]
pub struct Registry {
    backends: Vec<&'static dyn Backend>,
    pattern: String,
    regex: Regex,
}

impl Registry {
    /// Builds a registry from `backends`, in priority order.
    ///
    /// The declaration pattern accepts the command name of any backend given.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSlug`] if two backends share a slug.
    pub fn new(backends: Vec<&'static dyn Backend>) -> Result<Self> {
        let mut slugs = HashSet::new();
        for backend in &backends {
            let slug = backend.descriptor().slug;
            if !slugs.insert(slug) {
                return Err(Error::DuplicateSlug {
                    slug: slug.to_string(),
                });
            }
        }

        let mut commands: Vec<&str> = backends
            .iter()
            .map(|backend| backend.descriptor().command)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        // Longest first so no command shadows another it prefixes
        commands.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));

        let alternation = commands
            .iter()
            .map(|command| regex::escape(command))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = format!(r"({alternation})@(\d+)\.\d+\.\d+(-[0-9A-Za-z.-]+)?");
        let regex = Regex::new(&pattern).map_err(|e| Error::InvalidDeclaration {
            pattern: pattern.clone(),
            received: e.to_string(),
        })?;

        Ok(Self {
            backends,
            pattern,
            regex,
        })
    }

    /// The built-in registry: yarn, berry, npm, pnpm, in that order.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// The registered backends, in priority order.
    #[must_use]
    pub fn backends(&self) -> &[&'static dyn Backend] {
        &self.backends
    }

    /// The pattern a `packageManager` declaration must contain.
    #[must_use]
    pub fn declaration_pattern(&self) -> &str {
        &self.pattern
    }

    /// Returns an unversioned resolution for the backend with `slug`.
    #[must_use]
    pub fn find(&self, slug: &str) -> Option<PackageManager> {
        self.backends
            .iter()
            .find(|backend| backend.descriptor().slug == slug)
            .map(|backend| PackageManager::new(*backend))
    }

    /// Splits a declaration such as `pnpm@7.1.0` into manager name and version.
    ///
    /// The first match anywhere in `declaration` is used and anything after it
    /// is ignored, so a corepack hash suffix (`yarn@3.2.0+sha224.abc`) is
    /// dropped. A prerelease tag is kept as part of the version.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDeclaration`] if nothing in `declaration` matches.
    pub fn parse_package_manager_string(&self, declaration: &str) -> Result<(String, String)> {
        let Some(found) = self.regex.find(declaration) else {
            return Err(Error::InvalidDeclaration {
                pattern: self.pattern.clone(),
                received: declaration.to_string(),
            });
        };

        match found.as_str().split_once('@') {
            Some((manager, version)) => Ok((manager.to_string(), version.to_string())),
            None => Err(Error::InvalidDeclaration {
                pattern: self.pattern.clone(),
                received: declaration.to_string(),
            }),
        }
    }

    /// Identifies the package manager declared in `pkg`.
    ///
    /// Backends whose matcher errors are skipped; only running out of backends
    /// is an error.
    ///
    /// # Errors
    ///
    /// - [`Error::NotDeclared`] if `pkg` has no `packageManager` value
    /// - [`Error::InvalidDeclaration`] if the value is malformed
    /// - [`Error::NoDeclaredMatch`] if no backend accepts the declaration
    pub fn read_package_manager(&self, pkg: &PackageJson) -> Result<PackageManager> {
        let Some(declared) = pkg.declared_package_manager() else {
            return Err(Error::NotDeclared);
        };

        let (manager, version) = self.parse_package_manager_string(declared)?;

        for backend in &self.backends {
            match backend.matches(&manager, &version) {
                Ok(true) => {
                    tracing::debug!(
                        "Using {} declared in package.json ({}@{})",
                        backend.descriptor().name,
                        manager,
                        version
                    );
                    return Ok(PackageManager::new(*backend).with_version(version));
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        "{} could not evaluate {}@{}: {}",
                        backend.descriptor().name,
                        manager,
                        version,
                        e
                    );
                }
            }
        }

        Err(Error::NoDeclaredMatch { manager, version })
    }

    /// Identifies the package manager from files in the project directory.
    ///
    /// # Errors
    ///
    /// - Any error a backend's detector reports, unchanged
    /// - [`Error::NotDetected`] if no backend claims the project
    pub fn detect_package_manager(&self, root: &Path) -> Result<PackageManager> {
        for backend in &self.backends {
            let mut candidate = PackageManager::new(*backend);
            if backend.detect(root, &mut candidate)? {
                tracing::debug!(
                    "Detected {} in {}",
                    backend.descriptor().name,
                    root.display()
                );
                return Ok(candidate);
            }
        }

        Err(Error::NotDetected {
            path: root.to_path_buf(),
        })
    }

    /// Identifies the package manager for `root`, preferring the declaration in `pkg`.
    ///
    /// # Errors
    ///
    /// Returns the declaration error unless [`Error::is_not_declared`] holds
    /// for it, in which case the result of filesystem detection is returned.
    pub fn get_package_manager(&self, root: &Path, pkg: &PackageJson) -> Result<PackageManager> {
        match self.read_package_manager(pkg) {
            Err(e) if e.is_not_declared() => {
                tracing::debug!("{}, inspecting {}", e, root.display());
                self.detect_package_manager(root)
            }
            result => result,
        }
    }
}

/// Splits a declaration using the built-in registry.
///
/// # Errors
///
/// See [`Registry::parse_package_manager_string`].
pub fn parse_package_manager_string(declaration: &str) -> Result<(String, String)> {
    Registry::builtin().parse_package_manager_string(declaration)
}

/// Identifies a declared package manager using the built-in registry.
///
/// # Errors
///
/// See [`Registry::read_package_manager`].
pub fn read_package_manager(pkg: &PackageJson) -> Result<PackageManager> {
    Registry::builtin().read_package_manager(pkg)
}

/// Detects a package manager from the filesystem using the built-in registry.
///
/// # Errors
///
/// See [`Registry::detect_package_manager`].
pub fn detect_package_manager(root: &Path) -> Result<PackageManager> {
    Registry::builtin().detect_package_manager(root)
}

/// Identifies the package manager for `root` using the built-in registry.
///
/// # Errors
///
/// See [`Registry::get_package_manager`].
pub fn get_package_manager(root: &Path, pkg: &PackageJson) -> Result<PackageManager> {
    Registry::builtin().get_package_manager(root, pkg)
}
