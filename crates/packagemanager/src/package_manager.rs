//! The result of identifying a project's package manager.

use crate::backends::{Backend, BackendDescriptor};
use crate::error::Result;
use crate::globby;
use crate::probe::VersionProbe;
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A backend resolved for one project, together with the version discovered for it.
///
/// Each identification produces its own value, so the shared backend templates
/// are never mutated and concurrent resolutions cannot observe each other.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageManager {
    #[serde(skip)]
    backend: &'static dyn Backend,
    #[serde(flatten)]
    descriptor: BackendDescriptor,
    version: Option<String>,
}

impl PartialEq for PackageManager {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor && self.version == other.version
    }
}

impl Eq for PackageManager {}

impl PackageManager {
    /// Creates an unversioned resolution for `backend`.
    #[must_use]
    pub fn new(backend: &'static dyn Backend) -> Self {
        Self {
            backend,
            descriptor: *backend.descriptor(),
            version: None,
        }
    }

    /// Returns this resolution with `version` attached.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Records a version discovered for this project.
    pub fn set_version(&mut self, version: impl Into<String>) {
        self.version = Some(version.into());
    }

    /// The backend this resolution dispatches to.
    #[must_use]
    pub fn backend(&self) -> &'static dyn Backend {
        self.backend
    }

    /// Static facts about the backend.
    #[must_use]
    pub fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    /// Descriptive name, e.g. `nodejs-pnpm`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Unique slug, e.g. `pnpm`.
    #[must_use]
    pub fn slug(&self) -> &'static str {
        self.descriptor.slug
    }

    /// Executable name.
    #[must_use]
    pub fn command(&self) -> &'static str {
        self.descriptor.command
    }

    /// Manifest file name.
    #[must_use]
    pub fn specfile(&self) -> &'static str {
        self.descriptor.specfile
    }

    /// Lockfile name.
    #[must_use]
    pub fn lockfile(&self) -> &'static str {
        self.descriptor.lockfile
    }

    /// Installed package directory name.
    #[must_use]
    pub fn package_dir(&self) -> &'static str {
        self.descriptor.package_dir
    }

    /// The declared or detected version, if one is known.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the directory globs that may contain workspace packages.
    ///
    /// # Errors
    ///
    /// Propagates the backend's configuration errors.
    pub fn workspace_globs(&self, root: &Path) -> Result<Vec<String>> {
        self.backend.workspace_globs(root)
    }

    /// Returns the globs that are never searched for workspaces.
    ///
    /// # Errors
    ///
    /// Propagates the backend's configuration errors.
    pub fn workspace_ignores(&self, root: &Path) -> Result<Vec<String>> {
        self.backend.workspace_ignores(self, root)
    }

    /// Returns the tokens to place before arguments forwarded to a script.
    #[must_use]
    pub fn cmd_arg_separator(&self, root: &Path) -> Vec<String> {
        self.backend.cmd_arg_separator(self, root)
    }

    /// Returns the manifest path of every workspace package under `root`.
    ///
    /// Each workspace glob is turned into a manifest glob (`packages/*` becomes
    /// `packages/*/package.json`) and matched with the backend's ignores applied.
    ///
    /// # Errors
    ///
    /// Returns an error if workspace configuration cannot be read, a glob is
    /// invalid, or the tree cannot be walked.
    pub fn get_workspaces(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let globs = self.workspace_globs(root)?;
        let manifests: Vec<String> = globs
            .iter()
            .map(|glob| manifest_glob(glob, self.specfile()))
            .collect();
        let ignores = self.workspace_ignores(root)?;

        tracing::debug!(
            manager = self.slug(),
            globs = ?manifests,
            ignores = ?ignores,
            "Resolving workspaces"
        );

        let workspaces = globby::glob_files(root, &manifests, &ignores)?;
        tracing::debug!("Found {} workspace(s)", workspaces.len());
        Ok(workspaces)
    }

    /// Runs `<command> --version` in `root` with the default probe timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VersionProbe`](crate::Error::VersionProbe) if the
    /// command cannot be launched, fails, or times out.
    pub fn version_from_cmd(&self, root: &Path) -> Result<String> {
        VersionProbe::default().version(self, root)
    }

    /// Runs `<command> --version` in `root`, treating failure as fatal.
    ///
    /// Only for callers that cannot continue without a version. Everyone else
    /// should use [`version_from_cmd`](Self::version_from_cmd).
    ///
    /// # Panics
    ///
    /// Panics if the version cannot be obtained.
    #[must_use]
    pub fn require_version_from_cmd(&self, root: &Path) -> String {
        VersionProbe::default().require_version(self, root)
    }

    /// Returns the known version, probing the executable only when none was declared or detected.
    ///
    /// # Errors
    ///
    /// Returns an error if no version is known and probing fails.
    pub fn resolved_version(&self, root: &Path, probe: &VersionProbe) -> Result<String> {
        match self.version() {
            Some(version) => Ok(version.to_string()),
            None => probe.version(self, root),
        }
    }
}

/// Appends the manifest file name to a workspace directory glob.
fn manifest_glob(glob: &str, specfile: &str) -> String {
    let (negation, glob) = match glob.strip_prefix('!') {
        Some(rest) => ("!", rest),
        None => ("", glob),
    };
    let glob = glob.strip_prefix("./").unwrap_or(glob).trim_end_matches('/');

    if glob.is_empty() || glob == "." {
        format!("{negation}{specfile}")
    } else {
        format!("{negation}{glob}/{specfile}")
    }
}
