//! Error types for package manager identification and workspace resolution.

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for package manager operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while identifying a package manager or resolving workspaces.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The `packageManager` field is present but does not have the `<name>@<semver>` shape.
    #[error(
        "Could not parse packageManager field in package.json, expected: {pattern}, received: {received}"
    )]
    #[diagnostic(
        code(pkgscope::packagemanager::invalid_declaration),
        help("Use the form <manager>@<major>.<minor>.<patch>, for example \"pnpm@8.15.4\"")
    )]
    InvalidDeclaration {
        /// The pattern the field is expected to match.
        pattern: String,
        /// The raw field value.
        received: String,
    },

    /// The manifest does not declare a package manager.
    #[error("We did not find a package manager specified in your root package.json")]
    #[diagnostic(
        code(pkgscope::packagemanager::not_declared),
        help(
            "Set the \"packageManager\" property in your root package.json (https://nodejs.org/api/packages.html#packagemanager) or run `corepack use <manager>@<version>` in the root of your monorepo"
        )
    )]
    NotDeclared,

    /// The declaration parsed but no registered backend accepts it.
    #[error("No supported package manager matches the declaration {manager}@{version}")]
    #[diagnostic(
        code(pkgscope::packagemanager::no_declared_match),
        help(
            "Set the \"packageManager\" property in your root package.json (https://nodejs.org/api/packages.html#packagemanager) or run `corepack use <manager>@<version>` in the root of your monorepo"
        )
    )]
    NoDeclaredMatch {
        /// Declared manager name.
        manager: String,
        /// Declared manager version.
        version: String,
    },

    /// No backend found evidence of itself in the project directory.
    #[error("We did not detect an in-use package manager for your project at {}", path.display())]
    #[diagnostic(
        code(pkgscope::packagemanager::not_detected),
        help(
            "Set the \"packageManager\" property in your root package.json (https://nodejs.org/api/packages.html#packagemanager) or run `corepack use <manager>@<version>` in the root of your monorepo"
        )
    )]
    NotDetected {
        /// The project root that was probed.
        path: PathBuf,
    },

    /// The workspace configuration for the resolved manager lists no packages.
    #[error(
        "{}: no workspaces found. {manager} requires workspaces to be defined in this file",
        path.display()
    )]
    #[diagnostic(
        code(pkgscope::packagemanager::no_workspaces),
        help("Declare the directories containing your packages, for example [\"packages/*\"]")
    )]
    NoWorkspaces {
        /// Display name of the resolved manager.
        manager: String,
        /// The configuration file that should declare workspaces.
        path: PathBuf,
    },

    /// A version string could not be parsed as semver.
    #[error("Invalid {manager} version '{version}': {source}")]
    #[diagnostic(
        code(pkgscope::packagemanager::invalid_version),
        help("Versions must follow semantic versioning, for example 3.2.1")
    )]
    InvalidVersion {
        /// The manager whose version was being checked.
        manager: String,
        /// The offending version string.
        version: String,
        /// The underlying semver error.
        #[source]
        source: semver::Error,
    },

    /// Two backends in a registry share a slug.
    #[error("Duplicate package manager slug '{slug}' in registry")]
    #[diagnostic(
        code(pkgscope::packagemanager::duplicate_slug),
        help("Every backend registered together must have a unique slug")
    )]
    DuplicateSlug {
        /// The repeated slug.
        slug: String,
    },

    /// A glob pattern could not be compiled or the tree could not be walked.
    #[error("Invalid glob '{pattern}': {message}")]
    #[diagnostic(
        code(pkgscope::packagemanager::glob_error),
        help("Check the workspace globs in your package manager configuration")
    )]
    Glob {
        /// The offending pattern.
        pattern: String,
        /// Description of the failure.
        message: String,
    },

    /// Running the package manager to read its version failed.
    #[error("Could not detect {manager} version: {message}")]
    #[diagnostic(
        code(pkgscope::packagemanager::version_probe_failed),
        help("Ensure the package manager is installed and available on PATH")
    )]
    VersionProbe {
        /// Display name of the manager.
        manager: String,
        /// Description of the failure.
        message: String,
    },

    /// I/O error occurred.
    #[error(
        "I/O error during {operation}{}: {source}",
        path.as_ref().map(|p| format!(" at {}", p.display())).unwrap_or_default()
    )]
    #[diagnostic(
        code(pkgscope::packagemanager::io_error),
        help("Check that the project directory exists and is readable")
    )]
    Io {
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
        /// Optional path where the error occurred.
        path: Option<PathBuf>,
        /// Description of the operation being performed.
        operation: String,
    },

    /// JSON parsing error.
    #[error(
        "JSON parsing error{}: {source}",
        path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default()
    )]
    #[diagnostic(
        code(pkgscope::packagemanager::json_error),
        help("Ensure package.json has valid syntax")
    )]
    Json {
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },

    /// YAML parsing error.
    #[error(
        "YAML parsing error{}: {source}",
        path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default()
    )]
    #[diagnostic(
        code(pkgscope::packagemanager::yaml_error),
        help("Ensure pnpm-workspace.yaml and .yarnrc.yml have valid syntax")
    )]
    Yaml {
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
        /// Optional path to the file being parsed.
        path: Option<PathBuf>,
    },
}

impl Error {
    /// Creates an [`Error::Io`] for `operation` on `path`.
    pub fn io(
        source: std::io::Error,
        path: impl Into<PathBuf>,
        operation: impl Into<String>,
    ) -> Self {
        Self::Io {
            source,
            path: Some(path.into()),
            operation: operation.into(),
        }
    }

    /// Returns true when the manifest names no usable package manager, which
    /// permits filesystem fallback.
    ///
    /// A declaration that parses but that no backend accepts counts as not
    /// declared. Only a malformed declaration stops resolution.
    #[must_use]
    pub fn is_not_declared(&self) -> bool {
        matches!(self, Self::NotDeclared | Self::NoDeclaredMatch { .. })
    }
}
