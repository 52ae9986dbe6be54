//! Package manager identification and workspace resolution for JavaScript monorepos.
//!
//! Given a project root, this crate answers three questions an orchestrator
//! needs before it can operate on a monorepo:
//!
//! - which package manager governs the project
//! - which sub-packages (workspaces) the project contains
//! - which version of the manager is in use
//!
//! # Architecture
//!
//! Every supported manager is a [`Backend`]: a static [`BackendDescriptor`]
//! plus the behaviors that differ between managers. Backends are collected in
//! a [`Registry`] whose order is also the detection priority. Identifying a
//! project yields a [`PackageManager`], an independent value pairing the
//! chosen backend with whatever version was declared or detected.
//!
//! # Identification
//!
//! The `packageManager` field of the root `package.json` wins when present.
//! Only when it is absent are lockfiles and configuration in the project
//! directory inspected:
//!
//! ```rust,ignore
//! use pkgscope_packagemanager::{PackageJson, get_package_manager};
//! use std::path::Path;
//!
//! let root = Path::new("/path/to/monorepo");
//! let pkg = PackageJson::load(&root.join("package.json"))?;
//! let pm = get_package_manager(root, &pkg)?;
//!
//! println!("{} {}", pm.name(), pm.version().unwrap_or("unknown"));
//! ```
//!
//! # Workspaces
//!
//! ```rust,ignore
//! for manifest in pm.get_workspaces(root)? {
//!     println!("{}", manifest.display());
//! }
//! ```
//!
//! # Built-in backends
//!
//! | slug    | manager              | workspaces from       |
//! |---------|----------------------|-----------------------|
//! | `yarn`  | Yarn classic (v1)    | `package.json`        |
//! | `berry` | Yarn berry (v2+)     | `package.json`        |
//! | `npm`   | npm                  | `package.json`        |
//! | `pnpm`  | pnpm                 | `pnpm-workspace.yaml` |

#![warn(missing_docs)]

pub mod backends;
pub mod error;
pub mod globby;
pub mod manifest;
pub mod package_manager;
pub mod probe;
pub mod registry;

pub use backends::{BERRY, Backend, BackendDescriptor, NPM, PNPM, YARN};
pub use error::{Error, Result};
pub use manifest::{PackageJson, Workspaces};
pub use package_manager::PackageManager;
pub use probe::{DEFAULT_PROBE_TIMEOUT, VersionProbe};
pub use registry::{
    Registry, detect_package_manager, get_package_manager, parse_package_manager_string,
    read_package_manager,
};
