use super::{
    Backend, BackendDescriptor, NODE_MODULES_IGNORE, file_exists, package_json_workspace_globs,
};
use crate::error::Result;
use crate::package_manager::PackageManager;
use std::path::Path;

const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
    name: "nodejs-npm",
    slug: "npm",
    command: "npm",
    specfile: "package.json",
    lockfile: "package-lock.json",
    package_dir: "node_modules",
};

/// Older npm projects may only carry a shrinkwrap file.
const SHRINKWRAP: &str = "npm-shrinkwrap.json";

/// npm, workspaces declared in `package.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Npm;

impl Backend for Npm {
    fn descriptor(&self) -> &BackendDescriptor {
        &DESCRIPTOR
    }

    fn workspace_globs(&self, root: &Path) -> Result<Vec<String>> {
        package_json_workspace_globs(&DESCRIPTOR, root)
    }

    fn workspace_ignores(&self, _pm: &PackageManager, _root: &Path) -> Result<Vec<String>> {
        Ok(vec![NODE_MODULES_IGNORE.to_string()])
    }

    fn cmd_arg_separator(&self, _pm: &PackageManager, _root: &Path) -> Vec<String> {
        vec!["--".to_string()]
    }

    fn matches(&self, manager: &str, _version: &str) -> Result<bool> {
        Ok(manager == "npm")
    }

    fn detect(&self, root: &Path, _pm: &mut PackageManager) -> Result<bool> {
        Ok(file_exists(root, DESCRIPTOR.lockfile)? || file_exists(root, SHRINKWRAP)?)
    }
}
