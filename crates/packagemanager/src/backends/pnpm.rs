use super::{Backend, BackendDescriptor, NODE_MODULES_IGNORE, file_exists};
use crate::error::{Error, Result};
use crate::manifest::read_yaml_file;
use crate::package_manager::PackageManager;
use serde::Deserialize;
use std::path::Path;

const DESCRIPTOR: BackendDescriptor = BackendDescriptor {
    name: "nodejs-pnpm",
    slug: "pnpm",
    command: "pnpm",
    specfile: "package.json",
    lockfile: "pnpm-lock.yaml",
    package_dir: "node_modules",
};

const WORKSPACE_FILE: &str = "pnpm-workspace.yaml";

/// pnpm 7 stopped requiring `--` before forwarded script arguments.
const FIRST_MAJOR_WITHOUT_SEPARATOR: u64 = 7;

/// pnpm, workspaces declared in `pnpm-workspace.yaml`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pnpm;

#[derive(Debug, Default, Deserialize)]
struct PnpmWorkspace {
    #[serde(default)]
    packages: Vec<String>,
}

fn read_workspace_patterns(root: &Path) -> Result<Vec<String>> {
    let workspace: PnpmWorkspace = read_yaml_file(&root.join(WORKSPACE_FILE))?;
    Ok(workspace.packages)
}

impl Backend for Pnpm {
    fn descriptor(&self) -> &BackendDescriptor {
        &DESCRIPTOR
    }

    fn workspace_globs(&self, root: &Path) -> Result<Vec<String>> {
        let globs: Vec<String> = read_workspace_patterns(root)?
            .into_iter()
            .filter(|pattern| !pattern.starts_with('!'))
            .collect();

        if globs.is_empty() {
            return Err(Error::NoWorkspaces {
                manager: DESCRIPTOR.name.to_string(),
                path: root.join(WORKSPACE_FILE),
            });
        }

        Ok(globs)
    }

    fn workspace_ignores(&self, _pm: &PackageManager, root: &Path) -> Result<Vec<String>> {
        let mut ignores = vec![
            NODE_MODULES_IGNORE.to_string(),
            "**/bower_components/**".to_string(),
        ];

        ignores.extend(
            read_workspace_patterns(root)?
                .iter()
                .filter_map(|pattern| pattern.strip_prefix('!'))
                .map(str::to_string),
        );

        Ok(ignores)
    }

    fn cmd_arg_separator(&self, pm: &PackageManager, _root: &Path) -> Vec<String> {
        let major = pm
            .version()
            .and_then(|version| semver::Version::parse(version).ok())
            .map(|version| version.major);

        match major {
            Some(major) if major < FIRST_MAJOR_WITHOUT_SEPARATOR => vec!["--".to_string()],
            _ => Vec::new(),
        }
    }

    fn matches(&self, manager: &str, _version: &str) -> Result<bool> {
        Ok(manager == "pnpm")
    }

    fn detect(&self, root: &Path, _pm: &mut PackageManager) -> Result<bool> {
        file_exists(root, DESCRIPTOR.lockfile)
    }
}
