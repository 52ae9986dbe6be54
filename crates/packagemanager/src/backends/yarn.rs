//! Yarn classic (v1) and yarn berry (v2+).
//!
//! Both share the `yarn` command and the `yarn.lock` file name, so they are
//! told apart by the lockfile format: berry lockfiles open with a
//! `__metadata:` block, classic lockfiles with a `# yarn lockfile v1` banner.

use super::{
    Backend, BackendDescriptor, NODE_MODULES_IGNORE, file_exists, package_json_workspace_globs,
    parse_version,
};
use crate::error::{Error, Result};
use crate::manifest::read_yaml_file;
use crate::package_manager::PackageManager;
use regex::Regex;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

const YARN_DESCRIPTOR: BackendDescriptor = BackendDescriptor {
    name: "nodejs-yarn",
    slug: "yarn",
    command: "yarn",
    specfile: "package.json",
    lockfile: "yarn.lock",
    package_dir: "node_modules",
};

const BERRY_DESCRIPTOR: BackendDescriptor = BackendDescriptor {
    name: "nodejs-berry",
    slug: "berry",
    command: "yarn",
    specfile: "package.json",
    lockfile: "yarn.lock",
    package_dir: "node_modules",
};

const YARNRC: &str = ".yarnrc.yml";

/// Matches the release bundled via `yarnPath`, e.g. `.yarn/releases/yarn-3.2.0.cjs`.
#[allow(clippy::expect_used)]
static YARN_RELEASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"yarn-(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)\.c?js$")
        .expect("yarn release pattern is valid")
});

/// Yarn classic, workspaces declared in `package.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Yarn;

/// Yarn berry, workspaces declared in `package.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Berry;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YarnRc {
    node_linker: Option<String>,
    yarn_path: Option<String>,
}

fn read_yarnrc(root: &Path) -> Result<Option<YarnRc>> {
    if !file_exists(root, YARNRC)? {
        return Ok(None);
    }
    read_yaml_file(&root.join(YARNRC)).map(Some)
}

/// Returns `None` without a `yarn.lock`, otherwise whether it is in berry format.
fn lockfile_is_berry(root: &Path) -> Result<Option<bool>> {
    if !file_exists(root, YARN_DESCRIPTOR.lockfile)? {
        return Ok(None);
    }

    let path = root.join(YARN_DESCRIPTOR.lockfile);
    let content =
        fs::read_to_string(&path).map_err(|e| Error::io(e, &path, "reading yarn.lock"))?;
    let header: Vec<&str> = content.lines().take(5).collect();

    if header.iter().any(|line| line.starts_with("__metadata:")) {
        return Ok(Some(true));
    }

    if !header
        .iter()
        .any(|line| {
            line.contains("# yarn lockfile v1") || line.contains("# THIS IS AN AUTOGENERATED FILE")
        })
    {
        tracing::warn!("Could not determine Yarn version from lockfile format, assuming classic");
    }

    Ok(Some(false))
}

fn major_version(descriptor: &BackendDescriptor, version: &str) -> Result<u64> {
    parse_version(descriptor, version).map(|version| version.major)
}

impl Backend for Yarn {
    fn descriptor(&self) -> &BackendDescriptor {
        &YARN_DESCRIPTOR
    }

    fn workspace_globs(&self, root: &Path) -> Result<Vec<String>> {
        package_json_workspace_globs(&YARN_DESCRIPTOR, root)
    }

    fn workspace_ignores(&self, _pm: &PackageManager, _root: &Path) -> Result<Vec<String>> {
        Ok(vec![NODE_MODULES_IGNORE.to_string()])
    }

    fn cmd_arg_separator(&self, _pm: &PackageManager, _root: &Path) -> Vec<String> {
        Vec::new()
    }

    fn matches(&self, manager: &str, version: &str) -> Result<bool> {
        if manager != "yarn" {
            return Ok(false);
        }
        Ok(major_version(&YARN_DESCRIPTOR, version)? < 2)
    }

    fn detect(&self, root: &Path, _pm: &mut PackageManager) -> Result<bool> {
        Ok(lockfile_is_berry(root)? == Some(false))
    }
}

impl Backend for Berry {
    fn descriptor(&self) -> &BackendDescriptor {
        &BERRY_DESCRIPTOR
    }

    fn workspace_globs(&self, root: &Path) -> Result<Vec<String>> {
        package_json_workspace_globs(&BERRY_DESCRIPTOR, root)
    }

    /// Plug'n'Play installs have no `node_modules`; only the `node-modules` linker needs ignoring.
    fn workspace_ignores(&self, _pm: &PackageManager, root: &Path) -> Result<Vec<String>> {
        let linker = read_yarnrc(root)?.and_then(|rc| rc.node_linker);
        if linker.as_deref() == Some("node-modules") {
            Ok(vec![NODE_MODULES_IGNORE.to_string()])
        } else {
            Ok(Vec::new())
        }
    }

    fn cmd_arg_separator(&self, _pm: &PackageManager, _root: &Path) -> Vec<String> {
        Vec::new()
    }

    fn matches(&self, manager: &str, version: &str) -> Result<bool> {
        if manager != "yarn" {
            return Ok(false);
        }
        Ok(major_version(&BERRY_DESCRIPTOR, version)? >= 2)
    }

    fn detect(&self, root: &Path, pm: &mut PackageManager) -> Result<bool> {
        if lockfile_is_berry(root)? != Some(true) {
            return Ok(false);
        }

        let release = read_yarnrc(root)?
            .and_then(|rc| rc.yarn_path)
            .and_then(|path| YARN_RELEASE.captures(&path).map(|caps| caps[1].to_string()));

        if let Some(version) = release {
            tracing::debug!("Found yarn release {} in {}", version, YARNRC);
            pm.set_version(version);
        }

        Ok(true)
    }
}
