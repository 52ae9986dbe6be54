//! Command implementations. Each returns the text to print on stdout.

use crate::cli::{Cli, Commands};
use pkgscope_packagemanager::{
    Error, PackageJson, PackageManager, VersionProbe, get_package_manager,
};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub root: PathBuf,
    pub probe: VersionProbe,
    pub json: bool,
}

impl Context {
    /// Builds the context, resolving `--cwd` to a canonical absolute root.
    pub fn new(cli: &Cli) -> miette::Result<Self> {
        let root = cli.cwd.canonicalize().map_err(|e| {
            miette::miette!("Failed to resolve project root {}: {e}", cli.cwd.display())
        })?;

        Ok(Self {
            root,
            probe: VersionProbe::new(Duration::from_secs(cli.probe_timeout)),
            json: cli.json,
        })
    }
}

#[derive(Serialize)]
struct VersionOutput<'a> {
    name: &'a str,
    version: String,
}

pub fn execute(command: Commands, ctx: &Context) -> miette::Result<String> {
    tracing::debug!(?command, root = %ctx.root.display(), "Executing command");

    let pm = resolve(&ctx.root)?;
    match command {
        Commands::Detect => detect(&pm, ctx),
        Commands::Workspaces => workspaces(&pm, ctx),
        Commands::Version => version(&pm, ctx),
        Commands::Args => args(&pm, ctx),
    }
}

/// Identifies the package manager, treating a missing root manifest as an empty one.
fn resolve(root: &Path) -> miette::Result<PackageManager> {
    let manifest = root.join("package.json");
    let pkg = match PackageJson::load(&manifest) {
        Ok(pkg) => pkg,
        Err(Error::Io { source, .. }) if source.kind() == ErrorKind::NotFound => {
            tracing::debug!("No package.json at {}", manifest.display());
            PackageJson::default()
        }
        Err(e) => return Err(e.into()),
    };

    Ok(get_package_manager(root, &pkg)?)
}

fn detect(pm: &PackageManager, ctx: &Context) -> miette::Result<String> {
    if ctx.json {
        return to_json(pm);
    }

    Ok(match pm.version() {
        Some(version) => format!("{} ({}) {}", pm.name(), pm.slug(), version),
        None => format!("{} ({})", pm.name(), pm.slug()),
    })
}

fn workspaces(pm: &PackageManager, ctx: &Context) -> miette::Result<String> {
    let manifests = pm.get_workspaces(&ctx.root)?;

    if ctx.json {
        return to_json(&manifests);
    }

    Ok(manifests
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join("\n"))
}

fn version(pm: &PackageManager, ctx: &Context) -> miette::Result<String> {
    let version = pm.resolved_version(&ctx.root, &ctx.probe)?;

    if ctx.json {
        return to_json(&VersionOutput {
            name: pm.name(),
            version,
        });
    }

    Ok(version)
}

fn args(pm: &PackageManager, ctx: &Context) -> miette::Result<String> {
    let separator = pm.cmd_arg_separator(&ctx.root);

    if ctx.json {
        return to_json(&separator);
    }

    Ok(separator.join(" "))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> miette::Result<String> {
    serde_json::to_string_pretty(value)
        .map_err(|e| miette::miette!("Failed to serialize output: {e}"))
}
