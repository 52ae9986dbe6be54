//! File globbing with include and exclude patterns.
//!
//! Patterns are matched against paths relative to the walk root using
//! [`globset`]: `*` stays within one path segment, `**` spans any number of
//! segments, and `{a,b}` alternation is supported. Include patterns that start
//! with `!` are treated as exclusions, and exclusions always take precedence.

use crate::error::{Error, Result};
use globset::{Glob, GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Returns every file under `root` matching one of `includes` and none of `excludes`.
///
/// The result contains paths joined onto `root` (absolute when `root` is),
/// sorted and de-duplicated. A directory is not descended into when it matches an
/// exclusion, or the `<prefix>` of an exclusion of the form `<prefix>/**`.
///
/// # Errors
///
/// Returns [`Error::Glob`] if a pattern is invalid, and [`Error::Io`] if the
/// tree cannot be read.
pub fn glob_files(root: &Path, includes: &[String], excludes: &[String]) -> Result<Vec<PathBuf>> {
    let mut include_patterns = Vec::new();
    let mut exclude_patterns: Vec<&str> = excludes.iter().map(String::as_str).collect();

    for pattern in includes {
        if let Some(negated) = pattern.strip_prefix('!') {
            exclude_patterns.push(negated);
        } else {
            include_patterns.push(pattern.as_str());
        }
    }

    let include_set = build_set(include_patterns.iter().copied())?;
    let exclude_set = build_set(exclude_patterns.iter().copied())?;
    let prune_patterns: Vec<&str> = exclude_patterns
        .iter()
        .filter_map(|pattern| normalize(pattern).strip_suffix("/**"))
        .collect();
    let prune_set = build_set(prune_patterns.into_iter())?;

    let mut matched = BTreeSet::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();

    for entry in walker.filter_entry(|entry| {
        if !entry.file_type().is_dir() {
            return true;
        }
        let Ok(rel_path) = entry.path().strip_prefix(root) else {
            return true;
        };
        if rel_path.as_os_str().is_empty() {
            return true;
        }
        let pruned = prune_set.is_match(rel_path) || exclude_set.is_match(rel_path);
        if pruned {
            tracing::trace!("Pruning excluded directory {}", rel_path.display());
        }
        !pruned
    }) {
        let entry = entry.map_err(|e| walk_error(root, e))?;
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let Ok(rel_path) = path.strip_prefix(root) else {
            continue;
        };

        if exclude_set.is_match(rel_path) {
            continue;
        }

        if include_set.is_match(rel_path) {
            matched.insert(path.to_path_buf());
        }
    }

    Ok(matched.into_iter().collect())
}

fn build_set<'a>(patterns: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(compile(pattern)?);
    }
    builder.build().map_err(|e| Error::Glob {
        pattern: "<glob set>".to_string(),
        message: e.to_string(),
    })
}

fn compile(pattern: &str) -> Result<Glob> {
    GlobBuilder::new(normalize(pattern))
        .literal_separator(true)
        .build()
        .map_err(|e| Error::Glob {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

/// Strips the leading `./` and trailing `/` that workspace globs often carry.
fn normalize(pattern: &str) -> &str {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    pattern.strip_suffix('/').unwrap_or(pattern)
}

fn walk_error(root: &Path, error: walkdir::Error) -> Error {
    let path = error.path().unwrap_or(root).to_path_buf();
    match error.into_io_error() {
        Some(source) => Error::io(source, path, "walking workspace tree"),
        None => Error::Glob {
            pattern: path.display().to_string(),
            message: "filesystem loop detected".to_string(),
        },
    }
}
