//! Step file discovery, parsing, and scaffolding.
//!
//! The loader only reads and validates files. Linking them into a chain
//! goes through [`MigrationChain::from_steps`], so ordering and linkage are
//! checked the same way as for steps registered in code.

use crate::chain::MigrationChain;
use crate::error::{CoreError, CoreResult};
use crate::revision::Revision;
use crate::step::{MigrationStep, StepDefinition};
use chrono::NaiveDateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Longest slug kept in a generated file name
const MAX_SLUG_LEN: usize = 40;

/// Whether `path` looks like a step file
fn is_step_file(path: &Path) -> bool {
    path.is_file()
        && matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yml") | Some("yaml")
        )
}

/// Parse and validate a single step file.
pub fn parse_step_file(path: &Path) -> CoreResult<MigrationStep> {
    let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;
    let def: StepDefinition =
        serde_yaml::from_str(&content).map_err(|e| CoreError::StepFileParse {
            path: path.display().to_string(),
            details: e.to_string(),
        })?;
    def.build().map_err(|source| CoreError::InvalidStep {
        path: path.display().to_string(),
        source,
    })
}

/// Keep the step files among `entries`, sorted by file name.
///
/// An entry that cannot be read fails the whole listing.
fn step_paths(
    dir: &Path,
    entries: impl IntoIterator<Item = std::io::Result<PathBuf>>,
) -> CoreResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| CoreError::IoWithPath {
            path: dir.display().to_string(),
            source: e,
        })?;
        if is_step_file(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Read every step file in `dir`, sorted by file name.
pub fn discover_steps(dir: &Path) -> CoreResult<Vec<(PathBuf, MigrationStep)>> {
    if !dir.is_dir() {
        return Err(CoreError::VersionsDirNotFound {
            path: dir.display().to_string(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    let paths = step_paths(dir, entries.map(|entry| entry.map(|e| e.path())))?;

    let mut seen: HashMap<Revision, PathBuf> = HashMap::new();
    let mut steps = Vec::with_capacity(paths.len());
    for path in paths {
        let step = parse_step_file(&path)?;
        if let Some(first) = seen.get(step.revision()) {
            return Err(CoreError::DuplicateStepFile {
                revision: step.revision().to_string(),
                path1: first.display().to_string(),
                path2: path.display().to_string(),
            });
        }
        log::debug!("Discovered step {} in {}", step.revision(), path.display());
        seen.insert(step.revision().clone(), path.clone());
        steps.push((path, step));
    }
    Ok(steps)
}

/// Load every step file in `dir` and link them into a chain.
pub fn load_chain(dir: &Path) -> CoreResult<MigrationChain> {
    let steps = discover_steps(dir)?;
    MigrationChain::from_steps(steps.into_iter().map(|(_, step)| step)).map_err(|source| {
        CoreError::Registration {
            path: dir.display().to_string(),
            source,
        }
    })
}

/// Turn a message into a file-name-safe slug.
pub fn slugify(message: &str) -> String {
    let mut slug = String::with_capacity(message.len());
    for c in message.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') {
            slug.push('_');
        }
    }
    let slug = slug.trim_matches('_');
    let mut slug: String = slug.chars().take(MAX_SLUG_LEN).collect();
    while slug.ends_with('_') {
        slug.pop();
    }
    slug
}

/// File name for a step: `<revision>_<slug>.yml`
pub fn step_file_name(revision: &Revision, message: &str) -> String {
    let slug = slugify(message);
    if slug.is_empty() {
        format!("{revision}.yml")
    } else {
        format!("{revision}_{slug}.yml")
    }
}

/// Write an empty step on top of `down_revision` into `dir`.
///
/// The new step has no edits and an explicit empty downgrade; the author
/// fills both in.
pub fn scaffold_step(
    dir: &Path,
    message: &str,
    down_revision: Option<&Revision>,
    create_date: NaiveDateTime,
) -> CoreResult<(PathBuf, MigrationStep)> {
    let revision = Revision::generate();
    let def = StepDefinition::new(revision.as_str(), down_revision.map(|r| r.as_str()))
        .with_message(message)
        .with_create_date(create_date)
        .with_downgrade(Vec::new());

    let path = dir.join(step_file_name(&revision, message));
    if path.exists() {
        return Err(CoreError::StepFileExists {
            path: path.display().to_string(),
        });
    }

    let yaml = serde_yaml::to_string(&def)?;
    std::fs::create_dir_all(dir).map_err(|e| CoreError::IoWithPath {
        path: dir.display().to_string(),
        source: e,
    })?;
    std::fs::write(&path, yaml).map_err(|e| CoreError::IoWithPath {
        path: path.display().to_string(),
        source: e,
    })?;

    let step = def.build().map_err(|source| CoreError::InvalidStep {
        path: path.display().to_string(),
        source,
    })?;
    Ok((path, step))
}

#[cfg(test)]
#[path = "loader_test.rs"]
mod tests;
