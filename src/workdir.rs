//! Locating the directory a pipeline run leaves behind.
//!
//! The pipeline names its output `<domain>_recon_<timestamp>` inside the
//! work root. Matches present before the run are remembered so that, after
//! exit, the directory this run created wins over older ones.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub fn dir_prefix(domain: &str) -> String {
    format!("{domain}_recon_")
}

/// Names of immediate child directories of `root` matching the run pattern.
pub fn matching_dirs(root: &Path, domain: &str) -> Result<BTreeSet<String>> {
    let prefix = dir_prefix(domain);
    let mut out = BTreeSet::new();
    let entries =
        std::fs::read_dir(root).with_context(|| format!("read_dir {}", root.display()))?;
    for entry in entries {
        let entry = entry.with_context(|| format!("read_dir entry in {}", root.display()))?;
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        let Some(suffix) = name.strip_prefix(&prefix) else {
            continue;
        };
        if suffix.is_empty() {
            continue;
        }
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            out.insert(name);
        }
    }
    Ok(out)
}

/// Picks the run directory after the pipeline exited.
///
/// Prefers the greatest name that was not in `before`; falls back to the
/// greatest match overall when the run created nothing new.
pub fn resolve(root: &Path, domain: &str, before: &BTreeSet<String>) -> Result<Option<PathBuf>> {
    let after = matching_dirs(root, domain)?;
    let chosen = after
        .iter()
        .filter(|name| !before.contains(*name))
        .next_back()
        .or_else(|| after.iter().next_back());
    Ok(chosen.map(|name| root.join(name)))
}
