//! Boards the bundled firmware library can be built for
//!
//! Targets are discovered from the embedded resources, one directory per
//! board under `<emb_dir>/target/` with one subdirectory per variant.

use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::errors::{BrewError, Result};
use crate::models::BuildTarget;

/// Directory under the embedded resources holding the board definitions
pub const TARGET_DIR: &str = "target";

/// A board and the variants it is available in
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupportedTarget {
    pub name: String,
    pub variants: Vec<String>,
}

impl SupportedTarget {
    pub fn has_variant(&self, variant: &str) -> bool {
        self.variants.iter().any(|v| v.eq_ignore_ascii_case(variant))
    }
}

pub fn targets_root(emb_dir: &Path) -> PathBuf {
    emb_dir.join(TARGET_DIR)
}

/// List the supported targets, sorted by name. Targets without any variant
/// directory are skipped.
pub fn supported_targets(emb_dir: &Path) -> Result<Vec<SupportedTarget>> {
    let root = targets_root(emb_dir);
    let mut targets = Vec::new();

    for name in sorted_subdirs(&root)? {
        let variants = sorted_subdirs(&root.join(&name))?;
        if variants.is_empty() {
            log::debug!("Skipping target {} without variants", name);
            continue;
        }
        targets.push(SupportedTarget { name, variants });
    }

    log::debug!("Found {} supported target(s) in {}", targets.len(), root.display());
    Ok(targets)
}

/// Check that `target` names a listed board and variant, ignoring case
pub fn check_target(targets: &[SupportedTarget], target: &BuildTarget) -> Result<()> {
    let Some(board) = targets
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(&target.target_name))
    else {
        return Err(BrewError::Target(format!(
            "Unsupported target {}",
            target.target_name
        )));
    };

    if !board.has_variant(&target.target_variant) {
        return Err(BrewError::Target(format!(
            "{} has no variant {} (available: {})",
            board.name,
            target.target_variant,
            board.variants.join(", ")
        )));
    }
    Ok(())
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<String>> {
    let entries = std::fs::read_dir(dir).map_err(|e| {
        BrewError::Target(format!("Failed to read {}: {}", dir.display(), e))
    })?;

    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with('.') {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
