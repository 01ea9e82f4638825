//! Project-related data models

use glob::glob;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::{BrewError, Result};

/// Name of the generated build configuration inside a project directory
pub const MAKEFILE_NAME: &str = "Makefile";

/// Source file patterns picked up when a project is opened from a directory
const SOURCE_PATTERNS: [&str; 2] = ["*.c", "*.h"];

/// A firmware project as seen by the pipelines
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    /// Project directory, kept exactly as given so it can be passed to make verbatim
    pub path: PathBuf,
    pub files: Vec<PathBuf>,
}

impl Project {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, files: Vec<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            files,
        }
    }

    /// Open a project from its directory: the directory name is the project
    /// name and the C sources and headers are its files
    pub fn from_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(BrewError::Config(format!(
                "Project directory does not exist: {}",
                dir.display()
            )));
        }

        let name = dir
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .ok_or_else(|| {
                BrewError::Config(format!("Invalid project directory: {}", dir.display()))
            })?;

        let escaped = glob::Pattern::escape(&dir.to_string_lossy());
        let mut files = Vec::new();
        for pattern in SOURCE_PATTERNS {
            let full = format!("{}/{}", escaped.trim_end_matches('/'), pattern);
            let entries =
                glob(&full).map_err(|e| BrewError::Config(format!("Bad pattern {}: {}", full, e)))?;
            files.extend(entries.flatten().filter(|p| p.is_file()));
        }
        files.sort();

        Ok(Self::new(name, dir, files))
    }

    pub fn makefile_path(&self) -> PathBuf {
        self.path.join(MAKEFILE_NAME)
    }

    /// Firmware image produced by the Verify phase
    pub fn binary_path(&self) -> PathBuf {
        self.path.join("bin").join(format!("{}.bin", self.name))
    }

    pub fn recent_entry(&self) -> RecentProjectEntry {
        RecentProjectEntry {
            name: self.name.clone(),
            path: self.path.clone(),
        }
    }
}

/// Entry of the most-recently-used project list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentProjectEntry {
    pub name: String,
    pub path: PathBuf,
}
