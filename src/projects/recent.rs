//! Most-recently-used project list

use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::models::RecentProjectEntry;

const RECENT_FILE: &str = "recent_projects.json";

/// Bounded MRU list, most recent first, without duplicates
#[derive(Debug, Clone)]
pub struct RecentProjects {
    entries: Vec<RecentProjectEntry>,
    max: usize,
}

impl RecentProjects {
    pub fn new(max: usize) -> Self {
        Self {
            entries: Vec::new(),
            max,
        }
    }

    pub fn entries(&self) -> &[RecentProjectEntry] {
        &self.entries
    }

    pub fn max(&self) -> usize {
        self.max
    }

    /// Move `entry` to the front, inserting it if new
    pub fn touch(&mut self, entry: RecentProjectEntry) {
        self.entries.retain(|e| e != &entry);
        self.entries.insert(0, entry);
        self.entries.truncate(self.max);
    }

    /// Default location of the persisted list
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qkbrew").join(RECENT_FILE))
    }

    /// Load the list, dropping projects whose directory no longer exists.
    /// A missing file yields an empty list.
    pub fn load(path: &Path, max: usize) -> Result<Self> {
        let mut recent = Self::new(max);
        if !path.exists() {
            return Ok(recent);
        }

        let text = std::fs::read_to_string(path)?;
        let entries: Vec<RecentProjectEntry> = serde_json::from_str(&text)?;
        recent.entries = entries
            .into_iter()
            .filter(|entry| entry.path.is_dir())
            .take(max)
            .collect();

        log::debug!(
            "Loaded {} recent project(s) from {}",
            recent.entries.len(),
            path.display()
        );
        Ok(recent)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}
