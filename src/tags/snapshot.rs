//! On-disk mirror of the open editor buffers
//!
//! The parser only sees files, so every tagging cycle writes the current text
//! of each open page into a freshly purged directory first.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::errors::{BrewError, Result};
use crate::tags::page::EditorPage;

/// Outcome of one snapshot pass
#[derive(Debug, Default)]
pub struct SnapshotReport {
    pub written: Vec<PathBuf>,
    /// Pages that could not be written, with the reason
    pub failed: Vec<(String, String)>,
}

/// The snapshot directory
#[derive(Debug, Clone)]
pub struct TagSnapshot {
    dir: PathBuf,
}

impl TagSnapshot {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Delete the directory with everything in it and recreate it empty
    pub fn purge(&self) -> Result<()> {
        match std::fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(BrewError::Snapshot(format!(
                    "Unable to purge {}: {}",
                    self.dir.display(),
                    e
                )));
            }
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            BrewError::Snapshot(format!("Unable to create {}: {}", self.dir.display(), e))
        })
    }

    /// Purge, then write one file per page. A page that cannot be written is
    /// logged and skipped; only a failed purge aborts the pass. Of several
    /// pages sharing a file name only the first is written.
    pub fn write<P: EditorPage>(&self, pages: &[P]) -> Result<SnapshotReport> {
        self.purge()?;

        let mut report = SnapshotReport::default();
        let mut taken = HashSet::new();
        for page in pages {
            let file_name = snapshot_file_name(page.name());
            if !taken.insert(file_name) {
                log::warn!(
                    "Skipping {}: another open page is also named {}",
                    page.name(),
                    file_name
                );
                report.failed.push((
                    page.name().to_string(),
                    format!("duplicate file name {}", file_name),
                ));
                continue;
            }

            let dest = self.dir.join(file_name);
            match std::fs::write(&dest, page.text().as_bytes()) {
                Ok(()) => report.written.push(dest),
                Err(e) => {
                    log::warn!("Cannot create file {}: {}", dest.display(), e);
                    report.failed.push((page.name().to_string(), e.to_string()));
                }
            }
        }

        log::debug!(
            "Snapshot of {} page(s) written to {}",
            report.written.len(),
            self.dir.display()
        );
        Ok(report)
    }
}

/// File name used for a page inside the snapshot directory
fn snapshot_file_name(page_name: &str) -> &str {
    Path::new(page_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(page_name)
}
