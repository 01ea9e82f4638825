//! Per-phase makefile generation
//!
//! The makefile only exists while a phase runs: it is rendered from a
//! template right before the toolchain starts and deleted once it exits.

use include_dir::{Dir, include_dir};
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::errors::{BrewError, Result};
use crate::models::{BuildTarget, MAKEFILE_NAME};

static TEMPLATES: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/templates");

const EMBEDDED_TEMPLATE: &str = "makefile_template";

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{(embDir|toolchainDir|appDir|target)\}\}").expect("valid placeholder regex")
});

/// Where the makefile template comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    /// Template compiled into the binary
    Embedded,
    /// Template read from disk on every generation
    File(PathBuf),
}

/// Substitute the target parameters into a makefile template.
///
/// Substitution is a single pass, so text inside a substituted value is
/// never expanded again. Everything else is copied verbatim.
pub fn render_template(template: &str, target: &BuildTarget) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match &caps[1] {
            "embDir" => target.emb_dir.to_string_lossy().into_owned(),
            "toolchainDir" => target.toolchain_dir.to_string_lossy().into_owned(),
            "appDir" => target.app_dir.to_string_lossy().into_owned(),
            _ => target.target_id(),
        })
        .into_owned()
}

/// Renders, writes and removes the makefile of a project
#[derive(Debug, Clone)]
pub struct MakefileGenerator {
    source: TemplateSource,
}

impl MakefileGenerator {
    pub fn new(source: TemplateSource) -> Self {
        Self { source }
    }

    pub fn from_template_path(path: Option<&Path>) -> Self {
        match path {
            Some(path) => Self::new(TemplateSource::File(path.to_path_buf())),
            None => Self::new(TemplateSource::Embedded),
        }
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    fn load_template(&self) -> Result<String> {
        match &self.source {
            TemplateSource::Embedded => TEMPLATES
                .get_file(EMBEDDED_TEMPLATE)
                .and_then(|file| file.contents_utf8())
                .map(str::to_string)
                .ok_or_else(|| BrewError::Config("Embedded makefile template missing".to_string())),
            TemplateSource::File(path) => std::fs::read_to_string(path).map_err(|e| {
                BrewError::Config(format!(
                    "Unable to open makefile template {}: {}",
                    path.display(),
                    e
                ))
            }),
        }
    }

    /// Render the makefile text for `target` without touching the project
    pub fn generate(&self, target: &BuildTarget) -> Result<String> {
        let template = self.load_template()?;
        Ok(render_template(&template, target))
    }

    /// Write the makefile into `project_dir`, overwriting any existing one.
    /// A failed write leaves no file behind.
    pub fn write(&self, project_dir: &Path, target: &BuildTarget) -> Result<PathBuf> {
        let text = self.generate(target)?;
        let path = project_dir.join(MAKEFILE_NAME);

        if let Err(e) = std::fs::write(&path, text) {
            let _ = std::fs::remove_file(&path);
            return Err(BrewError::Makefile(format!(
                "Unable to create makefile {}: {}",
                path.display(),
                e
            )));
        }

        log::debug!("Makefile written to {}", path.display());
        Ok(path)
    }

    /// Delete the makefile of `project_dir`; a missing file is not an error
    pub fn remove(&self, project_dir: &Path) -> Result<()> {
        let path = project_dir.join(MAKEFILE_NAME);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::debug!("Makefile removed from {}", project_dir.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BrewError::Makefile(format!(
                "Unable to remove makefile {}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Remove then regenerate the makefile for a new phase
    pub fn refresh(&self, project_dir: &Path, target: &BuildTarget) -> Result<PathBuf> {
        self.remove(project_dir)?;
        self.write(project_dir, target)
    }
}
