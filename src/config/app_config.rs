//! Application configuration management
//!
//! [`IdeConfig`] is loaded once at startup and then shared read-only as an
//! `Arc<IdeConfig>` by both pipelines.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::errors::{BrewError, Result};
use crate::platform;

/// Embedded firmware resources, relative to the application directory
pub const EMB_DIR: &str = "resources/embedded";
/// Firmware library headers, relative to the embedded resources
pub const LIBRARY_INCLUDE_DIR: &str = "qkprogram/include";
/// Toolchain location, relative to the application directory
pub const TOOLCHAIN_DIR: &str = "resources/embedded/toolchain";
/// Bundled ctags executable, relative to the application directory
pub const CTAGS_EXE: &str = "resources/tools/ctags/ctags";
/// Tag snapshot directory, relative to the application directory
pub const TAGS_DIR: &str = "temp/tags";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdeConfig {
    /// Root directory holding the bundled resources
    pub app_dir: PathBuf,
    /// Build configuration
    pub build: BuildConfig,
    /// Code tagging configuration
    pub tags: TagsConfig,
    /// Serial connection configuration
    pub serial: SerialConfig,
    /// Upper bound of the recent projects list
    pub max_recent_projects: usize,
}

/// Build-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Explicit make executable, overrides the platform default
    pub make_program: Option<PathBuf>,
    /// Makefile template file, overrides the embedded template
    pub makefile_template: Option<PathBuf>,
    /// Default target board name
    pub target_name: String,
    /// Default target board variant
    pub target_variant: String,
}

/// Tag pipeline configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Quiescence window after the last keystroke, in milliseconds
    pub debounce_ms: u64,
    /// Snapshot directory, defaults to `<app_dir>/temp/tags`
    pub tags_dir: Option<PathBuf>,
    /// Explicit ctags executable
    pub ctags_program: Option<PathBuf>,
}

/// Serial connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Bare port identifier (e.g. ttyACM0, COM3)
    pub port: Option<String>,
    /// Baud rate of the device connection
    pub baud_rate: u32,
    /// Reopen the connection after an upload if it was open before
    pub reconnect_after_upload: bool,
}

impl Default for IdeConfig {
    fn default() -> Self {
        Self {
            app_dir: default_app_dir(),
            build: BuildConfig::default(),
            tags: TagsConfig::default(),
            serial: SerialConfig::default(),
            max_recent_projects: 5,
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            make_program: None,
            makefile_template: None,
            target_name: "Arduino".to_string(),
            target_variant: "uno".to_string(),
        }
    }
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 500,
            tags_dir: None,
            ctags_program: None,
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 38400,
            reconnect_after_upload: false,
        }
    }
}

fn default_app_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

impl IdeConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load the configuration from `path`, or from the per-user config file
    /// when no path is given. Falls back to defaults if neither exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(explicit) => {
                if !explicit.exists() {
                    return Err(BrewError::Config(format!(
                        "Configuration file not found: {}",
                        explicit.display()
                    )));
                }
                explicit.to_path_buf()
            }
            None => match Self::default_path() {
                Some(p) if p.exists() => p,
                _ => {
                    log::debug!("No configuration file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        log::debug!("Loading configuration from {}", path.display());
        let text = std::fs::read_to_string(&path).map_err(|e| {
            BrewError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Per-user configuration file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("qkbrew").join("config.toml"))
    }

    pub fn emb_dir(&self) -> PathBuf {
        self.app_dir.join(EMB_DIR)
    }

    /// Headers of the bundled firmware library, tagged once at startup
    pub fn library_dir(&self) -> PathBuf {
        self.emb_dir().join(LIBRARY_INCLUDE_DIR)
    }

    pub fn toolchain_dir(&self) -> PathBuf {
        self.app_dir.join(TOOLCHAIN_DIR)
    }

    pub fn tags_dir(&self) -> PathBuf {
        self.tags
            .tags_dir
            .clone()
            .unwrap_or_else(|| self.app_dir.join(TAGS_DIR))
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.tags.debounce_ms)
    }

    /// The make executable used for every build phase
    pub fn make_program(&self) -> PathBuf {
        self.build
            .make_program
            .clone()
            .unwrap_or_else(|| platform::make_program(&self.app_dir))
    }

    /// The ctags executable: explicit setting, bundled copy, then `PATH`
    pub fn ctags_program(&self) -> PathBuf {
        if let Some(program) = &self.tags.ctags_program {
            return program.clone();
        }
        let bundled = self.app_dir.join(CTAGS_EXE);
        if bundled.exists() {
            return bundled;
        }
        which::which("ctags").unwrap_or(bundled)
    }
}
