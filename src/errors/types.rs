//! Custom error types for QkBrew

use std::fmt;

use crate::models::BuildPhase;

/// Main error type for QkBrew operations
#[derive(Debug)]
pub enum BrewError {
    /// Configuration related errors (unreadable config or template)
    Config(String),
    /// Makefile rendering or writing errors
    Makefile(String),
    /// A process handle was started while a previous invocation was still running
    AlreadyRunning(BuildPhase),
    /// Unknown or unlisted target board
    Target(String),
    /// Toolchain process could not be launched
    Process(String),
    /// Serial connection errors
    Serial(String),
    /// Tag snapshot directory errors
    Snapshot(String),
    /// Tag parser errors
    Parser(String),
    /// General I/O errors
    Io(std::io::Error),
    /// Serialization errors
    Serialization(String),
}

impl fmt::Display for BrewError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BrewError::Config(msg) => write!(f, "Configuration error: {}", msg),
            BrewError::Makefile(msg) => write!(f, "Makefile error: {}", msg),
            BrewError::AlreadyRunning(phase) => {
                write!(f, "{} process is already running", phase.name())
            }
            BrewError::Target(msg) => write!(f, "Target error: {}", msg),
            BrewError::Process(msg) => write!(f, "Process error: {}", msg),
            BrewError::Serial(msg) => write!(f, "Serial error: {}", msg),
            BrewError::Snapshot(msg) => write!(f, "Snapshot error: {}", msg),
            BrewError::Parser(msg) => write!(f, "Parser error: {}", msg),
            BrewError::Io(err) => write!(f, "I/O error: {}", err),
            BrewError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for BrewError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BrewError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BrewError {
    fn from(err: std::io::Error) -> Self {
        BrewError::Io(err)
    }
}

impl From<serde_json::Error> for BrewError {
    fn from(err: serde_json::Error) -> Self {
        BrewError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for BrewError {
    fn from(err: toml::de::Error) -> Self {
        BrewError::Config(err.to_string())
    }
}

impl From<serialport::Error> for BrewError {
    fn from(err: serialport::Error) -> Self {
        BrewError::Serial(err.to_string())
    }
}

/// Result type alias for QkBrew operations
pub type Result<T> = std::result::Result<T, BrewError>;
