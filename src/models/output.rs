//! Classified toolchain output

use serde::{Deserialize, Serialize};

use crate::build::classifier;

/// Display classification of one output line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineClass {
    Error,
    Warning,
    /// Status lines emitted by the pipeline itself
    Info,
    Plain,
}

impl LineClass {
    /// Highlight colour used by the output window, if any
    pub fn color_hex(&self) -> Option<&'static str> {
        match self {
            LineClass::Error => Some("#FD8679"),
            LineClass::Warning => Some("#F5EFB3"),
            LineClass::Info | LineClass::Plain => None,
        }
    }
}

/// One complete line of output together with its classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputLine {
    pub text: String,
    pub class: LineClass,
}

impl OutputLine {
    /// A line read from the toolchain, classified by its content
    pub fn from_toolchain(text: impl Into<String>) -> Self {
        let text = text.into();
        let class = classifier::classify(&text);
        Self { text, class }
    }

    /// A status line emitted by the orchestrator
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            class: LineClass::Info,
        }
    }
}
