//! Data models and types used throughout QkBrew

pub mod build;
pub mod element;
pub mod events;
pub mod output;
pub mod project;

// Re-export commonly used types
pub use build::*;
pub use element::*;
pub use events::*;
pub use output::*;
pub use project::*;
