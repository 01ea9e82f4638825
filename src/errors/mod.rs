//! Error types for QkBrew

pub mod types;

pub use types::*;
