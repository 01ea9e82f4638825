//! Utility functions and helpers used throughout QkBrew

pub mod logging;
