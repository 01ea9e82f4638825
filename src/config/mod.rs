//! Configuration management for QkBrew

pub mod app_config;

pub use app_config::*;
