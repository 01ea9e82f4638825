//! Logging initialization for QkBrew

use anyhow::Result;
use env_logger::{Builder, Target};
use log::LevelFilter;
use std::io::Write;
use std::path::PathBuf;

/// Log level for the `-v` count and `-q` flag
pub fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    match (quiet, verbose) {
        (true, _) => LevelFilter::Error,
        (false, 0) => LevelFilter::Info,
        (false, 1) => LevelFilter::Debug,
        (false, _) => LevelFilter::Trace,
    }
}

/// Initialize stderr logging for CLI commands
pub fn init_cli_logging(verbose: u8, quiet: bool) -> Result<()> {
    let level = level_for(verbose, quiet);

    Builder::from_default_env()
        .target(Target::Stderr)
        .filter_level(level)
        .format_timestamp_secs()
        .format_module_path(false)
        .try_init()?;

    #[cfg(debug_assertions)]
    log_panics::init();

    log::debug!("QkBrew logging initialized with level: {:?}", level);
    Ok(())
}

/// Location of the log file used by long-running commands
pub fn log_file_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("qkbrew")
        .join("logs")
        .join("qkbrew.log")
}

/// Initialize file logging so the terminal stays free for command output
pub fn init_file_logging(verbose: u8, quiet: bool) -> Result<PathBuf> {
    use std::fs::OpenOptions;

    let level = level_for(verbose, quiet);
    let log_file = log_file_path();
    if let Some(dir) = log_file.parent() {
        std::fs::create_dir_all(dir)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)?;

    Builder::from_default_env()
        .target(Target::Pipe(Box::new(file)))
        .filter_level(level)
        .format_timestamp_secs()
        .format(|buf, record| {
            writeln!(
                buf,
                "{} [{}] {}: {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        })
        .try_init()?;

    log_panics::init();

    log::debug!("QkBrew file logging initialized with level: {:?}", level);
    Ok(log_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_selection() {
        assert_eq!(level_for(0, true), LevelFilter::Error);
        assert_eq!(level_for(3, true), LevelFilter::Error);
        assert_eq!(level_for(0, false), LevelFilter::Info);
        assert_eq!(level_for(1, false), LevelFilter::Debug);
        assert_eq!(level_for(2, false), LevelFilter::Trace);
    }

    #[test]
    fn test_log_file_path_is_under_qkbrew() {
        let path = log_file_path();
        assert!(path.ends_with("qkbrew/logs/qkbrew.log"));
    }
}
