//! Command line argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "qkbrew")]
#[command(about = "QkThings firmware build manager - clean, verify, upload and tag projects")]
pub struct Cli {
    /// Path to the project directory (defaults to current directory)
    #[arg(short = 'p', long = "project", global = true, value_name = "PROJECT_DIR")]
    pub project_dir: Option<PathBuf>,

    /// Configuration file (defaults to the per-user config.toml)
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short = 'v', long = "verbose", global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Decrease logging verbosity (only errors)
    #[arg(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Target board selection shared by the build commands
#[derive(Args, Clone, Debug, Default)]
pub struct TargetArgs {
    /// Target board name (e.g. Arduino)
    #[arg(long)]
    pub target: Option<String>,
    /// Target board variant (e.g. uno)
    #[arg(long)]
    pub variant: Option<String>,
}

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Remove build outputs (make clean)
    Clean {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Compile the project firmware (make app)
    Verify {
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Upload the compiled firmware to the board (make upload)
    Upload {
        /// Serial port to upload through (e.g. ttyACM0, COM3)
        #[arg(long)]
        port: Option<String>,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// List serial ports a board can be uploaded through
    Ports,
    /// Tag the project sources for completion and highlighting
    Tags {
        /// Keep watching the sources and re-tag after each change
        #[arg(short, long)]
        watch: bool,
    },
    /// List the target boards and variants projects can be built for
    Targets,
    /// Show recently opened projects
    Recent,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_upload_arguments() {
        let cli = Cli::try_parse_from([
            "qkbrew",
            "upload",
            "--port",
            "ttyACM0",
            "--target",
            "Arduino",
            "--variant",
            "uno",
            "-p",
            "/p/proj",
        ])
        .unwrap();

        assert_eq!(cli.project_dir, Some(PathBuf::from("/p/proj")));
        match cli.command {
            Commands::Upload { port, target } => {
                assert_eq!(port.as_deref(), Some("ttyACM0"));
                assert_eq!(target.target.as_deref(), Some("Arduino"));
                assert_eq!(target.variant.as_deref(), Some("uno"));
            }
            _ => panic!("expected upload command"),
        }
    }

    #[test]
    fn test_tags_watch_flag() {
        let cli = Cli::try_parse_from(["qkbrew", "-vv", "tags", "--watch"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Commands::Tags { watch: true }));
    }

    #[test]
    fn test_targets_command() {
        let cli = Cli::try_parse_from(["qkbrew", "targets"]).unwrap();
        assert!(matches!(cli.command, Commands::Targets));
    }
}
