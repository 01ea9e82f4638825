//! CLI command implementations

pub mod build;
pub mod ports;
pub mod recent;
pub mod tags;
pub mod targets;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use crate::cli::args::{Cli, Commands};
use crate::config::IdeConfig;
use crate::models::{BuildPhase, Project};
use crate::projects::RecentProjects;

/// Execute a CLI command
pub async fn execute_command(command: Commands, cli: &Cli, config: Arc<IdeConfig>) -> Result<()> {
    match command {
        Commands::Clean { target } => {
            build::execute_phase_command(cli, config, BuildPhase::Clean, &target, None).await
        }
        Commands::Verify { target } => {
            build::execute_phase_command(cli, config, BuildPhase::Verify, &target, None).await
        }
        Commands::Upload { port, target } => {
            build::execute_phase_command(cli, config, BuildPhase::Upload, &target, port).await
        }
        Commands::Ports => ports::execute_ports_command().await,
        Commands::Tags { watch } => tags::execute_tags_command(cli, config, watch).await,
        Commands::Targets => targets::execute_targets_command(&config).await,
        Commands::Recent => recent::execute_recent_command(&config).await,
    }
}

/// Open the project selected on the command line and record it as recent
pub(crate) fn open_project(cli: &Cli, config: &IdeConfig) -> Result<Project> {
    let dir = match &cli.project_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let project = Project::from_dir(&dir)
        .with_context(|| format!("Failed to open project at {}", dir.display()))?;

    log::info!(
        "Opened project {} ({} source file(s))",
        project.name,
        project.files.len()
    );

    if let Some(path) = RecentProjects::default_path() {
        remember_project(&project, &path, config.max_recent_projects);
    }
    Ok(project)
}

fn remember_project(project: &Project, path: &Path, max: usize) {
    let mut recent = match RecentProjects::load(path, max) {
        Ok(recent) => recent,
        Err(e) => {
            log::warn!("Ignoring unreadable recent project list: {}", e);
            RecentProjects::new(max)
        }
    };
    recent.touch(project.recent_entry());
    if let Err(e) = recent.save(path) {
        log::warn!("Failed to save recent project list: {}", e);
    }
}
