//! Recent command implementation

use anyhow::Result;

use crate::config::IdeConfig;
use crate::projects::RecentProjects;

/// Print the recently opened projects, most recent first
pub async fn execute_recent_command(config: &IdeConfig) -> Result<()> {
    let Some(path) = RecentProjects::default_path() else {
        println!("⚠️  No configuration directory available");
        return Ok(());
    };

    let recent = RecentProjects::load(&path, config.max_recent_projects)?;
    if recent.entries().is_empty() {
        println!("No recent projects");
        return Ok(());
    }

    println!("📂 Recent Projects:");
    for (index, entry) in recent.entries().iter().enumerate() {
        println!("  {}. {:<20} {}", index + 1, entry.name, entry.path.display());
    }
    Ok(())
}
