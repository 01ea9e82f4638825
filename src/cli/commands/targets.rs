//! Targets command implementation - list the boards projects can be built for

use anyhow::Result;

use crate::build;
use crate::config::IdeConfig;

/// Print every supported target with its variants
pub async fn execute_targets_command(config: &IdeConfig) -> Result<()> {
    let targets = build::supported_targets(&config.emb_dir())?;
    if targets.is_empty() {
        println!("⚠️  No targets found in {}", config.emb_dir().display());
        return Ok(());
    }

    println!("🎯 Supported Targets:");
    println!("====================\n");
    for target in &targets {
        let marker = if target.name.eq_ignore_ascii_case(&config.build.target_name) {
            "*"
        } else {
            " "
        };
        println!("{} {:<12} {}", marker, target.name, target.variants.join(", "));
    }
    Ok(())
}
