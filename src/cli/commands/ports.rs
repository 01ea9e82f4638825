//! Ports command implementation - list serial ports usable for upload

use anyhow::Result;
use log::info;

use crate::platform;
use crate::serial;

/// Execute the ports command
pub async fn execute_ports_command() -> Result<()> {
    info!("Scanning for upload ports...");

    let ports = serial::available_upload_ports()?;
    if ports.is_empty() {
        println!("⚠️  No upload ports detected");
        return Ok(());
    }

    println!("🔍 Upload Ports:");
    println!("===============\n");
    for port in &ports {
        println!("  {:<12} {}", port, platform::device_path(port));
    }
    println!("\nTotal ports detected: {}", ports.len());

    Ok(())
}
