//! Clean, verify and upload command implementations

use anyhow::{Result, anyhow};
use crossterm::style::{Color, Stylize};
use log::{info, warn};
use std::sync::Arc;

use crate::build::{self, BuildPipeline};
use crate::cli::args::{Cli, TargetArgs};
use crate::config::IdeConfig;
use crate::models::{BuildEvent, BuildPhase, BuildTarget, LineClass};
use crate::serial::{self, SerialPortConnection};

/// Run a single toolchain phase for the selected project
pub async fn execute_phase_command(
    cli: &Cli,
    config: Arc<IdeConfig>,
    phase: BuildPhase,
    target_args: &TargetArgs,
    port: Option<String>,
) -> Result<()> {
    let project = super::open_project(cli, &config)?;

    let target = BuildTarget::new(
        &config,
        &project.path,
        target_args
            .target
            .as_deref()
            .unwrap_or(&config.build.target_name),
        target_args
            .variant
            .as_deref()
            .unwrap_or(&config.build.target_variant),
    );
    info!("Target: {}", target.target_id());
    validate_target(&config, &target)?;

    let port = match phase {
        BuildPhase::Upload => resolve_upload_port(port, &config)?,
        _ => port.or_else(|| config.serial.port.clone()).unwrap_or_default(),
    };

    let connection = SerialPortConnection::new(port.as_str(), config.serial.baud_rate);
    let mut pipeline = BuildPipeline::with_make(config.clone(), connection);
    pipeline.add_listener(print_build_event);

    let started = match phase {
        BuildPhase::Clean => pipeline.request_clean(&project, &target).await,
        BuildPhase::Verify => pipeline.request_verify(&project, &target).await,
        BuildPhase::Upload => pipeline.request_upload(&project, &target, &port).await,
    };

    if started {
        tokio::select! {
            _ = pipeline.run_until_idle() => {}
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted, stopping {}", phase.name().to_lowercase());
                pipeline.shutdown().await;
            }
        }
    }

    match pipeline.last_report() {
        Some(report) if report.success() => {
            println!(
                "✅ {} ({:.1}s)",
                report.status_text(),
                report.duration().num_milliseconds() as f64 / 1000.0
            );
            Ok(())
        }
        Some(report) => Err(anyhow!(report.status_text())),
        None => Err(anyhow!("{} could not be started", phase.name())),
    }
}

/// Upload port from the command line, the config, or the first detected board
fn resolve_upload_port(port: Option<String>, config: &IdeConfig) -> Result<String> {
    if let Some(port) = port.or_else(|| config.serial.port.clone()) {
        return Ok(port);
    }

    let ports = serial::available_upload_ports()?;
    match ports.into_iter().next() {
        Some(port) => {
            info!("Using detected upload port {}", port);
            Ok(port)
        }
        None => Err(anyhow!(
            "No upload port detected, connect a board or pass --port"
        )),
    }
}

/// Refuse targets the embedded resources do not list. Without a target
/// directory there is nothing to check against and make decides.
fn validate_target(config: &IdeConfig, target: &BuildTarget) -> Result<()> {
    let emb_dir = config.emb_dir();
    if !build::targets::targets_root(&emb_dir).is_dir() {
        warn!(
            "No target definitions under {}, skipping target check",
            emb_dir.display()
        );
        return Ok(());
    }

    let targets = build::supported_targets(&emb_dir)?;
    build::check_target(&targets, target).map_err(|e| {
        let available: Vec<String> = targets
            .iter()
            .map(|t| format!("{} ({})", t.name, t.variants.join(", ")))
            .collect();
        anyhow!("{}. Supported targets: {}", e, available.join("; "))
    })
}

/// `#RRGGBB` to a terminal colour
fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

fn print_build_event(event: &BuildEvent) {
    match event {
        BuildEvent::PhaseStarted { command, .. } => {
            println!("{}", format!("$ {}", command).dark_grey());
        }
        BuildEvent::Output(line) => {
            match (line.class, line.class.color_hex().and_then(hex_color)) {
                (_, Some(color)) => println!("{}", line.text.as_str().with(color)),
                (LineClass::Info, None) => println!("{}", line.text.as_str().cyan().bold()),
                _ => println!("{}", line.text),
            }
        }
        BuildEvent::PhaseFinished(report) => {
            log::debug!(
                "{} finished with exit code {:?}",
                report.phase.name(),
                report.exit_code
            );
        }
    }
}
