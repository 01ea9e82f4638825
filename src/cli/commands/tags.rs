//! Tags command implementation - one-shot or watching tagger

use anyhow::{Result, anyhow};
use crossterm::style::Stylize;
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::cli::args::Cli;
use crate::config::IdeConfig;
use crate::models::{ElementKind, ElementSet};
use crate::tags::{BufferPage, CtagsParser, TagPipeline};

const WATCH_INTERVAL: Duration = Duration::from_millis(250);

const LISTED_KINDS: [(ElementKind, &str); 5] = [
    (ElementKind::Function, "Functions"),
    (ElementKind::Define, "Defines"),
    (ElementKind::Enum, "Enums"),
    (ElementKind::Typedef, "Types"),
    (ElementKind::Variable, "Variables"),
];

/// Execute the tags command
pub async fn execute_tags_command(cli: &Cli, config: Arc<IdeConfig>, watch: bool) -> Result<()> {
    let project = super::open_project(cli, &config)?;
    let mut pages = load_pages(&project.files);

    let parser = Arc::new(CtagsParser::new(config.ctags_program()));
    let mut tags = TagPipeline::new(&config, parser);
    if tags.load_library(&config.library_dir()).await {
        info!("{} library element(s) available", tags.library().len());
    }
    for page in pages.iter_mut() {
        tags.setup_page(page);
    }

    if !tags.run_cycle(&mut pages).await {
        return Err(anyhow!("Tagging {} failed", project.name));
    }
    print_elements(tags.elements());

    if !watch {
        return Ok(());
    }

    println!(
        "👀 Watching {} file(s), press Ctrl+C to stop",
        project.files.len()
    );
    tags.add_listener(|elements: &ElementSet| {
        println!("{}", format!("🏷️  {} element(s)", elements.len()).green());
    });

    let mut stamps = modification_times(&project.files);
    let mut ticker = tokio::time::interval(WATCH_INTERVAL);

    loop {
        let due = tags.debouncer().sleep_until_due();
        tokio::select! {
            _ = ticker.tick() => {
                let current = modification_times(&project.files);
                if current != stamps {
                    reload_changed(&project.files, &stamps, &current, &mut pages);
                    stamps = current;
                    tags.key_pressed();
                }
                tags.poll_timer(&pages);
            }
            _ = due => {
                tags.poll_timer(&pages);
            }
            Some(outcome) = tags.next_outcome() => {
                tags.apply(outcome, &mut pages);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping tag watcher after {} cycle(s)", tags.cycles());
                break;
            }
        }
    }

    Ok(())
}

fn load_pages(files: &[PathBuf]) -> Vec<BufferPage> {
    files
        .iter()
        .map(|file| BufferPage::new(page_name(file), read_source(file)))
        .collect()
}

fn page_name(file: &std::path::Path) -> String {
    file.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.display().to_string())
}

fn read_source(file: &std::path::Path) -> String {
    std::fs::read_to_string(file).unwrap_or_else(|e| {
        warn!("Failed to read {}: {}", file.display(), e);
        String::new()
    })
}

fn modification_times(files: &[PathBuf]) -> Vec<Option<SystemTime>> {
    files
        .iter()
        .map(|file| std::fs::metadata(file).and_then(|m| m.modified()).ok())
        .collect()
}

fn reload_changed(
    files: &[PathBuf],
    old: &[Option<SystemTime>],
    new: &[Option<SystemTime>],
    pages: &mut [BufferPage],
) {
    for (index, file) in files.iter().enumerate() {
        if old.get(index) != new.get(index) {
            debug!("{} changed", file.display());
            if let Some(page) = pages.get_mut(index) {
                page.set_text(read_source(file));
            }
        }
    }
}

fn print_elements(elements: &ElementSet) {
    println!("🏷️  {} element(s)", elements.len());
    for (kind, label) in LISTED_KINDS {
        let mut of_kind: Vec<_> = elements.of_kind(kind).collect();
        if of_kind.is_empty() {
            continue;
        }
        of_kind.sort_by(|a, b| a.text.cmp(&b.text));

        println!("\n{}", label.bold());
        for element in of_kind {
            let scope = if element.is_local { " (local)" } else { "" };
            println!("  {:<28} {}{}", element.text, element.file_name, scope);
        }
    }
}
