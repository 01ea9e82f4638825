//! Core unit tests for qkbrew functionality
//!
//! Configuration loading, project discovery, the recent project list and
//! makefile generation, exercised through the public API.

use qkbrew::build::{MakefileGenerator, TemplateSource};
use qkbrew::config::IdeConfig;
use qkbrew::errors::BrewError;
use qkbrew::models::{BuildTarget, Project};
use qkbrew::projects::RecentProjects;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Helper function to create a temporary firmware project
fn create_test_project(dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    fs::write(
        dir.join("blink.c"),
        "#include \"board.h\"\n\nvoid setup(void)\n{\n    led_init(LED_PIN);\n}\n",
    )?;
    fs::write(dir.join("board.h"), "#define LED_PIN 13\n")?;
    fs::write(dir.join("README.md"), "# blink\n")?;
    Ok(())
}

#[test]
fn test_config_from_full_toml() {
    let config = IdeConfig::from_toml_str(
        r#"
app_dir = "/opt/qkide"
max_recent_projects = 3

[build]
target_name = "QkThings"
target_variant = "qk"

[tags]
debounce_ms = 750
ctags_program = "/usr/bin/ctags"

[serial]
port = "ttyUSB0"
baud_rate = 115200
reconnect_after_upload = true
"#,
    )
    .unwrap();

    assert_eq!(config.max_recent_projects, 3);
    assert_eq!(config.build.target_name, "QkThings");
    assert_eq!(config.debounce_window().as_millis(), 750);
    assert_eq!(config.ctags_program(), Path::new("/usr/bin/ctags"));
    assert_eq!(config.serial.port.as_deref(), Some("ttyUSB0"));
    assert!(config.serial.reconnect_after_upload);
    assert_eq!(config.tags_dir(), Path::new("/opt/qkide/temp/tags"));
}

#[test]
fn test_config_partial_toml_keeps_defaults() {
    let config = IdeConfig::from_toml_str("[serial]\nport = \"COM3\"\n").unwrap();

    assert_eq!(config.serial.baud_rate, 38400);
    assert_eq!(config.build.target_name, "Arduino");
    assert_eq!(config.build.target_variant, "uno");
    assert_eq!(config.tags.debounce_ms, 500);
    assert_eq!(config.max_recent_projects, 5);
}

#[test]
fn test_config_invalid_toml_is_config_error() {
    let result = IdeConfig::from_toml_str("[build\ntarget_name = ");
    assert!(matches!(result, Err(BrewError::Config(_))));
}

#[test]
fn test_config_load_explicit_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("qkbrew.toml");
    fs::write(&path, "[tags]\ndebounce_ms = 100\n").unwrap();

    let config = IdeConfig::load(Some(&path)).unwrap();
    assert_eq!(config.tags.debounce_ms, 100);

    let missing = IdeConfig::load(Some(&temp_dir.path().join("missing.toml")));
    assert!(matches!(missing, Err(BrewError::Config(_))));
}

#[test]
fn test_project_from_dir_collects_sources() {
    let temp_dir = TempDir::new().unwrap();
    let project_dir = temp_dir.path().join("blink");
    create_test_project(&project_dir).unwrap();

    let project = Project::from_dir(&project_dir).unwrap();
    assert_eq!(project.name, "blink");

    let names: Vec<String> = project
        .files
        .iter()
        .map(|f| f.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["blink.c", "board.h"]);
    assert!(project.binary_path().ends_with("bin/blink.bin"));
}

#[test]
fn test_project_from_missing_dir_fails() {
    let temp_dir = TempDir::new().unwrap();
    assert!(Project::from_dir(&temp_dir.path().join("nope")).is_err());
}

#[test]
fn test_recent_projects_round_trip_drops_missing() {
    let temp_dir = TempDir::new().unwrap();
    let list_path = temp_dir.path().join("config").join("recent_projects.json");

    let mut recent = RecentProjects::new(5);
    for name in ["alpha", "beta", "gamma"] {
        let dir = temp_dir.path().join(name);
        create_test_project(&dir).unwrap();
        recent.touch(Project::from_dir(&dir).unwrap().recent_entry());
    }
    recent.save(&list_path).unwrap();

    fs::remove_dir_all(temp_dir.path().join("beta")).unwrap();

    let loaded = RecentProjects::load(&list_path, 5).unwrap();
    let names: Vec<&str> = loaded.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["gamma", "alpha"]);
}

#[test]
fn test_recent_projects_bounded_and_deduplicated() {
    let temp_dir = TempDir::new().unwrap();
    let mut recent = RecentProjects::new(2);
    let dirs: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| {
            let dir = temp_dir.path().join(name);
            create_test_project(&dir).unwrap();
            Project::from_dir(&dir).unwrap()
        })
        .collect();

    recent.touch(dirs[0].recent_entry());
    recent.touch(dirs[1].recent_entry());
    recent.touch(dirs[0].recent_entry());
    recent.touch(dirs[2].recent_entry());

    let names: Vec<&str> = recent.entries().iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["c", "a"]);
}

#[test]
fn test_makefile_written_from_template_file() {
    let temp_dir = TempDir::new().unwrap();
    let template = temp_dir.path().join("makefile_template");
    fs::write(
        &template,
        "EMB_DIR = {{embDir}}\nAPP = {{appDir}}\nTARGET = {{target}}\n",
    )
    .unwrap();

    let project_dir = temp_dir.path().join("blink");
    create_test_project(&project_dir).unwrap();

    let mut config = IdeConfig::default();
    config.app_dir = temp_dir.path().join("qkide");
    let target = BuildTarget::new(&config, &project_dir, "Arduino", "Uno");

    let generator = MakefileGenerator::new(TemplateSource::File(template));
    let path = generator.refresh(&project_dir, &target).unwrap();
    let text = fs::read_to_string(&path).unwrap();

    assert!(text.contains("TARGET = arduino.uno"));
    assert!(text.contains(&format!("APP = {}", project_dir.display())));
    assert!(!text.contains("{{"));

    generator.remove(&project_dir).unwrap();
    assert!(!path.exists());
    // Removing twice is fine
    generator.remove(&project_dir).unwrap();
}
