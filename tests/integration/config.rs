//! Configuration files driving the check

use crate::check::{create_test_file, LEAKING_JSON};
use recycle_lint::check_paths;
use recycle_lint::util::config::{
    find_project_config, load_config_file, write_default_config, LintConfig, PROJECT_CONFIG_FILE,
};
use recycle_lint::util::diagnostic::Severity;
use tempfile::TempDir;

const BITMAP_CONFIG: &str = r#"
[lint]
severity = "error"
disabled_kinds = ["Parcel"]

[[lint.extra_kinds]]
name = "Bitmap"
owner = "android/graphics/Bitmap"
obtain = [{ owner = "android/graphics/Bitmap", name = "createBitmap" }]
"#;

const BITMAP_JSON: &str = r#"{
    "name": "com/example/Painter",
    "methods": [{
        "name": "paint",
        "desc": "()V",
        "max_locals": 2,
        "instructions": [
            {"invoke": {"kind": "static", "owner": "android/graphics/Bitmap", "name": "createBitmap", "desc": "()Landroid/graphics/Bitmap;"}},
            {"store": 1},
            "return"
        ]
    }]
}"#;

fn config_from(text: &str) -> LintConfig {
    let temp_dir = TempDir::new().unwrap();
    let path = create_test_file(temp_dir.path(), PROJECT_CONFIG_FILE, text);
    let file = load_config_file(&path).unwrap();

    let mut config = LintConfig::default();
    config.apply(&file.lint);
    config
}

#[test]
fn test_extra_kind_from_config() {
    let config = config_from(BITMAP_CONFIG);
    assert_eq!(config.severity, Severity::Error);

    let temp_dir = TempDir::new().unwrap();
    create_test_file(temp_dir.path(), "painter.json", BITMAP_JSON);
    create_test_file(temp_dir.path(), "writer.json", LEAKING_JSON);

    let diagnostics = check_paths(&[temp_dir.path().to_path_buf()], &config).unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].resource.as_deref(), Some("Bitmap"));
    assert_eq!(diagnostics[0].severity, Severity::Error);
    assert_eq!(
        diagnostics[0].message,
        "This Bitmap should be recycled after use with #recycle()"
    );
}

#[test]
fn test_rescan_switch_from_config() {
    let tracker_json = LEAKING_JSON
        .replace("android/os/Parcel", "android/view/VelocityTracker");
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "tracker.json", &tracker_json);

    let enabled = check_paths(&[file.clone()], &LintConfig::default()).unwrap();
    assert_eq!(enabled.len(), 1);

    let config = config_from("[lint]\nrescan = false\n");
    assert!(check_paths(&[file], &config).unwrap().is_empty());
}

#[test]
fn test_project_config_search() {
    let temp_dir = TempDir::new().unwrap();
    let nested = temp_dir.path().join("a/b/c");
    std::fs::create_dir_all(&nested).unwrap();
    assert_eq!(find_project_config(&nested), None);

    let config = create_test_file(temp_dir.path(), "a/recycle-lint.toml", "[lint]\n");
    assert_eq!(find_project_config(&nested), Some(config));
}

#[test]
fn test_default_config_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join(PROJECT_CONFIG_FILE);
    write_default_config(&path).unwrap();

    let file = load_config_file(&path).unwrap();
    let mut config = LintConfig::default();
    config.apply(&file.lint);
    assert_eq!(config, LintConfig::default());
}
