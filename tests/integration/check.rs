//! Library-level checks over unit files on disk

use recycle_lint::check_paths;
use recycle_lint::util::config::LintConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Leaks one Parcel in `write()V`
pub const LEAKING_JSON: &str = r#"{
    "name": "com/example/Writer",
    "source_file": "Writer.java",
    "methods": [{
        "name": "write",
        "desc": "()V",
        "max_locals": 2,
        "instructions": [
            {"invoke": {"kind": "static", "owner": "android/os/Parcel", "name": "obtain", "desc": "()Landroid/os/Parcel;"}},
            {"store": 1},
            "return"
        ],
        "lines": [10, 10, 11]
    }]
}"#;

/// Obtains a TypedArray and recycles it
pub const RECYCLED_RON: &str = r#"(
    name: "com/example/View",
    source_file: Some("View.java"),
    methods: [(
        name: "init",
        desc: "()V",
        max_locals: 2,
        instructions: [
            load(0),
            load(0),
            invoke((kind: virtual, owner: "android/content/Context", name: "obtainStyledAttributes", desc: "([I)Landroid/content/res/TypedArray;")),
            store(1),
            load(1),
            invoke((kind: virtual, owner: "android/content/res/TypedArray", name: "recycle", desc: "()V")),
            return,
        ],
    )],
)"#;

pub fn create_test_file(
    dir: &Path,
    name: &str,
    content: &str,
) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_check_leaking_json() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "writer.json", LEAKING_JSON);

    let diagnostics = check_paths(&[file], &LintConfig::default()).unwrap();
    assert_eq!(diagnostics.len(), 1);

    let diagnostic = &diagnostics[0];
    assert_eq!(diagnostic.code, "R0001");
    assert_eq!(diagnostic.resource.as_deref(), Some("Parcel"));
    let location = diagnostic.location.as_ref().unwrap();
    assert_eq!(location.origin(), "Writer.java:10");
    assert_eq!(location.method, "write()V");
}

#[test]
fn test_check_recycled_ron() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "view.ron", RECYCLED_RON);

    let diagnostics = check_paths(&[file], &LintConfig::default()).unwrap();
    assert!(diagnostics.is_empty());
}

#[test]
fn test_check_directory() {
    let temp_dir = TempDir::new().unwrap();
    create_test_file(temp_dir.path(), "a/writer.json", LEAKING_JSON);
    create_test_file(temp_dir.path(), "b/view.ron", RECYCLED_RON);
    create_test_file(temp_dir.path(), "b/notes.txt", "not a unit");

    let diagnostics =
        check_paths(&[temp_dir.path().to_path_buf()], &LintConfig::default()).unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(
        diagnostics[0].location.as_ref().unwrap().class,
        "com/example/Writer"
    );
}

#[test]
fn test_same_file_twice_is_checked_once() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "writer.json", LEAKING_JSON);

    let diagnostics = check_paths(&[file.clone(), file], &LintConfig::default()).unwrap();
    assert_eq!(diagnostics.len(), 1);
}

#[test]
fn test_check_disabled() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "writer.json", LEAKING_JSON);

    let config = LintConfig {
        enabled: false,
        ..LintConfig::default()
    };
    assert!(check_paths(&[file], &config).unwrap().is_empty());
}

#[test]
fn test_check_sequential_matches_parallel() {
    let temp_dir = TempDir::new().unwrap();
    for i in 0..4 {
        create_test_file(temp_dir.path(), &format!("w{}.json", i), LEAKING_JSON);
        create_test_file(temp_dir.path(), &format!("v{}.ron", i), RECYCLED_RON);
    }
    let paths = [temp_dir.path().to_path_buf()];

    let parallel = check_paths(&paths, &LintConfig::default()).unwrap();
    let sequential = check_paths(
        &paths,
        &LintConfig {
            parallel: false,
            ..LintConfig::default()
        },
    )
    .unwrap();
    assert_eq!(parallel.len(), 4);
    assert_eq!(parallel, sequential);
}

#[test]
fn test_unsupported_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "notes.txt", "hello");

    let err = check_paths(&[file], &LintConfig::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("notes.txt"));
}

#[test]
fn test_missing_path_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.json");
    assert!(check_paths(&[missing], &LintConfig::default()).is_err());
}

#[test]
fn test_malformed_unit_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let file = create_test_file(temp_dir.path(), "broken.json", "{\"name\": 1}");

    let err = check_paths(&[file], &LintConfig::default()).unwrap_err();
    assert!(format!("{:#}", err).contains("broken.json"));
}
