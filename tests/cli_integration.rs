//! CLI integration tests for polyform
//!
//! Each test builds a small library project in a temp directory and runs
//! the binary against it. Fast mode keeps the external minifier and
//! archiver out of the picture.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the polyform binary
fn polyform_cmd(project: &Path) -> assert_cmd::Command {
    let mut cmd = assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("polyform"));
    cmd.arg("-C")
        .arg(project)
        .env_remove("POLYFORM_WATCH")
        .env_remove("POLYFORM_FAST")
        .env_remove("POLYFORM_VISIBLE");
    cmd
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

/// Create a two-module library project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "package.json",
        r#"{
  "name": "Hilo",
  "version": "1.1.0",
  "sources": {
    "dir": "src",
    "files": ["core/Hilo.js", "core/Class.js", "view/*.js"]
  }
}
"#,
    );
    write(
        root,
        "src/core/Hilo.js",
        "/**\n * @module hilo/core/Hilo\n */\nvar Hilo = {version:'{{$version}}'};\n",
    );
    write(
        root,
        "src/core/Class.js",
        "/**\n * @module hilo/core/Class\n * @requires hilo/core/Hilo\n */\nvar Class = {};\n",
    );
    write(
        root,
        "src/view/Bitmap.js",
        "/**\n * @module hilo/view/Bitmap\n * @requires hilo/core/Hilo\n * @requires hilo/core/Class\n */\nvar Bitmap = Class.create({});\n",
    );
    dir
}

// =============================================================================
// Build Tests
// =============================================================================

#[test]
fn test_fast_standalone_build() {
    let dir = setup_project();

    polyform_cmd(dir.path())
        .args(["--fast", "standalone"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Starting 'standalone-clean'..."))
        .stdout(predicate::str::contains("Finished 'standalone' after"));

    let out = dir.path().join("build/standalone");
    let bundle = fs::read_to_string(out.join("hilo-standalone.js")).unwrap();
    assert!(bundle.starts_with("/**\n * Hilo 1.1.0 for standalone\n"));
    assert!(bundle.contains("version:'1.1.0'"));
    assert!(bundle.contains("var Class = ns.Class;"));

    let hilo_at = bundle.find("var Hilo = {").unwrap();
    let bitmap_at = bundle.find("var Bitmap =").unwrap();
    assert!(hilo_at < bitmap_at);

    assert!(out.join("hilo/view/Bitmap.js").is_file());
    assert!(!out.join("hilo-standalone.min.js").exists());
    assert!(!out.join("hilo-standalone.zip").exists());
}

#[test]
fn test_fast_env_enables_fast_mode() {
    let dir = setup_project();

    polyform_cmd(dir.path())
        .env("POLYFORM_FAST", "true")
        .arg("commonjs")
        .assert()
        .success();

    let out = dir.path().join("build/commonjs");
    let bitmap = fs::read_to_string(out.join("view/Bitmap.js")).unwrap();
    assert!(bitmap.contains("var Class = require('../core/Class');"));
    assert!(bitmap.contains("module.exports = Bitmap;"));
    assert!(!out.join("view/Bitmap.min.js").exists());
}

#[test]
fn test_json_format_reports_tasks() {
    let dir = setup_project();

    polyform_cmd(dir.path())
        .args(["--fast", "--format", "json", "amd"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""event":"started""#))
        .stdout(predicate::str::contains(r#""task":"amd-format""#))
        .stdout(predicate::str::contains(r#""event":"report""#));
}

#[test]
fn test_failed_chain_exits_non_zero_but_others_run() {
    let dir = setup_project();

    // the default flash adapter sources do not exist
    polyform_cmd(dir.path())
        .args(["--fast", "flash", "kissy"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("'flash' failed"));

    assert!(dir.path().join("build/kissy/hilo-kissy.js").is_file());
}

#[test]
fn test_unresolved_dependency_fails() {
    let dir = setup_project();
    write(
        dir.path(),
        "src/view/Bitmap.js",
        "/**\n * @module hilo/view/Bitmap\n * @requires hilo/view/Missing\n */\nvar Bitmap = {};\n",
    );

    polyform_cmd(dir.path())
        .args(["--fast", "cmd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("hilo/view/Missing"));
}

#[test]
fn test_publish_stage_renames_package() {
    let dir = setup_project();

    polyform_cmd(dir.path())
        .args(["--fast", "publish-stage"])
        .assert()
        .success();

    let npm = dir.path().join("build/npm");
    let package = fs::read_to_string(npm.join("package.json")).unwrap();
    assert!(package.contains(r#""name": "hilojs""#));
    assert!(npm.join("core/Class.js").is_file());

    let bundle = fs::read_to_string(npm.join("hilo-standalone.js")).unwrap();
    assert!(bundle.contains("module.exports = window.Hilo;"));
}

#[cfg(unix)]
#[test]
fn test_lint_uses_configured_linter() {
    let dir = setup_project();
    write(dir.path(), "build.toml", "[tools]\nlinter = [\"true\"]\n");

    polyform_cmd(dir.path()).arg("lint").assert().success();
    assert!(!dir.path().join("build/standalone/hilo-standalone.min.js").exists());

    write(dir.path(), "build.toml", "[tools]\nlinter = [\"false\"]\n");
    polyform_cmd(dir.path())
        .arg("lint")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Lint failed"));
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_unknown_target_fails() {
    let dir = setup_project();

    polyform_cmd(dir.path())
        .arg("umd")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Task not found: umd"));

    assert!(!dir.path().join("build").exists());
}

#[test]
fn test_missing_descriptor_fails() {
    let dir = TempDir::new().unwrap();

    polyform_cmd(dir.path())
        .arg("standalone")
        .assert()
        .failure()
        .stderr(predicate::str::contains("package.json"));
}

#[test]
fn test_invalid_config_fails() {
    let dir = setup_project();
    write(dir.path(), "build.toml", "conventions = [\"umd\"]\n");

    polyform_cmd(dir.path())
        .arg("standalone")
        .assert()
        .failure()
        .stderr(predicate::str::contains("build config"));
}

// =============================================================================
// Listing Tests
// =============================================================================

#[test]
fn test_list_shows_tasks_and_dependencies() {
    let dir = setup_project();

    polyform_cmd(dir.path())
        .arg("--list")
        .assert()
        .success()
        .stdout(predicate::str::contains("standalone-format\tstandalone-clean"))
        .stdout(predicate::str::contains("doc-en\tdoc-comment-en"))
        .stdout(predicate::str::contains("default\tformat, flash, extensions"));

    assert!(!dir.path().join("build").exists());
}
