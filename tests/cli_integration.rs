//! CLI integration tests for sectionforge.
//!
//! Every test drives a snapshot registry and a fake installation prefix in a
//! temporary directory, so pacman is never needed.

use std::fs;
use std::path::Path;
use std::process::Command;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

const SNAPSHOT: &str = r#"{
  "explicit": ["mingw-w64-ocaml", "base"],
  "packages": {
    "mingw-w64-ocaml": {
      "description": "OCaml compiler",
      "files": [
        "/ucrt64/bin/",
        "/ucrt64/bin/ocaml.exe",
        "/ucrt64/lib/ocaml/p.cma",
        "/ucrt64/lib/ocaml/p.cmt"
      ],
      "required_by": ["mingw-w64-zlib"]
    },
    "mingw-w64-zlib": {
      "description": "Compression library",
      "files": ["/ucrt64/bin/zlib1.dll"],
      "required_by": ["mingw-w64-ocaml"]
    },
    "base": {}
  }
}"#;

const CONFIG: &str = r#"
[registry]
kind = "snapshot"
snapshot = "registry.json"

[layout]
install_root = "/ucrt64"
filesystem_root = "root"
output_dir = "out"

[selection]
allow = ["^mingw-w64-ocaml$"]
deny = ["^base$"]
"#;

/// Get the sectionforge binary command, isolated from the user's config.
fn sectionforge(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sectionforge").unwrap();
    cmd.current_dir(dir)
        .env_remove("SECTIONFORGE_CONFIG")
        .env("HOME", dir)
        .env("XDG_CONFIG_HOME", dir.join(".config"));
    cmd
}

/// Create a project with a snapshot, an install tree and a config.
fn project(config: &str) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for rel in ["bin/ocaml.exe", "lib/ocaml/p.cma", "lib/ocaml/p.cmt", "bin/zlib1.dll"] {
        let path = tmp.path().join("root/ucrt64").join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, rel).unwrap();
    }
    fs::write(tmp.path().join("registry.json"), SNAPSHOT).unwrap();
    fs::write(tmp.path().join("sectionforge.toml"), config).unwrap();
    tmp
}

// ============================================================================
// sectionforge generate
// ============================================================================

#[test]
fn test_generate_writes_artifacts() {
    let tmp = project(CONFIG);

    sectionforge(tmp.path())
        .arg("generate")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Generated 1 visible and 1 hidden sections (2 edges)",
        ));

    let out = tmp.path().join("out");
    for artifact in [
        "manifests/mingw_w64_ocaml.nsh",
        "manifests/mingw_w64_zlib.nsh",
        "sections-visible.nsh",
        "sections-hidden.nsh",
        "deps-visible.txt",
        "deps-hidden.txt",
        "descriptions.nsh",
        "description-bindings.nsh",
        "crawl-report.json",
    ] {
        assert!(out.join(artifact).exists(), "missing {}", artifact);
    }

    let manifest = fs::read_to_string(out.join("manifests/mingw_w64_ocaml.nsh")).unwrap();
    assert!(manifest.contains("SetOutPath \"$INSTDIR\\bin\""));
    assert!(manifest.contains("SetOutPath \"$INSTDIR\\lib\\ocaml\""));
    assert!(manifest.contains("p.cma\""));
    assert!(!manifest.contains("p.cmt"));

    let hidden = fs::read_to_string(out.join("sections-hidden.nsh")).unwrap();
    assert!(hidden.contains("Section \"-mingw-w64-zlib\" SEC_mingw_w64_zlib"));
    assert!(hidden.contains("SectionIn RO"));

    let deps = fs::read_to_string(out.join("deps-hidden.txt")).unwrap();
    assert_eq!(deps, "SEC_mingw_w64_ocaml SEC_mingw_w64_zlib\n");

    let descriptions = fs::read_to_string(out.join("descriptions.nsh")).unwrap();
    assert!(descriptions.contains("\"OCaml compiler\""));
    assert!(!descriptions.contains("Compression library"));
}

#[test]
fn test_generate_output_flag_overrides_config() {
    let tmp = project(CONFIG);

    sectionforge(tmp.path())
        .args(["generate", "--output", "elsewhere"])
        .assert()
        .success();

    assert!(tmp.path().join("elsewhere/sections-visible.nsh").exists());
    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_generate_twice_replaces_output() {
    let tmp = project(CONFIG);

    sectionforge(tmp.path()).arg("generate").assert().success();
    fs::write(tmp.path().join("out/stale.nsh"), "old").unwrap();
    sectionforge(tmp.path()).arg("generate").assert().success();

    assert!(!tmp.path().join("out/stale.nsh").exists());
}

#[test]
fn test_generate_missing_file_fails_without_output() {
    let tmp = project(CONFIG);
    fs::remove_file(tmp.path().join("root/ucrt64/bin/zlib1.dll")).unwrap();

    sectionforge(tmp.path())
        .arg("generate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("inconsistent with the filesystem"))
        .stderr(predicate::str::contains("zlib1.dll"));

    assert!(!tmp.path().join("out").exists());
}

#[test]
fn test_generate_registry_snapshot_flag() {
    let tmp = project(&CONFIG.replace("kind = \"snapshot\"", "kind = \"pacman\""));
    fs::rename(
        tmp.path().join("registry.json"),
        tmp.path().join("captured.json"),
    )
    .unwrap();

    sectionforge(tmp.path())
        .args(["generate", "--registry-snapshot", "captured.json"])
        .assert()
        .success();

    assert!(tmp.path().join("out/sections-visible.nsh").exists());
}

// ============================================================================
// sectionforge select
// ============================================================================

#[test]
fn test_select_prints_top_level() {
    let tmp = project(CONFIG);

    sectionforge(tmp.path())
        .arg("select")
        .assert()
        .success()
        .stdout("mingw-w64-ocaml\n");
}

#[test]
fn test_select_mismatch_reports_both_sets() {
    let tmp = project(&CONFIG.replace("deny = [\"^base$\"]", "deny = [\"^gcc$\"]"));

    sectionforge(tmp.path())
        .arg("select")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "allow-list and deny-list selections disagree",
        ))
        .stderr(predicate::str::contains("only in deny-list: base"));
}

#[test]
fn test_generate_mismatch_writes_nothing() {
    let tmp = project(&CONFIG.replace("deny = [\"^base$\"]", "deny = [\"^gcc$\"]"));

    sectionforge(tmp.path()).arg("generate").assert().failure();

    assert!(!tmp.path().join("out").exists());
}

// ============================================================================
// sectionforge tree
// ============================================================================

#[test]
fn test_tree_marks_reencounters() {
    let tmp = project(CONFIG);

    sectionforge(tmp.path())
        .arg("tree")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("mingw-w64-ocaml\n"))
        .stdout(predicate::str::contains("├── mingw-w64-zlib [hidden]"))
        .stdout(predicate::str::contains("mingw-w64-ocaml (*)"));

    assert!(!tmp.path().join("out").exists());
}

// ============================================================================
// configuration and misc
// ============================================================================

#[test]
fn test_missing_config() {
    let tmp = TempDir::new().unwrap();

    sectionforge(tmp.path())
        .arg("select")
        .assert()
        .failure()
        .stderr(predicate::str::contains("could not find sectionforge.toml"));
}

#[test]
fn test_explicit_config_path() {
    let tmp = project(CONFIG);
    fs::rename(
        tmp.path().join("sectionforge.toml"),
        tmp.path().join("custom.toml"),
    )
    .unwrap();

    sectionforge(tmp.path())
        .args(["select", "--config", "custom.toml"])
        .assert()
        .success()
        .stdout("mingw-w64-ocaml\n");
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();

    sectionforge(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sectionforge"));
}

#[test]
fn test_completions_output_file() {
    let tmp = TempDir::new().unwrap();

    sectionforge(tmp.path())
        .args(["completions", "zsh", "--output", "completions/_sectionforge"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let script = fs::read_to_string(tmp.path().join("completions/_sectionforge")).unwrap();
    assert!(script.contains("#compdef sectionforge"));
}
