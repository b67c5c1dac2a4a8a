//! Integration tests for CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const TAGGED: &str = "sub-07_task-mindsentences_cond-A_meg_N100_20240101T120000.png";

fn figsync(cwd: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("figsync"));
    cmd.current_dir(cwd).env_remove("RUST_LOG");
    cmd
}

fn staging_with(files: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("figures");
    fs::create_dir_all(&root).unwrap();
    for name in files {
        fs::write(root.join(name), b"\x89PNG").unwrap();
    }
    tmp
}

#[test]
fn test_cli_version() {
    let tmp = TempDir::new().unwrap();
    figsync(tmp.path()).arg("--version").assert().success().stdout(predicate::str::contains("figsync"));
}

#[test]
fn test_cli_help() {
    let tmp = TempDir::new().unwrap();
    figsync(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("analysis figures"))
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("organize"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("cron"))
        .stdout(predicate::str::contains("completions"));
}

#[test]
fn test_organize_files_figures() {
    let tmp = staging_with(&[TAGGED, "randomfile.png"]);
    fs::write(tmp.path().join("figures/notes.txt"), "keep").unwrap();

    figsync(tmp.path())
        .arg("organize")
        .assert()
        .success()
        .stdout(predicate::str::contains("Moved: 2"));

    let root = tmp.path().join("figures");
    assert!(root.join("language_processing/subject_07").join(TAGGED).exists());
    assert!(root.join("misc/randomfile.png").exists());
    assert!(root.join("notes.txt").exists());

    let index = fs::read_to_string(root.join("metadata.json")).unwrap();
    let index: serde_json::Value = serde_json::from_str(&index).unwrap();
    assert_eq!(index[TAGGED]["subject"], "07");
    assert_eq!(index[TAGGED]["component"], "N100");
    assert!(index["randomfile.png"].get("subject").is_none());
}

#[test]
fn test_organize_dry_run_leaves_files() {
    let tmp = staging_with(&["x_eeg.png"]);

    figsync(tmp.path())
        .args(["organize", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("x_eeg.png -> eeg_analysis"));

    assert!(tmp.path().join("figures/x_eeg.png").exists());
    assert!(!tmp.path().join("figures/metadata.json").exists());
}

#[test]
fn test_root_flag_overrides_config() {
    let tmp = TempDir::new().unwrap();
    let elsewhere = tmp.path().join("elsewhere");
    fs::create_dir_all(&elsewhere).unwrap();
    fs::write(elsewhere.join("topo_alpha.png"), b"png").unwrap();

    figsync(tmp.path()).arg("--root").arg(&elsewhere).arg("organize").assert().success();
    assert!(elsewhere.join("topographic_maps/topo_alpha.png").exists());
}

#[test]
fn test_index_json_after_organize() {
    let tmp = staging_with(&[TAGGED]);
    figsync(tmp.path()).arg("organize").assert().success();

    figsync(tmp.path())
        .args(["index", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"task\": \"mindsentences\""));

    figsync(tmp.path())
        .arg("index")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entry"));
}

#[test]
fn test_report_writes_dated_html() {
    let tmp = staging_with(&["sub-01_task-rest_meg.png"]);
    figsync(tmp.path()).arg("organize").assert().success();

    figsync(tmp.path())
        .args(["report", "--date", "2024-02-09", "--output", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 figure(s)"));

    let html = fs::read_to_string(tmp.path().join("out/mne_report_2024-02-09.html")).unwrap();
    assert!(html.contains("Meg Analysis"));
    assert!(html.contains("data:image/png;base64,"));
}

#[test]
fn test_run_without_remote_or_site() {
    let tmp = staging_with(&["grand_erp.png"]);

    figsync(tmp.path())
        .args(["run", "--date", "2024-02-09", "--no-publish"])
        .assert()
        .success()
        .stdout(predicate::str::contains("mne_report_2024-02-09.html"));

    assert!(tmp.path().join("figures/eeg_analysis/grand_erp.png").exists());
    assert!(tmp.path().join("reports/mne_report_2024-02-09.html").exists());
}

#[test]
fn test_sync_requires_remote() {
    let tmp = staging_with(&[]);
    figsync(tmp.path())
        .arg("sync")
        .assert()
        .failure()
        .stderr(predicate::str::contains("[remote]"));
}

#[test]
fn test_explicit_config_must_parse() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join("broken.toml"), "days = \"many\"").unwrap();
    figsync(tmp.path()).args(["--config", "broken.toml", "index"]).assert().failure();
}

#[test]
fn test_config_file_taxonomy() {
    let tmp = staging_with(&["Alpha_run.png"]);
    fs::write(
        tmp.path().join("figsync.toml"),
        "subcategories = []\n\n[[categories]]\nname = \"alphas\"\nkeywords = [\"alpha\"]\n",
    )
    .unwrap();

    figsync(tmp.path()).arg("organize").assert().success();
    assert!(tmp.path().join("figures/alphas/Alpha_run.png").exists());
    assert!(!tmp.path().join("figures/eeg_analysis").exists());
}

#[test]
fn test_init_writes_loadable_config() {
    let tmp = TempDir::new().unwrap();
    figsync(tmp.path()).arg("init").assert().success();
    assert!(tmp.path().join("figsync.toml").exists());

    figsync(tmp.path()).arg("init").assert().failure().stderr(predicate::str::contains("--force"));
    figsync(tmp.path()).arg("clean").assert().success();
    assert!(tmp.path().join("figures").is_dir());
}

#[test]
fn test_cron_print() {
    let tmp = TempDir::new().unwrap();
    figsync(tmp.path())
        .args(["cron", "--print"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0 20 * * * "))
        .stdout(predicate::str::contains("figsync"))
        .stdout(predicate::str::ends_with(" run\n"));
}

#[test]
fn test_completions() {
    let tmp = TempDir::new().unwrap();
    figsync(tmp.path())
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("figsync"));
}
