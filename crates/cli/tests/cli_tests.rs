// End-to-end tests for the `cardmesh` binary.
//
// Each test copies the recon fixtures into a temp dir so output documents
// never land in the source tree.
//
// Run with: cargo test -p cardmesh-cli --test cli_tests -- --nocapture

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn cardmesh() -> Command {
    Command::new(env!("CARGO_BIN_EXE_cardmesh"))
}

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../recon/tests/fixtures")
}

/// Temp dir holding a copy of every fixture file.
fn fixture_workspace() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    for entry in std::fs::read_dir(fixtures_dir()).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
    }
    dir
}

fn config_path(dir: &Path) -> PathBuf {
    dir.join("lorcana.recon.toml")
}

fn read_json(path: &Path) -> serde_json::Value {
    let text = std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("cannot read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

// ===========================================================================
// cardmesh run
// ===========================================================================

#[test]
fn run_writes_all_documents() {
    let ws = fixture_workspace();
    let output = cardmesh()
        .arg("run")
        .arg(config_path(ws.path()))
        .output()
        .expect("cardmesh run");

    assert!(output.status.success(), "stderr: {}", stderr(&output));

    let out = ws.path().join("out");
    let documents =
        ["master.json", "mismatches.json", "coverage.json", "flagged.json", "warnings.json"];
    for name in documents {
        assert!(out.join(name).exists(), "{name} should be written");
    }

    let master = read_json(&out.join("master.json"));
    assert_eq!(master["metadata"]["total_cards"], 6);
    assert_eq!(master["metadata"]["playable_count"], 5);
    assert_eq!(master["metadata"]["product_count"], 1);
    assert!(master["market_products"].get("007-B01").is_some());
    assert_eq!(master["playable_cards"]["001-100"]["rarity"], "legendary");

    let mismatches = read_json(&out.join("mismatches.json"));
    assert_eq!(mismatches["metadata"]["total"], 3);

    let flagged = read_json(&out.join("flagged.json"));
    assert_eq!(flagged["metadata"]["missing_provider"], "cardmarket");
    assert_eq!(flagged["by_set"]["009"][0]["identifier"], "009-229");

    let warnings = read_json(&out.join("warnings.json"));
    assert_eq!(warnings.as_array().map(Vec::len), Some(3));

    let err = stderr(&output);
    assert!(err.contains("6 cards"), "summary line missing: {err}");
    assert!(err.contains("warning:"), "warnings should be listed: {err}");
}

#[test]
fn run_json_prints_master_document() {
    let ws = fixture_workspace();
    let out_dir = ws.path().join("custom");
    let output = cardmesh()
        .arg("run")
        .arg(config_path(ws.path()))
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--json")
        .output()
        .expect("cardmesh run --json");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(out_dir.join("master.json").exists());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let val: serde_json::Value = serde_json::from_str(stdout.trim())
        .unwrap_or_else(|e| panic!("stdout must be one JSON value: {e}\n{stdout}"));
    assert_eq!(val["metadata"]["providers"][0], "dreamborn");

    // Key order on disk matches the struct layout.
    let on_disk = std::fs::read_to_string(out_dir.join("master.json")).unwrap();
    let meta = on_disk.find("\"metadata\"").unwrap();
    let playable = on_disk.find("\"playable_cards\"").unwrap();
    assert!(meta < playable);
}

#[test]
fn run_scope_override_narrows_universe() {
    let ws = fixture_workspace();
    let output = cardmesh()
        .arg("run")
        .arg(config_path(ws.path()))
        .args(["--scope", "001", "--quiet", "--json"])
        .output()
        .expect("cardmesh run --scope");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let val: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(val["metadata"]["total_cards"], 2);
    assert!(!stderr(&output).contains("warning:"));
}

#[test]
fn run_strict_fails_on_issues() {
    let ws = fixture_workspace();
    let output = cardmesh()
        .arg("run")
        .arg(config_path(ws.path()))
        .args(["--strict", "--quiet"])
        .output()
        .expect("cardmesh run --strict");

    assert_eq!(output.status.code(), Some(64), "stderr: {}", stderr(&output));
    // Documents are still written before the strict check.
    assert!(ws.path().join("out/master.json").exists());
}

#[test]
fn run_missing_source_is_load_error() {
    let ws = fixture_workspace();
    std::fs::remove_file(ws.path().join("cardmarket.csv")).unwrap();
    let output = cardmesh()
        .arg("run")
        .arg(config_path(ws.path()))
        .output()
        .expect("cardmesh run");

    assert_eq!(output.status.code(), Some(61));
    assert!(stderr(&output).contains("cardmarket.csv"));
}

#[test]
fn run_bad_scope_is_usage_error() {
    let ws = fixture_workspace();
    let output = cardmesh()
        .arg("run")
        .arg(config_path(ws.path()))
        .args(["--scope", " , "])
        .output()
        .expect("cardmesh run");

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("hint:"));
}

#[test]
fn run_without_sources_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("empty.recon.toml");
    std::fs::write(&config, "providers = [\"a\", \"b\"]\n").unwrap();

    let output = cardmesh().arg("run").arg(&config).output().expect("cardmesh run");
    assert_eq!(output.status.code(), Some(60));
    assert!(stderr(&output).contains("[sources]"));
}

#[test]
fn run_duplicate_key_in_export_is_engine_error() {
    let ws = fixture_workspace();
    std::fs::write(
        ws.path().join("dreamborn.json"),
        r#"{"cards": {"001-100": {"name": "Elsa"}, "001-100": {"name": "Anna"}}}"#,
    )
    .unwrap();
    let output = cardmesh()
        .arg("run")
        .arg(config_path(ws.path()))
        .output()
        .expect("cardmesh run");

    assert_eq!(output.status.code(), Some(62), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("duplicate key '001-100'"));
    assert!(!ws.path().join("out/master.json").exists());
}

// ===========================================================================
// cardmesh validate
// ===========================================================================

#[test]
fn validate_accepts_fixture() {
    let output = cardmesh()
        .arg("validate")
        .arg(fixtures_dir().join("lorcana.recon.toml"))
        .output()
        .expect("cardmesh validate");

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stderr(&output).contains("3 provider(s)"));
}

#[test]
fn validate_rejects_unknown_flag_provider() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("bad.recon.toml");
    std::fs::write(
        &config,
        "providers = [\"a\", \"b\"]\n\n[flag]\nmissing_provider = \"z\"\n",
    )
    .unwrap();

    let output = cardmesh().arg("validate").arg(&config).output().expect("cardmesh validate");
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn validate_missing_file_is_usage_error() {
    let output = cardmesh()
        .args(["validate", "does-not-exist.recon.toml"])
        .output()
        .expect("cardmesh validate");
    assert_eq!(output.status.code(), Some(2));
}

// ===========================================================================
// cardmesh classify
// ===========================================================================

fn classify(a: &str, b: &str) -> String {
    let output = cardmesh().args(["classify", a, b]).output().expect("cardmesh classify");
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

#[test]
fn classify_prints_category() {
    assert_eq!(classify("Elsa", "elsa"), "case_difference");
    assert_eq!(
        classify("Mickey Mouse - Brave Little Tailor", "Mickey Mouse"),
        "subtitle_difference"
    );
    assert_eq!(classify("Maui", "Moana"), "significant_difference");
    assert_eq!(classify("Elsa", "Elsa"), "identical");
}

#[test]
fn classify_json_shape() {
    let output = cardmesh()
        .args(["classify", "Stitch!", "Stitch", "--json"])
        .output()
        .expect("cardmesh classify --json");
    assert!(output.status.success());
    let val: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(val["category"], "punctuation_difference");
    assert_eq!(val["a"], "Stitch!");
}
