//! Integration tests for the `plugstate` binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const MANIFEST: &str = r#"
name = "Tape Echo"
manufacturer = "Acme"
unique_id = "TpEc"
version = "1.2.3"
state_chunks = false

[[params]]
name = "Time"
min = 1.0
max = 2000.0
default = 250.0
unit = "ms"
scale = "log"

[[params]]
name = "Feedback"
min = 0.0
max = 100.0
default = 30.0
unit = "percent"

[[presets]]
name = "Slapback"
values = { Time = 80.0, Feedback = 0.0 }

[[presets]]
name = "Runaway"
values = { Time = 600.0, Feedback = 95.0 }
"#;

/// Helper to get the path to the `plugstate` binary built by cargo.
fn plugstate_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_plugstate"))
}

fn run(args: &[&str]) -> Output {
    plugstate_bin()
        .args(args)
        .output()
        .expect("failed to run plugstate")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn setup(dir: &Path) -> (PathBuf, PathBuf) {
    let manifest = dir.join("echo.toml");
    std::fs::write(&manifest, MANIFEST).unwrap();
    let bank = dir.join("factory.fxb");
    let output = run(&[
        "create-bank",
        "--manifest",
        manifest.to_str().unwrap(),
        "-o",
        bank.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "create-bank failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Wrote 2 presets"));
    (manifest, bank)
}

#[test]
fn info_shows_bank_header() {
    let dir = tempfile::tempdir().unwrap();
    let (_, bank) = setup(dir.path());

    let output = run(&["info", bank.to_str().unwrap()]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("FxBk"), "{text}");
    assert!(text.contains("TpEc"), "{text}");
    assert!(text.contains("v1.2.3"), "{text}");
    assert!(text.contains("Slapback"), "{text}");
    assert!(text.contains("Runaway"), "{text}");
}

#[test]
fn info_json_is_parseable() {
    let dir = tempfile::tempdir().unwrap();
    let (_, bank) = setup(dir.path());

    let output = run(&["info", "--json", bank.to_str().unwrap()]);
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "FxBk");
    assert_eq!(json["count"], 2);
    assert_eq!(json["current_program"], 0);
    assert_eq!(json["programs"][1], "Runaway");
}

#[test]
fn extract_then_dump_program() {
    let dir = tempfile::tempdir().unwrap();
    let (manifest, bank) = setup(dir.path());
    let fxp = dir.path().join("runaway.fxp");

    let output = run(&[
        "extract",
        bank.to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
        "--index",
        "1",
        "-o",
        fxp.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout(&output).contains("Runaway"));

    let output = run(&["info", "--json", fxp.to_str().unwrap()]);
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["kind"], "FxCk");
    assert_eq!(json["count"], 2);
    assert_eq!(json["programs"][0], "Runaway");

    let output = run(&[
        "dump",
        fxp.to_str().unwrap(),
        "--manifest",
        manifest.to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Feedback"), "{text}");
    assert!(text.contains("95%"), "{text}");
    assert!(text.contains("600 ms"), "{text}");
}

#[test]
fn dump_bank_lists_presets() {
    let dir = tempfile::tempdir().unwrap();
    let (manifest, bank) = setup(dir.path());

    let output = run(&[
        "dump",
        bank.to_str().unwrap(),
        "-m",
        manifest.to_str().unwrap(),
        "--source",
    ]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("*  0  Slapback"), "{text}");
    assert!(text.contains("make_preset_from_named_params(\"Slapback\""), "{text}");
}

#[test]
fn dump_finds_preset_by_name_in_user_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (manifest, bank) = setup(dir.path());
    let presets = dir.path().join("plugstate").join("presets").join("Tape Echo");
    std::fs::create_dir_all(&presets).unwrap();
    std::fs::copy(&bank, presets.join("Factory.fxb")).unwrap();

    let output = plugstate_bin()
        .args(["dump", "Factory", "-m", manifest.to_str().unwrap()])
        .env("XDG_CONFIG_HOME", dir.path())
        .output()
        .expect("failed to run plugstate dump");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let text = stdout(&output);
    assert!(text.contains("Runaway"), "{text}");
    assert!(text.contains("Factory.fxb"), "{text}");

    let output = plugstate_bin()
        .args(["dump", "Missing", "-m", manifest.to_str().unwrap()])
        .env("XDG_CONFIG_HOME", dir.path())
        .output()
        .expect("failed to run plugstate dump");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no preset file 'Missing'"));
}

#[test]
fn extract_out_of_range_fails() {
    let dir = tempfile::tempdir().unwrap();
    let (manifest, bank) = setup(dir.path());
    let output = run(&[
        "extract",
        bank.to_str().unwrap(),
        "-m",
        manifest.to_str().unwrap(),
        "-i",
        "9",
        "-o",
        dir.path().join("x.fxp").to_str().unwrap(),
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("out of range"));
}

#[test]
fn info_rejects_non_preset_files() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.fxp");
    std::fs::write(&path, b"definitely not a preset").unwrap();
    let output = run(&["info", path.to_str().unwrap()]);
    assert!(!output.status.success());
}

#[test]
fn paths_names_plugin_dir() {
    let dir = tempfile::tempdir().unwrap();
    let (manifest, _) = setup(dir.path());
    let output = plugstate_bin()
        .args(["paths", "--manifest", manifest.to_str().unwrap()])
        .env("XDG_CONFIG_HOME", dir.path())
        .output()
        .expect("failed to run plugstate paths");
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("plugstate"), "{text}");
    assert!(text.contains("Tape Echo"), "{text}");
}
