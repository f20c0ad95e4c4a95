use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn help_lists_subcommands() {
    Command::cargo_bin("subgen")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("transcribe"))
        .stdout(predicate::str::contains("artifacts"));
}

#[test]
fn transcribe_requires_output_flag() {
    Command::cargo_bin("subgen")
        .unwrap()
        .args(["transcribe", "audio.wav"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--output"));
}

#[test]
fn models_prints_static_catalog() {
    let home = tempfile::TempDir::new().unwrap();
    Command::cargo_bin("subgen")
        .unwrap()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_DATA_HOME", home.path().join("data"))
        .arg("models")
        .assert()
        .success()
        .stdout(predicate::str::contains("large-v3"));
}
