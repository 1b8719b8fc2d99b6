use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const INPUT_VARS: &[&str] = &[
    "NORD_PRIVATE_KEY",
    "NORD_COUNTRIES",
    "NORD_TOKEN",
    "XRAY_PORT",
    "ENABLE_DIRECT",
    "USE_SIDECARS",
    "SIDECAR_RELAY",
    "PIN_SIDECAR_HOSTS",
    "XRAY_DOMAIN",
    "DOCKER_NETWORK",
    "OUTPUT_DIR",
];

/// The binary run in an empty directory with a clean environment
fn xray_gen(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("xray-gen").unwrap();
    for var in INPUT_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(home.path()).env("HOME", home.path());
    cmd
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    xray_gen(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("generate"))
        .stdout(predicate::str::contains("fetch-key"))
        .stdout(predicate::str::contains("candidates"));
}

#[test]
fn missing_private_key_is_fatal_with_guidance() {
    let home = TempDir::new().unwrap();
    xray_gen(&home)
        .args(["generate", "--countries", "US"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("NORD_PRIVATE_KEY"))
        .stderr(predicate::str::contains("fetch-key"));

    assert!(!home.path().join("config").exists());
}

#[test]
fn missing_regions_is_fatal() {
    let home = TempDir::new().unwrap();
    xray_gen(&home)
        .arg("generate")
        .env("NORD_PRIVATE_KEY", "cGxhY2Vob2xkZXI=")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NORD_COUNTRIES"));
}

#[test]
fn unreadable_explicit_config_is_fatal() {
    let home = TempDir::new().unwrap();
    xray_gen(&home)
        .args(["--config", "missing.toml", "generate"])
        .args(["--private-key", "cGxhY2Vob2xkZXI=", "--countries", "US"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read config file"));
}

#[test]
fn invalid_relay_is_rejected() {
    let home = TempDir::new().unwrap();
    xray_gen(&home)
        .args(["generate", "--relay", "http"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn fetch_key_requires_token() {
    let home = TempDir::new().unwrap();
    xray_gen(&home)
        .arg("fetch-key")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--token"));
}
