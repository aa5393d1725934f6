use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("music-presence").unwrap();
    cmd.arg("--config").arg(dir.path().join("config.toml"));
    cmd
}

#[test]
fn test_locate_finds_socket() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("discord-ipc-3"), b"").unwrap();

    cmd(&dir)
        .arg("locate")
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("discord-ipc-3"));
}

#[test]
fn test_locate_prefers_lowest_slot() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("discord-ipc-5"), b"").unwrap();
    fs::write(dir.path().join("discord-ipc-0"), b"").unwrap();

    cmd(&dir)
        .arg("locate")
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("discord-ipc-0"));
}

#[test]
fn test_locate_empty_dir() {
    let dir = TempDir::new().unwrap();

    cmd(&dir)
        .arg("locate")
        .arg("--base-dir")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No Discord IPC socket found"));
}

#[test]
fn test_locate_uses_tmpdir() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("discord-ipc-1"), b"").unwrap();

    cmd(&dir)
        .env("TMPDIR", dir.path())
        .arg("locate")
        .assert()
        .success()
        .stdout(predicate::str::contains("discord-ipc-1"));
}

#[test]
fn test_locate_uses_config_prefix() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("discord-canary-ipc-0"), b"").unwrap();
    fs::write(
        dir.path().join("config.toml"),
        format!(
            "[ipc]\nbase_dir = {:?}\nprefix = \"discord-canary\"\n",
            dir.path().display().to_string()
        ),
    )
    .unwrap();

    cmd(&dir)
        .arg("locate")
        .assert()
        .success()
        .stdout(predicate::str::contains("discord-canary-ipc-0"));
}

#[test]
fn test_clear_without_discord_fails() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.toml"),
        format!("[ipc]\nbase_dir = {:?}\n", dir.path().display().to_string()),
    )
    .unwrap();

    cmd(&dir)
        .arg("clear")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not connect to Discord"));
}

#[test]
fn test_config_prints_defaults() {
    let dir = TempDir::new().unwrap();

    cmd(&dir)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "client_id = \"1457120161911013437\"",
        ))
        .stdout(predicate::str::contains("poll_interval_secs = 5"));
}

#[test]
fn test_set_help_describes_kinds() {
    let dir = TempDir::new().unwrap();

    cmd(&dir)
        .arg("set")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("until interrupted"))
        .stdout(predicate::str::contains("4 custom"));
}
